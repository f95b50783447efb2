//! The hazard modelling engine.
//!
//! Decoding the forecast bulletins, computing wind fields, intersecting them with exposure data
//! and evaluating impact functions over every exposure point is the job of an external scientific
//! engine. This module is the seam: the [`HazardEngine`] trait describes what the pipeline needs,
//! and [`CommandEngine`] drives an engine program that exchanges JSON on stdout.
use crate::{
    error::{Result, TcImpactErr},
    impf::ImpactFunction,
    summary::ENSEMBLE_SIZE,
    tracks::ForecastEnsemble,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{debug, info};

/// Hours between track points after the engine interpolates them for the wind field.
pub const WIND_FIELD_TIME_STEP_H: f64 = 0.5;

/// Degrees added around the tracks when selecting centroids for a wind field.
pub const CENTROID_BUFFER_DEG: f64 = 5.0;

/// Parametric wind profile used for the wind fields.
pub const WIND_MODEL: &str = "H1980";

/// A country touched by a wind field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// ISO 3166 numeric code.
    pub iso3num: u16,
    /// ISO 3166 alpha-3 code.
    pub iso3: String,
}

/// Impact value at one exposure point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposurePoint {
    pub lon: f64,
    pub lat: f64,
    pub value: f64,
}

/// The result of an impact calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactResult {
    /// Total impact of each event (ensemble member) in the hazard.
    pub at_event: Vec<f64>,
    /// Frequency of each event.
    #[serde(default)]
    pub frequency: Vec<f64>,
    /// Expected (ensemble average) impact at each exposure point.
    #[serde(default)]
    pub eai_exp: Vec<ExposurePoint>,
}

impl ImpactResult {
    /// Frequency weighted sum of the event impacts. Without frequencies every member is weighted
    /// as one of a full ensemble.
    pub fn aai_agg(&self) -> f64 {
        if self.frequency.len() == self.at_event.len() {
            self.at_event
                .iter()
                .zip(&self.frequency)
                .map(|(imp, freq)| imp * freq)
                .sum()
        } else {
            self.at_event.iter().sum::<f64>() / ENSEMBLE_SIZE as f64
        }
    }

    pub fn is_zero(&self) -> bool {
        self.aai_agg() == 0.0
    }
}

/// Everything needed to compute the wind field of one storm.
#[derive(Debug, Clone)]
pub struct WindFieldRequest {
    pub tracks: PathBuf,
    pub centroids: PathBuf,
    pub output: PathBuf,
    pub time_step_h: f64,
    pub buffer_deg: f64,
    pub ensemble_size: usize,
    pub model: &'static str,
}

impl WindFieldRequest {
    pub fn new(tracks: PathBuf, centroids: PathBuf, output: PathBuf) -> Self {
        WindFieldRequest {
            tracks,
            centroids,
            output,
            time_step_h: WIND_FIELD_TIME_STEP_H,
            buffer_deg: CENTROID_BUFFER_DEG,
            ensemble_size: ENSEMBLE_SIZE,
            model: WIND_MODEL,
        }
    }
}

/// The operations the pipeline delegates to the hazard modelling engine.
pub trait HazardEngine {
    /// Retrieve the latest ensemble track forecast.
    fn fetch_forecast(&self) -> Result<ForecastEnsemble>;

    /// Compute and save the wind field of the tracks in the request.
    fn wind_field(&self, req: &WindFieldRequest) -> Result<()>;

    /// Countries where the wind field in `hazard` is above zero anywhere.
    fn countries(&self, hazard: &Path) -> Result<Vec<Country>>;

    /// Impact of `hazard` on `exposure`.
    fn impact(
        &self,
        hazard: &Path,
        exposure: &Path,
        impf: &ImpactFunction,
    ) -> Result<ImpactResult>;
}

/// Runs an external engine program, one process per operation.
///
/// The program is called as `<program> <args...> <operation> <options...>` and answers on stdout
/// with JSON. A non-zero exit status is an error carrying whatever the program wrote to stderr.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new<P: Into<PathBuf>>(program: P, args: Vec<String>) -> Self {
        CommandEngine {
            program: program.into(),
            args,
        }
    }

    fn command(&self, operation: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(operation);
        cmd
    }

    fn run(&self, mut cmd: Command, operation: &str) -> Result<Vec<u8>> {
        debug!("running {:?}", cmd);

        let output = cmd.output().map_err(|source| TcImpactErr::EngineLaunch {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(TcImpactErr::EngineFailed {
                command: operation.to_owned(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(output.stdout)
    }

    fn run_json<T: DeserializeOwned>(&self, cmd: Command, operation: &str) -> Result<T> {
        let stdout = self.run(cmd, operation)?;
        Ok(serde_json::from_slice(&stdout)?)
    }
}

fn path_arg(cmd: &mut Command, flag: &str, path: &Path) {
    cmd.arg(flag).arg(AsRef::<OsStr>::as_ref(path));
}

impl HazardEngine for CommandEngine {
    fn fetch_forecast(&self) -> Result<ForecastEnsemble> {
        let cmd = self.command("fetch-tracks");
        let fcast: ForecastEnsemble = self.run_json(cmd, "fetch-tracks")?;
        info!("engine returned {} track members", fcast.members.len());
        Ok(fcast)
    }

    fn wind_field(&self, req: &WindFieldRequest) -> Result<()> {
        let mut cmd = self.command("windfield");
        path_arg(&mut cmd, "--tracks", &req.tracks);
        path_arg(&mut cmd, "--centroids", &req.centroids);
        path_arg(&mut cmd, "--out", &req.output);
        cmd.arg("--time-step")
            .arg(req.time_step_h.to_string())
            .arg("--buffer-deg")
            .arg(req.buffer_deg.to_string())
            .arg("--n-ensemble")
            .arg(req.ensemble_size.to_string())
            .arg("--model")
            .arg(req.model);

        self.run(cmd, "windfield")?;
        Ok(())
    }

    fn countries(&self, hazard: &Path) -> Result<Vec<Country>> {
        let mut cmd = self.command("countries");
        path_arg(&mut cmd, "--hazard", hazard);
        self.run_json(cmd, "countries")
    }

    fn impact(
        &self,
        hazard: &Path,
        exposure: &Path,
        impf: &ImpactFunction,
    ) -> Result<ImpactResult> {
        let mut cmd = self.command("impact");
        path_arg(&mut cmd, "--hazard", hazard);
        path_arg(&mut cmd, "--exposure", exposure);
        cmd.arg("--impf").arg(serde_json::to_string(impf)?);
        self.run_json(cmd, "impact")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_aai_agg() {
        let res = ImpactResult {
            at_event: vec![51.0, 102.0],
            frequency: vec![1.0 / 51.0, 1.0 / 51.0],
            eai_exp: vec![],
        };
        assert!((res.aai_agg() - 3.0).abs() < 1.0e-12);
        assert!(!res.is_zero());

        let no_freq = ImpactResult {
            at_event: vec![51.0, 102.0],
            ..Default::default()
        };
        assert!((no_freq.aai_agg() - 3.0).abs() < 1.0e-12);

        let nothing = ImpactResult {
            at_event: vec![0.0; 51],
            frequency: vec![1.0 / 51.0; 51],
            eai_exp: vec![],
        };
        assert!(nothing.is_zero());
        assert!(ImpactResult::default().is_zero());
    }

    #[test]
    fn test_impact_result_defaults() {
        let res: ImpactResult = serde_json::from_str(r#"{"at_event": [1.0, 2.0]}"#).unwrap();
        assert_eq!(res.at_event, vec![1.0, 2.0]);
        assert!(res.frequency.is_empty());
        assert!(res.eai_exp.is_empty());
    }

    #[cfg(unix)]
    fn shell_engine(script: &str) -> CommandEngine {
        CommandEngine::new(
            "sh",
            vec!["-c".to_owned(), script.to_owned(), "engine".to_owned()],
        )
    }

    #[cfg(unix)]
    #[test]
    fn test_command_engine_reads_json() {
        let engine = shell_engine(
            r#"case "$1" in
                countries) echo '[{"iso3num": 840, "iso3": "USA"}]' ;;
                impact) echo "{\"at_event\": [5.0], \"frequency\": [0.5]}" ;;
                *) exit 9 ;;
            esac"#,
        );

        let countries = engine.countries(Path::new("tc_wind.hdf5")).unwrap();
        assert_eq!(
            countries,
            vec![Country {
                iso3num: 840,
                iso3: "USA".to_owned()
            }]
        );

        let res = engine
            .impact(
                Path::new("tc_wind.hdf5"),
                Path::new("litpop.hdf5"),
                &ImpactFunction::step(32.92),
            )
            .unwrap();
        assert_eq!(res.aai_agg(), 2.5);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_engine_failure_keeps_stderr() {
        let engine = shell_engine(r#"echo "no such storm" >&2; exit 3"#);

        match engine.countries(Path::new("tc_wind.hdf5")) {
            Err(TcImpactErr::EngineFailed {
                command, stderr, ..
            }) => {
                assert_eq!(command, "countries");
                assert_eq!(stderr, "no such storm");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_program() {
        let engine = CommandEngine::new("/definitely/not/a/tc/engine", vec![]);
        assert!(matches!(
            engine.fetch_forecast(),
            Err(TcImpactErr::EngineLaunch { .. })
        ));
    }
}
