//! The steps of a forecast run, shared by the command line tools.
//!
//! Each tool is a thin loop around these functions: [`compute_wind_fields`] turns a track forecast
//! into hazard files, [`ImpactRunner`] turns hazard files into impact products, and
//! [`render_track_overview`] draws the tracks.
use crate::{
    catalog::{DatasetQuery, DatasetSource},
    config::Paths,
    cycle::ForecastCycle,
    engine::{Country, HazardEngine, ImpactResult, WindFieldRequest},
    error::{Result, TcImpactErr},
    impf::ImpactType,
    locate::{find_hazard_files, hazard_file_name, storm_name_from_hazard_file, HazardFiles},
    lookup::Lookup,
    missing::MissingDatasetDb,
    output::{
        artifact_file_name, ensure_cycle_dir, track_overview_html_name, track_overview_png_name,
        write_at_event_csv, write_gdf_geojson, write_summary_geojson, ArtifactKind,
    },
    plot::{histogram::Histogram, histogram::NUM_BINS, impact_map, interactive, tracks},
    summary::ImpactSummary,
    tracks::{
        correct_max_sustained_wind, filter_named_storms, ForecastEnsemble, WIND_CONVERSION_FACTOR,
    },
};
use chrono::{DateTime, Utc};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Hours between track points in the overview maps.
pub const OVERVIEW_TIME_STEP_H: f64 = 3.0;

/// Named storms with their winds converted to 1-minute sustained speeds.
pub fn prepare_tracks(fcast: &ForecastEnsemble) -> ForecastEnsemble {
    let mut filtered = filter_named_storms(fcast);
    correct_max_sustained_wind(&mut filtered, WIND_CONVERSION_FACTOR);
    filtered
}

/// Look up a dataset in the catalog and download it, consulting the cache of datasets known to be
/// missing first. The first file of the dataset is returned.
pub fn fetch_dataset(
    source: &dyn DatasetSource,
    missing: Option<&MissingDatasetDb>,
    query: &DatasetQuery,
    data_dir: &Path,
    now: DateTime<Utc>,
) -> Result<Lookup<PathBuf>> {
    let key = query.key();

    if let Some(db) = missing {
        if db.is_missing(&key, now)? {
            return Ok(Lookup::NotFound(format!(
                "{} was recently found missing, not asking again",
                query
            )));
        }
    }

    let info = match source.find_dataset(query)? {
        Lookup::Found(info) => info,
        Lookup::NotFound(reason) => {
            if let Some(db) = missing {
                db.add(&key, now)?;
            }
            return Ok(Lookup::NotFound(reason));
        }
    };

    if let Some(db) = missing {
        db.remove(&key)?;
    }

    let files = source.download(&info, data_dir)?;
    match files.into_iter().next() {
        Some(path) => Ok(Lookup::Found(path)),
        None => Ok(Lookup::NotFound(format!("dataset {} has no files", info.name))),
    }
}

/// Wind field files written for one forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct WindFields {
    pub cycle: ForecastCycle,
    pub hazards: Vec<PathBuf>,
}

/// Compute the wind field of every named storm in `fcast`.
///
/// For each storm its members are saved as `tracks_<storm>_<cycle>.json` next to the hazard file
/// the engine writes. A forecast without named storms produces no files at all. The centroids are
/// required, so the catalog not having them is an error.
pub fn compute_wind_fields(
    engine: &dyn HazardEngine,
    source: &dyn DatasetSource,
    fcast: &ForecastEnsemble,
    paths: &Paths,
    now: DateTime<Utc>,
) -> Result<Lookup<WindFields>> {
    let cycle = match fcast.cycle() {
        Some(cycle) => cycle,
        None => return Ok(Lookup::NotFound("the forecast is empty".to_owned())),
    };

    let prepared = prepare_tracks(fcast);
    if prepared.is_empty() {
        return Ok(Lookup::NotFound(format!(
            "there is no active storm forecasted at {}",
            cycle
        )));
    }

    let centroids = match fetch_dataset(
        source,
        None,
        &DatasetQuery::global_centroids(),
        &paths.data_dir(),
        now,
    )? {
        Lookup::Found(path) => path,
        Lookup::NotFound(reason) => return Err(TcImpactErr::RequiredDatasetMissing(reason)),
    };

    let wind_dir = paths.tc_wind_dir();
    fs::create_dir_all(&wind_dir)?;

    let mut hazards = vec![];
    for name in prepared.storm_names() {
        let storm = prepared.subset_by_name(name);
        let tracks_path = wind_dir.join(format!("tracks_{}_{}.json", name, cycle));
        storm.save(&tracks_path)?;

        let hazard = wind_dir.join(hazard_file_name(name, cycle));
        info!(
            "computing wind field for {} from {} members",
            name,
            storm.members.len()
        );
        engine.wind_field(&WindFieldRequest::new(
            tracks_path,
            centroids.clone(),
            hazard.clone(),
        ))?;
        hazards.push(hazard);
    }

    Ok(Lookup::Found(WindFields { cycle, hazards }))
}

/// The outcome of one country and impact type.
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    /// Products were written.
    Success {
        summary: ImpactSummary,
        files: Vec<PathBuf>,
        /// Impact of each member the engine computed.
        at_event: Vec<f64>,
    },
    /// No exposure data for the country.
    NoExposure {
        storm: String,
        country: String,
        reason: String,
    },
    /// The impact is zero in every member.
    ZeroImpact {
        storm: String,
        country: String,
        impact_type: String,
    },
    /// The country is outside every region with a displacement function.
    NoImpactFunction {
        storm: String,
        country: String,
        impact_type: String,
    },
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use StepResult::*;

        match self {
            Success { summary, .. } => write!(
                f,
                "Success for {} in {} ({}), mean {:.0} {}.",
                summary.event_name,
                summary.country_iso3,
                summary.impact_type,
                summary.mean,
                summary.impact_unit
            ),
            NoExposure {
                storm,
                country,
                reason,
            } => write!(
                f,
                "No exposure data for {} ({}), skipping it: {}.",
                country, storm, reason
            ),
            ZeroImpact {
                storm,
                country,
                impact_type,
            } => write!(f, "No {} impact from {} in {}.", impact_type, storm, country),
            NoImpactFunction {
                storm,
                country,
                impact_type,
            } => write!(
                f,
                "No {} impact function for {} ({}).",
                impact_type, country, storm
            ),
        }
    }
}

/// Options of an impact run.
#[derive(Debug, Clone, Copy)]
pub struct ImpactOptions {
    /// Draw the map and histogram PNGs.
    pub plots: bool,
    pub now: DateTime<Utc>,
}

/// Computes and saves the impacts of the storms of one cycle.
pub struct ImpactRunner<'a> {
    engine: &'a dyn HazardEngine,
    source: &'a dyn DatasetSource,
    missing: Option<&'a MissingDatasetDb>,
    paths: &'a Paths,
    options: ImpactOptions,
}

impl<'a> ImpactRunner<'a> {
    pub fn new(
        engine: &'a dyn HazardEngine,
        source: &'a dyn DatasetSource,
        missing: Option<&'a MissingDatasetDb>,
        paths: &'a Paths,
        options: ImpactOptions,
    ) -> Self {
        ImpactRunner {
            engine,
            source,
            missing,
            paths,
            options,
        }
    }

    /// The cycle for the run time and the hazard files to process, falling back to the previous
    /// cycle when the current one has none yet.
    pub fn locate(&self) -> Result<(ForecastCycle, Lookup<HazardFiles>)> {
        let (cycle, fallback) = ForecastCycle::resolve(&self.options.now);
        let found = find_hazard_files(&self.paths.tc_wind_dir(), cycle, fallback)?;
        Ok((cycle, found))
    }

    /// Every country and impact type for one storm's hazard file.
    pub fn run_storm(&self, hazard: &Path, cycle: ForecastCycle) -> Result<Vec<StepResult>> {
        let storm = match storm_name_from_hazard_file(hazard) {
            Some(storm) => storm,
            None => {
                warn!("cannot tell the storm name from {}", hazard.display());
                return Ok(vec![]);
            }
        };

        let countries = self.engine.countries(hazard)?;
        debug!("{} touches {} countries", storm, countries.len());

        let mut results = vec![];
        for country in &countries {
            self.run_country(hazard, &storm, cycle, country, &mut results)?;
        }

        Ok(results)
    }

    fn run_country(
        &self,
        hazard: &Path,
        storm: &str,
        cycle: ForecastCycle,
        country: &Country,
        results: &mut Vec<StepResult>,
    ) -> Result<()> {
        let exposure = match fetch_dataset(
            self.source,
            self.missing,
            &DatasetQuery::litpop_population(country.iso3num),
            &self.paths.data_dir(),
            self.options.now,
        )? {
            Lookup::Found(path) => path,
            Lookup::NotFound(reason) => {
                results.push(StepResult::NoExposure {
                    storm: storm.to_owned(),
                    country: country.iso3.clone(),
                    reason,
                });
                return Ok(());
            }
        };

        // Nobody exposed to hurricane winds means no displacement either.
        let exposed = ImpactType::exposed_to_hurricane_winds();
        let result = self.impact_step(hazard, &exposure, storm, cycle, country, exposed)?;
        let stop = !matches!(result, StepResult::Success { .. });
        results.push(result);
        if stop {
            return Ok(());
        }

        let result = self.impact_step(
            hazard,
            &exposure,
            storm,
            cycle,
            country,
            ImpactType::Displacement,
        )?;
        results.push(result);

        Ok(())
    }

    fn impact_step(
        &self,
        hazard: &Path,
        exposure: &Path,
        storm: &str,
        cycle: ForecastCycle,
        country: &Country,
        impact_type: ImpactType,
    ) -> Result<StepResult> {
        let impf = match impact_type.impact_function(&country.iso3) {
            Some(impf) => impf,
            None => {
                return Ok(StepResult::NoImpactFunction {
                    storm: storm.to_owned(),
                    country: country.iso3.clone(),
                    impact_type: impact_type.to_string(),
                })
            }
        };

        let impact = self.engine.impact(hazard, exposure, &impf)?;
        if impact.is_zero() {
            return Ok(StepResult::ZeroImpact {
                storm: storm.to_owned(),
                country: country.iso3.clone(),
                impact_type: impact_type.to_string(),
            });
        }

        let summary = ImpactSummary::from_at_event(
            &country.iso3,
            cycle,
            impact_type,
            storm,
            &impact.at_event,
        );
        let files = self.write_products(&summary, &impact, cycle)?;

        Ok(StepResult::Success {
            summary,
            files,
            at_event: impact.at_event,
        })
    }

    fn write_products(
        &self,
        summary: &ImpactSummary,
        impact: &ImpactResult,
        cycle: ForecastCycle,
    ) -> Result<Vec<PathBuf>> {
        let dir = ensure_cycle_dir(&self.paths.output_dir(), cycle)?;
        let path = |kind| dir.join(artifact_file_name(summary, kind));

        let mut files = vec![];

        let summary_path = path(ArtifactKind::Summary);
        write_summary_geojson(summary, &summary_path)?;
        files.push(summary_path);

        let at_event_path = path(ArtifactKind::AtEvent);
        write_at_event_csv(&impact.at_event, &at_event_path)?;
        files.push(at_event_path);

        let gdf_path = path(ArtifactKind::Gdf);
        write_gdf_geojson(&impact.eai_exp, &gdf_path)?;
        files.push(gdf_path);

        if self.options.plots {
            let map_path = path(ArtifactKind::Map);
            impact_map::render(&impact.eai_exp, &map_path)?;
            files.push(map_path);

            let hist_path = path(ArtifactKind::Histogram);
            Histogram::from_values(&impact.at_event, NUM_BINS).render_png(&hist_path)?;
            files.push(hist_path);
        }

        Ok(files)
    }
}

/// Files of a track overview.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackOverview {
    pub cycle: ForecastCycle,
    pub num_storms: usize,
    pub png: PathBuf,
    pub html: PathBuf,
}

/// Draw the static and interactive maps of the named storms in `fcast`. Without any storm both
/// maps are still drawn, empty. `fallback` is the cycle used when the forecast carries no run time.
pub fn render_track_overview(
    fcast: &ForecastEnsemble,
    paths: &Paths,
    fallback: ForecastCycle,
) -> Result<TrackOverview> {
    let cycle = fcast.cycle().unwrap_or(fallback);
    let prepared = prepare_tracks(fcast).equal_timestep(OVERVIEW_TIME_STEP_H);

    let dir = ensure_cycle_dir(&paths.output_dir(), cycle)?;
    let png = dir.join(track_overview_png_name(cycle));
    let html = dir.join(track_overview_html_name(cycle));

    tracks::render_overview(&prepared, &png)?;
    interactive::render_html(&prepared, cycle, &html)?;

    Ok(TrackOverview {
        cycle,
        num_storms: prepared.num_storms(),
        png,
        html,
    })
}
