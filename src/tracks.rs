//! Ensemble forecast tracks.
use crate::{cycle::ForecastCycle, error::Result};
use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};
use tracing::debug;

/// Converts a 10-minute average sustained wind to a 1-minute average.
pub const WIND_CONVERSION_FACTOR: f64 = 1.0 / 0.88;

/// One position along a forecast track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub time: DateTime<Utc>,
    pub lon: f64,
    pub lat: f64,
    /// Maximum sustained wind in m/s.
    pub max_sustained_wind: f64,
    /// Central pressure in hPa.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub central_pressure: Option<f64>,
}

/// A single ensemble member's forecast for one storm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMember {
    pub name: String,
    pub sid: String,
    pub ensemble_number: u32,
    #[serde(default = "default_true")]
    pub is_ensemble: bool,
    pub run_datetime: DateTime<Utc>,
    pub points: Vec<TrackPoint>,
}

fn default_true() -> bool {
    true
}

/// Wrap a longitude into [-180, 180).
pub fn normalize_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

fn lerp(a: f64, b: f64, frac: f64) -> f64 {
    a + (b - a) * frac
}

impl TrackMember {
    /// Resample the track every `hours` from its first point, interpolating linearly in between.
    pub fn equal_timestep(&self, hours: f64) -> TrackMember {
        let step = Duration::seconds((hours * 3600.0).round() as i64);
        if self.points.len() < 2 || step <= Duration::zero() {
            return self.clone();
        }

        let last = self.points.len() - 1;
        let end = self.points[last].time;

        let mut points = vec![];
        let mut seg = 0;
        let mut time = self.points[0].time;
        while time <= end {
            while seg + 1 < last && self.points[seg + 1].time < time {
                seg += 1;
            }
            let (p0, p1) = (&self.points[seg], &self.points[seg + 1]);

            let span = (p1.time - p0.time).num_seconds();
            let frac = if span > 0 {
                (time - p0.time).num_seconds() as f64 / span as f64
            } else {
                0.0
            };

            // Take the short way around the antimeridian.
            let mut dlon = p1.lon - p0.lon;
            if dlon > 180.0 {
                dlon -= 360.0;
            } else if dlon < -180.0 {
                dlon += 360.0;
            }

            let mut lon = p0.lon + dlon * frac;
            if !(-180.0..=180.0).contains(&lon) {
                lon = normalize_lon(lon);
            }

            points.push(TrackPoint {
                time,
                lon,
                lat: lerp(p0.lat, p1.lat, frac),
                max_sustained_wind: lerp(p0.max_sustained_wind, p1.max_sustained_wind, frac),
                central_pressure: match (p0.central_pressure, p1.central_pressure) {
                    (Some(a), Some(b)) => Some(lerp(a, b, frac)),
                    (a, _) => a,
                },
            });

            time = time + step;
        }

        TrackMember {
            points,
            ..self.clone()
        }
    }
}

/// Every member of every storm from one forecast run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastEnsemble {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_datetime: Option<DateTime<Utc>>,
    pub members: Vec<TrackMember>,
}

impl ForecastEnsemble {
    pub fn load(path: &Path) -> Result<Self> {
        let f = File::open(path)?;
        let ensemble: Self = serde_json::from_reader(BufReader::new(f))?;
        debug!(
            "loaded {} track members from {}",
            ensemble.members.len(),
            path.display()
        );
        Ok(ensemble)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// When the forecast was initialized. Falls back to the first member's run time for files that
    /// don't carry it at the top level.
    pub fn run_datetime(&self) -> Option<DateTime<Utc>> {
        self.run_datetime
            .or_else(|| self.members.first().map(|m| m.run_datetime))
    }

    /// The cycle this forecast belongs to.
    pub fn cycle(&self) -> Option<ForecastCycle> {
        self.run_datetime().map(|rt| ForecastCycle::containing(&rt))
    }

    /// Storm names in order of first appearance.
    pub fn storm_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).unique().collect()
    }

    /// Number of distinct storms, counted by storm id.
    pub fn num_storms(&self) -> usize {
        self.members.iter().map(|m| m.sid.as_str()).unique().count()
    }

    /// Every member resampled with [`TrackMember::equal_timestep`].
    pub fn equal_timestep(&self, hours: f64) -> ForecastEnsemble {
        ForecastEnsemble {
            run_datetime: self.run_datetime,
            members: self
                .members
                .iter()
                .map(|m| m.equal_timestep(hours))
                .collect(),
        }
    }

    /// All members of the named storm.
    pub fn subset_by_name(&self, name: &str) -> ForecastEnsemble {
        ForecastEnsemble {
            run_datetime: self.run_datetime(),
            members: self
                .members
                .iter()
                .filter(|m| m.name == name)
                .cloned()
                .collect(),
        }
    }
}

/// Storms that have not been named yet are tracked under numeric identifiers such as `90L`.
fn is_unnamed(name: &str) -> bool {
    let mut prefix = name.chars().take(2).peekable();
    prefix.peek().is_some() && prefix.all(|c| c.is_ascii_digit())
}

/// Keep only the named storms.
///
/// Members are regrouped by name, names in the order they first appear, so every member of a storm
/// ends up next to the others.
pub fn filter_named_storms(fcast: &ForecastEnsemble) -> ForecastEnsemble {
    let members = fcast
        .storm_names()
        .into_iter()
        .filter(|name| !is_unnamed(name))
        .flat_map(|name| fcast.members.iter().filter(move |m| m.name == name))
        .cloned()
        .collect();

    ForecastEnsemble {
        run_datetime: fcast.run_datetime(),
        members,
    }
}

/// Scale every maximum sustained wind by `factor`, normally [`WIND_CONVERSION_FACTOR`].
///
/// A constant factor is a simplification of the relation between averaging periods.
pub fn correct_max_sustained_wind(fcast: &mut ForecastEnsemble, factor: f64) {
    for point in fcast.members.iter_mut().flat_map(|m| m.points.iter_mut()) {
        point.max_sustained_wind *= factor;
    }
}
