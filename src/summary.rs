//! Summary statistics of an ensemble impact forecast.
use crate::{cycle::ForecastCycle, impf::ImpactType};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Number of members in a complete ensemble forecast.
pub const ENSEMBLE_SIZE: usize = 51;

pub const HAZARD_TYPE: &str = "TC";
pub const WEATHER_MODEL: &str = "ECMWF";
pub const IMPACT_UNIT: &str = "people";

/// Fill an impact-at-event vector up to [`ENSEMBLE_SIZE`] with zeros.
///
/// Members for which the forecast produced no track never made it into the hazard, they are
/// counted as having no impact.
pub fn pad_ensemble(at_event: &[f64]) -> Vec<f64> {
    if at_event.len() > ENSEMBLE_SIZE {
        warn!(
            "{} events in an ensemble of {}, leaving them all in",
            at_event.len(),
            ENSEMBLE_SIZE
        );
    }

    let mut padded = at_event.to_vec();
    if padded.len() < ENSEMBLE_SIZE {
        padded.resize(ENSEMBLE_SIZE, 0.0);
    }
    padded
}

/// Percentile `p` (0-100) of sorted values, interpolating linearly between the closest ranks.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return std::f64::NAN;
    }

    let rank = (p / 100.0).max(0.0).min(1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

pub fn mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return std::f64::NAN;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}

/// The forecast impact of one storm in one country, serialized with the property names downstream
/// consumers expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactSummary {
    #[serde(rename = "countryISO3")]
    pub country_iso3: String,
    #[serde(rename = "hazardType")]
    pub hazard_type: String,
    #[serde(rename = "impactType")]
    pub impact_type: String,
    #[serde(rename = "initializationTime")]
    pub initialization_time: String,
    #[serde(rename = "eventName")]
    pub event_name: String,
    pub mean: f64,
    pub median: f64,
    #[serde(rename = "05perc")]
    pub perc05: f64,
    #[serde(rename = "25perc")]
    pub perc25: f64,
    #[serde(rename = "75perc")]
    pub perc75: f64,
    #[serde(rename = "95perc")]
    pub perc95: f64,
    #[serde(rename = "weatherModel")]
    pub weather_model: String,
    #[serde(rename = "impactUnit")]
    pub impact_unit: String,
}

impl ImpactSummary {
    /// Summarize the impact of each ensemble member, after padding the ensemble to full size.
    pub fn from_at_event(
        country_iso3: &str,
        cycle: ForecastCycle,
        impact_type: ImpactType,
        storm_name: &str,
        at_event: &[f64],
    ) -> Self {
        let mut padded = pad_ensemble(at_event);
        padded.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        ImpactSummary {
            country_iso3: country_iso3.to_owned(),
            hazard_type: HAZARD_TYPE.to_owned(),
            impact_type: impact_type.to_string(),
            initialization_time: cycle.to_string(),
            event_name: storm_name.to_owned(),
            mean: mean(&padded),
            median: percentile(&padded, 50.0),
            perc05: percentile(&padded, 5.0),
            perc25: percentile(&padded, 25.0),
            perc75: percentile(&padded, 75.0),
            perc95: percentile(&padded, 95.0),
            weather_model: WEATHER_MODEL.to_owned(),
            impact_unit: IMPACT_UNIT.to_owned(),
        }
    }
}
