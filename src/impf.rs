//! Impact functions handed to the hazard engine.
//!
//! The engine applies the function to every exposure point, the definitions live here so the
//! parameters are chosen (and tested) in one place.
use crate::{category::HURRICANE_THRESHOLD, regions};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wind speed (m/s) below which the Emanuel function does no damage.
pub const EMANUEL_V_THRESH: f64 = 25.7;

/// Mean damage degree as a function of wind speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImpactFunction {
    /// Everyone at or above `threshold` counts, nobody below it.
    Step { threshold: f64 },
    /// Emanuel (2011) sigmoid.
    Emanuel {
        v_thresh: f64,
        v_half: f64,
        scale: f64,
    },
}

impl ImpactFunction {
    pub fn step(threshold: f64) -> Self {
        ImpactFunction::Step { threshold }
    }

    pub fn emanuel(v_half: f64) -> Self {
        ImpactFunction::Emanuel {
            v_thresh: EMANUEL_V_THRESH,
            v_half,
            scale: 1.0,
        }
    }

    /// Mean damage degree at wind speed `v` (m/s), in `[0, 1]`.
    pub fn mdd(&self, v: f64) -> f64 {
        match *self {
            ImpactFunction::Step { threshold } => {
                if v >= threshold {
                    1.0
                } else {
                    0.0
                }
            }
            ImpactFunction::Emanuel {
                v_thresh,
                v_half,
                scale,
            } => {
                let v_temp = ((v - v_thresh) / (v_half - v_thresh)).max(0.0);
                let cubed = v_temp.powi(3);
                scale * cubed / (1.0 + cubed)
            }
        }
    }
}

/// What is being counted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImpactType {
    /// People exposed to winds of at least `threshold` m/s.
    ExposedPopulation { threshold: f64 },
    /// People displaced from their homes.
    Displacement,
}

impl ImpactType {
    /// People exposed to hurricane force winds.
    pub fn exposed_to_hurricane_winds() -> Self {
        ImpactType::ExposedPopulation {
            threshold: HURRICANE_THRESHOLD,
        }
    }

    /// The impact function to use for a country, `None` if the country is in no calibration region
    /// and so has no displacement function.
    pub fn impact_function(&self, iso3: &str) -> Option<ImpactFunction> {
        match *self {
            ImpactType::ExposedPopulation { threshold } => Some(ImpactFunction::step(threshold)),
            ImpactType::Displacement => regions::v_half_for(iso3).map(ImpactFunction::emanuel),
        }
    }
}

impl fmt::Display for ImpactType {
    /// The name used in summaries and file names.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ImpactType::ExposedPopulation { threshold } => {
                write!(f, "exposed_population_{}ms", threshold)
            }
            ImpactType::Displacement => write!(f, "displacement"),
        }
    }
}
