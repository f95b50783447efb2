//! Tropical cyclone impact forecasts from ensemble track forecasts.
//!
//! Common code for the command line tools that compute wind fields, impacts and track maps for
//! each forecast cycle.

//
// Public API
//
pub use crate::catalog::{Catalog, DatasetInfo, DatasetQuery, DatasetSource};
pub use crate::config::Paths;
pub use crate::cycle::ForecastCycle;
pub use crate::engine::{CommandEngine, Country, ExposurePoint, HazardEngine, ImpactResult};
pub use crate::error::{Result, TcImpactErr};
pub use crate::lookup::Lookup;
pub use crate::missing::MissingDatasetDb;
pub use crate::summary::ImpactSummary;
pub use crate::table_printer::TablePrinter;
pub use crate::tracks::ForecastEnsemble;
pub use crate::util::{init_logging, parse_timestamp};

pub mod catalog;
pub mod category;
pub mod config;
pub mod cycle;
pub mod engine;
pub mod impf;
pub mod locate;
pub mod missing;
pub mod output;
pub mod pipeline;
pub mod plot;
pub mod regions;
pub mod summary;
pub mod tracks;

//
// Internal only
//
mod error;
mod lookup;
mod table_printer;
mod util;
