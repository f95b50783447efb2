use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong in the library.
///
/// Routine absence of data (no hazard files for a cycle, no exposure dataset for a country) is not
/// an error, see [`Lookup`](crate::Lookup).
#[derive(Debug, Error)]
pub enum TcImpactErr {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    // Data catalog
    #[error("transport failure talking to the data catalog: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("data catalog returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("{count} datasets match {query}, expected exactly one")]
    AmbiguousDataset { query: String, count: usize },
    #[error("required dataset is not in the catalog: {0}")]
    RequiredDatasetMissing(String),
    #[error("download of {} stopped after {received} bytes", .path.display())]
    IncompleteDownload { path: PathBuf, received: u64 },

    // Hazard engine
    #[error("unable to launch hazard engine {}: {source}", .program.display())]
    EngineLaunch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("hazard engine `{command}` exited with {status}: {stderr}")]
    EngineFailed {
        command: String,
        status: String,
        stderr: String,
    },

    // Input validation
    #[error("invalid forecast cycle: {0}")]
    InvalidCycle(String),
    #[error("could not parse timestamp: {0}")]
    InvalidTimestamp(String),
}

pub type Result<T> = std::result::Result<T, TcImpactErr>;
