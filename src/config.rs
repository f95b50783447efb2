//! Where everything lives under the archive root.
use std::path::{Path, PathBuf};

/// Name of the default archive root directory, under the user's home directory.
pub const DEFAULT_ROOT_DIR: &str = "tc_impact";

/// File name of the missing dataset cache under the archive root.
pub const MISSING_DB_FILE: &str = "missing_datasets.db";

/// Default program used as the hazard engine.
pub const DEFAULT_ENGINE: &str = "climada-engine";

pub fn default_root() -> Option<PathBuf> {
    dirs::home_dir().map(|hd| hd.join(DEFAULT_ROOT_DIR))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Paths { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wind field files and the track files they were computed from.
    pub fn tc_wind_dir(&self) -> PathBuf {
        self.root.join("tc_wind")
    }

    /// Forecast products, one directory per cycle.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    /// Downloaded catalog datasets.
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Cache of catalog queries that found nothing.
    pub fn missing_db(&self) -> PathBuf {
        self.root.join(MISSING_DB_FILE)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_layout() {
        let paths = Paths::new("/archive");
        assert_eq!(paths.tc_wind_dir(), Path::new("/archive/tc_wind"));
        assert_eq!(paths.output_dir(), Path::new("/archive/output"));
        assert_eq!(paths.data_dir(), Path::new("/archive/data"));
        assert_eq!(paths.missing_db(), Path::new("/archive/missing_datasets.db"));
        assert_eq!(paths.root(), Path::new("/archive"));
    }
}
