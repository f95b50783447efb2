//! Finding the hazard files written for a forecast cycle.
use crate::{cycle::ForecastCycle, error::Result, lookup::Lookup};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

const HAZARD_PREFIX: &str = "tc_wind_";
const HAZARD_EXTENSION: &str = "hdf5";

/// Name of the wind field file for a storm and cycle.
pub fn hazard_file_name(storm_name: &str, cycle: ForecastCycle) -> String {
    format!("{}{}_{}.{}", HAZARD_PREFIX, storm_name, cycle, HAZARD_EXTENSION)
}

/// Recover the storm name from a wind field file name.
pub fn storm_name_from_hazard_file(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    file_name
        .split('_')
        .nth(2)
        .filter(|name| !name.is_empty())
        .map(ToOwned::to_owned)
}

/// Hazard files found for a cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardFiles {
    /// The cycle the files belong to, which may be the fallback cycle.
    pub cycle: ForecastCycle,
    pub files: Vec<PathBuf>,
}

/// List the wind field files for `cycle`, in name order.
pub fn hazard_files_for(dir: &Path, cycle: ForecastCycle) -> Result<Vec<PathBuf>> {
    let suffix = format!("_{}.{}", cycle, HAZARD_EXTENSION);

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(vec![]),
        Err(err) => return Err(err.into()),
    };

    let mut files = vec![];
    for entry in entries {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(HAZARD_PREFIX) && name.ends_with(&suffix))
            .unwrap_or(false);

        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

/// Find the wind field files for `cycle`, or for `fallback` when the current cycle has not
/// produced any yet.
pub fn find_hazard_files(
    dir: &Path,
    cycle: ForecastCycle,
    fallback: ForecastCycle,
) -> Result<Lookup<HazardFiles>> {
    for &candidate in &[cycle, fallback] {
        let files = hazard_files_for(dir, candidate)?;
        if !files.is_empty() {
            if candidate != cycle {
                info!("no hazard files for {}, using {}", cycle, candidate);
            }
            return Ok(Lookup::Found(HazardFiles {
                cycle: candidate,
                files,
            }));
        }
        debug!("no hazard files for {} in {}", candidate, dir.display());
    }

    Ok(Lookup::NotFound(format!(
        "no hazard files for {} or {} in {}",
        cycle,
        fallback,
        dir.display()
    )))
}
