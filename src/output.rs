//! Writing the forecast products.
//!
//! Every product name is built from the summary it belongs to, so a rerun for the same cycle
//! overwrites the earlier files instead of piling up new ones.
use crate::{
    cycle::ForecastCycle,
    engine::ExposurePoint,
    error::Result,
    summary::{pad_ensemble, ImpactSummary, WEATHER_MODEL},
};
use serde_json::{json, Value};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};
use strum_macros::EnumIter;
use tracing::debug;

/// The products made for each storm, country and impact type.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumIter)]
pub enum ArtifactKind {
    Summary,
    Map,
    Histogram,
    Gdf,
    AtEvent,
}

impl ArtifactKind {
    fn prefix(self) -> &'static str {
        match self {
            ArtifactKind::Summary | ArtifactKind::AtEvent => "impact-summary",
            ArtifactKind::Map => "impact-map",
            ArtifactKind::Histogram => "impact-histogram",
            ArtifactKind::Gdf => "impact-gdf",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Summary => "json",
            ArtifactKind::Map | ArtifactKind::Histogram => "png",
            ArtifactKind::Gdf => "geojson",
            ArtifactKind::AtEvent => "csv",
        }
    }
}

/// File name of a product, e.g.
/// `impact-summary_TC_ECMWF_ens_Milton_2024-08-25_00UTC_USA_displacement.json`.
pub fn artifact_file_name(summary: &ImpactSummary, kind: ArtifactKind) -> String {
    format!(
        "{}_{}_{}_ens_{}_{}_{}_{}.{}",
        kind.prefix(),
        summary.hazard_type,
        WEATHER_MODEL,
        summary.event_name,
        summary.initialization_time,
        summary.country_iso3,
        summary.impact_type,
        kind.extension()
    )
}

/// Directory holding the products of one cycle.
pub fn cycle_dir(output_root: &Path, cycle: ForecastCycle) -> PathBuf {
    output_root.join(cycle.to_string())
}

/// Create the directory for a cycle's products if it isn't there yet.
pub fn ensure_cycle_dir(output_root: &Path, cycle: ForecastCycle) -> Result<PathBuf> {
    let dir = cycle_dir(output_root, cycle);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn track_overview_png_name(cycle: ForecastCycle) -> String {
    format!("{}_TC_tracks_{}.png", WEATHER_MODEL, cycle)
}

pub fn track_overview_html_name(cycle: ForecastCycle) -> String {
    format!("{}_TC_tracks_interactive_map_{}.html", WEATHER_MODEL, cycle)
}

fn write_pretty_json(value: &Value, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
    serde::Serialize::serialize(value, &mut ser)?;
    writer.flush()?;
    Ok(())
}

/// Save a summary as a GeoJSON feature collection holding a single feature with no geometry.
pub fn write_summary_geojson(summary: &ImpactSummary, path: &Path) -> Result<()> {
    let geojson = json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": summary,
                "geometry": Value::Null,
            }
        ]
    });

    write_pretty_json(&geojson, path)?;
    debug!("wrote {}", path.display());
    Ok(())
}

/// Read back the summaries stored in a file written by [`write_summary_geojson`].
pub fn read_summary_geojson(path: &Path) -> Result<Vec<ImpactSummary>> {
    let geojson: Value = serde_json::from_reader(BufReader::new(File::open(path)?))?;

    let features = geojson
        .get("features")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    features
        .into_iter()
        .filter_map(|mut feature| feature.get_mut("properties").map(Value::take))
        .map(|props| serde_json::from_value(props).map_err(Into::into))
        .collect()
}

/// Save the impact of every ensemble member, one row per member of the full ensemble.
///
/// Members that were not in the hazard are written as zero with `computed` set to false.
pub fn write_at_event_csv(at_event: &[f64], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&["ensemble_member", "impact", "computed"])?;

    for (i, impact) in pad_ensemble(at_event).iter().enumerate() {
        wtr.write_record(&[
            (i + 1).to_string(),
            impact.to_string(),
            (i < at_event.len()).to_string(),
        ])?;
    }
    wtr.flush()?;

    debug!("wrote {}", path.display());
    Ok(())
}

/// Save the ensemble average impact at each exposure point as GeoJSON points.
pub fn write_gdf_geojson(points: &[ExposurePoint], path: &Path) -> Result<()> {
    let features: Vec<Value> = points
        .iter()
        .map(|pnt| {
            json!({
                "type": "Feature",
                "properties": { "value": pnt.value },
                "geometry": {
                    "type": "Point",
                    "coordinates": [pnt.lon, pnt.lat],
                },
            })
        })
        .collect();

    let geojson = json!({
        "type": "FeatureCollection",
        "features": features,
    });

    write_pretty_json(&geojson, path)?;
    debug!("wrote {} points to {}", points.len(), path.display());
    Ok(())
}
