//! Interactive track map, a self-contained Plotly page.
use super::tracks::segments;
use crate::{category::Category, cycle::ForecastCycle, error::Result, tracks::ForecastEnsemble};
use serde_json::{json, Value};
use std::{fs, path::Path};
use strum::IntoEnumIterator;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const TITLE: &str = "Tropical Cyclone Tracks";
const LEGEND_TITLE: &str = "Saffir–Simpson Scale";

fn track_traces(fcast: &ForecastEnsemble) -> Vec<Value> {
    fcast
        .members
        .iter()
        .flat_map(|member| {
            let single = ForecastEnsemble {
                run_datetime: None,
                members: vec![member.clone()],
            };
            segments(&single)
                .into_iter()
                .map(move |seg| {
                    json!({
                        "type": "scattergeo",
                        "mode": "lines",
                        "lon": [seg.from.0, seg.to.0],
                        "lat": [seg.from.1, seg.to.1],
                        "line": { "width": 2, "color": seg.category.hex_color() },
                        "name": format!("{} - Cat {}", member.name, seg.category.code()),
                        "showlegend": false,
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn legend_traces() -> Vec<Value> {
    Category::iter()
        .map(|category| {
            json!({
                "type": "scattergeo",
                "mode": "lines",
                "lon": [Value::Null],
                "lat": [Value::Null],
                "line": { "width": 2, "color": category.hex_color() },
                "name": category.name(),
                "showlegend": true,
            })
        })
        .collect()
}

/// The Plotly figure: one trace per track segment, then an empty trace per category for the legend.
pub fn figure(fcast: &ForecastEnsemble, cycle: ForecastCycle) -> Value {
    let mut data = track_traces(fcast);
    data.extend(legend_traces());

    json!({
        "data": data,
        "layout": {
            "title": { "text": format!("{} {}", TITLE, cycle) },
            "geo": {
                "showland": true,
                "showcountries": true,
                "showocean": true,
                "countrywidth": 0.5,
                "landcolor": "rgb(241, 232, 232)",
                "oceancolor": "rgb(255, 255, 255)",
                "projection": { "type": "natural earth" },
            },
            "legend": {
                "title": { "text": LEGEND_TITLE },
                "yanchor": "top",
                "y": 1,
                "xanchor": "left",
                "x": 0.95,
            },
        },
    })
}

pub fn render_html(fcast: &ForecastEnsemble, cycle: ForecastCycle, path: &Path) -> Result<()> {
    let fig = serde_json::to_string(&figure(fcast, cycle))?.replace("</", "<\\/");

    let page = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title} {cycle}</title>
<script src="{cdn}"></script>
</head>
<body>
<div id="tc-tracks" style="width:100%;height:90vh;"></div>
<script>
var fig = {fig};
Plotly.newPlot("tc-tracks", fig.data, fig.layout, {{responsive: true}});
</script>
</body>
</html>
"#,
        title = TITLE,
        cycle = cycle,
        cdn = PLOTLY_CDN,
        fig = fig
    );

    fs::write(path, page)?;
    Ok(())
}
