//! Static overview map of every forecast track.
use super::{opaque, Canvas, Equirect, BLACK, GRID};
use crate::{
    category::Category,
    error::Result,
    tracks::{normalize_lon, ForecastEnsemble},
};
use image::Rgba;
use std::path::Path;
use strum::IntoEnumIterator;
use tracing::debug;

pub const OVERVIEW_WIDTH: u32 = 1440;
pub const OVERVIEW_HEIGHT: u32 = 640;

const BACKGROUND: Rgba<u8> = Rgba([241, 232, 232, 255]);
const GRATICULE_STEP_DEG: i32 = 30;
const TRACK_WIDTH: u32 = 2;
const SWATCH: i64 = 14;

pub fn overview_projection() -> Equirect {
    Equirect {
        width: OVERVIEW_WIDTH,
        height: OVERVIEW_HEIGHT,
        lon_min: -180.0,
        lon_max: 180.0,
        lat_min: -80.0,
        lat_max: 80.0,
    }
}

/// A piece of track between two consecutive points, coloured by the category at its start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub category: Category,
}

/// Split every member's track into coloured segments, longitudes wrapped to [-180, 180).
///
/// Segments that would cross the antimeridian are dropped rather than drawn across the whole map.
pub fn segments(fcast: &ForecastEnsemble) -> Vec<Segment> {
    let mut segs = vec![];
    for member in &fcast.members {
        for pair in member.points.windows(2) {
            let (p0, p1) = (&pair[0], &pair[1]);
            let (lon0, lon1) = (normalize_lon(p0.lon), normalize_lon(p1.lon));

            if (lon1 - lon0).abs() > 180.0 {
                continue;
            }

            if let Some(category) = Category::from_wind_speed(p0.max_sustained_wind) {
                segs.push(Segment {
                    from: (lon0, p0.lat),
                    to: (lon1, p1.lat),
                    category,
                });
            }
        }
    }
    segs
}

fn draw_graticule(canvas: &mut Canvas, proj: &Equirect) {
    for lon in (-180..=180).step_by(GRATICULE_STEP_DEG as usize) {
        let top = proj.to_pixel(f64::from(lon), proj.lat_max);
        let bottom = proj.to_pixel(f64::from(lon), proj.lat_min);
        canvas.line(top, bottom, 1, GRID);
    }

    let mut lat = -(80 / GRATICULE_STEP_DEG) * GRATICULE_STEP_DEG;
    while f64::from(lat) <= proj.lat_max {
        let left = proj.to_pixel(proj.lon_min, f64::from(lat));
        let right = proj.to_pixel(proj.lon_max, f64::from(lat));
        canvas.line(left, right, 1, GRID);
        lat += GRATICULE_STEP_DEG;
    }
}

fn draw_legend(canvas: &mut Canvas) {
    let y1 = i64::from(canvas.height()) - 10;
    let y0 = y1 - SWATCH;

    for (i, category) in Category::iter().enumerate() {
        let x0 = 10 + i as i64 * (SWATCH + 6);
        canvas.fill_rect(x0, y0, x0 + SWATCH, y1, opaque(category.rgb()));
        canvas.stroke_rect(x0, y0, x0 + SWATCH, y1, BLACK);
    }
}

/// Draw the tracks of every member on a world map. An empty forecast still produces the map.
pub fn render_overview(fcast: &ForecastEnsemble, path: &Path) -> Result<()> {
    let proj = overview_projection();
    let mut canvas = Canvas::new(proj.width, proj.height, BACKGROUND);

    draw_graticule(&mut canvas, &proj);

    let segs = segments(fcast);
    for seg in &segs {
        let from = proj.to_pixel(seg.from.0, seg.from.1);
        let to = proj.to_pixel(seg.to.0, seg.to.1);
        canvas.line(from, to, TRACK_WIDTH, opaque(seg.category.rgb()));
    }

    draw_legend(&mut canvas);
    canvas.stroke_rect(
        0,
        0,
        i64::from(proj.width) - 1,
        i64::from(proj.height) - 1,
        BLACK,
    );

    canvas.save_png(path)?;
    debug!("drew {} track segments to {}", segs.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tracks::test::member;

    #[test]
    fn test_segments_colored_by_start() {
        let fcast = ForecastEnsemble {
            run_datetime: None,
            members: vec![member("Milton", "14L", 1, &[15.0, 40.0, 75.0])],
        };

        let segs = segments(&fcast);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].category, Category::TropicalDepression);
        assert_eq!(segs[1].category, Category::Cat1);
        assert_eq!(segs[0].from, (-90.0, 22.0));
        assert_eq!(segs[0].to, (-89.0, 22.5));
    }

    #[test]
    fn test_antimeridian_segments_dropped() {
        let mut m = member("Yagi", "11W", 1, &[30.0, 30.0, 30.0]);
        m.points[0].lon = 179.0;
        m.points[1].lon = 181.0;
        m.points[2].lon = 182.0;

        let fcast = ForecastEnsemble {
            run_datetime: None,
            members: vec![m],
        };

        let segs = segments(&fcast);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].from, (-179.0, 22.5));
        assert_eq!(segs[0].to, (-178.0, 23.0));
    }

    #[test]
    fn test_render_empty_and_full() {
        let dir = tempfile::tempdir().unwrap();

        let empty = dir.path().join("empty.png");
        render_overview(&ForecastEnsemble::default(), &empty).unwrap();
        assert!(empty.exists());

        let full = dir.path().join("full.png");
        let fcast = ForecastEnsemble {
            run_datetime: None,
            members: vec![
                member("Milton", "14L", 1, &[30.0, 45.0, 60.0]),
                member("Milton", "14L", 2, &[28.0, 33.0]),
            ],
        };
        render_overview(&fcast, &full).unwrap();
        assert!(full.exists());
    }
}
