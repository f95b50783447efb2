//! Map of the ensemble average impact, binned on a Web Mercator grid.
use super::{opaque, web_mercator, Canvas, BLACK, TRANSPARENT};
use crate::{category::hex_to_rgb, engine::ExposurePoint, error::Result};
use image::Rgba;
use std::path::Path;
use tracing::debug;

/// Cells with a summed impact below this are left transparent.
pub const MIN_VISIBLE_IMPACT: f64 = 10.0;

/// Number of grid cells across the map.
pub const GRID_SIZE: usize = 200;

const CELL_PX: u32 = 4;
const COLORBAR_PX: u32 = 20;

/// ColorBrewer YlOrBr, light to dark.
const YL_OR_BR: [&str; 9] = [
    "#ffffe5", "#fff7bc", "#fee391", "#fec44f", "#fe9929", "#ec7014", "#cc4c02", "#993404",
    "#662506",
];

/// Colour for a position in [0, 1] along the YlOrBr ramp.
pub fn yl_or_br(frac: f64) -> [u8; 3] {
    let frac = if frac.is_nan() { 0.0 } else { frac.max(0.0).min(1.0) };
    let pos = frac * (YL_OR_BR.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = (lower + 1).min(YL_OR_BR.len() - 1);
    let t = pos - lower as f64;

    let (c0, c1) = (hex_to_rgb(YL_OR_BR[lower]), hex_to_rgb(YL_OR_BR[upper]));
    let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    [mix(c0[0], c1[0]), mix(c0[1], c1[1]), mix(c0[2], c1[2])]
}

/// Impact summed into square cells of a Web Mercator grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactGrid {
    pub cols: usize,
    pub rows: usize,
    /// Row major, row 0 at the top (north).
    pub cells: Vec<f64>,
    max: f64,
}

impl ImpactGrid {
    pub fn from_points(points: &[ExposurePoint], grid_size: usize) -> Self {
        let projected: Vec<(f64, f64, f64)> = points
            .iter()
            .filter(|p| p.value.is_finite())
            .map(|p| {
                let (x, y) = web_mercator(p.lon, p.lat);
                (x, y, p.value)
            })
            .collect();

        if projected.is_empty() || grid_size == 0 {
            return ImpactGrid {
                cols: 1,
                rows: 1,
                cells: vec![0.0],
                max: 0.0,
            };
        }

        let (mut x_min, mut x_max) = (std::f64::INFINITY, std::f64::NEG_INFINITY);
        let (mut y_min, mut y_max) = (std::f64::INFINITY, std::f64::NEG_INFINITY);
        for &(x, y, _) in &projected {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }

        let span = (x_max - x_min).max(y_max - y_min);
        let cell = if span > 0.0 {
            span / grid_size as f64
        } else {
            1.0
        };

        let cols = (((x_max - x_min) / cell).floor() as usize + 1).min(grid_size);
        let rows = (((y_max - y_min) / cell).floor() as usize + 1).min(grid_size);

        let mut cells = vec![0.0; cols * rows];
        for (x, y, value) in projected {
            let col = (((x - x_min) / cell) as usize).min(cols - 1);
            let row = (((y_max - y) / cell) as usize).min(rows - 1);
            cells[row * cols + col] += value;
        }

        let max = cells.iter().cloned().fold(0.0, f64::max);
        ImpactGrid {
            cols,
            rows,
            cells,
            max,
        }
    }

    /// Largest summed cell value.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Colour of a cell: transparent below [`MIN_VISIBLE_IMPACT`], otherwise scaled from that
    /// threshold up to the grid maximum.
    pub fn color(&self, value: f64) -> Rgba<u8> {
        if value < MIN_VISIBLE_IMPACT {
            return TRANSPARENT;
        }

        let frac = if self.max > MIN_VISIBLE_IMPACT {
            (value - MIN_VISIBLE_IMPACT) / (self.max - MIN_VISIBLE_IMPACT)
        } else {
            1.0
        };
        opaque(yl_or_br(frac))
    }
}

pub fn render(points: &[ExposurePoint], path: &Path) -> Result<()> {
    let grid = ImpactGrid::from_points(points, GRID_SIZE);

    let map_w = grid.cols as u32 * CELL_PX;
    let map_h = grid.rows as u32 * CELL_PX;
    let mut canvas = Canvas::new(map_w + 2 * COLORBAR_PX, map_h, TRANSPARENT);

    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let color = grid.color(grid.cells[row * grid.cols + col]);
            if color == TRANSPARENT {
                continue;
            }
            let x0 = i64::from(col as u32 * CELL_PX);
            let y0 = i64::from(row as u32 * CELL_PX);
            let edge = i64::from(CELL_PX) - 1;
            canvas.fill_rect(x0, y0, x0 + edge, y0 + edge, color);
        }
    }

    // Colour bar, dark at the top.
    let bar_x0 = i64::from(map_w + COLORBAR_PX / 2);
    let bar_x1 = bar_x0 + i64::from(COLORBAR_PX) - 1;
    let bar_h = i64::from(map_h);
    for y in 0..bar_h {
        let frac = 1.0 - y as f64 / (bar_h - 1).max(1) as f64;
        canvas.fill_rect(bar_x0, y, bar_x1, y, opaque(yl_or_br(frac)));
    }
    canvas.stroke_rect(bar_x0, 0, bar_x1, bar_h - 1, BLACK);

    canvas.save_png(path)?;
    debug!(
        "mapped {} points on a {}x{} grid to {}",
        points.len(),
        grid.cols,
        grid.rows,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn pnt(lon: f64, lat: f64, value: f64) -> ExposurePoint {
        ExposurePoint { lon, lat, value }
    }

    #[test]
    fn test_ramp_ends() {
        assert_eq!(yl_or_br(0.0), [0xff, 0xff, 0xe5]);
        assert_eq!(yl_or_br(1.0), [0x66, 0x25, 0x06]);
        assert_eq!(yl_or_br(7.0), yl_or_br(1.0));
        assert_eq!(yl_or_br(0.125), [0xff, 0xf7, 0xbc]);
    }

    #[test]
    fn test_points_summed_per_cell() {
        let points = vec![
            pnt(-82.0, 28.0, 6.0),
            pnt(-82.0, 28.0, 6.0),
            pnt(-80.0, 26.0, 3.0),
        ];
        let grid = ImpactGrid::from_points(&points, 10);

        assert!(grid.cols <= 10 && grid.rows <= 10);
        assert_eq!(grid.max(), 12.0);
        assert_eq!(grid.cells.iter().sum::<f64>(), 15.0);
        // North-west corner holds the pair.
        assert_eq!(grid.cells[0], 12.0);
    }

    #[test]
    fn test_small_cells_transparent() {
        let grid = ImpactGrid::from_points(&[pnt(0.0, 0.0, 100.0), pnt(1.0, 1.0, 5.0)], 10);
        assert_eq!(grid.color(5.0), TRANSPARENT);
        assert_eq!(grid.color(9.99), TRANSPARENT);
        assert_eq!(grid.color(10.0), opaque(yl_or_br(0.0)));
        assert_eq!(grid.color(100.0), opaque(yl_or_br(1.0)));
    }

    #[test]
    fn test_render() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.png");
        render(
            &[pnt(-82.5, 27.9, 1500.0), pnt(-81.4, 28.5, 20.0), pnt(-80.2, 25.8, 3.0)],
            &path,
        )
        .unwrap();
        assert!(path.exists());

        let empty = dir.path().join("empty.png");
        render(&[], &empty).unwrap();
        assert!(empty.exists());
    }
}
