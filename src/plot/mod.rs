//! Raster and HTML renderings of the forecast.
//!
//! The PNG products are drawn straight onto an RGBA pixel buffer. Titles, labels and the legend text
//! live in the interactive HTML map, the rasters only carry geometry and colour.
use crate::error::Result;
use image::{
    codecs::png::{CompressionType, FilterType, PngEncoder},
    ExtendedColorType, ImageBuffer, ImageEncoder, Rgba,
};
use std::{fs::File, io::BufWriter, path::Path};

pub mod histogram;
pub mod impact_map;
pub mod interactive;
pub mod tracks;

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const GRID: Rgba<u8> = Rgba([200, 200, 200, 255]);
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

pub fn opaque(rgb: [u8; 3]) -> Rgba<u8> {
    Rgba([rgb[0], rgb[1], rgb[2], 255])
}

/// Maps geographic coordinates onto an image with a plate carrée projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equirect {
    pub width: u32,
    pub height: u32,
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl Equirect {
    pub fn to_pixel(&self, lon: f64, lat: f64) -> (f64, f64) {
        let x = (lon - self.lon_min) / (self.lon_max - self.lon_min) * f64::from(self.width);
        let y = (self.lat_max - lat) / (self.lat_max - self.lat_min) * f64::from(self.height);
        (x, y)
    }
}

const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude limit of the Web Mercator projection.
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_78;

/// Project onto Web Mercator (EPSG:3857), returning metres.
pub fn web_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.max(-MERCATOR_MAX_LAT).min(MERCATOR_MAX_LAT);
    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// An RGBA image with a few drawing primitives.
pub struct Canvas {
    img: ImageBuffer<Rgba<u8>, Vec<u8>>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        Canvas {
            img: ImageBuffer::from_pixel(width, height, background),
        }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x < self.width() && y < self.height() {
            Some(*self.img.get_pixel(x, y))
        } else {
            None
        }
    }

    /// Set a pixel, ignoring coordinates off the canvas.
    pub fn put(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x >= 0 && y >= 0 && x < i64::from(self.width()) && y < i64::from(self.height()) {
            self.img.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Fill the rectangle with corners `(x0, y0)` and `(x1, y1)`, inclusive.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba<u8>) {
        for y in y0.min(y1)..=y0.max(y1) {
            for x in x0.min(x1)..=x0.max(x1) {
                self.put(x, y, color);
            }
        }
    }

    /// Outline of a rectangle, one pixel wide.
    pub fn stroke_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba<u8>) {
        self.fill_rect(x0, y0, x1, y0, color);
        self.fill_rect(x0, y1, x1, y1, color);
        self.fill_rect(x0, y0, x0, y1, color);
        self.fill_rect(x1, y0, x1, y1, color);
    }

    /// Bresenham line, widened to a square pen of `thickness` pixels.
    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), thickness: u32, color: Rgba<u8>) {
        let (mut x0, mut y0) = (from.0.round() as i64, from.1.round() as i64);
        let (x1, y1) = (to.0.round() as i64, to.1.round() as i64);

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let half = i64::from(thickness.max(1) - 1) / 2;
        let extra = i64::from(thickness.max(1) - 1) - half;

        loop {
            self.fill_rect(x0 - half, y0 - half, x0 + extra, y0 + extra, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        let encoder =
            PngEncoder::new_with_quality(writer, CompressionType::Default, FilterType::Adaptive);
        encoder.write_image(
            self.img.as_raw(),
            self.width(),
            self.height(),
            ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }
}
