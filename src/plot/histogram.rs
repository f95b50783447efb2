//! Probability histogram of the ensemble impact.
use super::{Canvas, GRID, WHITE};
use crate::{error::Result, summary::mean};
use image::Rgba;
use std::path::Path;
use textplots::{Chart, Plot, Shape};

/// Number of bins in the impact histograms.
pub const NUM_BINS: usize = 40;

const WIDTH: u32 = 600;
const HEIGHT: u32 = 400;
const MARGIN: i64 = 40;
const BAR: Rgba<u8> = Rgba([176, 196, 222, 255]);

/// Equal width bins over the range of the values, as a percentage of the values in each bin.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub min: f64,
    pub bin_width: f64,
    pub probabilities: Vec<f64>,
    pub mean: f64,
}

impl Histogram {
    /// Values that are all equal end up in a single bin holding 100%.
    pub fn from_values(values: &[f64], num_bins: usize) -> Self {
        let finite: Vec<f64> = values.iter().cloned().filter(|v| v.is_finite()).collect();
        let min = finite.iter().cloned().fold(std::f64::INFINITY, f64::min);
        let max = finite.iter().cloned().fold(std::f64::NEG_INFINITY, f64::max);

        if finite.is_empty() {
            return Histogram {
                min: 0.0,
                bin_width: 0.0,
                probabilities: vec![],
                mean: std::f64::NAN,
            };
        }

        let range = max - min;
        if range == 0.0 || num_bins < 2 {
            return Histogram {
                min,
                bin_width: range,
                probabilities: vec![100.0],
                mean: mean(&finite),
            };
        }

        let bin_width = range / num_bins as f64;
        let mut counts = vec![0usize; num_bins];
        for v in &finite {
            let idx = (((v - min) / bin_width) as usize).min(num_bins - 1);
            counts[idx] += 1;
        }

        let total = finite.len() as f64;
        Histogram {
            min,
            bin_width,
            probabilities: counts
                .into_iter()
                .map(|c| c as f64 / total * 100.0)
                .collect(),
            mean: mean(&finite),
        }
    }

    /// Lower edge of every bin.
    pub fn lower_edges(&self) -> Vec<f64> {
        (0..self.probabilities.len())
            .map(|i| self.min + i as f64 * self.bin_width)
            .collect()
    }

    fn max_probability(&self) -> f64 {
        self.probabilities.iter().cloned().fold(0.0, f64::max)
    }

    pub fn render_png(&self, path: &Path) -> Result<()> {
        let mut canvas = Canvas::new(WIDTH, HEIGHT, WHITE);

        let left = MARGIN;
        let right = i64::from(WIDTH) - MARGIN;
        let top = MARGIN;
        let bottom = i64::from(HEIGHT) - MARGIN;

        // Horizontal grid every 10%.
        let y_max = (self.max_probability() / 10.0).ceil().max(1.0) * 10.0;
        let to_y = |p: f64| bottom - ((p / y_max) * (bottom - top) as f64).round() as i64;
        let mut p = 0.0;
        while p <= y_max {
            canvas.fill_rect(left, to_y(p), right, to_y(p), GRID);
            p += 10.0;
        }

        let n = self.probabilities.len().max(1) as i64;
        let bar_px = (right - left) / n;
        for (i, &prob) in self.probabilities.iter().enumerate() {
            let x0 = left + i as i64 * bar_px;
            let x1 = x0 + bar_px - 1;
            if prob > 0.0 {
                canvas.fill_rect(x0, to_y(prob), x1, bottom, BAR);
                canvas.fill_rect(x1, to_y(prob), x1, bottom, WHITE);
            }
        }

        canvas.save_png(path)
    }

    /// Draw the histogram in the terminal.
    pub fn print_chart(&self) {
        if self.probabilities.is_empty() {
            return;
        }

        let mut steps: Vec<(f32, f32)> = self
            .lower_edges()
            .into_iter()
            .zip(self.probabilities.iter())
            .map(|(x, &p)| (x as f32, p as f32))
            .collect();

        let x_max = self.min + self.bin_width * self.probabilities.len() as f64;
        if let Some(&(_, last)) = steps.last() {
            steps.push((x_max as f32, last));
        }

        let x_min = self.min as f32;
        let x_max = if x_max > self.min {
            x_max as f32
        } else {
            x_min + 1.0
        };

        Chart::new(160, 45, x_min, x_max)
            .lineplot(&Shape::Steps(steps.as_slice()))
            .nice();
    }
}
