//! Diagnostic rendering of the horizontal projection profile
//!
//! The plot puts the smoothed row sum on the x axis and the row index on the
//! y axis, growing downward so the curve lines up with the page it came from.

use crate::error::OcrError;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::path::Path;

pub const PLOT_WIDTH: u32 = 800;
pub const PLOT_HEIGHT: u32 = 400;

const MARGIN_LEFT: u32 = 60;
const MARGIN_RIGHT: u32 = 20;
const MARGIN_TOP: u32 = 20;
const MARGIN_BOTTOM: u32 = 40;
const TICKS: u32 = 5;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const CURVE: Rgb<u8> = Rgb([31, 119, 180]);

/// Draw the smoothed projection into a fresh RGB canvas
pub fn render(smoothed: &[f64]) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(PLOT_WIDTH, PLOT_HEIGHT, BACKGROUND);

    let left = MARGIN_LEFT as f32;
    let top = MARGIN_TOP as f32;
    let plot_w = (PLOT_WIDTH - MARGIN_LEFT - MARGIN_RIGHT) as f32;
    let plot_h = (PLOT_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM) as f32;

    for i in 1..TICKS {
        let fx = left + plot_w * i as f32 / TICKS as f32;
        let fy = top + plot_h * i as f32 / TICKS as f32;
        draw_line_segment_mut(&mut canvas, (fx, top), (fx, top + plot_h), GRID);
        draw_line_segment_mut(&mut canvas, (left, fy), (left + plot_w, fy), GRID);
    }
    for i in 0..=TICKS {
        let fx = left + plot_w * i as f32 / TICKS as f32;
        let fy = top + plot_h * i as f32 / TICKS as f32;
        draw_line_segment_mut(&mut canvas, (fx, top + plot_h), (fx, top + plot_h + 5.0), AXIS);
        draw_line_segment_mut(&mut canvas, (left - 5.0, fy), (left, fy), AXIS);
    }

    let frame = Rect::at(MARGIN_LEFT as i32, MARGIN_TOP as i32).of_size(
        PLOT_WIDTH - MARGIN_LEFT - MARGIN_RIGHT,
        PLOT_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM,
    );
    draw_hollow_rect_mut(&mut canvas, frame, AXIS);

    let peak = smoothed.iter().copied().fold(0.0f64, f64::max);
    let last_row = smoothed.len().saturating_sub(1).max(1) as f32;
    let point = |row: usize, value: f64| {
        let x = if peak > 0.0 {
            left + plot_w * (value / peak) as f32
        } else {
            left
        };
        // Row 0 at the top of the plot
        let y = top + plot_h * row as f32 / last_row;
        (x, y)
    };

    for (row, pair) in smoothed.windows(2).enumerate() {
        draw_line_segment_mut(
            &mut canvas,
            point(row, pair[0]),
            point(row + 1, pair[1]),
            CURVE,
        );
    }

    canvas
}

/// Render the plot and write it to `path`, creating parent directories.
/// The format follows the file extension.
pub fn write(smoothed: &[f64], path: &Path) -> Result<(), OcrError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            OcrError::PlotError(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }

    render(smoothed)
        .save(path)
        .map_err(|e| OcrError::PlotError(format!("Failed to write {}: {}", path.display(), e)))
}
