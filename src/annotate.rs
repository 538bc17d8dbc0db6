use crate::error::OcrError;
use crate::segmentation::BoundingBox;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::io::Cursor;

/// Box colors, cycled by line index
pub const PALETTE: [Rgb<u8>; 6] = [
    Rgb([0, 0, 255]),
    Rgb([0, 255, 0]),
    Rgb([255, 0, 0]),
    Rgb([0, 255, 255]),
    Rgb([255, 255, 0]),
    Rgb([255, 0, 255]),
];

const STROKE: u32 = 2;

/// Copy of `image` with every line box outlined
pub fn draw_line_boxes(image: &DynamicImage, boxes: &[BoundingBox]) -> RgbImage {
    let mut canvas = image.to_rgb8();

    for (i, bbox) in boxes.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        // Stroke grows inward so it never leaves the image
        for inset in 0..STROKE {
            let w = bbox.width().saturating_sub(2 * inset);
            let h = bbox.height().saturating_sub(2 * inset);
            if w == 0 || h == 0 {
                break;
            }
            let rect = Rect::at((bbox.x0 + inset) as i32, (bbox.y0 + inset) as i32).of_size(w, h);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }
    }

    canvas
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, OcrError> {
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| OcrError::Internal(format!("Failed to encode PNG: {}", e)))?;
    Ok(png)
}
