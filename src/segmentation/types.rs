use image::{DynamicImage, GrayImage};
use serde::Serialize;

/// Value of an ink pixel in a [`BinaryMask`]
pub const FOREGROUND: u8 = 255;

/// Single channel ink mask: ink pixels are [`FOREGROUND`], background is 0
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask(GrayImage);

impl BinaryMask {
    /// Wrap a grayscale buffer, collapsing every non-zero sample to [`FOREGROUND`]
    pub fn from_gray(gray: GrayImage) -> Self {
        let mut mask = gray;
        for pixel in mask.pixels_mut() {
            if pixel.0[0] != 0 {
                pixel.0[0] = FOREGROUND;
            }
        }
        Self(mask)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    /// Raw samples of row `y`
    pub fn row(&self, y: u32) -> &[u8] {
        let width = self.0.width() as usize;
        let start = y as usize * width;
        &self.0.as_raw()[start..start + width]
    }
}

/// Inclusive row range of a contiguous run of active rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub y0: u32,
    pub y1: u32,
}

impl Segment {
    pub fn new(y0: u32, y1: u32) -> Self {
        debug_assert!(y0 <= y1, "segment rows out of order: {} > {}", y0, y1);
        Self { y0, y1 }
    }

    /// Row span as used by the height filter (`y1 - y0`, so a one-row run is 0)
    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

/// Axis-aligned box in source image coordinates with exclusive upper bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl BoundingBox {
    /// Build a box from signed corners, clipping to `[0, width] x [0, height]`.
    /// Returns `None` when nothing is left after clipping.
    pub fn clipped(x0: i64, y0: i64, x1: i64, y1: i64, width: u32, height: u32) -> Option<Self> {
        let x0 = x0.clamp(0, width as i64) as u32;
        let y0 = y0.clamp(0, height as i64) as u32;
        let x1 = x1.clamp(0, width as i64) as u32;
        let y1 = y1.clamp(0, height as i64) as u32;

        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Self { x0, y0, x1, y1 })
    }

    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

/// One detected text line: the cropped pixels and where they came from
#[derive(Debug, Clone)]
pub struct LineCrop {
    pub image: DynamicImage,
    pub bbox: BoundingBox,
}
