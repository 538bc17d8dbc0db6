//! Text line segmentation
//!
//! Cuts a page image into one crop per text line using its horizontal
//! projection profile: Otsu binarization, row sums, Gaussian smoothing,
//! threshold runs, a height outlier filter, then per-line horizontal
//! trimming and padding.

pub mod input;
pub mod params;
pub mod pipeline;
pub mod plot;
pub mod steps;
pub mod types;

pub use input::ImageInput;
pub use params::SegmentationParams;
pub use pipeline::{LineSegmenter, SegmentationResult, StepTiming};
pub use types::{BinaryMask, BoundingBox, LineCrop, Segment};
