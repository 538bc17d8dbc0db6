//! Individual segmentation stages, applied in this order

pub mod binarize;
pub mod projection;
pub mod detect;
pub mod height_filter;
pub mod trim;
pub mod crop;
