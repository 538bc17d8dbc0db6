use crate::segmentation::types::{BoundingBox, LineCrop};
use image::DynamicImage;

/// Copy the boxed region out of the source image, keeping its color type.
/// Boxes that fall outside the image or have no area yield `None`.
pub fn apply(image: &DynamicImage, bbox: BoundingBox) -> Option<LineCrop> {
    if bbox.x1 > image.width() || bbox.y1 > image.height() {
        return None;
    }
    if bbox.width() == 0 || bbox.height() == 0 {
        return None;
    }

    let crop = image.crop_imm(bbox.x0, bbox.y0, bbox.width(), bbox.height());
    Some(LineCrop { image: crop, bbox })
}
