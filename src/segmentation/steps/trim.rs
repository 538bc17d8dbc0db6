use super::projection::column_profile;
use crate::segmentation::types::{BinaryMask, BoundingBox, Segment};

/// Tighten a row segment to its inked columns and pad it on all sides.
///
/// Padding is `max(min_padding, height / 2)`. Returns `None` if the strip has
/// no ink at all or the padded box clips away to nothing.
pub fn apply(mask: &BinaryMask, segment: Segment, min_padding: u32) -> Option<BoundingBox> {
    let columns = column_profile(mask, segment.y0, segment.y1);
    let first = columns.iter().position(|&sum| sum > 0)?;
    let last = columns.iter().rposition(|&sum| sum > 0)?;

    let x0 = first as i64;
    let x1 = last as i64 + 1;
    let pad = min_padding.max(segment.height() / 2) as i64;

    BoundingBox::clipped(
        x0 - pad,
        segment.y0 as i64 - pad,
        x1 + pad,
        segment.y1 as i64 + pad,
        mask.width(),
        mask.height(),
    )
}
