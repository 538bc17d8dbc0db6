use crate::segmentation::types::Segment;

/// Group rows whose smoothed projection exceeds `activity_fraction` of the
/// peak into maximal runs of consecutive rows.
///
/// Returns an empty list for an empty or all-zero projection.
pub fn apply(smoothed: &[f64], activity_fraction: f64) -> Vec<Segment> {
    let peak = smoothed.iter().copied().fold(0.0f64, f64::max);
    let threshold = peak * activity_fraction;

    let active = smoothed
        .iter()
        .enumerate()
        .filter(|(_, &v)| v > threshold)
        .map(|(row, _)| row as u32);

    let segments = group_runs(active);

    tracing::debug!(
        peak,
        threshold,
        segments = segments.len(),
        "Detected active row runs"
    );

    segments
}

/// Collapse an ascending sequence of indices into inclusive runs
fn group_runs(indices: impl IntoIterator<Item = u32>) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut run: Option<(u32, u32)> = None;

    for index in indices {
        run = match run {
            Some((start, prev)) if index == prev + 1 => Some((start, index)),
            Some((start, prev)) => {
                segments.push(Segment::new(start, prev));
                Some((index, index))
            }
            None => Some((index, index)),
        };
    }

    if let Some((start, end)) = run {
        segments.push(Segment::new(start, end));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_consecutive_rows() {
        let segments = group_runs([2, 3, 4, 7, 9, 10]);
        assert_eq!(
            segments,
            vec![Segment::new(2, 4), Segment::new(7, 7), Segment::new(9, 10)]
        );
    }

    #[test]
    fn test_threshold_is_strict() {
        // peak 10, threshold 2: rows equal to 2 are not active
        let smoothed = [0.0, 2.0, 5.0, 10.0, 2.0, 2.5, 0.0];
        assert_eq!(
            apply(&smoothed, 0.2),
            vec![Segment::new(2, 3), Segment::new(5, 5)]
        );
    }

    #[test]
    fn test_flat_zero_projection_has_no_segments() {
        assert!(apply(&[0.0; 12], 0.2).is_empty());
        assert!(apply(&[], 0.2).is_empty());
    }

    #[test]
    fn test_segments_are_disjoint_and_ordered() {
        let smoothed: Vec<f64> = (0..200)
            .map(|r| if (r / 10) % 3 == 0 { 50.0 } else { 0.0 })
            .collect();
        let segments = apply(&smoothed, 0.2);

        assert_eq!(segments.len(), 7);
        for pair in segments.windows(2) {
            assert!(pair[0].y1 + 1 < pair[1].y0);
        }
    }
}
