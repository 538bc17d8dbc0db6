use crate::segmentation::types::Segment;

/// Drop segments whose height is further than `ratio * mean` from the mean height.
///
/// The mean is taken once over the unfiltered input; removing an outlier does
/// not re-normalize the others. A lone segment always equals the mean and is kept.
pub fn apply(segments: Vec<Segment>, ratio: f64) -> Vec<Segment> {
    if segments.is_empty() {
        return segments;
    }

    let mean = segments.iter().map(|s| s.height() as f64).sum::<f64>() / segments.len() as f64;
    let tolerance = ratio * mean;

    let before = segments.len();
    let kept: Vec<Segment> = segments
        .into_iter()
        .filter(|s| (s.height() as f64 - mean).abs() <= tolerance)
        .collect();

    if kept.len() < before {
        tracing::debug!(
            mean_height = mean,
            dropped = before - kept.len(),
            "Rejected segments by height deviation"
        );
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_heights(heights: &[u32]) -> Vec<Segment> {
        let mut y = 0;
        heights
            .iter()
            .map(|&h| {
                let segment = Segment::new(y, y + h);
                y += h + 50;
                segment
            })
            .collect()
    }

    #[test]
    fn test_singleton_is_always_kept() {
        for height in [0, 3, 400] {
            assert_eq!(apply(with_heights(&[height]), 0.75).len(), 1);
        }
    }

    #[test]
    fn test_tall_outlier_is_dropped() {
        let kept = apply(with_heights(&[20, 20, 20, 100]), 0.75);
        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|s| s.height() == 20));
    }

    #[test]
    fn test_mean_is_not_recomputed_after_dropping() {
        // mean = (10 + 10 + 40 + 100) / 4 = 40, tolerance = 30.
        // 10 and 40 are within 30 of 40, 100 is not. An iterative filter would
        // recompute the mean as 20 and then reject the 40.
        let kept = apply(with_heights(&[10, 10, 40, 100]), 0.75);
        let heights: Vec<u32> = kept.iter().map(|s| s.height()).collect();
        assert_eq!(heights, vec![10, 10, 40]);
    }

    #[test]
    fn test_zero_mean_keeps_everything() {
        assert_eq!(apply(with_heights(&[0, 0, 0]), 0.75).len(), 3);
        assert!(apply(Vec::new(), 0.75).is_empty());
    }
}
