use crate::error::OcrError;
use serde::Serialize;

/// Largest accepted smoothing sigma; the kernel spans `8 * sigma + 1` taps
pub const MAX_SIGMA: f64 = 1000.0;

/// Tunable knobs of the line segmenter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentationParams {
    /// Lines whose height deviates from the mean by more than this fraction are dropped
    pub height_ratio_threshold: f64,
    /// Standard deviation of the Gaussian used to smooth the row projection
    pub sigma: f64,
    /// Fraction of the smoothed peak a row must exceed to be active
    pub activity_fraction: f64,
    /// Lower bound for the padding added around each line
    pub min_padding: u32,
    /// Render the projection plot when the caller supplies a destination
    pub plot_projection: bool,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            height_ratio_threshold: 0.75,
            sigma: 3.0,
            activity_fraction: 0.2,
            min_padding: 10,
            plot_projection: false,
        }
    }
}

impl SegmentationParams {
    pub fn validate(&self) -> Result<(), OcrError> {
        if !self.sigma.is_finite() || self.sigma <= 0.0 || self.sigma > MAX_SIGMA {
            return Err(OcrError::InvalidParameter(format!(
                "sigma must be in (0, {}], got {}",
                MAX_SIGMA, self.sigma
            )));
        }
        if !self.height_ratio_threshold.is_finite() || self.height_ratio_threshold < 0.0 {
            return Err(OcrError::InvalidParameter(format!(
                "height_ratio_threshold must be non-negative, got {}",
                self.height_ratio_threshold
            )));
        }
        if !(0.0..1.0).contains(&self.activity_fraction) {
            return Err(OcrError::InvalidParameter(format!(
                "activity_fraction must be in [0, 1), got {}",
                self.activity_fraction
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        assert!(SegmentationParams::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let bad_sigma = SegmentationParams {
            sigma: f64::NAN,
            ..Default::default()
        };
        let bad_ratio = SegmentationParams {
            height_ratio_threshold: -0.1,
            ..Default::default()
        };
        let bad_fraction = SegmentationParams {
            activity_fraction: 1.0,
            ..Default::default()
        };

        assert!(bad_sigma.validate().is_err());
        assert!(bad_ratio.validate().is_err());
        assert!(bad_fraction.validate().is_err());
    }

    #[test]
    fn test_sigma_has_an_upper_bound() {
        let at_limit = SegmentationParams {
            sigma: MAX_SIGMA,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());

        for sigma in [MAX_SIGMA + 1.0, 1e12, f64::INFINITY] {
            let params = SegmentationParams {
                sigma,
                ..Default::default()
            };
            assert!(
                matches!(params.validate(), Err(OcrError::InvalidParameter(_))),
                "sigma {}",
                sigma
            );
        }
    }
}
