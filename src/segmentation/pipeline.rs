use crate::segmentation::input::ImageInput;
use crate::segmentation::params::SegmentationParams;
use crate::segmentation::plot;
use crate::segmentation::steps;
use crate::segmentation::types::{BinaryMask, LineCrop, Segment};
use image::DynamicImage;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

/// Timing information for a single segmentation stage
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Lines found in one image, top to bottom
#[derive(Debug, Clone, Default)]
pub struct SegmentationResult {
    pub lines: Vec<LineCrop>,
    /// Smoothed row projection the lines were cut from
    pub projection: Vec<f64>,
    pub total_time_ms: u64,
    pub steps: Vec<StepTiming>,
}

/// Splits a page image into single text lines using its horizontal projection profile
#[derive(Debug, Clone, Default)]
pub struct LineSegmenter {
    params: SegmentationParams,
}

impl LineSegmenter {
    pub fn new(params: SegmentationParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SegmentationParams {
        &self.params
    }

    /// Decode the input and segment it. Inputs that fail to decode produce no lines.
    pub fn segment(&self, input: ImageInput, plot_path: Option<&Path>) -> SegmentationResult {
        match input.load() {
            Ok(image) => self.segment_image(&image, plot_path),
            Err(e) => {
                tracing::warn!("Skipping segmentation: {}", e);
                SegmentationResult::default()
            }
        }
    }

    /// Segment an already decoded image.
    ///
    /// When plotting is enabled and `plot_path` is given, the smoothed
    /// projection is also rendered there. Plot failures are logged only.
    pub fn segment_image(
        &self,
        image: &DynamicImage,
        plot_path: Option<&Path>,
    ) -> SegmentationResult {
        let start = Instant::now();
        let mut timings = Vec::new();
        let params = &self.params;

        let mask = run_step("binarize", &mut timings, || steps::binarize::apply(image));

        let projection = run_step("project", &mut timings, || {
            let profile = steps::projection::row_profile(&mask);
            steps::projection::smooth(&profile, params.sigma)
        });

        if params.plot_projection {
            if let Some(path) = plot_path {
                run_step("plot", &mut timings, || {
                    if let Err(e) = plot::write(&projection, path) {
                        tracing::warn!("{}", e);
                    }
                });
            }
        }

        let segments = run_step("detect", &mut timings, || {
            steps::detect::apply(&projection, params.activity_fraction)
        });

        if segments.is_empty() {
            tracing::debug!("No active rows, nothing to segment");
            return SegmentationResult {
                lines: Vec::new(),
                projection,
                total_time_ms: start.elapsed().as_millis() as u64,
                steps: timings,
            };
        }

        let segments = run_step("height_filter", &mut timings, || {
            steps::height_filter::apply(segments, params.height_ratio_threshold)
        });

        let lines = run_step("crop", &mut timings, || {
            crop_lines(image, &mask, &segments, params.min_padding)
        });

        tracing::debug!(
            lines = lines.len(),
            width = image.width(),
            height = image.height(),
            "Segmentation finished"
        );

        SegmentationResult {
            lines,
            projection,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: timings,
        }
    }
}

fn crop_lines(
    image: &DynamicImage,
    mask: &BinaryMask,
    segments: &[Segment],
    min_padding: u32,
) -> Vec<LineCrop> {
    segments
        .iter()
        .filter_map(|&segment| {
            let Some(bbox) = steps::trim::apply(mask, segment, min_padding) else {
                tracing::debug!(
                    y0 = segment.y0,
                    y1 = segment.y1,
                    "Dropping segment without ink columns"
                );
                return None;
            };
            steps::crop::apply(image, bbox)
        })
        .collect()
}

fn run_step<T, F>(name: &str, timings: &mut Vec<StepTiming>, step_fn: F) -> T
where
    F: FnOnce() -> T,
{
    let step_start = Instant::now();
    let result = step_fn();
    timings.push(StepTiming {
        name: name.to_string(),
        time_ms: step_start.elapsed().as_millis() as u64,
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn page_with_bands(height: u32, bands: &[(u32, u32)]) -> DynamicImage {
        let mut img = RgbImage::from_pixel(300, height, Rgb([250, 250, 250]));
        for &(y0, y1) in bands {
            for y in y0..y1 {
                for x in 40..260 {
                    img.put_pixel(x, y, Rgb([20, 20, 20]));
                }
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_records_step_timings() {
        let page = page_with_bands(200, &[(40, 60), (120, 140)]);
        let result = LineSegmenter::default().segment_image(&page, None);

        let names: Vec<&str> = result.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["binarize", "project", "detect", "height_filter", "crop"]
        );
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.projection.len(), 200);
    }

    #[test]
    fn test_blank_page_stops_after_detection() {
        let page = page_with_bands(100, &[]);
        let result = LineSegmenter::default().segment_image(&page, None);

        assert!(result.lines.is_empty());
        assert_eq!(result.steps.last().map(|s| s.name.as_str()), Some("detect"));
    }

    #[test]
    fn test_plot_is_written_only_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let page = page_with_bands(120, &[(50, 70)]);

        let disabled = dir.path().join("disabled.png");
        LineSegmenter::default().segment_image(&page, Some(&disabled));
        assert!(!disabled.exists());

        let enabled = dir.path().join("enabled.png");
        let segmenter = LineSegmenter::new(SegmentationParams {
            plot_projection: true,
            ..Default::default()
        });
        let result = segmenter.segment_image(&page, Some(&enabled));
        assert!(enabled.exists());
        assert_eq!(result.lines.len(), 1);
    }

    #[test]
    fn test_undecodable_input_yields_nothing() {
        let result =
            LineSegmenter::default().segment(ImageInput::Bytes(vec![0, 1, 2, 3]), None);
        assert!(result.lines.is_empty());
        assert!(result.steps.is_empty());
    }
}
