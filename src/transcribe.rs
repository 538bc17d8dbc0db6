//! Segment pages into lines and read each line with an OCR engine

use crate::engine::OcrEngine;
use crate::error::OcrError;
use crate::segmentation::{BoundingBox, ImageInput, LineSegmenter};
use image::DynamicImage;
use serde::Serialize;
use std::sync::Arc;

/// Text of one detected line
#[derive(Debug, Clone, Serialize)]
pub struct TranscribedLine {
    /// Index of the page the line was found on
    pub page: usize,
    pub text: String,
    pub bbox: BoundingBox,
}

/// Transcript of a document, lines in reading order
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    pub text: String,
    pub lines: Vec<TranscribedLine>,
    pub warnings: Vec<String>,
}

pub struct Transcriber {
    segmenter: LineSegmenter,
    engine: Arc<dyn OcrEngine>,
    max_tokens: usize,
}

impl Transcriber {
    pub fn new(segmenter: LineSegmenter, engine: Arc<dyn OcrEngine>, max_tokens: usize) -> Self {
        Self {
            segmenter,
            engine,
            max_tokens,
        }
    }

    /// Read every line of a single page. Any recognition failure fails the page.
    pub fn transcribe_page(
        &self,
        page: usize,
        image: &DynamicImage,
    ) -> Result<Vec<TranscribedLine>, OcrError> {
        let segmentation = self.segmenter.segment_image(image, None);

        segmentation
            .lines
            .iter()
            .map(|line| {
                let text = self.engine.recognize_line(&line.image, self.max_tokens)?;
                Ok(TranscribedLine {
                    page,
                    text: text.trim().to_string(),
                    bbox: line.bbox,
                })
            })
            .collect()
    }

    /// Transcribe a batch of pages. A page that cannot be decoded or read is
    /// skipped with a warning; the remaining pages are still processed.
    pub fn transcribe_pages(&self, pages: Vec<ImageInput>) -> Transcript {
        let mut transcript = Transcript::default();

        for (index, input) in pages.into_iter().enumerate() {
            let image = match input.load() {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!("Page {}: {}", index, e);
                    transcript.warnings.push(format!("Page {}: {}", index, e));
                    continue;
                }
            };

            match self.transcribe_page(index, &image) {
                Ok(lines) => {
                    tracing::debug!("Page {}: {} line(s)", index, lines.len());
                    transcript.lines.extend(lines);
                }
                Err(e) => {
                    tracing::warn!("Page {}: {}", index, e);
                    transcript.warnings.push(format!("Page {}: {}", index, e));
                }
            }
        }

        transcript.text = transcript
            .lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        transcript
    }
}
