use crate::error::OcrError;
use image::DynamicImage;

/// Trait that all OCR engines must implement
///
/// Engines receive one cropped text line at a time and return its text.
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Recognize a single line image, producing at most `max_tokens` characters
    fn recognize_line(&self, line: &DynamicImage, max_tokens: usize) -> Result<String, OcrError>;

    /// Get supported languages
    fn supported_languages(&self) -> Vec<String>;
}

/// Cap decoded text at `max_tokens` characters, for engines without a native generation limit
pub fn cap_tokens(text: &str, max_tokens: usize) -> String {
    match text.char_indices().nth(max_tokens) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
