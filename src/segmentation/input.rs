use crate::error::OcrError;
use image::{DynamicImage, ImageReader};
use std::path::{Path, PathBuf};

/// Where the segmenter gets its pixels from
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Encoded image on disk
    Path(PathBuf),
    /// Encoded image in memory (PNG, JPEG, BMP, ...)
    Bytes(Vec<u8>),
    /// Already decoded image
    Image(DynamicImage),
}

impl ImageInput {
    /// Decode the input into pixels
    pub fn load(self) -> Result<DynamicImage, OcrError> {
        match self {
            Self::Path(path) => decode_file(&path).map_err(|e| {
                OcrError::UnsupportedFormat(format!(
                    "Failed to decode {}: {}",
                    path.display(),
                    e
                ))
            }),
            Self::Bytes(bytes) => image::load_from_memory(&bytes)
                .map_err(|e| OcrError::UnsupportedFormat(format!("Failed to decode image: {}", e))),
            Self::Image(image) => Ok(image),
        }
    }
}

/// Decode a file by its content, falling back to the extension when the
/// content is not recognized
fn decode_file(path: &Path) -> image::ImageResult<DynamicImage> {
    ImageReader::open(path)?.with_guessed_format()?.decode()
}

impl From<DynamicImage> for ImageInput {
    fn from(image: DynamicImage) -> Self {
        Self::Image(image)
    }
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}
