//! Turning an uploaded file into page images
//!
//! Plain images are a single page. Scanned PDFs contribute every embedded
//! image XObject as a page; pages that cannot be extracted are reported and
//! skipped.

use crate::error::OcrError;
use crate::segmentation::ImageInput;
use image::DynamicImage;
use lopdf::{Document, Object, Stream};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Pages of a document, plus warnings about pages that had to be skipped
#[derive(Debug, Default)]
pub struct Pages {
    pub pages: Vec<ImageInput>,
    pub warnings: Vec<String>,
}

/// Split a file on disk into page inputs
pub fn load_pages(path: &Path) -> Result<Pages, OcrError> {
    if !is_pdf(path)? {
        return Ok(Pages {
            pages: vec![ImageInput::Path(path.to_path_buf())],
            warnings: Vec::new(),
        });
    }

    let doc = Document::load(path)
        .map_err(|e| OcrError::DocumentError(format!("Failed to load PDF: {}", e)))?;

    let mut pages = Pages::default();
    for (object_id, object) in doc.objects.iter() {
        let Ok(stream) = object.as_stream() else {
            continue;
        };
        if !is_image_xobject(stream) {
            continue;
        }
        match extract_image(&doc, stream) {
            Ok(img) => pages.pages.push(ImageInput::Image(img)),
            Err(e) => {
                tracing::warn!("Failed to extract image from object {:?}: {}", object_id, e);
                pages
                    .warnings
                    .push(format!("Skipped PDF image {:?}: {}", object_id, e));
            }
        }
    }

    if pages.pages.is_empty() {
        pages
            .warnings
            .push("No page images found in PDF".to_string());
    }

    tracing::info!("Extracted {} page image(s) from PDF", pages.pages.len());
    Ok(pages)
}

/// Check if a file is a PDF by extension or by its `%PDF-` magic bytes
pub fn is_pdf(path: &Path) -> Result<bool, OcrError> {
    if let Some(ext) = path.extension() {
        if ext.to_string_lossy().eq_ignore_ascii_case("pdf") {
            return Ok(true);
        }
    }

    let mut file = File::open(path)
        .map_err(|e| OcrError::DocumentError(format!("Failed to open file: {}", e)))?;

    let mut magic = [0u8; 5];
    if file.read_exact(&mut magic).is_ok() {
        return Ok(&magic == b"%PDF-");
    }

    Ok(false)
}

fn is_image_xobject(stream: &Stream) -> bool {
    stream
        .dict
        .get(b"Subtype")
        .and_then(Object::as_name)
        .map(|name| name == b"Image")
        .unwrap_or(false)
}

fn dict_u32(stream: &Stream, key: &[u8]) -> Option<u32> {
    stream
        .dict
        .get(key)
        .ok()
        .and_then(|v| v.as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
}

/// Decode an image XObject with 8 bits per component
fn extract_image(doc: &Document, stream: &Stream) -> Result<DynamicImage, OcrError> {
    let width = dict_u32(stream, b"Width")
        .ok_or_else(|| OcrError::DocumentError("Missing image width".to_string()))?;
    let height = dict_u32(stream, b"Height")
        .ok_or_else(|| OcrError::DocumentError("Missing image height".to_string()))?;
    let bits = dict_u32(stream, b"BitsPerComponent").unwrap_or(8);

    let data = stream
        .decompressed_content()
        .map_err(|e| OcrError::DocumentError(format!("Failed to decompress image: {}", e)))?;

    let color_space = color_space(doc, stream);
    let area = width as usize * height as usize;

    tracing::debug!(
        "PDF image: {}x{}, {} bits, color_space={}, data_len={}",
        width,
        height,
        bits,
        color_space,
        data.len()
    );

    let channels = match color_space.as_str() {
        "DeviceGray" => 1,
        "DeviceRGB" | "ICCBased" => 3,
        "DeviceCMYK" => 4,
        other => {
            return Err(OcrError::DocumentError(format!(
                "Unsupported color space: {}",
                other
            )))
        }
    };

    if bits != 8 || data.len() < area * channels {
        return Err(OcrError::DocumentError(format!(
            "Unsupported {} image: {} bits, data_len={}, expected={}",
            color_space,
            bits,
            data.len(),
            area * channels
        )));
    }

    let data = &data[..area * channels];
    let image = match channels {
        1 => image::GrayImage::from_raw(width, height, data.to_vec()).map(DynamicImage::ImageLuma8),
        3 => image::RgbImage::from_raw(width, height, data.to_vec()).map(DynamicImage::ImageRgb8),
        _ => image::RgbImage::from_raw(width, height, cmyk_to_rgb(data))
            .map(DynamicImage::ImageRgb8),
    };

    image.ok_or_else(|| OcrError::DocumentError("Invalid image data".to_string()))
}

fn cmyk_to_rgb(data: &[u8]) -> Vec<u8> {
    data.chunks_exact(4)
        .flat_map(|px| {
            let k = 1.0 - px[3] as f32 / 255.0;
            [0, 1, 2].map(|i| ((1.0 - px[i] as f32 / 255.0) * k * 255.0) as u8)
        })
        .collect()
}

/// Name of the stream's color space, resolving indirect references and
/// `[/ICCBased ref]` style arrays. Defaults to DeviceRGB.
fn color_space(doc: &Document, stream: &Stream) -> String {
    let Ok(cs_obj) = stream.dict.get(b"ColorSpace") else {
        return "DeviceRGB".to_string();
    };

    let resolved = match cs_obj.as_reference() {
        Ok(reference) => match doc.get_object(reference) {
            Ok(object) => object,
            Err(_) => return "DeviceRGB".to_string(),
        },
        Err(_) => cs_obj,
    };

    let name = match resolved {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(array) => array.first().and_then(|first| first.as_name().ok()),
        _ => None,
    };

    name.map(|n| String::from_utf8_lossy(n).to_string())
        .unwrap_or_else(|| "DeviceRGB".to_string())
}
