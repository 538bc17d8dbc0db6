use crate::segmentation::types::{BinaryMask, FOREGROUND};
use image::{DynamicImage, GrayImage, Luma};

/// Convert an image to an ink mask using a global Otsu threshold.
/// Dark pixels (ink) become foreground, everything brighter than the threshold is background.
pub fn apply(image: &DynamicImage) -> BinaryMask {
    let gray = luminance(image);
    let histogram = histogram(&gray);

    let Some(threshold) = otsu_threshold(&histogram) else {
        // Uniform image: nothing separates ink from paper
        tracing::debug!("Otsu found no separating level, mask is empty");
        return BinaryMask::from_gray(GrayImage::new(gray.width(), gray.height()));
    };

    tracing::debug!(threshold, "Otsu threshold selected");

    let mask = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] > threshold {
            Luma([0u8])
        } else {
            Luma([FOREGROUND])
        }
    });
    BinaryMask::from_gray(mask)
}

/// BT.601 luminance. Single channel images are used as they are.
pub fn luminance(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_) => image.to_luma8(),
        _ => {
            let rgb = image.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                let value = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
                Luma([value.round().min(255.0) as u8])
            })
        }
    }
}

fn histogram(gray: &GrayImage) -> [u64; 256] {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }
    histogram
}

/// Otsu's method: pick the level `t` maximizing the between-class variance
/// `q1 * q2 * (mu1 - mu2)^2`, where class 1 holds intensities `<= t`.
/// Ties keep the lowest level. Returns `None` when no level splits the
/// histogram into two non-empty classes.
pub fn otsu_threshold(histogram: &[u64; 256]) -> Option<u8> {
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return None;
    }
    let total = total as f64;
    let total_mean: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum::<f64>()
        / total;

    let mut q1 = 0.0f64;
    let mut weighted = 0.0f64;
    let mut best_variance = 0.0f64;
    let mut best_level = None;

    for (level, &count) in histogram.iter().enumerate() {
        let p = count as f64 / total;
        q1 += p;
        weighted += level as f64 * p;
        let q2 = 1.0 - q1;

        if q1.min(q2) < f32::EPSILON as f64 || q1.max(q2) > 1.0 - f32::EPSILON as f64 {
            continue;
        }

        let mu1 = weighted / q1;
        let mu2 = (total_mean - weighted) / q2;
        let variance = q1 * q2 * (mu1 - mu2) * (mu1 - mu2);

        if variance > best_variance {
            best_variance = variance;
            best_level = Some(level as u8);
        }
    }

    best_level
}
