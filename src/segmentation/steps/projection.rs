use crate::segmentation::types::BinaryMask;

/// Kernel support in standard deviations
const TRUNCATE: f64 = 4.0;

/// Sum of mask values in every row
pub fn row_profile(mask: &BinaryMask) -> Vec<u64> {
    (0..mask.height())
        .map(|y| mask.row(y).iter().map(|&v| v as u64).sum())
        .collect()
}

/// Sum of mask values in every column, restricted to rows `y0..=y1`
pub fn column_profile(mask: &BinaryMask, y0: u32, y1: u32) -> Vec<u64> {
    let mut sums = vec![0u64; mask.width() as usize];
    for y in y0..=y1.min(mask.height().saturating_sub(1)) {
        for (sum, &v) in sums.iter_mut().zip(mask.row(y)) {
            *sum += v as u64;
        }
    }
    sums
}

/// Normalized discrete Gaussian with radius `round(4 * sigma)`
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (TRUNCATE * sigma + 0.5) as i64;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|i| (-0.5 * (i * i) as f64 / (sigma * sigma)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Convolve the profile with a Gaussian, mirroring the signal at both ends
/// (`d c b a | a b c d | d c b a`).
pub fn smooth(profile: &[u64], sigma: f64) -> Vec<f64> {
    let n = profile.len();
    if n == 0 {
        return Vec::new();
    }

    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as i64;

    // Mirroring repeats every 2n samples, so taps of the same phase can be merged
    let period = 2 * n;
    let taps: Vec<(i64, f64)> = if kernel.len() > period {
        let mut folded = vec![0.0; period];
        for (k, &w) in kernel.iter().enumerate() {
            folded[(k as i64 - radius).rem_euclid(period as i64) as usize] += w;
        }
        folded
            .into_iter()
            .enumerate()
            .map(|(offset, w)| (offset as i64, w))
            .collect()
    } else {
        kernel
            .iter()
            .enumerate()
            .map(|(k, &w)| (k as i64 - radius, w))
            .collect()
    };

    (0..n as i64)
        .map(|i| {
            taps.iter()
                .map(|&(offset, w)| w * profile[reflect(i + offset, n)] as f64)
                .sum()
        })
        .collect()
}

/// Map any index onto `0..n` by repeated half-sample mirroring
fn reflect(index: i64, n: usize) -> usize {
    let period = 2 * n as i64;
    let m = index.rem_euclid(period);
    if m < n as i64 {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}
