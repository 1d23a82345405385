/// Global thresholding of grayscale images into a [`BitMatrix`] (true = dark)
use crate::models::BitMatrix;

/// Binarize with Otsu's threshold
pub fn otsu_binarize(gray: &[u8], width: usize, height: usize) -> BitMatrix {
    threshold_binarize(gray, width, height, otsu_threshold(gray))
}

/// Binarize with a fixed threshold; pixels below it are dark
pub fn threshold_binarize(gray: &[u8], width: usize, height: usize, threshold: u8) -> BitMatrix {
    BitMatrix::from_fn(width, height, |x, y| gray[y * width + x] < threshold)
}

/// Otsu's threshold: maximizes between-class variance over the histogram.
///
/// Pixels strictly below the returned value form the dark class.
pub fn otsu_threshold(gray: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &p in gray {
        histogram[p as usize] += 1;
    }

    let total = gray.len() as f64;
    let total_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut dark_count = 0f64;
    let mut dark_sum = 0f64;
    let mut best_variance = 0f64;
    let mut best = 128u8;

    // Candidate threshold t puts intensities 0..t in the dark class
    for t in 1..=255usize {
        dark_count += histogram[t - 1] as f64;
        dark_sum += (t - 1) as f64 * histogram[t - 1] as f64;
        let light_count = total - dark_count;
        if dark_count == 0.0 || light_count == 0.0 {
            continue;
        }
        let dark_mean = dark_sum / dark_count;
        let light_mean = (total_sum - dark_sum) / light_count;
        let variance = dark_count * light_count * (dark_mean - light_mean).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best = t as u8;
        }
    }

    best
}
