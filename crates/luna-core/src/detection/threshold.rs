use ndarray::Array2;

use crate::consts::{HISTOGRAM_BINS, MASK_THRESHOLD_FLOOR, MASK_THRESHOLD_PERCENTILE};

/// Compute the binarization threshold for disk detection on the 8-bit scale.
///
/// The threshold is the greater of a fixed floor and the 98th percentile of
/// the quantized intensity histogram. The percentile adapts to frames where
/// the disk fills only a small fraction of the field; the floor guards
/// against near-uniform noisy frames pulling the percentile too low.
pub fn disk_threshold(data: &Array2<f32>) -> u8 {
    MASK_THRESHOLD_FLOOR.max(percentile_u8(data, MASK_THRESHOLD_PERCENTILE))
}

/// Percentile of the 8-bit quantized sample values, `q` in [0, 1].
pub fn percentile_u8(data: &Array2<f32>, q: f64) -> u8 {
    let mut histogram = [0u64; HISTOGRAM_BINS];
    for &v in data.iter() {
        let bin = (v.clamp(0.0, 1.0) * 255.0).round() as usize;
        histogram[bin.min(HISTOGRAM_BINS - 1)] += 1;
    }

    let total = data.len() as f64;
    if total == 0.0 {
        return 0;
    }

    let rank = (q * total).ceil() as u64;
    let mut cumulative = 0u64;
    for (bin, &count) in histogram.iter().enumerate() {
        cumulative += count;
        if cumulative >= rank {
            return bin as u8;
        }
    }
    (HISTOGRAM_BINS - 1) as u8
}
