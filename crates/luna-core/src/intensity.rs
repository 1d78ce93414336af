//! Intensity normalization for registration.
//!
//! Reduces an input image to a single-channel intensity map in [0, 1],
//! optionally applying CLAHE (contrast-limited adaptive histogram equalization)
//! to stabilize the ECC optimizer against illumination differences between
//! frames.

use ndarray::Array2;

use crate::consts::{
    CLAHE_CLIP_LIMIT, CLAHE_TILE_GRID, HISTOGRAM_BINS, LUMINANCE_B, LUMINANCE_G, LUMINANCE_R,
};
use crate::frame::{Frame, Image};

/// Compute the registration intensity map of an image.
///
/// Color images are reduced to BT.601 luma; values are already normalized
/// to [0, 1] at load time. When `use_clahe` is set, the map is quantized to
/// 8 bits, equalized tile-by-tile with a clip limit, and rescaled.
pub fn intensity_map(image: &Image, use_clahe: bool) -> Frame {
    let gray = match image {
        Image::Mono(f) => f.data.clone(),
        Image::Color(cf) => luminance(&cf.red.data, &cf.green.data, &cf.blue.data),
    };

    let data = if use_clahe { clahe(&gray) } else { gray };
    Frame::new(data, image.bit_depth())
}

/// BT.601 luma reduction of three color planes.
pub fn luminance(red: &Array2<f32>, green: &Array2<f32>, blue: &Array2<f32>) -> Array2<f32> {
    ndarray::Zip::from(red)
        .and(green)
        .and(blue)
        .map_collect(|&r, &g, &b| LUMINANCE_R * r + LUMINANCE_G * g + LUMINANCE_B * b)
}

/// Contrast-limited adaptive histogram equalization on an 8x8 tile grid.
///
/// Each tile gets its own clipped-histogram LUT; per-pixel output blends the
/// four surrounding tile LUTs with bilinear weights, avoiding visible tile
/// seams. Clipped histogram mass is redistributed uniformly across all bins.
pub fn clahe(gray: &Array2<f32>) -> Array2<f32> {
    let (h, w) = gray.dim();
    if h == 0 || w == 0 {
        return gray.clone();
    }

    let grid = CLAHE_TILE_GRID.min(h).min(w).max(1);
    let quantized = gray.mapv(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8);

    // Tile boundary at index i is i*dim/grid, so tiles cover the image exactly
    // even when the dimension is not divisible by the grid size.
    let row_bound = |i: usize| i * h / grid;
    let col_bound = |j: usize| j * w / grid;

    let mut luts = vec![[0u8; HISTOGRAM_BINS]; grid * grid];
    let mut centers_row = vec![0.0f64; grid];
    let mut centers_col = vec![0.0f64; grid];

    for ti in 0..grid {
        let (r0, r1) = (row_bound(ti), row_bound(ti + 1));
        centers_row[ti] = (r0 + r1) as f64 / 2.0 - 0.5;
        for tj in 0..grid {
            let (c0, c1) = (col_bound(tj), col_bound(tj + 1));
            centers_col[tj] = (c0 + c1) as f64 / 2.0 - 0.5;

            let mut hist = [0u32; HISTOGRAM_BINS];
            for r in r0..r1 {
                for c in c0..c1 {
                    hist[quantized[[r, c]] as usize] += 1;
                }
            }
            let area = ((r1 - r0) * (c1 - c0)).max(1);
            luts[ti * grid + tj] = equalize_clipped(&hist, area);
        }
    }

    let mut result = Array2::<f32>::zeros((h, w));
    for r in 0..h {
        // Bracketing tile rows for bilinear LUT interpolation.
        let (ti0, ti1, fr) = bracket(r as f64, &centers_row);
        for c in 0..w {
            let (tj0, tj1, fc) = bracket(c as f64, &centers_col);
            let v = quantized[[r, c]] as usize;

            let v00 = luts[ti0 * grid + tj0][v] as f64;
            let v01 = luts[ti0 * grid + tj1][v] as f64;
            let v10 = luts[ti1 * grid + tj0][v] as f64;
            let v11 = luts[ti1 * grid + tj1][v] as f64;

            let top = v00 * (1.0 - fc) + v01 * fc;
            let bottom = v10 * (1.0 - fc) + v11 * fc;
            result[[r, c]] = ((top * (1.0 - fr) + bottom * fr) / 255.0) as f32;
        }
    }

    result
}

/// Build the equalization LUT for one tile from its clipped histogram.
fn equalize_clipped(hist: &[u32; HISTOGRAM_BINS], area: usize) -> [u8; HISTOGRAM_BINS] {
    // Clip limit relative to a perfectly uniform histogram, never below 1.
    let limit = ((CLAHE_CLIP_LIMIT * area as f32 / HISTOGRAM_BINS as f32).ceil() as u32).max(1);

    let mut clipped = [0u32; HISTOGRAM_BINS];
    let mut excess: u64 = 0;
    for (dst, &count) in clipped.iter_mut().zip(hist.iter()) {
        if count > limit {
            excess += (count - limit) as u64;
            *dst = limit;
        } else {
            *dst = count;
        }
    }

    // Redistribute the clipped mass uniformly; the remainder goes to the
    // lowest bins, which changes each CDF entry by at most one count.
    let share = (excess / HISTOGRAM_BINS as u64) as u32;
    let mut remainder = (excess % HISTOGRAM_BINS as u64) as usize;
    for count in clipped.iter_mut() {
        *count += share;
        if remainder > 0 {
            *count += 1;
            remainder -= 1;
        }
    }

    let mut lut = [0u8; HISTOGRAM_BINS];
    let mut cdf: u64 = 0;
    for (i, &count) in clipped.iter().enumerate() {
        cdf += count as u64;
        lut[i] = ((cdf * 255) / area as u64).min(255) as u8;
    }
    lut
}

/// Find the pair of tile centers bracketing `pos` and the blend fraction.
fn bracket(pos: f64, centers: &[f64]) -> (usize, usize, f64) {
    if pos <= centers[0] {
        return (0, 0, 0.0);
    }
    if pos >= centers[centers.len() - 1] {
        let last = centers.len() - 1;
        return (last, last, 0.0);
    }
    let mut hi = 1;
    while centers[hi] < pos {
        hi += 1;
    }
    let lo = hi - 1;
    let span = centers[hi] - centers[lo];
    let frac = if span > 0.0 { (pos - centers[lo]) / span } else { 0.0 };
    (lo, hi, frac)
}
