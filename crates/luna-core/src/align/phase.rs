//! Frequency-domain shift estimation.
//!
//! Used as the numerically-robust fallback when ECC optimization fails:
//! a pure 2D translation is recovered from the phase of the normalized
//! cross-power spectrum, with paraboloid sub-pixel refinement of the
//! correlation peak.

use ndarray::Array2;
use num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::{LunaError, Result};

use super::warp::Transform;

/// Estimate the translation aligning `candidate` to `reference` and return it
/// as a ready-to-resample [`Transform`].
///
/// The returned transform maps reference coordinates onto the candidate, so a
/// candidate whose content is shifted by (+s) yields `dx = +s`.
pub fn estimate_shift(reference: &Array2<f32>, candidate: &Array2<f32>) -> Result<Transform> {
    let (h, w) = reference.dim();
    let (ch, cw) = candidate.dim();
    if h != ch || w != cw {
        return Err(LunaError::Pipeline(format!(
            "phase correlation size mismatch: {}x{} vs {}x{}",
            w, h, cw, ch
        )));
    }

    // Hann window to reduce spectral leakage at the frame edges.
    let ref_fft = fft2d(&apply_hann(reference));
    let cand_fft = fft2d(&apply_hann(candidate));

    let cross_power = normalized_cross_power(&ref_fft, &cand_fft);
    let correlation = ifft2d(&cross_power);

    let (peak_row, peak_col) = find_peak(&correlation);

    // Wrap-around: peaks past the midpoint are negative shifts.
    let coarse_dy = if peak_row > h / 2 {
        peak_row as f64 - h as f64
    } else {
        peak_row as f64
    };
    let coarse_dx = if peak_col > w / 2 {
        peak_col as f64 - w as f64
    } else {
        peak_col as f64
    };

    let (sub_dy, sub_dx) = refine_peak(&correlation, peak_row, peak_col);

    // The correlation peak sits at minus the content shift; negate to get the
    // reference -> candidate sampling offset.
    Ok(Transform::Translation {
        dx: -(coarse_dx + sub_dx),
        dy: -(coarse_dy + sub_dy),
    })
}

fn apply_hann(data: &Array2<f32>) -> Array2<f32> {
    let (h, w) = data.dim();
    let mut result = Array2::<f32>::zeros((h, w));

    for row in 0..h {
        let wy = 0.5 * (1.0 - (std::f64::consts::TAU * row as f64 / h as f64).cos());
        for col in 0..w {
            let wx = 0.5 * (1.0 - (std::f64::consts::TAU * col as f64 / w as f64).cos());
            result[[row, col]] = data[[row, col]] * (wy * wx) as f32;
        }
    }

    result
}

/// 2D FFT: row-wise FFT, then column-wise FFT.
fn fft2d(data: &Array2<f32>) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let fft_row = planner.plan_fft_forward(w);
    let fft_col = planner.plan_fft_forward(h);

    let mut result = Array2::<Complex<f64>>::zeros((h, w));
    for row in 0..h {
        for col in 0..w {
            result[[row, col]] = Complex::new(data[[row, col]] as f64, 0.0);
        }
    }

    for row in 0..h {
        let mut row_data: Vec<Complex<f64>> = (0..w).map(|c| result[[row, c]]).collect();
        fft_row.process(&mut row_data);
        for col in 0..w {
            result[[row, col]] = row_data[col];
        }
    }

    for col in 0..w {
        let mut col_data: Vec<Complex<f64>> = (0..h).map(|r| result[[r, col]]).collect();
        fft_col.process(&mut col_data);
        for row in 0..h {
            result[[row, col]] = col_data[row];
        }
    }

    result
}

/// Inverse 2D FFT, returning the normalized real part.
fn ifft2d(data: &Array2<Complex<f64>>) -> Array2<f64> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let ifft_row = planner.plan_fft_inverse(w);
    let ifft_col = planner.plan_fft_inverse(h);

    let mut work = data.clone();

    for col in 0..w {
        let mut col_data: Vec<Complex<f64>> = (0..h).map(|r| work[[r, col]]).collect();
        ifft_col.process(&mut col_data);
        for row in 0..h {
            work[[row, col]] = col_data[row];
        }
    }

    for row in 0..h {
        let mut row_data: Vec<Complex<f64>> = (0..w).map(|c| work[[row, c]]).collect();
        ifft_row.process(&mut row_data);
        for col in 0..w {
            work[[row, col]] = row_data[col];
        }
    }

    let scale = 1.0 / (h * w) as f64;
    let mut result = Array2::<f64>::zeros((h, w));
    for row in 0..h {
        for col in 0..w {
            result[[row, col]] = work[[row, col]].re * scale;
        }
    }

    result
}

fn normalized_cross_power(
    ref_fft: &Array2<Complex<f64>>,
    cand_fft: &Array2<Complex<f64>>,
) -> Array2<Complex<f64>> {
    let (h, w) = ref_fft.dim();
    let mut result = Array2::<Complex<f64>>::zeros((h, w));

    for row in 0..h {
        for col in 0..w {
            let cross = ref_fft[[row, col]] * cand_fft[[row, col]].conj();
            let mag = cross.norm();
            result[[row, col]] = if mag > 1e-12 {
                cross / mag
            } else {
                Complex::new(0.0, 0.0)
            };
        }
    }

    result
}

fn find_peak(data: &Array2<f64>) -> (usize, usize) {
    let (h, w) = data.dim();
    let mut best = (0usize, 0usize);
    let mut best_val = f64::NEG_INFINITY;

    for row in 0..h {
        for col in 0..w {
            if data[[row, col]] > best_val {
                best_val = data[[row, col]];
                best = (row, col);
            }
        }
    }

    best
}

/// Sub-pixel peak refinement by 1D parabola fits through the 3x3
/// neighborhood. Returns (delta_row, delta_col) clamped to +/- 0.5.
fn refine_peak(correlation: &Array2<f64>, peak_row: usize, peak_col: usize) -> (f64, f64) {
    let (h, w) = correlation.dim();

    if peak_row == 0 || peak_row >= h - 1 || peak_col == 0 || peak_col >= w - 1 {
        return (0.0, 0.0);
    }

    let fit = |prev: f64, curr: f64, next: f64| -> f64 {
        let denom = prev - 2.0 * curr + next;
        if denom.abs() > 1e-12 {
            (prev - next) / (2.0 * denom)
        } else {
            0.0
        }
    };

    let delta_row = fit(
        correlation[[peak_row - 1, peak_col]],
        correlation[[peak_row, peak_col]],
        correlation[[peak_row + 1, peak_col]],
    );
    let delta_col = fit(
        correlation[[peak_row, peak_col - 1]],
        correlation[[peak_row, peak_col]],
        correlation[[peak_row, peak_col + 1]],
    );

    (delta_row.clamp(-0.5, 0.5), delta_col.clamp(-0.5, 0.5))
}
