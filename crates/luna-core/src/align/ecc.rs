//! Enhanced-correlation-coefficient warp estimation.
//!
//! Forward-additive maximization of the enhanced correlation coefficient
//! (Evangelidis & Psarakis, PAMI 2008) between a reference intensity map and
//! a candidate intensity map, restricted to the samples under a binary mask.
//! Supports a 2-parameter translation model and a 6-parameter affine model.
//!
//! The objective is invariant to affine brightness/contrast differences, so
//! frames with different exposure still register correctly. Convergence is
//! not guaranteed: singular normal equations or a non-positive correlation
//! denominator are reported as [`EccFailure`] and the caller falls back to
//! phase correlation.

use ndarray::Array2;
use thiserror::Error;

use crate::consts::ECC_PRESMOOTH_SIGMA;
use crate::filters::gaussian_blur::gaussian_blur_array;

use super::warp::{bilinear_sample_reflect, Transform, WarpMode};

/// Maximum degrees of freedom across warp models; scratch arrays are sized
/// for this and the active model uses the first `dof` entries.
const MAX_DOF: usize = 6;

#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EccFailure {
    #[error("mask selects too few samples for the warp model")]
    DegenerateMask,
    #[error("singular normal equations (image lacks gradient under the mask)")]
    SingularSystem,
    #[error("non-positive correlation denominator (images may be uncorrelated)")]
    NonPositiveCorrelation,
}

/// How the optimizer stopped (both outcomes still yield a usable transform).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EccTermination {
    /// Parameter update norm fell below the configured epsilon.
    Converged { iterations: usize },
    /// Iteration cap reached first.
    IterationLimit,
}

/// Successful warp estimate.
#[derive(Clone, Copy, Debug)]
pub struct EccEstimate {
    pub transform: Transform,
    pub termination: EccTermination,
    /// Final enhanced correlation coefficient in [-1, 1].
    pub correlation: f64,
}

pub struct EccParams {
    pub mode: WarpMode,
    pub max_iters: usize,
    pub eps: f64,
}

/// Estimate the warp mapping reference coordinates onto the candidate.
///
/// Both maps are pre-smoothed with a small Gaussian so the image gradients
/// driving the update are stable in the presence of sensor noise.
pub fn estimate_warp(
    reference: &Array2<f32>,
    mask: &Array2<bool>,
    candidate: &Array2<f32>,
    params: &EccParams,
) -> Result<EccEstimate, EccFailure> {
    let dof = match params.mode {
        WarpMode::Translation => 2,
        WarpMode::Affine => 6,
    };

    let template = gaussian_blur_array(reference, ECC_PRESMOOTH_SIGMA);
    let image = gaussian_blur_array(candidate, ECC_PRESMOOTH_SIGMA);
    let (grad_x, grad_y) = gradients(&image);

    // Masked template samples, gathered once.
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let mut tvals = Vec::new();
    for ((r, c), &inside) in mask.indexed_iter() {
        if inside {
            xs.push(c as f64);
            ys.push(r as f64);
            tvals.push(template[[r, c]] as f64);
        }
    }
    let n = tvals.len();
    if n < dof * 2 {
        return Err(EccFailure::DegenerateMask);
    }

    let t_mean = tvals.iter().sum::<f64>() / n as f64;
    let t_zm: Vec<f64> = tvals.iter().map(|&t| t - t_mean).collect();
    let t_norm2: f64 = t_zm.iter().map(|&t| t * t).sum();

    let mut transform = Transform::identity(params.mode);
    let mut iw = vec![0.0f64; n];
    let mut jac = vec![[0.0f64; MAX_DOF]; n];

    for iteration in 1..=params.max_iters {
        // Warp the candidate (and its gradients) onto the template domain.
        let mut iw_sum = 0.0;
        for i in 0..n {
            let (sx, sy) = transform.apply(xs[i], ys[i]);
            iw[i] = bilinear_sample_reflect(&image, sy, sx) as f64;
            iw_sum += iw[i];

            let gx = bilinear_sample_reflect(&grad_x, sy, sx) as f64;
            let gy = bilinear_sample_reflect(&grad_y, sy, sx) as f64;
            jacobian_row(&mut jac[i], gx, gy, xs[i], ys[i], params.mode);
        }
        let iw_mean = iw_sum / n as f64;

        let mut hessian = [[0.0f64; MAX_DOF]; MAX_DOF];
        let mut jt = [0.0f64; MAX_DOF];
        let mut ji = [0.0f64; MAX_DOF];
        let mut iw_norm2 = 0.0;
        let mut dot_ti = 0.0;

        for i in 0..n {
            let izm = iw[i] - iw_mean;
            iw_norm2 += izm * izm;
            dot_ti += t_zm[i] * izm;
            let row = &jac[i];
            for a in 0..dof {
                jt[a] += row[a] * t_zm[i];
                ji[a] += row[a] * izm;
                for b in a..dof {
                    hessian[a][b] += row[a] * row[b];
                }
            }
        }
        for a in 0..dof {
            for b in 0..a {
                hessian[a][b] = hessian[b][a];
            }
        }

        let hi = solve(&hessian, &ji, dof).ok_or(EccFailure::SingularSystem)?;
        let ht = solve(&hessian, &jt, dof).ok_or(EccFailure::SingularSystem)?;

        let lambda_num = iw_norm2 - dot(&ji, &hi, dof);
        let lambda_den = dot_ti - dot(&jt, &hi, dof);
        if lambda_den <= 0.0 {
            return Err(EccFailure::NonPositiveCorrelation);
        }
        let lambda = lambda_num / lambda_den;

        // delta_p = H^-1 (lambda*jt - ji)
        let mut delta = [0.0f64; MAX_DOF];
        let mut update_norm2 = 0.0;
        for a in 0..dof {
            delta[a] = lambda * ht[a] - hi[a];
            if !delta[a].is_finite() {
                return Err(EccFailure::SingularSystem);
            }
            update_norm2 += delta[a] * delta[a];
        }

        transform = apply_update(&transform, &delta);

        if update_norm2.sqrt() < params.eps {
            let correlation = safe_correlation(dot_ti, t_norm2, iw_norm2);
            return Ok(EccEstimate {
                transform,
                termination: EccTermination::Converged { iterations: iteration },
                correlation,
            });
        }

        if iteration == params.max_iters {
            let correlation = safe_correlation(dot_ti, t_norm2, iw_norm2);
            return Ok(EccEstimate {
                transform,
                termination: EccTermination::IterationLimit,
                correlation,
            });
        }
    }

    // max_iters >= 1 always returns inside the loop; zero iterations means
    // the identity estimate was never tested.
    Ok(EccEstimate {
        transform,
        termination: EccTermination::IterationLimit,
        correlation: 0.0,
    })
}

/// Central-difference gradients, replicated at the borders.
fn gradients(image: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
    let (h, w) = image.dim();
    let mut gx = Array2::<f32>::zeros((h, w));
    let mut gy = Array2::<f32>::zeros((h, w));

    for r in 0..h {
        for c in 0..w {
            let c0 = c.saturating_sub(1);
            let c1 = (c + 1).min(w - 1);
            let r0 = r.saturating_sub(1);
            let r1 = (r + 1).min(h - 1);
            gx[[r, c]] = (image[[r, c1]] - image[[r, c0]]) / (c1 - c0).max(1) as f32;
            gy[[r, c]] = (image[[r1, c]] - image[[r0, c]]) / (r1 - r0).max(1) as f32;
        }
    }

    (gx, gy)
}

/// Steepest-descent row for one sample: gradient times the warp Jacobian.
///
/// Affine parameter order matches the matrix layout:
/// (m00, m10, m01, m11, m02, m12).
fn jacobian_row(row: &mut [f64; MAX_DOF], gx: f64, gy: f64, x: f64, y: f64, mode: WarpMode) {
    match mode {
        WarpMode::Translation => {
            row[0] = gx;
            row[1] = gy;
        }
        WarpMode::Affine => {
            row[0] = gx * x;
            row[1] = gy * x;
            row[2] = gx * y;
            row[3] = gy * y;
            row[4] = gx;
            row[5] = gy;
        }
    }
}

fn apply_update(transform: &Transform, delta: &[f64; MAX_DOF]) -> Transform {
    match *transform {
        Transform::Translation { dx, dy } => Transform::Translation {
            dx: dx + delta[0],
            dy: dy + delta[1],
        },
        Transform::Affine(m) => Transform::Affine([
            [m[0][0] + delta[0], m[0][1] + delta[2], m[0][2] + delta[4]],
            [m[1][0] + delta[1], m[1][1] + delta[3], m[1][2] + delta[5]],
        ]),
    }
}

fn dot(a: &[f64; MAX_DOF], b: &[f64; MAX_DOF], dof: usize) -> f64 {
    (0..dof).map(|i| a[i] * b[i]).sum()
}

fn safe_correlation(dot_ti: f64, t_norm2: f64, iw_norm2: f64) -> f64 {
    let denom = (t_norm2 * iw_norm2).sqrt();
    if denom > 0.0 {
        dot_ti / denom
    } else {
        0.0
    }
}

/// Solve the dof x dof system `A x = b` by Gaussian elimination with partial
/// pivoting. Returns `None` for a (near-)singular system.
fn solve(a: &[[f64; MAX_DOF]; MAX_DOF], b: &[f64; MAX_DOF], dof: usize) -> Option<[f64; MAX_DOF]> {
    let mut m = *a;
    let mut rhs = *b;

    for col in 0..dof {
        let mut pivot_row = col;
        let mut pivot_val = m[col][col].abs();
        for row in col + 1..dof {
            if m[row][col].abs() > pivot_val {
                pivot_val = m[row][col].abs();
                pivot_row = row;
            }
        }
        if pivot_val < 1e-18 {
            return None;
        }
        if pivot_row != col {
            m.swap(col, pivot_row);
            rhs.swap(col, pivot_row);
        }

        for row in col + 1..dof {
            let factor = m[row][col] / m[col][col];
            for k in col..dof {
                m[row][k] -= factor * m[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = [0.0f64; MAX_DOF];
    for col in (0..dof).rev() {
        let mut sum = rhs[col];
        for k in col + 1..dof {
            sum -= m[col][k] * x[k];
        }
        x[col] = sum / m[col][col];
    }

    if x.iter().take(dof).all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}
