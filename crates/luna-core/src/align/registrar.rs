//! Per-frame registration: estimate a warp against the reference intensity
//! map and resample the frame into the reference coordinate system.

use ndarray::Array2;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::consts::PARALLEL_FRAME_THRESHOLD;
use crate::frame::{Frame, Image};
use crate::intensity::intensity_map;

use super::ecc::{estimate_warp, EccParams, EccTermination};
use super::phase::estimate_shift;
use super::resize::resize_image_area;
use super::warp::{warp_image, Transform, WarpMode};

/// Read-only registration inputs, shared by every frame in the run.
pub struct RegistrationParams<'a> {
    /// Reference intensity map (already contrast-enhanced if configured).
    pub reference: &'a Frame,
    /// Binary mask confining the ECC objective to the target disk.
    pub mask: &'a Array2<bool>,
    pub warp_mode: WarpMode,
    pub use_clahe: bool,
    /// Uniform resize factor; any value other than 1.0 forces candidates to
    /// the reference dimensions with area averaging before alignment.
    pub resize_for_speed: f32,
    pub max_iters: usize,
    pub eps: f64,
}

/// Register a single candidate frame against the reference.
///
/// Returns `None` when the frame must be excluded: mismatched dimensions
/// without resizing enabled, or a degenerate (non-invertible) estimated
/// warp. ECC numerical failure is not an exclusion; it falls back to a
/// phase-correlation translation estimate.
pub fn register_frame(
    candidate: &Image,
    index: usize,
    params: &RegistrationParams<'_>,
) -> Option<Image> {
    let ref_h = params.reference.height();
    let ref_w = params.reference.width();

    let candidate = if params.resize_for_speed != 1.0 {
        resize_image_area(candidate, ref_h, ref_w)
    } else if candidate.height() != ref_h || candidate.width() != ref_w {
        warn!(
            frame = index,
            "frame is {}x{} but reference is {}x{}; excluded (enable resize to force)",
            candidate.width(),
            candidate.height(),
            ref_w,
            ref_h
        );
        return None;
    } else {
        candidate.clone()
    };

    let gray = intensity_map(&candidate, params.use_clahe);

    let ecc_params = EccParams {
        mode: params.warp_mode,
        max_iters: params.max_iters,
        eps: params.eps,
    };

    let transform = match estimate_warp(&params.reference.data, params.mask, &gray.data, &ecc_params)
    {
        Ok(estimate) => {
            match estimate.termination {
                EccTermination::Converged { iterations } => debug!(
                    frame = index,
                    iterations,
                    rho = estimate.correlation,
                    "ECC converged"
                ),
                EccTermination::IterationLimit => debug!(
                    frame = index,
                    rho = estimate.correlation,
                    "ECC stopped at iteration limit"
                ),
            }
            estimate.transform
        }
        Err(failure) => {
            // Known limitation: the fallback is translation-only even when
            // the affine model was requested.
            warn!(
                frame = index,
                "ECC failed ({failure}); falling back to phase correlation"
            );
            match estimate_shift(&params.reference.data, &gray.data) {
                Ok(shift) => shift,
                Err(err) => {
                    warn!(frame = index, "phase correlation failed ({err}); frame excluded");
                    return None;
                }
            }
        }
    };

    if !transform.is_invertible() {
        warn!(frame = index, "estimated warp is degenerate; frame excluded");
        return None;
    }

    Some(warp_image(&candidate, &transform, ref_h, ref_w))
}

/// Register every frame against the reference.
///
/// The reference frame passes through untouched (identity warp). Excluded
/// frames are dropped; input order is preserved for the survivors. Frames
/// are independent, so the map runs in parallel above the frame threshold.
pub fn register_frames<F>(
    frames: &[Image],
    reference_idx: usize,
    params: &RegistrationParams<'_>,
    on_frame_done: F,
) -> Vec<Image>
where
    F: Fn(usize) + Send + Sync,
{
    use std::sync::atomic::{AtomicUsize, Ordering};
    let counter = AtomicUsize::new(0);

    let register_one = |(i, frame): (usize, &Image)| -> Option<Image> {
        let result = if i == reference_idx {
            Some(frame.clone())
        } else {
            register_frame(frame, i, params)
        };
        let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
        on_frame_done(done);
        result
    };

    let aligned: Vec<Option<Image>> = if frames.len() >= PARALLEL_FRAME_THRESHOLD {
        frames.par_iter().enumerate().map(register_one).collect()
    } else {
        frames.iter().enumerate().map(register_one).collect()
    };

    aligned.into_iter().flatten().collect()
}
