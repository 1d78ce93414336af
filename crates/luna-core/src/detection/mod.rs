pub mod components;
pub mod morphology;
pub mod threshold;

use ndarray::Array2;
use tracing::{debug, warn};

use crate::consts::{MASK_DILATION_FRACTION, MASK_DILATION_MIN_RADIUS};
use crate::frame::Frame;

use components::largest_component;
use morphology::{dilate_disk, fill_holes};
use threshold::disk_threshold;

/// Locate the bright lunar disk in the reference intensity map and build a
/// binary mask confining registration to it.
///
/// Pipeline: adaptive threshold -> binarize -> largest connected component ->
/// fill interior holes (maria are darker than the limb after equalization) ->
/// dilate by a margin proportional to the image size.
///
/// Degenerate frames with no bright region yield a full-frame mask, so
/// registration falls back to global alignment instead of failing.
pub fn detect_target_mask(reference: &Frame) -> Array2<bool> {
    let (h, w) = reference.data.dim();

    // Inclusive comparison: when the disk itself sets the 98th percentile,
    // its pixels must survive their own threshold.
    let threshold = disk_threshold(&reference.data);
    let binary = reference
        .data
        .mapv(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8 >= threshold);

    match largest_component(&binary) {
        Some(component) => {
            let filled = fill_holes(&component);
            let radius = ((MASK_DILATION_FRACTION * h.max(w) as f64) as usize)
                .max(MASK_DILATION_MIN_RADIUS);
            debug!(threshold, radius, "disk mask detected");
            dilate_disk(&filled, radius)
        }
        None => {
            warn!("no bright region found; using full-frame mask");
            Array2::from_elem((h, w), true)
        }
    }
}
