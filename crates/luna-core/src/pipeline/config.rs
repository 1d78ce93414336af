use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::align::WarpMode;

/// Immutable parameter bundle for one stacking run.
///
/// Defaults live here; the CLI overrides fields before the pipeline starts
/// and the pipeline never mutates the bundle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StackerConfig {
    /// Directory of raw moon photos (jpg/jpeg/png/tif/tiff).
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Output directory for both renditions.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Alignment model.
    #[serde(default)]
    pub warp_mode: WarpMode,
    /// Iteration cap for the ECC optimizer.
    #[serde(default = "default_ecc_max_iters")]
    pub ecc_max_iters: usize,
    /// Convergence threshold on the ECC parameter update norm.
    #[serde(default = "default_ecc_eps")]
    pub ecc_eps: f64,
    /// Resize factor for alignment speed-up; 1.0 disables resizing.
    #[serde(default = "default_resize_for_speed")]
    pub resize_for_speed: f32,
    /// Apply CLAHE before alignment for more stability.
    #[serde(default = "default_use_clahe")]
    pub use_clahe: bool,

    /// Unsharp mask strength, nominally 0..=1.
    #[serde(default = "default_unsharp_amount")]
    pub unsharp_amount: f32,
    /// Gaussian sigma for the unsharp mask.
    #[serde(default = "default_gauss_sigma")]
    pub gauss_sigma: f32,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("moon_photos")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("moon_output")
}
fn default_ecc_max_iters() -> usize {
    300
}
fn default_ecc_eps() -> f64 {
    1e-7
}
fn default_resize_for_speed() -> f32 {
    1.0
}
fn default_use_clahe() -> bool {
    true
}
fn default_unsharp_amount() -> f32 {
    0.5
}
fn default_gauss_sigma() -> f32 {
    1.2
}

impl Default for StackerConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            warp_mode: WarpMode::default(),
            ecc_max_iters: default_ecc_max_iters(),
            ecc_eps: default_ecc_eps(),
            resize_for_speed: default_resize_for_speed(),
            use_clahe: default_use_clahe(),
            unsharp_amount: default_unsharp_amount(),
            gauss_sigma: default_gauss_sigma(),
        }
    }
}
