/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Minimum frame count to use frame-level Rayon parallelism.
pub const PARALLEL_FRAME_THRESHOLD: usize = 4;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f32 = 1e-10;

/// ITU-R BT.601 luminance coefficient for the red channel.
pub const LUMINANCE_R: f32 = 0.299;

/// ITU-R BT.601 luminance coefficient for the green channel.
pub const LUMINANCE_G: f32 = 0.587;

/// ITU-R BT.601 luminance coefficient for the blue channel.
pub const LUMINANCE_B: f32 = 0.114;

/// Number of histogram bins for 8-bit quantized operations (CLAHE, mask threshold).
pub const HISTOGRAM_BINS: usize = 256;

/// CLAHE tile grid size (8x8 tiles across the image).
pub const CLAHE_TILE_GRID: usize = 8;

/// CLAHE clip limit, relative to a uniform histogram bin height.
pub const CLAHE_CLIP_LIMIT: f32 = 2.0;

/// Absolute floor for the disk threshold, on the 8-bit scale.
pub const MASK_THRESHOLD_FLOOR: u8 = 200;

/// Percentile of the reference histogram used for adaptive disk thresholding.
pub const MASK_THRESHOLD_PERCENTILE: f64 = 0.98;

/// Mask dilation radius as a fraction of the larger image dimension.
pub const MASK_DILATION_FRACTION: f64 = 0.02;

/// Minimum mask dilation radius in pixels.
pub const MASK_DILATION_MIN_RADIUS: usize = 5;

/// Gaussian sigma applied to both intensity maps before ECC optimization.
/// Smoothing stabilizes the image gradients the optimizer relies on.
pub const ECC_PRESMOOTH_SIGMA: f32 = 1.0;
