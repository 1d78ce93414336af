use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::frame::{Frame, Image};

/// Geometric model estimated by the registrar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarpMode {
    /// Pure 2D shift, 2 degrees of freedom.
    Translation,
    /// Rotation/scale/shear/shift, 6 degrees of freedom.
    #[default]
    Affine,
}

/// Mapping from reference coordinates to candidate-frame coordinates.
///
/// Resampling uses the mapping directly (inverse-warp convention): the
/// aligned output at (x, y) samples the candidate at `apply(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transform {
    Translation { dx: f64, dy: f64 },
    Affine([[f64; 3]; 2]),
}

impl Transform {
    pub fn identity(mode: WarpMode) -> Self {
        match mode {
            WarpMode::Translation => Self::Translation { dx: 0.0, dy: 0.0 },
            WarpMode::Affine => Self::Affine([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
        }
    }

    /// Map a reference-frame point into candidate-frame coordinates.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Self::Translation { dx, dy } => (x + dx, y + dy),
            Self::Affine(m) => (
                m[0][0] * x + m[0][1] * y + m[0][2],
                m[1][0] * x + m[1][1] * y + m[1][2],
            ),
        }
    }

    /// A transform whose linear part collapses the plane cannot be resampled
    /// meaningfully; the registrar excludes such frames.
    pub fn is_invertible(&self) -> bool {
        match self {
            Self::Translation { .. } => true,
            Self::Affine(m) => (m[0][0] * m[1][1] - m[0][1] * m[1][0]).abs() > 1e-12,
        }
    }
}

/// Resample a frame into the reference coordinate system.
///
/// Inverse mapping with bilinear interpolation; samples falling outside the
/// source extent are filled by reflecting the border.
pub fn warp_frame(frame: &Frame, transform: &Transform, out_height: usize, out_width: usize) -> Frame {
    let src = &frame.data;

    let fill_row = |row: usize| -> Vec<f32> {
        (0..out_width)
            .map(|col| {
                let (sx, sy) = transform.apply(col as f64, row as f64);
                bilinear_sample_reflect(src, sy, sx)
            })
            .collect()
    };

    let rows: Vec<Vec<f32>> = if out_height * out_width >= PARALLEL_PIXEL_THRESHOLD {
        (0..out_height).into_par_iter().map(fill_row).collect()
    } else {
        (0..out_height).map(fill_row).collect()
    };

    let mut result = Array2::<f32>::zeros((out_height, out_width));
    for (row, row_data) in rows.into_iter().enumerate() {
        for (col, val) in row_data.into_iter().enumerate() {
            result[[row, col]] = val;
        }
    }

    Frame::new(result, frame.original_bit_depth)
}

/// Warp every plane of an image with the same transform.
pub fn warp_image(image: &Image, transform: &Transform, out_height: usize, out_width: usize) -> Image {
    image.map_planes(|plane| warp_frame(plane, transform, out_height, out_width))
}

/// Bilinear sample with reflective border extension.
pub fn bilinear_sample_reflect(data: &Array2<f32>, y: f64, x: f64) -> f32 {
    let (h, w) = data.dim();

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = (x - x0 as f64) as f32;
    let fy = (y - y0 as f64) as f32;

    let sample = |r: i64, c: i64| -> f32 {
        data[[reflect_index(r, h), reflect_index(c, w)]]
    };

    let v00 = sample(y0, x0);
    let v10 = sample(y0, x0 + 1);
    let v01 = sample(y0 + 1, x0);
    let v11 = sample(y0 + 1, x0 + 1);

    v00 * (1.0 - fx) * (1.0 - fy)
        + v10 * fx * (1.0 - fy)
        + v01 * (1.0 - fx) * fy
        + v11 * fx * fy
}

/// Reflect an out-of-range index back into [0, len), edge pixel included
/// (…cba|abc…|cba…).
fn reflect_index(i: i64, len: usize) -> usize {
    debug_assert!(len > 0);
    let n = len as i64;
    let period = 2 * n;
    let mut m = i % period;
    if m < 0 {
        m += period;
    }
    if m < n {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}
