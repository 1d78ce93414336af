//! Per-pixel median stacking of aligned frames.

use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{LunaError, Result};
use crate::frame::{ColorFrame, Frame, Image};

/// Stack aligned images by computing the per-pixel, per-channel median.
///
/// Even-count stacks average the two middle values. The median of in-range
/// values stays in range, so no clipping happens here. All inputs must share
/// the reference variant and dimensions.
pub fn median_stack(images: &[Image]) -> Result<Image> {
    let first = images.first().ok_or(LunaError::EmptySequence)?;
    if let Some(bad) = images.iter().find(|img| !img.same_shape(first)) {
        return Err(LunaError::Pipeline(format!(
            "stack shape mismatch: {}x{} vs {}x{}",
            bad.width(),
            bad.height(),
            first.width(),
            first.height()
        )));
    }

    match first {
        Image::Mono(_) => {
            let planes: Vec<&Frame> = images
                .iter()
                .map(|img| match img {
                    Image::Mono(f) => f,
                    Image::Color(_) => unreachable!("shape check rejects mixed variants"),
                })
                .collect();
            Ok(Image::Mono(median_planes(&planes)))
        }
        Image::Color(_) => {
            let channel = |pick: fn(&ColorFrame) -> &Frame| -> Frame {
                let planes: Vec<&Frame> = images
                    .iter()
                    .map(|img| match img {
                        Image::Color(cf) => pick(cf),
                        Image::Mono(_) => unreachable!("shape check rejects mixed variants"),
                    })
                    .collect();
                median_planes(&planes)
            };
            Ok(Image::Color(ColorFrame {
                red: channel(|cf| &cf.red),
                green: channel(|cf| &cf.green),
                blue: channel(|cf| &cf.blue),
            }))
        }
    }
}

/// Median of a set of equally-sized planes.
///
/// Uses `select_nth_unstable` for O(n) median without a full sort.
/// Parallelizes at the row level for large images.
fn median_planes(planes: &[&Frame]) -> Frame {
    let (h, w) = planes[0].data.dim();
    let n = planes.len();

    if h * w >= PARALLEL_PIXEL_THRESHOLD && n > 1 {
        // Row-parallel: each row allocates its own scratch buffer.
        let rows: Vec<Vec<f32>> = (0..h)
            .into_par_iter()
            .map(|row| {
                let mut pixel_values = vec![0.0f32; n];
                let mut row_result = vec![0.0f32; w];
                for (col, result) in row_result.iter_mut().enumerate() {
                    for (i, plane) in planes.iter().enumerate() {
                        pixel_values[i] = plane.data[[row, col]];
                    }
                    *result = compute_median(&mut pixel_values, n);
                }
                row_result
            })
            .collect();

        let mut result = Array2::<f32>::zeros((h, w));
        for (row, row_data) in rows.into_iter().enumerate() {
            for (col, val) in row_data.into_iter().enumerate() {
                result[[row, col]] = val;
            }
        }
        Frame::new(result, planes[0].original_bit_depth)
    } else {
        let mut result = Array2::<f32>::zeros((h, w));
        let mut pixel_values = vec![0.0f32; n];

        for row in 0..h {
            for col in 0..w {
                for (i, plane) in planes.iter().enumerate() {
                    pixel_values[i] = plane.data[[row, col]];
                }
                result[[row, col]] = compute_median(&mut pixel_values, n);
            }
        }
        Frame::new(result, planes[0].original_bit_depth)
    }
}

fn compute_median(pixel_values: &mut [f32], n: usize) -> f32 {
    if n == 1 {
        pixel_values[0]
    } else if n % 2 == 1 {
        let mid = n / 2;
        *pixel_values
            .select_nth_unstable_by(mid, |a, b| a.total_cmp(b))
            .1
    } else {
        let mid = n / 2;
        pixel_values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        pixel_values[..mid].select_nth_unstable_by(mid - 1, |a, b| a.total_cmp(b));
        (pixel_values[mid - 1] + pixel_values[mid]) / 2.0
    }
}
