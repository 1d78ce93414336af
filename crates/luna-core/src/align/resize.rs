use ndarray::Array2;

use crate::frame::{Frame, Image};

/// Resample a plane to the given dimensions with area averaging.
///
/// Each output pixel integrates the source rectangle it covers, with
/// fractional weights at the rectangle edges. For downscaling this is the
/// usual box filter; for mild upscaling it degrades to something close to
/// bilinear, which is adequate for a speed-oriented pre-alignment resize.
pub fn resize_area(data: &Array2<f32>, out_height: usize, out_width: usize) -> Array2<f32> {
    let (h, w) = data.dim();
    if (h, w) == (out_height, out_width) {
        return data.clone();
    }

    let scale_y = h as f64 / out_height as f64;
    let scale_x = w as f64 / out_width as f64;

    let mut result = Array2::<f32>::zeros((out_height, out_width));

    for out_r in 0..out_height {
        let y0 = out_r as f64 * scale_y;
        let y1 = (y0 + scale_y).min(h as f64);
        let r_first = y0.floor() as usize;
        let r_last = (y1.ceil() as usize).min(h);

        for out_c in 0..out_width {
            let x0 = out_c as f64 * scale_x;
            let x1 = (x0 + scale_x).min(w as f64);
            let c_first = x0.floor() as usize;
            let c_last = (x1.ceil() as usize).min(w);

            let mut sum = 0.0f64;
            let mut weight_sum = 0.0f64;
            for r in r_first..r_last {
                let wy = overlap(r as f64, y0, y1);
                for c in c_first..c_last {
                    let wx = overlap(c as f64, x0, x1);
                    let weight = wy * wx;
                    sum += data[[r, c]] as f64 * weight;
                    weight_sum += weight;
                }
            }

            result[[out_r, out_c]] = if weight_sum > 0.0 {
                (sum / weight_sum) as f32
            } else {
                data[[r_first.min(h - 1), c_first.min(w - 1)]]
            };
        }
    }

    result
}

/// Resize every plane of an image with area averaging.
pub fn resize_image_area(image: &Image, out_height: usize, out_width: usize) -> Image {
    image.map_planes(|plane| {
        Frame::new(
            resize_area(&plane.data, out_height, out_width),
            plane.original_bit_depth,
        )
    })
}

/// Overlap length of the unit interval [i, i+1) with [a, b).
fn overlap(i: f64, a: f64, b: f64) -> f64 {
    ((i + 1.0).min(b) - i.max(a)).max(0.0)
}
