use crate::frame::{Frame, Image};

use super::gaussian_blur::gaussian_blur_array;

/// Unsharp-mask sharpening applied to every channel.
///
/// `sharp = image * (1 + amount) - blur * amount`, clamped to [0, 1].
/// `amount` is nominally in 0..=1; values outside are permitted. An amount
/// of zero is the identity and returns the input bit-exact.
pub fn unsharp_mask(image: &Image, amount: f32, sigma: f32) -> Image {
    if amount == 0.0 {
        return image.clone();
    }

    image.map_planes(|plane| unsharp_plane(plane, amount, sigma))
}

fn unsharp_plane(plane: &Frame, amount: f32, sigma: f32) -> Frame {
    let blurred = gaussian_blur_array(&plane.data, sigma);

    let data = ndarray::Zip::from(&plane.data)
        .and(&blurred)
        .map_collect(|&orig, &blur| (orig * (1.0 + amount) - blur * amount).clamp(0.0, 1.0));

    Frame::new(data, plane.original_bit_depth)
}
