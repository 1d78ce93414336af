pub mod gaussian_blur;
pub mod unsharp_mask;

pub use unsharp_mask::unsharp_mask;
