pub mod ecc;
pub mod phase;
pub mod registrar;
pub mod resize;
pub mod warp;

pub use registrar::{register_frame, register_frames, RegistrationParams};
pub use warp::{Transform, WarpMode};
