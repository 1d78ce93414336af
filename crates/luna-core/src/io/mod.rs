pub mod image_dir;

pub use image_dir::{load_frames, save_outputs};
