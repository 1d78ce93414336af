use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LunaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input directory does not exist: {}", .0.display())]
    InputUnavailable(PathBuf),

    #[error("no images found in {} (supported: jpg, jpeg, png, tif, tiff)", .0.display())]
    NoInputImages(PathBuf),

    #[error("at least 2 usable frames are required for stacking, found {found}")]
    TooFewFrames { found: usize },

    #[error("image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("empty frame sequence")]
    EmptySequence,

    #[error("pipeline error: {0}")]
    Pipeline(String),
}

pub type Result<T> = std::result::Result<T, LunaError>;
