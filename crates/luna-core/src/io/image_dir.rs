//! Input/output collaborators: directory scanning, frame decoding and the
//! two-rendition output writer.

use std::path::{Path, PathBuf};

use image::{ImageFormat, Luma, Rgb};
use ndarray::Array2;
use tracing::{info, warn};

use crate::error::{LunaError, Result};
use crate::frame::{ColorFrame, Frame, Image};

/// Recognized input file extensions (case-insensitive).
pub const VALID_EXTS: [&str; 5] = ["jpg", "jpeg", "png", "tif", "tiff"];

/// Filename of the lossless high-bit-depth rendition.
pub const OUTPUT_TIFF: &str = "stacked_16bit.tif";

/// Filename of the display-oriented rendition.
pub const OUTPUT_PNG: &str = "stacked_8bit.png";

/// List candidate image files in sorted order.
fn list_images(input_dir: &Path) -> Result<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(LunaError::InputUnavailable(input_dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|ext| VALID_EXTS.iter().any(|v| ext.eq_ignore_ascii_case(v)))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(LunaError::NoInputImages(input_dir.to_path_buf()));
    }
    Ok(files)
}

/// Load every decodable frame from a directory, in filename order.
///
/// Unreadable files are skipped with a warning; the run proceeds as long as
/// at least two frames decode. All frames are normalized to the 16-bit
/// [0, 1] scale; grayscale sources become `Image::Mono`, everything else
/// `Image::Color`.
pub fn load_frames(input_dir: &Path) -> Result<Vec<Image>> {
    let files = list_images(input_dir)?;

    let mut frames = Vec::with_capacity(files.len());
    for path in &files {
        match load_image(path) {
            Ok(image) => frames.push(image),
            Err(err) => warn!("cannot read {}: {err}; skipped", path.display()),
        }
    }

    if frames.len() < 2 {
        return Err(LunaError::TooFewFrames {
            found: frames.len(),
        });
    }

    info!(count = frames.len(), "loaded input frames");
    Ok(frames)
}

/// Decode a single image file.
pub fn load_image(path: &Path) -> Result<Image> {
    let img = image::open(path)?;

    if img.color().has_color() {
        let rgb = img.to_rgb16();
        let (w, h) = rgb.dimensions();
        let mut red = Array2::<f32>::zeros((h as usize, w as usize));
        let mut green = Array2::<f32>::zeros((h as usize, w as usize));
        let mut blue = Array2::<f32>::zeros((h as usize, w as usize));

        for row in 0..h as usize {
            for col in 0..w as usize {
                let pixel = rgb.get_pixel(col as u32, row as u32);
                red[[row, col]] = pixel.0[0] as f32 / 65535.0;
                green[[row, col]] = pixel.0[1] as f32 / 65535.0;
                blue[[row, col]] = pixel.0[2] as f32 / 65535.0;
            }
        }

        Ok(Image::Color(ColorFrame {
            red: Frame::new(red, 16),
            green: Frame::new(green, 16),
            blue: Frame::new(blue, 16),
        }))
    } else {
        let gray = img.to_luma16();
        let (w, h) = gray.dimensions();
        let mut data = Array2::<f32>::zeros((h as usize, w as usize));

        for row in 0..h as usize {
            for col in 0..w as usize {
                data[[row, col]] = gray.get_pixel(col as u32, row as u32).0[0] as f32 / 65535.0;
            }
        }

        Ok(Image::Mono(Frame::new(data, 16)))
    }
}

/// Write the stacked result in both renditions: a lossless 16-bit TIFF and
/// an 8-bit PNG. Either write failing is fatal.
pub fn save_outputs(image: &Image, output_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(output_dir)?;

    let tiff_path = output_dir.join(OUTPUT_TIFF);
    let png_path = output_dir.join(OUTPUT_PNG);

    match image {
        Image::Mono(frame) => {
            save_tiff(frame, &tiff_path)?;
            save_png(frame, &png_path)?;
        }
        Image::Color(color) => {
            save_color_tiff(color, &tiff_path)?;
            save_color_png(color, &png_path)?;
        }
    }

    info!(
        tiff = %tiff_path.display(),
        png = %png_path.display(),
        "outputs written"
    );
    Ok((tiff_path, png_path))
}

fn save_tiff(frame: &Frame, path: &Path) -> Result<()> {
    let h = frame.height();
    let w = frame.width();

    let mut pixels: Vec<u16> = Vec::with_capacity(h * w);
    for row in 0..h {
        for col in 0..w {
            pixels.push((frame.data[[row, col]].clamp(0.0, 1.0) * 65535.0) as u16);
        }
    }

    let img = image::ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .expect("buffer size matches dimensions");
    img.save(path)?;
    Ok(())
}

fn save_png(frame: &Frame, path: &Path) -> Result<()> {
    let h = frame.height();
    let w = frame.width();

    let mut img = image::GrayImage::new(w as u32, h as u32);
    for row in 0..h {
        for col in 0..w {
            let val = (frame.data[[row, col]].clamp(0.0, 1.0) * 255.0) as u8;
            img.put_pixel(col as u32, row as u32, Luma([val]));
        }
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

fn save_color_tiff(color: &ColorFrame, path: &Path) -> Result<()> {
    let h = color.red.height();
    let w = color.red.width();

    let mut pixels: Vec<u16> = Vec::with_capacity(h * w * 3);
    for row in 0..h {
        for col in 0..w {
            pixels.push((color.red.data[[row, col]].clamp(0.0, 1.0) * 65535.0) as u16);
            pixels.push((color.green.data[[row, col]].clamp(0.0, 1.0) * 65535.0) as u16);
            pixels.push((color.blue.data[[row, col]].clamp(0.0, 1.0) * 65535.0) as u16);
        }
    }

    let img = image::ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .expect("buffer size matches dimensions");
    img.save(path)?;
    Ok(())
}

fn save_color_png(color: &ColorFrame, path: &Path) -> Result<()> {
    let h = color.red.height();
    let w = color.red.width();

    let mut img = image::RgbImage::new(w as u32, h as u32);
    for row in 0..h {
        for col in 0..w {
            let r = (color.red.data[[row, col]].clamp(0.0, 1.0) * 255.0) as u8;
            let g = (color.green.data[[row, col]].clamp(0.0, 1.0) * 255.0) as u8;
            let b = (color.blue.data[[row, col]].clamp(0.0, 1.0) * 255.0) as u8;
            img.put_pixel(col as u32, row as u32, Rgb([r, g, b]));
        }
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
