use std::path::Path;

use image::{ImageBuffer, Luma};
use tempfile::tempdir;

use luna_core::align::WarpMode;
use luna_core::error::LunaError;
use luna_core::frame::Image;
use luna_core::pipeline::{run_pipeline, StackerConfig};

/// Write a 16-bit grayscale PNG of a bright disk on a dark background.
fn write_disk_png(path: &Path, size: u32, radius: f64) {
    let center = size as f64 / 2.0;
    let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_fn(size, size, |x, y| {
        let d = ((x as f64 - center).powi(2) + (y as f64 - center).powi(2)).sqrt();
        if d <= radius {
            Luma([60000u16])
        } else {
            Luma([800u16])
        }
    });
    img.save(path).unwrap();
}

fn test_config(input: &Path, output: &Path) -> StackerConfig {
    StackerConfig {
        input_dir: input.to_path_buf(),
        output_dir: output.to_path_buf(),
        warp_mode: WarpMode::Translation,
        ecc_max_iters: 100,
        ecc_eps: 1e-4,
        resize_for_speed: 1.0,
        use_clahe: false,
        unsharp_amount: 0.0,
        gauss_sigma: 1.2,
    }
}

#[test]
fn test_full_run_writes_both_renditions() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();

    for name in ["a.png", "b.png", "c.png"] {
        write_disk_png(&input.path().join(name), 64, 14.0);
    }

    let config = test_config(input.path(), output.path());
    let result = run_pipeline(&config).expect("pipeline must succeed");

    assert!(output.path().join("stacked_16bit.tif").is_file());
    assert!(output.path().join("stacked_8bit.png").is_file());

    // Identical frames, identity-converging alignment and amount=0
    // sharpening: the result matches any input frame.
    match result {
        Image::Mono(frame) => {
            assert_eq!((frame.height(), frame.width()), (64, 64));
            let center = frame.data[[32, 32]];
            assert!(
                (center - 60000.0 / 65535.0).abs() < 0.01,
                "disk center value {center} drifted"
            );
        }
        Image::Color(_) => panic!("grayscale input must produce mono output"),
    }
}

#[test]
fn test_missing_directory_aborts() {
    let output = tempdir().unwrap();
    let config = test_config(Path::new("/nonexistent/moon_photos"), output.path());

    let err = run_pipeline(&config).unwrap_err();
    assert!(matches!(err, LunaError::InputUnavailable(_)), "got {err}");
    assert!(!output.path().join("stacked_16bit.tif").exists());
}

#[test]
fn test_empty_directory_aborts() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();

    let err = run_pipeline(&test_config(input.path(), output.path())).unwrap_err();
    assert!(matches!(err, LunaError::NoInputImages(_)), "got {err}");
}

#[test]
fn test_single_frame_aborts_without_output() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_disk_png(&input.path().join("only.png"), 64, 14.0);

    let err = run_pipeline(&test_config(input.path(), output.path())).unwrap_err();
    assert!(matches!(err, LunaError::TooFewFrames { found: 1 }), "got {err}");
    assert!(!output.path().join("stacked_8bit.png").exists());
}

#[test]
fn test_unreadable_file_is_skipped() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();

    for name in ["a.png", "b.png"] {
        write_disk_png(&input.path().join(name), 64, 14.0);
    }
    // Not an image, but carries an image extension.
    std::fs::write(input.path().join("broken.png"), b"not a png").unwrap();
    // Wrong extension: ignored by the directory scan.
    std::fs::write(input.path().join("notes.txt"), b"log").unwrap();

    run_pipeline(&test_config(input.path(), output.path()))
        .expect("two good frames are enough");
}
