use ndarray::Array2;

use luna_core::error::LunaError;
use luna_core::frame::{ColorFrame, Frame, Image};
use luna_core::stack::median_stack;

fn mono(value: f32) -> Image {
    Image::Mono(Frame::new(Array2::from_elem((10, 12), value), 16))
}

fn mono_data(image: &Image) -> &Array2<f32> {
    match image {
        Image::Mono(f) => &f.data,
        Image::Color(_) => panic!("expected mono"),
    }
}

#[test]
fn test_identical_frames_stack_to_themselves() {
    // Three frames, all samples = 1000 on the 16-bit scale.
    let value = 1000.0 / 65535.0;
    let frames = vec![mono(value), mono(value), mono(value)];

    let stacked = median_stack(&frames).unwrap();
    for &v in mono_data(&stacked).iter() {
        assert_eq!(v, value as f32);
    }
}

#[test]
fn test_odd_count_picks_middle_value() {
    let frames = vec![mono(0.1), mono(0.9), mono(0.5)];
    let stacked = median_stack(&frames).unwrap();
    assert_eq!(mono_data(&stacked)[[3, 3]], 0.5);
}

#[test]
fn test_even_count_averages_middle_pair() {
    let frames = vec![mono(0.0), mono(0.2), mono(0.6), mono(1.0)];
    let stacked = median_stack(&frames).unwrap();
    let v = mono_data(&stacked)[[0, 0]];
    assert!((v - 0.4).abs() < 1e-6, "expected 0.4, got {v}");
}

#[test]
fn test_median_is_permutation_invariant() {
    let build = |order: [f32; 5]| -> Image {
        let frames: Vec<Image> = order.iter().map(|&v| mono(v)).collect();
        median_stack(&frames).unwrap()
    };

    let a = build([0.1, 0.7, 0.3, 0.9, 0.5]);
    let b = build([0.9, 0.1, 0.5, 0.3, 0.7]);
    assert_eq!(mono_data(&a), mono_data(&b));
}

#[test]
fn test_median_resists_outliers() {
    let mut frames = vec![mono(0.5), mono(0.5), mono(0.5), mono(0.5)];
    // Satellite trail in one frame.
    if let Image::Mono(f) = &mut frames[2] {
        for c in 0..12 {
            f.data[[5, c]] = 1.0;
        }
    }

    let stacked = median_stack(&frames).unwrap();
    assert_eq!(mono_data(&stacked)[[5, 6]], 0.5);
}

#[test]
fn test_color_frames_stack_per_channel() {
    let color = |r: f32, g: f32, b: f32| -> Image {
        Image::Color(ColorFrame {
            red: Frame::new(Array2::from_elem((6, 6), r), 16),
            green: Frame::new(Array2::from_elem((6, 6), g), 16),
            blue: Frame::new(Array2::from_elem((6, 6), b), 16),
        })
    };
    let frames = vec![color(0.1, 0.4, 0.7), color(0.3, 0.6, 0.9), color(0.2, 0.5, 0.8)];

    let stacked = median_stack(&frames).unwrap();
    match stacked {
        Image::Color(cf) => {
            assert!((cf.red.data[[0, 0]] - 0.2).abs() < 1e-6);
            assert!((cf.green.data[[0, 0]] - 0.5).abs() < 1e-6);
            assert!((cf.blue.data[[0, 0]] - 0.8).abs() < 1e-6);
        }
        Image::Mono(_) => panic!("color stack must stay color"),
    }
}

#[test]
fn test_empty_stack_is_rejected() {
    let result = median_stack(&[]);
    assert!(matches!(result, Err(LunaError::EmptySequence)));
}

#[test]
fn test_shape_mismatch_is_rejected() {
    let frames = vec![
        mono(0.5),
        Image::Mono(Frame::new(Array2::from_elem((4, 4), 0.5f32), 16)),
    ];
    assert!(matches!(median_stack(&frames), Err(LunaError::Pipeline(_))));
}
