use ndarray::Array2;

use luna_core::align::ecc::{estimate_warp, EccFailure, EccParams, EccTermination};
use luna_core::align::phase::estimate_shift;
use luna_core::align::warp::warp_frame;
use luna_core::align::{register_frame, RegistrationParams, Transform, WarpMode};
use luna_core::frame::{Frame, Image};

/// Smooth multi-blob texture with enough gradient structure to constrain
/// all six affine parameters.
fn texture(h: usize, w: usize, shift_x: f64, shift_y: f64) -> Array2<f32> {
    let blob = |x: f64, y: f64, cx: f64, cy: f64, sigma: f64, amp: f64| -> f64 {
        let d2 = (x - cx).powi(2) + (y - cy).powi(2);
        amp * (-d2 / (2.0 * sigma * sigma)).exp()
    };

    Array2::from_shape_fn((h, w), |(r, c)| {
        // A content shift of (+sx, +sy) means sampling the base pattern at
        // (x - sx, y - sy).
        let x = c as f64 - shift_x;
        let y = r as f64 - shift_y;
        let v = blob(x, y, w as f64 * 0.5, h as f64 * 0.5, 9.0, 0.8)
            + blob(x, y, w as f64 * 0.25, h as f64 * 0.3, 5.0, 0.5)
            + blob(x, y, w as f64 * 0.7, h as f64 * 0.75, 6.0, 0.4)
            + 0.05 * (x + y) / (w + h) as f64;
        v.clamp(0.0, 1.0) as f32
    })
}

fn full_mask(h: usize, w: usize) -> Array2<bool> {
    Array2::from_elem((h, w), true)
}

fn translation_params(max_iters: usize) -> EccParams {
    EccParams {
        mode: WarpMode::Translation,
        max_iters,
        eps: 1e-6,
    }
}

#[test]
fn test_self_alignment_converges_to_identity() {
    let reference = texture(80, 80, 0.0, 0.0);
    let mask = full_mask(80, 80);

    for mode in [WarpMode::Translation, WarpMode::Affine] {
        let params = EccParams {
            mode,
            max_iters: 100,
            eps: 1e-6,
        };
        let estimate = estimate_warp(&reference, &mask, &reference, &params)
            .expect("self-alignment must not fail");

        match estimate.transform {
            Transform::Translation { dx, dy } => {
                assert!(dx.abs() < 0.05, "dx={dx} should be ~0");
                assert!(dy.abs() < 0.05, "dy={dy} should be ~0");
            }
            Transform::Affine(m) => {
                assert!((m[0][0] - 1.0).abs() < 0.01);
                assert!((m[1][1] - 1.0).abs() < 0.01);
                assert!(m[0][2].abs() < 0.1, "tx={} should be ~0", m[0][2]);
                assert!(m[1][2].abs() < 0.1, "ty={} should be ~0", m[1][2]);
            }
        }
        assert!(
            estimate.correlation > 0.99,
            "self-correlation should be ~1, got {}",
            estimate.correlation
        );
    }
}

#[test]
fn test_known_shift_recovered_in_translation_mode() {
    let reference = texture(96, 96, 0.0, 0.0);
    let candidate = texture(96, 96, 3.0, -2.0);
    let mask = full_mask(96, 96);

    let estimate = estimate_warp(&reference, &mask, &candidate, &translation_params(300))
        .expect("shift estimation must not fail");

    match estimate.transform {
        Transform::Translation { dx, dy } => {
            assert!((dx - 3.0).abs() < 0.5, "dx={dx}, expected ~3");
            assert!((dy + 2.0).abs() < 0.5, "dy={dy}, expected ~-2");
        }
        Transform::Affine(_) => panic!("translation mode must yield a translation"),
    }
}

#[test]
fn test_iteration_cap_still_yields_transform() {
    let reference = texture(64, 64, 0.0, 0.0);
    let candidate = texture(64, 64, 2.0, 1.0);
    let mask = full_mask(64, 64);

    let estimate = estimate_warp(&reference, &mask, &candidate, &translation_params(1))
        .expect("a capped run still returns its best estimate");
    assert_eq!(estimate.termination, EccTermination::IterationLimit);
}

#[test]
fn test_flat_candidate_is_a_numerical_failure() {
    let reference = texture(48, 48, 0.0, 0.0);
    let candidate = Array2::from_elem((48, 48), 0.25f32);
    let mask = full_mask(48, 48);

    let result = estimate_warp(&reference, &mask, &candidate, &translation_params(50));
    assert!(
        matches!(
            result,
            Err(EccFailure::SingularSystem) | Err(EccFailure::NonPositiveCorrelation)
        ),
        "gradient-free candidate must fail numerically, got {result:?}"
    );
}

#[test]
fn test_tiny_mask_is_rejected() {
    let reference = texture(48, 48, 0.0, 0.0);
    let mut mask = full_mask(48, 48);
    mask.fill(false);
    mask[[20, 20]] = true;

    let result = estimate_warp(&reference, &mask, &reference, &translation_params(50));
    assert_eq!(result.unwrap_err(), EccFailure::DegenerateMask);
}

#[test]
fn test_phase_correlation_recovers_shift() {
    let reference = texture(64, 64, 0.0, 0.0);
    let candidate = texture(64, 64, 3.0, -2.0);

    let transform = estimate_shift(&reference, &candidate).unwrap();
    match transform {
        Transform::Translation { dx, dy } => {
            assert!((dx - 3.0).abs() < 0.5, "dx={dx}, expected ~3");
            assert!((dy + 2.0).abs() < 0.5, "dy={dy}, expected ~-2");
        }
        Transform::Affine(_) => panic!("phase correlation is translation-only"),
    }
}

#[test]
fn test_fallback_path_emits_correctly_sized_frame() {
    // A flat candidate forces ECC failure; the phase fallback must still
    // produce an aligned frame at reference dimensions, even in affine mode.
    let reference = Frame::new(texture(48, 48, 0.0, 0.0), 16);
    let mask = full_mask(48, 48);
    let candidate = Image::Mono(Frame::new(Array2::from_elem((48, 48), 0.25f32), 16));

    let params = RegistrationParams {
        reference: &reference,
        mask: &mask,
        warp_mode: WarpMode::Affine,
        use_clahe: false,
        resize_for_speed: 1.0,
        max_iters: 50,
        eps: 1e-7,
    };

    let aligned = register_frame(&candidate, 1, &params).expect("fallback must keep the frame");
    assert_eq!(aligned.height(), 48);
    assert_eq!(aligned.width(), 48);
}

#[test]
fn test_registered_frame_matches_reference_within_tolerance() {
    let ref_data = texture(72, 72, 0.0, 0.0);
    let reference = Frame::new(ref_data.clone(), 16);
    let mask = full_mask(72, 72);
    let candidate = Image::Mono(Frame::new(texture(72, 72, 2.0, 1.0), 16));

    let params = RegistrationParams {
        reference: &reference,
        mask: &mask,
        warp_mode: WarpMode::Translation,
        use_clahe: false,
        resize_for_speed: 1.0,
        max_iters: 300,
        eps: 1e-7,
    };

    let aligned = register_frame(&candidate, 1, &params).expect("registration must succeed");
    let aligned_data = match aligned {
        Image::Mono(f) => f.data,
        Image::Color(_) => panic!("mono input must stay mono"),
    };

    // Compare away from the borders where reflection padding differs.
    let mut max_err = 0.0f32;
    for r in 8..64 {
        for c in 8..64 {
            max_err = max_err.max((aligned_data[[r, c]] - ref_data[[r, c]]).abs());
        }
    }
    assert!(max_err < 0.02, "max interior error {max_err} too large");
}

#[test]
fn test_mismatched_dimensions_excluded_without_resize() {
    let reference = Frame::new(texture(64, 64, 0.0, 0.0), 16);
    let mask = full_mask(64, 64);
    let candidate = Image::Mono(Frame::new(texture(48, 48, 0.0, 0.0), 16));

    let params = RegistrationParams {
        reference: &reference,
        mask: &mask,
        warp_mode: WarpMode::Translation,
        use_clahe: false,
        resize_for_speed: 1.0,
        max_iters: 50,
        eps: 1e-7,
    };
    assert!(register_frame(&candidate, 0, &params).is_none());

    // With resizing enabled the same frame is forced to reference size.
    let params_resize = RegistrationParams {
        resize_for_speed: 0.5,
        ..params
    };
    let aligned = register_frame(&candidate, 0, &params_resize).expect("resize must rescue");
    assert_eq!((aligned.height(), aligned.width()), (64, 64));
}

#[test]
fn test_warp_roundtrip_of_estimated_shift() {
    // Warping the candidate with the estimated transform must reproduce the
    // reference within interpolation tolerance.
    let reference = texture(64, 64, 0.0, 0.0);
    let candidate = Frame::new(texture(64, 64, 1.5, -0.5), 16);
    let mask = full_mask(64, 64);

    let estimate = estimate_warp(&reference, &mask, &candidate.data, &translation_params(300))
        .expect("estimation must succeed");
    let aligned = warp_frame(&candidate, &estimate.transform, 64, 64);

    let mut max_err = 0.0f32;
    for r in 8..56 {
        for c in 8..56 {
            max_err = max_err.max((aligned.data[[r, c]] - reference[[r, c]]).abs());
        }
    }
    assert!(max_err < 0.02, "roundtrip interior error {max_err} too large");
}
