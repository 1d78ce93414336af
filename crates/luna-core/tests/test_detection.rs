use ndarray::Array2;

use luna_core::detection::detect_target_mask;
use luna_core::detection::morphology::{dilate_disk, fill_holes};
use luna_core::frame::Frame;

/// 200x200 canvas, dark background with a bright centered disk,
/// mirroring a tripod moon shot.
fn disk_reference(radius: f64) -> Frame {
    let background = 50.0 / 65535.0;
    let disk = 60000.0 / 65535.0;
    let data = Array2::from_shape_fn((200, 200), |(r, c)| {
        let dy = r as f64 - 100.0;
        let dx = c as f64 - 100.0;
        if (dy * dy + dx * dx).sqrt() <= radius {
            disk as f32
        } else {
            background as f32
        }
    });
    Frame::new(data, 16)
}

#[test]
fn test_disk_mask_covers_dilated_disk() {
    let reference = disk_reference(20.0);
    let mask = detect_target_mask(&reference);

    // Dilation radius is max(5, 2% of 200) = 5, so the mask is ~a disk of
    // radius 25.
    assert!(mask[[100, 100]], "disk center must be masked");
    assert!(mask[[100, 120]], "disk edge must be masked");
    assert!(mask[[100, 124]], "dilated margin must be masked");
    assert!(!mask[[100, 140]], "far background must not be masked");
    assert!(!mask[[10, 10]], "corner must not be masked");
}

#[test]
fn test_degenerate_frame_falls_back_to_full_mask() {
    let dark = Frame::new(Array2::from_elem((64, 64), 0.001f32), 16);
    let mask = detect_target_mask(&dark);

    assert!(mask.iter().all(|&v| v), "all-dark frame must yield a full mask");
}

#[test]
fn test_mask_has_at_least_one_sample() {
    let bright = Frame::new(Array2::from_elem((32, 32), 0.99f32), 16);
    let mask = detect_target_mask(&bright);
    assert!(mask.iter().any(|&v| v));
}

#[test]
fn test_dilation_is_monotonic() {
    let mut mask = Array2::from_elem((50, 50), false);
    mask[[25, 25]] = true;
    mask[[10, 40]] = true;

    let dilated = dilate_disk(&mask, 7);
    for ((r, c), &set) in mask.indexed_iter() {
        if set {
            assert!(dilated[[r, c]], "dilation removed a set sample at ({r},{c})");
        }
    }
    assert!(dilated[[25, 30]], "sample within radius must be set");
    assert!(!dilated[[40, 5]], "sample far away must stay clear");
}

#[test]
fn test_dilation_radius_zero_is_identity() {
    let mut mask = Array2::from_elem((10, 10), false);
    mask[[4, 4]] = true;
    assert_eq!(dilate_disk(&mask, 0), mask);
}

#[test]
fn test_fill_holes_closes_interior() {
    // A 1-pixel-thick square ring; the interior must be filled, the
    // exterior left alone.
    let mut ring = Array2::from_elem((20, 20), false);
    for i in 5..15 {
        ring[[5, i]] = true;
        ring[[14, i]] = true;
        ring[[i, 5]] = true;
        ring[[i, 14]] = true;
    }

    let filled = fill_holes(&ring);
    assert!(filled[[10, 10]], "interior must be filled");
    assert!(filled[[5, 5]], "ring itself must stay set");
    assert!(!filled[[2, 2]], "exterior must stay clear");
}

#[test]
fn test_dark_interior_is_masked_with_the_disk() {
    // Bright limb with a dark crater region inside; the mask must still
    // cover the crater.
    let mut reference = disk_reference(30.0);
    for r in 95..105 {
        for c in 95..105 {
            reference.data[[r, c]] = 100.0 / 65535.0;
        }
    }

    let mask = detect_target_mask(&reference);
    assert!(mask[[100, 100]], "dark interior must be filled into the mask");
}
