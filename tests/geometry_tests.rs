//! Frame placement in bottom-left display coordinates.

use proptest::prelude::*;

use notchbar::geometry::{
    collapsed_frame, expanded_frame, lerp_frame, top_centered_frame, DisplayBounds, Frame,
    COLLAPSED_HEIGHT, COLLAPSED_WIDTH, EXPANDED_HEIGHT, EXPANDED_WIDTH,
};

fn reference_display() -> Option<DisplayBounds> {
    Some(DisplayBounds::new(1440.0, 900.0))
}

// === Collapsed Placement Tests ===

#[test]
fn collapsed_frame_on_reference_display() {
    let frame = collapsed_frame(reference_display());
    assert_eq!(frame.x, 545.0);
    assert_eq!(frame.y, 868.0);
}

#[test]
fn collapsed_frame_keeps_requested_size() {
    let frame = collapsed_frame(reference_display());
    assert_eq!(frame.width, COLLAPSED_WIDTH);
    assert_eq!(frame.height, COLLAPSED_HEIGHT);
}

#[test]
fn collapsed_frame_touches_top_edge() {
    let display = DisplayBounds::new(2560.0, 1440.0);
    let frame = collapsed_frame(Some(display));
    assert_eq!(frame.top(), display.height);
}

// === Expanded Placement Tests ===

#[test]
fn expanded_frame_on_reference_display() {
    let frame = expanded_frame(reference_display());
    assert_eq!(frame.x, 420.0);
    assert_eq!(frame.y, 420.0);
    assert_eq!(frame.width, EXPANDED_WIDTH);
    assert_eq!(frame.height, EXPANDED_HEIGHT);
}

#[test]
fn expanded_frame_is_horizontally_centered() {
    let display = DisplayBounds::new(1920.0, 1080.0);
    let frame = expanded_frame(Some(display));
    let left_gap = frame.x;
    let right_gap = display.width - frame.right();
    assert!((left_gap - right_gap).abs() < 1e-3);
}

// === Missing Display Tests ===

#[test]
fn no_display_falls_back_to_origin() {
    let frame = top_centered_frame(None, 320.0, 200.0);
    assert_eq!(frame, Frame::new(0.0, 0.0, 320.0, 200.0));
}

#[test]
fn no_display_fallback_applies_to_both_sizes() {
    assert_eq!(collapsed_frame(None).x, 0.0);
    assert_eq!(expanded_frame(None).y, 0.0);
}

// === Coordinate Conversion Tests ===

#[test]
fn top_left_position_of_top_anchored_frame_is_zero() {
    let display = DisplayBounds::new(1440.0, 900.0);
    let frame = collapsed_frame(Some(display));
    assert_eq!(frame.top_left_position(display), (545.0, 0.0));
}

#[test]
fn top_left_position_measures_down_from_top() {
    let display = DisplayBounds::new(1000.0, 800.0);
    let frame = Frame::new(100.0, 300.0, 200.0, 100.0);
    // Frame top sits at 400 from the bottom, so 400 from the top.
    assert_eq!(frame.top_left_position(display), (100.0, 400.0));
}

// === Interpolation Tests ===

#[test]
fn lerp_endpoints_match_inputs() {
    let from = Frame::new(0.0, 0.0, 100.0, 50.0);
    let to = Frame::new(40.0, 20.0, 300.0, 150.0);
    assert_eq!(lerp_frame(from, to, 0.0), from);
    assert_eq!(lerp_frame(from, to, 1.0), to);
}

#[test]
fn lerp_midpoint_is_halfway() {
    let from = Frame::new(0.0, 0.0, 100.0, 50.0);
    let to = Frame::new(40.0, 20.0, 300.0, 150.0);
    let mid = lerp_frame(from, to, 0.5);
    assert_eq!(mid, Frame::new(20.0, 10.0, 200.0, 100.0));
}

#[test]
fn lerp_clamps_out_of_range_progress() {
    let from = Frame::new(0.0, 0.0, 100.0, 50.0);
    let to = Frame::new(40.0, 20.0, 300.0, 150.0);
    assert_eq!(lerp_frame(from, to, -1.0), from);
    assert_eq!(lerp_frame(from, to, 2.0), to);
}

// === Placement Properties ===

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: On any display large enough for the window, the frame stays
    /// inside the display bounds.
    #[test]
    fn property_frame_contained_in_display(
        display_width in 700.0f32..5000.0,
        display_height in 500.0f32..3000.0,
    ) {
        let display = DisplayBounds::new(display_width, display_height);
        for frame in [collapsed_frame(Some(display)), expanded_frame(Some(display))] {
            prop_assert!(frame.x >= 0.0);
            prop_assert!(frame.y >= 0.0);
            prop_assert!(frame.right() <= display.width + 1e-3);
            prop_assert!(frame.top() <= display.height + 1e-3);
        }
    }

    /// PROPERTY: The frame is horizontally centered and anchored to the top
    /// edge on any display.
    #[test]
    fn property_frame_centered_and_top_anchored(
        display_width in 700.0f32..5000.0,
        display_height in 500.0f32..3000.0,
    ) {
        let display = DisplayBounds::new(display_width, display_height);
        let frame = expanded_frame(Some(display));
        let left_gap = frame.x;
        let right_gap = display.width - frame.right();
        prop_assert!((left_gap - right_gap).abs() < 1e-2);
        prop_assert!((frame.top() - display.height).abs() < 1e-3);
    }

    /// PROPERTY: Interpolation never leaves the segment between its
    /// endpoints, whatever progress value arrives.
    #[test]
    fn property_lerp_stays_between_endpoints(t in -2.0f32..3.0) {
        let from = Frame::new(545.0, 868.0, 350.0, 32.0);
        let to = Frame::new(420.0, 420.0, 600.0, 480.0);
        let frame = lerp_frame(from, to, t);
        prop_assert!(frame.width >= from.width.min(to.width));
        prop_assert!(frame.width <= from.width.max(to.width));
        prop_assert!(frame.x >= from.x.min(to.x));
        prop_assert!(frame.x <= from.x.max(to.x));
    }
}
