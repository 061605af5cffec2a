//! Frame math for the notch window. All frames live in bottom-left-origin
//! display coordinates; the shell converts to the windowing system's
//! top-left origin when it talks to the viewport.

pub const COLLAPSED_WIDTH: f32 = 350.0;
pub const COLLAPSED_HEIGHT: f32 = 32.0;
pub const EXPANDED_WIDTH: f32 = 600.0;
pub const EXPANDED_HEIGHT: f32 = 480.0;

/// Bounds of the display the notch is anchored to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayBounds {
    pub width: f32,
    pub height: f32,
}

impl DisplayBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A window frame in bottom-left-origin display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Top-left-origin position of this frame on the given display, the
    /// convention the viewport layer expects.
    pub fn top_left_position(&self, display: DisplayBounds) -> (f32, f32) {
        (self.x, display.height - self.top())
    }
}

/// A `width`×`height` frame horizontally centered at the top edge of the
/// display. Without a display the frame falls back to the requested size at
/// the origin; nothing is surfaced to the user.
pub fn top_centered_frame(display: Option<DisplayBounds>, width: f32, height: f32) -> Frame {
    match display {
        Some(bounds) => Frame::new(
            (bounds.width - width) / 2.0,
            bounds.height - height,
            width,
            height,
        ),
        None => Frame::new(0.0, 0.0, width, height),
    }
}

pub fn collapsed_frame(display: Option<DisplayBounds>) -> Frame {
    top_centered_frame(display, COLLAPSED_WIDTH, COLLAPSED_HEIGHT)
}

pub fn expanded_frame(display: Option<DisplayBounds>) -> Frame {
    top_centered_frame(display, EXPANDED_WIDTH, EXPANDED_HEIGHT)
}

/// Linear blend between two frames, `t` clamped to `0..=1`.
pub fn lerp_frame(from: Frame, to: Frame, t: f32) -> Frame {
    let t = t.clamp(0.0, 1.0);
    Frame::new(
        from.x + (to.x - from.x) * t,
        from.y + (to.y - from.y) * t,
        from.width + (to.width - from.width) * t,
        from.height + (to.height - from.height) * t,
    )
}
