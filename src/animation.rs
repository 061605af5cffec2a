use std::time::{Duration, Instant};

use crate::geometry::{lerp_frame, Frame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
}

impl Easing {
    /// Maps linear progress `t` (clamped to `0..=1`) onto the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t * t,
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// One in-flight frame transition. The controller holds at most one; a new
/// transition cannot start while this one is running.
#[derive(Debug, Clone, Copy)]
pub struct FrameAnimation {
    from: Frame,
    to: Frame,
    started: Instant,
    duration: Duration,
    easing: Easing,
}

impl FrameAnimation {
    pub fn new(from: Frame, to: Frame, started: Instant, duration: Duration) -> Self {
        Self {
            from,
            to,
            started,
            duration,
            easing: Easing::EaseOut,
        }
    }

    pub fn target(&self) -> Frame {
        self.to
    }

    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Frame at `now`, clamped to the target once the duration has elapsed.
    pub fn value(&self, now: Instant) -> Frame {
        lerp_frame(self.from, self.to, self.easing.apply(self.progress(now)))
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}
