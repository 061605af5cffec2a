//! The notch window's expand/collapse machine. Pure state: the shell feeds
//! it hover events, toggle commands, and fired scheduler tasks, and reads
//! back the frame to apply to the viewport.

use std::time::{Duration, Instant};

use crate::animation::FrameAnimation;
use crate::geometry::{self, top_centered_frame, DisplayBounds, Frame};
use crate::schedule::{Generation, Scheduler, TaskKind};

pub const GRACE_DELAY: Duration = Duration::from_millis(300);
pub const ANIMATION_DURATION: Duration = Duration::from_millis(300);
pub const INDICATOR_HIDE_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotchPhase {
    /// Collapsed with the indicator pill hidden; still hover-tracked.
    CollapsedHidden,
    CollapsedVisible,
    Expanded,
}

/// Sizes and timing the machine runs with. Defaults are the product's fixed
/// values; the config layer may override them.
#[derive(Debug, Clone, Copy)]
pub struct NotchSettings {
    pub collapsed_size: (f32, f32),
    pub expanded_size: (f32, f32),
    pub grace_delay: Duration,
    pub animation_duration: Duration,
    pub indicator_hide_interval: Duration,
}

impl Default for NotchSettings {
    fn default() -> Self {
        Self {
            collapsed_size: (geometry::COLLAPSED_WIDTH, geometry::COLLAPSED_HEIGHT),
            expanded_size: (geometry::EXPANDED_WIDTH, geometry::EXPANDED_HEIGHT),
            grace_delay: GRACE_DELAY,
            animation_duration: ANIMATION_DURATION,
            indicator_hide_interval: INDICATOR_HIDE_INTERVAL,
        }
    }
}

#[derive(Debug)]
pub struct NotchController {
    settings: NotchSettings,
    phase: NotchPhase,
    pinned: bool,
    hovering: bool,
    animation: Option<FrameAnimation>,
    grace_task: Option<Generation>,
}

impl NotchController {
    pub fn new(settings: NotchSettings) -> Self {
        Self {
            settings,
            phase: NotchPhase::CollapsedVisible,
            pinned: false,
            hovering: false,
            animation: None,
            grace_task: None,
        }
    }

    pub fn phase(&self) -> NotchPhase {
        self.phase
    }

    pub fn is_expanded(&self) -> bool {
        self.phase == NotchPhase::Expanded
    }

    pub fn indicator_visible(&self) -> bool {
        self.phase != NotchPhase::CollapsedHidden
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    pub fn set_pinned(&mut self, pinned: bool) {
        self.pinned = pinned;
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        match &self.animation {
            Some(animation) => !animation.is_complete(now),
            None => false,
        }
    }

    /// Arms the recurring indicator-hide timer. Call once at startup.
    pub fn start(&mut self, scheduler: &mut Scheduler, now: Instant) {
        scheduler.schedule(
            TaskKind::HideIndicator,
            self.settings.indicator_hide_interval,
            now,
        );
    }

    /// Current frame in bottom-left display coordinates. Settled phases track
    /// the live display bounds so resolution changes are picked up; a running
    /// animation holds its captured endpoints until it completes.
    pub fn frame(&mut self, now: Instant, display: Option<DisplayBounds>) -> Frame {
        if let Some(animation) = self.animation {
            if animation.is_complete(now) {
                self.animation = None;
                return animation.target();
            }
            return animation.value(now);
        }
        self.settled_frame(display)
    }

    fn settled_frame(&self, display: Option<DisplayBounds>) -> Frame {
        let (width, height) = match self.phase {
            NotchPhase::Expanded => self.settings.expanded_size,
            _ => self.settings.collapsed_size,
        };
        top_centered_frame(display, width, height)
    }

    pub fn hover_enter(
        &mut self,
        scheduler: &mut Scheduler,
        now: Instant,
        display: Option<DisplayBounds>,
    ) {
        self.hovering = true;

        // A pending grace collapse dies the moment the pointer comes back.
        if let Some(generation) = self.grace_task.take() {
            scheduler.cancel(generation);
        }

        if self.phase == NotchPhase::CollapsedHidden {
            self.phase = NotchPhase::CollapsedVisible;
        }
        self.restart_indicator_timer(scheduler, now);
        self.begin_expand(now, display);
    }

    pub fn hover_exit(&mut self, scheduler: &mut Scheduler, now: Instant) {
        self.hovering = false;

        if let Some(generation) = self.grace_task.take() {
            scheduler.cancel(generation);
        }
        self.grace_task = Some(scheduler.schedule(
            TaskKind::CollapseAfterGrace,
            self.settings.grace_delay,
            now,
        ));
    }

    /// External toggle: expanded unpins and collapses, collapsed expands and
    /// pins. Ignored while a transition is in flight.
    pub fn toggle(&mut self, now: Instant, display: Option<DisplayBounds>) {
        if self.is_animating(now) {
            return;
        }
        if self.is_expanded() {
            self.pinned = false;
            self.begin_collapse(now, display);
        } else {
            self.begin_expand(now, display);
            self.pinned = true;
        }
    }

    /// Reacts to a fired scheduler task. Returns false for kinds this
    /// machine does not own.
    pub fn handle_task(
        &mut self,
        kind: TaskKind,
        scheduler: &mut Scheduler,
        now: Instant,
        display: Option<DisplayBounds>,
    ) -> bool {
        match kind {
            TaskKind::CollapseAfterGrace => {
                self.grace_task = None;
                if !self.hovering && !self.pinned && self.is_expanded() {
                    self.begin_collapse(now, display);
                }
                true
            }
            TaskKind::HideIndicator => {
                if !self.hovering && !self.is_expanded() {
                    self.phase = NotchPhase::CollapsedHidden;
                }
                // Recurring: the next cycle is always armed.
                scheduler.schedule(
                    TaskKind::HideIndicator,
                    self.settings.indicator_hide_interval,
                    now,
                );
                true
            }
            _ => false,
        }
    }

    fn restart_indicator_timer(&mut self, scheduler: &mut Scheduler, now: Instant) {
        scheduler.cancel_kind(TaskKind::HideIndicator);
        scheduler.schedule(
            TaskKind::HideIndicator,
            self.settings.indicator_hide_interval,
            now,
        );
    }

    fn begin_expand(&mut self, now: Instant, display: Option<DisplayBounds>) {
        if self.is_animating(now) || self.is_expanded() {
            return;
        }
        let from = self.frame(now, display);
        self.phase = NotchPhase::Expanded;
        let to = self.settled_frame(display);
        self.animation = Some(FrameAnimation::new(
            from,
            to,
            now,
            self.settings.animation_duration,
        ));
    }

    fn begin_collapse(&mut self, now: Instant, display: Option<DisplayBounds>) {
        if self.is_animating(now) || !self.is_expanded() {
            return;
        }
        let from = self.frame(now, display);
        self.phase = NotchPhase::CollapsedVisible;
        let to = self.settled_frame(display);
        self.animation = Some(FrameAnimation::new(
            from,
            to,
            now,
            self.settings.animation_duration,
        ));
    }
}

impl Default for NotchController {
    fn default() -> Self {
        Self::new(NotchSettings::default())
    }
}
