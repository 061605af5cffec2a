//! Library half of notchbar, a menu-bar notch overlay: media controls,
//! notifications, today's calendar, a launcher grid, and a file tray behind
//! a hover-expanded always-on-top window.
//!
//! Everything here runs without a display: frame math, the expand/collapse
//! machine, the scheduler, the scripted media bridge, and the feature list
//! managers. The binary binds these to an eframe viewport.

pub mod animation;
pub mod apps;
pub mod calendar;
pub mod config;
pub mod geometry;
pub mod media;
pub mod notch;
pub mod notifications;
pub mod power;
pub mod schedule;
pub mod script;
pub mod state;
pub mod tray;

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RECORD_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity for list records; remove-by-id compares these.
pub(crate) fn next_record_id() -> u64 {
    NEXT_RECORD_ID.fetch_add(1, Ordering::Relaxed)
}
