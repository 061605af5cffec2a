//! Notification list. The desktop gives no way to read what other apps have
//! delivered, so the real source is always empty and the sample set stands
//! in; the plumbing still goes through the provider seam so the panel works
//! the same way the calendar one does.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Duration, Local};

use crate::next_record_id;
use crate::state::ColorTag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub id: u64,
    pub app_name: String,
    pub title: String,
    pub body: String,
    pub glyph: String,
    pub color: ColorTag,
    pub timestamp: DateTime<Local>,
}

impl NotificationRecord {
    pub fn new(
        app_name: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        glyph: impl Into<String>,
        color: ColorTag,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            id: next_record_id(),
            app_name: app_name.into(),
            title: title.into(),
            body: body.into(),
            glyph: glyph.into(),
            color,
            timestamp,
        }
    }
}

pub trait NotificationSource: Send + Sync {
    fn request_access(&self) -> bool;
    fn delivered(&self, now: DateTime<Local>) -> Vec<NotificationRecord>;
}

/// Production source. Authorization is granted trivially (there is nothing
/// to protect) and the delivered list is empty; `load` then falls back to
/// the samples.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemNotificationSource;

impl NotificationSource for SystemNotificationSource {
    fn request_access(&self) -> bool {
        true
    }

    fn delivered(&self, _now: DateTime<Local>) -> Vec<NotificationRecord> {
        Vec::new()
    }
}

pub fn sample_notifications(now: DateTime<Local>) -> Vec<NotificationRecord> {
    vec![
        NotificationRecord::new(
            "Messages",
            "John Doe",
            "Hey, are we still on for lunch?",
            "💬",
            ColorTag::Green,
            now - Duration::seconds(300),
        ),
        NotificationRecord::new(
            "Mail",
            "Meeting Reminder",
            "Team sync in 15 minutes",
            "✉",
            ColorTag::Blue,
            now - Duration::seconds(900),
        ),
        NotificationRecord::new(
            "Calendar",
            "Upcoming Event",
            "Project deadline tomorrow",
            "📅",
            ColorTag::Red,
            now - Duration::seconds(3600),
        ),
    ]
}

/// "Just now" under a minute, then coarse minute/hour/day buckets.
pub fn relative_age(timestamp: DateTime<Local>, now: DateTime<Local>) -> String {
    let seconds = (now - timestamp).num_seconds().max(0);
    if seconds < 60 {
        return "Just now".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

pub struct NotificationManager {
    source: Arc<dyn NotificationSource>,
    notifications: Vec<NotificationRecord>,
    has_requested_access: bool,
    pending: Option<Receiver<Vec<NotificationRecord>>>,
}

impl NotificationManager {
    pub fn new(source: Arc<dyn NotificationSource>) -> Self {
        Self {
            source,
            notifications: Vec::new(),
            has_requested_access: false,
            pending: None,
        }
    }

    pub fn notifications(&self) -> &[NotificationRecord] {
        &self.notifications
    }

    pub fn has_requested_access(&self) -> bool {
        self.has_requested_access
    }

    /// One-shot guarded authorization; grant loads, denial goes straight to
    /// the samples.
    pub fn request_access(&mut self) {
        if self.has_requested_access {
            return;
        }
        self.has_requested_access = true;

        let source = Arc::clone(&self.source);
        let (tx, rx) = mpsc::channel();
        self.pending = Some(rx);
        thread::spawn(move || {
            let now = Local::now();
            let notifications = if source.request_access() {
                let delivered = source.delivered(now);
                if delivered.is_empty() {
                    sample_notifications(now)
                } else {
                    delivered
                }
            } else {
                log::info!("notifications: access denied, using samples");
                sample_notifications(now)
            };
            let _ = tx.send(notifications);
        });
    }

    pub fn load(&mut self) {
        let source = Arc::clone(&self.source);
        let (tx, rx) = mpsc::channel();
        self.pending = Some(rx);
        thread::spawn(move || {
            let now = Local::now();
            let delivered = source.delivered(now);
            let notifications = if delivered.is_empty() {
                sample_notifications(now)
            } else {
                delivered
            };
            let _ = tx.send(notifications);
        });
    }

    /// Drains a finished load, if any. Returns true when the list changed.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };
        let mut replaced = None;
        while let Ok(notifications) = rx.try_recv() {
            replaced = Some(notifications);
        }
        match replaced {
            Some(notifications) => {
                self.notifications = notifications;
                self.pending = None;
                true
            }
            None => false,
        }
    }

    /// Idempotent: removing an id that is not held is a no-op.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|notification| notification.id != id);
        self.notifications.len() != before
    }

    pub fn clear(&mut self) -> bool {
        if self.notifications.is_empty() {
            return false;
        }
        self.notifications.clear();
        true
    }
}
