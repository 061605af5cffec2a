//! Today's calendar events. The real source goes through the scripted
//! calendar store; denied access or an empty answer falls back to the sample
//! set, so the panel is never blank.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Duration, Local};

use crate::next_record_id;
use crate::script::{ScriptError, ScriptRunner};
use crate::state::ColorTag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub id: u64,
    pub title: String,
    pub location: Option<String>,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub color: ColorTag,
}

impl EventRecord {
    pub fn new(
        title: impl Into<String>,
        location: Option<&str>,
        start: DateTime<Local>,
        end: DateTime<Local>,
        color: ColorTag,
    ) -> Self {
        Self {
            id: next_record_id(),
            title: title.into(),
            location: location.map(str::to_string),
            start,
            end,
            color,
        }
    }
}

/// Provider seam. The scripted store is the production impl; tests use a
/// canned one.
pub trait CalendarSource: Send + Sync {
    /// One authorization probe; the OS shows its prompt on first touch.
    fn request_access(&self) -> bool;
    fn events_today(&self, now: DateTime<Local>) -> Vec<EventRecord>;
}

/// Status query against the calendar store. One line per event, fields
/// joined with the media bridge's delimiter, start/end as whole-second
/// offsets from now (locale-free).
pub fn events_script() -> String {
    r#"set nowDate to current date
set dayEnd to nowDate - (time of nowDate) + (1 * days)
set output to ""
tell application "Calendar"
    repeat with cal in calendars
        repeat with ev in (every event of cal whose start date >= nowDate and start date < dayEnd)
            set startOffset to ((start date of ev) - nowDate) as integer
            set endOffset to ((end date of ev) - nowDate) as integer
            set output to output & (summary of ev) & "|||" & (location of ev) & "|||" & startOffset & "|||" & endOffset & linefeed
        end repeat
    end repeat
end tell
return output"#
        .to_string()
}

const ACCESS_PROBE_SCRIPT: &str = r#"tell application "Calendar" to count calendars"#;

/// Rotating palette for real events; the scripted store does not carry
/// calendar colors across.
const EVENT_PALETTE: [ColorTag; 4] = [
    ColorTag::Blue,
    ColorTag::Green,
    ColorTag::Purple,
    ColorTag::Orange,
];

/// Positional parse of the scripted response. Lines that are short or carry
/// unparseable offsets are skipped, never errors. Result is sorted by start.
pub fn parse_events_response(response: &str, now: DateTime<Local>) -> Vec<EventRecord> {
    let mut events = Vec::new();
    for line in response.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split("|||").collect();
        if parts.len() < 4 {
            continue;
        }
        let (Ok(start_offset), Ok(end_offset)) =
            (parts[2].trim().parse::<i64>(), parts[3].trim().parse::<i64>())
        else {
            continue;
        };
        let location = parts[1].trim();
        let location = match location {
            "" | "missing value" => None,
            value => Some(value),
        };
        let color = EVENT_PALETTE[events.len() % EVENT_PALETTE.len()];
        events.push(EventRecord::new(
            parts[0].trim(),
            location,
            now + Duration::seconds(start_offset),
            now + Duration::seconds(end_offset),
            color,
        ));
    }
    events.sort_by_key(|event| event.start);
    events
}

pub struct ScriptedCalendarSource<R: ScriptRunner> {
    runner: R,
}

impl<R: ScriptRunner> ScriptedCalendarSource<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn run_logged(&self, source: &str) -> Result<String, ScriptError> {
        let result = self.runner.run(source);
        if let Err(err) = &result {
            log::debug!("calendar: script failed: {err}");
        }
        result
    }
}

impl<R: ScriptRunner + Sync> CalendarSource for ScriptedCalendarSource<R> {
    fn request_access(&self) -> bool {
        self.run_logged(ACCESS_PROBE_SCRIPT).is_ok()
    }

    fn events_today(&self, now: DateTime<Local>) -> Vec<EventRecord> {
        match self.run_logged(&events_script()) {
            Ok(response) => parse_events_response(&response, now),
            Err(_) => Vec::new(),
        }
    }
}

pub fn sample_events(now: DateTime<Local>) -> Vec<EventRecord> {
    vec![
        EventRecord::new(
            "Team Standup",
            Some("Zoom"),
            now + Duration::minutes(15),
            now + Duration::minutes(45),
            ColorTag::Blue,
        ),
        EventRecord::new(
            "Lunch with Sarah",
            Some("Cafe Downtown"),
            now + Duration::hours(2),
            now + Duration::hours(3),
            ColorTag::Green,
        ),
        EventRecord::new(
            "Project Review",
            Some("Conference Room B"),
            now + Duration::hours(4),
            now + Duration::hours(5),
            ColorTag::Purple,
        ),
    ]
}

pub fn format_time_range(event: &EventRecord) -> String {
    format!(
        "{} – {}",
        event.start.format("%H:%M"),
        event.end.format("%H:%M")
    )
}

/// Owns the event list. Loads replace it wholesale off-thread; mutations are
/// synchronous and idempotent.
pub struct CalendarManager {
    source: Arc<dyn CalendarSource>,
    events: Vec<EventRecord>,
    has_requested_access: bool,
    pending: Option<Receiver<Vec<EventRecord>>>,
}

impl CalendarManager {
    pub fn new(source: Arc<dyn CalendarSource>) -> Self {
        Self {
            source,
            events: Vec::new(),
            has_requested_access: false,
            pending: None,
        }
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn has_requested_access(&self) -> bool {
        self.has_requested_access
    }

    /// One-shot: the first call probes authorization and loads (samples on
    /// denial); later calls do nothing.
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
            let events = if source.request_access() {
                let loaded = source.events_today(now);
                if loaded.is_empty() {
                    sample_events(now)
                } else {
                    loaded
                }
            } else {
                log::info!("calendar: access denied, using samples");
                sample_events(now)
            };
            let _ = tx.send(events);
        });
    }

    /// Replaces the list from the source; an empty answer falls back to the
    /// sample set.
    pub fn load(&mut self) {
        let source = Arc::clone(&self.source);
        let (tx, rx) = mpsc::channel();
        self.pending = Some(rx);
        thread::spawn(move || {
            let now = Local::now();
            let loaded = source.events_today(now);
            let events = if loaded.is_empty() {
                sample_events(now)
            } else {
                loaded
            };
            let _ = tx.send(events);
        });
    }

    /// Drains a finished load, if any. Returns true when the list changed.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };
        let mut replaced = None;
        while let Ok(events) = rx.try_recv() {
            replaced = Some(events);
        }
        match replaced {
            Some(events) => {
                log::info!("calendar: loaded {} events", events.len());
                self.events = events;
                self.pending = None;
                true
            }
            None => false,
        }
    }

    /// Idempotent: removing an id that is not held is a no-op.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.events.len();
        self.events.retain(|event| event.id != id);
        self.events.len() != before
    }

    pub fn clear(&mut self) -> bool {
        if self.events.is_empty() {
            return false;
        }
        self.events.clear();
        true
    }
}
