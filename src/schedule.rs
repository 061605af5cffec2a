//! Delayed work without timer callbacks: the shell polls `fire_due` every
//! frame and acts on what comes back. Every entry carries a generation so a
//! superseded task (or a stale fetch result tagged with one) can be dropped.

use std::time::{Duration, Instant};

/// Monotonic identity for scheduled tasks and issued media fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    CollapseAfterGrace,
    HideIndicator,
    MediaRequery,
    MediaPoll,
    BatteryRefresh,
    ClockTick,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    generation: Generation,
    due: Instant,
    kind: TaskKind,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    next: u64,
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next generation without scheduling anything. Media
    /// fetches are tagged with these so late results can be recognized.
    pub fn next_generation(&mut self) -> Generation {
        let generation = Generation(self.next);
        self.next += 1;
        generation
    }

    pub fn schedule(&mut self, kind: TaskKind, delay: Duration, now: Instant) -> Generation {
        let generation = self.next_generation();
        self.entries.push(Entry {
            generation,
            due: now + delay,
            kind,
        });
        generation
    }

    /// Drops the entry with this generation. Unknown generations are a no-op.
    pub fn cancel(&mut self, generation: Generation) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.generation != generation);
        self.entries.len() != before
    }

    /// Drops every pending entry of `kind`, returning how many were dropped.
    pub fn cancel_kind(&mut self, kind: TaskKind) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.kind != kind);
        before - self.entries.len()
    }

    pub fn is_pending(&self, kind: TaskKind) -> bool {
        self.entries.iter().any(|entry| entry.kind == kind)
    }

    /// Earliest pending deadline, for the shell's repaint scheduling.
    pub fn next_due(&self) -> Option<Instant> {
        self.entries.iter().map(|entry| entry.due).min()
    }

    /// Removes and returns every task due at `now`, in due order (scheduling
    /// order breaks ties).
    pub fn fire_due(&mut self, now: Instant) -> Vec<TaskKind> {
        let mut due: Vec<Entry> = Vec::new();
        self.entries.retain(|entry| {
            if entry.due <= now {
                due.push(*entry);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due.cmp(&b.due).then(a.generation.cmp(&b.generation)));
        due.into_iter().map(|entry| entry.kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduled_task_fires_once_due() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(TaskKind::HideIndicator, Duration::from_millis(100), now);

        assert!(scheduler.fire_due(now).is_empty());
        let fired = scheduler.fire_due(now + Duration::from_millis(100));
        assert_eq!(fired, vec![TaskKind::HideIndicator]);
    }

    #[test]
    fn fired_task_is_removed() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(TaskKind::ClockTick, Duration::ZERO, now);

        assert_eq!(scheduler.fire_due(now).len(), 1);
        assert!(scheduler.fire_due(now).is_empty());
    }

    #[test]
    fn cancelled_generation_never_fires() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        let generation =
            scheduler.schedule(TaskKind::CollapseAfterGrace, Duration::from_millis(10), now);

        assert!(scheduler.cancel(generation));
        assert!(scheduler.fire_due(now + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn cancel_unknown_generation_is_a_noop() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        let generation = scheduler.schedule(TaskKind::MediaPoll, Duration::ZERO, now);
        assert_eq!(scheduler.fire_due(now), vec![TaskKind::MediaPoll]);

        assert!(!scheduler.cancel(generation));
    }

    #[test]
    fn cancel_kind_drops_all_matching_entries() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(TaskKind::MediaRequery, Duration::from_millis(300), now);
        scheduler.schedule(TaskKind::MediaRequery, Duration::from_millis(500), now);
        scheduler.schedule(TaskKind::ClockTick, Duration::from_millis(1000), now);

        assert_eq!(scheduler.cancel_kind(TaskKind::MediaRequery), 2);
        assert!(!scheduler.is_pending(TaskKind::MediaRequery));
        assert!(scheduler.is_pending(TaskKind::ClockTick));
    }

    #[test]
    fn due_tasks_fire_in_due_order() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(TaskKind::ClockTick, Duration::from_millis(200), now);
        scheduler.schedule(TaskKind::HideIndicator, Duration::from_millis(100), now);

        let fired = scheduler.fire_due(now + Duration::from_millis(200));
        assert_eq!(fired, vec![TaskKind::HideIndicator, TaskKind::ClockTick]);
    }

    #[test]
    fn generations_strictly_increase() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.next_generation();
        let b = scheduler.next_generation();
        assert!(b > a);
    }

    #[test]
    fn next_due_reports_earliest_deadline() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        assert!(scheduler.next_due().is_none());

        scheduler.schedule(TaskKind::BatteryRefresh, Duration::from_secs(30), now);
        scheduler.schedule(TaskKind::ClockTick, Duration::from_secs(1), now);
        assert_eq!(scheduler.next_due(), Some(now + Duration::from_secs(1)));
    }
}
