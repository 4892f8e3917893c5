//! Debounce buffer that merges same-window triggers into one dispatch.
//!
//! Caller-driven, like the timer primitives elsewhere in this crate: the
//! host arms a real timer for [`deadline`](NotificationCoalescer::deadline)
//! and calls [`poll`](NotificationCoalescer::poll) when it elapses. No
//! internal thread, no globals.

use chrono::{DateTime, Duration, Utc};

/// Fixed debounce window in milliseconds.
pub const DEBOUNCE_WINDOW_MS: i64 = 1_000;

/// Buffers trigger events and flushes them as one deduplicated,
/// first-seen-ordered batch once the window closes.
///
/// Invariant: at most one pending deadline; every enqueue resets it.
#[derive(Debug, Default)]
pub struct NotificationCoalescer {
    pending: Vec<String>,
    deadline: Option<DateTime<Utc>>,
}

impl NotificationCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reminder id to the pending batch (duplicates collapse) and
    /// restart the debounce window. Returns the new deadline.
    pub fn enqueue(&mut self, id: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        if !self.pending.iter().any(|p| p == id) {
            self.pending.push(id.to_string());
        }
        let deadline = now + Duration::milliseconds(DEBOUNCE_WINDOW_MS);
        self.deadline = Some(deadline);
        deadline
    }

    /// The instant the pending batch becomes due, if any.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Flush the batch if its window has closed. Swap-and-clear: the
    /// returned ids are no longer held, and the deadline is gone.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<Vec<String>> {
        match self.deadline {
            Some(due) if now >= due => {
                self.deadline = None;
                let ids = std::mem::take(&mut self.pending);
                if ids.is_empty() {
                    None
                } else {
                    Some(ids)
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn burst_yields_one_deduplicated_batch() {
        let mut c = NotificationCoalescer::new();
        let t0 = now();
        for id in ["water", "posture", "water", "eye"] {
            c.enqueue(id, t0);
        }
        // Still inside the window: nothing flushes.
        assert_eq!(c.poll(t0 + Duration::milliseconds(500)), None);

        let batch = c.poll(t0 + Duration::milliseconds(DEBOUNCE_WINDOW_MS));
        assert_eq!(batch, Some(vec!["water".into(), "posture".into(), "eye".into()]));

        // A second poll is a no-op.
        assert_eq!(c.poll(t0 + Duration::seconds(10)), None);
        assert!(c.is_empty());
    }

    #[test]
    fn every_enqueue_resets_the_window() {
        let mut c = NotificationCoalescer::new();
        let t0 = now();
        c.enqueue("water", t0);
        let pushed = c.enqueue("posture", t0 + Duration::milliseconds(800));
        assert_eq!(pushed, t0 + Duration::milliseconds(1_800));

        // The original deadline has passed but the window was pushed out.
        assert_eq!(c.poll(t0 + Duration::milliseconds(1_000)), None);
        assert!(c.poll(pushed).is_some());
    }

    #[test]
    fn empty_poll_returns_none() {
        let mut c = NotificationCoalescer::new();
        assert_eq!(c.poll(now()), None);
        assert_eq!(c.deadline(), None);
    }
}
