//! Process-local watch for the end of a suppression window.
//!
//! Advisory only: losing this timer never affects scheduling, just the
//! one-time "focus ended" notice. Same polled-deadline shape as the
//! coalescer -- the host sleeps until [`deadline`](FocusWindowWatch::deadline)
//! and then calls [`poll`](FocusWindowWatch::poll).

use chrono::{DateTime, Utc};

/// Holds at most one pending end-of-focus deadline. Not persisted.
#[derive(Debug, Default)]
pub struct FocusWindowWatch {
    deadline: Option<DateTime<Utc>>,
}

impl FocusWindowWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the watched instant. Clearing the window or setting one
    /// already in the past drops any pending notice.
    pub fn update(&mut self, focus_until: Option<DateTime<Utc>>, now: DateTime<Utc>) {
        self.deadline = focus_until.filter(|until| *until > now);
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// True exactly once, when the window has just elapsed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(until) if now >= until => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fires_once_when_window_elapses() {
        let now = Utc::now();
        let mut watch = FocusWindowWatch::new();
        watch.update(Some(now + Duration::minutes(25)), now);

        assert!(!watch.poll(now + Duration::minutes(24)));
        assert!(watch.poll(now + Duration::minutes(25)));
        assert!(!watch.poll(now + Duration::minutes(26)));
        assert_eq!(watch.deadline(), None);
    }

    #[test]
    fn replacing_the_window_cancels_the_old_deadline() {
        let now = Utc::now();
        let mut watch = FocusWindowWatch::new();
        watch.update(Some(now + Duration::minutes(10)), now);
        watch.update(Some(now + Duration::minutes(30)), now);

        assert!(!watch.poll(now + Duration::minutes(10)));
        assert!(watch.poll(now + Duration::minutes(30)));
    }

    #[test]
    fn past_or_absent_windows_are_ignored() {
        let now = Utc::now();
        let mut watch = FocusWindowWatch::new();
        watch.update(Some(now - Duration::seconds(1)), now);
        assert_eq!(watch.deadline(), None);

        watch.update(Some(now + Duration::minutes(5)), now);
        watch.update(None, now);
        assert!(!watch.poll(now + Duration::minutes(5)));
    }
}
