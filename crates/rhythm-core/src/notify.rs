//! Notification surface seam and the notification id wire format.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved notification id for the end-of-focus notice.
pub const FOCUS_END_NOTIFICATION: &str = "focus-end";

const ID_PREFIX: &str = "ids:";

/// Buttons offered on a dispatched reminder notification, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationAction {
    /// "Log/Done": counts toward the daily stat.
    Acknowledge,
    /// "Snooze (5m)": deferred re-trigger.
    Snooze,
}

/// What the engine asks of the host's notification machinery.
/// Display only -- action clicks come back via the scheduler.
pub trait NotificationSurface {
    fn show(
        &mut self,
        notification_id: &str,
        title: &str,
        body: &str,
        actions: &[NotificationAction],
    );

    /// Idempotent: clearing an already-gone notification is a no-op.
    fn clear(&mut self, notification_id: &str);
}

/// Identity of a dispatched notification.
///
/// Wire format `ids:<comma-separated reminder ids>:<creation-epoch-millis>` --
/// the id list must survive the round trip so action clicks can be routed
/// back to the right reminders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationId {
    pub ids: Vec<String>,
    pub created_ms: i64,
}

impl NotificationId {
    pub fn new(ids: Vec<String>, now: DateTime<Utc>) -> Self {
        Self {
            ids,
            created_ms: now.timestamp_millis(),
        }
    }

    /// Parse the wire format back. `None` for foreign notification ids
    /// (e.g. the focus-end notice), which carry no reminder list.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix(ID_PREFIX)?;
        let (csv, millis) = rest.rsplit_once(':')?;
        let created_ms = millis.parse().ok()?;
        let ids: Vec<String> = csv
            .split(',')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if ids.is_empty() {
            return None;
        }
        Some(Self { ids, created_ms })
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ID_PREFIX}{}:{}", self.ids.join(","), self.created_ms)
    }
}

/// Title and body for a batch of reminder ids.
pub fn compose(ids: &[String]) -> (String, String) {
    if ids.len() > 1 {
        let body = ids
            .iter()
            .map(|id| format!("\u{2022} {id}"))
            .collect::<Vec<_>>()
            .join("\n");
        ("Rhythm: Multiple Reminders".to_string(), body)
    } else {
        let id = ids.first().map(String::as_str).unwrap_or_default();
        (
            format!("Rhythm: {id}"),
            format!("It's time for your {id} reminder."),
        )
    }
}

/// Surface double that records every call, for tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub shown: Vec<(String, String, String, Vec<NotificationAction>)>,
    pub cleared: Vec<String>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationSurface for RecordingSurface {
    fn show(
        &mut self,
        notification_id: &str,
        title: &str,
        body: &str,
        actions: &[NotificationAction],
    ) {
        self.shown.push((
            notification_id.to_string(),
            title.to_string(),
            body.to_string(),
            actions.to_vec(),
        ));
    }

    fn clear(&mut self, notification_id: &str) {
        self.cleared.push(notification_id.to_string());
    }
}
