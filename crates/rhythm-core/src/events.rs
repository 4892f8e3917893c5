use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Why a reminder trigger was suppressed instead of surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuppressReason {
    /// A focus window is active (`now < focus_until`).
    FocusMode,
    /// The global master toggle is off.
    MasterToggle,
}

/// Every observable state change in the engine produces an event.
/// Hosts render or log them; tests assert on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    /// A reminder now has exactly one armed alarm.
    ReminderArmed {
        id: String,
        /// Next scheduled fire, when known (one-shot kinds).
        fire_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
    /// A reminder's alarms (including any pending snooze) were cancelled.
    ReminderDisarmed {
        id: String,
        at: DateTime<Utc>,
    },
    /// A trigger arrived but was not surfaced.
    ReminderSuppressed {
        id: String,
        reason: SuppressReason,
        at: DateTime<Utc>,
    },
    /// A reminder id entered the coalescing buffer.
    NotificationQueued {
        id: String,
        dispatch_due: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// The coalescer flushed one user-facing notification.
    NotificationDispatched {
        notification_id: String,
        ids: Vec<String>,
        at: DateTime<Utc>,
    },
    /// A displayed notification was cleared (auto-dismiss or user action).
    NotificationCleared {
        notification_id: String,
        at: DateTime<Utc>,
    },
    /// The user logged a reminder as done.
    ReminderAcknowledged {
        id: String,
        today_count: u32,
        at: DateTime<Utc>,
    },
    /// A deferred re-trigger was armed.
    ReminderSnoozed {
        id: String,
        fire_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// Daily counters were zeroed.
    MidnightRollover {
        reset_date: NaiveDate,
        at: DateTime<Utc>,
    },
    /// The suppression window elapsed (advisory notice).
    FocusEnded {
        at: DateTime<Utc>,
    },
}
