//! # Rhythm Core Library
//!
//! Persistent, crash-tolerant reminder scheduling and notification
//! engine. Given a set of recurring reminders (periodic or fixed daily
//! time) it keeps exactly the correct set of future wake-ups armed,
//! survives process restarts without losing or duplicating alarms,
//! coalesces simultaneous triggers into one notification, honors a
//! temporary suppression window ("focus mode") and a global enable
//! toggle, and rolls daily counters over at local midnight.
//!
//! ## Architecture
//!
//! The engine is a state machine over wall-clock time driven by a
//! single dispatch loop. Three collaborators are trait seams supplied
//! by the host:
//!
//! - [`StateStore`]: whole-document load/save of the persisted state
//! - [`WakeUpService`]: arms named alarms, delivers fired [`AlarmId`]s
//! - [`NotificationSurface`]: displays and clears notifications
//!
//! Every time-dependent entry point takes an explicit `now`, so the
//! whole engine is deterministic under test.
//!
//! ## Key Components
//!
//! - [`ReminderScheduler`]: reminder lifecycle, suppression, rollover
//! - [`NotificationCoalescer`]: debounce buffer for trigger bursts
//! - [`FocusWindowWatch`]: advisory end-of-focus notice
//! - [`time_calc`]: next-occurrence math for fixed-time reminders

pub mod alarm;
pub mod coalescer;
pub mod error;
pub mod events;
pub mod focus_watch;
pub mod notify;
pub mod scheduler;
pub mod store;
pub mod time_calc;

pub use alarm::{AlarmId, AlarmPolicy, AlarmRegistry, SimulatedWakeUpService, WakeUpService};
pub use coalescer::NotificationCoalescer;
pub use error::{EngineError, Result};
pub use events::{EngineEvent, SuppressReason};
pub use focus_watch::FocusWindowWatch;
pub use notify::{NotificationAction, NotificationId, NotificationSurface, RecordingSurface};
pub use scheduler::ReminderScheduler;
pub use store::{
    DailyStat, JsonFileStore, MemoryStore, ReminderDefinition, ReminderKind, Settings,
    StateDocument, StateStore,
};
