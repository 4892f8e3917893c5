//! Alarm identifiers and the wake-up service seam.
//!
//! The external wake-up service knows nothing about reminders: it arms
//! named alarms and delivers fired names back. The name carries the
//! routing, so it is a tagged [`AlarmId`] constructed once at arm time
//! and parsed once at fire time -- never ad-hoc prefix matching.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved alarm name for the daily rollover.
pub const MIDNIGHT_RESET: &str = "midnightReset";
const SNOOZE_PREFIX: &str = "snooze-";
const CLEAR_NOTIF_PREFIX: &str = "clear-notif:";

/// Identity of an armed alarm. At most one alarm exists per id.
///
/// The wire format is stable -- hosts persist and deliver these as
/// plain strings:
///
/// - `<reminderId>` -- the reminder's own alarm
/// - `snooze-<reminderId>` -- deferred re-trigger
/// - `clear-notif:<notificationId>` -- auto-dismiss timer
/// - `midnightReset` -- daily rollover
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlarmId {
    Reminder(String),
    Snooze(String),
    ClearNotif(String),
    MidnightReset,
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmId::Reminder(id) => f.write_str(id),
            AlarmId::Snooze(id) => write!(f, "{SNOOZE_PREFIX}{id}"),
            AlarmId::ClearNotif(nid) => write!(f, "{CLEAR_NOTIF_PREFIX}{nid}"),
            AlarmId::MidnightReset => f.write_str(MIDNIGHT_RESET),
        }
    }
}

impl FromStr for AlarmId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == MIDNIGHT_RESET {
            AlarmId::MidnightReset
        } else if let Some(id) = s.strip_prefix(SNOOZE_PREFIX) {
            AlarmId::Snooze(id.to_string())
        } else if let Some(nid) = s.strip_prefix(CLEAR_NOTIF_PREFIX) {
            AlarmId::ClearNotif(nid.to_string())
        } else {
            AlarmId::Reminder(s.to_string())
        })
    }
}

impl From<String> for AlarmId {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(id) => id,
            Err(never) => match never {},
        }
    }
}

impl From<AlarmId> for String {
    fn from(id: AlarmId) -> Self {
        id.to_string()
    }
}

/// When an alarm fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AlarmPolicy {
    /// Repeats every `every_minutes`, first fire after
    /// `initial_delay_minutes`. The wake-up service re-fires on its own.
    #[serde(rename_all = "camelCase")]
    Periodic {
        every_minutes: u32,
        initial_delay_minutes: u32,
    },
    /// Fires once at an absolute instant.
    #[serde(rename_all = "camelCase")]
    At { fire_at: DateTime<Utc> },
}

/// The sole bridge to the external wake-up service. No business logic:
/// hosts translate these calls into whatever timer primitive they have
/// and deliver fired [`AlarmId`]s back to the scheduler.
pub trait WakeUpService {
    /// Arm `id` under `policy`, replacing any existing alarm under `id`.
    fn arm(&mut self, id: &AlarmId, policy: AlarmPolicy);

    /// Cancel `id`. Idempotent: a no-op if absent.
    fn cancel(&mut self, id: &AlarmId);
}

/// Clear-then-set wrapper over a [`WakeUpService`].
///
/// Every arm goes through an explicit cancel first, so from the
/// caller's perspective there is never a window with two alarms under
/// one id.
#[derive(Debug)]
pub struct AlarmRegistry<S: WakeUpService> {
    service: S,
}

impl<S: WakeUpService> AlarmRegistry<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn arm(&mut self, id: &AlarmId, policy: AlarmPolicy) {
        self.service.cancel(id);
        self.service.arm(id, policy);
    }

    pub fn cancel(&mut self, id: &AlarmId) {
        self.service.cancel(id);
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }
}

/// In-memory wake-up service for tests and dry-run simulation.
///
/// Records the armed set; fires are driven by the caller handing
/// [`AlarmId`]s straight to the scheduler.
#[derive(Debug, Default)]
pub struct SimulatedWakeUpService {
    armed: BTreeMap<AlarmId, AlarmPolicy>,
}

impl SimulatedWakeUpService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    pub fn is_armed(&self, id: &AlarmId) -> bool {
        self.armed.contains_key(id)
    }

    pub fn policy(&self, id: &AlarmId) -> Option<&AlarmPolicy> {
        self.armed.get(id)
    }

    pub fn armed(&self) -> impl Iterator<Item = (&AlarmId, &AlarmPolicy)> {
        self.armed.iter()
    }
}

impl WakeUpService for SimulatedWakeUpService {
    fn arm(&mut self, id: &AlarmId, policy: AlarmPolicy) {
        self.armed.insert(id.clone(), policy);
    }

    fn cancel(&mut self, id: &AlarmId) {
        self.armed.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alarm_id_round_trips_wire_format() {
        let cases = [
            (AlarmId::Reminder("water".into()), "water"),
            (AlarmId::Snooze("water".into()), "snooze-water"),
            (
                AlarmId::ClearNotif("ids:water:17000".into()),
                "clear-notif:ids:water:17000",
            ),
            (AlarmId::MidnightReset, "midnightReset"),
        ];
        for (id, wire) in cases {
            assert_eq!(id.to_string(), wire);
            assert_eq!(wire.parse::<AlarmId>().unwrap(), id);
        }
    }

    #[test]
    fn clear_notif_id_keeps_embedded_colons() {
        let parsed: AlarmId = "clear-notif:ids:a,b:123".parse().unwrap();
        assert_eq!(parsed, AlarmId::ClearNotif("ids:a,b:123".into()));
    }

    #[test]
    fn registry_replaces_instead_of_duplicating() {
        let mut registry = AlarmRegistry::new(SimulatedWakeUpService::new());
        let id = AlarmId::Reminder("water".into());
        for n in 1..=3 {
            registry.arm(
                &id,
                AlarmPolicy::Periodic {
                    every_minutes: n,
                    initial_delay_minutes: n,
                },
            );
        }
        assert_eq!(registry.service().armed_count(), 1);
        assert_eq!(
            registry.service().policy(&id),
            Some(&AlarmPolicy::Periodic {
                every_minutes: 3,
                initial_delay_minutes: 3
            })
        );
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut registry = AlarmRegistry::new(SimulatedWakeUpService::new());
        let id = AlarmId::Snooze("water".into());
        registry.cancel(&id);
        registry.cancel(&id);
        assert_eq!(registry.service().armed_count(), 0);
    }
}
