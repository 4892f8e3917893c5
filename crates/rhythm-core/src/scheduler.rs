//! Reminder lifecycle orchestration.
//!
//! The scheduler is the single consumer of external events: wake-up
//! fires, definition edits, notification action clicks. Every operation
//! is a short, non-overlapping reaction -- load the document, apply
//! policy, re-arm, save -- so ordering per reminder id follows from the
//! host running one dispatch loop. There is no internal thread.
//!
//! Alarms are always rebuilt by cancel-then-create, never patched: that
//! is the only way to hold the "at most one armed alarm per id"
//! invariant across edits and restarts. The external wake-up service is
//! not trusted to keep alarms across process restarts;
//! [`recreate_all`](ReminderScheduler::recreate_all) rebuilds the full
//! armed set from the persisted document on every boot.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Local, Utc};
use tracing::{debug, info, warn};

use crate::alarm::{AlarmId, AlarmPolicy, AlarmRegistry, WakeUpService};
use crate::coalescer::NotificationCoalescer;
use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, SuppressReason};
use crate::focus_watch::FocusWindowWatch;
use crate::notify::{
    compose, NotificationAction, NotificationId, NotificationSurface, FOCUS_END_NOTIFICATION,
};
use crate::store::{ReminderDefinition, ReminderKind, StateDocument, StateStore, SCHEMA_VERSION};
use crate::time_calc::{next_fixed_time, next_midnight, parse_time_of_day};

/// Deferred re-trigger delay.
pub const SNOOZE_DELAY_MINUTES: i64 = 5;
/// How long a dispatched notification stays up before auto-dismiss.
pub const AUTO_DISMISS_MINUTES: i64 = 5;

/// The reminder engine. Generic over its three collaborators: the
/// whole-document state store, the external wake-up service, and the
/// notification surface.
pub struct ReminderScheduler<S, W, N>
where
    S: StateStore,
    W: WakeUpService,
    N: NotificationSurface,
{
    store: S,
    alarms: AlarmRegistry<W>,
    surface: N,
    coalescer: NotificationCoalescer,
    focus_watch: FocusWindowWatch,
}

impl<S, W, N> ReminderScheduler<S, W, N>
where
    S: StateStore,
    W: WakeUpService,
    N: NotificationSurface,
{
    pub fn new(store: S, service: W, surface: N) -> Self {
        Self {
            store,
            alarms: AlarmRegistry::new(service),
            surface,
            coalescer: NotificationCoalescer::new(),
            focus_watch: FocusWindowWatch::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn wake_service(&self) -> &W {
        self.alarms.service()
    }

    pub fn surface(&self) -> &N {
        &self.surface
    }

    /// Earliest instant the host should call back into
    /// [`flush_notifications`](Self::flush_notifications) or
    /// [`poll_focus`](Self::poll_focus).
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        match (self.coalescer.deadline(), self.focus_watch.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Boot entry point: seed the store on first run (or schema bump),
    /// rebuild every armed alarm, arm the midnight rollover, and pick up
    /// a persisted focus window.
    pub fn initialize(&mut self, now: DateTime<Utc>) -> Result<Vec<EngineEvent>> {
        let doc = match self.store.load()? {
            Some(doc) if doc.schema_version == SCHEMA_VERSION => doc,
            _ => {
                let doc = StateDocument::seeded();
                self.store.save(&doc)?;
                info!("state store seeded with default schema");
                doc
            }
        };
        self.focus_watch.update(doc.settings.focus_until, now);

        let events = self.recreate_all(now)?;
        self.arm_midnight(now);
        info!("reminder engine initialized");
        Ok(events)
    }

    /// Create or update a reminder definition and fully re-derive its
    /// armed alarm. `trigger_now` additionally queues an immediate
    /// notification without waiting for the alarm.
    pub fn upsert(
        &mut self,
        def: ReminderDefinition,
        trigger_now: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<EngineEvent>> {
        def.validate()?;

        let mut doc = self.load_doc()?;
        doc.reminders.insert(def.id.clone(), def.clone());
        // Every known reminder id has a stats entry.
        doc.stat_mut(&def.id);
        self.store.save(&doc)?;

        let mut events = Vec::new();
        if !def.enabled {
            self.cancel_reminder_alarms(&def.id);
            events.push(EngineEvent::ReminderDisarmed {
                id: def.id.clone(),
                at: now,
            });
            info!(id = %def.id, "reminder disabled");
            return Ok(events);
        }

        self.arm_reminder(&def, now, &mut events);
        if trigger_now {
            let due = self.coalescer.enqueue(&def.id, now);
            events.push(EngineEvent::NotificationQueued {
                id: def.id.clone(),
                dispatch_due: due,
                at: now,
            });
        }
        info!(id = %def.id, trigger_now, "reminder created/updated");
        Ok(events)
    }

    /// Rebuild the armed alarm for every enabled reminder from the
    /// persisted document. One bad definition is logged and skipped,
    /// never allowed to abort the pass.
    pub fn recreate_all(&mut self, now: DateTime<Utc>) -> Result<Vec<EngineEvent>> {
        let doc = self.load_doc()?;
        let mut events = Vec::new();
        for def in doc.reminders.values() {
            if !def.enabled {
                self.cancel_reminder_alarms(&def.id);
                continue;
            }
            if let Err(e) = def.validate() {
                warn!(id = %def.id, error = %e, "skipping reminder during reconciliation");
                continue;
            }
            self.arm_reminder(def, now, &mut events);
        }
        Ok(events)
    }

    /// Handle a fired alarm from the wake-up service.
    pub fn handle_alarm(&mut self, id: &AlarmId, now: DateTime<Utc>) -> Result<Vec<EngineEvent>> {
        debug!(alarm = %id, "alarm fired");
        let mut events = Vec::new();
        match id {
            AlarmId::MidnightReset => {
                events.extend(self.midnight_rollover(now)?);
            }
            AlarmId::ClearNotif(notif_id) => {
                self.surface.clear(notif_id);
                self.alarms.cancel(id);
                events.push(EngineEvent::NotificationCleared {
                    notification_id: notif_id.clone(),
                    at: now,
                });
            }
            // Snooze is an explicit user action: it bypasses the
            // suppression checks on purpose. The one-shot has fired,
            // so drop it from the armed set.
            AlarmId::Snooze(rid) => {
                self.alarms.cancel(id);
                let due = self.coalescer.enqueue(rid, now);
                events.push(EngineEvent::NotificationQueued {
                    id: rid.clone(),
                    dispatch_due: due,
                    at: now,
                });
            }
            AlarmId::Reminder(rid) => {
                events.extend(self.handle_reminder_fire(rid, now)?);
            }
        }
        Ok(events)
    }

    fn handle_reminder_fire(&mut self, rid: &str, now: DateTime<Utc>) -> Result<Vec<EngineEvent>> {
        let mut events = Vec::new();
        let doc = self.load_doc()?;
        let Some(def) = doc.reminders.get(rid) else {
            // Stale fire: the definition was deleted between arming and
            // firing. Tolerated, not an error.
            debug!(id = %rid, "alarm fired for unknown reminder, ignoring");
            return Ok(events);
        };
        if !def.enabled {
            debug!(id = %rid, "alarm fired for disabled reminder, ignoring");
            return Ok(events);
        }

        let suppressed = if doc
            .settings
            .focus_until
            .is_some_and(|until| now < until)
        {
            Some(SuppressReason::FocusMode)
        } else if !doc.settings.master_enabled {
            Some(SuppressReason::MasterToggle)
        } else {
            None
        };

        match suppressed {
            Some(reason) => {
                info!(id = %rid, ?reason, "reminder suppressed");
                events.push(EngineEvent::ReminderSuppressed {
                    id: rid.to_string(),
                    reason,
                    at: now,
                });
            }
            None => {
                let due = self.coalescer.enqueue(rid, now);
                events.push(EngineEvent::NotificationQueued {
                    id: rid.to_string(),
                    dispatch_due: due,
                    at: now,
                });
            }
        }

        // Periodic alarms re-fire on their own; a fixed-time alarm was
        // one-shot and must be re-armed for the next occurrence, even
        // when this fire was suppressed.
        if let ReminderKind::FixedTime {
            time_of_day,
            workdays,
        } = &def.kind
        {
            self.arm_fixed(rid, time_of_day, workdays, now, &mut events);
        }
        Ok(events)
    }

    /// Drain the coalescer if its debounce window has closed, emitting
    /// at most one user-facing notification for the whole batch.
    pub fn flush_notifications(&mut self, now: DateTime<Utc>) -> Result<Vec<EngineEvent>> {
        let Some(ids) = self.coalescer.poll(now) else {
            return Ok(Vec::new());
        };
        let doc = self.load_doc()?;
        let known: Vec<String> = ids
            .into_iter()
            .filter(|id| doc.reminders.contains_key(id))
            .collect();
        if known.is_empty() {
            return Ok(Vec::new());
        }

        let nid = NotificationId::new(known.clone(), now).to_string();
        let (title, body) = compose(&known);
        self.surface.show(
            &nid,
            &title,
            &body,
            &[NotificationAction::Acknowledge, NotificationAction::Snooze],
        );
        self.alarms.arm(
            &AlarmId::ClearNotif(nid.clone()),
            AlarmPolicy::At {
                fire_at: now + Duration::minutes(AUTO_DISMISS_MINUTES),
            },
        );
        info!(notification_id = %nid, "notification dispatched");
        Ok(vec![EngineEvent::NotificationDispatched {
            notification_id: nid,
            ids: known,
            at: now,
        }])
    }

    /// Handle a button click on a dispatched notification.
    pub fn handle_action(
        &mut self,
        notification_id: &str,
        action: NotificationAction,
        now: DateTime<Utc>,
    ) -> Result<Vec<EngineEvent>> {
        // The user acted, so the auto-dismiss timer is moot either way.
        self.alarms
            .cancel(&AlarmId::ClearNotif(notification_id.to_string()));

        let Some(nid) = NotificationId::parse(notification_id) else {
            return Ok(Vec::new());
        };
        let mut events = Vec::new();
        match action {
            NotificationAction::Acknowledge => {
                let mut doc = self.load_doc()?;
                for id in &nid.ids {
                    if let Some(stat) = doc.stats.get_mut(id) {
                        stat.today_count += 1;
                        events.push(EngineEvent::ReminderAcknowledged {
                            id: id.clone(),
                            today_count: stat.today_count,
                            at: now,
                        });
                    }
                }
                self.store.save(&doc)?;
                info!(ids = ?nid.ids, "reminders acknowledged");
            }
            NotificationAction::Snooze => {
                for id in &nid.ids {
                    events.extend(self.snooze(id, now));
                }
            }
        }
        self.surface.clear(notification_id);
        events.push(EngineEvent::NotificationCleared {
            notification_id: notification_id.to_string(),
            at: now,
        });
        Ok(events)
    }

    /// Arm a deferred re-trigger for a single reminder.
    pub fn snooze(&mut self, rid: &str, now: DateTime<Utc>) -> Vec<EngineEvent> {
        let fire_at = now + Duration::minutes(SNOOZE_DELAY_MINUTES);
        self.alarms
            .arm(&AlarmId::Snooze(rid.to_string()), AlarmPolicy::At { fire_at });
        info!(id = %rid, "reminder snoozed");
        vec![EngineEvent::ReminderSnoozed {
            id: rid.to_string(),
            fire_at,
            at: now,
        }]
    }

    // ── Settings ─────────────────────────────────────────────────────

    /// Set or clear the suppression window and re-arm the end-of-focus
    /// watch.
    pub fn set_focus_until(
        &mut self,
        focus_until: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut doc = self.load_doc()?;
        doc.settings.focus_until = focus_until;
        self.store.save(&doc)?;
        self.focus_watch.update(focus_until, now);
        Ok(())
    }

    /// Re-read the persisted suppression window and re-arm the
    /// end-of-focus watch. Hosts call this on every wake so windows
    /// written by another process are picked up; windows already in the
    /// past arm nothing.
    pub fn refresh_focus(&mut self, now: DateTime<Utc>) -> Result<()> {
        let doc = self.load_doc()?;
        self.focus_watch.update(doc.settings.focus_until, now);
        Ok(())
    }

    /// Flip the global enable toggle.
    ///
    /// No re-arm pass follows: armed alarms stay in place and keep
    /// firing either way, and the toggle is applied at fire time, so
    /// flipping it back on needs no reconciliation.
    pub fn set_master_enabled(&mut self, enabled: bool) -> Result<()> {
        let mut doc = self.load_doc()?;
        doc.settings.master_enabled = enabled;
        self.store.save(&doc)?;
        Ok(())
    }

    /// Emit the one-time end-of-focus notice if the window just elapsed.
    /// Goes straight to the surface, not through the coalescer.
    pub fn poll_focus(&mut self, now: DateTime<Utc>) -> Option<EngineEvent> {
        if !self.focus_watch.poll(now) {
            return None;
        }
        self.surface.show(
            FOCUS_END_NOTIFICATION,
            "Focus Mode Ended",
            "Your focus session has completed. Reminders will now resume.",
            &[],
        );
        Some(EngineEvent::FocusEnded { at: now })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn load_doc(&self) -> Result<StateDocument> {
        self.store.load()?.ok_or(EngineError::StoreEmpty)
    }

    /// Guard-cancel both of a reminder's alarm identities.
    fn cancel_reminder_alarms(&mut self, rid: &str) {
        self.alarms.cancel(&AlarmId::Reminder(rid.to_string()));
        self.alarms.cancel(&AlarmId::Snooze(rid.to_string()));
    }

    fn arm_reminder(
        &mut self,
        def: &ReminderDefinition,
        now: DateTime<Utc>,
        events: &mut Vec<EngineEvent>,
    ) {
        self.cancel_reminder_alarms(&def.id);
        match &def.kind {
            ReminderKind::Interval { interval_minutes } => {
                self.alarms.arm(
                    &AlarmId::Reminder(def.id.clone()),
                    AlarmPolicy::Periodic {
                        every_minutes: *interval_minutes,
                        initial_delay_minutes: *interval_minutes,
                    },
                );
                events.push(EngineEvent::ReminderArmed {
                    id: def.id.clone(),
                    fire_at: None,
                    at: now,
                });
            }
            ReminderKind::FixedTime {
                time_of_day,
                workdays,
            } => {
                self.arm_fixed(&def.id, time_of_day, workdays, now, events);
            }
        }
    }

    fn arm_fixed(
        &mut self,
        rid: &str,
        time_of_day: &str,
        workdays: &BTreeSet<u8>,
        now: DateTime<Utc>,
        events: &mut Vec<EngineEvent>,
    ) {
        let Some(tod) = parse_time_of_day(time_of_day) else {
            warn!(id = %rid, time_of_day, "unparsable timeOfDay, not arming");
            return;
        };
        match next_fixed_time(tod, workdays, now.with_timezone(&Local)) {
            Some(next) => {
                let fire_at = next.with_timezone(&Utc);
                self.alarms.arm(
                    &AlarmId::Reminder(rid.to_string()),
                    AlarmPolicy::At { fire_at },
                );
                events.push(EngineEvent::ReminderArmed {
                    id: rid.to_string(),
                    fire_at: Some(fire_at),
                    at: now,
                });
            }
            None => {
                warn!(id = %rid, "workdays never match a weekday, reminder will not fire");
            }
        }
    }

    /// Zero every daily counter, stamp the reset date as observed now,
    /// persist as one write, and re-arm for the following midnight.
    /// Fired late after a sleep this still resets to "today"; missed
    /// midnights are not replayed.
    fn midnight_rollover(&mut self, now: DateTime<Utc>) -> Result<Vec<EngineEvent>> {
        let mut doc = self.load_doc()?;
        let reset_date = now.with_timezone(&Local).date_naive();
        for stat in doc.stats.values_mut() {
            stat.today_count = 0;
            stat.last_reset_date = Some(reset_date);
        }
        self.store.save(&doc)?;
        self.arm_midnight(now);
        info!(%reset_date, "midnight reset performed");
        Ok(vec![EngineEvent::MidnightRollover {
            reset_date,
            at: now,
        }])
    }

    fn arm_midnight(&mut self, now: DateTime<Utc>) {
        let fire_at = next_midnight(now.with_timezone(&Local)).with_timezone(&Utc);
        self.alarms
            .arm(&AlarmId::MidnightReset, AlarmPolicy::At { fire_at });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::SimulatedWakeUpService;
    use crate::notify::RecordingSurface;
    use crate::store::MemoryStore;

    type TestScheduler = ReminderScheduler<MemoryStore, SimulatedWakeUpService, RecordingSurface>;

    fn scheduler() -> TestScheduler {
        ReminderScheduler::new(
            MemoryStore::with_document(StateDocument::seeded()),
            SimulatedWakeUpService::new(),
            RecordingSurface::new(),
        )
    }

    #[test]
    fn disabling_cancels_pending_snooze() {
        let mut s = scheduler();
        let now = Utc::now();

        let mut water = ReminderDefinition::interval("water", 15);
        water.enabled = true;
        s.upsert(water.clone(), false, now).unwrap();
        s.snooze("water", now);
        assert!(s
            .wake_service()
            .is_armed(&AlarmId::Snooze("water".into())));

        water.enabled = false;
        s.upsert(water, false, now).unwrap();
        assert_eq!(s.wake_service().armed_count(), 0);
    }

    #[test]
    fn malformed_upsert_leaves_armed_state_untouched() {
        let mut s = scheduler();
        let now = Utc::now();

        let mut water = ReminderDefinition::interval("water", 15);
        water.enabled = true;
        s.upsert(water, false, now).unwrap();

        let mut bad = ReminderDefinition::interval("water", 0);
        bad.enabled = true;
        assert!(matches!(
            s.upsert(bad, false, now),
            Err(EngineError::InvalidDefinition { .. })
        ));
        assert!(s
            .wake_service()
            .is_armed(&AlarmId::Reminder("water".into())));
        // The stored definition is also unchanged.
        let doc = s.store().document().unwrap();
        assert_eq!(
            doc.reminders["water"].kind,
            ReminderKind::Interval {
                interval_minutes: 15
            }
        );
    }

    #[test]
    fn stale_fire_is_ignored() {
        let mut s = scheduler();
        let now = Utc::now();
        // "water" exists but is disabled; "ghost" does not exist.
        let events = s
            .handle_alarm(&AlarmId::Reminder("water".into()), now)
            .unwrap();
        assert!(events.is_empty());
        let events = s
            .handle_alarm(&AlarmId::Reminder("ghost".into()), now)
            .unwrap();
        assert!(events.is_empty());
        assert!(s.next_deadline().is_none());
    }

    #[test]
    fn store_outage_aborts_operation() {
        let mut s = scheduler();
        let now = Utc::now();
        s.store().set_failing(true);

        let mut water = ReminderDefinition::interval("water", 15);
        water.enabled = true;
        assert!(s.upsert(water, false, now).is_err());
        assert_eq!(s.wake_service().armed_count(), 0);
    }
}
