//! Foreground engine host: one dispatch loop over a tokio channel.
//!
//! Armed alarms become sleeping tasks that send their [`AlarmId`] back
//! on the channel; the loop is the single consumer, so every scheduler
//! operation runs to completion before the next one starts.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use rhythm_core::{
    AlarmId, AlarmPolicy, NotificationAction, NotificationSurface, ReminderScheduler,
    WakeUpService,
};

use crate::common::{open_store, CliResult};

/// Wake-up service backed by tokio timers.
struct TokioWakeUpService {
    tx: mpsc::UnboundedSender<AlarmId>,
    tasks: HashMap<AlarmId, JoinHandle<()>>,
}

impl TokioWakeUpService {
    fn new(tx: mpsc::UnboundedSender<AlarmId>) -> Self {
        Self {
            tx,
            tasks: HashMap::new(),
        }
    }
}

impl WakeUpService for TokioWakeUpService {
    fn arm(&mut self, id: &AlarmId, policy: AlarmPolicy) {
        self.cancel(id);
        let tx = self.tx.clone();
        let fired_id = id.clone();
        let handle = tokio::spawn(async move {
            match policy {
                AlarmPolicy::At { fire_at } => {
                    sleep_until(fire_at).await;
                    let _ = tx.send(fired_id);
                }
                AlarmPolicy::Periodic {
                    every_minutes,
                    initial_delay_minutes,
                } => {
                    tokio::time::sleep(minutes(initial_delay_minutes)).await;
                    loop {
                        if tx.send(fired_id.clone()).is_err() {
                            return;
                        }
                        tokio::time::sleep(minutes(every_minutes)).await;
                    }
                }
            }
        });
        self.tasks.insert(id.clone(), handle);
    }

    fn cancel(&mut self, id: &AlarmId) {
        if let Some(handle) = self.tasks.remove(id) {
            handle.abort();
        }
    }
}

fn minutes(n: u32) -> Duration {
    Duration::from_secs(u64::from(n) * 60)
}

async fn sleep_until(fire_at: DateTime<Utc>) {
    let delta = (fire_at - Utc::now()).to_std().unwrap_or_default();
    tokio::time::sleep(delta).await;
}

/// Prints notifications to the terminal.
struct ConsoleSurface;

impl NotificationSurface for ConsoleSurface {
    fn show(
        &mut self,
        notification_id: &str,
        title: &str,
        body: &str,
        actions: &[NotificationAction],
    ) {
        println!("\n=== {title} ===");
        for line in body.lines() {
            println!("  {line}");
        }
        if !actions.is_empty() {
            println!("  (ack with: rhythm stats ack <id>)");
        }
        debug!(notification_id, "notification shown");
    }

    fn clear(&mut self, notification_id: &str) {
        debug!(notification_id, "notification cleared");
    }
}

pub fn run() -> CliResult {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_loop())
}

async fn run_loop() -> CliResult {
    let store = open_store()?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut engine = ReminderScheduler::new(store, TokioWakeUpService::new(tx), ConsoleSurface);

    for event in engine.initialize(Utc::now())? {
        debug!(?event, "engine event");
    }
    println!("rhythm engine running (ctrl-c to stop)");

    loop {
        let now = Utc::now();
        for event in engine.flush_notifications(now)? {
            debug!(?event, "engine event");
        }
        if let Some(event) = engine.poll_focus(now) {
            debug!(?event, "engine event");
        }
        // Focus windows are written by `rhythm focus` in another
        // process, so re-read the store on every wake.
        engine.refresh_focus(now)?;

        let idle = engine
            .next_deadline()
            .map(|d| (d - Utc::now()).to_std().unwrap_or_default())
            .unwrap_or(Duration::from_secs(60));

        tokio::select! {
            fired = rx.recv() => match fired {
                Some(id) => {
                    for event in engine.handle_alarm(&id, Utc::now())? {
                        debug!(?event, "engine event");
                    }
                }
                None => break,
            },
            _ = tokio::time::sleep(idle) => {}
            _ = tokio::signal::ctrl_c() => {
                println!("\nshutting down");
                break;
            }
        }
    }
    Ok(())
}
