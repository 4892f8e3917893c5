use clap::Subcommand;
use rhythm_core::{ReminderKind, StateStore};

use crate::common::{load_or_seed, open_store, CliResult};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// List all reminders
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Enable a reminder
    Enable { id: String },
    /// Disable a reminder
    Disable { id: String },
    /// Change an interval reminder's period
    SetInterval { id: String, minutes: u32 },
    /// Change a fixed-time reminder's time of day and workdays
    SetTime {
        id: String,
        /// Wall-clock time, HH:MM
        time: String,
        /// Comma-separated weekday indices (0 = Sunday); omit for every day
        #[arg(long)]
        workdays: Option<String>,
    },
}

pub fn run(action: ReminderAction) -> CliResult {
    let store = open_store()?;
    let mut doc = load_or_seed(&store)?;

    match action {
        ReminderAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&doc.reminders)?);
                return Ok(());
            }
            for def in doc.reminders.values() {
                let schedule = match &def.kind {
                    ReminderKind::Interval { interval_minutes } => {
                        format!("every {interval_minutes}m")
                    }
                    ReminderKind::FixedTime {
                        time_of_day,
                        workdays,
                    } => {
                        if workdays.is_empty() {
                            format!("daily at {time_of_day}")
                        } else {
                            let days: Vec<String> =
                                workdays.iter().map(u8::to_string).collect();
                            format!("at {time_of_day} on days {}", days.join(","))
                        }
                    }
                };
                let state = if def.enabled { "on " } else { "off" };
                println!("{state}  {:<12} {schedule}", def.id);
            }
            return Ok(());
        }
        ReminderAction::Enable { id } => {
            set_enabled(&mut doc, &id, true)?;
            println!("enabled {id} (takes effect on next `rhythm run`)");
        }
        ReminderAction::Disable { id } => {
            set_enabled(&mut doc, &id, false)?;
            println!("disabled {id}");
        }
        ReminderAction::SetInterval { id, minutes } => {
            let def = doc
                .reminders
                .get_mut(&id)
                .ok_or_else(|| format!("no reminder '{id}'"))?;
            def.kind = ReminderKind::Interval {
                interval_minutes: minutes,
            };
            def.validate()?;
            println!("{id}: every {minutes}m");
        }
        ReminderAction::SetTime { id, time, workdays } => {
            let workdays = match workdays {
                None => Default::default(),
                Some(csv) => csv
                    .split(',')
                    .filter(|p| !p.is_empty())
                    .map(|p| p.trim().parse::<u8>())
                    .collect::<Result<_, _>>()
                    .map_err(|e| format!("bad workday list: {e}"))?,
            };
            let def = doc
                .reminders
                .get_mut(&id)
                .ok_or_else(|| format!("no reminder '{id}'"))?;
            def.kind = ReminderKind::FixedTime {
                time_of_day: time.clone(),
                workdays,
            };
            def.validate()?;
            println!("{id}: at {time}");
        }
    }

    store.save(&doc)?;
    Ok(())
}

fn set_enabled(
    doc: &mut rhythm_core::StateDocument,
    id: &str,
    enabled: bool,
) -> CliResult {
    let def = doc
        .reminders
        .get_mut(id)
        .ok_or_else(|| format!("no reminder '{id}'"))?;
    def.enabled = enabled;
    Ok(())
}
