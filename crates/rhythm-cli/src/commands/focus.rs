use chrono::{Duration, Utc};
use clap::Subcommand;
use rhythm_core::StateStore;

use crate::common::{load_or_seed, open_store, CliResult};

#[derive(Subcommand)]
pub enum FocusAction {
    /// Suppress all reminders for the given number of minutes
    Start { minutes: u32 },
    /// Clear the focus window
    Stop,
    /// Show the current suppression state
    Status,
    /// Set the global master toggle (on/off)
    Master {
        #[arg(value_parser = clap::builder::BoolishValueParser::new())]
        enabled: bool,
    },
}

pub fn run(action: FocusAction) -> CliResult {
    let store = open_store()?;
    let mut doc = load_or_seed(&store)?;

    match action {
        FocusAction::Start { minutes } => {
            let until = Utc::now() + Duration::minutes(minutes as i64);
            doc.settings.focus_until = Some(until);
            println!("focus mode until {}", until.with_timezone(&chrono::Local));
        }
        FocusAction::Stop => {
            doc.settings.focus_until = None;
            println!("focus mode cleared");
        }
        FocusAction::Status => {
            let now = Utc::now();
            match doc.settings.focus_until {
                Some(until) if now < until => {
                    println!("focus mode active, {}m remaining", (until - now).num_minutes())
                }
                _ => println!("focus mode inactive"),
            }
            println!(
                "master toggle: {}",
                if doc.settings.master_enabled { "on" } else { "off" }
            );
            return Ok(());
        }
        FocusAction::Master { enabled } => {
            doc.settings.master_enabled = enabled;
            println!("master toggle: {}", if enabled { "on" } else { "off" });
        }
    }

    store.save(&doc)?;
    Ok(())
}
