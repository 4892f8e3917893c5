use clap::Subcommand;
use rhythm_core::StateStore;

use crate::common::{load_or_seed, open_store, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Show today's counters
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a reminder as done (increments today's counter)
    Ack { id: String },
}

pub fn run(action: StatsAction) -> CliResult {
    let store = open_store()?;
    let mut doc = load_or_seed(&store)?;

    match action {
        StatsAction::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&doc.stats)?);
            } else {
                for (id, stat) in &doc.stats {
                    let reset = stat
                        .last_reset_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "never".into());
                    println!("{:<12} today: {:>3}  last reset: {reset}", id, stat.today_count);
                }
            }
        }
        StatsAction::Ack { id } => {
            if !doc.reminders.contains_key(&id) {
                return Err(format!("no reminder '{id}'").into());
            }
            let stat = doc.stat_mut(&id);
            stat.today_count += 1;
            println!("{id}: {} today", stat.today_count);
            store.save(&doc)?;
        }
    }
    Ok(())
}
