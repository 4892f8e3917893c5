//! Persisted state document and the store seam.
//!
//! The engine reads and writes one whole JSON document -- settings,
//! reminder definitions, and daily stats. There is no partial-field
//! API: every mutation is load, modify, save.
//!
//! The default on-disk location is `~/.config/rhythm/state.json`
//! (`~/.config/rhythm-dev/` when `RHYTHM_ENV=dev`).

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{EngineError, Result};
use crate::time_calc::parse_time_of_day;

/// Bumping this reseeds the document on next initialize.
pub const SCHEMA_VERSION: u32 = 1;

/// Global settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Global enable toggle; false suppresses every trigger.
    pub master_enabled: bool,
    /// While `now < focus_until`, triggers are computed but not surfaced.
    #[serde(default)]
    pub focus_until: Option<DateTime<Utc>>,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_theme() -> String {
    "light".into()
}
fn default_timezone() -> String {
    "auto".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_enabled: true,
            focus_until: None,
            theme: default_theme(),
            timezone: default_timezone(),
        }
    }
}

/// How a reminder fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReminderKind {
    /// Repeats every fixed number of minutes.
    #[serde(rename_all = "camelCase")]
    Interval { interval_minutes: u32 },
    /// Fires daily at `time_of_day` ("HH:MM", local), optionally
    /// restricted to `workdays` (0 = Sunday; empty set = every day).
    #[serde(rename_all = "camelCase")]
    FixedTime {
        time_of_day: String,
        #[serde(default)]
        workdays: BTreeSet<u8>,
    },
}

/// A user-defined recurring reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDefinition {
    pub id: String,
    pub enabled: bool,
    #[serde(flatten)]
    pub kind: ReminderKind,
    /// Opaque bag (daily targets, sound flags); passed through untouched.
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub last_triggered: Option<DateTime<Utc>>,
}

impl ReminderDefinition {
    pub fn interval(id: impl Into<String>, minutes: u32) -> Self {
        Self {
            id: id.into(),
            enabled: false,
            kind: ReminderKind::Interval {
                interval_minutes: minutes,
            },
            metadata: json!({ "soundEnabled": true }),
            last_triggered: None,
        }
    }

    pub fn fixed_time(
        id: impl Into<String>,
        time_of_day: impl Into<String>,
        workdays: impl IntoIterator<Item = u8>,
    ) -> Self {
        Self {
            id: id.into(),
            enabled: false,
            kind: ReminderKind::FixedTime {
                time_of_day: time_of_day.into(),
                workdays: workdays.into_iter().collect(),
            },
            metadata: json!({ "soundEnabled": true }),
            last_triggered: None,
        }
    }

    /// Reject definitions the scheduler could not arm correctly.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(EngineError::invalid(&self.id, "empty reminder id"));
        }
        match &self.kind {
            ReminderKind::Interval { interval_minutes } => {
                if *interval_minutes < 1 {
                    return Err(EngineError::invalid(
                        &self.id,
                        "intervalMinutes must be at least 1",
                    ));
                }
            }
            ReminderKind::FixedTime {
                time_of_day,
                workdays,
            } => {
                if parse_time_of_day(time_of_day).is_none() {
                    return Err(EngineError::invalid(
                        &self.id,
                        format!("timeOfDay '{time_of_day}' is not HH:MM"),
                    ));
                }
                if let Some(bad) = workdays.iter().find(|d| **d > 6) {
                    return Err(EngineError::invalid(
                        &self.id,
                        format!("workday index {bad} out of range 0-6"),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Per-reminder daily counter. Incremented by acknowledge, zeroed by the
/// midnight rollover, never decremented otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub today_count: u32,
    #[serde(default)]
    pub last_reset_date: Option<NaiveDate>,
}

/// The whole persisted state: settings, definitions, stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDocument {
    pub schema_version: u32,
    pub settings: Settings,
    pub reminders: BTreeMap<String, ReminderDefinition>,
    pub stats: BTreeMap<String, DailyStat>,
}

impl StateDocument {
    /// The stock document written on first run: the standard set of
    /// wellness reminders, all disabled, with zeroed stats.
    pub fn seeded() -> Self {
        let mut reminders = BTreeMap::new();
        for def in [
            ReminderDefinition {
                metadata: json!({ "dailyTarget": 8, "unit": "glasses", "soundEnabled": true }),
                ..ReminderDefinition::interval("water", 15)
            },
            ReminderDefinition::interval("posture", 30),
            ReminderDefinition::interval("break", 60),
            ReminderDefinition::interval("eye", 20),
            ReminderDefinition::interval("stand", 45),
            ReminderDefinition::interval("stretch", 60),
            ReminderDefinition::interval("breathing", 90),
            ReminderDefinition::fixed_time("workStart", "09:00", [1, 2, 3, 4, 5]),
            ReminderDefinition::fixed_time("workLunch", "12:00", [1, 2, 3, 4, 5]),
            ReminderDefinition::fixed_time("workEnd", "22:00", [1, 2, 3, 4, 5]),
        ] {
            reminders.insert(def.id.clone(), def);
        }
        let stats = reminders
            .keys()
            .map(|id| (id.clone(), DailyStat::default()))
            .collect();
        Self {
            schema_version: SCHEMA_VERSION,
            settings: Settings::default(),
            reminders,
            stats,
        }
    }

    pub fn stat_mut(&mut self, id: &str) -> &mut DailyStat {
        self.stats.entry(id.to_string()).or_default()
    }
}

/// Whole-document persistence contract.
pub trait StateStore {
    /// `Ok(None)` when no document has been written yet.
    fn load(&self) -> Result<Option<StateDocument>>;

    /// Replaces the stored document as one write.
    fn save(&self, doc: &StateDocument) -> Result<()>;
}

/// JSON file store under the user data directory.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

/// Returns `~/.config/rhythm[-dev]/` based on RHYTHM_ENV.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");
    let env = std::env::var("RHYTHM_ENV").unwrap_or_else(|_| "production".to_string());
    let dir = if env == "dev" {
        base_dir.join("rhythm-dev")
    } else {
        base_dir.join("rhythm")
    };
    std::fs::create_dir_all(&dir)
        .map_err(|e| EngineError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

impl JsonFileStore {
    /// Open the store at the default location.
    pub fn open() -> Result<Self> {
        Ok(Self::with_path(data_dir()?.join("state.json")))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<StateDocument>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, doc: &StateDocument) -> Result<()> {
        let content = serde_json::to_string_pretty(doc)?;
        // Write-then-rename so a crash mid-save never leaves a torn
        // document behind.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory store for tests. `set_failing(true)` makes every call
/// return an IO error, for exercising persistence-unavailable paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    doc: RefCell<Option<StateDocument>>,
    failing: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: StateDocument) -> Self {
        Self {
            doc: RefCell::new(Some(doc)),
            failing: Cell::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn document(&self) -> Option<StateDocument> {
        self.doc.borrow().clone()
    }

    fn check(&self) -> Result<()> {
        if self.failing.get() {
            Err(std::io::Error::other("simulated store outage").into())
        } else {
            Ok(())
        }
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<StateDocument>> {
        self.check()?;
        Ok(self.doc.borrow().clone())
    }

    fn save(&self, doc: &StateDocument) -> Result<()> {
        self.check()?;
        *self.doc.borrow_mut() = Some(doc.clone());
        Ok(())
    }
}
