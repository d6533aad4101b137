// ⚙️ Configuration - schema, defaults and JSON loading
//
// Every section is `#[serde(default)]`, so a config file only needs the
// keys it wants to change. Lookup order: explicit `--config` path, then
// `config.json` in the app home directory, then built-in defaults.

use crate::format::CurrencyFormat;
use anyhow::{Context, Result};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "FINTRACKR_HOME";
pub const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_DATABASE_FILE: &str = "fintrackr.db";
const DEFAULT_BUDGET_LIMIT: f64 = 2000.0;
const DEFAULT_BUDGET_ALERT_RATIO: f64 = 0.8;
const DEFAULT_LARGE_TRANSACTION_THRESHOLD: f64 = 1000.0;
const DEFAULT_DAILY_REMINDER_HOUR: u32 = 20;
const DEFAULT_WEEKLY_REPORT_HOUR: u32 = 9;
const DEFAULT_GOAL_DEADLINE_WARNING_DAYS: i64 = 30;
const MAX_GOAL_DEADLINE_WARNING_DAYS: i64 = 365;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
    pub budget: BudgetConfig,
    pub notifications: NotificationConfig,
    pub currency: CurrencyFormat,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_dir: default_home_dir(),
            database_file: DEFAULT_DATABASE_FILE.to_string(),
            budget: BudgetConfig::default(),
            notifications: NotificationConfig::default(),
            currency: CurrencyFormat::default(),
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Monthly spending limit the budget alert measures against
    pub limit: f64,
    /// Fraction of the limit above which the alert fires
    pub alert_ratio: f64,
    /// Amount at or above which recording a transaction sends a notice
    pub large_transaction_threshold: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        BudgetConfig {
            limit: DEFAULT_BUDGET_LIMIT,
            alert_ratio: DEFAULT_BUDGET_ALERT_RATIO,
            large_transaction_threshold: DEFAULT_LARGE_TRANSACTION_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Stands in for the OS notification permission
    pub enabled: bool,
    pub daily_reminder: DailyReminderConfig,
    pub weekly_report: WeeklyReportConfig,
    pub goal_deadline_warning_days: i64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            enabled: true,
            daily_reminder: DailyReminderConfig::default(),
            weekly_report: WeeklyReportConfig::default(),
            goal_deadline_warning_days: DEFAULT_GOAL_DEADLINE_WARNING_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyReminderConfig {
    pub enabled: bool,
    pub hour: u32,
    pub minute: u32,
}

impl Default for DailyReminderConfig {
    fn default() -> Self {
        DailyReminderConfig {
            enabled: true,
            hour: DEFAULT_DAILY_REMINDER_HOUR,
            minute: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyReportConfig {
    pub enabled: bool,
    pub weekday: Weekday,
    pub hour: u32,
    pub minute: u32,
}

impl Default for WeeklyReportConfig {
    fn default() -> Self {
        WeeklyReportConfig {
            enabled: true,
            weekday: Weekday::Sun,
            hour: DEFAULT_WEEKLY_REPORT_HOUR,
            minute: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// EnvFilter directive, e.g. "info" or "fintrackr=debug"
    pub level: String,
    /// Defaults to `<data_dir>/logs`
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
            directory: None,
            file_prefix: "fintrackr.log".to_string(),
        }
    }
}

/// `$FINTRACKR_HOME`, else `~/.fintrackr`, else `./.fintrackr`
pub fn default_home_dir() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    match std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        Some(home) => PathBuf::from(home).join(".fintrackr"),
        None => PathBuf::from(".fintrackr"),
    }
}

impl AppConfig {
    /// Load from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Reading config file: {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Parsing config JSON in {}", path.display()))?;
        Ok(config)
    }

    /// Explicit path must exist; the home config is optional
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        let home_config = default_home_dir().join(CONFIG_FILE_NAME);
        if home_config.is_file() {
            Self::load_from_file(&home_config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log
            .directory
            .clone()
            .unwrap_or_else(|| self.data_dir.join("logs"))
    }

    /// Clamp out-of-range values back to defaults.
    ///
    /// Returns one message per corrected field; logging is not up yet when
    /// this runs, so the caller logs them.
    pub fn validate(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.budget.limit.is_finite() || self.budget.limit <= 0.0 {
            warnings.push(format!(
                "budget.limit must be positive, got {}; using {}",
                self.budget.limit, DEFAULT_BUDGET_LIMIT
            ));
            self.budget.limit = DEFAULT_BUDGET_LIMIT;
        }

        if !(self.budget.alert_ratio > 0.0 && self.budget.alert_ratio <= 1.0) {
            warnings.push(format!(
                "budget.alert_ratio must be in (0, 1], got {}; using {}",
                self.budget.alert_ratio, DEFAULT_BUDGET_ALERT_RATIO
            ));
            self.budget.alert_ratio = DEFAULT_BUDGET_ALERT_RATIO;
        }

        if !self.budget.large_transaction_threshold.is_finite()
            || self.budget.large_transaction_threshold <= 0.0
        {
            warnings.push(format!(
                "budget.large_transaction_threshold must be positive; using {}",
                DEFAULT_LARGE_TRANSACTION_THRESHOLD
            ));
            self.budget.large_transaction_threshold = DEFAULT_LARGE_TRANSACTION_THRESHOLD;
        }

        let reminder = &mut self.notifications.daily_reminder;
        if reminder.hour > 23 || reminder.minute > 59 {
            warnings.push(format!(
                "notifications.daily_reminder time {}:{} is invalid; using {}:00",
                reminder.hour, reminder.minute, DEFAULT_DAILY_REMINDER_HOUR
            ));
            reminder.hour = DEFAULT_DAILY_REMINDER_HOUR;
            reminder.minute = 0;
        }

        let report = &mut self.notifications.weekly_report;
        if report.hour > 23 || report.minute > 59 {
            warnings.push(format!(
                "notifications.weekly_report time {}:{} is invalid; using {}:00",
                report.hour, report.minute, DEFAULT_WEEKLY_REPORT_HOUR
            ));
            report.hour = DEFAULT_WEEKLY_REPORT_HOUR;
            report.minute = 0;
        }

        let days = self.notifications.goal_deadline_warning_days;
        if !(0..=MAX_GOAL_DEADLINE_WARNING_DAYS).contains(&days) {
            warnings.push(format!(
                "notifications.goal_deadline_warning_days {} out of range; using {}",
                days, DEFAULT_GOAL_DEADLINE_WARNING_DAYS
            ));
            self.notifications.goal_deadline_warning_days = DEFAULT_GOAL_DEADLINE_WARNING_DAYS;
        }

        if self.database_file.trim().is_empty() {
            warnings.push(format!("database_file is empty; using {}", DEFAULT_DATABASE_FILE));
            self.database_file = DEFAULT_DATABASE_FILE.to_string();
        }

        warnings
    }
}
