// FinTrackr - Core Library
// Personal finance tracker: transactions, savings goals, local notifications.
// Exposes all modules for use by the terminal UI, the CLI commands and tests.

pub mod models;
pub mod storage;
pub mod store;
pub mod analytics;
pub mod forms;
pub mod format;
pub mod notifications;
pub mod export;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use models::{
    Goal, GoalDraft, GoalPatch, Transaction, TransactionDraft, TransactionKind, TransactionPatch,
    User,
};
pub use storage::{KeyValueStore, MemoryStorage, SqliteStorage};
pub use store::{FinanceState, FinanceStore, GoalContribution};
pub use analytics::{
    CategoryTotal, DashboardSummary, DeadlineStatus, GoalReport, ProgressTier, Stats,
    TransactionFilter,
};
pub use forms::{FieldError, FormErrors, GoalForm, LoginForm, TransactionForm};
pub use format::CurrencyFormat;
pub use notifications::{
    Delivered, Notification, NotificationKind, NotificationScheduler, Trigger,
};
pub use export::{export_json, export_transactions_csv, snapshot_json};
pub use config::AppConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
