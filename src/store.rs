// 🗃️ Finance Store - the single in-memory state and its reducers
//
// One process-wide store holds the user, the transactions and the goals.
// Every mutation writes the whole state back to the key-value storage.
// Storage failures are logged and swallowed: the in-memory state stays
// authoritative and the next successful write catches the disk up.

use crate::analytics::{self, CategoryTotal, DashboardSummary, Stats};
use crate::models::{
    Goal, GoalDraft, GoalPatch, Transaction, TransactionDraft, TransactionKind, TransactionPatch,
    User,
};
use crate::storage::{KeyValueStore, GOALS_KEY, TRANSACTIONS_KEY, USER_KEY};
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, Local, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Everything the app persists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinanceState {
    pub user: Option<User>,
    pub transactions: Vec<Transaction>,
    pub goals: Vec<Goal>,
}

/// Result of adding money to a goal
#[derive(Debug, Clone, PartialEq)]
pub struct GoalContribution {
    pub goal: Goal,
    /// The contribution moved the goal from below its target to at/above it
    pub newly_achieved: bool,
}

pub struct FinanceStore<S: KeyValueStore> {
    state: FinanceState,
    storage: S,
    is_loading: bool,
    last_id: i64,
}

impl<S: KeyValueStore> FinanceStore<S> {
    /// Create an empty store; call `load` before use
    pub fn new(storage: S) -> Self {
        FinanceStore {
            state: FinanceState::default(),
            storage,
            is_loading: true,
            last_id: 0,
        }
    }

    /// Create and load in one step
    pub fn open(storage: S) -> Self {
        let mut store = Self::new(storage);
        store.load();
        store
    }

    // ========================================================================
    // LOAD / PERSIST
    // ========================================================================

    pub fn load(&mut self) {
        self.load_at(Utc::now());
    }

    /// Reload the whole state from storage.
    ///
    /// Missing transaction or goal keys mean a first run and get sample data.
    /// Unreadable keys are logged and left empty (no seeding over them).
    pub fn load_at(&mut self, now: DateTime<Utc>) {
        self.is_loading = true;
        self.state = FinanceState::default();

        match self.read_json::<Option<User>>(USER_KEY) {
            Ok(Some(user)) => self.state.user = user,
            Ok(None) => {}
            Err(err) => error!(key = USER_KEY, "Failed to load user: {:#}", err),
        }

        match self.read_json::<Vec<Transaction>>(TRANSACTIONS_KEY) {
            Ok(Some(transactions)) => self.state.transactions = transactions,
            Ok(None) => {
                info!("No saved transactions, seeding sample data");
                self.state.transactions = sample_transactions(now);
            }
            Err(err) => error!(key = TRANSACTIONS_KEY, "Failed to load transactions: {:#}", err),
        }

        match self.read_json::<Vec<Goal>>(GOALS_KEY) {
            Ok(Some(goals)) => self.state.goals = goals,
            Ok(None) => {
                info!("No saved goals, seeding sample data");
                self.state.goals = sample_goals(now);
            }
            Err(err) => error!(key = GOALS_KEY, "Failed to load goals: {:#}", err),
        }

        self.last_id = self.max_numeric_id();
        self.is_loading = false;

        info!(
            transactions = self.state.transactions.len(),
            goals = self.state.goals.len(),
            has_user = self.state.user.is_some(),
            "Finance state loaded"
        );

        self.persist();
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = match self.storage.get_item(key)? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let value = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse stored JSON under {}", key))?;
        Ok(Some(value))
    }

    /// Write all three keys; errors are propagated
    pub fn save(&mut self) -> Result<()> {
        let user = serde_json::to_string(&self.state.user)?;
        let transactions = serde_json::to_string(&self.state.transactions)?;
        let goals = serde_json::to_string(&self.state.goals)?;

        self.storage.set_item(USER_KEY, &user)?;
        self.storage.set_item(TRANSACTIONS_KEY, &transactions)?;
        self.storage.set_item(GOALS_KEY, &goals)?;

        Ok(())
    }

    /// Fire-and-forget write after a mutation: failures are logged only
    pub fn persist(&mut self) {
        if self.is_loading {
            debug!("Skipping persist while loading");
            return;
        }

        if let Err(err) = self.save() {
            error!("Failed to save finance state: {:#}", err);
        }
    }

    // ========================================================================
    // USER
    // ========================================================================

    /// Log in (Some) or log out (None)
    pub fn set_user(&mut self, user: Option<User>) {
        match &user {
            Some(user) => info!(name = %user.name, "User set"),
            None => info!("User cleared"),
        }
        self.state.user = user;
        self.persist();
    }

    // ========================================================================
    // TRANSACTIONS
    // ========================================================================

    pub fn add_transaction(&mut self, draft: TransactionDraft) -> Transaction {
        self.add_transaction_at(draft, Utc::now())
    }

    /// New transactions go to the front: the list is newest-first
    pub fn add_transaction_at(&mut self, draft: TransactionDraft, now: DateTime<Utc>) -> Transaction {
        let transaction = Transaction {
            id: self.next_id(now),
            title: draft.title,
            amount: draft.amount,
            kind: draft.kind,
            category: draft.category,
            date: now,
            description: draft.description,
        };

        debug!(id = %transaction.id, kind = transaction.kind.as_str(), "Transaction added");
        self.state.transactions.insert(0, transaction.clone());
        self.persist();
        transaction
    }

    /// Returns false when no transaction has this id
    pub fn update_transaction(&mut self, id: &str, patch: TransactionPatch) -> bool {
        let updated = match self.state.transactions.iter_mut().find(|tx| tx.id == id) {
            Some(tx) => {
                tx.apply(patch);
                true
            }
            None => false,
        };

        if updated {
            self.persist();
        } else {
            warn!(id, "Update for unknown transaction ignored");
        }
        updated
    }

    pub fn delete_transaction(&mut self, id: &str) -> bool {
        let before = self.state.transactions.len();
        self.state.transactions.retain(|tx| tx.id != id);
        let removed = self.state.transactions.len() != before;

        if removed {
            self.persist();
        }
        removed
    }

    // ========================================================================
    // GOALS
    // ========================================================================

    pub fn add_goal(&mut self, draft: GoalDraft) -> Goal {
        self.add_goal_at(draft, Utc::now())
    }

    /// Goals are appended and always start with nothing saved
    pub fn add_goal_at(&mut self, draft: GoalDraft, now: DateTime<Utc>) -> Goal {
        let goal = Goal {
            id: self.next_id(now),
            title: draft.title,
            target_amount: draft.target_amount,
            current_amount: 0.0,
            deadline: draft.deadline,
            description: draft.description,
            created_at: now,
        };

        debug!(id = %goal.id, "Goal added");
        self.state.goals.push(goal.clone());
        self.persist();
        goal
    }

    pub fn update_goal(&mut self, id: &str, patch: GoalPatch) -> bool {
        let updated = match self.state.goals.iter_mut().find(|goal| goal.id == id) {
            Some(goal) => {
                goal.apply(patch);
                true
            }
            None => false,
        };

        if updated {
            self.persist();
        } else {
            warn!(id, "Update for unknown goal ignored");
        }
        updated
    }

    pub fn delete_goal(&mut self, id: &str) -> bool {
        let before = self.state.goals.len();
        self.state.goals.retain(|goal| goal.id != id);
        let removed = self.state.goals.len() != before;

        if removed {
            self.persist();
        }
        removed
    }

    /// Add (or, with a negative amount, withdraw) money saved toward a goal.
    /// The saved amount never drops below zero.
    pub fn contribute_to_goal(&mut self, id: &str, amount: f64) -> Option<GoalContribution> {
        let goal = self.state.goals.iter_mut().find(|goal| goal.id == id)?;

        let was_achieved = goal.is_achieved();
        goal.current_amount = (goal.current_amount + amount).max(0.0);
        let contribution = GoalContribution {
            newly_achieved: !was_achieved && goal.is_achieved(),
            goal: goal.clone(),
        };

        self.persist();
        Some(contribution)
    }

    // ========================================================================
    // RESET
    // ========================================================================

    /// Wipe storage and the in-memory state (settings "clear data")
    pub fn clear_all(&mut self) {
        if let Err(err) = self.storage.clear() {
            error!("Failed to clear storage: {:#}", err);
        }
        self.state = FinanceState::default();
        info!("All finance data cleared");
    }

    // ========================================================================
    // READ SIDE
    // ========================================================================

    pub fn state(&self) -> &FinanceState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.state.transactions
    }

    pub fn goals(&self) -> &[Goal] {
        &self.state.goals
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn find_transaction(&self, id: &str) -> Option<&Transaction> {
        self.state.transactions.iter().find(|tx| tx.id == id)
    }

    pub fn find_goal(&self, id: &str) -> Option<&Goal> {
        self.state.goals.iter().find(|goal| goal.id == id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn balance(&self) -> f64 {
        analytics::balance(&self.state.transactions)
    }

    pub fn monthly_income(&self) -> f64 {
        analytics::monthly_income(&self.state.transactions, &Local::now())
    }

    pub fn monthly_expenses(&self) -> f64 {
        analytics::monthly_expenses(&self.state.transactions, &Local::now())
    }

    pub fn expenses_by_category(&self) -> Vec<CategoryTotal> {
        analytics::expenses_by_category(&self.state.transactions)
    }

    pub fn dashboard<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DashboardSummary {
        DashboardSummary::build(&self.state.transactions, now)
    }

    pub fn stats(&self) -> Stats {
        analytics::stats(&self.state.transactions, &self.state.goals)
    }

    // ========================================================================
    // IDS
    // ========================================================================

    /// Millisecond timestamp id, bumped past the last one handed out so two
    /// records created within the same millisecond still differ
    fn next_id(&mut self, now: DateTime<Utc>) -> String {
        let id = now.timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        id.to_string()
    }

    fn max_numeric_id(&self) -> i64 {
        self.state
            .transactions
            .iter()
            .map(|tx| tx.id.as_str())
            .chain(self.state.goals.iter().map(|goal| goal.id.as_str()))
            .filter_map(|id| id.parse::<i64>().ok())
            .max()
            .unwrap_or(0)
    }
}

// ============================================================================
// SAMPLE DATA (first run)
// ============================================================================

fn sample(
    id: &str,
    title: &str,
    amount: f64,
    kind: TransactionKind,
    category: &str,
    date: DateTime<Utc>,
    description: &str,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        title: title.to_string(),
        amount,
        kind,
        category: category.to_string(),
        date,
        description: Some(description.to_string()),
    }
}

pub fn sample_transactions(now: DateTime<Utc>) -> Vec<Transaction> {
    let days_ago = |days: i64| now - Duration::days(days);

    vec![
        sample("1", "Salary", 3500.0, TransactionKind::Income, "Salary", now, "Monthly salary"),
        sample("2", "Supermarket", 250.0, TransactionKind::Expense, "Food", days_ago(1), "Monthly groceries"),
        sample("3", "Transport", 150.0, TransactionKind::Expense, "Transport", days_ago(2), "Fares and fuel"),
        sample("4", "Netflix", 45.90, TransactionKind::Expense, "Entertainment", days_ago(3), "Monthly subscription"),
        sample("5", "Freelance", 800.0, TransactionKind::Income, "Work", days_ago(4), "Side project"),
    ]
}

pub fn sample_goals(now: DateTime<Utc>) -> Vec<Goal> {
    vec![
        Goal {
            id: "1".to_string(),
            title: "Emergency fund".to_string(),
            target_amount: 5000.0,
            current_amount: 1250.0,
            deadline: format!("{}-12-31", now.year()),
            description: Some("Money set aside for emergencies".to_string()),
            created_at: now,
        },
        Goal {
            id: "2".to_string(),
            title: "Trip".to_string(),
            target_amount: 3000.0,
            current_amount: 800.0,
            deadline: (now + Duration::days(180)).format("%Y-%m-%d").to_string(),
            description: Some("Trip to Europe".to_string()),
            created_at: now,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, SqliteStorage};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
    }

    /// Store whose storage already holds empty lists, so nothing is seeded
    fn empty_store() -> FinanceStore<MemoryStorage> {
        let storage = MemoryStorage::new()
            .with_item(TRANSACTIONS_KEY, "[]")
            .with_item(GOALS_KEY, "[]");
        let mut store = FinanceStore::new(storage);
        store.load_at(now());
        store
    }

    fn draft(title: &str, amount: f64, kind: TransactionKind) -> TransactionDraft {
        TransactionDraft {
            title: title.to_string(),
            amount,
            kind,
            category: "Food".to_string(),
            description: None,
        }
    }

    fn goal_draft(title: &str, target: f64) -> GoalDraft {
        GoalDraft {
            title: title.to_string(),
            target_amount: target,
            deadline: "2025-12-31".to_string(),
            description: None,
        }
    }

    #[test]
    fn test_first_load_seeds_samples_and_persists() {
        let mut store = FinanceStore::new(MemoryStorage::new());
        store.load_at(now());

        assert!(!store.is_loading());
        assert_eq!(store.transactions().len(), 5);
        assert_eq!(store.goals().len(), 2);
        assert!(store.user().is_none());
        assert!(store.storage().get_item(TRANSACTIONS_KEY).unwrap().is_some());
        assert_eq!(store.storage().get_item(USER_KEY).unwrap().as_deref(), Some("null"));
    }

    #[test]
    fn test_explicit_empty_lists_are_not_seeded() {
        let store = empty_store();
        assert!(store.transactions().is_empty());
        assert!(store.goals().is_empty());
    }

    #[test]
    fn test_corrupted_key_is_logged_not_seeded() {
        let storage = MemoryStorage::new()
            .with_item(TRANSACTIONS_KEY, "{not json")
            .with_item(GOALS_KEY, "[]")
            .with_item(USER_KEY, r#"{"name":"Ana"}"#);
        let mut store = FinanceStore::new(storage);
        store.load_at(now());

        assert!(store.transactions().is_empty());
        assert_eq!(store.user().map(|u| u.name.as_str()), Some("Ana"));
    }

    #[test]
    fn test_add_transaction_moves_balance() {
        let mut store = empty_store();
        let before = store.balance();

        store.add_transaction_at(draft("Salary", 1000.0, TransactionKind::Income), now());
        assert_eq!(store.balance(), before + 1000.0);

        store.add_transaction_at(draft("Lunch", 35.5, TransactionKind::Expense), now());
        assert_eq!(store.balance(), before + 1000.0 - 35.5);
    }

    #[test]
    fn test_add_transaction_prepends_with_unique_ids() {
        let mut store = empty_store();

        let first = store.add_transaction_at(draft("A", 1.0, TransactionKind::Expense), now());
        let second = store.add_transaction_at(draft("B", 2.0, TransactionKind::Expense), now());

        assert_ne!(first.id, second.id);
        assert_eq!(first.id, now().timestamp_millis().to_string());
        assert_eq!(store.transactions()[0].title, "B");
        assert_eq!(store.transactions()[1].title, "A");
        assert_eq!(second.date, now());
    }

    #[test]
    fn test_update_transaction_merges_fields() {
        let mut store = empty_store();
        let tx = store.add_transaction_at(draft("Lunch", 20.0, TransactionKind::Expense), now());

        let updated = store.update_transaction(
            &tx.id,
            TransactionPatch {
                title: Some("Dinner".to_string()),
                ..Default::default()
            },
        );

        assert!(updated);
        let stored = store.find_transaction(&tx.id).unwrap();
        assert_eq!(stored.title, "Dinner");
        assert_eq!(stored.amount, 20.0);
        assert!(!store.update_transaction("missing", TransactionPatch::default()));
    }

    #[test]
    fn test_delete_transaction() {
        let mut store = empty_store();
        let tx = store.add_transaction_at(draft("Lunch", 20.0, TransactionKind::Expense), now());

        assert!(store.delete_transaction(&tx.id));
        assert!(!store.delete_transaction(&tx.id));
        assert!(store.transactions().is_empty());
    }

    #[test]
    fn test_add_goal_starts_at_zero_and_appends() {
        let mut store = empty_store();

        let first = store.add_goal_at(goal_draft("House", 100_000.0), now());
        store.add_goal_at(goal_draft("Car", 30_000.0), now());

        assert_eq!(first.current_amount, 0.0);
        assert_eq!(first.created_at, now());
        assert_eq!(store.goals()[0].title, "House");
        assert_eq!(store.goals()[1].title, "Car");
    }

    #[test]
    fn test_delete_goal_removes_from_persisted_store() {
        let mut store = empty_store();
        let goal = store.add_goal_at(goal_draft("House", 100_000.0), now());
        assert!(store.storage().get_item(GOALS_KEY).unwrap().unwrap().contains("House"));

        assert!(store.delete_goal(&goal.id));

        assert!(store.goals().is_empty());
        assert_eq!(store.storage().get_item(GOALS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_update_goal_keeps_current_amount() {
        let mut store = empty_store();
        let goal = store.add_goal_at(goal_draft("Trip", 3000.0), now());
        store.contribute_to_goal(&goal.id, 500.0);

        store.update_goal(
            &goal.id,
            GoalPatch {
                target_amount: Some(4000.0),
                ..Default::default()
            },
        );

        let stored = store.find_goal(&goal.id).unwrap();
        assert_eq!(stored.target_amount, 4000.0);
        assert_eq!(stored.current_amount, 500.0);
    }

    #[test]
    fn test_contribution_reports_achievement_once() {
        let mut store = empty_store();
        let goal = store.add_goal_at(goal_draft("Phone", 1000.0), now());

        let partial = store.contribute_to_goal(&goal.id, 600.0).unwrap();
        assert!(!partial.newly_achieved);

        let done = store.contribute_to_goal(&goal.id, 400.0).unwrap();
        assert!(done.newly_achieved);

        let extra = store.contribute_to_goal(&goal.id, 10.0).unwrap();
        assert!(!extra.newly_achieved);

        let withdrawn = store.contribute_to_goal(&goal.id, -5000.0).unwrap();
        assert_eq!(withdrawn.goal.current_amount, 0.0);
        assert!(store.contribute_to_goal("missing", 1.0).is_none());
    }

    #[test]
    fn test_reload_reproduces_state() {
        let mut store = FinanceStore::new(SqliteStorage::open_in_memory().unwrap());
        store.load_at(now());
        store.set_user(Some(User::new("Ana")));
        store.add_transaction_at(draft("Lunch", 20.0, TransactionKind::Expense), now());
        store.add_goal_at(goal_draft("Trip", 3000.0), now());
        let snapshot = store.state().clone();

        store.load_at(now());

        assert_eq!(store.state(), &snapshot);
    }

    #[test]
    fn test_ids_stay_unique_after_reload() {
        let mut store = empty_store();
        let tx = store.add_transaction_at(draft("A", 1.0, TransactionKind::Expense), now());
        store.load_at(now());

        let goal = store.add_goal_at(goal_draft("B", 10.0), now());
        assert_ne!(tx.id, goal.id);
    }

    #[test]
    fn test_persist_failure_does_not_abort_mutation() {
        let mut store = empty_store();
        store.storage_mut().set_fail_writes(true);

        let tx = store.add_transaction_at(draft("Lunch", 20.0, TransactionKind::Expense), now());

        assert_eq!(store.transactions().len(), 1);
        assert_eq!(store.transactions()[0].id, tx.id);
        assert!(store.save().is_err());
        // Storage still holds the last good write
        assert_eq!(store.storage().get_item(TRANSACTIONS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_logout_persists_null_user() {
        let mut store = empty_store();
        store.set_user(Some(User::new("Ana")));
        store.set_user(None);

        assert!(store.user().is_none());
        assert_eq!(store.storage().get_item(USER_KEY).unwrap().as_deref(), Some("null"));
    }

    #[test]
    fn test_clear_all() {
        let mut store = empty_store();
        store.set_user(Some(User::new("Ana")));
        store.add_goal_at(goal_draft("Trip", 3000.0), now());

        store.clear_all();

        assert!(store.user().is_none());
        assert!(store.goals().is_empty());
        assert!(store.storage().is_empty());
    }

    #[test]
    fn test_sample_data_shape() {
        let transactions = sample_transactions(now());
        let goals = sample_goals(now());

        let expected = 3500.0 + 800.0 - 250.0 - 150.0 - 45.90;
        assert!((analytics::balance(&transactions) - expected).abs() < 1e-9);
        assert!(transactions.windows(2).all(|w| w[0].date >= w[1].date));
        assert_eq!(goals[0].deadline, "2025-12-31");
        assert_eq!(goals[1].deadline, "2025-09-10");
    }
}
