// 📊 Analytics - balance, monthly totals, category breakdown, goal progress
//
// Every function here is a single pass over the recorded data. Month
// boundaries are evaluated in the timezone of the `now` argument so the
// dashboard agrees with the user's wall clock.

use crate::models::{Goal, Transaction, TransactionKind};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::Serialize;
use std::collections::HashMap;

/// Days before a deadline at which a goal counts as approaching
pub const APPROACHING_DEADLINE_DAYS: i64 = 30;

/// Progress fraction at which a goal is shown as close to done
pub const CLOSE_PROGRESS: f64 = 0.7;

// ============================================================================
// BALANCE & MONTHLY TOTALS
// ============================================================================

/// Sum of incomes minus sum of expenses across all transactions
pub fn balance(transactions: &[Transaction]) -> f64 {
    transactions.iter().map(Transaction::signed_amount).sum()
}

/// True when `date` falls in the same calendar month and year as `now`
pub fn in_same_month<Tz: TimeZone>(date: &DateTime<chrono::Utc>, now: &DateTime<Tz>) -> bool {
    let local = date.with_timezone(&now.timezone());
    local.year() == now.year() && local.month() == now.month()
}

pub fn monthly_total<Tz: TimeZone>(
    transactions: &[Transaction],
    kind: TransactionKind,
    now: &DateTime<Tz>,
) -> f64 {
    transactions
        .iter()
        .filter(|tx| tx.kind == kind && in_same_month(&tx.date, now))
        .map(|tx| tx.amount)
        .sum()
}

pub fn monthly_income<Tz: TimeZone>(transactions: &[Transaction], now: &DateTime<Tz>) -> f64 {
    monthly_total(transactions, TransactionKind::Income, now)
}

pub fn monthly_expenses<Tz: TimeZone>(transactions: &[Transaction], now: &DateTime<Tz>) -> f64 {
    monthly_total(transactions, TransactionKind::Expense, now)
}

// ============================================================================
// CATEGORY BREAKDOWN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: f64,
    /// Share of all expenses, 0..=100
    pub percentage: f64,
}

/// Group every expense by category.
///
/// Sorted by amount (largest first), ties broken by name so the order is
/// stable between renders.
pub fn expenses_by_category(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    let mut grand_total = 0.0;

    for tx in transactions.iter().filter(|tx| tx.is_expense()) {
        *totals.entry(tx.category.as_str()).or_insert(0.0) += tx.amount;
        grand_total += tx.amount;
    }

    let mut result: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            category: category.to_string(),
            amount,
            percentage: if grand_total > 0.0 {
                amount / grand_total * 100.0
            } else {
                0.0
            },
        })
        .collect();

    result.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    result
}

// ============================================================================
// COUNTS
// ============================================================================

/// Figures shown on the settings screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub transaction_count: usize,
    pub goal_count: usize,
    pub total_value: f64,
}

pub fn stats(transactions: &[Transaction], goals: &[Goal]) -> Stats {
    Stats {
        transaction_count: transactions.len(),
        goal_count: goals.len(),
        total_value: balance(transactions),
    }
}

// ============================================================================
// DASHBOARD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub balance: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub by_category: Vec<CategoryTotal>,
}

impl DashboardSummary {
    pub fn build<Tz: TimeZone>(transactions: &[Transaction], now: &DateTime<Tz>) -> Self {
        DashboardSummary {
            balance: balance(transactions),
            monthly_income: monthly_income(transactions, now),
            monthly_expenses: monthly_expenses(transactions, now),
            by_category: expenses_by_category(transactions),
        }
    }

    /// Top `n` categories for compact listings
    pub fn top_categories(&self, n: usize) -> &[CategoryTotal] {
        &self.by_category[..self.by_category.len().min(n)]
    }
}

// ============================================================================
// GOAL PROGRESS
// ============================================================================

/// Fraction of the target reached, clamped to 0..=1.
///
/// A non-positive (or non-finite) target has no meaningful progress and
/// reports 0.
pub fn goal_progress(current: f64, target: f64) -> f64 {
    if !target.is_finite() || target <= 0.0 || !current.is_finite() {
        return 0.0;
    }
    (current / target).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressTier {
    Completed,
    Close,
    InProgress,
}

impl ProgressTier {
    pub fn from_progress(progress: f64) -> Self {
        if progress >= 1.0 {
            ProgressTier::Completed
        } else if progress >= CLOSE_PROGRESS {
            ProgressTier::Close
        } else {
            ProgressTier::InProgress
        }
    }
}

/// Parse a goal deadline. Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_deadline(deadline: &str) -> Option<NaiveDate> {
    let trimmed = deadline.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(trimmed)
            .ok()
            .map(|dt| dt.date_naive())
    })
}

/// Whole days from `today` until the deadline; negative once it has passed
pub fn days_until_deadline(deadline: &str, today: NaiveDate) -> Option<i64> {
    parse_deadline(deadline).map(|date| (date - today).num_days())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineStatus {
    Overdue,
    Approaching,
    OnTrack,
}

impl DeadlineStatus {
    pub fn from_days(days: i64) -> Self {
        if days < 0 {
            DeadlineStatus::Overdue
        } else if days <= APPROACHING_DEADLINE_DAYS {
            DeadlineStatus::Approaching
        } else {
            DeadlineStatus::OnTrack
        }
    }
}

/// Progress and deadline figures for one goal, computed together for display
#[derive(Debug, Clone, PartialEq)]
pub struct GoalReport {
    pub progress: f64,
    pub tier: ProgressTier,
    pub days_left: Option<i64>,
    pub deadline_status: Option<DeadlineStatus>,
}

impl GoalReport {
    pub fn for_goal(goal: &Goal, today: NaiveDate) -> Self {
        let progress = goal_progress(goal.current_amount, goal.target_amount);
        let days_left = days_until_deadline(&goal.deadline, today);

        GoalReport {
            progress,
            tier: ProgressTier::from_progress(progress),
            days_left,
            deadline_status: days_left.map(DeadlineStatus::from_days),
        }
    }
}

// ============================================================================
// TRANSACTION FILTER
// ============================================================================

/// Search box + category + kind filters of the transaction list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub query: String,
    pub category: Option<String>,
    pub kind: Option<TransactionKind>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        let query = self.query.trim().to_lowercase();
        let matches_search = query.is_empty() || tx.title.to_lowercase().contains(&query);
        let matches_category = self
            .category
            .as_ref()
            .map_or(true, |category| &tx.category == category);
        let matches_kind = self.kind.map_or(true, |kind| tx.kind == kind);

        matches_search && matches_category && matches_kind
    }

    pub fn apply<'a>(&self, transactions: &'a [Transaction]) -> Vec<&'a Transaction> {
        transactions.iter().filter(|tx| self.matches(tx)).collect()
    }

    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty() || self.category.is_some() || self.kind.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, Utc};

    fn tx(id: &str, amount: f64, kind: TransactionKind, category: &str, date: DateTime<Utc>) -> Transaction {
        Transaction {
            id: id.to_string(),
            title: format!("{} {}", category, id),
            amount,
            kind,
            category: category.to_string(),
            date,
            description: None,
        }
    }

    fn march(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap()
    }

    fn fixture() -> Vec<Transaction> {
        vec![
            tx("1", 3500.0, TransactionKind::Income, "Salary", march(14)),
            tx("2", 250.0, TransactionKind::Expense, "Food", march(13)),
            tx("3", 150.0, TransactionKind::Expense, "Transport", march(12)),
            tx("4", 45.9, TransactionKind::Expense, "Entertainment", march(11)),
            tx("5", 800.0, TransactionKind::Income, "Work", march(10)),
            // Previous month and previous year must not count as "this month"
            tx("6", 100.0, TransactionKind::Expense, "Food", march(1) - Duration::days(3)),
            tx("7", 999.0, TransactionKind::Income, "Work", march(14) - Duration::days(365)),
        ]
    }

    #[test]
    fn test_balance() {
        let txs = fixture();
        let expected = 3500.0 + 800.0 + 999.0 - 250.0 - 150.0 - 45.9 - 100.0;
        assert!((balance(&txs) - expected).abs() < 1e-9);
        assert_eq!(balance(&[]), 0.0);
    }

    #[test]
    fn test_monthly_totals_only_current_month() {
        let txs = fixture();
        let now = march(20);

        assert!((monthly_income(&txs, &now) - 4300.0).abs() < 1e-9);
        assert!((monthly_expenses(&txs, &now) - 445.9).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_totals_respect_now_timezone() {
        // 2025-03-31T23:30Z is already April in UTC+2
        let late = Utc.with_ymd_and_hms(2025, 3, 31, 23, 30, 0).unwrap();
        let txs = vec![tx("1", 10.0, TransactionKind::Expense, "Food", late)];

        let utc_now = march(20);
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let april_now = plus_two.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap();

        assert_eq!(monthly_expenses(&txs, &utc_now), 10.0);
        assert_eq!(monthly_expenses(&txs, &april_now), 10.0);
        assert_eq!(monthly_expenses(&txs, &plus_two.with_ymd_and_hms(2025, 3, 20, 10, 0, 0).unwrap()), 0.0);
    }

    #[test]
    fn test_expenses_by_category_sorted_and_sums_to_100() {
        let breakdown = expenses_by_category(&fixture());

        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown[0].category, "Food");
        assert!((breakdown[0].amount - 350.0).abs() < 1e-9);
        assert_eq!(breakdown[1].category, "Transport");
        assert_eq!(breakdown[2].category, "Entertainment");

        let total: f64 = breakdown.iter().map(|c| c.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_expenses_by_category_without_expenses() {
        let txs = vec![tx("1", 100.0, TransactionKind::Income, "Salary", march(1))];
        assert!(expenses_by_category(&txs).is_empty());
    }

    #[test]
    fn test_goal_progress_guards() {
        assert_eq!(goal_progress(1250.0, 5000.0), 0.25);
        assert_eq!(goal_progress(6000.0, 5000.0), 1.0);
        assert_eq!(goal_progress(100.0, 0.0), 0.0);
        assert_eq!(goal_progress(-10.0, 100.0), 0.0);
        assert_eq!(goal_progress(10.0, f64::NAN), 0.0);
    }

    #[test]
    fn test_progress_tiers() {
        assert_eq!(ProgressTier::from_progress(1.0), ProgressTier::Completed);
        assert_eq!(ProgressTier::from_progress(0.7), ProgressTier::Close);
        assert_eq!(ProgressTier::from_progress(0.69), ProgressTier::InProgress);
    }

    #[test]
    fn test_days_until_deadline() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        assert_eq!(days_until_deadline("2025-07-01", today), Some(30));
        assert_eq!(days_until_deadline("2025-06-01", today), Some(0));
        assert_eq!(days_until_deadline("2025-05-31", today), Some(-1));
        assert_eq!(days_until_deadline("2025-07-01T00:00:00Z", today), Some(30));
        assert_eq!(days_until_deadline("someday", today), None);

        assert_eq!(DeadlineStatus::from_days(-1), DeadlineStatus::Overdue);
        assert_eq!(DeadlineStatus::from_days(30), DeadlineStatus::Approaching);
        assert_eq!(DeadlineStatus::from_days(31), DeadlineStatus::OnTrack);
    }

    #[test]
    fn test_goal_report() {
        let goal = Goal {
            id: "1".to_string(),
            title: "Trip".to_string(),
            target_amount: 3000.0,
            current_amount: 2400.0,
            deadline: "2025-06-15".to_string(),
            description: None,
            created_at: march(1),
        };
        let report = GoalReport::for_goal(&goal, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());

        assert!((report.progress - 0.8).abs() < 1e-9);
        assert_eq!(report.tier, ProgressTier::Close);
        assert_eq!(report.days_left, Some(14));
        assert_eq!(report.deadline_status, Some(DeadlineStatus::Approaching));
    }

    #[test]
    fn test_transaction_filter() {
        let txs = fixture();

        let by_query = TransactionFilter {
            query: "FOOD".to_string(),
            ..Default::default()
        };
        assert_eq!(by_query.apply(&txs).len(), 2);

        let by_kind_and_category = TransactionFilter {
            query: String::new(),
            category: Some("Work".to_string()),
            kind: Some(TransactionKind::Income),
        };
        assert_eq!(by_kind_and_category.apply(&txs).len(), 2);
        assert!(by_kind_and_category.is_active());

        assert_eq!(TransactionFilter::default().apply(&txs).len(), txs.len());
        assert!(!TransactionFilter::default().is_active());
    }

    #[test]
    fn test_stats_and_dashboard_summary() {
        let txs = fixture();
        let summary = DashboardSummary::build(&txs, &march(20));
        let settings_stats = stats(&txs, &[]);

        assert_eq!(summary.balance, settings_stats.total_value);
        assert_eq!(summary.top_categories(2).len(), 2);
        assert_eq!(summary.top_categories(10).len(), 3);
        assert_eq!(settings_stats.transaction_count, 7);
        assert_eq!(settings_stats.goal_count, 0);
    }
}
