// 📒 Domain Models - Transactions, savings goals and the local user
//
// Field names serialize in camelCase so the persisted JSON keeps the
// layout the app has always written: id, title, amount, type, category,
// date, description / targetAmount, currentAmount, deadline, createdAt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// TRANSACTION KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in
    Income,

    /// Money going out
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }

    /// Contribution of one unit of this kind to the balance
    pub fn sign(&self) -> f64 {
        match self {
            TransactionKind::Income => 1.0,
            TransactionKind::Expense => -1.0,
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            TransactionKind::Income => TransactionKind::Expense,
            TransactionKind::Expense => TransactionKind::Income,
        }
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

/// A single recorded income or expense event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Millisecond timestamp string assigned at creation
    pub id: String,

    pub title: String,

    /// Always positive; direction comes from `kind`
    pub amount: f64,

    #[serde(rename = "type")]
    pub kind: TransactionKind,

    /// Free-form category name
    pub category: String,

    /// When the transaction was recorded
    pub date: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Transaction {
    /// Signed contribution to the balance
    pub fn signed_amount(&self) -> f64 {
        self.kind.sign() * self.amount
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    /// Shallow merge: only fields present in the patch are replaced
    pub fn apply(&mut self, patch: TransactionPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
    }
}

/// What the user submits; the store fills in id and date.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub title: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category: String,
    pub description: Option<String>,
}

/// Partial update for an existing transaction.
///
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub description: Option<Option<String>>,
}

// ============================================================================
// GOAL
// ============================================================================

/// A savings target with a deadline.
///
/// `current_amount` is never derived from transactions; it only moves when
/// the user edits or contributes to the goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,

    /// Date string, `YYYY-MM-DD`
    pub deadline: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Goal {
    pub fn apply(&mut self, patch: GoalPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(target_amount) = patch.target_amount {
            self.target_amount = target_amount;
        }
        if let Some(current_amount) = patch.current_amount {
            self.current_amount = current_amount;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
    }

    pub fn is_achieved(&self) -> bool {
        self.target_amount > 0.0 && self.current_amount >= self.target_amount
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalDraft {
    pub title: String,
    pub target_amount: f64,
    pub deadline: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub deadline: Option<String>,
    pub description: Option<Option<String>>,
}

// ============================================================================
// USER
// ============================================================================

/// Display name only; there is no identity or authentication behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        User { name: name.into() }
    }
}
