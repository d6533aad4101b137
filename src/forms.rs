// 📝 Forms - input state and validation for login, transactions and goals
//
// Validation failures are reported per field so the UI can show them
// inline next to the offending input. Nothing here touches the store.

use crate::models::{
    Goal, GoalDraft, GoalPatch, Transaction, TransactionDraft, TransactionKind, TransactionPatch,
    User,
};
use chrono::NaiveDate;
use thiserror::Error;

pub const EXPENSE_CATEGORIES: [&str; 8] = [
    "Food",
    "Transport",
    "Entertainment",
    "Health",
    "Education",
    "Housing",
    "Shopping",
    "Other",
];

pub const INCOME_CATEGORIES: [&str; 5] = ["Salary", "Work", "Investment", "Sale", "Other"];

/// Longest amount the cents input accepts (999.999.999.999,99 fits)
const MAX_AMOUNT_DIGITS: usize = 14;

pub fn categories_for(kind: TransactionKind) -> &'static [&'static str] {
    match kind {
        TransactionKind::Income => &INCOME_CATEGORIES,
        TransactionKind::Expense => &EXPENSE_CATEGORIES,
    }
}

/// Every category either kind offers, without duplicates
pub fn all_categories() -> Vec<&'static str> {
    let mut all: Vec<&'static str> = EXPENSE_CATEGORIES.to_vec();
    for category in INCOME_CATEGORIES {
        if !all.contains(&category) {
            all.push(category);
        }
    }
    all
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("{0} must be a number")]
    NotANumber(&'static str),

    #[error("{0} must be a date in YYYY-MM-DD format")]
    InvalidDate(&'static str),
}

/// Field errors in the order the fields appear on screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) need attention", .errors.len())]
pub struct FormErrors {
    errors: Vec<(&'static str, FieldError)>,
}

impl FormErrors {
    pub fn push(&mut self, field: &'static str, error: FieldError) {
        self.errors.push((field, error));
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.errors
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, error)| error)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, FieldError)> {
        self.errors.iter()
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

/// Parse a user-typed amount. Accepts `,` as the decimal separator.
pub fn parse_amount(input: &str, field: &'static str) -> Result<f64, FieldError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Required(field));
    }

    let normalized = trimmed.replace(',', ".");
    let value: f64 = normalized
        .parse()
        .map_err(|_| FieldError::NotANumber(field))?;

    if !value.is_finite() || value <= 0.0 {
        return Err(FieldError::NotPositive(field));
    }
    Ok(value)
}

fn optional_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ============================================================================
// LOGIN
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub name: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<User, FormErrors> {
        let name = self.name.trim();
        let mut errors = FormErrors::default();
        if name.is_empty() {
            errors.push("name", FieldError::Required("Name"));
        }
        errors.into_result(|| User::new(name))
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

/// Transaction entry form.
///
/// The amount is typed as digits only and read as cents, so "12345" is
/// 123.45, like a banking app keypad.
#[derive(Debug, Clone)]
pub struct TransactionForm {
    pub kind: TransactionKind,
    pub title: String,
    pub amount_digits: String,
    pub category: Option<String>,
    pub description: String,
}

impl Default for TransactionForm {
    fn default() -> Self {
        TransactionForm {
            kind: TransactionKind::Expense,
            title: String::new(),
            amount_digits: String::new(),
            category: None,
            description: String::new(),
        }
    }
}

impl TransactionForm {
    /// Prefill from an existing transaction for editing
    pub fn from_transaction(tx: &Transaction) -> Self {
        let cents = (tx.amount * 100.0).round().max(0.0) as u64;
        TransactionForm {
            kind: tx.kind,
            title: tx.title.clone(),
            amount_digits: if cents == 0 { String::new() } else { cents.to_string() },
            category: Some(tx.category.clone()),
            description: tx.description.clone().unwrap_or_default(),
        }
    }

    /// Append a digit to the amount; anything else is ignored
    pub fn push_digit(&mut self, c: char) -> bool {
        if !c.is_ascii_digit() || self.amount_digits.len() >= MAX_AMOUNT_DIGITS {
            return false;
        }
        if self.amount_digits.is_empty() && c == '0' {
            return false;
        }
        self.amount_digits.push(c);
        true
    }

    pub fn pop_digit(&mut self) {
        self.amount_digits.pop();
    }

    pub fn amount(&self) -> f64 {
        self.amount_digits
            .parse::<u64>()
            .map(|cents| cents as f64 / 100.0)
            .unwrap_or(0.0)
    }

    /// Switching kind drops a category the new kind does not offer
    pub fn set_kind(&mut self, kind: TransactionKind) {
        self.kind = kind;
        let keep = self
            .category
            .as_deref()
            .map_or(false, |category| categories_for(kind).contains(&category));
        if !keep {
            self.category = None;
        }
    }

    pub fn toggle_kind(&mut self) {
        self.set_kind(self.kind.toggle());
    }

    /// Step through the category list for the current kind, wrapping around
    pub fn cycle_category(&mut self, forward: bool) {
        let categories = categories_for(self.kind);
        let current = self
            .category
            .as_deref()
            .and_then(|category| categories.iter().position(|c| *c == category));

        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => categories.len() - 1,
            (Some(i), true) => (i + 1) % categories.len(),
            (Some(i), false) => (i + categories.len() - 1) % categories.len(),
        };
        self.category = Some(categories[next].to_string());
    }

    /// Mirrors the disabled state of the submit button
    pub fn is_submittable(&self) -> bool {
        !self.title.trim().is_empty() && !self.amount_digits.is_empty() && self.category.is_some()
    }

    pub fn validate(&self) -> Result<TransactionDraft, FormErrors> {
        let mut errors = FormErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push("title", FieldError::Required("Title"));
        }

        let amount = self.amount();
        if amount <= 0.0 {
            errors.push("amount", FieldError::NotPositive("Amount"));
        }

        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty());
        if category.is_none() {
            errors.push("category", FieldError::Required("Category"));
        }

        errors.into_result(|| TransactionDraft {
            title: title.to_string(),
            amount,
            kind: self.kind,
            category: category.unwrap_or_default().to_string(),
            description: optional_text(&self.description),
        })
    }

    /// Full replacement patch for editing an existing transaction
    pub fn validate_patch(&self) -> Result<TransactionPatch, FormErrors> {
        let draft = self.validate()?;
        Ok(TransactionPatch {
            title: Some(draft.title),
            amount: Some(draft.amount),
            kind: Some(draft.kind),
            category: Some(draft.category),
            description: Some(draft.description),
        })
    }
}

// ============================================================================
// GOAL
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct GoalForm {
    pub title: String,
    pub target_input: String,
    pub deadline: String,
    pub description: String,
}

impl GoalForm {
    pub fn from_goal(goal: &Goal) -> Self {
        GoalForm {
            title: goal.title.clone(),
            target_input: format!("{}", goal.target_amount),
            deadline: goal.deadline.clone(),
            description: goal.description.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<GoalDraft, FormErrors> {
        let mut errors = FormErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push("title", FieldError::Required("Title"));
        }

        let target = match parse_amount(&self.target_input, "Target amount") {
            Ok(value) => value,
            Err(err) => {
                errors.push("target", err);
                0.0
            }
        };

        let deadline = self.deadline.trim();
        if deadline.is_empty() {
            errors.push("deadline", FieldError::Required("Deadline"));
        } else if NaiveDate::parse_from_str(deadline, "%Y-%m-%d").is_err() {
            errors.push("deadline", FieldError::InvalidDate("Deadline"));
        }

        errors.into_result(|| GoalDraft {
            title: title.to_string(),
            target_amount: target,
            deadline: deadline.to_string(),
            description: optional_text(&self.description),
        })
    }

    /// Edits leave the saved amount untouched
    pub fn validate_patch(&self) -> Result<GoalPatch, FormErrors> {
        let draft = self.validate()?;
        Ok(GoalPatch {
            title: Some(draft.title),
            target_amount: Some(draft.target_amount),
            current_amount: None,
            deadline: Some(draft.deadline),
            description: Some(draft.description),
        })
    }
}
