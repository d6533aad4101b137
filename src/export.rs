// 📤 Export - JSON snapshot and CSV transaction dumps

use crate::models::{Goal, Transaction, User};
use crate::store::FinanceState;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Everything the user owns, plus when it was exported
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot<'a> {
    pub user: Option<&'a User>,
    pub transactions: &'a [Transaction],
    pub goals: &'a [Goal],
    pub export_date: DateTime<Utc>,
}

impl<'a> ExportSnapshot<'a> {
    pub fn new(state: &'a FinanceState, export_date: DateTime<Utc>) -> Self {
        ExportSnapshot {
            user: state.user.as_ref(),
            transactions: &state.transactions,
            goals: &state.goals,
            export_date,
        }
    }
}

/// Pretty JSON of the whole state, stamped with `export_date`
pub fn snapshot_json_at(state: &FinanceState, export_date: DateTime<Utc>) -> Result<String> {
    serde_json::to_string_pretty(&ExportSnapshot::new(state, export_date))
        .context("Failed to serialize export snapshot")
}

pub fn snapshot_json(state: &FinanceState) -> Result<String> {
    snapshot_json_at(state, Utc::now())
}

pub fn export_json(state: &FinanceState, path: &Path) -> Result<()> {
    let json = snapshot_json(state)?;
    write_file_atomic(path, json.as_bytes())?;

    info!(
        path = %path.display(),
        transactions = state.transactions.len(),
        goals = state.goals.len(),
        "Exported JSON snapshot"
    );
    Ok(())
}

// ============================================================================
// CSV
// ============================================================================

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    date: String,
    title: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    category: &'a str,
    amount: String,
    description: &'a str,
}

impl<'a> From<&'a Transaction> for CsvRow<'a> {
    fn from(tx: &'a Transaction) -> Self {
        CsvRow {
            id: &tx.id,
            date: tx.date.to_rfc3339(),
            title: &tx.title,
            kind: tx.kind.as_str(),
            category: &tx.category,
            amount: format!("{:.2}", tx.amount),
            description: tx.description.as_deref().unwrap_or(""),
        }
    }
}

/// CSV text with a header row, one line per transaction
pub fn transactions_csv(transactions: &[Transaction]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for tx in transactions {
        writer
            .serialize(CsvRow::from(tx))
            .with_context(|| format!("Failed to write CSV row for transaction {}", tx.id))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

pub fn export_transactions_csv(transactions: &[Transaction], path: &Path) -> Result<()> {
    let csv = transactions_csv(transactions)?;
    write_file_atomic(path, csv.as_bytes())?;

    info!(path = %path.display(), rows = transactions.len(), "Exported transactions CSV");
    Ok(())
}

/// Write next to the target, then rename over it
fn write_file_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let file_name = path
        .file_name()
        .and_then(|v| v.to_str())
        .unwrap_or("export");
    let tmp_path = path.with_file_name(format!("{}.tmp", file_name));

    fs::write(&tmp_path, bytes)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to move export into place at {}", path.display()))?;
    Ok(())
}
