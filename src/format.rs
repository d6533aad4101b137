// 🪙 Formatting - currency, dates, greetings and text fitting

use crate::models::TransactionKind;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub thousands_separator: String,
    pub decimal_separator: String,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        CurrencyFormat {
            symbol: "R$".to_string(),
            thousands_separator: ".".to_string(),
            decimal_separator: ",".to_string(),
        }
    }
}

impl CurrencyFormat {
    /// `1234.5` → `R$ 1.234,50`, `-3` → `-R$ 3,00`
    pub fn format(&self, value: f64) -> String {
        let cents = (value.abs() * 100.0).round() as u64;
        let whole = group_thousands(cents / 100, &self.thousands_separator);
        let sign = if value < 0.0 && cents > 0 { "-" } else { "" };

        format!(
            "{}{} {}{}{:02}",
            sign,
            self.symbol,
            whole,
            self.decimal_separator,
            cents % 100
        )
    }

    /// Amount prefixed with + or - according to the transaction kind
    pub fn format_signed(&self, kind: TransactionKind, amount: f64) -> String {
        let prefix = match kind {
            TransactionKind::Income => "+",
            TransactionKind::Expense => "-",
        };
        format!("{}{}", prefix, self.format(amount.abs()))
    }
}

/// Format with the default `R$` layout
pub fn format_currency(value: f64) -> String {
    CurrencyFormat::default().format(value)
}

fn group_thousands(mut value: u64, separator: &str) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut groups = Vec::new();
    while value > 0 {
        groups.push(value % 1000);
        value /= 1000;
    }

    let mut out = groups.pop().map(|g| g.to_string()).unwrap_or_default();
    while let Some(group) = groups.pop() {
        out.push_str(separator);
        out.push_str(&format!("{:03}", group));
    }
    out
}

/// `dd/mm/yyyy` in the timezone of the given timestamp
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%d/%m/%Y").to_string()
}

/// Goal deadlines are stored as `YYYY-MM-DD`; unparseable ones are shown as-is
pub fn format_deadline(deadline: &str) -> String {
    crate::analytics::parse_deadline(deadline)
        .map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| deadline.to_string())
}

pub fn greeting(hour: u32) -> &'static str {
    if hour < 12 {
        "Good morning"
    } else if hour < 18 {
        "Good afternoon"
    } else {
        "Good evening"
    }
}

/// Avatar letter for a display name
pub fn initial(name: Option<&str>) -> String {
    name.and_then(|n| n.trim().chars().next())
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "U".to_string())
}

/// Cut to `max_len` characters, marking the cut with "..."
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if !current_line.is_empty()
            && current_line.chars().count() + word.chars().count() + 1 > width
        {
            lines.push(std::mem::take(&mut current_line));
        }
        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_currency_format() {
        let brl = CurrencyFormat::default();

        assert_eq!(brl.format(0.0), "R$ 0,00");
        assert_eq!(brl.format(45.9), "R$ 45,90");
        assert_eq!(brl.format(1234.5), "R$ 1.234,50");
        assert_eq!(brl.format(1_000_000.0), "R$ 1.000.000,00");
        assert_eq!(brl.format(-3854.1), "-R$ 3.854,10");
        assert_eq!(brl.format(-0.001), "R$ 0,00");
        assert_eq!(format_currency(1234.56), "R$ 1.234,56");
    }

    #[test]
    fn test_currency_format_custom() {
        let usd = CurrencyFormat {
            symbol: "$".to_string(),
            thousands_separator: ",".to_string(),
            decimal_separator: ".".to_string(),
        };
        assert_eq!(usd.format(1234.56), "$ 1,234.56");
        assert_eq!(usd.format_signed(TransactionKind::Expense, 10.0), "-$ 10.00");
        assert_eq!(usd.format_signed(TransactionKind::Income, 10.0), "+$ 10.00");
    }

    #[test]
    fn test_dates() {
        let date = Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap();
        assert_eq!(format_date(&date), "04/03/2025");
        assert_eq!(format_deadline("2025-12-31"), "31/12/2025");
        assert_eq!(format_deadline("soon"), "soon");
    }

    #[test]
    fn test_greeting_boundaries() {
        assert_eq!(greeting(0), "Good morning");
        assert_eq!(greeting(11), "Good morning");
        assert_eq!(greeting(12), "Good afternoon");
        assert_eq!(greeting(17), "Good afternoon");
        assert_eq!(greeting(18), "Good evening");
    }

    #[test]
    fn test_initial() {
        assert_eq!(initial(Some("ana")), "A");
        assert_eq!(initial(Some("  ")), "U");
        assert_eq!(initial(None), "U");
    }

    #[test]
    fn test_truncate_and_wrap() {
        assert_eq!(truncate("Supermarket", 20), "Supermarket");
        assert_eq!(truncate("Supermarket", 8), "Super...");
        assert_eq!(truncate("Alimentação diária", 10), "Aliment...");

        let lines = wrap_text("Money set aside for emergencies only", 12);
        assert_eq!(lines, vec!["Money set", "aside for", "emergencies", "only"]);
    }
}
