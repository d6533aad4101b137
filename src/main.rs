// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::Local;
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

use fintrackr::format::format_date;
use fintrackr::{export_json, export_transactions_csv, AppConfig, FinanceStore, SqliteStorage};

const USAGE: &str = "Usage: fintrackr [--config PATH] [summary | export json|csv PATH | reset]";

#[derive(Debug, PartialEq)]
enum Command {
    Ui,
    Summary,
    Export { format: ExportFormat, path: PathBuf },
    Reset,
    Help,
}

#[derive(Debug, PartialEq)]
enum ExportFormat {
    Json,
    Csv,
}

#[derive(Debug, PartialEq)]
struct Cli {
    config: Option<PathBuf>,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Cli> {
    let mut config = None;
    let mut rest = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = iter.next().context("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                return Ok(Cli {
                    config,
                    command: Command::Help,
                })
            }
            _ => rest.push(arg.as_str()),
        }
    }

    let command = match rest.as_slice() {
        [] => Command::Ui,
        ["summary"] => Command::Summary,
        ["reset"] => Command::Reset,
        ["export", format, path] => {
            let format = match *format {
                "json" => ExportFormat::Json,
                "csv" => ExportFormat::Csv,
                other => bail!("Unknown export format '{}' (expected json or csv)", other),
            };
            Command::Export {
                format,
                path: PathBuf::from(path),
            }
        }
        other => bail!("Unknown command: {}\n{}", other.join(" "), USAGE),
    };

    Ok(Cli { config, command })
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    if cli.command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = AppConfig::load(cli.config.as_deref())?;
    let warnings = config.validate();

    let _guard = fintrackr::logging::init(&config)?;
    for warning in &warnings {
        warn!("Config: {}", warning);
    }
    info!(version = fintrackr::VERSION, command = ?cli.command, "Starting FinTrackr");

    let db_path = config.database_path();
    let storage = SqliteStorage::open(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    let mut store = FinanceStore::open(storage);

    match cli.command {
        Command::Ui => run_ui_mode(store, config)?,
        Command::Summary => run_summary(&store, &config),
        Command::Export { format, path } => {
            match format {
                ExportFormat::Json => export_json(store.state(), &path)?,
                ExportFormat::Csv => export_transactions_csv(store.transactions(), &path)?,
            }
            println!("✓ Exported to {}", path.display());
        }
        Command::Reset => {
            store.clear_all();
            println!("✓ All data cleared from {}", db_path.display());
        }
        Command::Help => {}
    }

    Ok(())
}

fn run_summary(store: &FinanceStore<SqliteStorage>, config: &AppConfig) {
    let now = Local::now();
    let summary = store.dashboard(&now);
    let money = &config.currency;

    println!("💰 FinTrackr - {}", format_date(&now));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if let Some(user) = store.user() {
        println!("👤 {}", user.name);
    }
    println!("Balance:           {:>16}", money.format(summary.balance));
    println!("Income (month):    {:>16}", money.format(summary.monthly_income));
    println!("Expenses (month):  {:>16}", money.format(summary.monthly_expenses));

    if summary.by_category.is_empty() {
        println!("\nNo expenses recorded.");
    } else {
        println!("\n📊 Expenses by category");
        for category in &summary.by_category {
            println!(
                "  {:<16} {:>16} {:>5.1}%",
                category.category,
                money.format(category.amount),
                category.percentage
            );
        }
    }

    let stats = store.stats();
    println!(
        "\n{} transactions · {} goals",
        stats.transaction_count, stats.goal_count
    );
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: FinanceStore<SqliteStorage>, config: AppConfig) -> Result<()> {
    let mut app = ui::App::new(store, config);
    ui::run_ui(&mut app)?;
    info!("UI closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: FinanceStore<SqliteStorage>, _config: AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: fintrackr summary");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_default_is_ui() {
        let cli = parse_args(&args(&[])).unwrap();
        assert_eq!(cli.command, Command::Ui);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_parse_commands() {
        let cli = parse_args(&args(&["--config", "/tmp/c.json", "summary"])).unwrap();
        assert_eq!(cli.command, Command::Summary);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));

        let cli = parse_args(&args(&["export", "csv", "out.csv"])).unwrap();
        assert_eq!(
            cli.command,
            Command::Export {
                format: ExportFormat::Csv,
                path: PathBuf::from("out.csv")
            }
        );

        assert_eq!(parse_args(&args(&["reset"])).unwrap().command, Command::Reset);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&args(&["export", "xml", "out.xml"])).is_err());
        assert!(parse_args(&args(&["--config"])).is_err());
        assert!(parse_args(&args(&["frobnicate"])).is_err());
    }
}
