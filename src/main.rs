// Dashboard module only exists with the TUI feature
#[cfg(feature = "tui")]
use university_budget::ui;

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use university_budget::logging::{init_logging, LogTarget};
use university_budget::{format_tk, summary, write_csv_file, DashboardConfig, RecordStore};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config = DashboardConfig::load_default().context("Failed to load configuration")?;

    match args.get(1).map(String::as_str) {
        Some("export") => {
            init_logging(&config, LogTarget::Console)?;
            let dir = args.get(2).map(PathBuf::from).unwrap_or(config.export_dir);
            run_export(dir)?;
        }
        Some("summary") => {
            init_logging(&config, LogTarget::Console)?;
            run_summary(args.iter().any(|a| a == "--json"))?;
        }
        Some("help") | Some("--help") | Some("-h") => print_usage(),
        Some(other) => {
            eprintln!("❌ Unknown command: {}", other);
            print_usage();
            std::process::exit(2);
        }
        None => {
            init_logging(&config, LogTarget::Dashboard)?;
            run_ui_mode(config)?;
        }
    }

    Ok(())
}

fn print_usage() {
    println!("Usage: university-budget [COMMAND]");
    println!();
    println!("  (no command)      Interactive dashboard");
    println!("  export [DIR]      Write university_budget_per_student.csv");
    println!("  summary [--json]  Print per-student budget for each university");
    println!("  help              Show this message");
}

fn run_export(dir: PathBuf) -> Result<()> {
    let store = RecordStore::new();
    let path = write_csv_file(store.records(), &dir)
        .with_context(|| format!("Failed to export CSV to {}", dir.display()))?;

    println!("✓ Exported {} universities to {}", store.len(), path.display());
    Ok(())
}

fn run_summary(json: bool) -> Result<()> {
    let store = RecordStore::new();
    let lines = summary(store.records());

    if json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
        return Ok(());
    }

    for line in lines {
        println!("{:<28} {:>12} / year", line.name, format_tk(line.per_student));
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: DashboardConfig) -> Result<()> {
    let mut app = ui::App::new(RecordStore::new(), config.export_dir);
    ui::run_ui(&mut app)?;

    println!("✅ Dashboard closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: DashboardConfig) -> Result<()> {
    eprintln!("❌ Dashboard not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin budget-server --features server");
    std::process::exit(1);
}
