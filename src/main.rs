use anyhow::{bail, Context, Result};
use std::env;
use std::path::Path;

use prestige::config::db_path_from_env;
use prestige::telemetry::init_tracing;
use prestige::{check_integrity, import_companies, list_ranked, load_csv, SqliteStore};

const USAGE: &str = "\
Usage: prestige <command>

Commands:
  import <companies.csv>   add companies (header: company,image)
  rankings                 print the leaderboard
  check                    report inconsistent statistics

Database: $PRESTIGE_DB_PATH (default prestige.db)";

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("import") => match args.get(2) {
            Some(csv_path) => run_import(Path::new(csv_path)),
            None => bail!("import needs a CSV path\n\n{}", USAGE),
        },
        Some("rankings") => run_rankings(),
        Some("check") => run_check(),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn open_store() -> Result<SqliteStore> {
    let db_path = db_path_from_env();
    SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))
}

fn run_import(csv_path: &Path) -> Result<()> {
    let companies = load_csv(csv_path)?;
    println!("Loaded {} companies from {}", companies.len(), csv_path.display());

    let store = open_store()?;
    let summary = import_companies(&store, &companies)?;

    println!("Inserted: {}", summary.inserted);
    println!("Already present: {}", summary.skipped);
    Ok(())
}

fn run_rankings() -> Result<()> {
    let store = open_store()?;
    let ranked = list_ranked(&store).context("Failed to compute rankings")?;

    println!("{:>4}  {:<32} {:>7} {:>5} {:>6} {:>7}", "#", "Company", "Matches", "Wins", "Losses", "Winrate");
    for company in &ranked {
        println!(
            "{:>4}  {:<32} {:>7} {:>5} {:>6} {:>6.1}%",
            company.rank,
            company.name,
            company.matches,
            company.wins,
            company.losses,
            company.winrate * 100.0
        );
    }
    Ok(())
}

fn run_check() -> Result<()> {
    let store = open_store()?;
    let report = check_integrity(&store)?;

    println!("{}", report.summary());
    for issue in &report.issues {
        println!("  - {}", issue.describe());
    }

    if !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}
