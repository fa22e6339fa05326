//! # Seed Data Generator
//!
//! Populates a database with the standard catalog and a demo session per
//! branch, then prints the fleet summary.
//!
//! ## Usage
//! ```bash
//! # Three branches (default) in ./cashdesk_dev.db
//! cargo run -p cashdesk-db --bin seed
//!
//! # Custom branch count and database path
//! cargo run -p cashdesk-db --bin seed -- --branches 10 --db ./data/cashdesk.db
//!
//! # More detail
//! RUST_LOG=cashdesk_db=debug cargo run -p cashdesk-db --bin seed
//! ```
//!
//! Re-running is safe: the catalog is inserted with `INSERT OR IGNORE` and
//! branches that already have an open register are left alone.

use std::env;
use std::path::PathBuf;

use cashdesk_core::{AggregateFilter, Money, NewMovement};
use cashdesk_db::{CashdeskConfig, Database};
use tracing::info;
use tracing_subscriber::EnvFilter;

// Standard catalog ids
const SALE: i64 = 1;
const CASH_IN: i64 = 3;
const EXPENSE: i64 = 5;
const CASH: i64 = 1;
const CARD: i64 = 2;
const TRANSFER: i64 = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let mut config = CashdeskConfig::from_env()?;
    if env::var("CASHDESK_DB_PATH").is_err() {
        config.database_path = PathBuf::from("./cashdesk_dev.db");
    }
    let mut branches: usize = 3;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--branches" | "-b" => {
                if i + 1 < args.len() {
                    branches = args[i + 1].parse().unwrap_or(3);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Cashdesk Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -b, --branches <N>  Number of demo branches (default: 3)");
                println!("  -d, --db <PATH>     Database file path (default: ./cashdesk_dev.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Cashdesk Seed Data Generator");
    println!("============================");
    println!("Database: {}", config.database_path.display());
    println!("Branches: {}", branches);
    println!();

    let db = Database::new(config.db_config()).await?;

    let inserted = db.catalog().seed_standard(&config.cash_method_name).await?;
    println!("✓ Catalog ready ({} new rows)", inserted);

    let mut branch_ids = Vec::with_capacity(branches);
    for index in 1..=branches {
        let branch_id = format!("branch-{:02}", index);
        branch_ids.push(branch_id.clone());

        if db.sessions().current_for_branch(&branch_id).await?.is_some() {
            println!("  {} already has an open register, skipping", branch_id);
            continue;
        }

        let seed = index as i64;
        let session = db
            .sessions()
            .open(&branch_id, &format!("operator-{:02}", index), Money::from_cents(50_000))
            .await?;

        let demo = [
            NewMovement::new(SALE, CASH, Money::from_cents(12_500 * seed), "Ticket 0001"),
            NewMovement::new(SALE, CARD, Money::from_cents(8_990 + seed), "Ticket 0002"),
            NewMovement::new(SALE, TRANSFER, Money::from_cents(30_000), "Ticket 0003"),
            NewMovement::new(CASH_IN, CASH, Money::from_cents(10_000), "Change float"),
            NewMovement::new(EXPENSE, CASH, Money::from_cents(2_350 * seed), "Cleaning supplies"),
        ];
        for movement in demo {
            db.movements().record(&session.id, movement).await?;
        }

        info!(branch_id = %branch_id, session_id = %session.id, "Demo session opened");
    }

    let summary = db
        .reports()
        .fleet_summary(&AggregateFilter::branches(branch_ids))
        .await?;

    println!();
    println!("{:<12} {:>9} {:>14} {:>14} {:>14}", "Branch", "Sessions", "Expected cash", "Income", "Expense");
    for branch in &summary.branches {
        println!(
            "{:<12} {:>9} {:>14} {:>14} {:>14}",
            branch.branch_id,
            branch.session_count,
            branch.expected_cash.to_string(),
            branch.income.to_string(),
            branch.expense.to_string()
        );
    }
    println!();
    println!("Total expected cash: {}", summary.total_balance);
    println!("Movements:           {}", summary.movement_count);
    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
