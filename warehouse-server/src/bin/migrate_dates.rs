//! Rewrite every stored date into `YYYY-MM-DD`
//!
//! Unparseable values are reported and left untouched. Safe to re-run.

use clap::Parser;
use warehouse_server::db::DbService;
use warehouse_server::db::date_migration::normalize_dates;
use warehouse_server::init_logger;

#[derive(Debug, Parser)]
#[command(name = "migrate-dates", about = "Normalize date columns to YYYY-MM-DD")]
struct Args {
    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "./warehouse.db")]
    database: String,

    /// Report what would change without writing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_logger("info", false)?;

    tracing::info!(database = %args.database, dry_run = args.dry_run, "Starting date migration");

    let db = DbService::new(&args.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", args.database, e))?;

    let report = normalize_dates(&db.pool, args.dry_run).await;
    db.pool.close().await;

    let verb = if args.dry_run { "would update" } else { "updated" };
    println!(
        "{} values read, {} {}, {} skipped",
        report.total_read(),
        verb,
        report.total_updated(),
        report.total_skipped()
    );
    Ok(())
}
