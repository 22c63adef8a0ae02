use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use warehouse_api::{
    config, db,
    events::EventSender,
    services::{
        grn::{parse_price_table, GrnService},
        master_list::MasterListService,
    },
};

/// Fills in unit prices on stored receipt items from a price sheet export.
#[derive(Parser)]
#[command(name = "backfill-amounts", version)]
struct Cli {
    #[arg(
        long,
        help = "JSON array of {\"Item No.\", \"Amount\"} rows exported from the price sheet"
    )]
    prices: PathBuf,
    #[arg(long, help = "Database URL; defaults to the configured database_url")]
    database_url: Option<String>,
    #[arg(long, help = "Only report how many prices were read")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }

    let raw = fs::read_to_string(&cli.prices)
        .with_context(|| format!("failed to read {}", cli.prices.display()))?;
    let table: serde_json::Value =
        serde_json::from_str(&raw).context("price file is not valid JSON")?;
    let prices = parse_price_table(&table)?;
    info!(prices = prices.len(), "Price table loaded");

    if cli.dry_run {
        println!("{} prices read; no receipts changed", prices.len());
        return Ok(());
    }

    let pool = Arc::new(
        db::establish_connection_from_app_config(&cfg)
            .await
            .context("failed to connect to the database")?,
    );
    let (event_tx, _event_rx) = mpsc::channel(cfg.event_channel_capacity);
    let event_sender = Arc::new(EventSender::new(event_tx));
    let master_list = Arc::new(MasterListService::new(pool.clone(), event_sender.clone()));
    let grns = GrnService::new(pool, event_sender, master_list);

    let updated = grns.backfill_amounts(&prices).await?;
    println!("Updated {} receipt items", updated);
    Ok(())
}
