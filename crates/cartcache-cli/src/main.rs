//! cartcache - inspect the local cart cache.
//!
//! Reads the same SQLite file the ordering client writes, so a cart can be
//! checked or repaired without starting the client.
//!
//! Usage:
//!   cartcache [show]     print the persisted cart rows and last order
//!   cartcache restore    restore against the live catalog and print the result
//!   cartcache clear      empty the cart and last order

use std::io;

use anyhow::{Context, Result};
use cartcache_core::{CacheManager, CatalogClient, Config};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::load()?;
    let manager = CacheManager::from_config(&config)?;
    info!(path = ?manager.store().path(), "cartcache starting");

    let command = std::env::args().nth(1).unwrap_or_else(|| "show".to_string());
    match command.as_str() {
        "show" => show(&manager),
        "restore" => restore(&manager, &config).await,
        "clear" => clear(&manager),
        "-h" | "--help" | "help" => {
            print_usage();
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {}", other)
        }
    }
}

fn print_usage() {
    eprintln!("Usage: cartcache [show|restore|clear]");
    eprintln!();
    eprintln!("  show      print the persisted cart rows and last order");
    eprintln!("  restore   restore against the catalog (CARTCACHE_CATALOG_URL)");
    eprintln!("  clear     empty the cart and last order");
}

/// Print what is on disk, without resolving against the catalog
fn show(manager: &CacheManager) -> Result<()> {
    let rows = manager.store().load_cart()?;
    println!("Cart ({} rows)", rows.len());
    for row in &rows {
        println!(
            "  {:<36}  {:<24}  x{:<3}  ${:.2}",
            row.id, row.item_name, row.quantity, row.item_cost
        );
    }

    let lines = manager.store().load_last_order()?;
    if lines.is_empty() {
        println!("Last order: none");
    } else {
        println!("Last order ({} lines, placed {})", lines.len(), lines[0].placed_at);
        for line in &lines {
            println!("  {:<24}  x{}", line.item_name, line.quantity);
        }
    }
    Ok(())
}

async fn restore(manager: &CacheManager, config: &Config) -> Result<()> {
    let url = config
        .catalog_url
        .as_deref()
        .context("No catalog URL configured (set CARTCACHE_CATALOG_URL)")?;
    let client = CatalogClient::new(url)?;

    let report = manager.restore_all(&client).await?;
    println!(
        "Cart: {} restored, {} dropped",
        report.cart.restored, report.cart.dropped
    );
    for entry in manager.get_all_cart_items() {
        println!(
            "  {:<36}  {:<24}  x{:<3}  ${:.2}",
            entry.id,
            entry.item.name,
            entry.quantity,
            entry.line_total()
        );
    }
    println!("  total ${:.2}", manager.cart_total());

    match manager.get_last_order() {
        Some(order) => println!(
            "Last order: {} items, {}",
            order.total_quantity(),
            order.age_display()
        ),
        None => println!("Last order: none"),
    }
    if let Some(favorite) = manager.get_favorite_item() {
        println!("Favorite: {} (ordered {} times)", favorite.name, favorite.times_ordered);
    }
    Ok(())
}

fn clear(manager: &CacheManager) -> Result<()> {
    manager.reset()?;
    println!("Cleared cart and last order");
    Ok(())
}
