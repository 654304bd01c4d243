//! Example: Listing packages and placing a bulk order
//!
//! # Setup
//!
//! 1. Set credentials (or put them in `.env` / `airalo.toml`): ```bash export
//!    AIRALO_CLIENT_ID=... AIRALO_CLIENT_SECRET=... AIRALO_ENV=sandbox ```
//!
//! 2. Run this example: ```bash cargo run --example bulk_orders -- DE ```

use airalo_domain::OrderLine;
use airalo_infra::{init_logging, AiraloClient, LoggingConfig, PackageListing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::from_env());

    let country = std::env::args().nth(1).unwrap_or_else(|| "DE".to_string());
    let client = AiraloClient::from_env().await?;

    let Some(PackageListing::Flat(packages)) =
        client.country_packages(&country, true, Some(10)).await?
    else {
        tracing::warn!(%country, "no packages available");
        return Ok(());
    };

    let lines: Vec<OrderLine> =
        packages.iter().take(3).map(|package| OrderLine::new(package.package_id.clone(), 1)).collect();

    let Some(results) = client.order_bulk(&lines, Some("bulk order example")).await? else {
        return Ok(());
    };

    for (package_id, entry) in results.entries() {
        tracing::info!(%package_id, status = entry.status, "order result");
    }

    if !results.is_complete() {
        tracing::warn!(abandoned = ?results.abandoned(), "some orders were not sent");
    }

    Ok(())
}
