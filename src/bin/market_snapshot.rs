// DANS : src/bin/market_snapshot.rs

use anyhow::{Context, Result};
use serum_reader::{
    config::Config,
    data_pipeline::MarketSnapshotBuilder,
    decoders::serum::Market,
    monitoring::logging::setup_logging,
    rpc::ResilientRpcClient,
};
use solana_sdk::pubkey::Pubkey;
use std::{str::FromStr, sync::Arc};
use tracing::info;

// SOL/USDC sur Serum v3.
const DEFAULT_MARKET: &str = "9wFFyRfZBsuAha4YcuxcXLKwMxJR43S7fPfQLusDBzvT";
const FILLS_TO_SHOW: usize = 10;

fn log_fills(market: &Market) {
    let Some(queue) = &market.decoded_event_queue else {
        return;
    };
    info!(
        seq_num = queue.header.seq_num,
        fills = queue.events.len(),
        traders = queue.open_orders_accounts.len(),
        "Event Queue"
    );
    for event in queue.events.iter().take(FILLS_TO_SHOW) {
        info!(
            side = ?event.side(),
            maker = event.is_maker(),
            price = event.price,
            quantity = event.quantity,
            open_orders = %event.open_orders,
            order_id = %hex::encode(event.order_id.to_le_bytes()),
            "Fill"
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;
    let config = Config::load()?;

    // Priorité : argument CLI, puis MARKET_ADDRESS, puis SOL/USDC.
    let market_str = std::env::args()
        .nth(1)
        .or_else(|| config.market_address.clone())
        .unwrap_or_else(|| DEFAULT_MARKET.to_string());
    let market_address = Pubkey::from_str(&market_str)
        .with_context(|| format!("Adresse de marché invalide : {}", market_str))?;

    info!(market = %market_address, rpc = %config.solana_rpc_url, "--- Snapshot de marché Serum ---");
    let rpc_client = Arc::new(ResilientRpcClient::from_config(&config));

    let mut builder = MarketSnapshotBuilder::new(rpc_client, market_address)
        .with_order_books(true)
        .with_event_queue(true);

    info!("[1/2] Construction du snapshot...");
    let mut market = builder.build().await?;
    info!(
        base_mint = %market.base_mint,
        quote_mint = %market.quote_mint,
        tick_size = market.tick_size(),
        min_order_size = market.min_order_size(),
        fee_rate = market.fee_rate(),
        "Marché décodé"
    );
    log_fills(&market);

    info!("[2/2] Rechargement des champs vivants...");
    builder.reload(&mut market).await?;
    log_fills(&market);

    println!("{}", serde_json::to_string_pretty(&market)?);
    Ok(())
}
