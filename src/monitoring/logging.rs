// DANS : src/monitoring/logging.rs
use anyhow::{anyhow, Result};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Par défaut : `info` partout, `debug` pour nos propres décodeurs.
pub const DEFAULT_LOG_FILTER: &str = "info,serum_reader=debug";

pub fn setup_logging() -> Result<()> {
    // RUST_LOG prend le dessus s'il est défini.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!("Impossible d'installer le subscriber tracing : {}", e))
}
