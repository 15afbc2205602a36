use anyhow::{Context, Result};
use serde::Deserialize;

fn default_rpc_max_retries() -> u8 {
    3
}

fn default_rpc_retry_delay_ms() -> u64 {
    500
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub solana_rpc_url: String,
    #[serde(default = "default_rpc_max_retries")]
    pub rpc_max_retries: u8,
    #[serde(default = "default_rpc_retry_delay_ms")]
    pub rpc_retry_delay_ms: u64,
    /// Marché par défaut du binaire `market_snapshot`.
    #[serde(default)]
    pub market_address: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).context("Configuration invalide (SOLANA_RPC_URL est obligatoire)")
    }
}
