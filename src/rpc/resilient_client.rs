use super::fetcher::{decode_base64_account_data, AccountFetcher};
use crate::config::Config;
use crate::error::FetchError;
use async_trait::async_trait;
use solana_account_decoder::{UiAccount, UiAccountEncoding};
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_config::RpcAccountInfoConfig,
    rpc_request::RpcRequest,
    rpc_response::Response as RpcResponse,
};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::{sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::warn;

/// Un "wrapper" autour du RpcClient de Solana qui ajoute une logique de
/// ré-essai automatique pour les appels RPC qui échouent à cause d'erreurs réseau temporaires.
#[derive(Clone)]
pub struct ResilientRpcClient {
    client: Arc<RpcClient>,
    max_retries: u8,
    delay_ms: u64,
}

impl ResilientRpcClient {
    /// Construit un nouveau client RPC résilient.
    pub fn new(rpc_url: String, max_retries: u8, delay_ms: u64) -> Self {
        Self {
            client: Arc::new(RpcClient::new(rpc_url)),
            max_retries,
            delay_ms,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.solana_rpc_url.clone(), config.rpc_max_retries, config.rpc_retry_delay_ms)
    }

    pub fn commitment(&self) -> CommitmentConfig {
        self.client.commitment()
    }

    /// Détermine si une erreur du client est temporaire et si une nouvelle tentative doit être effectuée.
    fn is_retryable(error: &ClientError) -> bool {
        matches!(
            error.kind(),
            ClientErrorKind::Reqwest(_) | ClientErrorKind::RpcError(_) | ClientErrorKind::Io(_)
        )
    }

    fn to_fetch_error(address: &Pubkey, error: &ClientError) -> FetchError {
        match error.kind() {
            ClientErrorKind::Reqwest(_) | ClientErrorKind::Io(_) => FetchError::Transport {
                address: *address,
                message: error.to_string(),
            },
            _ => FetchError::Rpc {
                address: *address,
                message: error.to_string(),
            },
        }
    }

    /// getAccountInfo en base64, avec ré-essais. `None` si le compte n'existe pas.
    pub async fn get_ui_account(&self, pubkey: &Pubkey) -> Result<Option<UiAccount>, FetchError> {
        let config = RpcAccountInfoConfig {
            encoding: Some(UiAccountEncoding::Base64),
            commitment: Some(self.client.commitment()),
            ..RpcAccountInfoConfig::default()
        };
        let params = serde_json::json!([pubkey.to_string(), config]);

        let mut attempt = 0;
        loop {
            let result: Result<RpcResponse<Option<UiAccount>>, ClientError> =
                self.client.send(RpcRequest::GetAccountInfo, params.clone()).await;
            match result {
                Ok(response) => return Ok(response.value),
                Err(e) if Self::is_retryable(&e) && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(%pubkey, attempt, error = %e, "getAccountInfo échoué, nouvelle tentative");
                    sleep(Duration::from_millis(self.delay_ms)).await;
                }
                Err(e) => return Err(Self::to_fetch_error(pubkey, &e)),
            }
        }
    }
}

#[async_trait]
impl AccountFetcher for ResilientRpcClient {
    async fn fetch_account_bytes(&self, address: &Pubkey) -> Result<Vec<u8>, FetchError> {
        let account = self
            .get_ui_account(address)
            .await?
            .ok_or(FetchError::NotFound(*address))?;
        decode_base64_account_data(address, &account.data)
    }
}
