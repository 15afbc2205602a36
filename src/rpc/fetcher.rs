// DANS : src/rpc/fetcher.rs

use crate::error::FetchError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use solana_account_decoder::{UiAccountData, UiAccountEncoding};
use solana_sdk::pubkey::Pubkey;

/// Le seul service dont le builder a besoin : les octets bruts d'un compte.
#[async_trait]
pub trait AccountFetcher: Send + Sync {
    async fn fetch_account_bytes(&self, address: &Pubkey) -> Result<Vec<u8>, FetchError>;
}

/// Transforme le champ `data` d'une réponse getAccountInfo (`[<base64>, "base64"]`) en octets.
pub fn decode_base64_account_data(address: &Pubkey, data: &UiAccountData) -> Result<Vec<u8>, FetchError> {
    let encoded = match data {
        UiAccountData::Binary(encoded, UiAccountEncoding::Base64) => encoded,
        other => {
            return Err(FetchError::Rpc {
                address: *address,
                message: format!("encodage inattendu : {:?}", other),
            });
        }
    };
    STANDARD.decode(encoded).map_err(|e| FetchError::Rpc {
        address: *address,
        message: format!("base64 invalide : {}", e),
    })
}
