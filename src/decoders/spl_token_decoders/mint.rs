// src/decoders/spl_token_decoders/mint.rs

use crate::error::{DecodeError, DecodeResult};
use solana_sdk::pubkey::Pubkey;
use spl_token_2022::{extension::StateWithExtensions, state::Mint};

/// Le mint natif (Wrapped SOL) a toujours 9 décimales : pas besoin d'appel RPC.
pub const WRAPPED_SOL_DECIMALS: u8 = 9;

// --- STRUCTURE DE SORTIE PROPRE ---
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMint {
    pub address: Pubkey,
    pub decimals: u8,
    pub supply: u64,
}

/// Vrai pour le mint Wrapped SOL (comparaison par valeur).
pub fn is_wrapped_sol(mint: &Pubkey) -> bool {
    *mint == spl_token::native_mint::id()
}

/// Décode les données brutes d'un compte de mint (SPL Token ou Token-2022).
pub fn decode_mint(address: &Pubkey, data: &[u8]) -> DecodeResult<DecodedMint> {
    // StateWithExtensions lit à la fois les anciens mints (82 octets) et ceux avec extensions.
    let mint_state = StateWithExtensions::<Mint>::unpack(data).map_err(|e| DecodeError::InvalidMint {
        mint: *address,
        reason: e.to_string(),
    })?;

    Ok(DecodedMint {
        address: *address,
        decimals: mint_state.base.decimals,
        supply: mint_state.base.supply,
    })
}
