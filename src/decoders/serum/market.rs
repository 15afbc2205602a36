// DANS : src/decoders/serum/market.rs

use super::account_flags::{decode_account_flags, AccountFlags, AccountKind, ACCOUNT_FLAGS_OFFSET};
use super::event_queue::EventQueue;
use super::math::MarketScale;
use super::order_book::OrderBookSide;
use crate::error::{DecodeError, DecodeResult};
use bytemuck::{from_bytes, Pod, Zeroable};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::mem::size_of;

// --- STRUCTURE DE SORTIE PROPRE ---
// Les champs fixes du compte Market, plus les données "vivantes" optionnelles
// (carnets, event queue) et les décimales récupérées sur les mints.
#[derive(Debug, Clone, Serialize)]
pub struct Market {
    pub account_flags: AccountFlags,
    pub own_address: Pubkey,
    pub vault_signer_nonce: u64,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_vault: Pubkey,
    pub base_deposits_total: u64,
    pub base_fees_accrued: u64,
    pub quote_vault: Pubkey,
    pub quote_deposits_total: u64,
    pub quote_fees_accrued: u64,
    pub quote_dust_threshold: u64,
    pub request_queue: Pubkey,
    pub event_queue: Pubkey,
    pub bids: Pubkey,
    pub asks: Pubkey,
    pub base_lot_size: u64,
    pub quote_lot_size: u64,
    pub fee_rate_bps: u64,
    pub referrer_rebates_accrued: u64,

    // Pas dans le compte : lues sur les mints par le builder. 0 tant que non résolues.
    pub base_decimals: u8,
    pub quote_decimals: u8,

    // Les champs "vivants", remplacés à chaque reload.
    pub bid_order_book: Option<OrderBookSide>,
    pub ask_order_book: Option<OrderBookSide>,
    pub decoded_event_queue: Option<EventQueue>,
}

impl Market {
    pub fn scale(&self) -> MarketScale {
        MarketScale {
            base_decimals: self.base_decimals,
            quote_decimals: self.quote_decimals,
            base_lot_size: self.base_lot_size,
            quote_lot_size: self.quote_lot_size,
        }
    }

    /// Taux de frais taker sous forme de fraction (22 bps -> 0.0022).
    pub fn fee_rate(&self) -> f64 {
        self.fee_rate_bps as f64 / 10_000.0
    }

    pub fn price_lots_to_number(&self, price_lots: u64) -> f64 {
        self.scale().price_lots_to_number(price_lots)
    }

    pub fn price_number_to_lots(&self, price: f64) -> u64 {
        self.scale().price_number_to_lots(price)
    }

    pub fn base_size_lots_to_number(&self, size_lots: u64) -> f64 {
        self.scale().base_size_lots_to_number(size_lots)
    }

    pub fn base_size_number_to_lots(&self, size: f64) -> u64 {
        self.scale().base_size_number_to_lots(size)
    }

    pub fn quote_size_lots_to_number(&self, size_lots: u64) -> f64 {
        self.scale().quote_size_lots_to_number(size_lots)
    }

    pub fn min_order_size(&self) -> f64 {
        self.scale().min_order_size()
    }

    pub fn tick_size(&self) -> f64 {
        self.scale().tick_size()
    }

    /// Remplace uniquement les champs qui bougent (carnets, event queue).
    /// Les mints, vaults et tailles de lot ne changent pas pendant la vie d'un marché.
    pub fn replace_live_fields(&mut self, fresh: Market) {
        self.bid_order_book = fresh.bid_order_book;
        self.ask_order_book = fresh.ask_order_book;
        self.decoded_event_queue = fresh.decoded_event_queue;
    }
}

// --- STRUCTURE DE DONNÉES BRUTES (Miroir exact du layout Serum v3, après le préfixe) ---
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
struct MarketStateData {
    pub account_flags: u64,
    pub own_address: Pubkey,
    pub vault_signer_nonce: u64,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_vault: Pubkey,
    pub base_deposits_total: u64,
    pub base_fees_accrued: u64,
    pub quote_vault: Pubkey,
    pub quote_deposits_total: u64,
    pub quote_fees_accrued: u64,
    pub quote_dust_threshold: u64,
    pub request_queue: Pubkey,
    pub event_queue: Pubkey,
    pub bids: Pubkey,
    pub asks: Pubkey,
    pub base_lot_size: u64,
    pub quote_lot_size: u64,
    pub fee_rate_bps: u64,
    pub referrer_rebates_accrued: u64,
}

/// Fin du dernier champ lu (referrer_rebates_accrued). Le compte réel fait 388 octets
/// avec le padding final, qu'on ne lit pas.
pub const MARKET_FIELDS_END: usize = ACCOUNT_FLAGS_OFFSET + size_of::<MarketStateData>();

/// Décode un compte Market Serum. Les décimales restent à 0.
pub fn decode_market(data: &[u8]) -> DecodeResult<Market> {
    // Étape 1: Préfixe + flags. Un compte qui n'est pas un Market est refusé.
    let account_flags = decode_account_flags(data)?.expect_kind(AccountKind::Market)?;

    // Étape 2: Vérifier que tous les offsets fixes sont lisibles.
    let raw = data
        .get(ACCOUNT_FLAGS_OFFSET..MARKET_FIELDS_END)
        .ok_or(DecodeError::Truncated {
            what: "compte Market",
            needed: MARKET_FIELDS_END,
            actual: data.len(),
        })?;

    // Étape 3: "Caster" les données.
    let state: &MarketStateData = from_bytes(raw);

    // Étape 4: Créer la sortie propre
    Ok(Market {
        account_flags,
        own_address: state.own_address,
        vault_signer_nonce: state.vault_signer_nonce,
        base_mint: state.base_mint,
        quote_mint: state.quote_mint,
        base_vault: state.base_vault,
        base_deposits_total: state.base_deposits_total,
        base_fees_accrued: state.base_fees_accrued,
        quote_vault: state.quote_vault,
        quote_deposits_total: state.quote_deposits_total,
        quote_fees_accrued: state.quote_fees_accrued,
        quote_dust_threshold: state.quote_dust_threshold,
        request_queue: state.request_queue,
        event_queue: state.event_queue,
        bids: state.bids,
        asks: state.asks,
        base_lot_size: state.base_lot_size,
        quote_lot_size: state.quote_lot_size,
        fee_rate_bps: state.fee_rate_bps,
        referrer_rebates_accrued: state.referrer_rebates_accrued,
        base_decimals: 0,
        quote_decimals: 0,
        bid_order_book: None,
        ask_order_book: None,
        decoded_event_queue: None,
    })
}
