// DANS : src/decoders/serum/order_book.rs
//
// Le décodage du Slab (critbit) n'est pas fait ici : on valide le compte
// et on garde ses octets, avec l'échelle du marché pour le décodeur en aval.

use super::account_flags::{decode_account_flags, AccountFlags, AccountKind, ACCOUNT_HEAD_LEN};
use super::event_queue::Side;
use super::math::MarketScale;
use crate::error::DecodeResult;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBookSide {
    pub address: Pubkey,
    pub side: Side,
    pub account_flags: AccountFlags,
    pub scale: MarketScale,
    /// Le Slab commence APRÈS 5 octets de préfixe et 8 octets de flags.
    #[serde(skip)]
    pub slab: Vec<u8>,
}

impl OrderBookSide {
    pub fn slab_len(&self) -> usize {
        self.slab.len()
    }
}

/// Valide un compte bids/asks (préfixe + flags du bon côté) et extrait son Slab.
pub fn decode_order_book_side(
    address: &Pubkey,
    side: Side,
    data: &[u8],
    scale: MarketScale,
) -> DecodeResult<OrderBookSide> {
    let kind = match side {
        Side::Bid => AccountKind::Bids,
        Side::Ask => AccountKind::Asks,
    };
    let account_flags = decode_account_flags(data)?.expect_kind(kind)?;

    Ok(OrderBookSide {
        address: *address,
        side,
        account_flags,
        scale,
        slab: data[ACCOUNT_HEAD_LEN..].to_vec(),
    })
}
