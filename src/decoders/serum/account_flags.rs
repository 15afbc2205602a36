// DANS : src/decoders/serum/account_flags.rs

use crate::error::{DecodeError, DecodeResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tous les comptes du programme Serum commencent par ces 5 octets.
pub const SERUM_PREFIX: [u8; 5] = *b"serum";
pub const ACCOUNT_FLAGS_OFFSET: usize = SERUM_PREFIX.len();
pub const ACCOUNT_FLAGS_LEN: usize = 8;
/// Préfixe + flags : c'est ici que commence le contenu propre à chaque type de compte.
pub const ACCOUNT_HEAD_LEN: usize = ACCOUNT_FLAGS_OFFSET + ACCOUNT_FLAGS_LEN;

const INITIALIZED_BIT: u32 = 0;
const MARKET_BIT: u32 = 1;
const OPEN_ORDERS_BIT: u32 = 2;
const REQUEST_QUEUE_BIT: u32 = 3;
const EVENT_QUEUE_BIT: u32 = 4;
const BIDS_BIT: u32 = 5;
const ASKS_BIT: u32 = 6;

/// Le type de compte attendu dans un contexte de décodage donné.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Market,
    OpenOrders,
    RequestQueue,
    EventQueue,
    Bids,
    Asks,
}

impl AccountKind {
    pub fn name(&self) -> &'static str {
        match self {
            AccountKind::Market => "Market",
            AccountKind::OpenOrders => "OpenOrders",
            AccountKind::RequestQueue => "RequestQueue",
            AccountKind::EventQueue => "EventQueue",
            AccountKind::Bids => "Bids",
            AccountKind::Asks => "Asks",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFlags {
    pub initialized: bool,
    pub market: bool,
    pub open_orders: bool,
    pub request_queue: bool,
    pub event_queue: bool,
    pub bids: bool,
    pub asks: bool,
}

fn is_set(bits: u64, bit: u32) -> bool {
    (bits >> bit) & 1 == 1
}

impl AccountFlags {
    pub fn from_bits(bits: u64) -> Self {
        Self {
            initialized: is_set(bits, INITIALIZED_BIT),
            market: is_set(bits, MARKET_BIT),
            open_orders: is_set(bits, OPEN_ORDERS_BIT),
            request_queue: is_set(bits, REQUEST_QUEUE_BIT),
            event_queue: is_set(bits, EVENT_QUEUE_BIT),
            bids: is_set(bits, BIDS_BIT),
            asks: is_set(bits, ASKS_BIT),
        }
    }

    /// Vrai si le compte est initialisé et porte exactement ce type (et aucun autre).
    pub fn is_kind(&self, kind: AccountKind) -> bool {
        let kinds = [
            (AccountKind::Market, self.market),
            (AccountKind::OpenOrders, self.open_orders),
            (AccountKind::RequestQueue, self.request_queue),
            (AccountKind::EventQueue, self.event_queue),
            (AccountKind::Bids, self.bids),
            (AccountKind::Asks, self.asks),
        ];
        self.initialized && kinds.iter().all(|(k, set)| *set == (*k == kind))
    }

    pub fn expect_kind(self, kind: AccountKind) -> DecodeResult<Self> {
        if self.is_kind(kind) {
            Ok(self)
        } else {
            Err(DecodeError::UnexpectedAccountFlags {
                expected: kind.name(),
                found: self.to_string(),
            })
        }
    }
}

impl fmt::Display for AccountFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            ("initialized", self.initialized),
            ("market", self.market),
            ("open_orders", self.open_orders),
            ("request_queue", self.request_queue),
            ("event_queue", self.event_queue),
            ("bids", self.bids),
            ("asks", self.asks),
        ];
        let set: Vec<&str> = names.iter().filter(|(_, s)| *s).map(|(n, _)| *n).collect();
        write!(f, "[{}]", set.join(", "))
    }
}

/// Vérifie le préfixe "serum". On ne devine jamais : un préfixe faux est une erreur.
pub fn validate_serum_prefix(data: &[u8]) -> DecodeResult<()> {
    let prefix = data.get(..SERUM_PREFIX.len()).ok_or(DecodeError::Truncated {
        what: "préfixe serum",
        needed: SERUM_PREFIX.len(),
        actual: data.len(),
    })?;
    if prefix != SERUM_PREFIX {
        return Err(DecodeError::InvalidPrefix { found: prefix.to_vec() });
    }
    Ok(())
}

/// Lit les flags à l'offset 5 après avoir validé le préfixe.
pub fn decode_account_flags(data: &[u8]) -> DecodeResult<AccountFlags> {
    validate_serum_prefix(data)?;
    let raw: [u8; ACCOUNT_FLAGS_LEN] = data
        .get(ACCOUNT_FLAGS_OFFSET..ACCOUNT_HEAD_LEN)
        .and_then(|s| s.try_into().ok())
        .ok_or(DecodeError::Truncated {
            what: "account flags",
            needed: ACCOUNT_HEAD_LEN,
            actual: data.len(),
        })?;
    Ok(AccountFlags::from_bits(u64::from_le_bytes(raw)))
}
