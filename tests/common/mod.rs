// Comptes Serum synthétiques et un fetcher en mémoire pour les tests du builder.
#![allow(dead_code)]

use async_trait::async_trait;
use serum_reader::error::FetchError;
use serum_reader::rpc::AccountFetcher;
use solana_program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use spl_token_2022::state::Mint;
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

pub const INITIALIZED: u64 = 1;
pub const MARKET: u64 = 1 << 1;
pub const EVENT_QUEUE: u64 = 1 << 4;
pub const BIDS: u64 = 1 << 5;
pub const ASKS: u64 = 1 << 6;

pub const FILL: u8 = 1;
pub const BID: u8 = 4;
pub const MAKER: u8 = 8;

pub struct MarketAccounts {
    pub market: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub event_queue: Pubkey,
    pub bids: Pubkey,
    pub asks: Pubkey,
}

impl MarketAccounts {
    pub fn new(base_mint: Pubkey, quote_mint: Pubkey) -> Self {
        Self {
            market: Pubkey::new_unique(),
            base_mint,
            quote_mint,
            event_queue: Pubkey::new_unique(),
            bids: Pubkey::new_unique(),
            asks: Pubkey::new_unique(),
        }
    }
}

fn account_head(flags: u64) -> Vec<u8> {
    let mut data = b"serum".to_vec();
    data.extend_from_slice(&flags.to_le_bytes());
    data
}

pub fn market_bytes(accounts: &MarketAccounts, base_lot_size: u64, quote_lot_size: u64) -> Vec<u8> {
    let mut data = account_head(INITIALIZED | MARKET);
    data.extend_from_slice(accounts.market.as_ref());
    data.extend_from_slice(&1u64.to_le_bytes()); // vault_signer_nonce
    data.extend_from_slice(accounts.base_mint.as_ref());
    data.extend_from_slice(accounts.quote_mint.as_ref());
    data.extend_from_slice(Pubkey::new_unique().as_ref()); // base_vault
    data.extend_from_slice(&0u64.to_le_bytes());
    data.extend_from_slice(&0u64.to_le_bytes());
    data.extend_from_slice(Pubkey::new_unique().as_ref()); // quote_vault
    data.extend_from_slice(&0u64.to_le_bytes());
    data.extend_from_slice(&0u64.to_le_bytes());
    data.extend_from_slice(&100u64.to_le_bytes()); // quote_dust_threshold
    data.extend_from_slice(Pubkey::new_unique().as_ref()); // request_queue
    data.extend_from_slice(accounts.event_queue.as_ref());
    data.extend_from_slice(accounts.bids.as_ref());
    data.extend_from_slice(accounts.asks.as_ref());
    data.extend_from_slice(&base_lot_size.to_le_bytes());
    data.extend_from_slice(&quote_lot_size.to_le_bytes());
    data.extend_from_slice(&22u64.to_le_bytes()); // fee_rate_bps
    data.extend_from_slice(&0u64.to_le_bytes());
    data.extend_from_slice(b"padding");
    assert_eq!(data.len(), 388);
    data
}

#[derive(Clone, Copy)]
pub struct Fill {
    pub flags: u8,
    pub released: u64,
    pub paid: u64,
    pub fee: u64,
    pub owner: Pubkey,
    pub client_order_id: u64,
}

pub fn event_queue_bytes(head: u32, count: u32, seq_num: u32, capacity: usize, fills: &[Fill]) -> Vec<u8> {
    let mut data = account_head(INITIALIZED | EVENT_QUEUE);
    for value in [head, count, seq_num] {
        data.extend_from_slice(&value.to_le_bytes());
        data.extend_from_slice(&[0u8; 4]);
    }
    for i in 0..capacity {
        let mut slot = [0u8; 88];
        if let Some(fill) = fills.get(i) {
            slot[0] = fill.flags;
            slot[8..16].copy_from_slice(&fill.released.to_le_bytes());
            slot[16..24].copy_from_slice(&fill.paid.to_le_bytes());
            slot[24..32].copy_from_slice(&fill.fee.to_le_bytes());
            slot[32..48].copy_from_slice(&(i as u128 + 1).to_le_bytes());
            slot[48..80].copy_from_slice(fill.owner.as_ref());
            slot[80..88].copy_from_slice(&fill.client_order_id.to_le_bytes());
        }
        data.extend_from_slice(&slot);
    }
    data
}

pub fn book_bytes(flags: u64) -> Vec<u8> {
    let mut data = account_head(INITIALIZED | flags);
    data.extend_from_slice(&[7u8; 64]);
    data
}

pub fn mint_bytes(decimals: u8) -> Vec<u8> {
    let mint = Mint {
        mint_authority: None.into(),
        supply: 1_000_000,
        decimals,
        is_initialized: true,
        freeze_authority: None.into(),
    };
    let mut data = vec![0u8; Mint::LEN];
    Mint::pack(mint, &mut data).unwrap();
    data
}

/// Fetcher en mémoire : compte les appels par adresse et peut simuler des pannes réseau.
#[derive(Default)]
pub struct MemoryFetcher {
    accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    failing: Mutex<HashSet<Pubkey>>,
    calls: Mutex<HashMap<Pubkey, usize>>,
}

impl MemoryFetcher {
    pub fn insert(&self, address: Pubkey, data: Vec<u8>) {
        self.accounts.lock().unwrap().insert(address, data);
    }

    pub fn remove(&self, address: &Pubkey) {
        self.accounts.lock().unwrap().remove(address);
    }

    pub fn fail(&self, address: Pubkey) {
        self.failing.lock().unwrap().insert(address);
    }

    pub fn calls(&self, address: &Pubkey) -> usize {
        self.calls.lock().unwrap().get(address).copied().unwrap_or(0)
    }
}

#[async_trait]
impl AccountFetcher for MemoryFetcher {
    async fn fetch_account_bytes(&self, address: &Pubkey) -> Result<Vec<u8>, FetchError> {
        *self.calls.lock().unwrap().entry(*address).or_insert(0) += 1;
        if self.failing.lock().unwrap().contains(address) {
            return Err(FetchError::Transport {
                address: *address,
                message: "connection reset".to_string(),
            });
        }
        self.accounts
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or(FetchError::NotFound(*address))
    }
}
