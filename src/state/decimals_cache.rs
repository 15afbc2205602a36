// DANS : src/state/decimals_cache.rs

use solana_sdk::pubkey::Pubkey;
use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Cache mint -> décimales. Les décimales d'un mint ne changent jamais :
/// une entrée insérée n'expire pas et n'est jamais réécrite.
#[derive(Debug, Default)]
pub struct DecimalsCache {
    cache: RwLock<HashMap<Pubkey, u8>>,
}

impl DecimalsCache {
    pub fn new() -> Self {
        Self::default()
    }

    // Un panic ailleurs ne doit pas rendre le cache inutilisable : les entrées restent valides.
    fn reader(&self) -> RwLockReadGuard<'_, HashMap<Pubkey, u8>> {
        self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn writer(&self) -> RwLockWriteGuard<'_, HashMap<Pubkey, u8>> {
        self.cache.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, mint: &Pubkey) -> Option<u8> {
        self.reader().get(mint).copied()
    }

    /// Insère si absent et renvoie la valeur retenue (la première gagne).
    pub fn insert(&self, mint: Pubkey, decimals: u8) -> u8 {
        *self.writer().entry(mint).or_insert(decimals)
    }

    pub fn len(&self) -> usize {
        self.reader().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
