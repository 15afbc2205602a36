// DANS : src/decoders/serum/math.rs

use serde::{Deserialize, Serialize};

/// 10^decimals du token de base, en f64.
pub fn base_multiplier(base_decimals: u8) -> f64 {
    10f64.powi(base_decimals as i32)
}

/// 10^decimals du token de cotation, en f64.
pub fn quote_multiplier(quote_decimals: u8) -> f64 {
    10f64.powi(quote_decimals as i32)
}

/// Tout ce qu'il faut pour passer des unités on-chain (lots, montants natifs)
/// aux unités "humaines", et inversement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketScale {
    pub base_decimals: u8,
    pub quote_decimals: u8,
    pub base_lot_size: u64,
    pub quote_lot_size: u64,
}

impl MarketScale {
    pub fn base_multiplier(&self) -> f64 {
        base_multiplier(self.base_decimals)
    }

    pub fn quote_multiplier(&self) -> f64 {
        quote_multiplier(self.quote_decimals)
    }

    /// Prix en lots (tel que stocké dans le carnet) -> prix affichable.
    pub fn price_lots_to_number(&self, price_lots: u64) -> f64 {
        let top = price_lots as f64 * self.quote_lot_size as f64 * self.base_multiplier();
        let bottom = self.base_lot_size as f64 * self.quote_multiplier();
        top / bottom
    }

    pub fn price_number_to_lots(&self, price: f64) -> u64 {
        let top = price * self.quote_multiplier() * self.base_lot_size as f64;
        let bottom = self.base_multiplier() * self.quote_lot_size as f64;
        (top / bottom).round() as u64
    }

    pub fn base_size_lots_to_number(&self, size_lots: u64) -> f64 {
        size_lots as f64 * self.base_lot_size as f64 / self.base_multiplier()
    }

    pub fn base_size_number_to_lots(&self, size: f64) -> u64 {
        (size * self.base_multiplier() / self.base_lot_size as f64).round() as u64
    }

    pub fn quote_size_lots_to_number(&self, size_lots: u64) -> f64 {
        size_lots as f64 * self.quote_lot_size as f64 / self.quote_multiplier()
    }

    /// Plus petite quantité échangeable (1 lot de base).
    pub fn min_order_size(&self) -> f64 {
        self.base_size_lots_to_number(1)
    }

    /// Plus petit incrément de prix (1 lot de prix).
    pub fn tick_size(&self) -> f64 {
        self.price_lots_to_number(1)
    }
}
