// src/decoders/mod.rs

// --- Les décodeurs de comptes ---
pub mod serum;
pub mod spl_token_decoders;

pub use serum::{decode_event_queue, decode_market, EventQueue, Market, TradeEvent};
