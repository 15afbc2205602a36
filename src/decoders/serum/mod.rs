pub mod account_flags;
pub mod event_queue;
pub mod market;
pub mod math;
pub mod order_book;

// On ré-exporte les éléments principaux pour un accès plus facile
pub use account_flags::{decode_account_flags, AccountFlags, AccountKind};
pub use event_queue::{decode_event_queue, EventQueue, EventQueueHeader, Side, TradeEvent};
pub use market::{decode_market, Market};
pub use math::{base_multiplier, quote_multiplier, MarketScale};
pub use order_book::{decode_order_book_side, OrderBookSide};
