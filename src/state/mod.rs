pub mod decimals_cache;

pub use decimals_cache::DecimalsCache;
