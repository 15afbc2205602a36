pub mod mint;

pub use mint::{decode_mint, DecodedMint, WRAPPED_SOL_DECIMALS};
