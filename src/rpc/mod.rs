pub mod fetcher;
pub mod resilient_client;

pub use fetcher::{decode_base64_account_data, AccountFetcher};
pub use resilient_client::ResilientRpcClient;
