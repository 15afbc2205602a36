// DANS : src/data_pipeline/market_builder.rs

use crate::decoders::serum::{
    decode_event_queue, decode_market, decode_order_book_side, Market, MarketScale, OrderBookSide, Side,
};
use crate::decoders::spl_token_decoders::mint::{decode_mint, is_wrapped_sol, WRAPPED_SOL_DECIMALS};
use crate::error::{SnapshotError, SnapshotResult};
use crate::rpc::AccountFetcher;
use crate::state::DecimalsCache;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{debug, info};

/// Construit un snapshot de `Market`, avec en option les carnets, l'Event Queue
/// et les décimales des mints.
pub struct MarketSnapshotBuilder {
    fetcher: Arc<dyn AccountFetcher>,
    address: Pubkey,
    retrieve_order_books: bool,
    retrieve_event_queue: bool,
    retrieve_decimals_only: bool,
    decimals_cache: Arc<DecimalsCache>,
    // Le compte Market lui-même ne change pas (hors frais accumulés) : gardé après le premier build réussi.
    market_data: Option<Vec<u8>>,
}

impl MarketSnapshotBuilder {
    pub fn new(fetcher: Arc<dyn AccountFetcher>, address: Pubkey) -> Self {
        Self {
            fetcher,
            address,
            retrieve_order_books: false,
            retrieve_event_queue: false,
            retrieve_decimals_only: false,
            decimals_cache: Arc::new(DecimalsCache::new()),
            market_data: None,
        }
    }

    pub fn with_order_books(mut self, retrieve: bool) -> Self {
        self.retrieve_order_books = retrieve;
        self
    }

    pub fn with_event_queue(mut self, retrieve: bool) -> Self {
        self.retrieve_event_queue = retrieve;
        self
    }

    pub fn with_decimals_only(mut self, retrieve: bool) -> Self {
        self.retrieve_decimals_only = retrieve;
        self
    }

    /// Permet de partager un même cache entre plusieurs marchés (USDC, SOL...).
    pub fn with_decimals_cache(mut self, cache: Arc<DecimalsCache>) -> Self {
        self.decimals_cache = cache;
        self
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn decimals_cache(&self) -> &Arc<DecimalsCache> {
        &self.decimals_cache
    }

    fn needs_decimals(&self) -> bool {
        self.retrieve_order_books || self.retrieve_event_queue || self.retrieve_decimals_only
    }

    pub async fn build(&mut self) -> SnapshotResult<Market> {
        // --- Étape 1: Le compte Market ---
        let market_data = match &self.market_data {
            Some(data) => data.clone(),
            None => self.fetcher.fetch_account_bytes(&self.address).await?,
        };
        let market = self.assemble(&market_data).await?;

        // Mis en cache seulement après un build complet réussi : un échec relira le compte.
        if self.market_data.is_none() {
            self.market_data = Some(market_data);
        }
        Ok(market)
    }

    async fn assemble(&self, market_data: &[u8]) -> SnapshotResult<Market> {
        let mut market = decode_market(market_data).map_err(|source| SnapshotError::Decode {
            account: "Market",
            address: self.address,
            source,
        })?;

        if !self.needs_decimals() {
            info!(market = %self.address, "Snapshot du marché construit (champs fixes uniquement)");
            return Ok(market);
        }

        // --- Étape 2: Requêtes indépendantes lancées en parallèle ---
        let (base_res, quote_res, bids_res, asks_res, queue_res) = tokio::join!(
            self.mint_decimals(market.base_mint),
            self.mint_decimals(market.quote_mint),
            self.fetch_if(self.retrieve_order_books, market.bids),
            self.fetch_if(self.retrieve_order_books, market.asks),
            self.fetch_if(self.retrieve_event_queue, market.event_queue),
        );

        // Aucune erreur n'est avalée : si plusieurs requêtes échouent, on les remonte toutes.
        let mut errors = Vec::new();
        let base_decimals = base_res.map_err(|e| errors.push(e)).ok();
        let quote_decimals = quote_res.map_err(|e| errors.push(e)).ok();
        let bids_data = bids_res.transpose().map_err(|e| errors.push(e)).ok().flatten();
        let asks_data = asks_res.transpose().map_err(|e| errors.push(e)).ok().flatten();
        let queue_data = queue_res.transpose().map_err(|e| errors.push(e)).ok().flatten();
        if let Some(error) = SnapshotError::aggregate(errors) {
            return Err(error);
        }
        market.base_decimals = base_decimals.unwrap_or_default();
        market.quote_decimals = quote_decimals.unwrap_or_default();
        let scale = market.scale();

        // --- Étape 3: Décodage des comptes vivants ---
        if let (Some(bids), Some(asks)) = (bids_data, asks_data) {
            market.bid_order_book = Some(self.decode_side(market.bids, Side::Bid, &bids, scale)?);
            market.ask_order_book = Some(self.decode_side(market.asks, Side::Ask, &asks, scale)?);
        }

        if let Some(queue) = queue_data {
            let event_queue = decode_event_queue(&queue, scale).map_err(|source| SnapshotError::Decode {
                account: "EventQueue",
                address: market.event_queue,
                source,
            })?;
            debug!(
                event_queue = %market.event_queue,
                capacity = event_queue.capacity,
                head = event_queue.header.head,
                count = event_queue.header.count,
                seq_num = event_queue.header.seq_num,
                fills = event_queue.events.len(),
                "Event Queue décodée"
            );
            market.decoded_event_queue = Some(event_queue);
        }

        info!(
            market = %self.address,
            base_decimals = market.base_decimals,
            quote_decimals = market.quote_decimals,
            order_books = market.bid_order_book.is_some(),
            fills = market.decoded_event_queue.as_ref().map(|q| q.events.len()).unwrap_or(0),
            "Snapshot du marché construit"
        );
        Ok(market)
    }

    /// Relance le pipeline et ne remplace que les champs vivants (carnets, Event Queue).
    pub async fn reload(&mut self, market: &mut Market) -> SnapshotResult<()> {
        let fresh = self.build().await?;
        market.replace_live_fields(fresh);
        Ok(())
    }

    async fn fetch_if(&self, enabled: bool, address: Pubkey) -> Option<SnapshotResult<Vec<u8>>> {
        if !enabled {
            return None;
        }
        Some(self.fetcher.fetch_account_bytes(&address).await.map_err(SnapshotError::from))
    }

    fn decode_side(
        &self,
        address: Pubkey,
        side: Side,
        data: &[u8],
        scale: MarketScale,
    ) -> SnapshotResult<OrderBookSide> {
        decode_order_book_side(&address, side, data, scale).map_err(|source| SnapshotError::Decode {
            account: match side {
                Side::Bid => "Bids",
                Side::Ask => "Asks",
            },
            address,
            source,
        })
    }

    /// Décimales d'un mint : Wrapped SOL en dur, sinon cache, sinon RPC.
    async fn mint_decimals(&self, mint: Pubkey) -> SnapshotResult<u8> {
        if is_wrapped_sol(&mint) {
            return Ok(self.decimals_cache.insert(mint, WRAPPED_SOL_DECIMALS));
        }

        if let Some(decimals) = self.decimals_cache.get(&mint) {
            debug!(%mint, decimals, "[Cache] HIT décimales");
            return Ok(decimals);
        }

        debug!(%mint, "[Cache] MISS décimales. Fetching via RPC...");
        let data = self
            .fetcher
            .fetch_account_bytes(&mint)
            .await
            .map_err(|e| SnapshotError::Lookup {
                mint,
                reason: e.to_string(),
            })?;
        let decoded = decode_mint(&mint, &data).map_err(|e| SnapshotError::Lookup {
            mint,
            reason: e.to_string(),
        })?;
        Ok(self.decimals_cache.insert(mint, decoded.decimals))
    }
}
