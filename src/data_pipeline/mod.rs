// src/data_pipeline/mod.rs

pub mod market_builder;

pub use market_builder::MarketSnapshotBuilder;
