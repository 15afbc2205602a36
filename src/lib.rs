// src/lib.rs

// On déclare tous nos modules principaux pour les rendre publics et
// utilisables par nos programmes binaires (market_snapshot.rs).
pub mod config;
pub mod data_pipeline;
pub mod decoders;
pub mod error;
pub mod monitoring;
pub mod rpc;
pub mod state;
