// DANS : src/error.rs

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Données structurellement invalides. Jamais ré-essayé.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Préfixe invalide : attendu \"serum\", trouvé {found:?}")]
    InvalidPrefix { found: Vec<u8> },

    #[error("Données tronquées : {needed} octets requis pour {what}, {actual} disponibles")]
    Truncated {
        what: &'static str,
        needed: usize,
        actual: usize,
    },

    #[error("Flags de compte inattendus pour {expected} : {found}")]
    UnexpectedAccountFlags { expected: &'static str, found: String },

    #[error("Longueur d'Event Queue invalide : ({len} - {header}) n'est pas un multiple de {slot}")]
    InvalidQueueLength { len: usize, header: usize, slot: usize },

    #[error("Event Queue incohérente : count {count} > capacité {capacity}")]
    CountExceedsCapacity { count: u32, capacity: usize },

    #[error("Impossible de décoder le mint {mint} : {reason}")]
    InvalidMint { mint: Pubkey, reason: String },
}

/// Échec de la couche de transport (le collaborateur RPC).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Compte {0} introuvable")]
    NotFound(Pubkey),

    #[error("Erreur réseau pour {address} : {message}")]
    Transport { address: Pubkey, message: String },

    #[error("Erreur RPC pour {address} : {message}")]
    Rpc { address: Pubkey, message: String },
}

/// Erreurs de l'assemblage d'un snapshot de marché.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SnapshotError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Décodage de {account} ({address}) échoué : {source}")]
    Decode {
        account: &'static str,
        address: Pubkey,
        #[source]
        source: DecodeError,
    },

    #[error("Décimales introuvables pour le mint {mint} : {reason}")]
    Lookup { mint: Pubkey, reason: String },

    #[error("{} sous-requêtes ont échoué : {}", .0.len(), join_errors(.0))]
    Aggregate(Vec<SnapshotError>),
}

impl SnapshotError {
    /// Regroupe les erreurs de requêtes lancées en parallèle sans en perdre aucune.
    pub fn aggregate(mut errors: Vec<SnapshotError>) -> Option<SnapshotError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(SnapshotError::Aggregate(errors)),
        }
    }
}

fn join_errors(errors: &[SnapshotError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;
