use crate::common::money::Money;
use crate::domain::party::PartyId;

/// Failure reported by a ledger store. The variant carries the status class.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Transport(String),
}

impl StoreError {
    /// HTTP-like status code; transport failures have none.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::InvalidInput(_) => Some(400),
            StoreError::NotFound(_) => Some(404),
            StoreError::Transport(_) => None,
        }
    }
}

/// Errors surfaced by the ledger cache to its callers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("party {party} still has a balance of {balance}")]
    BalanceNotZero { party: PartyId, balance: Money },
    #[error("ledger session is closed")]
    Closed,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Status class of the failure, mirroring the store's codes.
    pub fn status(&self) -> Option<u16> {
        match self {
            LedgerError::Validation { .. } | LedgerError::BalanceNotZero { .. } => Some(400),
            LedgerError::NotFound { .. } => Some(404),
            LedgerError::Closed => None,
            LedgerError::Store(e) => e.status(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("failed to read config {path}: {source}")]
    ReadConfig {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
