//! Unified error types for the ledger.
//!
//! Every fallible operation returns [`Result`]. Storage errors are carried
//! through unchanged; [`Error::kind`] groups the variants so a transport layer
//! can map them onto its own status codes.

use thiserror::Error;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced entity or active target does not exist.
    NotFound,
    /// Malformed or out-of-range input.
    InvalidInput,
    /// The entity is still referenced and cannot be removed.
    Conflict,
    /// The storage collaborator failed.
    Storage,
    /// Configuration or environment problems.
    Internal,
}

/// All errors produced by the ledger.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Category not found: {id}")]
    CategoryNotFound { id: i64 },

    #[error("Account not found: {id}")]
    AccountNotFound { id: i64 },

    #[error("Transaction not found: {id}")]
    TransactionNotFound { id: i64 },

    #[error("No active target for category {category_id} in {month}")]
    TargetNotFound { category_id: i64, month: String },

    #[error("Invalid month '{value}', expected YYYY-MM")]
    InvalidMonth { value: String },

    #[error("Invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: i64 },

    #[error("Invalid colour '{value}', expected #RRGGBB")]
    InvalidColour { value: String },

    #[error("Invalid target: {message}")]
    InvalidTarget { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Category {id} is referenced by transactions, budget allocations, or targets")]
    CategoryInUse { id: i64 },

    #[error("Account {id} has transactions")]
    AccountInUse { id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Returns the broad class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CategoryNotFound { .. }
            | Self::AccountNotFound { .. }
            | Self::TransactionNotFound { .. }
            | Self::TargetNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidMonth { .. }
            | Self::InvalidDate { .. }
            | Self::InvalidAmount { .. }
            | Self::InvalidColour { .. }
            | Self::InvalidTarget { .. }
            | Self::Validation { .. } => ErrorKind::InvalidInput,
            Self::CategoryInUse { .. } | Self::AccountInUse { .. } => ErrorKind::Conflict,
            Self::Database(_) => ErrorKind::Storage,
            Self::Config { .. } | Self::Io(_) | Self::EnvVar(_) => ErrorKind::Internal,
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
