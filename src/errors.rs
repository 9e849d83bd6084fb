use rust_decimal::Decimal;

use crate::types::AccountId;

/// Error type that can be returned by fallible operations in this crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source of a transfer does not exist, is inactive, or cannot cover the amount.
    #[error("Invalid source account {0}")]
    InvalidSourceAccount(AccountId),
    /// The destination of a transfer does not exist or is inactive.
    #[error("Invalid destination account {0}")]
    InvalidDestinationAccount(AccountId),
    /// A serialized transfer request could not be decoded.
    #[error("Malformed transfer request")]
    MalformedRequest(#[source] serde_json::Error),
    /// An account with this identifier is already registered.
    /// Opening an account never overwrites an existing record.
    #[error("Account {0} already exists")]
    AccountExists(AccountId),
    /// No account with this identifier is registered
    #[error("Account {0} not found")]
    AccountNotFound(AccountId),
    /// The emission and destruction accounts can't be deactivated
    #[error("Account {0} is reserved")]
    ReservedAccount(AccountId),
    /// Amounts must not be negative
    #[error("Invalid amount {0}")]
    InvalidAmount(Decimal),
    /// A balance would exceed the range of [`Decimal`]
    #[error("Amount overflows account balance")]
    AmountOverflow,
    /// Error encoding the accounts snapshot as JSON
    #[error("Error encoding accounts snapshot")]
    Snapshot(#[source] serde_json::Error),
    /// Error writing the CSV accounts report
    #[error("Error writing accounts report")]
    Report(#[from] csv::Error),
    /// Error reading a batch of transfer requests
    #[error("Error reading transfer requests")]
    Io(#[from] std::io::Error),
}
