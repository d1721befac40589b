//! Error types for store operations.

use crate::format::FormatError;
use thiserror::Error;

/// Error type for store operations.
///
/// A missing key is never an error; these variants are reserved for faults
/// of the storage itself. The caching client treats a failed read as a miss
/// and a failed write as a lost optimization, so none of them reach callers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Internal store error, state or computation error.
    ///
    /// Any error not related to network interaction.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// Network interaction error.
    ///
    /// Errors occurring during communication with remote stores (e.g., Redis).
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),

    /// Serialization or deserialization error.
    #[error(transparent)]
    FormatError(#[from] FormatError),
}
