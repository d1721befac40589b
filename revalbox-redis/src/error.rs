//! Error types for Redis store operations.
//!
//! Every error converts to [`StoreError`], which is what the caching client
//! sees. The client treats those as misses or dropped writes, so a Redis
//! outage degrades to uncached fetches rather than failures.
//!
//! [`StoreError`]: revalbox_backend::StoreError

use redis::RedisError;
use revalbox_backend::StoreError;

/// Error type for Redis store operations.
///
/// You typically meet it only from [`RedisStoreBuilder::build`] with an
/// invalid connection URL. Errors during reads and writes are converted to
/// [`StoreError::ConnectionError`].
///
/// [`RedisStoreBuilder::build`]: crate::RedisStoreBuilder::build
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying Redis client.
    ///
    /// This includes connection failures, protocol errors, authentication
    /// failures, and command execution errors.
    #[error("Redis store error: {0}")]
    Redis(#[from] RedisError),
}

impl From<Error> for StoreError {
    fn from(error: Error) -> Self {
        Self::ConnectionError(Box::new(error))
    }
}
