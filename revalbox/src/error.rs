//! Error types for caching client operations.

use thiserror::Error;

/// Error returned by [`CachingClient`](crate::CachingClient) operations.
///
/// Store faults never show up here: a failed read behaves like a miss and a
/// failed write is logged. Callers see either a response or one of these.
#[derive(Debug, Error)]
pub enum CacheError<E> {
    /// The request could not be built, e.g. the URL does not parse.
    ///
    /// Raised before any cache or network interaction.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] http::Error),

    /// The URL parsed but is missing a scheme or host.
    #[error("URL `{0}` is not absolute")]
    RelativeUrl(String),

    /// The transport failed. The error is passed through unchanged.
    #[error(transparent)]
    Transport(E),
}

impl<E> CacheError<E> {
    /// Returns the transport error, if this is one.
    pub fn into_transport(self) -> Option<E> {
        match self {
            CacheError::Transport(error) => Some(error),
            _ => None,
        }
    }

    /// True if the error came from the transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, CacheError::Transport(_))
    }
}
