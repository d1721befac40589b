#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod default;
mod transport;

pub use default::{default_client, fetch_request_with_cache, fetch_with_cache};
pub use transport::{MiddlewareTransport, ReqwestTransport};

/// Re-export reqwest body type for convenience in type annotations
pub use reqwest::Body as ReqwestBody;
