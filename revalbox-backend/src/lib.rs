//! Traits and structs for revalbox storage.
//!
//! If you want to plug in your own storage, you are in the right place:
//! implement [`Store`] (two methods) and hand it to the caching client.
//!
//! ## Provided stores
//!
//! | Store | Crate | Use Case |
//! |-------|-------|----------|
//! | [`MemoryStore`] | this crate | Default, single process, unbounded |
//! | `MokaStore` | `revalbox-moka` | Single process, bounded (LRU) |
//! | `RedisStore` | `revalbox-redis` | Shared between processes |
//!
//! Out-of-process stores persist entries through a [`Format`](format::Format).
mod error;
pub mod format;
pub mod memory;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{Store, StoreResult};

pub use revalbox_core::{CacheEntry, CacheKey, Raw};
