//! Moka store capacity metrics.
//!
//! Enable the `metrics` feature to use these metrics.
//!
//! ## Metrics
//!
//! - `revalbox_moka_entries` - Current number of entries in the store (gauge)
//! - `revalbox_moka_size_bytes` - Current weighted size in bytes (gauge)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for entry count gauge.
    pub static ref MOKA_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "revalbox_moka_entries",
            "Current number of entries in the Moka store."
        );
        "revalbox_moka_entries"
    };

    /// Metric name for weighted size gauge.
    pub static ref MOKA_SIZE_BYTES: &'static str = {
        metrics::describe_gauge!(
            "revalbox_moka_size_bytes",
            "Current weighted size of the Moka store in bytes."
        );
        "revalbox_moka_size_bytes"
    };
}

/// Record current capacity usage.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_capacity(entries: u64, size_bytes: u64) {
    metrics::gauge!(*MOKA_ENTRIES).set(entries as f64);
    metrics::gauge!(*MOKA_SIZE_BYTES).set(size_bytes as f64);
}

/// Record current capacity usage (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_capacity(_entries: u64, _size_bytes: u64) {}
