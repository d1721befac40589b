//! Metrics declaration and recording.

use std::time::Duration;

use crate::response::CacheStatus;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    // Cache status metrics

    /// Track number of fresh entries served without a network round trip.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "revalbox_cache_hit_total",
            "Total number of cache hit events."
        );
        "revalbox_cache_hit_total"
    };
    /// Track number of responses fetched from the network.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "revalbox_cache_miss_total",
            "Total number of cache miss events."
        );
        "revalbox_cache_miss_total"
    };
    /// Track number of entries confirmed by a 304 response.
    pub static ref CACHE_REVALIDATED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "revalbox_cache_revalidated_total",
            "Total number of cache entries revalidated with 304 Not Modified."
        );
        "revalbox_cache_revalidated_total"
    };

    // Latency metrics

    /// Metric of upstream request timings.
    pub static ref CACHE_UPSTREAM_HANDLING_HISTOGRAM: &'static str = {
        metrics::describe_histogram!(
            "revalbox_upstream_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of upstream requests in seconds."
        );
        "revalbox_upstream_duration_seconds"
    };

    // Per-store fault metrics

    /// Track read errors per store. Each one is served as a miss.
    pub static ref STORE_READ_ERRORS: &'static str = {
        metrics::describe_counter!(
            "revalbox_store_read_errors_total",
            "Total number of store read errors per store."
        );
        "revalbox_store_read_errors_total"
    };
    /// Track write errors per store.
    pub static ref STORE_WRITE_ERRORS: &'static str = {
        metrics::describe_counter!(
            "revalbox_store_write_errors_total",
            "Total number of store write errors per store."
        );
        "revalbox_store_write_errors_total"
    };
}

/// Record how the cache took part in one response.
///
/// When the `metrics` feature is disabled, this function is a no-op
/// and will be eliminated by the compiler.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_cache_status(status: CacheStatus, store: &str) {
    let counter = match status {
        CacheStatus::Hit => *CACHE_HIT_COUNTER,
        CacheStatus::Miss => *CACHE_MISS_COUNTER,
        CacheStatus::Revalidated => *CACHE_REVALIDATED_COUNTER,
    };
    metrics::counter!(counter, "store" => store.to_string()).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_cache_status(_status: CacheStatus, _store: &str) {}

/// Record the duration of one request to the origin.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_upstream_duration(duration: Duration, status: CacheStatus) {
    metrics::histogram!(
        *CACHE_UPSTREAM_HANDLING_HISTOGRAM,
        "status" => status.as_str()
    )
    .record(duration.as_secs_f64());
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_upstream_duration(_duration: Duration, _status: CacheStatus) {}

/// Record a store read that failed and was treated as a miss.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_store_read_error(store: &str) {
    metrics::counter!(*STORE_READ_ERRORS, "store" => store.to_string()).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_store_read_error(_store: &str) {}

/// Record a store write that failed and was dropped.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_store_write_error(store: &str) {
    metrics::counter!(*STORE_WRITE_ERRORS, "store" => store.to_string()).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_store_write_error(_store: &str) {}
