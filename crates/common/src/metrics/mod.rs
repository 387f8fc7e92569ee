//! Metrics and observability utilities
//!
//! Provides metric registration and standardized naming conventions
//! for the retrieval engine.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Agora metrics
pub const METRICS_PREFIX: &str = "agora";

/// Histogram buckets for retrieval latency (in seconds)
/// Targets: expansion < 100ms, full query < 10s
pub const RETRIEVAL_BUCKETS: &[f64] = &[
    0.001, // 1ms
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms - expansion target
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
    10.00, // 10s - full query target
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Load metrics
    describe_histogram!(
        format!("{}_load_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Corpus load duration in seconds"
    );

    describe_counter!(
        format!("{}_partitions_loaded_total", METRICS_PREFIX),
        Unit::Count,
        "Partitions successfully loaded"
    );

    describe_counter!(
        format!("{}_partitions_failed_total", METRICS_PREFIX),
        Unit::Count,
        "Partitions skipped due to load failures"
    );

    // Retrieval metrics
    describe_counter!(
        format!("{}_seed_selections_total", METRICS_PREFIX),
        Unit::Count,
        "Total seed selection runs"
    );

    describe_counter!(
        format!("{}_expansions_total", METRICS_PREFIX),
        Unit::Count,
        "Total weighted expansion runs"
    );

    describe_histogram!(
        format!("{}_expansion_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Weighted expansion latency in seconds"
    );

    describe_gauge!(
        format!("{}_expansion_results_count", METRICS_PREFIX),
        Unit::Count,
        "Entities returned by the last expansion"
    );

    // Cache metrics
    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total response cache hits"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total response cache misses"
    );

    describe_counter!(
        format!("{}_cache_evictions_total", METRICS_PREFIX),
        Unit::Count,
        "Total response cache evictions"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record corpus load metrics
pub fn record_load(duration_secs: f64, loaded: usize, failed: usize) {
    histogram!(format!("{}_load_duration_seconds", METRICS_PREFIX)).record(duration_secs);
    counter!(format!("{}_partitions_loaded_total", METRICS_PREFIX)).increment(loaded as u64);
    counter!(format!("{}_partitions_failed_total", METRICS_PREFIX)).increment(failed as u64);
}

/// Helper to record expansion metrics
pub fn record_expansion(duration_secs: f64, result_count: usize) {
    counter!(format!("{}_expansions_total", METRICS_PREFIX)).increment(1);
    histogram!(format!("{}_expansion_duration_seconds", METRICS_PREFIX)).record(duration_secs);
    gauge!(format!("{}_expansion_results_count", METRICS_PREFIX)).set(result_count as f64);
}

/// Helper to record seed selection metrics
pub fn record_seed_selection(seed_count: usize, partition_count: usize) {
    counter!(format!("{}_seed_selections_total", METRICS_PREFIX)).increment(1);
    gauge!(
        format!("{}_seed_count", METRICS_PREFIX),
        "scope" => "seeds"
    )
    .set(seed_count as f64);
    gauge!(
        format!("{}_seed_count", METRICS_PREFIX),
        "scope" => "partitions"
    )
    .set(partition_count as f64);
}

/// Helper to record cache metrics
pub fn record_cache(hit: bool) {
    if hit {
        counter!(format!("{}_cache_hits_total", METRICS_PREFIX)).increment(1);
    } else {
        counter!(format!("{}_cache_misses_total", METRICS_PREFIX)).increment(1);
    }
}

/// Helper to record cache evictions
pub fn record_cache_eviction() {
    counter!(format!("{}_cache_evictions_total", METRICS_PREFIX)).increment(1);
}

/// Helper to time a phase and record it as a histogram
pub struct PhaseTimer {
    start: Instant,
    name: String,
}

impl PhaseTimer {
    /// Start timing a named phase
    pub fn start(name: &str) -> Self {
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    /// Record phase completion, returning the elapsed seconds
    pub fn finish(self) -> f64 {
        let duration = self.start.elapsed().as_secs_f64();
        histogram!(
            format!("{}_phase_duration_seconds", METRICS_PREFIX),
            "phase" => self.name
        )
        .record(duration);
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_buckets() {
        // Verify buckets are sorted and contain targets
        let mut prev = 0.0;
        for &bucket in RETRIEVAL_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }

        // Expansion target (100ms) should be in buckets
        assert!(RETRIEVAL_BUCKETS.contains(&0.100));
        // Full query target (10s) should be in buckets
        assert!(RETRIEVAL_BUCKETS.contains(&10.00));
    }

    #[test]
    fn test_phase_timer() {
        let timer = PhaseTimer::start("expansion");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let elapsed = timer.finish();
        assert!(elapsed >= 0.005);
    }
}
