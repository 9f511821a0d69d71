//! Prometheus metrics

use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Full pipeline for one pair
    PairAnalysis,
    /// Relationship judgment lookup
    JudgmentLookup,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Pairs that produced a verdict
    PairsAnalyzed,
    /// Pairs rejected for invalid market or correlation data
    PairsRejected,
    /// Pairs skipped because no judgment was available
    JudgmentsMissing,
}

impl LatencyMetric {
    fn name(self) -> &'static str {
        match self {
            LatencyMetric::PairAnalysis => "polycorr_pair_analysis_latency_ms",
            LatencyMetric::JudgmentLookup => "polycorr_judgment_lookup_latency_ms",
        }
    }
}

impl CounterMetric {
    fn name(self) -> &'static str {
        match self {
            CounterMetric::PairsAnalyzed => "polycorr_pairs_analyzed_total",
            CounterMetric::PairsRejected => "polycorr_pairs_rejected_total",
            CounterMetric::JudgmentsMissing => "polycorr_judgments_missing_total",
        }
    }
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    metrics::histogram!(metric.name()).record(duration.as_secs_f64() * 1000.0);
}

/// Increment a counter by one
pub fn increment(metric: CounterMetric) {
    metrics::counter!(metric.name()).increment(1);
}

/// Set the gauge tracking pairs currently being evaluated
pub fn set_in_flight(count: usize) {
    metrics::gauge!("polycorr_pairs_in_flight").set(count as f64);
}
