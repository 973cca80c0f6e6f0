//! Recommendation Metrics and Performance Monitoring
//!
//! Counters and timings recorded at the HTTP boundary. The scoring functions
//! themselves stay free of side effects.

use std::time::Instant;

use super::model::RecommendationResult;

/// Performance timer for tracking operation duration
pub struct PerformanceTimer {
    start: Instant,
    label: &'static str,
}

impl PerformanceTimer {
    pub fn new(label: &'static str) -> Self {
        Self {
            start: Instant::now(),
            label,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn log_if_slow(&self, threshold_ms: u64) {
        let elapsed = self.elapsed_ms();
        if elapsed > threshold_ms {
            tracing::warn!(
                "⚠️ Slow operation: {} took {}ms (threshold: {}ms)",
                self.label,
                elapsed,
                threshold_ms
            );
        }
    }
}

impl Drop for PerformanceTimer {
    fn drop(&mut self) {
        let elapsed = self.elapsed_ms();
        ::metrics::histogram!("operation_duration_ms", "operation" => self.label)
            .record(elapsed as f64);
        tracing::debug!("⏱️ {} completed in {}ms", self.label, elapsed);
    }
}

/// Share of results whose reason came from an affinity match (0-1)
pub fn personalization_ratio(results: &[RecommendationResult], baseline: f64) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let personalized = results.iter().filter(|r| r.score > baseline).count();
    personalized as f64 / results.len() as f64
}

pub fn record_recommendations(results: &[RecommendationResult], baseline: f64) {
    ::metrics::counter!("recommendations_requests_total").increment(1);
    ::metrics::histogram!("recommendation_results").record(results.len() as f64);
    ::metrics::histogram!("recommendation_personalization_ratio")
        .record(personalization_ratio(results, baseline));
}

pub fn record_trending(results: usize, cache_hit: bool) {
    ::metrics::counter!("trending_requests_total").increment(1);
    if cache_hit {
        ::metrics::counter!("trending_cache_hits_total").increment(1);
    }
    ::metrics::histogram!("trending_results").record(results as f64);
}

/// Install the Prometheus scrape endpoint
#[cfg(feature = "prometheus")]
pub fn install_exporter(port: u16) -> crate::error::Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .map_err(|e| crate::error::Error::config(format!("metrics exporter: {}", e)))
}
