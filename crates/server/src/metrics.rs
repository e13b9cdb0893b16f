//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the relief map server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Pipeline status (collected dynamically)
//! - Core run and stage metrics (registered from `reliefmap_core::metrics`)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reliefmap_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reliefmap_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reliefmap_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics (collected dynamically)
// =============================================================================

/// Pipeline slots.
pub static PIPELINE_CAPACITY: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reliefmap_pipeline_capacity",
        "Maximum number of concurrent map runs",
    )
    .unwrap()
});

/// Catalog size.
pub static CATALOG_COUNTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reliefmap_catalog_countries",
        "Number of countries in the catalog",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Pipeline
    registry
        .register(Box::new(PIPELINE_CAPACITY.clone()))
        .unwrap();
    registry
        .register(Box::new(CATALOG_COUNTRIES.clone()))
        .unwrap();

    // Core metrics (runs, stages, publishing)
    for metric in reliefmap_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Collect dynamic metrics from current application state.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.pipeline().status().await;
    PIPELINE_CAPACITY.set(status.max_concurrent_runs as i64);
    CATALOG_COUNTRIES.set(state.catalog().len() as i64);
}

static UUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/-?[\d.]+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_PATTERN.replace_all(path, "{id}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/runs/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/runs/{id}");
    }

    #[test]
    fn test_normalize_path_numeric() {
        assert_eq!(normalize_path("/tiles/-130.5"), "/tiles/{id}");
        assert_eq!(normalize_path("/tiles/12/x"), "/tiles/{id}/x");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/maps/topo.json"), "/maps/topo.json");
        assert_eq!(normalize_path("/maps/countries"), "/maps/countries");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("reliefmap_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        PIPELINE_CAPACITY.set(2);
        reliefmap_core::metrics::MAP_RUNS
            .with_label_values(&["success"])
            .inc();
        reliefmap_core::metrics::STAGE_DURATION
            .with_label_values(&["hillshade", "success"])
            .observe(1.0);

        let output = encode_metrics().unwrap();

        assert!(output.contains("reliefmap_http_request_duration_seconds"));
        assert!(output.contains("reliefmap_pipeline_capacity"));
        assert!(output.contains("reliefmap_runs_total"));
        assert!(output.contains("reliefmap_stage_duration_seconds"));
    }
}
