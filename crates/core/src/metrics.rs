//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Map runs (outcomes, duration, concurrency)
//! - Pipeline stages (per-stage duration and failures)
//! - Publishing (files copied to the public directory)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Map runs
// =============================================================================

/// Map runs total by result.
pub static MAP_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reliefmap_runs_total", "Total map runs"),
        &["result"], // "success", "failed", "rejected"
    )
    .unwrap()
});

/// Map run duration in seconds.
pub static MAP_RUN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("reliefmap_run_duration_seconds", "Duration of full map runs")
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"],
    )
    .unwrap()
});

/// Runs currently holding a pipeline slot.
pub static ACTIVE_RUNS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("reliefmap_active_runs", "Map runs currently executing").unwrap()
});

/// Old run workspaces removed by pruning.
pub static WORKSPACES_PRUNED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reliefmap_workspaces_pruned_total",
        "Total run workspaces removed by pruning",
    )
    .unwrap()
});

// =============================================================================
// Stages
// =============================================================================

/// Stage duration in seconds.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("reliefmap_stage_duration_seconds", "Duration of pipeline stages")
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["stage", "result"],
    )
    .unwrap()
});

/// Stage failures total.
pub static STAGE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reliefmap_stage_failures_total", "Total failed stages"),
        &["stage"],
    )
    .unwrap()
});

// =============================================================================
// Publishing
// =============================================================================

/// Files copied into the public directory.
pub static FILES_PUBLISHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reliefmap_files_published_total",
        "Total artifacts copied into the public directory",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Runs
        Box::new(MAP_RUNS.clone()),
        Box::new(MAP_RUN_DURATION.clone()),
        Box::new(ACTIVE_RUNS.clone()),
        Box::new(WORKSPACES_PRUNED.clone()),
        // Stages
        Box::new(STAGE_DURATION.clone()),
        Box::new(STAGE_FAILURES.clone()),
        // Publishing
        Box::new(FILES_PUBLISHED.clone()),
    ]
}
