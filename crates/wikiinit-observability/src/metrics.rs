//! Metrics collection with Prometheus
//!
//! This module provides Prometheus metrics for the wiki initializer:
//! - Initialization attempts and failures by wiki kind (main / sub)
//! - Initialization duration histogram
//! - Legacy configuration key lookups
//! - Distribution wizard notification failures

use prometheus::{
    CounterVec, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Label value for the main wiki
pub const KIND_MAIN: &str = "main";

/// Label value for sub-wikis
pub const KIND_SUB: &str = "sub";

/// Metrics collector for the wiki initializer
#[derive(Clone)]
pub struct Metrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Initialization attempts
    pub initializations_total: CounterVec,
    /// Failed initializations
    pub initialization_failures_total: CounterVec,
    /// Initialization duration (end-to-end, per wiki)
    pub initialization_duration_seconds: HistogramVec,
    /// Lookups answered by a deprecated configuration key
    pub legacy_config_lookups_total: CounterVec,
    /// Distribution wizard notifications that failed (logged and swallowed)
    pub wizard_notification_failures_total: IntCounter,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let initializations_total = CounterVec::new(
            Opts::new(
                "wikiinit_initializations_total",
                "Total number of wiki initialization attempts",
            ),
            &["kind"],
        )?;

        let initialization_failures_total = CounterVec::new(
            Opts::new(
                "wikiinit_initialization_failures_total",
                "Total number of failed wiki initializations",
            ),
            &["kind"],
        )?;

        let initialization_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "wikiinit_initialization_duration_seconds",
                "Wiki initialization duration in seconds",
            )
            .buckets(vec![
                0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0,
            ]),
            &["kind"],
        )?;

        let legacy_config_lookups_total = CounterVec::new(
            Opts::new(
                "wikiinit_legacy_config_lookups_total",
                "Configuration lookups answered by a deprecated key",
            ),
            &["key"],
        )?;

        let wizard_notification_failures_total = IntCounter::new(
            "wikiinit_wizard_notification_failures_total",
            "Distribution wizard notifications that failed",
        )?;

        registry.register(Box::new(initializations_total.clone()))?;
        registry.register(Box::new(initialization_failures_total.clone()))?;
        registry.register(Box::new(initialization_duration_seconds.clone()))?;
        registry.register(Box::new(legacy_config_lookups_total.clone()))?;
        registry.register(Box::new(wizard_notification_failures_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            initializations_total,
            initialization_failures_total,
            initialization_duration_seconds,
            legacy_config_lookups_total,
            wizard_notification_failures_total,
        })
    }

    /// Get the Prometheus registry for exporting metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a finished initialization
    pub fn record_initialization(&self, kind: &str, success: bool, duration_secs: f64) {
        self.initializations_total.with_label_values(&[kind]).inc();
        if !success {
            self.initialization_failures_total
                .with_label_values(&[kind])
                .inc();
        }
        self.initialization_duration_seconds
            .with_label_values(&[kind])
            .observe(duration_secs);
    }

    /// Record a lookup answered by a legacy key
    pub fn record_legacy_lookup(&self, legacy_key: &str) {
        self.legacy_config_lookups_total
            .with_label_values(&[legacy_key])
            .inc();
    }

    /// Record a failed distribution wizard notification
    pub fn record_wizard_notification_failure(&self) {
        self.wizard_notification_failures_total.inc();
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn gather_text(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}
