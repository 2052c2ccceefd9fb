//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes counters for dashboard load/resolve outcomes and gauges for the
//!   latest summary buckets.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared by dashboard components.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    matrix_loads_total: IntCounterVec,
    issue_loads_total: IntCounterVec,
    issue_resolutions_total: IntCounterVec,
    poll_ticks_skipped_total: IntCounter,
    credential_rotations_total: IntCounter,
    health_cells: IntGaugeVec,
}

/// Snapshot of selected counters for status output.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Matrix loads that were applied to state.
    pub matrix_loads_applied: u64,
    /// Matrix loads that failed.
    pub matrix_loads_failed: u64,
    /// Matrix loads discarded because a newer one had been applied.
    pub matrix_loads_stale: u64,
    /// Issue resolutions that succeeded.
    pub issues_resolved: u64,
    /// Issue resolutions that failed.
    pub issue_resolutions_failed: u64,
    /// Poll ticks skipped while the surface was hidden.
    pub poll_ticks_skipped: u64,
    /// Credentials replaced by the request helper.
    pub credential_rotations: u64,
}

impl Metrics {
    /// Construct a new registry with the dashboard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any collector cannot be built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let matrix_loads_total = counter_vec(
            "health_matrix_loads_total",
            "Health matrix loads by outcome",
            &["outcome"],
        )?;
        let issue_loads_total = counter_vec(
            "health_issue_loads_total",
            "Issue list loads by outcome",
            &["outcome"],
        )?;
        let issue_resolutions_total = counter_vec(
            "health_issue_resolutions_total",
            "Issue resolve requests by outcome",
            &["outcome"],
        )?;
        let poll_ticks_skipped_total = IntCounter::with_opts(Opts::new(
            "health_poll_ticks_skipped_total",
            "Poll ticks skipped while the dashboard was hidden",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "health_poll_ticks_skipped_total",
            source,
        })?;
        let credential_rotations_total = IntCounter::with_opts(Opts::new(
            "health_credential_rotations_total",
            "Credentials replaced after the service rejected the current one",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "health_credential_rotations_total",
            source,
        })?;
        let health_cells = IntGaugeVec::new(
            Opts::new("health_cells", "Matrix cells per category after the last load"),
            &["category"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "health_cells",
            source,
        })?;

        register(&registry, "health_matrix_loads_total", &matrix_loads_total)?;
        register(&registry, "health_issue_loads_total", &issue_loads_total)?;
        register(
            &registry,
            "health_issue_resolutions_total",
            &issue_resolutions_total,
        )?;
        register(
            &registry,
            "health_poll_ticks_skipped_total",
            &poll_ticks_skipped_total,
        )?;
        register(
            &registry,
            "health_credential_rotations_total",
            &credential_rotations_total,
        )?;
        register(&registry, "health_cells", &health_cells)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                matrix_loads_total,
                issue_loads_total,
                issue_resolutions_total,
                poll_ticks_skipped_total,
                credential_rotations_total,
                health_cells,
            }),
        })
    }

    /// Count a matrix load outcome (`applied`, `stale`, `failed`).
    pub fn inc_matrix_load(&self, outcome: &str) {
        self.inner
            .matrix_loads_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Count an issue load outcome (`loaded`, `degraded`).
    pub fn inc_issue_load(&self, outcome: &str) {
        self.inner
            .issue_loads_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Count an issue resolution outcome (`resolved`, `failed`).
    pub fn inc_issue_resolution(&self, outcome: &str) {
        self.inner
            .issue_resolutions_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Count a poll tick skipped while hidden.
    pub fn inc_poll_tick_skipped(&self) {
        self.inner.poll_ticks_skipped_total.inc();
    }

    /// Count a credential rotation.
    pub fn inc_credential_rotation(&self) {
        self.inner.credential_rotations_total.inc();
    }

    /// Record the number of cells currently in `category`.
    pub fn set_health_cells(&self, category: &str, count: usize) {
        self.inner
            .health_cells
            .with_label_values(&[category])
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Capture a snapshot of the counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let matrix = |outcome: &str| {
            self.inner
                .matrix_loads_total
                .with_label_values(&[outcome])
                .get()
        };
        let resolution = |outcome: &str| {
            self.inner
                .issue_resolutions_total
                .with_label_values(&[outcome])
                .get()
        };
        MetricsSnapshot {
            matrix_loads_applied: matrix("applied"),
            matrix_loads_failed: matrix("failed"),
            matrix_loads_stale: matrix("stale"),
            issues_resolved: resolution("resolved"),
            issue_resolutions_failed: resolution("failed"),
            poll_ticks_skipped: self.inner.poll_ticks_skipped_total.get(),
            credential_rotations: self.inner.credential_rotations_total.get(),
        }
    }

    /// Render the registry in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or produces invalid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_flow_into_snapshot_and_render() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_matrix_load("applied");
        metrics.inc_matrix_load("applied");
        metrics.inc_matrix_load("stale");
        metrics.inc_issue_resolution("failed");
        metrics.inc_poll_tick_skipped();
        metrics.inc_credential_rotation();
        metrics.inc_issue_load("degraded");
        metrics.set_health_cells("healthy", 8);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.matrix_loads_applied, 2);
        assert_eq!(snapshot.matrix_loads_stale, 1);
        assert_eq!(snapshot.matrix_loads_failed, 0);
        assert_eq!(snapshot.issue_resolutions_failed, 1);
        assert_eq!(snapshot.poll_ticks_skipped, 1);
        assert_eq!(snapshot.credential_rotations, 1);

        let rendered = metrics.render()?;
        assert!(rendered.contains("health_matrix_loads_total"));
        assert!(rendered.contains("health_cells{category=\"healthy\"} 8"));
        Ok(())
    }

    #[test]
    fn snapshot_serializes_to_json() -> Result<()> {
        let metrics = Metrics::new()?;
        let value = serde_json::to_value(metrics.snapshot()).expect("serialize snapshot");
        assert_eq!(value["matrix_loads_applied"], 0);
        Ok(())
    }
}
