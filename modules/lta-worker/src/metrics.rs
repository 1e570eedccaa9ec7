//! Per-component Prometheus counters, registered once per process and
//! exposed by the owning binary's `/metrics` (or scraped via
//! `PROMETHEUS_METRICS_PORT` per the original's monitoring.py convention).

use prometheus::{IntCounter, IntGauge, Registry};

pub struct WorkerMetrics {
    pub work_successful: IntCounter,
    pub work_failed: IntCounter,
    pub work_quarantined: IntCounter,
    pub load: IntGauge,
}

impl WorkerMetrics {
    pub fn new(component_name: &str, registry: &Registry) -> Self {
        let work_successful = IntCounter::new(
            format!("{component_name}_work_successful_total"),
            "number of successful work cycles",
        )
        .expect("valid metric name");
        let work_failed = IntCounter::new(
            format!("{component_name}_work_failed_total"),
            "number of work cycles that errored",
        )
        .expect("valid metric name");
        let work_quarantined = IntCounter::new(
            format!("{component_name}_work_quarantined_total"),
            "number of items quarantined",
        )
        .expect("valid metric name");
        let load = IntGauge::new(format!("{component_name}_load"), "1 while a work cycle is in flight")
            .expect("valid metric name");

        registry.register(Box::new(work_successful.clone())).ok();
        registry.register(Box::new(work_failed.clone())).ok();
        registry.register(Box::new(work_quarantined.clone())).ok();
        registry.register(Box::new(load.clone())).ok();

        Self {
            work_successful,
            work_failed,
            work_quarantined,
            load,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let registry = Registry::new();
        let metrics = WorkerMetrics::new("picker", &registry);
        assert_eq!(metrics.work_successful.get(), 0);
        assert_eq!(metrics.load.get(), 0);
    }

    #[test]
    fn increments_are_visible_through_the_registry() {
        let registry = Registry::new();
        let metrics = WorkerMetrics::new("verifier", &registry);
        metrics.work_successful.inc();
        metrics.work_quarantined.inc_by(2);
        let families = registry.gather();
        assert!(!families.is_empty());
        assert_eq!(metrics.work_successful.get(), 1);
        assert_eq!(metrics.work_quarantined.get(), 2);
    }
}
