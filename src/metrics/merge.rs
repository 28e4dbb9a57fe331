//! Unit merger metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct MergeMetrics;

impl MergeMetrics {
    /// An advanced-unit report found its basic-unit counterpart
    pub fn record_match() {
        ::metrics::counter!(phase_metric!(counter, "merge", "matched")).increment(1);
    }

    /// An advanced-unit report had no basic-unit counterpart
    pub fn record_no_match() {
        ::metrics::counter!(phase_metric!(counter, "merge", "unmatched_advanced")).increment(1);
    }

    pub fn record_dropped_basic(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "merge", "dropped_basic"))
            .increment(count as u64);
    }

    pub fn record_dropped_other(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "merge", "dropped_other_units"))
            .increment(count as u64);
    }

    pub fn record_lost_telephone_cpr(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "merge", "lost_telephone_cpr"))
            .increment(count as u64);
    }
}

impl PhaseMetrics for MergeMetrics {
    fn register_metrics() {
        use metrics::counter;

        let _ = counter!(phase_metric!(counter, "merge", "matched"));
        let _ = counter!(phase_metric!(counter, "merge", "unmatched_advanced"));
        let _ = counter!(phase_metric!(counter, "merge", "dropped_basic"));
        let _ = counter!(phase_metric!(counter, "merge", "dropped_other_units"));
        let _ = counter!(phase_metric!(counter, "merge", "lost_telephone_cpr"));
    }

    fn phase_name() -> &'static str {
        "merge"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "merge", "matched"),
                metric_type: MetricType::Counter,
                help: "Advanced-unit reports merged with a basic-unit report",
            },
            MetricDoc {
                name: phase_metric!(counter, "merge", "unmatched_advanced"),
                metric_type: MetricType::Counter,
                help: "Advanced-unit reports kept without a basic-unit match",
            },
            MetricDoc {
                name: phase_metric!(counter, "merge", "dropped_basic"),
                metric_type: MetricType::Counter,
                help: "Basic-unit reports dropped for lack of an advanced-unit match",
            },
            MetricDoc {
                name: phase_metric!(counter, "merge", "dropped_other_units"),
                metric_type: MetricType::Counter,
                help: "Reports from other or blank unit types",
            },
            MetricDoc {
                name: phase_metric!(counter, "merge", "lost_telephone_cpr"),
                metric_type: MetricType::Counter,
                help: "Telephone-CPR cases only present on dropped basic-unit reports",
            },
        ]
    }
}
