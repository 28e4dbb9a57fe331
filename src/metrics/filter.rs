//! Filter and reorder metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct FilterMetrics;

impl FilterMetrics {
    pub fn record_kept(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "filter", "kept")).increment(count as u64);
    }

    pub fn record_excluded_trauma(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "filter", "excluded_trauma"))
            .increment(count as u64);
    }

    pub fn record_excluded_missing_telephone_cpr(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "filter", "excluded_missing_telephone_cpr"))
            .increment(count as u64);
    }

    pub fn record_review_flags(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "filter", "review_flags"))
            .increment(count as u64);
    }
}

impl PhaseMetrics for FilterMetrics {
    fn register_metrics() {
        use metrics::counter;

        let _ = counter!(phase_metric!(counter, "filter", "kept"));
        let _ = counter!(phase_metric!(counter, "filter", "excluded_trauma"));
        let _ = counter!(phase_metric!(counter, "filter", "excluded_missing_telephone_cpr"));
        let _ = counter!(phase_metric!(counter, "filter", "review_flags"));
    }

    fn phase_name() -> &'static str {
        "filter"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "filter", "kept"),
                metric_type: MetricType::Counter,
                help: "Cases written to the cleaned table",
            },
            MetricDoc {
                name: phase_metric!(counter, "filter", "excluded_trauma"),
                metric_type: MetricType::Counter,
                help: "Cases excluded as traumatic in origin",
            },
            MetricDoc {
                name: phase_metric!(counter, "filter", "excluded_missing_telephone_cpr"),
                metric_type: MetricType::Counter,
                help: "Cases excluded because the telephone-CPR cell was blank",
            },
            MetricDoc {
                name: phase_metric!(counter, "filter", "review_flags"),
                metric_type: MetricType::Counter,
                help: "Kept cases flagged for manual review",
            },
        ]
    }
}
