//! Loader metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct LoadMetrics;

impl LoadMetrics {
    pub fn record_rows_loaded(rows: usize) {
        ::metrics::counter!(phase_metric!(counter, "load", "rows")).increment(rows as u64);
    }

    pub fn record_duplicate_ids(duplicates: usize) {
        ::metrics::counter!(phase_metric!(counter, "load", "duplicate_ids"))
            .increment(duplicates as u64);
    }

    pub fn record_duration(duration_secs: f64) {
        ::metrics::histogram!(phase_metric!(histogram, "load", "duration_seconds"))
            .record(duration_secs);
    }
}

impl PhaseMetrics for LoadMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "load", "rows"));
        let _ = counter!(phase_metric!(counter, "load", "duplicate_ids"));
        let _ = histogram!(phase_metric!(histogram, "load", "duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "load"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "load", "rows"),
                metric_type: MetricType::Counter,
                help: "Data rows read from the registry export",
            },
            MetricDoc {
                name: phase_metric!(counter, "load", "duplicate_ids"),
                metric_type: MetricType::Counter,
                help: "Rows whose report identifier was already seen",
            },
            MetricDoc {
                name: phase_metric!(histogram, "load", "duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Time spent reading the export",
            },
        ]
    }
}
