//! Text classifier metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct ClassifyMetrics;

impl ClassifyMetrics {
    pub fn record_case(rosc: bool, survived: bool) {
        ::metrics::counter!(phase_metric!(counter, "classify", "cases")).increment(1);
        if rosc {
            ::metrics::counter!(phase_metric!(counter, "classify", "rosc")).increment(1);
        }
        if survived {
            ::metrics::counter!(phase_metric!(counter, "classify", "survivors")).increment(1);
        }
    }

    pub fn record_trauma_hit() {
        ::metrics::counter!(phase_metric!(counter, "classify", "trauma_hits")).increment(1);
    }

    pub fn record_cpc_default_applied() {
        ::metrics::counter!(phase_metric!(counter, "classify", "cpc_default_applied")).increment(1);
    }

    pub fn record_cpr_duration(seconds: i64) {
        ::metrics::histogram!(phase_metric!(histogram, "classify", "cpr_duration_seconds"))
            .record(seconds as f64);
    }
}

impl PhaseMetrics for ClassifyMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "classify", "cases"));
        let _ = counter!(phase_metric!(counter, "classify", "rosc"));
        let _ = counter!(phase_metric!(counter, "classify", "survivors"));
        let _ = counter!(phase_metric!(counter, "classify", "trauma_hits"));
        let _ = counter!(phase_metric!(counter, "classify", "cpc_default_applied"));
        let _ = histogram!(phase_metric!(histogram, "classify", "cpr_duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "classify"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "classify", "cases"),
                metric_type: MetricType::Counter,
                help: "Cases classified",
            },
            MetricDoc {
                name: phase_metric!(counter, "classify", "rosc"),
                metric_type: MetricType::Counter,
                help: "Cases classified with return of spontaneous circulation",
            },
            MetricDoc {
                name: phase_metric!(counter, "classify", "survivors"),
                metric_type: MetricType::Counter,
                help: "Cases classified as alive at seven days",
            },
            MetricDoc {
                name: phase_metric!(counter, "classify", "trauma_hits"),
                metric_type: MetricType::Counter,
                help: "Cases whose narrative matched a traumatic-origin keyword",
            },
            MetricDoc {
                name: phase_metric!(counter, "classify", "cpc_default_applied"),
                metric_type: MetricType::Counter,
                help: "Cases whose CPC fell back to the configured default",
            },
            MetricDoc {
                name: phase_metric!(histogram, "classify", "cpr_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Derived resuscitation duration",
            },
        ]
    }
}
