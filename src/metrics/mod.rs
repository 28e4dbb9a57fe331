//! Metrics for the cleaning pipeline
//!
//! Each stage owns a small metrics struct in its own submodule. Counters go
//! through the `metrics` facade; an in-process Prometheus recorder collects
//! them so a finished run can write its snapshot next to the cleaned data.

pub mod classify;
pub mod filter;
pub mod load;
pub mod merge;

pub use classify::ClassifyMetrics;
pub use filter::FilterMetrics;
pub use load::LoadMetrics;
pub use merge::MergeMetrics;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::sync::{Once, OnceLock};
use tracing::{debug, info, warn};

static INIT: Once = Once::new();
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder and register every stage's metrics.
///
/// Idempotent. No HTTP listener is started; the snapshot is read back with
/// [`render`].
pub fn init_metrics() {
    INIT.call_once(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if HANDLE.set(handle).is_err() {
                warn!("Prometheus handle was already stored");
            }
            register_all_metrics();
        }
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
        }
    });
}

/// Prometheus exposition text for everything recorded so far.
/// `None` when no recorder is installed.
pub fn render() -> Option<String> {
    HANDLE.get().map(|handle| handle.render())
}

/// Implemented by each stage's metrics collection
pub trait PhaseMetrics {
    /// Touch every metric so it shows up in the snapshot even at zero
    fn register_metrics();

    fn phase_name() -> &'static str;

    fn metrics_documentation() -> Vec<MetricDoc>;
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

/// Builds a metric name following `tcpr_{phase}_{name}[_total]`
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("tcpr_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("tcpr_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("tcpr_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;

fn register_all_metrics() {
    let mut all_metrics = HashMap::new();

    register_phase_metrics::<LoadMetrics>(&mut all_metrics);
    register_phase_metrics::<MergeMetrics>(&mut all_metrics);
    register_phase_metrics::<ClassifyMetrics>(&mut all_metrics);
    register_phase_metrics::<FilterMetrics>(&mut all_metrics);

    info!("Registered {} pipeline metrics", all_metrics.len());
}

fn register_phase_metrics<T: PhaseMetrics>(all_metrics: &mut HashMap<&'static str, MetricDoc>) {
    T::register_metrics();
    let phase_name = T::phase_name();

    for doc in T::metrics_documentation() {
        if let Some(existing) = all_metrics.insert(doc.name, doc.clone()) {
            warn!(
                "Metric name conflict in phase {}: {} already registered as {:?}",
                phase_name, doc.name, existing.metric_type
            );
        } else {
            debug!("Registered {} ({:?}): {}", doc.name, doc.metric_type, doc.help);
        }
    }
}
