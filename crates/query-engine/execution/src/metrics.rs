//! Metrics setup and update for query execution.

use prometheus::core::{AtomicU64, GenericCounter};
use prometheus::Histogram;

#[derive(Debug, Clone)]
pub struct Metrics {
    pub query_total: GenericCounter<AtomicU64>,
    pub query_errors_total: GenericCounter<AtomicU64>,
    pub query_execution_seconds: Histogram,
}

/// Create a new int counter metric and register it with the provided Prometheus Registry
fn add_int_counter_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<GenericCounter<AtomicU64>, prometheus::Error> {
    let int_counter =
        prometheus::IntCounter::with_opts(prometheus::Opts::new(metric_name, metric_description))?;
    metrics_registry.register(Box::new(int_counter.clone()))?;
    Ok(int_counter)
}

/// Create a new histogram metric and register it with the provided Prometheus Registry
fn add_histogram_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<Histogram, prometheus::Error> {
    let histogram = Histogram::with_opts(prometheus::HistogramOpts::new(
        metric_name,
        metric_description,
    ))?;
    metrics_registry.register(Box::new(histogram.clone()))?;
    Ok(histogram)
}

/// Setup counters and histograms used to produce Prometheus metrics
pub fn initialise_metrics(
    metrics_registry: &mut prometheus::Registry,
) -> Result<Metrics, prometheus::Error> {
    let query_total = add_int_counter_metric(
        metrics_registry,
        "query_engine_query_total",
        "Total successful statements.",
    )?;

    let query_errors_total = add_int_counter_metric(
        metrics_registry,
        "query_engine_query_errors_total",
        "Total failed, timed out or cancelled statements.",
    )?;

    let query_execution_seconds = add_histogram_metric(
        metrics_registry,
        "query_engine_query_execution_seconds",
        "Time taken to run a statement, in seconds.",
    )?;

    Ok(Metrics {
        query_total,
        query_errors_total,
        query_execution_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_once_per_registry() {
        let mut registry = prometheus::Registry::new();
        initialise_metrics(&mut registry).unwrap();
        assert_eq!(registry.gather().len(), 3);
        assert!(initialise_metrics(&mut registry).is_err());
    }
}
