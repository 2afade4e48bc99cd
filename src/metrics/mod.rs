// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};

pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Covers:
// - Order engine operations (outcome, latency)
// - Optimistic-concurrency conflicts
// - Order deletions (drained vs explicit)
// - Store circuit breaker state
//
// All metrics are registered with one registry scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Order Engine Metrics
    pub order_operations: IntCounterVec,
    pub order_operation_duration: HistogramVec,
    pub order_conflicts: IntCounterVec,
    pub orders_deleted: IntCounterVec,

    // Store Metrics
    pub store_circuit_breaker_state: IntGaugeVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let order_operations = IntCounterVec::new(
            Opts::new("order_operations_total", "Order engine operations by outcome"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(order_operations.clone()))?;

        let order_operation_duration = HistogramVec::new(
            HistogramOpts::new("order_operation_duration_seconds", "Order engine operation duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(order_operation_duration.clone()))?;

        let order_conflicts = IntCounterVec::new(
            Opts::new("order_conflicts_total", "Lost compare-and-swap writes on order documents"),
            &["operation"],
        )?;
        registry.register(Box::new(order_conflicts.clone()))?;

        let orders_deleted = IntCounterVec::new(
            Opts::new("orders_deleted_total", "Order documents deleted"),
            &["reason"],
        )?;
        registry.register(Box::new(orders_deleted.clone()))?;

        let store_circuit_breaker_state = IntGaugeVec::new(
            Opts::new(
                "store_circuit_breaker_state",
                "Store circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
            ),
            &["store"],
        )?;
        registry.register(Box::new(store_circuit_breaker_state.clone()))?;

        Ok(Self {
            registry,
            order_operations,
            order_operation_duration,
            order_conflicts,
            orders_deleted,
            store_circuit_breaker_state,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record one engine operation; `outcome` is "ok" or an error code
    pub fn record_operation(&self, operation: &str, outcome: &str, duration_secs: f64) {
        self.order_operations.with_label_values(&[operation, outcome]).inc();
        self.order_operation_duration
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn record_conflict(&self, operation: &str) {
        self.order_conflicts.with_label_values(&[operation]).inc();
    }

    /// `reason` is "drained" or "explicit"
    pub fn record_deletion(&self, reason: &str) {
        self.orders_deleted.with_label_values(&[reason]).inc();
    }

    /// Gauge handed to a store's circuit breaker
    pub fn circuit_gauge(&self, store: &str) -> IntGauge {
        self.store_circuit_breaker_state.with_label_values(&[store])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(metrics: &Metrics, name: &str) -> f64 {
        metrics
            .registry()
            .gather()
            .iter()
            .find(|m| m.name() == name)
            .map(|m| m.metric.iter().map(|s| s.counter.value.unwrap_or(0.0)).sum())
            .unwrap_or(0.0)
    }

    #[test]
    fn test_record_operation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_operation("add_item", "ok", 0.004);
        metrics.record_operation("add_item", "ITEM_NOT_AVAILABLE", 0.001);

        assert_eq!(counter(&metrics, "order_operations_total"), 2.0);
        let gathered = metrics.registry().gather();
        let ops = gathered.iter().find(|m| m.name() == "order_operations_total").unwrap();
        assert_eq!(ops.metric.len(), 2); // Two outcome labels
    }

    #[test]
    fn test_conflicts_and_deletions() {
        let metrics = Metrics::new().unwrap();
        metrics.record_conflict("add_item");
        metrics.record_conflict("add_item");
        metrics.record_deletion("drained");

        assert_eq!(counter(&metrics, "order_conflicts_total"), 2.0);
        assert_eq!(counter(&metrics, "orders_deleted_total"), 1.0);
    }

    #[test]
    fn test_circuit_gauge_is_labelled_per_store() {
        let metrics = Metrics::new().unwrap();
        metrics.circuit_gauge("orders").set(1);
        metrics.circuit_gauge("catalog").set(0);

        let gathered = metrics.registry().gather();
        let state = gathered
            .iter()
            .find(|m| m.name() == "store_circuit_breaker_state")
            .unwrap();
        assert_eq!(state.metric.len(), 2);
        assert_eq!(metrics.circuit_gauge("orders").get(), 1);
    }
}
