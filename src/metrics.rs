//! Statement metrics and tracing spans.
//!
//! With the `metrics` feature, every statement that passes through a
//! mapper is counted and timed, labelled with its kind (`select`, `count`,
//! `insert`, `update`, `delete`). [`MapperMetrics::render`] returns the
//! Prometheus text exposition.
//!
//! With the `tracing` feature, [`tracing_helpers`] opens spans around
//! statement execution and connection establishment.

#[cfg(feature = "metrics")]
pub use self::prometheus_metrics::{MapperMetrics, METRICS};

#[cfg(feature = "metrics")]
mod prometheus_metrics {
    use once_cell::sync::Lazy;
    use opentelemetry::metrics::{Counter, Histogram, MeterProvider};
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use prometheus::{Encoder, Registry, TextEncoder};
    use std::time::Duration;

    pub static METRICS: Lazy<MapperMetrics> = Lazy::new(MapperMetrics::init);

    pub struct MapperMetrics {
        registry: Registry,
        _provider: SdkMeterProvider,
        pub statements_total: Counter<u64>,
        pub statement_errors_total: Counter<u64>,
        pub statement_duration: Histogram<f64>,
    }

    impl MapperMetrics {
        pub fn init() -> Self {
            let registry = Registry::new();
            let exporter = opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
                .expect("failed to build prometheus exporter");
            let provider = SdkMeterProvider::builder().with_reader(exporter).build();
            let meter = provider.meter("dbmapper");

            let statements_total = meter
                .u64_counter("dbmapper_statements_total")
                .with_description("Statements executed through a mapper")
                .build();

            let statement_errors_total = meter
                .u64_counter("dbmapper_statement_errors_total")
                .with_description("Statements that failed in the driver")
                .build();

            let statement_duration = meter
                .f64_histogram("dbmapper_statement_duration_seconds")
                .with_description("Duration of mapper statements")
                .with_unit("s")
                .build();

            Self {
                registry,
                _provider: provider,
                statements_total,
                statement_errors_total,
                statement_duration,
            }
        }

        pub fn record_statement(&self, kind: &'static str, elapsed: Duration) {
            let labels = [KeyValue::new("kind", kind)];
            self.statements_total.add(1, &labels);
            self.statement_duration.record(elapsed.as_secs_f64(), &labels);
        }

        pub fn record_error(&self, kind: &'static str) {
            self.statement_errors_total.add(1, &[KeyValue::new("kind", kind)]);
        }

        /// Prometheus text exposition of everything recorded so far
        pub fn render(&self) -> String {
            let mut buffer = Vec::new();
            if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
                log::warn!("failed to encode metrics: {}", e);
                return String::new();
            }
            String::from_utf8(buffer).unwrap_or_default()
        }
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::Span;

    /// Span around one mapper statement
    pub fn execute_statement_span(kind: &str, table: &str, sql: &str) -> Span {
        tracing::debug_span!("dbmapper.statement", kind, table, db.statement = sql)
    }

    /// Span around opening a connection
    pub fn connect_span() -> Span {
        tracing::debug_span!("dbmapper.connect")
    }
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_statements_show_up_in_exposition() {
        METRICS.record_statement("select", Duration::from_millis(3));
        METRICS.record_error("delete");
        let text = METRICS.render();
        assert!(text.contains("dbmapper_statements_total"));
        assert!(text.contains("dbmapper_statement_errors_total"));
    }
}
