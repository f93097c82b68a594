//! Error counters recorded by the pipeline and the supervisor

use opentelemetry::KeyValue;
use opentelemetry::metrics::Counter;

pub const ERRORS_DISPATCHED: &str = "faultline.errors.dispatched";
pub const ERRORS_ESCALATED: &str = "faultline.errors.escalated";
pub const ERRORS_NOT_FOUND: &str = "faultline.errors.not_found";

/// Counters for classified, escalated and unmatched requests
///
/// Instruments come from the global meter provider, so they are no-ops
/// until [`crate::init`] installs an exporter.
#[derive(Debug, Clone)]
pub struct ErrorMetrics {
    dispatched: Counter<u64>,
    escalated: Counter<u64>,
    not_found: Counter<u64>,
}

impl Default for ErrorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorMetrics {
    pub fn new() -> Self {
        let meter = opentelemetry::global::meter("faultline");

        Self {
            dispatched: meter
                .u64_counter(ERRORS_DISPATCHED)
                .with_description("Trusted errors answered with a classified response")
                .build(),
            escalated: meter
                .u64_counter(ERRORS_ESCALATED)
                .with_description("Untrusted errors forwarded to the fatal path")
                .build(),
            not_found: meter
                .u64_counter(ERRORS_NOT_FOUND)
                .with_description("Requests that matched no route")
                .build(),
        }
    }

    pub fn record_dispatched(&self, status: u16, kind: &'static str) {
        self.dispatched
            .add(1, &[KeyValue::new("status", i64::from(status)), KeyValue::new("kind", kind)]);
    }

    pub fn record_escalated(&self, name: &'static str) {
        self.escalated.add(1, &[KeyValue::new("name", name)]);
    }

    pub fn record_not_found(&self) {
        self.not_found.add(1, &[]);
    }
}
