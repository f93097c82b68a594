use faultline_core::{ErrorHandler, Failure, RequestContext, ResponseSink};
use faultline_telemetry::ErrorMetrics;

use crate::pipeline::{ErrorStage, Flow};

/// The single choke point deciding between a response and escalation
///
/// Trusted failures are answered through the [`ErrorHandler`]; anything
/// else is forwarded untouched to the next stage and, ultimately, to the
/// fatal-path supervisor.
pub struct TrustedErrorGate {
    handler: ErrorHandler,
    metrics: ErrorMetrics,
}

impl TrustedErrorGate {
    pub const fn new(handler: ErrorHandler, metrics: ErrorMetrics) -> Self {
        Self { handler, metrics }
    }
}

impl ErrorStage for TrustedErrorGate {
    fn handle(&self, failure: Failure, context: &RequestContext, sink: &mut dyn ResponseSink) -> Flow {
        let trusted = self.handler.is_trusted_error(&failure);
        let info = match failure.as_http() {
            Some(error) if trusted => error.detail().to_string(),
            _ => failure.message(),
        };

        tracing::error!(
            source = "trusted_error_gate",
            info,
            name = failure.name(),
            stack = %failure.stack(),
            trusted,
            method = %context.method(),
            path = context.path(),
            request_id = context.request_id.as_deref(),
            "intercepted failure"
        );

        if !trusted {
            return Flow::Next(failure);
        }

        self.handler.handle_error(&failure, Some(sink));

        if let Some(error) = failure.as_http() {
            self.metrics.record_dispatched(error.status().as_u16(), error.kind().into());
        }

        Flow::Handled
    }
}
