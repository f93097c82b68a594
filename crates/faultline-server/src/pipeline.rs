//! Ordered error-handling stages run for every failed request

use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use faultline_core::{ErrorHandler, Failure, RequestContext, ResponseSink, persistence};
use faultline_supervisor::Supervisor;
use faultline_telemetry::ErrorMetrics;

use crate::error::PendingFailure;
use crate::gate::TrustedErrorGate;
use crate::sink::ResponseSlot;

/// What a stage did with the failure it received
#[derive(Debug)]
pub enum Flow {
    /// Pass the (possibly replaced) failure to the next stage
    Next(Failure),
    /// The failure was dealt with; later stages are skipped
    Handled,
}

/// One step of the error pipeline
pub trait ErrorStage: Send + Sync {
    fn handle(&self, failure: Failure, context: &RequestContext, sink: &mut dyn ResponseSink) -> Flow;
}

/// Replaces persistence failures with their taxonomy variant
#[derive(Debug, Clone, Copy, Default)]
pub struct TranslatePersistence;

impl ErrorStage for TranslatePersistence {
    fn handle(&self, failure: Failure, _context: &RequestContext, _sink: &mut dyn ResponseSink) -> Flow {
        Flow::Next(persistence::translate(failure))
    }
}

/// Stages in the order they run
#[derive(Default)]
pub struct ErrorPipeline {
    stages: Vec<Box<dyn ErrorStage>>,
}

impl ErrorPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persistence translation followed by the trusted-error gate
    pub fn standard(handler: ErrorHandler) -> Self {
        Self::new()
            .stage(TranslatePersistence)
            .stage(TrustedErrorGate::new(handler, ErrorMetrics::new()))
    }

    /// Append a stage
    #[must_use]
    pub fn stage(mut self, stage: impl ErrorStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Run every stage until one reports the failure as handled
    ///
    /// Returns the failure if it passed through all stages.
    pub fn run(&self, failure: Failure, context: &RequestContext, sink: &mut dyn ResponseSink) -> Option<Failure> {
        let mut failure = failure;

        for stage in &self.stages {
            match stage.handle(failure, context, sink) {
                Flow::Next(next) => failure = next,
                Flow::Handled => return None,
            }
        }

        Some(failure)
    }
}

/// Shared state of [`error_pipeline_middleware`]
#[derive(Clone)]
pub struct PipelineState {
    pub pipeline: Arc<ErrorPipeline>,
    pub supervisor: Supervisor,
    pub metrics: ErrorMetrics,
}

/// Runs the error pipeline on failures raised by inner handlers
///
/// Inserts a [`RequestContext`] for the handlers, then looks for a failure
/// parked by [`crate::RouteError`] in the response. Failures left over after
/// the last stage are escalated to the supervisor and the client gets the
/// empty 500 produced by the route.
pub async fn error_pipeline_middleware(state: PipelineState, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let context = RequestContext::from_parts(&parts);

    let mut request = Request::from_parts(parts, body);
    request.extensions_mut().insert(context.clone());

    let mut response = next.run(request).await;

    let Some(PendingFailure(failure)) = response.extensions_mut().remove::<PendingFailure>() else {
        return response;
    };

    let mut slot = ResponseSlot::new();

    if let Some(failure) = state.pipeline.run(failure, &context, &mut slot) {
        state.metrics.record_escalated(failure.name());
        state.supervisor.uncaught(&failure);
    }

    slot.into_response().unwrap_or(response)
}
