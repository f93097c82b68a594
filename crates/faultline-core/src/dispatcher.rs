use http::StatusCode;
use serde_json::{Value, json};

use crate::failure::Failure;

/// Destination for the single response a request may receive
pub trait ResponseSink {
    /// Whether a response has already been written
    fn headers_sent(&self) -> bool;

    /// Write the response status and JSON body
    fn send(&mut self, status: StatusCode, body: Value);
}

/// Body written when no classified response applies
pub fn generic_error_body() -> Value {
    json!({
        "httpCode": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        "error": { "message": "Internal Server Error" },
    })
}

/// Decides whether failures are trusted and turns them into responses
///
/// Holds no state, so one value is built at startup and shared by every
/// pipeline stage and by the fatal-path supervisor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorHandler;

impl ErrorHandler {
    pub const fn new() -> Self {
        Self
    }

    /// A failure is trusted iff it is a taxonomy variant flagged operational
    pub const fn is_trusted_error(&self, failure: &Failure) -> bool {
        matches!(failure, Failure::Http(error) if error.is_operational())
    }

    /// Log a failure and answer it on `sink`, if given
    ///
    /// Operational taxonomy variants are written with their own status and
    /// payload. If nothing has been written afterwards, a generic 500 is
    /// written instead. The sink is never written twice and this never fails.
    pub fn handle_error(&self, failure: &Failure, mut sink: Option<&mut dyn ResponseSink>) {
        if let Failure::Http(error) = failure {
            let status = error.status().as_u16();
            tracing::warn!(status, kind = %error.kind(), "HttpError {status}: {error}");

            if error.is_operational()
                && let Some(sink) = sink.as_deref_mut()
                && !sink.headers_sent()
            {
                sink.send(error.status(), error.to_json());
            }
        }

        if sink.as_deref().is_none_or(|sink| !sink.headers_sent()) {
            tracing::error!(name = failure.name(), "Server error: {failure}");

            if let Some(sink) = sink {
                sink.send(StatusCode::INTERNAL_SERVER_ERROR, generic_error_body());
            }
        }
    }
}
