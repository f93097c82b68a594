use axum::Json;
use axum::response::{IntoResponse, Response};
use faultline_core::ResponseSink;
use http::StatusCode;
use serde_json::Value;

/// Holds the one response an intercepted request may receive
///
/// The first write wins; later writes are ignored.
#[derive(Debug, Default)]
pub struct ResponseSlot {
    response: Option<Response>,
}

impl ResponseSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The written response, if any
    pub fn into_response(self) -> Option<Response> {
        self.response
    }
}

impl ResponseSink for ResponseSlot {
    fn headers_sent(&self) -> bool {
        self.response.is_some()
    }

    fn send(&mut self, status: StatusCode, body: Value) {
        if self.response.is_none() {
            self.response = Some((status, Json(body)).into_response());
        }
    }
}
