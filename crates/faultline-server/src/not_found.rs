use axum::Json;
use axum::extract::OriginalUri;
use axum::response::{IntoResponse, Response};
use faultline_core::HttpError;
use faultline_telemetry::ErrorMetrics;
use serde_json::json;

/// Fallback for requests that matched no route
///
/// Answers directly with a 404 payload; the failure never reaches the
/// error pipeline.
pub async fn not_found(metrics: ErrorMetrics, OriginalUri(uri): OriginalUri) -> Response {
    let path = uri.path();
    let error = HttpError::not_found(json!({ "path": path }), true);

    tracing::info!("Error 404. Cannot find {path} route.");
    metrics.record_not_found();

    (error.status(), Json(error.to_json())).into_response()
}
