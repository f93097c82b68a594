use std::sync::Arc;

use axum::Router;
use axum::extract::{OriginalUri, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use faultline_core::HttpError;
use faultline_telemetry::ErrorMetrics;
use http::Method;
use serde_json::json;

use crate::error::RouteError;
use crate::not_found::not_found;

/// Rejects requests whose method is outside `allowed`
///
/// The rejection is raised as an operational `MethodNotAllowed` into the
/// error pipeline rather than answered here.
pub async fn method_guard(allowed: Arc<[Method]>, request: Request, next: Next) -> Response {
    if allowed.contains(request.method()) {
        return next.run(request).await;
    }

    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().to_string(), |original| original.0.to_string());
    let msg = format!("{} request is not allowed at {uri}", request.method());

    tracing::warn!("{msg}");

    RouteError::from(HttpError::method_not_allowed(json!({ "msg": msg }), true)).into_response()
}

/// Restrict every route of `router` to the given methods
///
/// Only matched routes are guarded; unmatched paths still reach the
/// not-found fallback. An allowed method without a handler on the route is
/// answered like an unmatched path.
pub fn allow_methods<S>(router: Router<S>, methods: &[Method]) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let allowed: Arc<[Method]> = methods.into();
    let metrics = ErrorMetrics::new();

    // Set before the guard layer so the guard also wraps it
    router
        .method_not_allowed_fallback(move |uri: OriginalUri| not_found(metrics, uri))
        .route_layer(axum::middleware::from_fn(move |request: Request, next: Next| {
            let allowed = Arc::clone(&allowed);
            async move { method_guard(allowed, request, next).await }
        }))
}
