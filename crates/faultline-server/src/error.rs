use axum::response::{IntoResponse, Response};
use faultline_core::Failure;
use http::StatusCode;

/// Error type for route handlers and middleware
///
/// Converting it into a response parks the failure in the response
/// extensions, where the error pipeline picks it up. Anything convertible
/// into a [`Failure`] converts into this, so handlers can use `?` on
/// taxonomy variants, persistence failures and `anyhow` errors alike.
#[derive(Debug)]
pub struct RouteError(pub Failure);

/// Failure waiting for the error pipeline
#[derive(Debug, Clone)]
pub(crate) struct PendingFailure(pub(crate) Failure);

impl<E> From<E> for RouteError
where
    E: Into<Failure>,
{
    fn from(error: E) -> Self {
        Self(error.into())
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        // The status only matters if no pipeline layer is installed
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(PendingFailure(self.0));
        response
    }
}
