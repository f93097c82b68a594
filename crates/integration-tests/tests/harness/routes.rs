//! Widget routes raising every kind of failure the pipeline handles

use axum::Router;
use axum::extract::Path;
use axum::http::{Method, StatusCode};
use axum::routing::get;
use faultline_core::{ConstraintViolation, HttpError, PersistenceError};
use faultline_server::{RouteError, allow_methods};
use serde_json::json;

pub fn widgets() -> Router {
    let routes = Router::new()
        .route("/widgets", get(list).post(create))
        .route("/widgets/{id}", get(show))
        .route("/widgets/{id}/owner", get(owner));

    allow_methods(routes, &[Method::GET, Method::POST])
}

async fn list() -> &'static str {
    "[]"
}

async fn create() -> Result<StatusCode, RouteError> {
    Err(PersistenceError::UniqueConstraint {
        message: "Validation error".to_owned(),
        errors: vec![ConstraintViolation {
            message: "name must be unique".to_owned(),
            path: Some("name".to_owned()),
            value: Some(json!("sprocket")),
        }],
        fields: vec!["name".to_owned()],
    }
    .into())
}

async fn show(Path(id): Path<String>) -> Result<String, RouteError> {
    match id.as_str() {
        "slow" => Err(PersistenceError::Timeout {
            message: "query timed out".to_owned(),
        }
        .into()),
        "teapot" => Err(HttpError::new(StatusCode::IM_A_TEAPOT, json!({ "message": "short and stout" }), true).into()),
        "secret" => Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            json!({ "message": "table widgets is corrupt" }),
            false,
        )
        .into()),
        "bug" => Err(anyhow::anyhow!("widget cache is inconsistent").into()),
        _ => Ok(format!("widget {id}")),
    }
}

async fn owner() -> Result<String, RouteError> {
    Err(PersistenceError::ForeignKeyConstraint {
        message: "insert or update violates foreign key".to_owned(),
        fields: vec!["owner_id".to_owned()],
        table: Some("owners".to_owned()),
        value: Some(json!(7)),
        index: Some("widgets_owner_id_fkey".to_owned()),
    }
    .into())
}
