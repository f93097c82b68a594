use std::fmt;
use std::panic::Location;

use http::StatusCode;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;

/// Discriminator for the closed set of taxonomy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
pub enum ErrorKind {
    /// Generic HTTP error with a raiser-chosen status
    #[strum(serialize = "HttpError")]
    Http,
    /// Request method outside the route's allow-list (405)
    MethodNotAllowed,
    /// No route matched the request (404)
    NotFound,
    /// Translated persistence-layer failure
    #[strum(serialize = "DatabaseError")]
    Database,
}

/// Errors raised while constructing taxonomy variants
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaxonomyError {
    /// Status code outside the `100..=599` range
    #[error("invalid HTTP status code: {0}")]
    InvalidStatus(u16),
}

/// A classified error carrying a transport status, an operational flag and
/// a structured, serializable detail
///
/// Values are immutable once built. Whether the detail may be exposed to the
/// caller is decided by the dispatcher from the operational flag, not here.
#[derive(Debug, Clone)]
pub struct HttpError {
    kind: ErrorKind,
    status: StatusCode,
    detail: Value,
    operational: bool,
    location: &'static Location<'static>,
}

impl HttpError {
    /// Generic HTTP error with an explicit status
    #[track_caller]
    pub fn new(status: StatusCode, detail: Value, operational: bool) -> Self {
        Self::with_kind(ErrorKind::Http, status, detail, operational)
    }

    /// Generic HTTP error from a raw status code
    ///
    /// # Errors
    ///
    /// Returns [`TaxonomyError::InvalidStatus`] if `code` is not in `100..=599`
    #[track_caller]
    pub fn try_from_code(code: u16, detail: Value, operational: bool) -> Result<Self, TaxonomyError> {
        if !(100..=599).contains(&code) {
            return Err(TaxonomyError::InvalidStatus(code));
        }

        let status = StatusCode::from_u16(code).map_err(|_| TaxonomyError::InvalidStatus(code))?;
        Ok(Self::new(status, detail, operational))
    }

    /// Generic HTTP error from any serializable detail
    ///
    /// Serialization is best-effort: a detail that fails to serialize is
    /// replaced by a message describing the failure.
    #[track_caller]
    pub fn from_serializable<T>(status: StatusCode, detail: &T, operational: bool) -> Self
    where
        T: Serialize + ?Sized,
    {
        let detail = serde_json::to_value(detail).unwrap_or_else(
            |e| serde_json::json!({ "message": format!("unserializable error detail: {e}") }),
        );
        Self::new(status, detail, operational)
    }

    /// 405 Method Not Allowed
    #[track_caller]
    pub fn method_not_allowed(detail: Value, operational: bool) -> Self {
        Self::with_kind(ErrorKind::MethodNotAllowed, StatusCode::METHOD_NOT_ALLOWED, detail, operational)
    }

    /// 404 Not Found
    #[track_caller]
    pub fn not_found(detail: Value, operational: bool) -> Self {
        Self::with_kind(ErrorKind::NotFound, StatusCode::NOT_FOUND, detail, operational)
    }

    /// Persistence failure with a translator-chosen status
    #[track_caller]
    pub fn database(status: StatusCode, detail: Value, operational: bool) -> Self {
        Self::with_kind(ErrorKind::Database, status, detail, operational)
    }

    #[track_caller]
    fn with_kind(kind: ErrorKind, status: StatusCode, detail: Value, operational: bool) -> Self {
        Self {
            kind,
            status,
            detail,
            operational,
            location: Location::caller(),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub const fn detail(&self) -> &Value {
        &self.detail
    }

    /// Whether the failure is expected and safe to describe to the caller
    pub const fn is_operational(&self) -> bool {
        self.operational
    }

    /// Source location where the error was raised
    pub const fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Short human-readable message extracted from the detail
    ///
    /// Uses the detail itself when it is a string, its `message` or `msg`
    /// field when it is an object, and the compact JSON otherwise.
    pub fn message(&self) -> String {
        match &self.detail {
            Value::String(s) => s.clone(),
            Value::Object(map) => ["message", "msg"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map_or_else(|| self.detail.to_string(), str::to_owned),
            other => other.to_string(),
        }
    }

    /// Wire payload: `{"httpCode": <status>, "error": <detail>}`
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "httpCode": self.status.as_u16(),
            "error": self.detail,
        })
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message())
    }
}

impl std::error::Error for HttpError {}

impl Serialize for HttpError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("HttpError", 2)?;
        state.serialize_field("httpCode", &self.status.as_u16())?;
        state.serialize_field("error", &self.detail)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    #[test]
    fn serialized_shape_mirrors_status_and_detail() {
        let variants = [
            HttpError::new(StatusCode::IM_A_TEAPOT, json!("short and stout"), true),
            HttpError::method_not_allowed(json!({ "msg": "DELETE request is not allowed at /widgets" }), true),
            HttpError::not_found(json!({ "path": "/widgets/42" }), true),
            HttpError::database(StatusCode::GATEWAY_TIMEOUT, json!({ "message": "timed out" }), true),
        ];

        for variant in variants {
            let wire = serde_json::to_value(&variant).unwrap();
            assert_eq!(wire["httpCode"], variant.status().as_u16());
            assert_eq!(&wire["error"], variant.detail());
            assert_eq!(wire, variant.to_json());
        }
    }

    #[test]
    fn not_found_payload() {
        let error = HttpError::not_found(json!({ "path": "/widgets/42" }), true);

        insta::assert_json_snapshot!(error, @r#"
        {
          "httpCode": 404,
          "error": {
            "path": "/widgets/42"
          }
        }
        "#);
    }

    #[test]
    fn named_variants_fix_their_status() {
        assert_eq!(
            HttpError::method_not_allowed(json!({}), true).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(HttpError::not_found(json!({}), true).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn kind_names() {
        assert_eq!(ErrorKind::Http.to_string(), "HttpError");
        assert_eq!(ErrorKind::MethodNotAllowed.to_string(), "MethodNotAllowed");
        assert_eq!(ErrorKind::NotFound.to_string(), "NotFound");
        assert_eq!(ErrorKind::Database.to_string(), "DatabaseError");
    }

    #[test]
    fn operational_flag_is_carried_verbatim() {
        assert!(HttpError::new(StatusCode::BAD_REQUEST, json!("bad"), true).is_operational());
        assert!(!HttpError::new(StatusCode::BAD_REQUEST, json!("bad"), false).is_operational());
    }

    #[test]
    fn try_from_code_rejects_out_of_range() {
        assert_eq!(
            HttpError::try_from_code(99, json!("x"), true).unwrap_err(),
            TaxonomyError::InvalidStatus(99)
        );
        assert_eq!(
            HttpError::try_from_code(600, json!("x"), true).unwrap_err(),
            TaxonomyError::InvalidStatus(600)
        );

        let ok = HttpError::try_from_code(422, json!("x"), true).unwrap();
        assert_eq!(ok.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ok.kind(), ErrorKind::Http);
    }

    #[test]
    fn unserializable_detail_is_replaced() {
        // Non-string map keys cannot be represented in JSON
        let mut detail = HashMap::new();
        detail.insert((1, 2), "pair");

        let error = HttpError::from_serializable(StatusCode::BAD_REQUEST, &detail, true);
        let message = error.detail()["message"].as_str().unwrap();
        assert!(message.starts_with("unserializable error detail"));
    }

    #[test]
    fn message_prefers_message_fields() {
        assert_eq!(HttpError::new(StatusCode::CONFLICT, json!("plain"), true).message(), "plain");
        assert_eq!(
            HttpError::new(StatusCode::CONFLICT, json!({ "message": "dup", "fields": ["a"] }), true).message(),
            "dup"
        );
        assert_eq!(
            HttpError::new(StatusCode::CONFLICT, json!({ "msg": "nope" }), true).message(),
            "nope"
        );
        assert_eq!(
            HttpError::new(StatusCode::CONFLICT, json!({ "path": "/x" }), true).message(),
            r#"{"path":"/x"}"#
        );
    }

    #[test]
    fn location_points_at_raiser() {
        let error = HttpError::not_found(json!({}), true);
        assert!(error.location().file().ends_with("error.rs"));
    }
}
