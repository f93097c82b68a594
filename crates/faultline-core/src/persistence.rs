//! Persistence-layer failures and their translation into the taxonomy

use http::StatusCode;
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::HttpError;
use crate::failure::Failure;

/// Native failure categories reported by the persistence collaborator
#[derive(Debug, Clone, PartialEq, thiserror::Error, strum::IntoStaticStr)]
pub enum PersistenceError {
    /// Query or connection acquisition timed out
    #[error("{message}")]
    #[strum(serialize = "TimeoutError")]
    Timeout { message: String },

    /// A unique constraint rejected the write
    #[error("{message}")]
    #[strum(serialize = "UniqueConstraintError")]
    UniqueConstraint {
        message: String,
        /// Individual violations reported by the database
        errors: Vec<ConstraintViolation>,
        /// Columns participating in the violated constraint
        fields: Vec<String>,
    },

    /// A foreign key constraint rejected the write
    #[error("{message}")]
    #[strum(serialize = "ForeignKeyConstraintError")]
    ForeignKeyConstraint {
        message: String,
        fields: Vec<String>,
        /// Referenced table
        table: Option<String>,
        /// Offending value
        value: Option<Value>,
        /// Name of the index backing the constraint
        index: Option<String>,
    },

    /// Connection could not be established or was lost
    #[error("{message}")]
    #[strum(serialize = "ConnectionError")]
    Connection { message: String },

    /// Model-level validation failed before reaching the database
    #[error("{message}")]
    #[strum(serialize = "ValidationError")]
    Validation { message: String },

    /// Any other database failure
    #[error("{message}")]
    #[strum(serialize = "DatabaseError")]
    Database { message: String },
}

impl PersistenceError {
    pub fn message(&self) -> &str {
        match self {
            Self::Timeout { message }
            | Self::UniqueConstraint { message, .. }
            | Self::ForeignKeyConstraint { message, .. }
            | Self::Connection { message }
            | Self::Validation { message }
            | Self::Database { message } => message,
        }
    }
}

/// One violated constraint item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintViolation {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Map a persistence failure onto its taxonomy variant
///
/// Every persistence failure is operational, including the ones answered
/// with a 500: the status says where the cause lies, not whether the
/// process can keep running.
pub fn classify(error: &PersistenceError) -> HttpError {
    match error {
        PersistenceError::Timeout { message } => {
            HttpError::database(StatusCode::GATEWAY_TIMEOUT, json!({ "message": message }), true)
        }
        PersistenceError::UniqueConstraint { message, errors, fields } => HttpError::database(
            StatusCode::CONFLICT,
            json!({
                "message": message,
                "errors": errors,
                "fields": fields,
            }),
            true,
        ),
        PersistenceError::ForeignKeyConstraint {
            message,
            fields,
            table,
            value,
            index,
        } => HttpError::database(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "message": message,
                "fields": fields,
                "table": table,
                "value": value,
                "index": index,
            }),
            true,
        ),
        PersistenceError::Connection { message }
        | PersistenceError::Validation { message }
        | PersistenceError::Database { message } => {
            HttpError::database(StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": message }), true)
        }
    }
}

impl From<PersistenceError> for HttpError {
    fn from(error: PersistenceError) -> Self {
        classify(&error)
    }
}

/// Translate a persistence failure into the taxonomy
///
/// Anything that is not a persistence failure is returned unchanged.
pub fn translate(failure: Failure) -> Failure {
    match failure {
        Failure::Persistence(error) => {
            let name: &'static str = (&error).into();
            tracing::error!(source = "persistence", name = name, "persistence failure: {error}");
            Failure::Http(classify(&error))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn unique_violation() -> PersistenceError {
        PersistenceError::UniqueConstraint {
            message: "Validation error".to_owned(),
            errors: vec![ConstraintViolation {
                message: "email must be unique".to_owned(),
                path: Some("email".to_owned()),
                value: Some(json!("a@b.c")),
            }],
            fields: vec!["email".to_owned()],
        }
    }

    fn foreign_key_violation() -> PersistenceError {
        PersistenceError::ForeignKeyConstraint {
            message: "insert or update violates foreign key".to_owned(),
            fields: vec!["owner_id".to_owned()],
            table: Some("owners".to_owned()),
            value: Some(json!(7)),
            index: Some("widgets_owner_id_fkey".to_owned()),
        }
    }

    #[test]
    fn timeout_maps_to_gateway_timeout() {
        let error = classify(&PersistenceError::Timeout {
            message: "query timed out".to_owned(),
        });

        assert_eq!(error.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(error.kind(), ErrorKind::Database);
        assert!(error.is_operational());
        assert_eq!(error.detail(), &json!({ "message": "query timed out" }));
    }

    #[test]
    fn unique_constraint_maps_to_conflict() {
        let error = classify(&unique_violation());

        assert_eq!(error.status(), StatusCode::CONFLICT);
        assert!(error.is_operational());
        assert_eq!(
            error.detail(),
            &json!({
                "message": "Validation error",
                "errors": [{ "message": "email must be unique", "path": "email", "value": "a@b.c" }],
                "fields": ["email"],
            })
        );
    }

    #[test]
    fn foreign_key_maps_to_operational_internal_error() {
        let error = classify(&foreign_key_violation());

        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error.is_operational());
        assert_eq!(error.detail()["table"], "owners");
        assert_eq!(error.detail()["value"], 7);
        assert_eq!(error.detail()["index"], "widgets_owner_id_fkey");
        assert_eq!(error.detail()["fields"], json!(["owner_id"]));
    }

    #[test]
    fn other_persistence_failures_keep_only_the_message() {
        for native in [
            PersistenceError::Connection {
                message: "refused".to_owned(),
            },
            PersistenceError::Validation {
                message: "bad row".to_owned(),
            },
            PersistenceError::Database {
                message: "syntax error".to_owned(),
            },
        ] {
            let error = classify(&native);
            assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(error.is_operational());
            assert_eq!(error.detail(), &json!({ "message": native.message() }));
        }
    }

    #[test]
    fn classification_is_deterministic() {
        for native in [unique_violation(), foreign_key_violation()] {
            let first = classify(&native);
            let second = classify(&native);
            assert_eq!(first.status(), second.status());
            assert_eq!(first.is_operational(), second.is_operational());
            assert_eq!(first.detail(), second.detail());
        }
    }

    #[test]
    fn translate_passes_other_failures_through() {
        let failure = translate(Failure::internal(anyhow::anyhow!("not a database problem")));
        assert!(matches!(failure, Failure::Internal(_)));

        let http = HttpError::not_found(json!({ "path": "/x" }), true);
        let failure = translate(Failure::Http(http));
        assert_eq!(failure.as_http().map(HttpError::status), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn translate_converts_persistence_failures() {
        let failure = translate(Failure::Persistence(unique_violation()));
        let error = failure.as_http().unwrap();
        assert_eq!(error.status(), StatusCode::CONFLICT);
        assert_eq!(error.kind(), ErrorKind::Database);
    }
}
