use std::backtrace::BacktraceStatus;
use std::fmt;
use std::sync::Arc;

use crate::error::HttpError;
use crate::persistence::PersistenceError;

/// Anything that can travel through the error pipeline
///
/// Only [`Failure::Http`] values can ever be trusted. Persistence failures
/// must be translated first, and internal errors always escalate.
#[derive(Debug, Clone)]
pub enum Failure {
    /// A classified taxonomy variant
    Http(HttpError),
    /// Native persistence failure that has not been translated yet
    Persistence(PersistenceError),
    /// Unrecognized error
    Internal(Arc<anyhow::Error>),
}

impl Failure {
    /// Wrap an arbitrary error as an untrusted internal failure
    pub fn internal(error: impl Into<anyhow::Error>) -> Self {
        Self::Internal(Arc::new(error.into()))
    }

    pub const fn as_http(&self) -> Option<&HttpError> {
        match self {
            Self::Http(error) => Some(error),
            _ => None,
        }
    }

    /// Discriminator used in log records
    pub fn name(&self) -> &'static str {
        match self {
            Self::Http(error) => error.kind().into(),
            Self::Persistence(error) => error.into(),
            Self::Internal(_) => "Error",
        }
    }

    /// Raw message, without any classification applied
    pub fn message(&self) -> String {
        match self {
            Self::Http(error) => error.message(),
            Self::Persistence(error) => error.to_string(),
            Self::Internal(error) => error.to_string(),
        }
    }

    /// Best available trace of where the failure originated
    pub fn stack(&self) -> String {
        match self {
            Self::Http(error) => format!("{}: {}\n    at {}", error.kind(), error.message(), error.location()),
            Self::Persistence(error) => format!("{error:?}"),
            Self::Internal(error) => {
                let backtrace = error.backtrace();
                if backtrace.status() == BacktraceStatus::Captured {
                    format!("{error:?}\n{backtrace}")
                } else {
                    format!("{error:?}")
                }
            }
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(error) => error.fmt(f),
            Self::Persistence(error) => write!(f, "{}: {error}", self.name()),
            Self::Internal(error) => write!(f, "Error: {error}"),
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(error) => Some(error),
            Self::Persistence(error) => Some(error),
            Self::Internal(error) => {
                let error: &anyhow::Error = error;
                Some(&**error)
            }
        }
    }
}

impl From<HttpError> for Failure {
    fn from(error: HttpError) -> Self {
        Self::Http(error)
    }
}

impl From<PersistenceError> for Failure {
    fn from(error: PersistenceError) -> Self {
        Self::Persistence(error)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        Self::Internal(Arc::new(error))
    }
}
