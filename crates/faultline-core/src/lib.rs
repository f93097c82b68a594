//! Error taxonomy, persistence translation and dispatch
//!
//! Everything here is transport-agnostic: the server crate adapts these
//! types to axum, and the supervisor crate reuses the same [`ErrorHandler`]
//! for process-level failures.

#![allow(clippy::must_use_candidate)]

mod context;
mod dispatcher;
mod error;
mod failure;
pub mod persistence;

pub use context::RequestContext;
pub use dispatcher::{ErrorHandler, ResponseSink, generic_error_body};
pub use error::{ErrorKind, HttpError, TaxonomyError};
pub use failure::Failure;
pub use persistence::{ConstraintViolation, PersistenceError};
