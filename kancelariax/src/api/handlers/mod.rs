//! HTTP request handlers for all API endpoints.
//!
//! Each handler validates its input, calls the repositories held in [`crate::AppState`], and
//! serializes the result as a JSON:API document.
//!
//! - [`law_firms`]: directory search, firm CRUD and lawyers
//! - [`specializations`]: specialization catalogue
//! - [`users`]: admin user management
//! - [`dashboard`]: admin dashboard statistics
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Result`]; every failure is rendered by
//! [`crate::errors::Error`]'s `IntoResponse` as `{error}` or `{error, details}`.

pub mod dashboard;
pub mod law_firms;
pub mod specializations;
pub mod users;

use crate::errors::Error;
use uuid::Uuid;

/// Parse a path ID, reporting a malformed one with `message`.
fn parse_id(raw: &str, message: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(raw).map_err(|_| Error::BadRequest {
        message: message.to_string(),
    })
}
