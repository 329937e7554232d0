//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures, query validation and pagination
//! - **[`extract`]**: Extractors that turn malformed input into the JSON error body
//!
//! # API Structure
//!
//! Every route below is mounted under the configured base path (`/api/v1` by default):
//!
//! - **Law firms** (`/law-firms/*`): search, read, create, update, soft delete, lawyers
//! - **Specializations** (`/specializations`): catalogue listing and creation
//! - **Admin users** (`/admin/users/*`): user list with statistics, CRUD and activation
//!
//! Responses are JSON:API documents built by [`crate::jsonapi`]. All endpoints are documented
//! with `utoipa`; the document is served at `/api-docs/openapi.json`.

pub mod extract;
pub mod handlers;
pub mod models;
