//! Database layer for data persistence and access.
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │  Arc<dyn LawFirmRepository>, ...
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - InMemoryStore or PgStore)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │  (or a locked in-memory snapshot)
//! └─────────────┘
//! ```
//!
//! - [`handlers`]: repository traits and implementations
//! - [`models`]: create/update requests accepted by the repositories
//! - [`errors`]: database-specific error types

pub mod errors;
pub mod handlers;
pub mod models;
