//! Repository implementations for data access.
//!
//! - [`repository`]: the [`LawFirmRepository`], [`SpecializationRepository`] and [`UserRepository`] traits
//! - [`InMemoryStore`]: lock-guarded in-memory store, optionally seeded with sample data
//! - [`PgStore`]: PostgreSQL store backed by a [`sqlx::PgPool`]

pub mod in_memory;
pub mod postgres;
pub mod repository;

pub use in_memory::InMemoryStore;
pub use postgres::PgStore;
pub use repository::{LawFirmRepository, SpecializationRepository, UserRepository};
