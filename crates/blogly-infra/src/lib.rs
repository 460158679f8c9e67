//! # Blogly Infrastructure
//!
//! Concrete implementations of the repository ports defined in `blogly-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL support via SeaORM

pub mod database;

// Re-exports - In-Memory
pub use database::{
    InMemoryPostRepository, InMemoryStore, InMemoryTagRepository, InMemoryUserRepository,
};
pub use database::{DatabaseConfig, DatabaseConnections};

// Re-exports - Postgres
#[cfg(feature = "postgres")]
pub use database::{PostgresPostRepository, PostgresTagRepository, PostgresUserRepository};
