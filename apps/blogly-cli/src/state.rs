//! Application state - the repositories every command runs against.

use std::sync::Arc;

use anyhow::Context;

use blogly_core::ports::{PostRepository, TagRepository, UserRepository};
use blogly_infra::database::{
    DatabaseConfig, DatabaseConnections, PostgresPostRepository, PostgresTagRepository,
    PostgresUserRepository,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// State backed by a fresh in-memory store.
    ///
    /// Each CLI invocation is its own process, so a store that dies with it
    /// is only useful for exercising commands in tests.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        use blogly_infra::database::{
            InMemoryPostRepository, InMemoryStore, InMemoryTagRepository, InMemoryUserRepository,
        };

        let store = InMemoryStore::new();
        Self {
            users: Arc::new(InMemoryUserRepository::new(store.clone())),
            posts: Arc::new(InMemoryPostRepository::new(store.clone())),
            tags: Arc::new(InMemoryTagRepository::new(store)),
            db: None,
        }
    }

    /// Connect the PostgreSQL repositories.
    pub async fn new(db_config: Option<&DatabaseConfig>) -> anyhow::Result<Self> {
        let config = db_config.context("DATABASE_URL must be set")?;

        let connections = DatabaseConnections::init(config)
            .await
            .context("Failed to connect to database")?;
        let conn = Arc::new(connections);

        tracing::debug!("Application state initialized");
        Ok(Self {
            users: Arc::new(PostgresUserRepository::new(conn.handle())),
            posts: Arc::new(PostgresPostRepository::new(conn.handle())),
            tags: Arc::new(PostgresTagRepository::new(conn.handle())),
            db: Some(conn),
        })
    }

    /// The live database connection.
    pub fn database(&self) -> anyhow::Result<sea_orm::DbConn> {
        self.db
            .as_ref()
            .map(|conn| conn.handle())
            .context("This command needs DATABASE_URL to be set")
    }
}
