use std::marker::PhantomData;

use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseTransaction, DbConn, DbErr, EntityTrait, IsolationLevel,
    PrimaryKeyTrait, SqlErr, TransactionTrait,
};

use blogly_core::DomainError;
use blogly_core::error::RepoError;

/// Generic PostgreSQL repository over one SeaORM entity.
///
/// Holds the injected connection; every operation either uses it directly
/// (single-statement reads), opens a read snapshot (multi-statement reads) or
/// opens a transaction on it.
pub struct PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub(crate) db: DbConn,
    _entity: PhantomData<E>,
}

impl<E> PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    /// Read-only transaction whose statements all see one snapshot, so rows and
    /// their association rows are loaded consistently.
    pub(crate) async fn snapshot(&self) -> Result<DatabaseTransaction, DomainError> {
        self.db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await
            .map_err(db_err)
    }
}

impl<E> PostgresBaseRepository<E>
where
    E: EntityTrait,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = i32>,
{
    /// Load a row by primary key or fail with `NotFound`.
    pub(crate) async fn fetch<C>(
        conn: &C,
        id: i32,
        entity_type: &'static str,
    ) -> Result<E::Model, DomainError>
    where
        C: ConnectionTrait,
    {
        E::find_by_id(id)
            .one(conn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found(entity_type, id))
    }
}

/// Sort a SeaORM failure into a storage-level error.
pub(crate) fn classify(err: DbErr) -> RepoError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => return RepoError::Constraint(msg),
        Some(SqlErr::ForeignKeyConstraintViolation(msg)) => return RepoError::ForeignKey(msg),
        _ => {}
    }

    match &err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => RepoError::Connection(err.to_string()),
        _ => RepoError::Query(err.to_string()),
    }
}

/// Map a SeaORM failure to the domain error surfaced to callers.
pub(crate) fn db_err(err: DbErr) -> DomainError {
    let err = classify(err);
    match &err {
        RepoError::Connection(msg) => tracing::error!("Database connection error: {}", msg),
        RepoError::Query(msg) => tracing::error!("Database query error: {}", msg),
        RepoError::Constraint(msg) | RepoError::ForeignKey(msg) => {
            tracing::debug!("Constraint rejected write: {}", msg)
        }
    }
    err.into()
}
