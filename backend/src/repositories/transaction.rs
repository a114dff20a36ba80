//! Transaction boundaries for writes that must land together, such as an
//! override and its audit entries.

use sqlx::postgres::PgTransaction;
use sqlx::PgPool;

use crate::error::AppError;

fn internal(err: sqlx::Error) -> AppError {
    AppError::InternalServerError(err.into())
}

pub async fn begin_transaction(pool: &PgPool) -> Result<PgTransaction<'_>, AppError> {
    pool.begin().await.map_err(internal)
}

pub async fn commit_transaction(tx: PgTransaction<'_>) -> Result<(), AppError> {
    tx.commit().await.map_err(internal)
}

/// Discards every statement issued in `tx`.
pub async fn rollback_transaction(tx: PgTransaction<'_>) -> Result<(), AppError> {
    tx.rollback().await.map_err(internal)
}
