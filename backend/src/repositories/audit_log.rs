use async_trait::async_trait;
use sqlx::postgres::PgTransaction;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::audit_log::{AttendanceAuditLog, NewAuditEntry};
use crate::types::{AttendanceId, AuditLogId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLogRepositoryTrait: Send + Sync {
    /// Change history of one record, newest first.
    async fn list_for_attendance(
        &self,
        db: &PgPool,
        attendance_id: AttendanceId,
    ) -> Result<Vec<AttendanceAuditLog>, AppError>;
}

/// Append-only store for attendance corrections. There is no update or delete.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuditLogRepository;

impl AuditLogRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert_in_transaction(
        &self,
        tx: &mut PgTransaction<'_>,
        entry: &NewAuditEntry,
    ) -> Result<AuditLogId, AppError> {
        let id = AuditLogId::new();
        sqlx::query(
            "INSERT INTO attendance_audit_logs \
             (id, attendance_id, changed_by, field_changed, old_value, new_value, reason, ip_address) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id)
        .bind(entry.attendance_id)
        .bind(entry.changed_by)
        .bind(&entry.field_changed)
        .bind(entry.old_value.as_deref())
        .bind(entry.new_value.as_deref())
        .bind(&entry.reason)
        .bind(entry.ip_address.as_deref())
        .execute(tx.as_mut())
        .await?;
        Ok(id)
    }
}

#[async_trait]
impl AuditLogRepositoryTrait for AuditLogRepository {
    async fn list_for_attendance(
        &self,
        db: &PgPool,
        attendance_id: AttendanceId,
    ) -> Result<Vec<AttendanceAuditLog>, AppError> {
        let rows = sqlx::query_as::<_, AttendanceAuditLog>(
            "SELECT l.id, l.attendance_id, l.changed_by, u.name AS changed_by_name, l.field_changed, \
             l.old_value, l.new_value, l.reason, l.ip_address, l.created_at \
             FROM attendance_audit_logs l \
             LEFT JOIN users u ON u.id = l.changed_by \
             WHERE l.attendance_id = $1 \
             ORDER BY l.created_at DESC, l.id ASC",
        )
        .bind(attendance_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
