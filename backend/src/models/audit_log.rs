use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{AttendanceId, AuditLogId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
/// One field changed by one attendance override. Rows are never updated.
pub struct AttendanceAuditLog {
    pub id: AuditLogId,
    pub attendance_id: AttendanceId,
    pub changed_by: UserId,
    /// Name of the admin at read time; absent if the account was removed.
    pub changed_by_name: Option<String>,
    pub field_changed: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub reason: String,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub attendance_id: AttendanceId,
    pub changed_by: UserId,
    pub field_changed: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub reason: String,
    pub ip_address: Option<String>,
}
