//! The attendance recorder: clock events, admin overrides and per-user reads.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use sqlx::PgPool;

use crate::config::AttendancePolicy;
use crate::error::{AppError, AttendanceError};
use crate::models::attendance::{
    Attendance, AttendanceDetailResponse, AttendanceRow, MyAttendanceResponse,
    TodayAttendanceResponse,
};
use crate::models::audit_log::NewAuditEntry;
use crate::models::report::AttendanceStats;
use crate::models::user::{Capability, User};
use crate::models::PaginationQuery;
use crate::repositories::{
    begin_transaction, commit_transaction, rollback_transaction, AttendanceRepository,
    AttendanceRepositoryTrait, AttendanceRowFilter, AuditLogRepository, AuditLogRepositoryTrait,
    ClockInEntry, ClockOutEntry,
};
use crate::services::attendance_rules::{
    plan_clock_in, plan_clock_out, plan_override, AttendanceChanges,
};
use crate::services::reporting::attendance_stats;
use crate::services::visibility::{can_view_audit_history, can_view_record, AttendanceScope};
use crate::types::{AttendanceId, UserId};
use crate::utils::time::month_bounds;

/// Request metadata stored with clock events and audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Clone)]
pub struct AttendanceService {
    pool: PgPool,
    policy: AttendancePolicy,
    attendance: Arc<dyn AttendanceRepositoryTrait>,
    audit_logs: Arc<dyn AuditLogRepositoryTrait>,
}

impl AttendanceService {
    pub fn new(
        pool: PgPool,
        policy: AttendancePolicy,
        attendance: Arc<dyn AttendanceRepositoryTrait>,
        audit_logs: Arc<dyn AuditLogRepositoryTrait>,
    ) -> Self {
        Self {
            pool,
            policy,
            attendance,
            audit_logs,
        }
    }

    pub fn policy(&self) -> &AttendancePolicy {
        &self.policy
    }

    pub async fn today(&self, user: &User, now: NaiveDateTime) -> Result<TodayAttendanceResponse, AppError> {
        let date = now.date();
        let attendance = self
            .attendance
            .find_by_user_and_date(&self.pool, user.id, date)
            .await?;
        let can_clock_in = attendance.as_ref().map_or(true, |record| !record.has_clocked_in());
        let can_clock_out = attendance
            .as_ref()
            .is_some_and(|record| record.has_clocked_in() && !record.has_clocked_out());

        Ok(TodayAttendanceResponse {
            date,
            is_weekend: user.is_weekend(date.weekday()),
            attendance,
            can_clock_in,
            can_clock_out,
        })
    }

    /// Records the caller's clock-in for the date of `now`.
    pub async fn clock_in(&self, user: &User, now: NaiveDateTime, client: ClientInfo) -> Result<Attendance, AppError> {
        user.require(Capability::RecordOwnAttendance)?;

        let plan = plan_clock_in(&self.policy, now, user.is_weekend(now.date().weekday()));
        let entry = ClockInEntry {
            user_id: user.id,
            date: plan.date,
            clock_in: plan.clock_in,
            break_minutes: plan.break_minutes,
            is_late: plan.lateness.is_late,
            late_minutes: plan.lateness.late_minutes,
            status: plan.status,
            ip: client.ip,
            user_agent: client.user_agent,
        };

        let Some(record) = self.attendance.upsert_clock_in(&self.pool, &entry).await? else {
            tracing::info!(user_id = %user.id, date = %plan.date, "duplicate clock-in rejected");
            return Err(AttendanceError::AlreadyClockedIn.into());
        };

        tracing::info!(
            user_id = %user.id,
            attendance_id = %record.id,
            date = %record.date,
            is_late = record.is_late,
            late_minutes = record.late_minutes,
            status = record.status.as_str(),
            "clock-in recorded"
        );
        Ok(record)
    }

    /// Closes the caller's record for the date of `now`.
    pub async fn clock_out(&self, user: &User, now: NaiveDateTime, client: ClientInfo) -> Result<Attendance, AppError> {
        user.require(Capability::RecordOwnAttendance)?;

        let today = self
            .attendance
            .find_by_user_and_date(&self.pool, user.id, now.date())
            .await?;
        let plan = plan_clock_out(&self.policy, today.as_ref(), now)?;
        let Some(record) = today else {
            return Err(AttendanceError::NotClockedIn.into());
        };

        let entry = ClockOutEntry {
            clock_out: plan.clock_out,
            gross_minutes: plan.worked.gross,
            net_minutes: plan.worked.net,
            early_exit_minutes: plan.early_exit_minutes,
            ip: client.ip,
            user_agent: client.user_agent,
        };

        let Some(updated) = self
            .attendance
            .record_clock_out(&self.pool, record.id, &entry)
            .await?
        else {
            return Err(AttendanceError::AlreadyClockedOut.into());
        };

        tracing::info!(
            user_id = %user.id,
            attendance_id = %updated.id,
            net_minutes = plan.worked.net,
            early_exit_minutes = plan.early_exit_minutes,
            "clock-out recorded"
        );
        Ok(updated)
    }

    /// The caller's records for one month, newest first.
    pub async fn my_month(
        &self,
        user: &User,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<MyAttendanceResponse, AppError> {
        let (start, end) = month_bounds(year, month)
            .ok_or_else(|| AppError::validation("month", "Month must be between 1 and 12."))?;
        let mut attendances = self
            .attendance
            .find_by_user_in_range(&self.pool, user.id, start, end)
            .await?;
        attendances.reverse();
        let stats = attendance_stats(&attendances);

        let recorded = self.attendance.years_with_records(&self.pool, user.id).await?;
        let first_year = recorded
            .iter()
            .copied()
            .min()
            .unwrap_or(today.year())
            .min(today.year());

        Ok(MyAttendanceResponse {
            month,
            year,
            start_date: start,
            end_date: end,
            attendances,
            stats,
            available_years: (first_year..=today.year()).rev().collect(),
        })
    }

    /// Stats over the caller's records in the month containing `today`.
    pub async fn month_stats(&self, user_id: UserId, today: NaiveDate) -> Result<AttendanceStats, AppError> {
        let Some((start, end)) = month_bounds(today.year(), today.month()) else {
            return Ok(AttendanceStats::default());
        };
        let records = self
            .attendance
            .find_by_user_in_range(&self.pool, user_id, start, end)
            .await?;
        Ok(attendance_stats(&records))
    }

    pub async fn records_for(
        &self,
        user_ids: &[UserId],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Attendance>, AppError> {
        self.attendance
            .find_for_users_in_range(&self.pool, user_ids, from, to)
            .await
    }

    /// Joined rows for a scoped filter; `None` yields an empty page without querying.
    pub async fn rows(
        &self,
        filter: Option<AttendanceRowFilter>,
        page: Option<&PaginationQuery>,
    ) -> Result<(Vec<AttendanceRow>, i64), AppError> {
        let Some(filter) = filter else {
            return Ok((Vec::new(), 0));
        };
        let page = page.map(|page| (page.limit(), page.offset()));
        self.attendance.list_rows(&self.pool, &filter, page).await
    }

    /// One record with its change history, subject to the record view policy.
    pub async fn detail(
        &self,
        viewer: &User,
        scope: &AttendanceScope,
        id: AttendanceId,
    ) -> Result<AttendanceDetailResponse, AppError> {
        let row = self
            .attendance
            .find_row_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))?;

        if !can_view_record(viewer, scope, &row) {
            tracing::warn!(user_id = %viewer.id, attendance_id = %id, "attendance view denied");
            return Err(AppError::forbidden());
        }

        let audit_logs = if can_view_audit_history(viewer, &row) {
            self.audit_logs.list_for_attendance(&self.pool, id).await?
        } else {
            Vec::new()
        };

        Ok(AttendanceDetailResponse {
            attendance: row,
            audit_logs,
            can_override: viewer.role.allows(Capability::OverrideAttendance),
        })
    }

    /// Applies an admin correction. Audit entries and the record update
    /// commit together or not at all.
    ///
    /// The locked read and the writes run on concrete repositories because
    /// they share one `PgTransaction`, which the mocked traits cannot carry.
    pub async fn override_attendance(
        &self,
        admin: &User,
        id: AttendanceId,
        changes: &AttendanceChanges,
        reason: &str,
        ip: Option<String>,
    ) -> Result<Attendance, AppError> {
        admin.require(Capability::OverrideAttendance)?;

        let records = AttendanceRepository::new();
        let audit_logs = AuditLogRepository::new();

        let mut tx = begin_transaction(&self.pool).await?;
        let Some(current) = records.lock_in_transaction(&mut tx, id).await? else {
            rollback_transaction(tx).await?;
            return Err(AppError::NotFound("Attendance record not found".into()));
        };

        let plan = match plan_override(&self.policy, &current, changes) {
            Ok(plan) => plan,
            Err(err) => {
                rollback_transaction(tx).await?;
                return Err(err.into());
            }
        };

        if plan.is_noop() {
            rollback_transaction(tx).await?;
            tracing::info!(attendance_id = %id, admin_id = %admin.id, "override matched stored values");
            return Ok(current);
        }

        let reason = reason.trim();
        for change in &plan.changes {
            let entry = NewAuditEntry {
                attendance_id: id,
                changed_by: admin.id,
                field_changed: change.field.as_str().to_string(),
                old_value: change.old_value.clone(),
                new_value: change.new_value.clone(),
                reason: reason.to_string(),
                ip_address: ip.clone(),
            };
            audit_logs.insert_in_transaction(&mut tx, &entry).await?;
        }
        let updated = records
            .apply_override_in_transaction(&mut tx, &plan.updated)
            .await?;
        commit_transaction(tx).await?;

        tracing::info!(
            attendance_id = %id,
            admin_id = %admin.id,
            fields = plan.changes.len(),
            "attendance overridden"
        );
        Ok(updated)
    }
}
