//! Attendance repository trait for dependency injection and testing.
//!
//! Clock events are single conditional statements so a concurrent duplicate
//! loses at the database instead of racing a read-then-write.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::postgres::PgTransaction;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::attendance::{Attendance, AttendanceRow, AttendanceStatus};
use crate::repositories::common::Conditions;
use crate::types::{AttendanceId, DepartmentId, SubDepartmentId, UserId};

const SELECT_COLUMNS: &str = "id, user_id, date, clock_in, clock_out, gross_minutes, break_minutes, \
     net_minutes, is_late, late_minutes, early_exit_minutes, status, clock_in_ip, clock_out_ip, \
     clock_in_user_agent, clock_out_user_agent, created_at, updated_at";

const ROW_SELECT: &str = "SELECT a.id, a.user_id, a.date, a.clock_in, a.clock_out, a.gross_minutes, \
     a.break_minutes, a.net_minutes, a.is_late, a.late_minutes, a.early_exit_minutes, a.status, \
     a.clock_in_ip, a.clock_out_ip, a.clock_in_user_agent, a.clock_out_user_agent, a.created_at, \
     a.updated_at, u.employee_code, u.name AS employee_name, u.department_id, \
     d.name AS department_name, u.sub_department_id, s.name AS sub_department_name \
     FROM attendances a \
     JOIN users u ON u.id = a.user_id \
     LEFT JOIN departments d ON d.id = u.department_id \
     LEFT JOIN sub_departments s ON s.id = u.sub_department_id";

/// Values written by a clock-in.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockInEntry {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub clock_in: NaiveDateTime,
    pub break_minutes: i32,
    pub is_late: bool,
    pub late_minutes: i32,
    pub status: AttendanceStatus,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Values written by a clock-out.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockOutEntry {
    pub clock_out: NaiveDateTime,
    pub gross_minutes: i32,
    pub net_minutes: i32,
    pub early_exit_minutes: i32,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Row filters for joined attendance listings. Every field narrows the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceRowFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub department_id: Option<DepartmentId>,
    /// `Some(vec![])` matches nothing.
    pub sub_department_ids: Option<Vec<SubDepartmentId>>,
    pub user_id: Option<UserId>,
}

/// Repository trait for Attendance operations.
///
/// Use `MockAttendanceRepositoryTrait` in tests to mock the behavior.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceRepositoryTrait: Send + Sync {
    async fn find_by_id(&self, db: &PgPool, id: AttendanceId) -> Result<Option<Attendance>, AppError>;

    /// Attendance joined with owner and placement names.
    async fn find_row_by_id(&self, db: &PgPool, id: AttendanceId) -> Result<Option<AttendanceRow>, AppError>;

    async fn find_by_user_and_date(
        &self,
        db: &PgPool,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, AppError>;

    /// Creates the day's record, or fills a record that has no clock-in yet.
    /// Returns `None` when the day already has a clock-in.
    async fn upsert_clock_in(&self, db: &PgPool, entry: &ClockInEntry) -> Result<Option<Attendance>, AppError>;

    /// Returns `None` when the record was clocked out concurrently.
    async fn record_clock_out(
        &self,
        db: &PgPool,
        id: AttendanceId,
        entry: &ClockOutEntry,
    ) -> Result<Option<Attendance>, AppError>;

    /// Inclusive range, oldest first.
    async fn find_by_user_in_range(
        &self,
        db: &PgPool,
        user_id: UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Attendance>, AppError>;

    async fn find_for_users_in_range(
        &self,
        db: &PgPool,
        user_ids: &[UserId],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Attendance>, AppError>;

    /// Rows newest first with the unpaged total. `page` is `(limit, offset)`.
    async fn list_rows(
        &self,
        db: &PgPool,
        filter: &AttendanceRowFilter,
        page: Option<(i64, i64)>,
    ) -> Result<(Vec<AttendanceRow>, i64), AppError>;

    /// Distinct years with at least one record, newest first.
    async fn years_with_records(&self, db: &PgPool, user_id: UserId) -> Result<Vec<i32>, AppError>;
}

/// Concrete implementation of AttendanceRepositoryTrait
#[derive(Debug, Default, Clone, Copy)]
pub struct AttendanceRepository;

impl AttendanceRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AttendanceRepositoryTrait for AttendanceRepository {
    async fn find_by_id(&self, db: &PgPool, id: AttendanceId) -> Result<Option<Attendance>, AppError> {
        let query = format!("SELECT {} FROM attendances WHERE id = $1", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, Attendance>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn find_row_by_id(&self, db: &PgPool, id: AttendanceId) -> Result<Option<AttendanceRow>, AppError> {
        let query = format!("{} WHERE a.id = $1", ROW_SELECT);
        let row = sqlx::query_as::<_, AttendanceRow>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn find_by_user_and_date(
        &self,
        db: &PgPool,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, AppError> {
        let query = format!(
            "SELECT {} FROM attendances WHERE user_id = $1 AND date = $2",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Attendance>(&query)
            .bind(user_id)
            .bind(date)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn upsert_clock_in(&self, db: &PgPool, entry: &ClockInEntry) -> Result<Option<Attendance>, AppError> {
        let query = format!(
            "INSERT INTO attendances \
             (id, user_id, date, clock_in, break_minutes, is_late, late_minutes, status, \
             clock_in_ip, clock_in_user_agent) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (user_id, date) DO UPDATE SET \
             clock_in = EXCLUDED.clock_in, is_late = EXCLUDED.is_late, \
             late_minutes = EXCLUDED.late_minutes, status = EXCLUDED.status, \
             clock_in_ip = EXCLUDED.clock_in_ip, clock_in_user_agent = EXCLUDED.clock_in_user_agent, \
             updated_at = NOW() \
             WHERE attendances.clock_in IS NULL \
             RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Attendance>(&query)
            .bind(AttendanceId::new())
            .bind(entry.user_id)
            .bind(entry.date)
            .bind(entry.clock_in)
            .bind(entry.break_minutes)
            .bind(entry.is_late)
            .bind(entry.late_minutes)
            .bind(entry.status)
            .bind(entry.ip.as_deref())
            .bind(entry.user_agent.as_deref())
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn record_clock_out(
        &self,
        db: &PgPool,
        id: AttendanceId,
        entry: &ClockOutEntry,
    ) -> Result<Option<Attendance>, AppError> {
        let query = format!(
            "UPDATE attendances SET clock_out = $2, gross_minutes = $3, net_minutes = $4, \
             early_exit_minutes = $5, clock_out_ip = $6, clock_out_user_agent = $7, updated_at = NOW() \
             WHERE id = $1 AND clock_in IS NOT NULL AND clock_out IS NULL \
             RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Attendance>(&query)
            .bind(id)
            .bind(entry.clock_out)
            .bind(entry.gross_minutes)
            .bind(entry.net_minutes)
            .bind(entry.early_exit_minutes)
            .bind(entry.ip.as_deref())
            .bind(entry.user_agent.as_deref())
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn find_by_user_in_range(
        &self,
        db: &PgPool,
        user_id: UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Attendance>, AppError> {
        let query = format!(
            "SELECT {} FROM attendances WHERE user_id = $1 AND date BETWEEN $2 AND $3 ORDER BY date ASC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Attendance>(&query)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn find_for_users_in_range(
        &self,
        db: &PgPool,
        user_ids: &[UserId],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Attendance>, AppError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {} FROM attendances WHERE user_id = ANY($1) AND date BETWEEN $2 AND $3 \
             ORDER BY date ASC, user_id ASC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Attendance>(&query)
            .bind(user_ids.to_vec())
            .bind(from)
            .bind(to)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn list_rows(
        &self,
        db: &PgPool,
        filter: &AttendanceRowFilter,
        page: Option<(i64, i64)>,
    ) -> Result<(Vec<AttendanceRow>, i64), AppError> {
        if matches!(&filter.sub_department_ids, Some(ids) if ids.is_empty()) {
            return Ok((Vec::new(), 0));
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(ROW_SELECT);
        apply_row_filters(&mut builder, &mut Conditions::default(), filter);
        builder.push(" ORDER BY a.date DESC, a.clock_in DESC NULLS LAST, u.name ASC");
        if let Some((limit, offset)) = page {
            builder
                .push(" LIMIT ")
                .push_bind(limit)
                .push(" OFFSET ")
                .push_bind(offset);
        }
        let rows = builder
            .build_query_as::<AttendanceRow>()
            .fetch_all(db)
            .await?;

        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM attendances a JOIN users u ON u.id = a.user_id");
        apply_row_filters(&mut count_builder, &mut Conditions::default(), filter);
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await?;

        Ok((rows, total))
    }

    async fn years_with_records(&self, db: &PgPool, user_id: UserId) -> Result<Vec<i32>, AppError> {
        let years = sqlx::query_scalar::<_, i32>(
            "SELECT DISTINCT EXTRACT(YEAR FROM date)::INT AS year FROM attendances \
             WHERE user_id = $1 ORDER BY year DESC",
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(years)
    }
}

fn apply_row_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    conditions: &mut Conditions,
    filter: &AttendanceRowFilter,
) {
    if let Some(start) = filter.start_date {
        conditions.next(builder);
        builder.push("a.date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        conditions.next(builder);
        builder.push("a.date <= ").push_bind(end);
    }
    if let Some(department_id) = filter.department_id {
        conditions.next(builder);
        builder.push("u.department_id = ").push_bind(department_id);
    }
    if let Some(ids) = filter.sub_department_ids.as_ref() {
        conditions.next(builder);
        builder
            .push("u.sub_department_id = ANY(")
            .push_bind(ids.clone())
            .push(")");
    }
    if let Some(user_id) = filter.user_id {
        conditions.next(builder);
        builder.push("a.user_id = ").push_bind(user_id);
    }
}

impl AttendanceRepository {
    /// Reads a record and holds its row lock until the transaction ends.
    pub async fn lock_in_transaction(
        &self,
        tx: &mut PgTransaction<'_>,
        id: AttendanceId,
    ) -> Result<Option<Attendance>, AppError> {
        let query = format!(
            "SELECT {} FROM attendances WHERE id = $1 FOR UPDATE",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Attendance>(&query)
            .bind(id)
            .fetch_optional(tx.as_mut())
            .await?;
        Ok(row)
    }

    /// Writes the editable and derived columns of an override. Status is left alone.
    pub async fn apply_override_in_transaction(
        &self,
        tx: &mut PgTransaction<'_>,
        item: &Attendance,
    ) -> Result<Attendance, AppError> {
        let query = format!(
            "UPDATE attendances SET clock_in = $2, clock_out = $3, gross_minutes = $4, \
             break_minutes = $5, net_minutes = $6, is_late = $7, late_minutes = $8, \
             early_exit_minutes = $9, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Attendance>(&query)
            .bind(item.id)
            .bind(item.clock_in)
            .bind(item.clock_out)
            .bind(item.gross_minutes)
            .bind(item.break_minutes)
            .bind(item.net_minutes)
            .bind(item.is_late)
            .bind(item.late_minutes)
            .bind(item.early_exit_minutes)
            .fetch_one(tx.as_mut())
            .await?;
        Ok(row)
    }
}
