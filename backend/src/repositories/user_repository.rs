//! User repository trait for dependency injection and testing.
//!
//! Reads go through the mockable trait; writes that must land together with
//! the manager scope table are inherent `*_in_transaction` methods.

use async_trait::async_trait;
use sqlx::postgres::PgTransaction;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::employee::{EmployeeFilter, EmployeeProfile};
use crate::models::user::{User, UserRole};
use crate::repositories::common::Conditions;
use crate::types::{SubDepartmentId, UserId};

const USER_COLUMNS: &str = "id, employee_code, name, email, password_hash, role, department_id, \
     sub_department_id, designation, weekend_days, phone, joining_date, nationality, \
     present_address, permanent_address, created_at, updated_at";

const PROFILE_SELECT: &str = "SELECT u.id, u.employee_code, u.name, u.email, u.role, u.designation, \
     u.department_id, d.name AS department_name, u.sub_department_id, s.name AS sub_department_name, \
     u.weekend_days, u.phone, u.joining_date \
     FROM users u \
     LEFT JOIN departments d ON d.id = u.department_id \
     LEFT JOIN sub_departments s ON s.id = u.sub_department_id";

/// Use `MockUserRepositoryTrait` in tests to mock the behavior.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn find_by_id(&self, db: &PgPool, id: UserId) -> Result<Option<User>, AppError>;

    /// Matches the email (case-insensitive) or the employee code.
    async fn find_by_login(&self, db: &PgPool, login: &str) -> Result<Option<User>, AppError>;

    async fn find_profile(&self, db: &PgPool, id: UserId) -> Result<Option<EmployeeProfile>, AppError>;

    /// Profiles ordered by name.
    async fn list_profiles(
        &self,
        db: &PgPool,
        filter: &EmployeeFilter,
    ) -> Result<Vec<EmployeeProfile>, AppError>;

    async fn managed_sub_department_ids(
        &self,
        db: &PgPool,
        manager_id: UserId,
    ) -> Result<Vec<SubDepartmentId>, AppError>;

    /// Returns false when no such user exists.
    async fn delete(&self, db: &PgPool, id: UserId) -> Result<bool, AppError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UserRepository;

impl UserRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert_in_transaction(
        &self,
        tx: &mut PgTransaction<'_>,
        user: &User,
    ) -> Result<User, AppError> {
        let query = format!(
            "INSERT INTO users ({cols}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             RETURNING {cols}",
            cols = USER_COLUMNS
        );
        let row = sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.employee_code)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.department_id)
            .bind(user.sub_department_id)
            .bind(&user.designation)
            .bind(&user.weekend_days)
            .bind(user.phone.as_deref())
            .bind(user.joining_date)
            .bind(user.nationality.as_deref())
            .bind(user.present_address.as_deref())
            .bind(user.permanent_address.as_deref())
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(tx.as_mut())
            .await?;
        Ok(row)
    }

    pub async fn update_in_transaction(
        &self,
        tx: &mut PgTransaction<'_>,
        user: &User,
    ) -> Result<User, AppError> {
        let query = format!(
            "UPDATE users SET employee_code = $2, name = $3, email = $4, password_hash = $5, \
             role = $6, department_id = $7, sub_department_id = $8, designation = $9, \
             weekend_days = $10, phone = $11, joining_date = $12, nationality = $13, \
             present_address = $14, permanent_address = $15, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.employee_code)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.department_id)
            .bind(user.sub_department_id)
            .bind(&user.designation)
            .bind(&user.weekend_days)
            .bind(user.phone.as_deref())
            .bind(user.joining_date)
            .bind(user.nationality.as_deref())
            .bind(user.present_address.as_deref())
            .bind(user.permanent_address.as_deref())
            .fetch_optional(tx.as_mut())
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".into()))?;
        Ok(row)
    }

    /// Replaces the manager's scope with exactly `sub_department_ids`.
    pub async fn replace_managed_sub_departments_in_transaction(
        &self,
        tx: &mut PgTransaction<'_>,
        manager_id: UserId,
        sub_department_ids: &[SubDepartmentId],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM manager_sub_departments WHERE manager_id = $1")
            .bind(manager_id)
            .execute(tx.as_mut())
            .await?;
        if sub_department_ids.is_empty() {
            return Ok(());
        }
        sqlx::query(
            "INSERT INTO manager_sub_departments (manager_id, sub_department_id) \
             SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
        )
        .bind(manager_id)
        .bind(sub_department_ids.to_vec())
        .execute(tx.as_mut())
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn find_by_id(&self, db: &PgPool, id: UserId) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn find_by_login(&self, db: &PgPool, login: &str) -> Result<Option<User>, AppError> {
        let query = format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1) OR employee_code = $1 LIMIT 1",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, User>(&query)
            .bind(login.trim())
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn find_profile(&self, db: &PgPool, id: UserId) -> Result<Option<EmployeeProfile>, AppError> {
        let query = format!("{} WHERE u.id = $1", PROFILE_SELECT);
        let row = sqlx::query_as::<_, EmployeeProfile>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn list_profiles(
        &self,
        db: &PgPool,
        filter: &EmployeeFilter,
    ) -> Result<Vec<EmployeeProfile>, AppError> {
        if matches!(&filter.sub_department_ids, Some(ids) if ids.is_empty()) {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(PROFILE_SELECT);
        apply_profile_filters(&mut builder, &mut Conditions::default(), filter);
        builder.push(" ORDER BY u.name ASC, u.employee_code ASC");

        let rows = builder
            .build_query_as::<EmployeeProfile>()
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn managed_sub_department_ids(
        &self,
        db: &PgPool,
        manager_id: UserId,
    ) -> Result<Vec<SubDepartmentId>, AppError> {
        let ids = sqlx::query_scalar::<_, SubDepartmentId>(
            "SELECT sub_department_id FROM manager_sub_departments WHERE manager_id = $1 \
             ORDER BY sub_department_id",
        )
        .bind(manager_id)
        .fetch_all(db)
        .await?;
        Ok(ids)
    }

    async fn delete(&self, db: &PgPool, id: UserId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn apply_profile_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    conditions: &mut Conditions,
    filter: &EmployeeFilter,
) {
    if !filter.include_admins {
        conditions.next(builder);
        builder.push("u.role <> ").push_bind(UserRole::Admin.as_str());
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
    if let Some(employee_id) = filter.employee_id {
        conditions.next(builder);
        builder.push("u.id = ").push_bind(employee_id);
    }
    if let Some(search) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
    {
        let pattern = format!("%{}%", escape_like(search));
        conditions.next(builder);
        builder
            .push("(u.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.employee_code ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_user_repository_trait_bounds() {
        fn check_send_sync<T: Send + Sync>() {}
        check_send_sync::<MockUserRepositoryTrait>();
    }

    #[test]
    fn default_profile_filter_excludes_admins() {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(PROFILE_SELECT);
        apply_profile_filters(&mut builder, &mut Conditions::default(), &EmployeeFilter::default());
        assert!(builder.sql().ends_with(" WHERE u.role <> $1"));
    }

    #[test]
    fn search_terms_are_escaped_for_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
