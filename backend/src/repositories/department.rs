use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::department::{Department, SubDepartment};
use crate::types::{DepartmentId, SubDepartmentId};

const DEPARTMENT_COLUMNS: &str = "id, name, description, is_active, created_at, updated_at";
const SUB_DEPARTMENT_COLUMNS: &str =
    "id, department_id, name, description, is_active, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DepartmentRepositoryTrait: Send + Sync {
    /// Active departments ordered by name.
    async fn list_active(&self, db: &PgPool) -> Result<Vec<Department>, AppError>;

    async fn find_by_id(&self, db: &PgPool, id: DepartmentId) -> Result<Option<Department>, AppError>;

    /// Active sub-departments ordered by name, optionally limited to one department.
    async fn list_sub_departments(
        &self,
        db: &PgPool,
        department_id: Option<DepartmentId>,
    ) -> Result<Vec<SubDepartment>, AppError>;

    async fn find_sub_department(
        &self,
        db: &PgPool,
        id: SubDepartmentId,
    ) -> Result<Option<SubDepartment>, AppError>;

    async fn create(&self, db: &PgPool, name: &str, description: Option<String>) -> Result<Department, AppError>;

    async fn create_sub_department(
        &self,
        db: &PgPool,
        department_id: DepartmentId,
        name: &str,
        description: Option<String>,
    ) -> Result<SubDepartment, AppError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DepartmentRepository;

impl DepartmentRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DepartmentRepositoryTrait for DepartmentRepository {
    async fn list_active(&self, db: &PgPool) -> Result<Vec<Department>, AppError> {
        let query = format!(
            "SELECT {} FROM departments WHERE is_active ORDER BY name ASC",
            DEPARTMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Department>(&query).fetch_all(db).await?;
        Ok(rows)
    }

    async fn find_by_id(&self, db: &PgPool, id: DepartmentId) -> Result<Option<Department>, AppError> {
        let query = format!("SELECT {} FROM departments WHERE id = $1", DEPARTMENT_COLUMNS);
        let row = sqlx::query_as::<_, Department>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn list_sub_departments(
        &self,
        db: &PgPool,
        department_id: Option<DepartmentId>,
    ) -> Result<Vec<SubDepartment>, AppError> {
        let query = format!(
            "SELECT {} FROM sub_departments \
             WHERE is_active AND ($1::uuid IS NULL OR department_id = $1) \
             ORDER BY name ASC",
            SUB_DEPARTMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, SubDepartment>(&query)
            .bind(department_id)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn find_sub_department(
        &self,
        db: &PgPool,
        id: SubDepartmentId,
    ) -> Result<Option<SubDepartment>, AppError> {
        let query = format!(
            "SELECT {} FROM sub_departments WHERE id = $1",
            SUB_DEPARTMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, SubDepartment>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn create(&self, db: &PgPool, name: &str, description: Option<String>) -> Result<Department, AppError> {
        let query = format!(
            "INSERT INTO departments (id, name, description) VALUES ($1, $2, $3) RETURNING {}",
            DEPARTMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, Department>(&query)
            .bind(DepartmentId::new())
            .bind(name.trim())
            .bind(description)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    async fn create_sub_department(
        &self,
        db: &PgPool,
        department_id: DepartmentId,
        name: &str,
        description: Option<String>,
    ) -> Result<SubDepartment, AppError> {
        let query = format!(
            "INSERT INTO sub_departments (id, department_id, name, description) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            SUB_DEPARTMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, SubDepartment>(&query)
            .bind(SubDepartmentId::new())
            .bind(department_id)
            .bind(name.trim())
            .bind(description)
            .fetch_one(db)
            .await?;
        Ok(row)
    }
}
