//! Employee and department directory maintained by admins.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::department::{
    build_tree, CreateDepartmentRequest, CreateSubDepartmentRequest, Department, DepartmentTree,
    SubDepartment,
};
use crate::models::employee::{
    CreateEmployeeRequest, EmployeeFilter, EmployeeProfile, EmployeeResponse,
    UpdateEmployeeRequest,
};
use crate::models::user::{Capability, User, UserRole};
use crate::repositories::{
    begin_transaction, commit_transaction, DepartmentRepositoryTrait, UserRepository,
    UserRepositoryTrait,
};
use crate::types::{DepartmentId, SubDepartmentId, UserId};
use crate::utils::credentials::hash_password;
use crate::utils::time::{parse_weekday_name, weekday_name};

/// Normalized department placement of one employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    pub department_id: Option<DepartmentId>,
    pub sub_department_id: Option<SubDepartmentId>,
}

/// Manager scope seeded on create/update: the explicit list when given,
/// otherwise the own sub-department, else every sub-department of the own
/// department. Non-managers manage nothing.
pub fn seeded_scope(
    role: UserRole,
    placement: Placement,
    explicit: Option<&[SubDepartmentId]>,
    department_subs: &[SubDepartment],
) -> Vec<SubDepartmentId> {
    if role != UserRole::Manager {
        return Vec::new();
    }
    if let Some(ids) = explicit {
        let mut ids = ids.to_vec();
        ids.sort();
        ids.dedup();
        return ids;
    }
    match placement {
        Placement {
            sub_department_id: Some(sub),
            ..
        } => vec![sub],
        Placement {
            department_id: Some(department),
            ..
        } => department_subs
            .iter()
            .filter(|sub| sub.department_id == department)
            .map(|sub| sub.id)
            .collect(),
        _ => Vec::new(),
    }
}

/// Lower-cases, dedupes and orders weekend day names Monday first.
pub fn normalize_weekend_days(days: &[String]) -> Vec<String> {
    let mut weekdays: Vec<_> = days.iter().filter_map(|day| parse_weekday_name(day)).collect();
    weekdays.sort_by_key(|day| day.num_days_from_monday());
    weekdays.dedup();
    weekdays
        .into_iter()
        .map(|day| weekday_name(day).to_string())
        .collect()
}

fn trimmed_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct DirectoryService {
    pool: PgPool,
    users: Arc<dyn UserRepositoryTrait>,
    departments: Arc<dyn DepartmentRepositoryTrait>,
}

impl DirectoryService {
    pub fn new(
        pool: PgPool,
        users: Arc<dyn UserRepositoryTrait>,
        departments: Arc<dyn DepartmentRepositoryTrait>,
    ) -> Self {
        Self {
            pool,
            users,
            departments,
        }
    }

    pub async fn department_tree(&self) -> Result<Vec<DepartmentTree>, AppError> {
        let departments = self.departments.list_active(&self.pool).await?;
        let sub_departments = self.departments.list_sub_departments(&self.pool, None).await?;
        Ok(build_tree(departments, sub_departments))
    }

    pub async fn sub_departments(
        &self,
        department_id: Option<DepartmentId>,
    ) -> Result<Vec<SubDepartment>, AppError> {
        self.departments
            .list_sub_departments(&self.pool, department_id)
            .await
    }

    pub async fn create_department(
        &self,
        admin: &User,
        request: CreateDepartmentRequest,
    ) -> Result<Department, AppError> {
        admin.require(Capability::ManageDirectory)?;
        let department = self
            .departments
            .create(&self.pool, &request.name, trimmed_opt(request.description))
            .await?;
        tracing::info!(department_id = %department.id, admin_id = %admin.id, "department created");
        Ok(department)
    }

    pub async fn create_sub_department(
        &self,
        admin: &User,
        department_id: DepartmentId,
        request: CreateSubDepartmentRequest,
    ) -> Result<SubDepartment, AppError> {
        admin.require(Capability::ManageDirectory)?;
        if self
            .departments
            .find_by_id(&self.pool, department_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("Department not found".into()));
        }
        let sub_department = self
            .departments
            .create_sub_department(
                &self.pool,
                department_id,
                &request.name,
                trimmed_opt(request.description),
            )
            .await?;
        tracing::info!(
            sub_department_id = %sub_department.id,
            department_id = %department_id,
            "sub-department created"
        );
        Ok(sub_department)
    }

    pub async fn list_employees(
        &self,
        admin: &User,
        filter: EmployeeFilter,
    ) -> Result<Vec<EmployeeProfile>, AppError> {
        admin.require(Capability::ManageDirectory)?;
        self.users.list_profiles(&self.pool, &filter).await
    }

    pub async fn employee(&self, admin: &User, id: UserId) -> Result<EmployeeResponse, AppError> {
        admin.require(Capability::ManageDirectory)?;
        self.load_response(id).await
    }

    pub async fn create_employee(
        &self,
        admin: &User,
        request: CreateEmployeeRequest,
    ) -> Result<EmployeeResponse, AppError> {
        admin.require(Capability::ManageDirectory)?;

        let employee_code = request.employee_code.trim().to_string();
        let email = request.email.trim().to_lowercase();
        self.ensure_unique(&employee_code, &email, None).await?;

        let placement = self
            .resolve_placement(request.department_id, request.sub_department_id)
            .await?;
        let scope = self
            .resolve_scope(request.role, placement, request.managed_sub_department_ids.as_deref())
            .await?;

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            employee_code,
            name: request.name.trim().to_string(),
            email,
            password_hash: hash_password(&request.password)?,
            role: request.role,
            department_id: placement.department_id,
            sub_department_id: placement.sub_department_id,
            designation: request.designation.trim().to_string(),
            weekend_days: normalize_weekend_days(&request.weekend_days),
            phone: trimmed_opt(request.phone),
            joining_date: request.joining_date,
            nationality: trimmed_opt(request.nationality),
            present_address: trimmed_opt(request.present_address),
            permanent_address: trimmed_opt(request.permanent_address),
            created_at: now,
            updated_at: now,
        };

        let repo = UserRepository::new();
        let mut tx = begin_transaction(&self.pool).await?;
        let created = repo.insert_in_transaction(&mut tx, &user).await?;
        repo.replace_managed_sub_departments_in_transaction(&mut tx, created.id, &scope)
            .await?;
        commit_transaction(tx).await?;

        tracing::info!(
            employee_id = %created.id,
            role = created.role.as_str(),
            managed = scope.len(),
            admin_id = %admin.id,
            "employee created"
        );
        self.load_response(created.id).await
    }

    pub async fn update_employee(
        &self,
        admin: &User,
        id: UserId,
        request: UpdateEmployeeRequest,
    ) -> Result<EmployeeResponse, AppError> {
        admin.require(Capability::ManageDirectory)?;

        let mut user = self
            .users
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".into()))?;

        let employee_code = request
            .employee_code
            .as_deref()
            .map(str::trim)
            .map(str::to_string)
            .unwrap_or_else(|| user.employee_code.clone());
        let email = request
            .email
            .as_deref()
            .map(|email| email.trim().to_lowercase())
            .unwrap_or_else(|| user.email.clone());
        self.ensure_unique(&employee_code, &email, Some(id)).await?;

        let previous_role = user.role;
        let previous_placement = Placement {
            department_id: user.department_id,
            sub_department_id: user.sub_department_id,
        };
        let placement = self
            .resolve_placement(
                request.department_id.unwrap_or(user.department_id),
                request.sub_department_id.unwrap_or(user.sub_department_id),
            )
            .await?;
        let role = request.role.unwrap_or(user.role);

        user.employee_code = employee_code;
        user.email = email;
        user.role = role;
        user.department_id = placement.department_id;
        user.sub_department_id = placement.sub_department_id;
        if let Some(name) = request.name {
            user.name = name.trim().to_string();
        }
        if let Some(password) = request.password.as_deref() {
            user.password_hash = hash_password(password)?;
        }
        if let Some(designation) = request.designation {
            user.designation = designation.trim().to_string();
        }
        if let Some(days) = request.weekend_days.as_deref() {
            user.weekend_days = normalize_weekend_days(days);
        }
        if request.phone.is_some() {
            user.phone = trimmed_opt(request.phone);
        }
        if request.joining_date.is_some() {
            user.joining_date = request.joining_date;
        }
        if request.nationality.is_some() {
            user.nationality = trimmed_opt(request.nationality);
        }
        if request.present_address.is_some() {
            user.present_address = trimmed_opt(request.present_address);
        }
        if request.permanent_address.is_some() {
            user.permanent_address = trimmed_opt(request.permanent_address);
        }

        let reseed = request.managed_sub_department_ids.is_some()
            || role != previous_role
            || placement != previous_placement;
        let scope = if reseed {
            Some(
                self.resolve_scope(role, placement, request.managed_sub_department_ids.as_deref())
                    .await?,
            )
        } else {
            None
        };

        let repo = UserRepository::new();
        let mut tx = begin_transaction(&self.pool).await?;
        let updated = repo.update_in_transaction(&mut tx, &user).await?;
        if let Some(scope) = scope.as_deref() {
            repo.replace_managed_sub_departments_in_transaction(&mut tx, updated.id, scope)
                .await?;
        }
        commit_transaction(tx).await?;

        tracing::info!(employee_id = %updated.id, admin_id = %admin.id, reseeded_scope = reseed, "employee updated");
        self.load_response(updated.id).await
    }

    pub async fn delete_employee(&self, admin: &User, id: UserId) -> Result<(), AppError> {
        admin.require(Capability::ManageDirectory)?;
        if admin.id == id {
            return Err(AppError::BadRequest("You cannot delete your own account.".into()));
        }
        if !self.users.delete(&self.pool, id).await? {
            return Err(AppError::NotFound("Employee not found".into()));
        }
        tracing::info!(employee_id = %id, admin_id = %admin.id, "employee deleted");
        Ok(())
    }

    async fn load_response(&self, id: UserId) -> Result<EmployeeResponse, AppError> {
        let profile = self
            .users
            .find_profile(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".into()))?;
        let managed_sub_department_ids = self.users.managed_sub_department_ids(&self.pool, id).await?;
        Ok(EmployeeResponse {
            profile,
            managed_sub_department_ids,
        })
    }

    async fn ensure_unique(&self, employee_code: &str, email: &str, current: Option<UserId>) -> Result<(), AppError> {
        if let Some(existing) = self.users.find_by_login(&self.pool, email).await? {
            if Some(existing.id) != current && existing.email.eq_ignore_ascii_case(email) {
                return Err(AppError::Conflict("The email has already been taken.".into()));
            }
        }
        if let Some(existing) = self.users.find_by_login(&self.pool, employee_code).await? {
            if Some(existing.id) != current && existing.employee_code == employee_code {
                return Err(AppError::Conflict("The employee ID has already been taken.".into()));
            }
        }
        Ok(())
    }

    /// Fills the department from the sub-department and rejects mismatches.
    async fn resolve_placement(
        &self,
        department_id: Option<DepartmentId>,
        sub_department_id: Option<SubDepartmentId>,
    ) -> Result<Placement, AppError> {
        if let Some(department_id) = department_id {
            if self
                .departments
                .find_by_id(&self.pool, department_id)
                .await?
                .is_none()
            {
                return Err(AppError::validation(
                    "department_id",
                    "The selected department is invalid.",
                ));
            }
        }

        let Some(sub_department_id) = sub_department_id else {
            return Ok(Placement {
                department_id,
                sub_department_id: None,
            });
        };
        let sub_department = self
            .departments
            .find_sub_department(&self.pool, sub_department_id)
            .await?
            .ok_or_else(|| {
                AppError::validation("sub_department_id", "The selected sub-department is invalid.")
            })?;
        if department_id.is_some_and(|id| id != sub_department.department_id) {
            return Err(AppError::validation(
                "sub_department_id",
                "The sub-department must belong to the selected department.",
            ));
        }

        Ok(Placement {
            department_id: Some(sub_department.department_id),
            sub_department_id: Some(sub_department_id),
        })
    }

    async fn resolve_scope(
        &self,
        role: UserRole,
        placement: Placement,
        explicit: Option<&[SubDepartmentId]>,
    ) -> Result<Vec<SubDepartmentId>, AppError> {
        if role != UserRole::Manager {
            return Ok(Vec::new());
        }
        let known = self.departments.list_sub_departments(&self.pool, None).await?;
        if let Some(ids) = explicit {
            if ids.iter().any(|id| !known.iter().any(|sub| sub.id == *id)) {
                return Err(AppError::validation(
                    "managed_sub_department_ids",
                    "Every managed sub-department must exist.",
                ));
            }
        }
        Ok(seeded_scope(role, placement, explicit, &known))
    }
}
