//! Which attendance rows a caller may read.

use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::attendance::AttendanceRow;
use crate::models::employee::{EmployeeFilter, EmployeeProfile};
use crate::models::user::{Capability, User, UserRole};
use crate::repositories::{AttendanceRowFilter, UserRepositoryTrait};
use crate::types::{DepartmentId, SubDepartmentId, UserId};

/// Rows visible to one caller for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceScope {
    Everyone,
    /// Employees placed in one of these sub-departments.
    SubDepartments(Vec<SubDepartmentId>),
    Own(UserId),
}

/// Filters as requested by the caller, before scoping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub department_id: Option<DepartmentId>,
    pub sub_department_id: Option<SubDepartmentId>,
    pub employee_id: Option<UserId>,
}

impl AttendanceScope {
    pub fn managed_ids(&self) -> Option<&[SubDepartmentId]> {
        match self {
            AttendanceScope::SubDepartments(ids) => Some(ids),
            _ => None,
        }
    }

    /// Intersects `requested` with the scope. `None` means nothing can match
    /// and the caller should answer with an empty result without querying.
    pub fn restrict(&self, requested: &RequestedFilter) -> Option<AttendanceRowFilter> {
        let mut filter = AttendanceRowFilter {
            start_date: requested.start_date,
            end_date: requested.end_date,
            department_id: requested.department_id,
            sub_department_ids: requested.sub_department_id.map(|id| vec![id]),
            user_id: requested.employee_id,
        };

        match self {
            AttendanceScope::Everyone => {}
            AttendanceScope::SubDepartments(managed) => {
                if managed.is_empty() {
                    return None;
                }
                match requested.sub_department_id {
                    Some(id) if !managed.contains(&id) => return None,
                    Some(_) => {}
                    None => filter.sub_department_ids = Some(managed.clone()),
                }
            }
            AttendanceScope::Own(owner) => {
                if requested.employee_id.is_some_and(|id| id != *owner) {
                    return None;
                }
                filter.user_id = Some(*owner);
            }
        }

        Some(filter)
    }

    /// Employee directory filter matching the scope, admins excluded.
    pub fn employee_filter(&self) -> Option<EmployeeFilter> {
        match self {
            AttendanceScope::Everyone => Some(EmployeeFilter::default()),
            AttendanceScope::SubDepartments(managed) if managed.is_empty() => None,
            AttendanceScope::SubDepartments(managed) => Some(EmployeeFilter {
                sub_department_ids: Some(managed.clone()),
                ..Default::default()
            }),
            AttendanceScope::Own(owner) => Some(EmployeeFilter {
                include_admins: true,
                employee_id: Some(*owner),
                ..Default::default()
            }),
        }
    }

    /// Whether an employee's reports fall inside the scope.
    pub fn covers_employee(&self, employee: &EmployeeProfile) -> bool {
        match self {
            AttendanceScope::Everyone => true,
            AttendanceScope::SubDepartments(managed) => employee
                .sub_department_id
                .is_some_and(|id| managed.contains(&id)),
            AttendanceScope::Own(owner) => employee.id == *owner,
        }
    }
}

/// Record-level read policy: admins always, managers for their
/// sub-departments, everyone for their own records.
pub fn can_view_record(viewer: &User, scope: &AttendanceScope, row: &AttendanceRow) -> bool {
    if row.attendance.user_id == viewer.id {
        return true;
    }
    match scope {
        AttendanceScope::Everyone => true,
        AttendanceScope::SubDepartments(managed) => row
            .sub_department_id
            .is_some_and(|id| managed.contains(&id)),
        AttendanceScope::Own(_) => false,
    }
}

/// Change history is shown to admins and to the record owner.
pub fn can_view_audit_history(viewer: &User, row: &AttendanceRow) -> bool {
    viewer.is_admin() || row.attendance.user_id == viewer.id
}

#[derive(Clone)]
pub struct VisibilityService {
    pool: PgPool,
    users: Arc<dyn UserRepositoryTrait>,
}

impl VisibilityService {
    pub fn new(pool: PgPool, users: Arc<dyn UserRepositoryTrait>) -> Self {
        Self { pool, users }
    }

    /// Resolves the caller's scope from their role and, for managers, the
    /// stored managed sub-department set.
    pub async fn scope_for(&self, user: &User) -> Result<AttendanceScope, AppError> {
        match user.role {
            UserRole::Admin => Ok(AttendanceScope::Everyone),
            UserRole::Manager => {
                let managed = self
                    .users
                    .managed_sub_department_ids(&self.pool, user.id)
                    .await?;
                if managed.is_empty() {
                    tracing::debug!(user_id = %user.id, "manager has no managed sub-departments");
                }
                Ok(AttendanceScope::SubDepartments(managed))
            }
            UserRole::User => Ok(AttendanceScope::Own(user.id)),
        }
    }

    /// Checks `capability` and resolves the scope in one step.
    pub async fn authorize(&self, user: &User, capability: Capability) -> Result<AttendanceScope, AppError> {
        user.require(capability)?;
        self.scope_for(user).await
    }

    /// Loads an employee the caller may report on; out-of-scope employees
    /// are denied without revealing whether they exist.
    pub async fn employee_in_scope(
        &self,
        scope: &AttendanceScope,
        employee_id: UserId,
    ) -> Result<EmployeeProfile, AppError> {
        let employee = self.users.find_profile(&self.pool, employee_id).await?;
        match employee {
            Some(employee) if scope.covers_employee(&employee) => Ok(employee),
            Some(_) => Err(AppError::forbidden()),
            None if matches!(scope, AttendanceScope::Everyone) => {
                Err(AppError::NotFound("Employee not found".into()))
            }
            None => Err(AppError::forbidden()),
        }
    }

    /// In-scope employees ordered by name, admins excluded.
    pub async fn employees_in_scope(&self, scope: &AttendanceScope) -> Result<Vec<EmployeeProfile>, AppError> {
        match scope.employee_filter() {
            Some(filter) => self.users.list_profiles(&self.pool, &filter).await,
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::{Attendance, AttendanceStatus};
    use crate::models::user::sample_user;
    use crate::repositories::user_repository::MockUserRepositoryTrait;
    use crate::types::AttendanceId;
    use chrono::Utc;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap()
    }

    fn row(owner: UserId, sub_department_id: Option<SubDepartmentId>) -> AttendanceRow {
        AttendanceRow {
            attendance: Attendance {
                id: AttendanceId::new(),
                user_id: owner,
                date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
                clock_in: None,
                clock_out: None,
                gross_minutes: None,
                break_minutes: 60,
                net_minutes: None,
                is_late: false,
                late_minutes: 0,
                early_exit_minutes: 0,
                status: AttendanceStatus::Present,
                clock_in_ip: None,
                clock_out_ip: None,
                clock_in_user_agent: None,
                clock_out_user_agent: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            employee_code: "EMP-1".into(),
            employee_name: "Owner".into(),
            department_id: None,
            department_name: None,
            sub_department_id,
            sub_department_name: None,
        }
    }

    #[test]
    fn manager_without_managed_sub_departments_matches_nothing() {
        let scope = AttendanceScope::SubDepartments(vec![]);
        assert_eq!(scope.restrict(&RequestedFilter::default()), None);
        assert_eq!(scope.employee_filter(), None);
    }

    #[test]
    fn manager_request_outside_scope_matches_nothing() {
        let managed = SubDepartmentId::new();
        let scope = AttendanceScope::SubDepartments(vec![managed]);
        let requested = RequestedFilter {
            sub_department_id: Some(SubDepartmentId::new()),
            ..Default::default()
        };
        assert_eq!(scope.restrict(&requested), None);
    }

    #[test]
    fn manager_filter_defaults_to_the_managed_set() {
        let (a, b) = (SubDepartmentId::new(), SubDepartmentId::new());
        let scope = AttendanceScope::SubDepartments(vec![a, b]);

        let filter = scope.restrict(&RequestedFilter::default()).unwrap();
        assert_eq!(filter.sub_department_ids, Some(vec![a, b]));

        let narrowed = scope
            .restrict(&RequestedFilter {
                sub_department_id: Some(b),
                start_date: NaiveDate::from_ymd_opt(2024, 5, 1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(narrowed.sub_department_ids, Some(vec![b]));
        assert_eq!(narrowed.start_date, NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn own_scope_pins_the_owner() {
        let owner = UserId::new();
        let scope = AttendanceScope::Own(owner);
        assert_eq!(scope.restrict(&RequestedFilter::default()).unwrap().user_id, Some(owner));
        let someone_else = RequestedFilter {
            employee_id: Some(UserId::new()),
            ..Default::default()
        };
        assert_eq!(scope.restrict(&someone_else), None);
    }

    #[test]
    fn everyone_scope_passes_requested_filters_through() {
        let department = DepartmentId::new();
        let filter = AttendanceScope::Everyone
            .restrict(&RequestedFilter {
                department_id: Some(department),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(filter.department_id, Some(department));
        assert_eq!(filter.sub_department_ids, None);
    }

    #[test]
    fn record_view_policy_follows_role_and_ownership() {
        let managed = SubDepartmentId::new();
        let manager = sample_user(UserRole::Manager);
        let employee = sample_user(UserRole::User);
        let admin = sample_user(UserRole::Admin);
        let team_scope = AttendanceScope::SubDepartments(vec![managed]);

        let in_team = row(employee.id, Some(managed));
        let elsewhere = row(employee.id, Some(SubDepartmentId::new()));

        assert!(can_view_record(&manager, &team_scope, &in_team));
        assert!(!can_view_record(&manager, &team_scope, &elsewhere));
        assert!(can_view_record(&admin, &AttendanceScope::Everyone, &elsewhere));
        assert!(can_view_record(&employee, &AttendanceScope::Own(employee.id), &in_team));
        assert!(!can_view_record(
            &sample_user(UserRole::User),
            &AttendanceScope::Own(UserId::new()),
            &in_team
        ));

        assert!(can_view_audit_history(&admin, &in_team));
        assert!(can_view_audit_history(&employee, &in_team));
        assert!(!can_view_audit_history(&manager, &in_team));
    }

    #[tokio::test]
    async fn scope_for_manager_reads_the_managed_set() {
        let managed = vec![SubDepartmentId::new()];
        let expected = managed.clone();
        let mut users = MockUserRepositoryTrait::new();
        users
            .expect_managed_sub_department_ids()
            .times(1)
            .returning(move |_, _| Ok(managed.clone()));

        let service = VisibilityService::new(lazy_pool(), Arc::new(users));
        let scope = service.scope_for(&sample_user(UserRole::Manager)).await.unwrap();
        assert_eq!(scope, AttendanceScope::SubDepartments(expected));
    }

    #[tokio::test]
    async fn plain_users_cannot_view_team_attendance() {
        let service = VisibilityService::new(lazy_pool(), Arc::new(MockUserRepositoryTrait::new()));
        let err = service
            .authorize(&sample_user(UserRole::User), Capability::ViewTeamAttendance)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn employee_outside_scope_is_forbidden() {
        let mut users = MockUserRepositoryTrait::new();
        let outsider_id = UserId::new();
        users.expect_find_profile().returning(move |_, id| {
            Ok(Some(EmployeeProfile {
                id,
                employee_code: "EMP-9".into(),
                name: "Outsider".into(),
                email: "outsider@example.com".into(),
                role: UserRole::User,
                designation: "Analyst".into(),
                department_id: None,
                department_name: None,
                sub_department_id: Some(SubDepartmentId::new()),
                sub_department_name: None,
                weekend_days: vec!["sunday".into()],
                phone: None,
                joining_date: None,
            }))
        });
        let service = VisibilityService::new(lazy_pool(), Arc::new(users));
        let scope = AttendanceScope::SubDepartments(vec![SubDepartmentId::new()]);
        let err = service.employee_in_scope(&scope, outsider_id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
