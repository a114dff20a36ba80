//! Directory views of employees and the admin payloads that maintain them.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::user::UserRole;
use crate::types::{DepartmentId, SubDepartmentId, UserId};
use crate::utils::time::parse_weekday_name;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema, PartialEq)]
/// Employee joined with department names; the shape used by reports and lists.
pub struct EmployeeProfile {
    pub id: UserId,
    pub employee_code: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub designation: String,
    pub department_id: Option<DepartmentId>,
    pub department_name: Option<String>,
    pub sub_department_id: Option<SubDepartmentId>,
    pub sub_department_name: Option<String>,
    pub weekend_days: Vec<String>,
    pub phone: Option<String>,
    pub joining_date: Option<NaiveDate>,
}

impl EmployeeProfile {
    pub fn is_weekend(&self, day: chrono::Weekday) -> bool {
        self.weekend_days
            .iter()
            .any(|entry| parse_weekday_name(entry) == Some(day))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
/// Compact identity used inside summary lists.
pub struct EmployeeBrief {
    pub id: UserId,
    pub employee_code: String,
    pub name: String,
    pub department_name: Option<String>,
    pub sub_department_name: Option<String>,
}

impl From<&EmployeeProfile> for EmployeeBrief {
    fn from(profile: &EmployeeProfile) -> Self {
        EmployeeBrief {
            id: profile.id,
            employee_code: profile.employee_code.clone(),
            name: profile.name.clone(),
            department_name: profile.department_name.clone(),
            sub_department_name: profile.sub_department_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmployeeResponse {
    #[serde(flatten)]
    pub profile: EmployeeProfile,
    pub managed_sub_department_ids: Vec<SubDepartmentId>,
}

/// Which employees a directory read should return.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeFilter {
    pub include_admins: bool,
    pub department_id: Option<DepartmentId>,
    pub sub_department_ids: Option<Vec<SubDepartmentId>>,
    pub employee_id: Option<UserId>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeListQuery {
    pub department: Option<String>,
    pub sub_department: Option<String>,
    /// Matches name, email or employee code.
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEmployeeRequest {
    #[validate(custom(function = "crate::validation::rules::validate_employee_code"))]
    pub employee_code: String,
    #[validate(length(min = 1, max = 255, message = "Name is required (max 255 characters)."))]
    pub name: String,
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    pub department_id: Option<DepartmentId>,
    pub sub_department_id: Option<SubDepartmentId>,
    #[validate(length(min = 1, max = 255, message = "Designation is required."))]
    pub designation: String,
    #[validate(custom(function = "crate::validation::rules::validate_weekend_days"))]
    pub weekend_days: Vec<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub joining_date: Option<NaiveDate>,
    #[validate(length(max = 100))]
    pub nationality: Option<String>,
    #[validate(length(max = 1000))]
    pub present_address: Option<String>,
    #[validate(length(max = 1000))]
    pub permanent_address: Option<String>,
    /// Explicit manager scope; derived from the placement when omitted.
    pub managed_sub_department_ids: Option<Vec<SubDepartmentId>>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEmployeeRequest {
    #[validate(custom(function = "crate::validation::rules::validate_employee_code"))]
    pub employee_code: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Name is required (max 255 characters)."))]
    pub name: Option<String>,
    #[validate(email(message = "A valid email address is required."))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: Option<String>,
    pub role: Option<UserRole>,
    /// `null` clears the placement; omitting the field keeps it.
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<String>)]
    pub department_id: Option<Option<DepartmentId>>,
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<String>)]
    pub sub_department_id: Option<Option<SubDepartmentId>>,
    #[validate(length(min = 1, max = 255, message = "Designation is required."))]
    pub designation: Option<String>,
    #[validate(custom(function = "crate::validation::rules::validate_weekend_days"))]
    pub weekend_days: Option<Vec<String>>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub joining_date: Option<NaiveDate>,
    #[validate(length(max = 100))]
    pub nationality: Option<String>,
    #[validate(length(max = 1000))]
    pub present_address: Option<String>,
    #[validate(length(max = 1000))]
    pub permanent_address: Option<String>,
    pub managed_sub_department_ids: Option<Vec<SubDepartmentId>>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn present_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
