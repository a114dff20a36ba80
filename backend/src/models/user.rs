//! Models that represent users, authentication payloads, and role capabilities.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;
use crate::types::{DepartmentId, SubDepartmentId, UserId};
use crate::utils::time::{parse_weekday_name, weekday_name};

#[derive(Debug, Clone, FromRow)]
/// Database representation of an employee account.
pub struct User {
    pub id: UserId,
    /// Organisation-issued identifier shown as "Employee ID".
    pub employee_code: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub department_id: Option<DepartmentId>,
    pub sub_department_id: Option<SubDepartmentId>,
    pub designation: String,
    /// Lower-case day names the employee does not work on.
    pub weekend_days: Vec<String>,
    pub phone: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub present_address: Option<String>,
    pub permanent_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
/// Supported user roles stored in the database.
pub enum UserRole {
    /// Regular employee; sees only their own attendance.
    #[default]
    User,
    /// Sees attendance for the sub-departments they manage.
    Manager,
    /// Unrestricted access, including overrides and the employee directory.
    Admin,
}

/// Actions gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    RecordOwnAttendance,
    ViewTeamAttendance,
    ViewAllAttendance,
    OverrideAttendance,
    ExportAttendance,
    ViewReports,
    ManageDirectory,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Manager => "manager",
            UserRole::Admin => "admin",
        }
    }

    /// The single role-to-capability table.
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::RecordOwnAttendance => true,
            Capability::ViewTeamAttendance
            | Capability::ExportAttendance
            | Capability::ViewReports => matches!(self, UserRole::Manager | UserRole::Admin),
            Capability::ViewAllAttendance
            | Capability::OverrideAttendance
            | Capability::ManageDirectory => matches!(self, UserRole::Admin),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(String);

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "employee" => Ok(UserRole::User),
            "manager" => Ok(UserRole::Manager),
            "admin" => Ok(UserRole::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl Serialize for UserRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::unknown_variant(&s, &["user", "manager", "admin"])
        })
    }
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_manager(&self) -> bool {
        self.role == UserRole::Manager
    }

    /// Fails with the generic access denial when the role lacks `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.role.allows(capability) {
            return Ok(());
        }
        tracing::warn!(
            user_id = %self.id,
            role = self.role.as_str(),
            capability = ?capability,
            "capability denied"
        );
        Err(AppError::forbidden())
    }

    pub fn weekend_weekdays(&self) -> Vec<Weekday> {
        self.weekend_days
            .iter()
            .filter_map(|name| parse_weekday_name(name))
            .collect()
    }

    pub fn is_weekend(&self, day: Weekday) -> bool {
        let name = weekday_name(day);
        self.weekend_days
            .iter()
            .any(|entry| entry.trim().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
/// Public view of a user account.
pub struct UserResponse {
    pub id: UserId,
    pub employee_code: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub department_id: Option<DepartmentId>,
    pub sub_department_id: Option<SubDepartmentId>,
    pub designation: String,
    pub weekend_days: Vec<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            employee_code: user.employee_code,
            name: user.name,
            email: user.email,
            role: user.role,
            department_id: user.department_id,
            sub_department_id: user.sub_department_id,
            designation: user.designation,
            weekend_days: user.weekend_days,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
/// Credentials submitted by a user attempting to authenticate.
pub struct LoginRequest {
    /// Email address or employee code.
    #[validate(length(min = 1, max = 255, message = "Email or employee ID is required."))]
    pub login: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

#[cfg(test)]
pub(crate) fn sample_user(role: UserRole) -> User {
    let now = Utc::now();
    User {
        id: UserId::new(),
        employee_code: "EMP-001".into(),
        name: "Sample Person".into(),
        email: "sample@example.com".into(),
        password_hash: String::new(),
        role,
        department_id: None,
        sub_department_id: None,
        designation: "Engineer".into(),
        weekend_days: vec!["saturday".into(), "sunday".into()],
        phone: None,
        joining_date: None,
        nationality: None,
        present_address: None,
        permanent_address: None,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_capability_table() {
        assert!(UserRole::User.allows(Capability::RecordOwnAttendance));
        assert!(!UserRole::User.allows(Capability::ViewTeamAttendance));
        assert!(!UserRole::User.allows(Capability::ExportAttendance));

        assert!(UserRole::Manager.allows(Capability::ViewTeamAttendance));
        assert!(UserRole::Manager.allows(Capability::ViewReports));
        assert!(!UserRole::Manager.allows(Capability::OverrideAttendance));
        assert!(!UserRole::Manager.allows(Capability::ViewAllAttendance));

        for capability in [
            Capability::ViewAllAttendance,
            Capability::OverrideAttendance,
            Capability::ManageDirectory,
        ] {
            assert!(UserRole::Admin.allows(capability));
        }
    }

    #[test]
    fn require_returns_forbidden_for_missing_capability() {
        let user = sample_user(UserRole::User);
        assert!(user.require(Capability::RecordOwnAttendance).is_ok());
        assert!(matches!(
            user.require(Capability::OverrideAttendance),
            Err(AppError::Forbidden(message)) if message == "Unauthorized"
        ));
    }

    #[test]
    fn role_deserialization_tolerates_casing() {
        let role: UserRole = serde_json::from_str("\"MANAGER\"").unwrap();
        assert_eq!(role, UserRole::Manager);
        let role: UserRole = serde_json::from_str("\"employee\"").unwrap();
        assert_eq!(role, UserRole::User);
        assert!(serde_json::from_str::<UserRole>("\"owner\"").is_err());
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn weekend_lookup_ignores_case() {
        let mut user = sample_user(UserRole::User);
        user.weekend_days = vec!["Friday".into(), "SATURDAY".into()];
        assert!(user.is_weekend(Weekday::Fri));
        assert!(user.is_weekend(Weekday::Sat));
        assert!(!user.is_weekend(Weekday::Sun));
        assert_eq!(user.weekend_weekdays(), vec![Weekday::Fri, Weekday::Sat]);
    }
}
