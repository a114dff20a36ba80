use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::audit_log::AttendanceAuditLog;
use crate::models::employee::EmployeeBrief;
use crate::models::department::SubDepartment;
use crate::models::report::{AttendanceStats, DaySummary};
use crate::models::PaginatedResponse;
use crate::types::{AttendanceId, DepartmentId, SubDepartmentId, UserId};
use crate::utils::time::parse_local_datetime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
/// One employee's attendance for one calendar date.
pub struct Attendance {
    pub id: AttendanceId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub clock_in: Option<NaiveDateTime>,
    pub clock_out: Option<NaiveDateTime>,
    /// Minutes between clock-in and clock-out; set once both exist.
    pub gross_minutes: Option<i32>,
    pub break_minutes: i32,
    /// Gross minus break, never negative.
    pub net_minutes: Option<i32>,
    pub is_late: bool,
    pub late_minutes: i32,
    pub early_exit_minutes: i32,
    pub status: AttendanceStatus,
    pub clock_in_ip: Option<String>,
    pub clock_out_ip: Option<String>,
    pub clock_in_user_agent: Option<String>,
    pub clock_out_user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Weekend,
    SickLeave,
    CasualLeave,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 5] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Weekend,
        AttendanceStatus::SickLeave,
        AttendanceStatus::CasualLeave,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Weekend => "weekend",
            AttendanceStatus::SickLeave => "sick_leave",
            AttendanceStatus::CasualLeave => "casual_leave",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Weekend => "Weekend",
            AttendanceStatus::SickLeave => "Sick Leave",
            AttendanceStatus::CasualLeave => "Casual Leave",
        }
    }
}

impl Attendance {
    pub fn has_clocked_in(&self) -> bool {
        self.clock_in.is_some()
    }

    pub fn has_clocked_out(&self) -> bool {
        self.clock_out.is_some()
    }

    /// Net hours rounded to two decimals, zero while still clocked in.
    pub fn net_hours(&self) -> f64 {
        round_to(f64::from(self.net_minutes.unwrap_or(0)) / 60.0, 2)
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
/// Attendance joined with the owner's identity and placement.
pub struct AttendanceRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub attendance: Attendance,
    pub employee_code: String,
    pub employee_name: String,
    pub department_id: Option<DepartmentId>,
    pub department_name: Option<String>,
    pub sub_department_id: Option<SubDepartmentId>,
    pub sub_department_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
/// Admin correction of an attendance record. Omitted fields stay unchanged.
pub struct OverrideAttendanceRequest {
    #[serde(default, deserialize_with = "optional_local_datetime")]
    #[schema(value_type = Option<String>, example = "2024-05-06 09:05:00")]
    pub clock_in: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "optional_local_datetime")]
    #[schema(value_type = Option<String>, example = "2024-05-06 18:00:00")]
    pub clock_out: Option<NaiveDateTime>,
    #[validate(range(min = 0, max = 480, message = "Break minutes must be between 0 and 480."))]
    pub break_minutes: Option<i32>,
    pub is_late: Option<bool>,
    #[serde(default)]
    #[validate(custom(function = "crate::validation::rules::validate_override_reason"))]
    pub reason: String,
}

impl OverrideAttendanceRequest {
    /// Request-level ordering check; the merged record is checked again when planning.
    pub fn has_valid_time_order(&self) -> bool {
        match (self.clock_in, self.clock_out) {
            (Some(clock_in), Some(clock_out)) => clock_out > clock_in,
            _ => true,
        }
    }
}

fn optional_local_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_local_datetime(value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date-time: {}", value))),
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
/// Filters shared by list and export endpoints.
pub struct AttendanceFilterQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub department: Option<String>,
    pub sub_department: Option<String>,
    pub employee: Option<String>,
    /// Export format: `csv` (default) or `xlsx`.
    #[serde(rename = "type")]
    pub format: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct MonthQuery {
    /// 1-12, defaults to the current month.
    pub month: Option<String>,
    /// Defaults to the current year.
    pub year: Option<String>,
    #[serde(rename = "type")]
    pub format: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TodayAttendanceResponse {
    pub date: NaiveDate,
    pub attendance: Option<Attendance>,
    pub is_weekend: bool,
    pub can_clock_in: bool,
    pub can_clock_out: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyAttendanceResponse {
    pub month: u32,
    pub year: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub attendances: Vec<Attendance>,
    pub stats: AttendanceStats,
    pub available_years: Vec<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Scoped attendance listing for manager and admin views.
pub struct ScopedAttendanceResponse {
    pub attendances: PaginatedResponse<AttendanceRow>,
    pub summary: Option<DaySummary>,
    pub sub_departments: Vec<SubDepartment>,
    pub employees: Vec<EmployeeBrief>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceDetailResponse {
    pub attendance: AttendanceRow,
    /// Empty unless the caller may see the change history.
    pub audit_logs: Vec<AttendanceAuditLog>,
    pub can_override: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub date: NaiveDate,
    pub today: Option<Attendance>,
    pub is_weekend: bool,
    pub month_stats: AttendanceStats,
    pub company_summary: DaySummary,
    /// Today's summary for the caller's own department, when they have one.
    pub department_summary: Option<DaySummary>,
    pub office_start_time: String,
    pub current_time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_in_snake_case() {
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::SickLeave).unwrap(),
            "\"sick_leave\""
        );
        for status in AttendanceStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.as_str());
        }
    }

    #[test]
    fn round_to_keeps_requested_precision() {
        assert_eq!(round_to(500.0 / 60.0, 2), 8.33);
        assert_eq!(round_to(1234.0 / 60.0, 1), 20.6);
    }

    #[test]
    fn override_request_parses_both_timestamp_styles() {
        let request: OverrideAttendanceRequest = serde_json::from_value(serde_json::json!({
            "clock_in": "2024-05-06 09:05:00",
            "clock_out": "2024-05-06T18:00",
            "reason": "Badge reader was offline"
        }))
        .unwrap();
        assert_eq!(
            request.clock_in,
            NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_hms_opt(9, 5, 0)
        );
        assert!(request.has_valid_time_order());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn override_request_flags_inverted_times_and_short_reason() {
        let request: OverrideAttendanceRequest = serde_json::from_value(serde_json::json!({
            "clock_in": "2024-05-06 18:00:00",
            "clock_out": "2024-05-06 09:00:00",
            "reason": "oops"
        }))
        .unwrap();
        assert!(!request.has_valid_time_order());
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("reason"));
    }

    #[test]
    fn override_request_rejects_break_out_of_range() {
        let request: OverrideAttendanceRequest = serde_json::from_value(serde_json::json!({
            "break_minutes": 481,
            "reason": "Long lunch approved by HR"
        }))
        .unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("break_minutes"));
    }

    #[test]
    fn missing_reason_is_a_validation_error_not_a_parse_error() {
        let request: OverrideAttendanceRequest =
            serde_json::from_value(serde_json::json!({ "is_late": false })).unwrap();
        assert!(request.validate().is_err());
    }
}
