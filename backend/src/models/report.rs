//! Read-side aggregates returned by dashboards, reports and analytics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::attendance::Attendance;
use crate::models::employee::{EmployeeBrief, EmployeeProfile};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceStats {
    pub total_days: usize,
    pub late_days: usize,
    pub total_net_hours: f64,
    pub average_net_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
/// Present/absent/late partition of a set of employees for one date.
pub struct DaySummary {
    pub date: NaiveDate,
    pub total_employees: usize,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub all_list: Vec<EmployeeBrief>,
    pub present_list: Vec<EmployeeBrief>,
    pub absent_list: Vec<EmployeeBrief>,
    pub late_list: Vec<EmployeeBrief>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
/// One row of the monthly employee report.
pub struct EmployeeSummary {
    #[serde(flatten)]
    pub employee: EmployeeProfile,
    pub attendance_days: usize,
    pub on_time_days: usize,
    pub late_days: usize,
    pub total_hours: f64,
    pub avg_hours_per_day: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmployeeMonthReport {
    pub month: u32,
    pub year: i32,
    pub month_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub employees: Vec<EmployeeSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmployeeDetailReport {
    pub employee: EmployeeProfile,
    pub month: u32,
    pub year: i32,
    pub month_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub stats: AttendanceStats,
    /// Days in range that are not the employee's weekend.
    pub working_days: usize,
    /// Working days without a clock-in.
    pub absent_days: usize,
    pub attendances: Vec<Attendance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrendPoint {
    pub label: String,
    pub present: usize,
    pub late: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyTrendPoint {
    pub date: NaiveDate,
    /// Short label such as "May 06".
    pub label: String,
    /// Short weekday such as "Mon".
    pub day: String,
    pub present: usize,
    pub late: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct StatusBreakdown {
    pub on_time: usize,
    pub late: usize,
    pub total_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GroupAttendance {
    pub name: String,
    pub total: usize,
    pub present: usize,
    pub late: usize,
    pub absent: usize,
    pub on_time: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NamedHours {
    pub name: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EmployeeCount {
    pub employee: EmployeeBrief,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ReportStats {
    pub total_employees: usize,
    pub monthly_present: usize,
    pub monthly_late: usize,
    pub avg_working_hours: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportOverview {
    pub month: u32,
    pub year: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub stats: ReportStats,
    pub daily_trend: Vec<DailyTrendPoint>,
    pub department_distribution: Vec<GroupAttendance>,
    pub status_breakdown: StatusBreakdown,
    pub hours_by_day: Vec<NamedHours>,
    pub top_performers: Vec<EmployeeCount>,
    pub needs_attention: Vec<EmployeeCount>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalyticsResponse {
    pub monthly_trend: Vec<TrendPoint>,
    pub weekly_trend: Vec<TrendPoint>,
    pub status_breakdown: StatusBreakdown,
    pub year_to_date: StatusBreakdown,
    pub top_late: Vec<EmployeeCount>,
    /// Per employee for managers, per department for admins.
    pub average_hours: Vec<NamedHours>,
    /// Today's attendance per sub-department (managers) or department (admins).
    pub groups_today: Vec<GroupAttendance>,
}
