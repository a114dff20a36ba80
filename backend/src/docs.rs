#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::{
    handlers::{attendance::ClockEventResponse, config::AttendanceConfigResponse},
    models::{
        attendance::{
            Attendance, AttendanceDetailResponse, AttendanceFilterQuery, AttendanceRow,
            AttendanceStatus, DashboardResponse, MonthQuery, MyAttendanceResponse,
            OverrideAttendanceRequest, ScopedAttendanceResponse, TodayAttendanceResponse,
        },
        audit_log::AttendanceAuditLog,
        department::{
            CreateDepartmentRequest, CreateSubDepartmentRequest, Department, DepartmentTree,
            SubDepartment,
        },
        employee::{
            CreateEmployeeRequest, EmployeeBrief, EmployeeListQuery, EmployeeProfile,
            EmployeeResponse, UpdateEmployeeRequest,
        },
        report::{
            AnalyticsResponse, AttendanceStats, DailyTrendPoint, DaySummary, EmployeeCount,
            EmployeeDetailReport, EmployeeMonthReport, EmployeeSummary, GroupAttendance,
            NamedHours, ReportOverview, ReportStats, StatusBreakdown, TrendPoint,
        },
        user::{LoginRequest, LoginResponse, UserResponse, UserRole},
    },
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        login_doc,
        me_doc,
        attendance_config_doc,
        departments_doc,
        dashboard_doc,
        clock_in_doc,
        clock_out_doc,
        today_doc,
        my_attendance_doc,
        team_attendance_doc,
        all_attendance_doc,
        analytics_doc,
        export_attendance_doc,
        employee_report_doc,
        export_employee_report_doc,
        employee_detail_report_doc,
        export_employee_detail_doc,
        attendance_detail_doc,
        override_attendance_doc,
        reports_doc,
        export_reports_doc,
        admin_list_employees_doc,
        admin_create_employee_doc,
        admin_get_employee_doc,
        admin_update_employee_doc,
        admin_delete_employee_doc,
        admin_create_department_doc,
        admin_create_sub_department_doc
    ),
    components(
        schemas(
            // auth
            LoginRequest,
            LoginResponse,
            UserResponse,
            UserRole,
            AttendanceConfigResponse,
            // attendance
            Attendance,
            AttendanceStatus,
            AttendanceRow,
            AttendanceAuditLog,
            ClockEventResponse,
            TodayAttendanceResponse,
            MyAttendanceResponse,
            ScopedAttendanceResponse,
            AttendanceDetailResponse,
            OverrideAttendanceRequest,
            DashboardResponse,
            // reports
            AttendanceStats,
            DaySummary,
            EmployeeSummary,
            EmployeeMonthReport,
            EmployeeDetailReport,
            ReportOverview,
            ReportStats,
            AnalyticsResponse,
            TrendPoint,
            DailyTrendPoint,
            StatusBreakdown,
            GroupAttendance,
            NamedHours,
            EmployeeCount,
            // directory
            Department,
            SubDepartment,
            DepartmentTree,
            CreateDepartmentRequest,
            CreateSubDepartmentRequest,
            EmployeeProfile,
            EmployeeBrief,
            EmployeeResponse,
            CreateEmployeeRequest,
            UpdateEmployeeRequest
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Auth", description = "Login and the current account"),
        (name = "Attendance", description = "Clock events, listings and overrides"),
        (name = "Reports", description = "Monthly reports, analytics and exports"),
        (name = "Admin", description = "Employee and department management")
    ),
    security(("BearerAuth" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();

        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.bearer_format = Some("JWT".to_string());

        components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Credentials rejected")
    ),
    tag = "Auth",
    security(())
)]
fn login_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses((status = 200, description = "Current account", body = UserResponse)),
    tag = "Auth"
)]
fn me_doc() {}

#[utoipa::path(
    get,
    path = "/api/config/attendance",
    responses((status = 200, body = AttendanceConfigResponse)),
    tag = "Attendance"
)]
fn attendance_config_doc() {}

#[utoipa::path(
    get,
    path = "/api/departments",
    responses((status = 200, body = [DepartmentTree])),
    tag = "Attendance"
)]
fn departments_doc() {}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses((status = 200, body = DashboardResponse)),
    tag = "Attendance"
)]
fn dashboard_doc() {}

#[utoipa::path(
    post,
    path = "/api/attendance/clock-in",
    responses(
        (status = 200, body = ClockEventResponse),
        (status = 409, description = "Already clocked in today")
    ),
    tag = "Attendance"
)]
fn clock_in_doc() {}

#[utoipa::path(
    post,
    path = "/api/attendance/clock-out",
    responses(
        (status = 200, body = ClockEventResponse),
        (status = 409, description = "Not clocked in, or already clocked out")
    ),
    tag = "Attendance"
)]
fn clock_out_doc() {}

#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses((status = 200, body = TodayAttendanceResponse)),
    tag = "Attendance"
)]
fn today_doc() {}

#[utoipa::path(
    get,
    path = "/api/attendance/me",
    params(MonthQuery),
    responses((status = 200, body = MyAttendanceResponse)),
    tag = "Attendance"
)]
fn my_attendance_doc() {}

#[utoipa::path(
    get,
    path = "/api/attendance/team",
    params(AttendanceFilterQuery),
    responses(
        (status = 200, body = ScopedAttendanceResponse),
        (status = 403, description = "Managers and admins only")
    ),
    tag = "Attendance"
)]
fn team_attendance_doc() {}

#[utoipa::path(
    get,
    path = "/api/attendance/all",
    params(AttendanceFilterQuery),
    responses(
        (status = 200, body = ScopedAttendanceResponse),
        (status = 403, description = "Admins only")
    ),
    tag = "Attendance"
)]
fn all_attendance_doc() {}

#[utoipa::path(
    get,
    path = "/api/attendance/analytics",
    responses((status = 200, body = AnalyticsResponse)),
    tag = "Reports"
)]
fn analytics_doc() {}

#[utoipa::path(
    get,
    path = "/api/attendance/export",
    params(AttendanceFilterQuery),
    responses((status = 200, description = "CSV or XLSX file download", content_type = "application/octet-stream")),
    tag = "Reports"
)]
fn export_attendance_doc() {}

#[utoipa::path(
    get,
    path = "/api/attendance/employee-report",
    params(MonthQuery),
    responses((status = 200, body = EmployeeMonthReport)),
    tag = "Reports"
)]
fn employee_report_doc() {}

#[utoipa::path(
    get,
    path = "/api/attendance/employee-report/export",
    params(MonthQuery),
    responses((status = 200, description = "CSV or XLSX file download", content_type = "application/octet-stream")),
    tag = "Reports"
)]
fn export_employee_report_doc() {}

#[utoipa::path(
    get,
    path = "/api/attendance/employee-report/{employee}",
    params(("employee" = String, Path, description = "Employee id"), MonthQuery),
    responses(
        (status = 200, body = EmployeeDetailReport),
        (status = 403, description = "Employee outside the caller's scope")
    ),
    tag = "Reports"
)]
fn employee_detail_report_doc() {}

#[utoipa::path(
    get,
    path = "/api/attendance/employee-report/{employee}/export",
    params(("employee" = String, Path, description = "Employee id"), MonthQuery),
    responses((status = 200, description = "CSV or XLSX file download", content_type = "application/octet-stream")),
    tag = "Reports"
)]
fn export_employee_detail_doc() {}

#[utoipa::path(
    get,
    path = "/api/attendance/{id}",
    params(("id" = String, Path, description = "Attendance id")),
    responses(
        (status = 200, body = AttendanceDetailResponse),
        (status = 403, description = "Record not visible to the caller"),
        (status = 404, description = "Unknown record")
    ),
    tag = "Attendance"
)]
fn attendance_detail_doc() {}

#[utoipa::path(
    patch,
    path = "/api/attendance/{id}/override",
    params(("id" = String, Path, description = "Attendance id")),
    request_body = OverrideAttendanceRequest,
    responses(
        (status = 200, body = ClockEventResponse),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admins only")
    ),
    tag = "Attendance"
)]
fn override_attendance_doc() {}

#[utoipa::path(
    get,
    path = "/api/reports",
    params(MonthQuery),
    responses((status = 200, body = ReportOverview)),
    tag = "Reports"
)]
fn reports_doc() {}

#[utoipa::path(
    get,
    path = "/api/reports/export",
    params(MonthQuery),
    responses((status = 200, description = "CSV or XLSX file download", content_type = "application/octet-stream")),
    tag = "Reports"
)]
fn export_reports_doc() {}

#[utoipa::path(
    get,
    path = "/api/admin/employees",
    params(EmployeeListQuery),
    responses((status = 200, body = [EmployeeProfile])),
    tag = "Admin"
)]
fn admin_list_employees_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/employees",
    request_body = CreateEmployeeRequest,
    responses(
        (status = 201, body = EmployeeResponse),
        (status = 409, description = "Email or employee id already taken")
    ),
    tag = "Admin"
)]
fn admin_create_employee_doc() {}

#[utoipa::path(
    get,
    path = "/api/admin/employees/{id}",
    params(("id" = String, Path, description = "Employee id")),
    responses((status = 200, body = EmployeeResponse)),
    tag = "Admin"
)]
fn admin_get_employee_doc() {}

#[utoipa::path(
    put,
    path = "/api/admin/employees/{id}",
    params(("id" = String, Path, description = "Employee id")),
    request_body = UpdateEmployeeRequest,
    responses((status = 200, body = EmployeeResponse)),
    tag = "Admin"
)]
fn admin_update_employee_doc() {}

#[utoipa::path(
    delete,
    path = "/api/admin/employees/{id}",
    params(("id" = String, Path, description = "Employee id")),
    responses((status = 204, description = "Deleted")),
    tag = "Admin"
)]
fn admin_delete_employee_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/departments",
    request_body = CreateDepartmentRequest,
    responses((status = 201, body = Department)),
    tag = "Admin"
)]
fn admin_create_department_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/departments/{id}/sub-departments",
    params(("id" = String, Path, description = "Department id")),
    request_body = CreateSubDepartmentRequest,
    responses((status = 201, body = SubDepartment)),
    tag = "Admin"
)]
fn admin_create_sub_department_doc() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route_with_bearer_security() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/attendance/{id}/override"));
        assert!(doc.paths.paths.contains_key("/api/reports/export"));
        assert_eq!(doc.paths.paths.len(), 25);
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("BearerAuth"));
    }
}
