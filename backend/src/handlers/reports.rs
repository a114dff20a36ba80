//! Monthly reports, employee reports and their file exports.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Response,
    Json,
};
use chrono::NaiveDate;

use crate::{
    error::AppError,
    handlers::{
        attendance::requested_filter,
        common::{file_download, parse_id, resolve_month_year},
    },
    models::{
        attendance::{Attendance, AttendanceFilterQuery, MonthQuery},
        employee::EmployeeProfile,
        report::{EmployeeDetailReport, EmployeeMonthReport, ReportOverview},
        user::{Capability, User},
    },
    services::{
        export::{
            attendance_export_filename, attendance_rows_sheet, employee_detail_filename,
            employee_detail_sheet, employee_summary_sheet, monthly_report_filename, render_file,
            ExportFormat,
        },
        reporting::{absent_days, attendance_stats, employee_summaries, report_overview, working_days},
    },
    state::AppState,
    types::UserId,
    utils::time::{month_name, reporting_range},
};

/// The selected month clipped to today, with in-scope employees and their records.
struct MonthlyInputs {
    month: u32,
    year: i32,
    start: NaiveDate,
    end: NaiveDate,
    employees: Vec<EmployeeProfile>,
    records: Vec<Attendance>,
}

fn month_range(query: &MonthQuery, today: NaiveDate) -> Result<(u32, i32, NaiveDate, NaiveDate), AppError> {
    let (month, year) = resolve_month_year(query.month.as_deref(), query.year.as_deref(), today)?;
    let (start, end) = reporting_range(year, month, today)
        .ok_or_else(|| AppError::validation("month", "The month must be between 1 and 12."))?;
    Ok((month, year, start, end))
}

async fn monthly_inputs(
    state: &AppState,
    user: &User,
    capability: Capability,
    query: &MonthQuery,
) -> Result<MonthlyInputs, AppError> {
    let (month, year, start, end) = month_range(query, state.today())?;
    let scope = state.visibility.authorize(user, capability).await?;
    let employees = state.visibility.employees_in_scope(&scope).await?;
    let ids: Vec<UserId> = employees.iter().map(|employee| employee.id).collect();
    let records = state.attendance.records_for(&ids, start, end).await?;
    Ok(MonthlyInputs {
        month,
        year,
        start,
        end,
        employees,
        records,
    })
}

pub async fn overview(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<ReportOverview>, AppError> {
    let inputs = monthly_inputs(&state, &user, Capability::ViewReports, &query).await?;
    Ok(Json(report_overview(
        &inputs.employees,
        &inputs.records,
        inputs.month,
        inputs.year,
        inputs.start,
        inputs.end,
    )))
}

pub async fn export_report(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<MonthQuery>,
) -> Result<Response, AppError> {
    let format = ExportFormat::parse(query.format.as_deref())?;
    let inputs = monthly_inputs(&state, &user, Capability::ExportAttendance, &query).await?;
    let summaries = employee_summaries(&inputs.employees, &inputs.records);
    let sheet = employee_summary_sheet(&summaries, inputs.month, inputs.year);
    let filename = monthly_report_filename("attendance_report", inputs.month, inputs.year, format);
    file_download(render_file(sheet, format, filename).await?)
}

pub async fn employee_report(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<EmployeeMonthReport>, AppError> {
    let inputs = monthly_inputs(&state, &user, Capability::ViewReports, &query).await?;
    Ok(Json(EmployeeMonthReport {
        month: inputs.month,
        year: inputs.year,
        month_name: month_name(inputs.month).to_string(),
        start_date: inputs.start,
        end_date: inputs.end,
        employees: employee_summaries(&inputs.employees, &inputs.records),
    }))
}

pub async fn export_employee_report(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<MonthQuery>,
) -> Result<Response, AppError> {
    let format = ExportFormat::parse(query.format.as_deref())?;
    let inputs = monthly_inputs(&state, &user, Capability::ExportAttendance, &query).await?;
    let summaries = employee_summaries(&inputs.employees, &inputs.records);
    let sheet = employee_summary_sheet(&summaries, inputs.month, inputs.year);
    let filename = monthly_report_filename("employee_report", inputs.month, inputs.year, format);
    file_download(render_file(sheet, format, filename).await?)
}

async fn employee_detail(
    state: &AppState,
    user: &User,
    capability: Capability,
    employee: &str,
    query: &MonthQuery,
) -> Result<EmployeeDetailReport, AppError> {
    let employee_id: UserId = parse_id("employee", employee)?;
    let (month, year, start, end) = month_range(query, state.today())?;
    let scope = state.visibility.authorize(user, capability).await?;
    let employee = state.visibility.employee_in_scope(&scope, employee_id).await?;
    let attendances = state
        .attendance
        .records_for(&[employee.id], start, end)
        .await?;

    Ok(EmployeeDetailReport {
        stats: attendance_stats(&attendances),
        working_days: working_days(&employee, start, end),
        absent_days: absent_days(&employee, &attendances, start, end),
        month,
        year,
        month_name: month_name(month).to_string(),
        start_date: start,
        end_date: end,
        employee,
        attendances,
    })
}

pub async fn employee_detail_report(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(employee): Path<String>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<EmployeeDetailReport>, AppError> {
    Ok(Json(
        employee_detail(&state, &user, Capability::ViewReports, &employee, &query).await?,
    ))
}

pub async fn export_employee_detail(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(employee): Path<String>,
    Query(query): Query<MonthQuery>,
) -> Result<Response, AppError> {
    let format = ExportFormat::parse(query.format.as_deref())?;
    let report = employee_detail(&state, &user, Capability::ExportAttendance, &employee, &query).await?;
    let sheet = employee_detail_sheet(&report.employee, &report.attendances);
    let filename = employee_detail_filename(&report.employee.employee_code, report.month, report.year, format);
    file_download(render_file(sheet, format, filename).await?)
}

/// Filtered attendance rows as a file; the same scoping as the listings, unpaged.
pub async fn export_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<AttendanceFilterQuery>,
) -> Result<Response, AppError> {
    let format = ExportFormat::parse(query.format.as_deref())?;
    let requested = requested_filter(&query)?;
    let scope = state
        .visibility
        .authorize(&user, Capability::ExportAttendance)
        .await?;
    let (rows, _) = state.attendance.rows(scope.restrict(&requested), None).await?;
    tracing::info!(user_id = %user.id, rows = rows.len(), format = format.extension(), "attendance export");

    let filename = attendance_export_filename(state.now(), format);
    file_download(render_file(attendance_rows_sheet(&rows), format, filename).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn current_month_is_clipped_to_today() {
        let query = MonthQuery::default();
        let (month, year, start, end) = month_range(&query, date(2024, 3, 10)).unwrap();
        assert_eq!((month, year), (3, 2024));
        assert_eq!(start, date(2024, 3, 1));
        assert_eq!(end, date(2024, 3, 10));
    }

    #[test]
    fn past_months_cover_the_whole_month() {
        let query = MonthQuery {
            month: Some("2".into()),
            year: Some("2024".into()),
            format: None,
        };
        let (_, _, start, end) = month_range(&query, date(2024, 3, 10)).unwrap();
        assert_eq!((start, end), (date(2024, 2, 1), date(2024, 2, 29)));
    }

    #[test]
    fn out_of_range_month_is_a_validation_error() {
        let query = MonthQuery {
            month: Some("0".into()),
            ..Default::default()
        };
        assert!(matches!(
            month_range(&query, date(2024, 3, 10)),
            Err(AppError::Validation(_))
        ));
    }
}
