use axum::{
    extract::{Extension, Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AttendanceError},
    handlers::common::{client_info, parse_date_range, parse_id, parse_optional_id, resolve_month_year},
    models::{
        attendance::{
            Attendance, AttendanceDetailResponse, AttendanceFilterQuery, MonthQuery,
            MyAttendanceResponse, OverrideAttendanceRequest, ScopedAttendanceResponse,
            TodayAttendanceResponse,
        },
        employee::EmployeeBrief,
        report::AnalyticsResponse,
        user::{Capability, User, UserRole},
        PaginatedResponse, PaginationQuery,
    },
    services::{
        attendance_rules::AttendanceChanges,
        reporting::{analytics as build_analytics, day_summary, group_by_department, group_by_sub_department, AnalyticsView},
        visibility::RequestedFilter,
        AttendanceScope,
    },
    state::AppState,
    types::{AttendanceId, UserId},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ClockEventResponse {
    pub message: String,
    pub attendance: Attendance,
}

pub async fn clock_in(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
) -> Result<Json<ClockEventResponse>, AppError> {
    let attendance = state
        .attendance
        .clock_in(&user, state.now(), client_info(&headers))
        .await?;
    let message = if attendance.is_late {
        format!("Clocked in successfully. You are {} minutes late.", attendance.late_minutes)
    } else {
        "Clocked in successfully.".to_string()
    };
    Ok(Json(ClockEventResponse { message, attendance }))
}

pub async fn clock_out(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
) -> Result<Json<ClockEventResponse>, AppError> {
    let attendance = state
        .attendance
        .clock_out(&user, state.now(), client_info(&headers))
        .await?;
    Ok(Json(ClockEventResponse {
        message: "Clocked out successfully.".to_string(),
        attendance,
    }))
}

pub async fn today(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<TodayAttendanceResponse>, AppError> {
    Ok(Json(state.attendance.today(&user, state.now()).await?))
}

pub async fn my_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MyAttendanceResponse>, AppError> {
    let today = state.today();
    let (month, year) = resolve_month_year(query.month.as_deref(), query.year.as_deref(), today)?;
    Ok(Json(state.attendance.my_month(&user, year, month, today).await?))
}

pub async fn team_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<AttendanceFilterQuery>,
) -> Result<Json<ScopedAttendanceResponse>, AppError> {
    Ok(Json(
        scoped_listing(&state, &user, Capability::ViewTeamAttendance, &query).await?,
    ))
}

pub async fn all_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<AttendanceFilterQuery>,
) -> Result<Json<ScopedAttendanceResponse>, AppError> {
    Ok(Json(
        scoped_listing(&state, &user, Capability::ViewAllAttendance, &query).await?,
    ))
}

/// Parses the listing filters; shared with the attendance export.
pub fn requested_filter(query: &AttendanceFilterQuery) -> Result<RequestedFilter, AppError> {
    let (start_date, end_date) =
        parse_date_range(query.start_date.as_deref(), query.end_date.as_deref())?;
    Ok(RequestedFilter {
        start_date,
        end_date,
        department_id: parse_optional_id("department", query.department.as_deref())?,
        sub_department_id: parse_optional_id("sub_department", query.sub_department.as_deref())?,
        employee_id: parse_optional_id("employee", query.employee.as_deref())?,
    })
}

async fn scoped_listing(
    state: &AppState,
    user: &User,
    capability: Capability,
    query: &AttendanceFilterQuery,
) -> Result<ScopedAttendanceResponse, AppError> {
    let requested = requested_filter(query)?;
    let page = PaginationQuery::new(query.limit, query.offset);
    let scope = state.visibility.authorize(user, capability).await?;

    let (rows, total) = state
        .attendance
        .rows(scope.restrict(&requested), Some(&page))
        .await?;

    let employees = state.visibility.employees_in_scope(&scope).await?;
    let summary = if employees.is_empty() {
        None
    } else {
        let today = state.today();
        let ids: Vec<UserId> = employees.iter().map(|employee| employee.id).collect();
        let records = state.attendance.records_for(&ids, today, today).await?;
        Some(day_summary(&employees, &records, today))
    };

    let sub_departments = match scope.managed_ids() {
        Some([]) => Vec::new(),
        Some(managed) => state
            .directory
            .sub_departments(None)
            .await?
            .into_iter()
            .filter(|sub| managed.contains(&sub.id))
            .collect(),
        None => state.directory.sub_departments(None).await?,
    };

    tracing::debug!(
        user_id = %user.id,
        total,
        employees = employees.len(),
        "scoped attendance listing"
    );

    Ok(ScopedAttendanceResponse {
        attendances: PaginatedResponse::new(rows, total, page.limit(), page.offset()),
        summary,
        sub_departments,
        employees: employees.iter().map(EmployeeBrief::from).collect(),
    })
}

pub async fn attendance_detail(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<AttendanceDetailResponse>, AppError> {
    let id: AttendanceId = parse_id("id", &id)?;
    let scope = state.visibility.scope_for(&user).await?;
    Ok(Json(state.attendance.detail(&user, &scope, id).await?))
}

pub async fn override_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<OverrideAttendanceRequest>,
) -> Result<Json<ClockEventResponse>, AppError> {
    user.require(Capability::OverrideAttendance)?;
    let id: AttendanceId = parse_id("id", &id)?;

    payload.validate()?;
    if !payload.has_valid_time_order() {
        return Err(AttendanceError::ClockOutBeforeClockIn.into());
    }
    let changes = AttendanceChanges {
        clock_in: payload.clock_in,
        clock_out: payload.clock_out,
        break_minutes: payload.break_minutes,
        is_late: payload.is_late,
    };
    if changes.is_empty() {
        return Err(AttendanceError::NothingToOverride.into());
    }

    let attendance = state
        .attendance
        .override_attendance(&user, id, &changes, &payload.reason, client_info(&headers).ip)
        .await?;
    Ok(Json(ClockEventResponse {
        message: "Attendance updated successfully.".to_string(),
        attendance,
    }))
}

pub async fn analytics(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let scope = state
        .visibility
        .authorize(&user, Capability::ViewTeamAttendance)
        .await?;
    let view = analytics_view(&user, &scope);
    let today = state.today();

    let employees = state.visibility.employees_in_scope(&scope).await?;
    let ids: Vec<UserId> = employees.iter().map(|employee| employee.id).collect();
    let records = state
        .attendance
        .records_for(&ids, view.window_start(today), today)
        .await?;

    let groups = match view {
        AnalyticsView::Team => group_by_sub_department(&employees),
        AnalyticsView::Company => group_by_department(&employees),
    };
    Ok(Json(build_analytics(view, &employees, &groups, &records, today)))
}

fn analytics_view(user: &User, scope: &AttendanceScope) -> AnalyticsView {
    match (user.role, scope) {
        (UserRole::Admin, _) | (_, AttendanceScope::Everyone) => AnalyticsView::Company,
        _ => AnalyticsView::Team,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::sample_user;
    use crate::types::SubDepartmentId;

    #[test]
    fn requested_filter_parses_ids_and_dates() {
        let employee = UserId::new();
        let query = AttendanceFilterQuery {
            start_date: Some("2024-05-01".into()),
            end_date: Some("2024-05-31".into()),
            employee: Some(employee.to_string()),
            ..Default::default()
        };
        let filter = requested_filter(&query).unwrap();
        assert_eq!(filter.employee_id, Some(employee));
        assert_eq!(filter.start_date.unwrap().to_string(), "2024-05-01");
        assert!(filter.sub_department_id.is_none());
    }

    #[test]
    fn requested_filter_rejects_malformed_ids() {
        let query = AttendanceFilterQuery {
            sub_department: Some("sales".into()),
            ..Default::default()
        };
        assert!(matches!(requested_filter(&query), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn managers_get_the_team_view_and_admins_the_company_view() {
        let manager = sample_user(UserRole::Manager);
        let admin = sample_user(UserRole::Admin);
        let managed = AttendanceScope::SubDepartments(vec![SubDepartmentId::new()]);
        assert_eq!(analytics_view(&manager, &managed), AnalyticsView::Team);
        assert_eq!(analytics_view(&admin, &AttendanceScope::Everyone), AnalyticsView::Company);
    }
}
