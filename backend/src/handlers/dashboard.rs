use axum::{
    extract::{Extension, State},
    Json,
};

use crate::{
    error::AppError,
    models::{attendance::DashboardResponse, employee::EmployeeProfile, user::User},
    services::{reporting::day_summary, AttendanceScope},
    state::AppState,
    types::UserId,
};

/// Today's record, month stats and today's company and department summaries.
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<DashboardResponse>, AppError> {
    let now = state.now();
    let date = now.date();
    let today = state.attendance.today(&user, now).await?;
    let month_stats = state.attendance.month_stats(user.id, date).await?;

    let employees = state
        .visibility
        .employees_in_scope(&AttendanceScope::Everyone)
        .await?;
    let ids: Vec<UserId> = employees.iter().map(|employee| employee.id).collect();
    let records = state.attendance.records_for(&ids, date, date).await?;
    let department_summary = user.department_id.map(|department_id| {
        let members: Vec<EmployeeProfile> = employees
            .iter()
            .filter(|employee| employee.department_id == Some(department_id))
            .cloned()
            .collect();
        day_summary(&members, &records, date)
    });

    Ok(Json(DashboardResponse {
        date,
        today: today.attendance,
        is_weekend: today.is_weekend,
        month_stats,
        company_summary: day_summary(&employees, &records, date),
        department_summary,
        office_start_time: state
            .attendance
            .policy()
            .office_start
            .format("%H:%M")
            .to_string(),
        current_time: now.format("%H:%M:%S").to_string(),
    }))
}
