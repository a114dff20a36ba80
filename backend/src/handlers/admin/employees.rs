use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::common::{parse_id, parse_optional_id},
    models::{
        employee::{
            CreateEmployeeRequest, EmployeeFilter, EmployeeListQuery, EmployeeProfile,
            EmployeeResponse, UpdateEmployeeRequest,
        },
        user::User,
    },
    state::AppState,
    types::UserId,
};

fn employee_filter(query: &EmployeeListQuery) -> Result<EmployeeFilter, AppError> {
    Ok(EmployeeFilter {
        include_admins: true,
        department_id: parse_optional_id("department", query.department.as_deref())?,
        sub_department_ids: parse_optional_id("sub_department", query.sub_department.as_deref())?
            .map(|id| vec![id]),
        employee_id: None,
        search: query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
            .map(str::to_string),
    })
}

pub async fn list_employees(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<EmployeeListQuery>,
) -> Result<Json<Vec<EmployeeProfile>>, AppError> {
    let filter = employee_filter(&query)?;
    Ok(Json(state.directory.list_employees(&user, filter).await?))
}

pub async fn get_employee(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<EmployeeResponse>, AppError> {
    let id: UserId = parse_id("id", &id)?;
    Ok(Json(state.directory.employee(&user, id).await?))
}

pub async fn create_employee(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<EmployeeResponse>), AppError> {
    payload.validate()?;
    let employee = state.directory.create_employee(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn update_employee(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateEmployeeRequest>,
) -> Result<Json<EmployeeResponse>, AppError> {
    let id: UserId = parse_id("id", &id)?;
    payload.validate()?;
    Ok(Json(state.directory.update_employee(&user, id, payload).await?))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: UserId = parse_id("id", &id)?;
    state.directory.delete_employee(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
