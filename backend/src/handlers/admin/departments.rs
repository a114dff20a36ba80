use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::common::parse_id,
    models::{
        department::{CreateDepartmentRequest, CreateSubDepartmentRequest, Department, SubDepartment},
        user::User,
    },
    state::AppState,
    types::DepartmentId,
};

pub async fn create_department(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<Department>), AppError> {
    payload.validate()?;
    let department = state.directory.create_department(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

pub async fn create_sub_department(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(department_id): Path<String>,
    Json(payload): Json<CreateSubDepartmentRequest>,
) -> Result<(StatusCode, Json<SubDepartment>), AppError> {
    let department_id: DepartmentId = parse_id("id", &department_id)?;
    payload.validate()?;
    let sub_department = state
        .directory
        .create_sub_department(&user, department_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(sub_department)))
}
