use axum::{extract::State, Json};

use crate::{error::AppError, models::department::DepartmentTree, state::AppState};

/// Active departments with their active sub-departments.
pub async fn list_departments(
    State(state): State<AppState>,
) -> Result<Json<Vec<DepartmentTree>>, AppError> {
    Ok(Json(state.directory.department_tree().await?))
}
