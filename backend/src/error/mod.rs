use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

/// Message returned for every access denial.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal server error: {0:#}")]
    InternalServerError(anyhow::Error),
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl AppError {
    pub fn forbidden() -> Self {
        AppError::Forbidden(UNAUTHORIZED_MESSAGE.to_string())
    }

    pub fn validation(field: &str, message: &str) -> Self {
        AppError::Validation(vec![format!("{}: {}", field, message)])
    }
}

/// Attendance state preconditions that the caller can fix by acting differently.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttendanceError {
    #[error("You have already clocked in today.")]
    AlreadyClockedIn,
    #[error("You must clock in before clocking out.")]
    NotClockedIn,
    #[error("You have already clocked out today.")]
    AlreadyClockedOut,
    #[error("Clock out time must be after clock in time.")]
    ClockOutBeforeClockIn,
    #[error("At least one attendance field must be provided.")]
    NothingToOverride,
}

impl From<AttendanceError> for AppError {
    fn from(err: AttendanceError) -> Self {
        match err {
            AttendanceError::ClockOutBeforeClockIn => {
                AppError::validation("clock_out", &err.to_string())
            }
            AttendanceError::NothingToOverride => AppError::validation("changes", &err.to_string()),
            _ => AppError::Conflict(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code, details) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND".to_string(), None),
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                msg,
                "UNAUTHORIZED".to_string(),
                None,
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, "FORBIDDEN".to_string(), None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, "CONFLICT".to_string(), None),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                msg,
                "BAD_REQUEST".to_string(),
                None,
            ),
            AppError::InternalServerError(err) => {
                tracing::error!(error = ?err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_SERVER_ERROR".to_string(),
                    None,
                )
            }
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                "VALIDATION_ERROR".to_string(),
                Some(serde_json::json!({ "errors": errors })),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code,
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalServerError(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Resource already exists".to_string())
            }
            _ => AppError::InternalServerError(err.into()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let detail = e
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    format!("{}: {}", field, detail)
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    async fn response_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn app_error_into_response_maps_status_and_body() {
        let response = AppError::BadRequest("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"], "bad");
        assert_eq!(json["code"], "BAD_REQUEST");

        let response = AppError::forbidden().into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = response_json(response).await;
        assert_eq!(json["error"], "Unauthorized");
        assert_eq!(json["code"], "FORBIDDEN");

        let response = AppError::NotFound("missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = response_json(response).await;
        assert_eq!(json["error"], "missing");
        assert_eq!(json["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn attendance_preconditions_surface_as_conflicts_with_message() {
        let response = AppError::from(AttendanceError::AlreadyClockedIn).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = response_json(response).await;
        assert_eq!(json["error"], "You have already clocked in today.");

        let response = AppError::from(AttendanceError::NotClockedIn).into_response();
        let json = response_json(response).await;
        assert_eq!(json["error"], "You must clock in before clocking out.");
    }

    #[tokio::test]
    async fn invalid_override_times_surface_as_field_validation() {
        let response = AppError::from(AttendanceError::ClockOutBeforeClockIn).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(
            json["details"]["errors"][0],
            "clock_out: Clock out time must be after clock in time."
        );
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 10, message = "Please provide a detailed reason"))]
        reason: String,
        #[validate(range(min = 0, max = 480))]
        break_minutes: i32,
    }

    #[test]
    fn validation_errors_prefer_messages_over_codes() {
        let sample = Sample {
            reason: "short".into(),
            break_minutes: 900,
        };
        let AppError::Validation(messages) = AppError::from(sample.validate().unwrap_err()) else {
            panic!("expected validation error");
        };
        assert_eq!(
            messages,
            vec![
                "break_minutes: range".to_string(),
                "reason: Please provide a detailed reason".to_string(),
            ]
        );
    }

    #[test]
    fn app_error_converts_into_anyhow_with_its_message() {
        fn lookup() -> anyhow::Result<()> {
            Err::<(), _>(AppError::validation("sub_department_id", "missing"))?;
            Ok(())
        }
        let err = lookup().unwrap_err();
        assert_eq!(err.to_string(), "validation failed: sub_department_id: missing");
        assert!(err.downcast_ref::<AppError>().is_some());
    }

    #[tokio::test]
    async fn app_error_internal_maps_to_generic_message() {
        let response = AppError::InternalServerError(anyhow::anyhow!("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response_json(response).await;
        assert_eq!(json["error"], "Internal server error");
        assert_eq!(json["code"], "INTERNAL_SERVER_ERROR");
        assert!(json["details"].is_null());
    }
}
