use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{docs::ApiDoc, handlers, middleware, state::AppState};

/// Authenticated routes; per-role checks happen in the services.
fn user_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/config/attendance", get(handlers::config::attendance_config))
        .route("/api/departments", get(handlers::departments::list_departments))
        .route("/api/dashboard", get(handlers::dashboard::dashboard))
        .route("/api/attendance/clock-in", post(handlers::attendance::clock_in))
        .route("/api/attendance/clock-out", post(handlers::attendance::clock_out))
        .route("/api/attendance/today", get(handlers::attendance::today))
        .route("/api/attendance/me", get(handlers::attendance::my_attendance))
        .route("/api/attendance/team", get(handlers::attendance::team_attendance))
        .route("/api/attendance/all", get(handlers::attendance::all_attendance))
        .route("/api/attendance/analytics", get(handlers::attendance::analytics))
        .route("/api/attendance/export", get(handlers::reports::export_attendance))
        .route(
            "/api/attendance/employee-report",
            get(handlers::reports::employee_report),
        )
        .route(
            "/api/attendance/employee-report/export",
            get(handlers::reports::export_employee_report),
        )
        .route(
            "/api/attendance/employee-report/{employee}",
            get(handlers::reports::employee_detail_report),
        )
        .route(
            "/api/attendance/employee-report/{employee}/export",
            get(handlers::reports::export_employee_detail),
        )
        .route("/api/attendance/{id}", get(handlers::attendance::attendance_detail))
        .route(
            "/api/attendance/{id}/override",
            patch(handlers::attendance::override_attendance),
        )
        .route("/api/reports", get(handlers::reports::overview))
        .route("/api/reports/export", get(handlers::reports::export_report))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth,
        ))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/employees",
            get(handlers::admin::list_employees).post(handlers::admin::create_employee),
        )
        .route(
            "/api/admin/employees/{id}",
            get(handlers::admin::get_employee)
                .put(handlers::admin::update_employee)
                .delete(handlers::admin::delete_employee),
        )
        .route("/api/admin/departments", post(handlers::admin::create_department))
        .route(
            "/api/admin/departments/{id}/sub-departments",
            post(handlers::admin::create_sub_department),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_admin,
        ))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(24 * 60 * 60))
}

/// The full application: public, user and admin routes with shared layers.
pub fn app(state: AppState) -> Router {
    let public_routes = Router::new().route("/api/auth/login", post(handlers::auth::login));

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public_routes)
        .merge(user_routes(&state))
        .merge(admin_routes(&state))
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(middleware::log_error_responses))
                .layer(cors_layer(&state.config.cors_allow_origins)),
        )
        .with_state(state)
}
