use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    config::Config,
    db::connection::DbPool,
    repositories::{
        AttendanceRepository, AuditLogRepository, DepartmentRepository, UserRepository,
        UserRepositoryTrait,
    },
    services::{AttendanceService, DirectoryService, VisibilityService},
    utils::time,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Config,
    pub users: Arc<dyn UserRepositoryTrait>,
    pub attendance: AttendanceService,
    pub visibility: VisibilityService,
    pub directory: DirectoryService,
}

impl AppState {
    /// Wires the Postgres-backed repositories into every service.
    pub fn new(pool: DbPool, config: Config) -> Self {
        let users: Arc<dyn UserRepositoryTrait> = Arc::new(UserRepository::new());
        let attendance = AttendanceService::new(
            pool.clone(),
            config.attendance.clone(),
            Arc::new(AttendanceRepository::new()),
            Arc::new(AuditLogRepository::new()),
        );
        let visibility = VisibilityService::new(pool.clone(), users.clone());
        let directory = DirectoryService::new(
            pool.clone(),
            users.clone(),
            Arc::new(DepartmentRepository::new()),
        );

        Self {
            pool,
            config,
            users,
            attendance,
            visibility,
            directory,
        }
    }

    /// Current wall-clock time in the configured zone.
    pub fn now(&self) -> NaiveDateTime {
        time::now_local(&self.config.time_zone)
    }

    pub fn today(&self) -> NaiveDate {
        time::today_local(&self.config.time_zone)
    }
}
