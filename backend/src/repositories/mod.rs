pub mod attendance_repository;
pub mod audit_log;
pub mod common;
pub mod department;
pub mod transaction;
pub mod user_repository;

pub use attendance_repository::{
    AttendanceRepository, AttendanceRepositoryTrait, AttendanceRowFilter, ClockInEntry,
    ClockOutEntry,
};
pub use audit_log::{AuditLogRepository, AuditLogRepositoryTrait};
pub use department::{DepartmentRepository, DepartmentRepositoryTrait};
pub use transaction::*;
pub use user_repository::{UserRepository, UserRepositoryTrait};
