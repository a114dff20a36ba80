pub mod attendance;
pub mod attendance_rules;
pub mod directory;
pub mod export;
pub mod reporting;
pub mod visibility;

pub use attendance::{AttendanceService, ClientInfo};
pub use directory::DirectoryService;
pub use visibility::{AttendanceScope, VisibilityService};
