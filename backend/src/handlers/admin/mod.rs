pub mod departments;
pub mod employees;

pub use departments::*;
pub use employees::*;
