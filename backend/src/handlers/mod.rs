pub mod admin;
pub mod attendance;
pub mod auth;
pub mod common;
pub mod config;
pub mod dashboard;
pub mod departments;
pub mod reports;
