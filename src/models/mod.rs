pub mod announcements;
pub mod auth;
pub mod classes;
pub mod common;
pub mod dashboard;
pub mod finance;
pub mod students;
pub mod teachers;
pub mod users;

pub use common::{ApiResponse, ErrorCode, PaginationInfo, PaginationQuery};
