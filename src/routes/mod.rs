pub mod announcements;

pub mod auth;

pub mod classes;

pub mod dashboard;

pub mod finance;

pub mod students;

pub mod teachers;

pub mod users;

pub use announcements::configure_announcement_routes;
pub use auth::configure_auth_routes;
pub use classes::configure_classes_routes;
pub use dashboard::configure_dashboard_routes;
pub use finance::configure_finance_routes;
pub use students::configure_student_routes;
pub use teachers::configure_teacher_routes;
pub use users::configure_user_routes;
