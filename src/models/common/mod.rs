pub mod error_code;
pub mod nullable;
pub mod pagination;
pub mod response;
pub mod string_enum;

pub use error_code::ErrorCode;
pub use nullable::nullable;
pub use pagination::{PaginatedResponse, PaginationInfo, PaginationQuery, option_from_str};
pub use response::ApiResponse;
pub(crate) use string_enum::string_enum;
pub use string_enum::SortOrder;
