//! 服务层共享工具

pub mod pagination;
pub mod response;
pub mod slug;

pub use pagination::{PaginationInfo, PaginationParams, build_page, validate_name_format};
pub use response::ServiceResponse;
pub use slug::slugify;
