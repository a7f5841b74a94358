pub mod request_id;
pub mod response;

pub use request_id::{make_request_span, propagate_request_id, set_request_id};
pub use response::{ApiResponse, ApiResult};
