mod error_detail;
mod request_filter;
mod security_headers;
pub use error_detail::error_detail;
pub use request_filter::{
    find_suspicious, RequestFilter, RequestSnapshot, MAX_BODY_BYTES, REJECTION_MESSAGE,
};
pub use security_headers::security_headers;
