mod admin_session;
mod client_ip;
mod query;
pub use admin_session::AdminSession;
pub use client_ip::{ClientIp, UNKNOWN_IP};
pub use query::Query;
