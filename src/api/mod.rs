pub mod auth;
pub mod handlers;
pub mod origin;
pub mod request_log;
pub mod router;
