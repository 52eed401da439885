pub mod auth;
pub mod timeout;

pub use auth::AuthDoctor;
pub use timeout::{request_timeout, RequestTimeout};
