pub mod jwt;
pub mod password;
pub mod time_tag;
pub mod validation;
