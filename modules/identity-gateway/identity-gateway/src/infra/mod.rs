pub mod http;
pub mod invoke;
