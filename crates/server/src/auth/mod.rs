pub mod error;
pub mod session;
pub mod throttle;
pub mod utils;
