pub mod dashboard;
pub mod display;
pub mod filter;
pub mod listing;
pub mod resource;
pub mod session;
pub mod upload;
pub mod user;
