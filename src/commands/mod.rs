pub mod config;
pub mod smoke;
pub mod start;
