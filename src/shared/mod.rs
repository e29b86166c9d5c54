// Shared kernel: cross-module errors, configuration and infrastructure

pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod utils;

pub use config::AppConfig;
pub use infrastructure::Database;
