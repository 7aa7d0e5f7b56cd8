//! DroidSdk Core - shared types
//! 
//! Configuration and error types used by the repository engine
//! and the inspector binary.

pub mod config;
pub mod error;

pub use config::{AppConfig, AndroidConfig, LoggingConfig, ReportConfig};
pub use error::{SdkError, Result};

/// DroidSdk version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "DroidSdk";
