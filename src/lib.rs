//! DroidSdk - local Android SDK inspector
//! 
//! Reads an Android SDK installation the way SDK tooling sees it:
//! installed packages, platform and add-on targets, system images
//! and build tools.
//! 
//! ## Architecture
//! 
//! - `droidsdk-core`: Configuration and shared errors
//! - `droidsdk-repository`: Package scanning, change detection and target resolution

#![warn(clippy::all)]

pub mod report;

// Re-export main components for library usage
pub use droidsdk_core as core;
pub use droidsdk_repository as repository;

/// Prelude module for convenient imports
pub mod prelude {
    pub use droidsdk_core::config::AppConfig;
    pub use droidsdk_repository::{LocalSdk, PkgType, ToolchainDetector};
    pub use crate::report::InventoryReport;
}
