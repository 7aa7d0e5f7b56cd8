//! Local Android SDK Repository
//! 
//! Scans an Android SDK installation and exposes its packages:
//! - Package descriptors and per-kind scanners
//! - Change detection through directory fingerprints
//! - Platform and add-on target resolution
//! - Build tools, including the legacy platform-tools layout

pub mod build_tool;
pub mod constants;
pub mod descriptor;
pub mod detector;
pub mod error;
pub mod fingerprint;
pub mod package;
pub mod props;
pub mod revision;
pub mod scanner;
pub mod sdk;
pub mod target;
pub mod version;

mod resolve;

#[cfg(test)]
mod testutil;

pub use build_tool::{BuildToolInfo, PathId};
pub use descriptor::{IdDisplay, PkgDesc, PkgType};
pub use detector::{DetectionError, SdkInfo, ToolchainDetector};
pub use error::{RepositoryError, Result};
pub use fingerprint::DirFingerprint;
pub use package::{LocalPkgInfo, Resolution};
pub use revision::{PreviewType, Revision};
pub use scanner::Diagnostic;
pub use sdk::LocalSdk;
pub use target::{
    AndroidTarget, LocationType, MissingTarget, OptionalLibrary, SdkTarget, SystemImage, TargetDetails,
};
pub use version::AndroidVersion;
