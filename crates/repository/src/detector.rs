//! SDK Detection
//!
//! Locates an installed Android SDK from environment variables, the
//! usual per-OS install locations and the `adb` found on `PATH`.

use std::env;
use std::path::{Path, PathBuf};
use tracing::{info, debug};
use which::which;

use crate::descriptor::PkgType;

/// Result of SDK detection
#[derive(Debug, Clone)]
pub struct SdkInfo {
    pub path: PathBuf,
    pub build_tools_versions: Vec<String>,
    pub platform_versions: Vec<String>,
    pub has_platform_tools: bool,
}

/// SDK detection errors
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("SDK not found")]
    SdkNotFound,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// SDK detector
pub struct ToolchainDetector;

impl ToolchainDetector {
    /// Detect Android SDK installation
    pub fn detect_sdk() -> Result<SdkInfo, DetectionError> {
        info!("Detecting Android SDK...");
        Self::detect_sdk_in(Self::sdk_candidates())
    }

    /// First valid SDK among `candidates`
    pub fn detect_sdk_in(candidates: impl IntoIterator<Item = PathBuf>) -> Result<SdkInfo, DetectionError> {
        for path in candidates {
            if Self::is_valid_sdk(&path) {
                let info = Self::analyze_sdk(&path)?;
                info!("Found Android SDK at {:?}", path);
                return Ok(info);
            }
            debug!("No SDK at {:?}", path);
        }

        Err(DetectionError::SdkNotFound)
    }

    /// Get SDK path candidates
    pub fn sdk_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        // Environment variable
        if let Ok(sdk_root) = env::var("ANDROID_SDK_ROOT") {
            candidates.push(PathBuf::from(sdk_root));
        }
        if let Ok(android_home) = env::var("ANDROID_HOME") {
            candidates.push(PathBuf::from(android_home));
        }

        // Common Windows paths
        if cfg!(windows) {
            if let Some(local) = dirs::data_local_dir() {
                candidates.push(local.join("Android").join("Sdk"));
            }
            candidates.push(PathBuf::from(r"C:\Android\sdk"));
            candidates.push(PathBuf::from(r"C:\Program Files\Android\sdk"));
            candidates.push(PathBuf::from(r"C:\Program Files (x86)\Android\sdk"));
        }

        // Common macOS path
        if cfg!(target_os = "macos") {
            if let Some(home) = dirs::home_dir() {
                candidates.push(home.join("Library").join("Android").join("sdk"));
            }
        }

        // Common Unix paths
        if cfg!(unix) {
            if let Some(home) = dirs::home_dir() {
                candidates.push(home.join("Android").join("Sdk"));
                candidates.push(home.join("android-sdk"));
            }
            candidates.push(PathBuf::from("/opt/android-sdk"));
            candidates.push(PathBuf::from("/usr/local/android-sdk"));
        }

        // platform-tools/adb on PATH
        if let Ok(adb) = which("adb") {
            let adb = adb.canonicalize().unwrap_or(adb);
            if let Some(root) = adb.parent().and_then(Path::parent) {
                candidates.push(root.to_path_buf());
            }
        }

        candidates
    }

    /// Check if a path contains a valid SDK
    pub fn is_valid_sdk(path: &Path) -> bool {
        if !path.is_dir() {
            return false;
        }

        // Must have platforms directory
        if !path.join(PkgType::Platform.folder_name()).is_dir() {
            return false;
        }

        // Must have build-tools or platform-tools
        path.join(PkgType::BuildTools.folder_name()).is_dir()
            || path.join(PkgType::PlatformTools.folder_name()).is_dir()
    }

    /// Summarize the folders of an SDK installation
    fn analyze_sdk(path: &Path) -> Result<SdkInfo, DetectionError> {
        let list = |kind: PkgType| -> Result<Vec<String>, DetectionError> {
            let dir = path.join(kind.folder_name());
            if !dir.is_dir() {
                return Ok(Vec::new());
            }
            let mut names: Vec<String> = std::fs::read_dir(&dir)?
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_dir())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            Ok(names)
        };

        let platform_versions = list(PkgType::Platform)?;
        if platform_versions.is_empty() {
            debug!("SDK at {:?} has no platforms installed", path);
        }

        Ok(SdkInfo {
            path: path.to_path_buf(),
            build_tools_versions: list(PkgType::BuildTools)?,
            platform_versions,
            has_platform_tools: path.join(PkgType::PlatformTools.folder_name()).is_dir(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_sdk_candidates() {
        // Always includes at least the fixed per-OS locations
        let candidates = ToolchainDetector::sdk_candidates();
        assert!(!candidates.is_empty());
    }

    #[test]
    fn test_detect_first_valid() {
        let dir = tempfile::tempdir().unwrap();
        let incomplete = dir.path().join("incomplete");
        fs::create_dir_all(incomplete.join("platforms")).unwrap();

        let sdk = dir.path().join("sdk");
        fs::create_dir_all(sdk.join("platforms").join("android-19")).unwrap();
        fs::create_dir_all(sdk.join("build-tools").join("19.1.0")).unwrap();

        let info = ToolchainDetector::detect_sdk_in(vec![
            dir.path().join("missing"),
            incomplete,
            sdk.clone(),
        ])
        .unwrap();
        assert_eq!(info.path, sdk);
        assert_eq!(info.platform_versions, vec!["android-19".to_string()]);
        assert_eq!(info.build_tools_versions, vec!["19.1.0".to_string()]);
        assert!(!info.has_platform_tools);
    }

    #[test]
    fn test_detect_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ToolchainDetector::detect_sdk_in(vec![dir.path().to_path_buf()]),
            Err(DetectionError::SdkNotFound)
        ));
    }
}
