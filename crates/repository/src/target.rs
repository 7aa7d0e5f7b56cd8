//! Targets
//!
//! The resolved, usable view of a platform or add-on package, along
//! with the system images and skins attached to it.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::build_tool::BuildToolInfo;
use crate::constants::{FN_SKIN_LAYOUT, PLATFORM_HASH_PREFIX};
use crate::descriptor::{addon_hash, platform_hash, IdDisplay};
use crate::props::Properties;
use crate::revision::Revision;
use crate::version::AndroidVersion;

/// Where a system image was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LocationType {
    /// `images/<abi>` inside a platform or add-on
    InImagesSubfolder,
    /// Flat `images/` folder of `.img` files
    InLegacyFolder,
    /// A standalone system-image package
    InSystemImage,
}

/// An ABI-specific emulator image
#[derive(Debug, Clone, Serialize)]
pub struct SystemImage {
    location: PathBuf,
    location_type: LocationType,
    tag: IdDisplay,
    addon_vendor: Option<IdDisplay>,
    abi: String,
    skins: Vec<PathBuf>,
}

impl SystemImage {
    pub fn new(
        location: impl Into<PathBuf>,
        location_type: LocationType,
        tag: IdDisplay,
        addon_vendor: Option<IdDisplay>,
        abi: impl Into<String>,
        skins: Vec<PathBuf>,
    ) -> Self {
        Self {
            location: location.into(),
            location_type,
            tag,
            addon_vendor,
            abi: abi.into(),
            skins,
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn location_type(&self) -> LocationType {
        self.location_type
    }

    pub fn tag(&self) -> &IdDisplay {
        &self.tag
    }

    pub fn addon_vendor(&self) -> Option<&IdDisplay> {
        self.addon_vendor.as_ref()
    }

    pub fn abi(&self) -> &str {
        &self.abi
    }

    pub fn skins(&self) -> &[PathBuf] {
        &self.skins
    }
}

impl PartialEq for SystemImage {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SystemImage {}

impl Ord for SystemImage {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tag
            .cmp(&other.tag)
            .then_with(|| self.abi.cmp(&other.abi))
            .then_with(|| self.location.cmp(&other.location))
    }
}

impl PartialOrd for SystemImage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A library shipped next to a target's framework jar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionalLibrary {
    pub name: String,
    pub jar: PathBuf,
    pub description: String,
    /// Whether apps need a `<uses-library>` entry to use it
    pub manifest_entry_required: bool,
}

/// Entry of a platform's `optional/optional.json`
#[derive(Debug, Deserialize)]
struct OptionalLibraryEntry {
    name: String,
    jar: String,
    #[serde(default)]
    manifest: bool,
}

/// Parse `optional/optional.json`. Malformed files yield no libraries.
pub fn parse_optional_libraries(json_file: &Path) -> Vec<OptionalLibrary> {
    let Ok(text) = std::fs::read_to_string(json_file) else {
        return Vec::new();
    };
    let entries: Vec<OptionalLibraryEntry> = match serde_json::from_str(&text) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Ignoring malformed {:?}: {}", json_file, e);
            return Vec::new();
        }
    };
    let folder = json_file.parent().unwrap_or(json_file);
    entries
        .into_iter()
        .map(|entry| OptionalLibrary {
            jar: folder.join(&entry.jar),
            description: entry.name.clone(),
            name: entry.name,
            manifest_entry_required: entry.manifest,
        })
        .collect()
}

/// Subfolders of `skins_dir` that contain a `layout` file, sorted by name
pub fn parse_skin_folder(skins_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(skins_dir) else {
        return Vec::new();
    };
    let mut skins: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir() && p.join(FN_SKIN_LAYOUT).is_file())
        .collect();
    skins.sort();
    skins
}

/// Platform-specific target data
#[derive(Debug, Clone)]
pub struct PlatformDetails {
    pub layoutlib_api: Option<u32>,
    pub layoutlib_revision: Option<u32>,
    pub min_tools_rev: Option<Revision>,
    /// Merged `build.prop`, `source.properties` and `sdk.properties`
    pub properties: Properties,
}

/// Add-on-specific target data
#[derive(Debug, Clone)]
pub struct AddonDetails {
    pub base_hash: String,
    pub usb_vendor_id: Option<u16>,
    pub has_rendering_library: bool,
    pub has_rendering_resources: bool,
}

#[derive(Debug, Clone)]
pub enum TargetDetails {
    Platform(PlatformDetails),
    Addon(AddonDetails),
}

/// A resolved platform or add-on
#[derive(Debug, Clone)]
pub struct AndroidTarget {
    pub(crate) location: PathBuf,
    pub(crate) hash: String,
    pub(crate) name: String,
    pub(crate) vendor: String,
    pub(crate) description: String,
    pub(crate) version: AndroidVersion,
    pub(crate) version_name: String,
    pub(crate) revision: u32,
    pub(crate) system_images: Vec<SystemImage>,
    pub(crate) skins: Vec<PathBuf>,
    pub(crate) default_skin: Option<PathBuf>,
    pub(crate) optional_libraries: Vec<OptionalLibrary>,
    pub(crate) sample_path: Option<PathBuf>,
    pub(crate) source_path: Option<PathBuf>,
    pub(crate) build_tool: Option<BuildToolInfo>,
    pub(crate) details: TargetDetails,
}

impl AndroidTarget {
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Hash string, e.g. `android-19` or `Google Inc.:Google APIs:19`
    pub fn hash_string(&self) -> &str {
        &self.hash
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn version(&self) -> &AndroidVersion {
        &self.version
    }

    pub fn version_name(&self) -> &str {
        &self.version_name
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn is_platform(&self) -> bool {
        matches!(self.details, TargetDetails::Platform(_))
    }

    pub fn details(&self) -> &TargetDetails {
        &self.details
    }

    /// System images sorted by tag then ABI
    pub fn system_images(&self) -> &[SystemImage] {
        &self.system_images
    }

    pub fn system_image(&self, tag: &str, abi: &str) -> Option<&SystemImage> {
        self.system_images
            .iter()
            .find(|img| img.tag().id() == tag && img.abi() == abi)
    }

    pub fn skins(&self) -> &[PathBuf] {
        &self.skins
    }

    pub fn default_skin(&self) -> Option<&Path> {
        self.default_skin.as_deref()
    }

    pub fn optional_libraries(&self) -> &[OptionalLibrary] {
        &self.optional_libraries
    }

    pub fn sample_path(&self) -> Option<&Path> {
        self.sample_path.as_deref()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn build_tool(&self) -> Option<&BuildToolInfo> {
        self.build_tool.as_ref()
    }
}

impl fmt::Display for AndroidTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.hash)
    }
}

/// Placeholder for system images whose platform or add-on is not installed
#[derive(Debug, Clone)]
pub struct MissingTarget {
    pub(crate) vendor: Option<String>,
    pub(crate) tag: String,
    pub(crate) version: AndroidVersion,
    pub(crate) system_images: Vec<SystemImage>,
}

impl MissingTarget {
    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    /// Display string of the images' tag
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn version(&self) -> &AndroidVersion {
        &self.version
    }

    pub fn system_images(&self) -> &[SystemImage] {
        &self.system_images
    }

    /// Hash string of the target these images expect
    pub fn hash_string(&self) -> String {
        match &self.vendor {
            Some(vendor) => addon_hash(vendor, &self.tag, &self.version),
            None => platform_hash(&self.version),
        }
    }
}

/// Either an installed target or a placeholder for orphaned images
#[derive(Debug, Clone)]
pub enum SdkTarget {
    Installed(Arc<AndroidTarget>),
    Missing(MissingTarget),
}

impl SdkTarget {
    pub fn hash_string(&self) -> String {
        match self {
            SdkTarget::Installed(target) => target.hash_string().to_string(),
            SdkTarget::Missing(missing) => missing.hash_string(),
        }
    }

    pub fn version(&self) -> &AndroidVersion {
        match self {
            SdkTarget::Installed(target) => target.version(),
            SdkTarget::Missing(missing) => missing.version(),
        }
    }

    pub fn system_images(&self) -> &[SystemImage] {
        match self {
            SdkTarget::Installed(target) => target.system_images(),
            SdkTarget::Missing(missing) => missing.system_images(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, SdkTarget::Missing(_))
    }
}

/// Whether `hash` names a platform rather than an add-on
pub fn is_platform_hash(hash: &str) -> bool {
    hash.starts_with(PLATFORM_HASH_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_skin_folder() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["WVGA800", "HVGA", "broken"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("WVGA800").join(FN_SKIN_LAYOUT), "").unwrap();
        fs::write(dir.path().join("HVGA").join(FN_SKIN_LAYOUT), "").unwrap();
        fs::write(dir.path().join("readme.txt"), "").unwrap();

        let skins = parse_skin_folder(dir.path());
        assert_eq!(skins, vec![dir.path().join("HVGA"), dir.path().join("WVGA800")]);
        assert!(parse_skin_folder(&dir.path().join("missing")).is_empty());
    }

    #[test]
    fn test_parse_optional_libraries() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("optional.json");
        fs::write(
            &json,
            r#"[{"name": "org.apache.http.legacy", "jar": "org.apache.http.legacy.jar", "manifest": false},
                {"name": "android.test.mock", "jar": "android.test.mock.jar", "manifest": true}]"#,
        )
        .unwrap();

        let libs = parse_optional_libraries(&json);
        assert_eq!(libs.len(), 2);
        assert_eq!(libs[0].jar, dir.path().join("org.apache.http.legacy.jar"));
        assert!(libs[1].manifest_entry_required);

        fs::write(&json, "{not json").unwrap();
        assert!(parse_optional_libraries(&json).is_empty());
    }

    #[test]
    fn test_system_image_ordering() {
        let img = |tag: &str, abi: &str| {
            SystemImage::new(
                format!("/sdk/system-images/android-19/{}/{}", tag, abi),
                LocationType::InSystemImage,
                IdDisplay::from_id(tag),
                None,
                abi,
                Vec::new(),
            )
        };
        let mut images = vec![img("google_apis", "x86"), img("default", "x86"), img("default", "armeabi-v7a")];
        images.sort();
        let order: Vec<_> = images.iter().map(|i| (i.tag().id().to_string(), i.abi().to_string())).collect();
        assert_eq!(
            order,
            vec![
                ("default".to_string(), "armeabi-v7a".to_string()),
                ("default".to_string(), "x86".to_string()),
                ("google_apis".to_string(), "x86".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_target_hash() {
        let platformless = MissingTarget {
            vendor: None,
            tag: "Default".into(),
            version: AndroidVersion::new(21, None),
            system_images: Vec::new(),
        };
        assert_eq!(platformless.hash_string(), "android-21");
        assert!(is_platform_hash(&platformless.hash_string()));

        let addonless = MissingTarget {
            vendor: Some("Google Inc.".into()),
            ..platformless
        };
        assert_eq!(addonless.hash_string(), "Google Inc.:Default:21");
    }
}
