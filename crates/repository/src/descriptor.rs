//! Package descriptors
//!
//! The immutable identity of an installed package. Two descriptors are
//! equal when they have the same kind and the same kind-specific
//! discriminator (version, revision, vendor/path, tag/abi...). The
//! revision only breaks ties when sorting.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::constants::PLATFORM_HASH_PREFIX;
use crate::revision::Revision;
use crate::version::AndroidVersion;

static NON_ID_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_-]+").expect("id pattern is valid"));
static REPEATED_UNDERSCORES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_+").expect("underscore pattern is valid"));

/// Package kinds, one per SDK folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PkgType {
    Tools,
    PlatformTools,
    Docs,
    BuildTools,
    Platform,
    Addon,
    AddonSystemImage,
    SystemImage,
    Sample,
    Source,
    Extra,
    Ndk,
}

impl PkgType {
    /// Every kind
    pub const ALL: [PkgType; 12] = [
        PkgType::Tools,
        PkgType::PlatformTools,
        PkgType::Docs,
        PkgType::BuildTools,
        PkgType::Platform,
        PkgType::Addon,
        PkgType::AddonSystemImage,
        PkgType::SystemImage,
        PkgType::Sample,
        PkgType::Source,
        PkgType::Extra,
        PkgType::Ndk,
    ];

    /// Folder under the SDK root holding packages of this kind
    pub fn folder_name(&self) -> &'static str {
        match self {
            PkgType::Tools => "tools",
            PkgType::PlatformTools => "platform-tools",
            PkgType::Docs => "docs",
            PkgType::BuildTools => "build-tools",
            PkgType::Platform => "platforms",
            PkgType::Addon => "add-ons",
            PkgType::AddonSystemImage | PkgType::SystemImage => "system-images",
            PkgType::Sample => "samples",
            PkgType::Source => "sources",
            PkgType::Extra => "extras",
            PkgType::Ndk => "ndk-bundle",
        }
    }

    /// Unique kinds hold at most one package, installed directly in the kind folder
    pub fn is_unique(&self) -> bool {
        matches!(
            self,
            PkgType::Tools | PkgType::PlatformTools | PkgType::Docs | PkgType::Ndk
        )
    }

    /// Kinds whose packages produce targets
    pub fn has_target(&self) -> bool {
        matches!(self, PkgType::Platform | PkgType::Addon)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PkgType::Tools => "Tools",
            PkgType::PlatformTools => "Platform-Tools",
            PkgType::Docs => "Documentation",
            PkgType::BuildTools => "Build-Tools",
            PkgType::Platform => "Platform",
            PkgType::Addon => "Add-on",
            PkgType::AddonSystemImage => "Add-on System Image",
            PkgType::SystemImage => "System Image",
            PkgType::Sample => "Samples",
            PkgType::Source => "Sources",
            PkgType::Extra => "Extra",
            PkgType::Ndk => "NDK",
        }
    }
}

impl fmt::Display for PkgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// An id with a human-readable display string. Compared by id only.
#[derive(Debug, Clone, Serialize)]
pub struct IdDisplay {
    id: String,
    display: String,
}

impl IdDisplay {
    pub fn new(id: impl Into<String>, display: impl Into<String>) -> Self {
        Self { id: id.into(), display: display.into() }
    }

    /// Build from an id, prettifying it for display
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        let display = pretty_name(&id);
        Self { id, display }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display(&self) -> &str {
        &self.display
    }
}

impl PartialEq for IdDisplay {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for IdDisplay {}

impl Hash for IdDisplay {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Ord for IdDisplay {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl PartialOrd for IdDisplay {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for IdDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.id, self.display)
    }
}

/// Turn a display string into an id: lowercase, runs of characters outside
/// `[a-z0-9_-]` become `_`, no leading or trailing `_`.
pub fn sanitize_id(display: &str) -> String {
    let lower = display.to_lowercase();
    let replaced = NON_ID_CHARS.replace_all(&lower, "_");
    let collapsed = REPEATED_UNDERSCORES.replace_all(&replaced, "_");
    collapsed.trim_matches('_').to_string()
}

/// Turn an id such as `google_apis` into `Google Apis`
pub fn pretty_name(id: &str) -> String {
    id.split(|c| c == '_' || c == '-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hash string of a platform target, e.g. `android-19`
pub fn platform_hash(version: &AndroidVersion) -> String {
    format!("{}{}", PLATFORM_HASH_PREFIX, version.api_string())
}

/// Hash string of an add-on target, e.g. `Google Inc.:Google APIs:19`
pub fn addon_hash(vendor: &str, name: &str, version: &AndroidVersion) -> String {
    format!("{}:{}:{}", vendor, name, version.api_string())
}

/// Identity of an installed package
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum PkgDesc {
    Tools {
        revision: Revision,
        min_platform_tools_rev: Option<Revision>,
    },
    PlatformTools {
        revision: Revision,
    },
    Docs {
        revision: Revision,
        version: AndroidVersion,
    },
    BuildTools {
        revision: Revision,
    },
    Platform {
        revision: Revision,
        version: AndroidVersion,
        min_tools_rev: Option<Revision>,
    },
    Addon {
        revision: Revision,
        version: AndroidVersion,
        vendor: IdDisplay,
        name: IdDisplay,
    },
    SystemImage {
        revision: Revision,
        version: AndroidVersion,
        tag: IdDisplay,
        abi: String,
    },
    AddonSystemImage {
        revision: Revision,
        version: AndroidVersion,
        vendor: IdDisplay,
        tag: IdDisplay,
        abi: String,
    },
    Sample {
        revision: Revision,
        version: AndroidVersion,
        min_tools_rev: Option<Revision>,
    },
    Source {
        revision: Revision,
        version: AndroidVersion,
    },
    Extra {
        revision: Revision,
        vendor: IdDisplay,
        path: String,
        name_display: String,
        old_paths: Vec<String>,
    },
    Ndk {
        revision: Revision,
    },
}

/// Kind-specific discriminator
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Identity<'a> {
    Unique,
    Version(&'a AndroidVersion),
    Revision(&'a Revision),
    Addon(&'a AndroidVersion, &'a str, &'a str),
    SystemImage(&'a AndroidVersion, &'a str, &'a str),
    AddonSystemImage(&'a AndroidVersion, &'a str, &'a str, &'a str),
    Extra(&'a str, &'a str),
}

impl PkgDesc {
    pub fn kind(&self) -> PkgType {
        match self {
            PkgDesc::Tools { .. } => PkgType::Tools,
            PkgDesc::PlatformTools { .. } => PkgType::PlatformTools,
            PkgDesc::Docs { .. } => PkgType::Docs,
            PkgDesc::BuildTools { .. } => PkgType::BuildTools,
            PkgDesc::Platform { .. } => PkgType::Platform,
            PkgDesc::Addon { .. } => PkgType::Addon,
            PkgDesc::SystemImage { .. } => PkgType::SystemImage,
            PkgDesc::AddonSystemImage { .. } => PkgType::AddonSystemImage,
            PkgDesc::Sample { .. } => PkgType::Sample,
            PkgDesc::Source { .. } => PkgType::Source,
            PkgDesc::Extra { .. } => PkgType::Extra,
            PkgDesc::Ndk { .. } => PkgType::Ndk,
        }
    }

    pub fn revision(&self) -> &Revision {
        match self {
            PkgDesc::Tools { revision, .. }
            | PkgDesc::PlatformTools { revision }
            | PkgDesc::Docs { revision, .. }
            | PkgDesc::BuildTools { revision }
            | PkgDesc::Platform { revision, .. }
            | PkgDesc::Addon { revision, .. }
            | PkgDesc::SystemImage { revision, .. }
            | PkgDesc::AddonSystemImage { revision, .. }
            | PkgDesc::Sample { revision, .. }
            | PkgDesc::Source { revision, .. }
            | PkgDesc::Extra { revision, .. }
            | PkgDesc::Ndk { revision } => revision,
        }
    }

    pub fn version(&self) -> Option<&AndroidVersion> {
        match self {
            PkgDesc::Docs { version, .. }
            | PkgDesc::Platform { version, .. }
            | PkgDesc::Addon { version, .. }
            | PkgDesc::SystemImage { version, .. }
            | PkgDesc::AddonSystemImage { version, .. }
            | PkgDesc::Sample { version, .. }
            | PkgDesc::Source { version, .. } => Some(version),
            _ => None,
        }
    }

    pub fn vendor(&self) -> Option<&IdDisplay> {
        match self {
            PkgDesc::Addon { vendor, .. }
            | PkgDesc::AddonSystemImage { vendor, .. }
            | PkgDesc::Extra { vendor, .. } => Some(vendor),
            _ => None,
        }
    }

    /// Install path for extras, target hash for platforms and add-ons
    pub fn path(&self) -> Option<String> {
        match self {
            PkgDesc::Platform { version, .. } => Some(platform_hash(version)),
            PkgDesc::Addon { version, vendor, name, .. } => {
                Some(addon_hash(vendor.display(), name.display(), version))
            }
            PkgDesc::Extra { path, .. } => Some(path.clone()),
            _ => None,
        }
    }

    /// System image tag
    pub fn tag(&self) -> Option<&IdDisplay> {
        match self {
            PkgDesc::SystemImage { tag, .. } | PkgDesc::AddonSystemImage { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// System image ABI
    pub fn abi(&self) -> Option<&str> {
        match self {
            PkgDesc::SystemImage { abi, .. } | PkgDesc::AddonSystemImage { abi, .. } => Some(abi),
            _ => None,
        }
    }

    pub fn min_tools_rev(&self) -> Option<&Revision> {
        match self {
            PkgDesc::Platform { min_tools_rev, .. } | PkgDesc::Sample { min_tools_rev, .. } => {
                min_tools_rev.as_ref()
            }
            _ => None,
        }
    }

    pub fn min_platform_tools_rev(&self) -> Option<&Revision> {
        match self {
            PkgDesc::Tools { min_platform_tools_rev, .. } => min_platform_tools_rev.as_ref(),
            _ => None,
        }
    }

    /// Human-readable one-line description
    pub fn list_description(&self) -> String {
        match self {
            PkgDesc::Tools { revision, .. } => {
                format!("Android SDK Tools {}", revision.to_short_string())
            }
            PkgDesc::PlatformTools { revision } => {
                format!("Android SDK Platform-Tools {}", revision.to_short_string())
            }
            PkgDesc::Docs { version, .. } => format!("Documentation for Android SDK, {}", version),
            PkgDesc::BuildTools { revision } => {
                format!("Android SDK Build-Tools {}", revision.to_short_string())
            }
            PkgDesc::Platform { version, .. } => {
                format!("Android SDK Platform {}", version.api_string())
            }
            PkgDesc::Addon { version, vendor, name, .. } => {
                format!("{} by {}, {}", name.display(), vendor.display(), version)
            }
            PkgDesc::SystemImage { version, tag, abi, .. } => {
                format!("{} {} System Image, {}", tag.display(), abi, version)
            }
            PkgDesc::AddonSystemImage { version, vendor, tag, abi, .. } => {
                format!("{} {} System Image by {}, {}", tag.display(), abi, vendor.display(), version)
            }
            PkgDesc::Sample { version, .. } => format!("Samples for SDK {}", version),
            PkgDesc::Source { version, .. } => format!("Sources for Android SDK {}", version),
            PkgDesc::Extra { vendor, path, name_display, .. } => {
                if name_display.is_empty() {
                    format!("{} {}", vendor.display(), path)
                } else {
                    name_display.clone()
                }
            }
            PkgDesc::Ndk { revision } => format!("Android NDK {}", revision.to_short_string()),
        }
    }

    fn identity(&self) -> Identity<'_> {
        match self {
            PkgDesc::Tools { .. } | PkgDesc::PlatformTools { .. } | PkgDesc::Ndk { .. } => {
                Identity::Unique
            }
            PkgDesc::Docs { version, .. }
            | PkgDesc::Platform { version, .. }
            | PkgDesc::Sample { version, .. }
            | PkgDesc::Source { version, .. } => Identity::Version(version),
            PkgDesc::BuildTools { revision } => Identity::Revision(revision),
            PkgDesc::Addon { version, vendor, name, .. } => {
                Identity::Addon(version, vendor.id(), name.id())
            }
            PkgDesc::SystemImage { version, tag, abi, .. } => {
                Identity::SystemImage(version, tag.id(), abi)
            }
            PkgDesc::AddonSystemImage { version, vendor, tag, abi, .. } => {
                Identity::AddonSystemImage(version, vendor.id(), tag.id(), abi)
            }
            PkgDesc::Extra { vendor, path, .. } => Identity::Extra(vendor.id(), path),
        }
    }
}

impl PartialEq for PkgDesc {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.identity() == other.identity()
    }
}

impl Eq for PkgDesc {}

impl Hash for PkgDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.identity().hash(state);
    }
}

impl Ord for PkgDesc {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind()
            .cmp(&other.kind())
            .then_with(|| self.identity().cmp(&other.identity()))
    }
}

impl PartialOrd for PkgDesc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PkgDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.list_description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashSet};

    fn platform(api: u32, rev: u32) -> PkgDesc {
        PkgDesc::Platform {
            revision: Revision::new(rev, 0, 0),
            version: AndroidVersion::new(api, None),
            min_tools_rev: None,
        }
    }

    #[test]
    fn test_folder_names() {
        assert_eq!(PkgType::BuildTools.folder_name(), "build-tools");
        assert_eq!(PkgType::Addon.folder_name(), "add-ons");
        assert_eq!(
            PkgType::SystemImage.folder_name(),
            PkgType::AddonSystemImage.folder_name()
        );
        assert_eq!(PkgType::ALL.iter().filter(|k| k.is_unique()).count(), 4);
    }

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("Google Inc."), "google_inc");
        assert_eq!(sanitize_id("  Google APIs (x86) "), "google_apis_x86");
        assert_eq!(sanitize_id("My--Addon__v2"), "my--addon_v2");
        assert_eq!(sanitize_id("Unknown"), "unknown");
    }

    #[test]
    fn test_pretty_name() {
        assert_eq!(pretty_name("google_apis"), "Google Apis");
        assert_eq!(pretty_name("default"), "Default");
        assert_eq!(pretty_name("android-wear"), "Android Wear");
    }

    #[test]
    fn test_id_display_compares_by_id() {
        assert_eq!(IdDisplay::new("google", "Google Inc."), IdDisplay::new("google", "Google"));
        assert_ne!(IdDisplay::new("google", "Google"), IdDisplay::new("intel", "Google"));
    }

    #[test]
    fn test_identity_ignores_revision() {
        assert_eq!(platform(19, 1), platform(19, 2));
        assert_eq!(platform(19, 1).cmp(&platform(19, 2)), Ordering::Equal);
        assert_ne!(platform(19, 1), platform(20, 1));
        assert!(platform(19, 1) < platform(20, 1));

        let mut set = HashSet::new();
        set.insert(platform(19, 1));
        assert!(set.contains(&platform(19, 4)));

        let mut ordered = BTreeSet::new();
        ordered.insert(platform(19, 1));
        assert!(ordered.contains(&platform(19, 2)));
        assert!(!ordered.insert(platform(19, 3)));
    }

    #[test]
    fn test_kinds_never_equal() {
        let sample = PkgDesc::Sample {
            revision: Revision::new(1, 0, 0),
            version: AndroidVersion::new(19, None),
            min_tools_rev: None,
        };
        assert_ne!(sample, platform(19, 1));
        assert!(platform(19, 1) < sample);
    }

    #[test]
    fn test_paths_and_descriptions() {
        assert_eq!(platform(19, 1).path().unwrap(), "android-19");

        let addon = PkgDesc::Addon {
            revision: Revision::new(3, 0, 0),
            version: AndroidVersion::new(19, None),
            vendor: IdDisplay::new("google", "Google Inc."),
            name: IdDisplay::new("google_apis", "Google APIs"),
        };
        assert_eq!(addon.path().unwrap(), "Google Inc.:Google APIs:19");
        assert_eq!(addon.list_description(), "Google APIs by Google Inc., API 19");

        let bt = PkgDesc::BuildTools { revision: Revision::new(19, 1, 0) };
        assert_eq!(bt.list_description(), "Android SDK Build-Tools 19.1");
    }

    #[test]
    fn test_build_tools_identity_is_revision() {
        let a = PkgDesc::BuildTools { revision: Revision::new(19, 1, 0) };
        let b = PkgDesc::BuildTools { revision: Revision::new(20, 0, 0) };
        assert_ne!(a, b);
        assert!(a < b);
    }
}
