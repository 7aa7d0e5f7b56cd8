//! Package scanners
//!
//! One scan function per package kind. Each walks the kind's folder,
//! parses `source.properties`, validates the keys the kind requires and
//! collects one [`LocalPkgInfo`] per valid folder. Invalid folders are
//! skipped with a [`Diagnostic`]; a scan never fails as a whole.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::constants::{
    exe_name, keys, script_name, DEFAULT_TAG_ID, FD_SKINS, FN_BUILD_PROP, FN_DOC_INDEX,
    FN_SOURCE_PROP,
};
use crate::descriptor::{pretty_name, sanitize_id, IdDisplay, PkgDesc, PkgType};
use crate::fingerprint::DirFingerprint;
use crate::package::LocalPkgInfo;
use crate::props::{read_properties, Properties};
use crate::revision::Revision;
use crate::target::{parse_skin_folder, LocationType, SystemImage};
use crate::version::AndroidVersion;

/// Why a folder was skipped or a package could not be used
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: PkgType,
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.path.display(), self.message)
    }
}

/// Folders already visited for one kind
pub(crate) type VisitedDirs = HashMap<PathBuf, DirFingerprint>;

type ScanFn = fn(&mut Scan<'_>, &Path);

/// Scan function for each kind
fn scan_fn(kind: PkgType) -> ScanFn {
    match kind {
        PkgType::Tools => scan_tools,
        PkgType::PlatformTools => scan_platform_tools,
        PkgType::Docs => scan_docs,
        PkgType::Ndk => scan_ndk,
        PkgType::BuildTools => scan_build_tools,
        PkgType::Platform => scan_platforms,
        PkgType::Addon => scan_addons,
        PkgType::SystemImage => scan_system_images,
        PkgType::AddonSystemImage => scan_addon_system_images,
        PkgType::Sample => scan_samples,
        PkgType::Source => scan_sources,
        PkgType::Extra => scan_extras,
    }
}

/// Scan the folder of `kind` under `sdk_root`
pub(crate) fn scan_kind(
    kind: PkgType,
    sdk_root: &Path,
    visited: &mut VisitedDirs,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<LocalPkgInfo> {
    let folder = sdk_root.join(kind.folder_name());
    let mut scan = Scan {
        kind,
        visited,
        diagnostics,
        found: Vec::new(),
    };
    scan_fn(kind)(&mut scan, &folder);
    debug!("Scanned {:?}: {} package(s)", folder, scan.found.len());
    scan.found
}

/// State of one scan pass
struct Scan<'a> {
    kind: PkgType,
    visited: &'a mut VisitedDirs,
    diagnostics: &'a mut Vec<Diagnostic>,
    found: Vec<LocalPkgInfo>,
}

impl Scan<'_> {
    /// Whether `dir` needs loading. Marks it visited either way.
    fn should_visit(&mut self, dir: &Path) -> bool {
        if !dir.is_dir() {
            return false;
        }
        if let Some(fingerprint) = self.visited.get(dir) {
            if !fingerprint.has_changed(dir) {
                return false;
            }
        }
        self.visited
            .insert(dir.to_path_buf(), DirFingerprint::capture(dir));
        true
    }

    fn finish(&mut self, dir: &Path, loaded: Result<LocalPkgInfo, String>) {
        match loaded {
            Ok(pkg) => self.collect(pkg),
            Err(message) => self.skip(dir, message),
        }
    }

    fn skip(&mut self, dir: &Path, message: String) {
        warn!("Skipping {:?}: {}", dir, message);
        self.diagnostics.push(Diagnostic {
            kind: self.kind,
            path: dir.to_path_buf(),
            message,
        });
    }

    /// Keep the first package of each identity
    fn collect(&mut self, pkg: LocalPkgInfo) {
        let first = self
            .found
            .iter()
            .find(|existing| existing.desc() == pkg.desc())
            .map(|existing| existing.local_dir().to_path_buf());
        match first {
            Some(first) => {
                let message = format!(
                    "duplicate of {} already loaded from {:?}",
                    pkg.list_description(),
                    first
                );
                self.skip(pkg.local_dir(), message);
            }
            None => self.found.push(pkg),
        }
    }
}

/// Subfolders of `dir`, sorted by name
fn list_subdirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    dirs
}

fn load_manifest(dir: &Path) -> Result<Properties, String> {
    read_properties(&dir.join(FN_SOURCE_PROP))
        .ok_or_else(|| format!("missing or empty {}", FN_SOURCE_PROP))
}

fn require_revision(props: &Properties) -> Result<Revision, String> {
    let raw = props
        .get(keys::PKG_REVISION)
        .ok_or_else(|| format!("missing {}", keys::PKG_REVISION))?;
    raw.parse::<Revision>().map_err(|e| e.to_string())
}

fn optional_revision(props: &Properties, key: &str) -> Option<Revision> {
    props.get(key).and_then(|raw| raw.parse().ok())
}

fn require_version(props: &Properties) -> Result<AndroidVersion, String> {
    AndroidVersion::from_properties(props).map_err(|e| e.to_string())
}

fn scan_unique(scan: &mut Scan<'_>, dir: &Path, build: fn(&Path, Properties) -> Result<LocalPkgInfo, String>) {
    if !scan.should_visit(dir) {
        return;
    }
    let loaded = load_manifest(dir).and_then(|props| build(dir, props));
    scan.finish(dir, loaded);
}

fn scan_tools(scan: &mut Scan<'_>, dir: &Path) {
    scan_unique(scan, dir, |dir, props| {
        let desc = PkgDesc::Tools {
            revision: require_revision(&props)?,
            min_platform_tools_rev: optional_revision(&props, keys::MIN_PLATFORM_TOOLS_REV),
        };
        let mut pkg = LocalPkgInfo::new(desc, dir, props);
        for tool in [script_name("android"), exe_name("emulator")] {
            if !dir.join(&tool).is_file() {
                pkg = pkg.with_load_error(format!("missing tool {}", tool));
            }
        }
        Ok(pkg)
    });
}

fn scan_platform_tools(scan: &mut Scan<'_>, dir: &Path) {
    scan_unique(scan, dir, |dir, props| {
        let desc = PkgDesc::PlatformTools {
            revision: require_revision(&props)?,
        };
        Ok(LocalPkgInfo::new(desc, dir, props))
    });
}

fn scan_docs(scan: &mut Scan<'_>, dir: &Path) {
    scan_unique(scan, dir, |dir, props| {
        let desc = PkgDesc::Docs {
            revision: require_revision(&props)?,
            version: require_version(&props)?,
        };
        let mut pkg = LocalPkgInfo::new(desc, dir, props);
        if !dir.join(FN_DOC_INDEX).is_file() {
            pkg = pkg.with_load_error(format!("missing {}", FN_DOC_INDEX));
        }
        Ok(pkg)
    });
}

fn scan_ndk(scan: &mut Scan<'_>, dir: &Path) {
    scan_unique(scan, dir, |dir, props| {
        let desc = PkgDesc::Ndk {
            revision: require_revision(&props)?,
        };
        Ok(LocalPkgInfo::new(desc, dir, props))
    });
}

fn scan_build_tools(scan: &mut Scan<'_>, folder: &Path) {
    for dir in list_subdirs(folder) {
        if !scan.should_visit(&dir) {
            continue;
        }
        let loaded = load_manifest(&dir).and_then(|props| {
            let desc = PkgDesc::BuildTools {
                revision: require_revision(&props)?,
            };
            Ok(LocalPkgInfo::new(desc, &dir, props))
        });
        scan.finish(&dir, loaded);
    }
}

fn scan_platforms(scan: &mut Scan<'_>, folder: &Path) {
    for dir in list_subdirs(folder) {
        if !scan.should_visit(&dir) {
            continue;
        }
        let loaded = load_manifest(&dir).and_then(|props| {
            let revision = require_revision(&props)?;
            let version = match AndroidVersion::from_properties(&props) {
                Ok(version) => version,
                Err(e) => read_properties(&dir.join(FN_BUILD_PROP))
                    .and_then(|build| AndroidVersion::from_build_properties(&build).ok())
                    .ok_or_else(|| e.to_string())?,
            };
            let desc = PkgDesc::Platform {
                revision,
                version,
                min_tools_rev: optional_revision(&props, keys::MIN_TOOLS_REV),
            };
            Ok(LocalPkgInfo::new(desc, &dir, props))
        });
        scan.finish(&dir, loaded);
    }
}

/// Id and display read from `<id_key>`/`<display_key>`, or derived from
/// the free-form `<name_key>` when no id is given
fn id_display(props: &Properties, id_key: &str, display_key: &str, name_key: &str) -> IdDisplay {
    match props.get(id_key) {
        Some(id) => {
            let display = props
                .get(display_key)
                .cloned()
                .unwrap_or_else(|| pretty_name(id));
            IdDisplay::new(id.clone(), display)
        }
        None => {
            let name = props.get(name_key).map(String::as_str).unwrap_or("Unknown");
            let display = props.get(display_key).map(String::as_str).unwrap_or(name);
            IdDisplay::new(sanitize_id(name), display)
        }
    }
}

fn scan_addons(scan: &mut Scan<'_>, folder: &Path) {
    for dir in list_subdirs(folder) {
        if !scan.should_visit(&dir) {
            continue;
        }
        let loaded = load_manifest(&dir).and_then(|props| {
            let desc = PkgDesc::Addon {
                revision: require_revision(&props)?,
                version: require_version(&props)?,
                vendor: id_display(
                    &props,
                    keys::ADDON_VENDOR_ID,
                    keys::ADDON_VENDOR_DISPLAY,
                    keys::ADDON_VENDOR,
                ),
                name: id_display(
                    &props,
                    keys::ADDON_NAME_ID,
                    keys::ADDON_NAME_DISPLAY,
                    keys::ADDON_NAME,
                ),
            };
            Ok(LocalPkgInfo::new(desc, &dir, props))
        });
        scan.finish(&dir, loaded);
    }
}

fn scan_system_images(scan: &mut Scan<'_>, folder: &Path) {
    scan_images(scan, folder, false);
}

fn scan_addon_system_images(scan: &mut Scan<'_>, folder: &Path) {
    scan_images(scan, folder, true);
}

/// Walk `system-images/<target>/[<tag>/]<abi>`, keeping either the
/// add-on images (with `Addon.VendorId`) or the plain ones. Every level
/// is fingerprinted so edits to an ABI manifest are noticed.
fn scan_images(scan: &mut Scan<'_>, folder: &Path, addons: bool) {
    for target_dir in list_subdirs(folder) {
        if !scan.should_visit(&target_dir) {
            continue;
        }

        let mut abi_dirs = Vec::new();
        for dir in list_subdirs(&target_dir) {
            if !scan.should_visit(&dir) {
                continue;
            }
            if dir.join(FN_SOURCE_PROP).is_file() {
                abi_dirs.push(dir);
                continue;
            }
            for abi_dir in list_subdirs(&dir) {
                if abi_dir.join(FN_SOURCE_PROP).is_file() && scan.should_visit(&abi_dir) {
                    abi_dirs.push(abi_dir);
                }
            }
        }

        for abi_dir in abi_dirs {
            let props = match load_manifest(&abi_dir) {
                Ok(props) => props,
                // Neither kind can claim it; report it once
                Err(message) if !addons => {
                    scan.skip(&abi_dir, message);
                    continue;
                }
                Err(_) => continue,
            };
            let is_addon = props.contains_key(keys::ADDON_VENDOR_ID);
            if is_addon != addons {
                continue;
            }
            let loaded = load_system_image(&abi_dir, props);
            scan.finish(&abi_dir, loaded);
        }
    }
}

fn load_system_image(abi_dir: &Path, props: Properties) -> Result<LocalPkgInfo, String> {
    let revision = require_revision(&props)?;
    let version = require_version(&props)?;

    let tag_id = props
        .get(keys::SYS_IMG_TAG_ID)
        .cloned()
        .unwrap_or_else(|| DEFAULT_TAG_ID.to_string());
    let tag_display = props
        .get(keys::SYS_IMG_TAG_DISPLAY)
        .cloned()
        .unwrap_or_else(|| pretty_name(&tag_id));
    let tag = IdDisplay::new(tag_id, tag_display);

    let abi = match props.get(keys::SYS_IMG_ABI) {
        Some(abi) => abi.clone(),
        None => abi_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| "cannot determine ABI".to_string())?,
    };

    let vendor = props.get(keys::ADDON_VENDOR_ID).map(|id| {
        let display = props
            .get(keys::ADDON_VENDOR_DISPLAY)
            .cloned()
            .unwrap_or_else(|| id.clone());
        IdDisplay::new(id.clone(), display)
    });

    let image = SystemImage::new(
        abi_dir,
        LocationType::InSystemImage,
        tag.clone(),
        vendor.clone(),
        abi.clone(),
        parse_skin_folder(&abi_dir.join(FD_SKINS)),
    );

    let desc = match vendor {
        Some(vendor) => PkgDesc::AddonSystemImage { revision, version, vendor, tag, abi },
        None => PkgDesc::SystemImage { revision, version, tag, abi },
    };
    Ok(LocalPkgInfo::new(desc, abi_dir, props).with_system_image(image))
}

fn scan_samples(scan: &mut Scan<'_>, folder: &Path) {
    for dir in list_subdirs(folder) {
        if !scan.should_visit(&dir) {
            continue;
        }
        let loaded = load_manifest(&dir).and_then(|props| {
            let desc = PkgDesc::Sample {
                revision: require_revision(&props)?,
                version: require_version(&props)?,
                min_tools_rev: optional_revision(&props, keys::MIN_TOOLS_REV),
            };
            Ok(LocalPkgInfo::new(desc, &dir, props))
        });
        scan.finish(&dir, loaded);
    }
}

fn scan_sources(scan: &mut Scan<'_>, folder: &Path) {
    for dir in list_subdirs(folder) {
        if !scan.should_visit(&dir) {
            continue;
        }
        let loaded = load_manifest(&dir).and_then(|props| {
            let desc = PkgDesc::Source {
                revision: require_revision(&props)?,
                version: require_version(&props)?,
            };
            Ok(LocalPkgInfo::new(desc, &dir, props))
        });
        scan.finish(&dir, loaded);
    }
}

/// `extras/<vendor>/<path>`
fn scan_extras(scan: &mut Scan<'_>, folder: &Path) {
    for vendor_dir in list_subdirs(folder) {
        let Some(vendor_id) = vendor_dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        for dir in list_subdirs(&vendor_dir) {
            if !scan.should_visit(&dir) {
                continue;
            }
            let loaded = load_manifest(&dir).and_then(|props| {
                let path = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| "cannot determine extra path".to_string())?;
                let vendor_display = props
                    .get(keys::EXTRA_VENDOR_DISPLAY)
                    .cloned()
                    .unwrap_or_else(|| vendor_id.clone());
                let name_display = props
                    .get(keys::EXTRA_NAME_DISPLAY)
                    .cloned()
                    .unwrap_or_else(|| pretty_name(&path));
                let old_paths = props
                    .get(keys::EXTRA_OLD_PATHS)
                    .map(|raw| {
                        raw.split(';')
                            .map(str::trim)
                            .filter(|p| !p.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                let desc = PkgDesc::Extra {
                    revision: require_revision(&props)?,
                    vendor: IdDisplay::new(vendor_id.clone(), vendor_display),
                    path,
                    name_display,
                    old_paths,
                };
                Ok(LocalPkgInfo::new(desc, &dir, props))
            });
            scan.finish(&dir, loaded);
        }
    }
}
