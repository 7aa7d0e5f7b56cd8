//! Target resolution
//!
//! Builds the [`AndroidTarget`] of a platform or add-on package from its
//! folder contents plus the related packages the catalog hands in.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::build_tool::BuildToolInfo;
use crate::constants::{
    keys, ABI_ARMEABI, DEFAULT_TAG_ID, EXT_IMAGE, FD_ADDON_LIBS, FD_DATA, FD_FONTS, FD_IMAGES,
    FD_OPTIONAL, FD_RES, FD_SAMPLES, FD_SKINS, FN_BUILD_PROP, FN_FRAMEWORK_AIDL,
    FN_FRAMEWORK_LIBRARY, FN_LAYOUTLIB_JAR, FN_MANIFEST_INI, FN_OPTIONAL_LIBS_JSON, FN_SDK_PROP,
    PLATFORM_VENDOR,
};
use crate::descriptor::{addon_hash, platform_hash, IdDisplay, PkgDesc};
use crate::package::LocalPkgInfo;
use crate::props::{merge, read_properties, Properties};
use crate::target::{
    parse_optional_libraries, parse_skin_folder, AddonDetails, AndroidTarget, LocationType,
    OptionalLibrary, PlatformDetails, SystemImage, TargetDetails,
};
use crate::version::AndroidVersion;

static ADDON_LIBRARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([a-z0-9._-]+\.jar);(.*)$").expect("library pattern is valid"));
static USB_VENDOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^0x[a-f0-9]{4}$").expect("usb vendor pattern is valid"));

/// Packages related to the one being resolved
pub(crate) struct TargetInputs {
    /// System-image packages that may belong to the target
    pub system_images: Vec<Arc<LocalPkgInfo>>,
    pub sample_dir: Option<PathBuf>,
    pub source_dir: Option<PathBuf>,
    pub build_tool: Option<BuildToolInfo>,
    /// Resolved base platform, add-ons only
    pub base: Option<Arc<AndroidTarget>>,
}

/// Resolve a platform package. Non-fatal problems go to `warnings`.
pub(crate) fn platform_target(
    pkg: &LocalPkgInfo,
    inputs: TargetInputs,
    warnings: &mut Vec<String>,
) -> Result<AndroidTarget, String> {
    let dir = pkg.local_dir();

    let mut props = read_properties(&dir.join(FN_BUILD_PROP)).unwrap_or_default();
    merge(&mut props, Some(pkg.source_props().clone()));
    merge(&mut props, read_properties(&dir.join(FN_SDK_PROP)));

    let version = AndroidVersion::from_build_properties(&props)
        .map_err(|e| format!("invalid {}: {}", FN_BUILD_PROP, e))?;

    let version_name = props
        .get(keys::PLATFORM_VERSION)
        .or_else(|| props.get(keys::BUILD_VERSION_RELEASE))
        .cloned()
        .unwrap_or_else(|| version.api_string());

    for required in [FN_FRAMEWORK_LIBRARY, FN_FRAMEWORK_AIDL] {
        if !dir.join(required).is_file() {
            warnings.push(format!("platform is missing {}", required));
        }
    }

    let system_images = collect_system_images(
        dir,
        inputs.system_images.iter().filter_map(|p| p.system_image()),
        IdDisplay::from_id(DEFAULT_TAG_ID),
        None,
    );

    let mut skins = parse_skin_folder(&dir.join(FD_SKINS));
    for image in &system_images {
        skins.extend(image.skins().iter().cloned());
    }
    skins.sort();
    skins.dedup();

    let default_skin = match props.get(keys::SDK_DEFAULT_SKIN) {
        Some(name) => find_skin(&skins, name),
        None if skins.len() == 1 => skins.first().cloned(),
        None => None,
    };

    let description = props
        .get(keys::PKG_DESC)
        .cloned()
        .unwrap_or_else(|| format!("Android SDK Platform {}", version_name));

    let details = PlatformDetails {
        layoutlib_api: props.get(keys::LAYOUTLIB_API).and_then(|v| v.trim().parse().ok()),
        layoutlib_revision: props.get(keys::LAYOUTLIB_REV).and_then(|v| v.trim().parse().ok()),
        min_tools_rev: pkg.desc().min_tools_rev().copied(),
        properties: props,
    };

    Ok(AndroidTarget {
        location: dir.to_path_buf(),
        hash: platform_hash(&version),
        name: format!("Android {}", version_name),
        vendor: PLATFORM_VENDOR.to_string(),
        description,
        version,
        version_name,
        revision: pkg.desc().revision().major(),
        system_images,
        skins,
        default_skin,
        optional_libraries: parse_optional_libraries(
            &dir.join(FD_OPTIONAL).join(FN_OPTIONAL_LIBS_JSON),
        ),
        sample_path: inputs.sample_dir,
        source_path: inputs.source_dir,
        build_tool: inputs.build_tool,
        details: TargetDetails::Platform(details),
    })
}

/// Resolve an add-on package on top of its base platform
pub(crate) fn addon_target(
    pkg: &LocalPkgInfo,
    inputs: TargetInputs,
    warnings: &mut Vec<String>,
) -> Result<AndroidTarget, String> {
    let dir = pkg.local_dir();
    let PkgDesc::Addon { version, vendor: vendor_id, name: name_id, .. } = pkg.desc() else {
        return Err("not an add-on package".to_string());
    };

    let ini = read_properties(&dir.join(FN_MANIFEST_INI))
        .ok_or_else(|| format!("missing or empty {}", FN_MANIFEST_INI))?;
    let required = |key: &str| {
        ini.get(key)
            .cloned()
            .ok_or_else(|| format!("{} is missing '{}'", FN_MANIFEST_INI, key))
    };
    let name = required(keys::ADDON_INI_NAME)?;
    let vendor = required(keys::ADDON_INI_VENDOR)?;
    required(keys::ADDON_INI_API)?;

    let base = inputs.base.ok_or_else(|| {
        format!("Unable to find base platform with API level '{}'", version.api_string())
    })?;

    let revision = match ini
        .get(keys::ADDON_INI_REVISION)
        .or_else(|| ini.get(keys::ADDON_INI_REVISION_OLD))
    {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("{} has invalid revision {:?}", FN_MANIFEST_INI, raw))?,
        None => 1,
    };

    let description = ini
        .get(keys::ADDON_INI_DESCRIPTION)
        .or_else(|| pkg.source_props().get(keys::PKG_DESC))
        .cloned()
        .unwrap_or_else(|| name.clone());

    let optional_libraries = addon_libraries(dir, &ini, warnings);
    let usb_vendor_id = ini
        .get(keys::ADDON_INI_USB_VENDOR)
        .and_then(|raw| parse_usb_vendor(raw, warnings));

    let system_images = collect_system_images(
        dir,
        inputs
            .system_images
            .iter()
            .filter(|p| {
                p.desc().vendor() == Some(vendor_id)
                    && p.desc().tag().map(IdDisplay::id) == Some(name_id.id())
            })
            .filter_map(|p| p.system_image()),
        name_id.clone(),
        Some(vendor_id.clone()),
    );

    // Add-on skins replace base skins of the same name
    let own_skins = parse_skin_folder(&dir.join(FD_SKINS));
    let mut merged: BTreeMap<String, PathBuf> = BTreeMap::new();
    let image_skins = system_images.iter().flat_map(|img| img.skins().iter());
    for skin in base.skins().iter().chain(own_skins.iter()).chain(image_skins) {
        merged.insert(skin_key(skin), skin.clone());
    }
    let skins: Vec<PathBuf> = merged.into_values().collect();

    let default_skin = match ini.get(keys::ADDON_INI_SKIN) {
        Some(skin_name) => match find_skin(&skins, skin_name) {
            Some(skin) => Some(skin),
            None => {
                warnings.push(format!("default skin '{}' not found", skin_name));
                base.default_skin().map(Path::to_path_buf)
            }
        },
        None if own_skins.len() == 1 => own_skins.first().cloned(),
        None => base.default_skin().map(Path::to_path_buf),
    };

    let data = dir.join(FD_DATA);
    let details = AddonDetails {
        base_hash: base.hash_string().to_string(),
        usb_vendor_id,
        has_rendering_library: data.join(FN_LAYOUTLIB_JAR).is_file(),
        has_rendering_resources: data.join(FD_RES).is_dir() && data.join(FD_FONTS).is_dir(),
    };

    let samples = dir.join(FD_SAMPLES);
    Ok(AndroidTarget {
        location: dir.to_path_buf(),
        hash: pkg
            .desc()
            .path()
            .unwrap_or_else(|| addon_hash(&vendor, &name, version)),
        name,
        vendor,
        description,
        version: version.clone(),
        version_name: base.version_name().to_string(),
        revision,
        system_images,
        skins,
        default_skin,
        optional_libraries,
        sample_path: samples.is_dir().then_some(samples),
        source_path: None,
        build_tool: base.build_tool().cloned(),
        details: TargetDetails::Addon(details),
    })
}

/// Images from packages first, then `images/<abi>` subfolders, then a
/// legacy flat `images/` folder. The first image per (tag, abi) wins.
fn collect_system_images<'a>(
    dir: &Path,
    packaged: impl Iterator<Item = &'a SystemImage>,
    folder_tag: IdDisplay,
    vendor: Option<IdDisplay>,
) -> Vec<SystemImage> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut images = Vec::new();

    for image in packaged {
        if seen.insert((image.tag().id().to_string(), image.abi().to_string())) {
            images.push(image.clone());
        }
    }

    let images_dir = dir.join(FD_IMAGES);
    let subdirs: Vec<PathBuf> = match std::fs::read_dir(&images_dir) {
        Ok(entries) => {
            let mut dirs: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_dir())
                .collect();
            dirs.sort();
            dirs
        }
        Err(_) => Vec::new(),
    };

    for abi_dir in &subdirs {
        let Some(abi) = abi_dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if seen.insert((folder_tag.id().to_string(), abi.clone())) {
            images.push(SystemImage::new(
                abi_dir.clone(),
                LocationType::InImagesSubfolder,
                folder_tag.clone(),
                vendor.clone(),
                abi,
                parse_skin_folder(&abi_dir.join(FD_SKINS)),
            ));
        }
    }

    if subdirs.is_empty()
        && has_legacy_images(&images_dir)
        && seen.insert((folder_tag.id().to_string(), ABI_ARMEABI.to_string()))
    {
        images.push(SystemImage::new(
            images_dir,
            LocationType::InLegacyFolder,
            folder_tag,
            vendor,
            ABI_ARMEABI,
            Vec::new(),
        ));
    }

    images.sort();
    images
}

fn has_legacy_images(images_dir: &Path) -> bool {
    std::fs::read_dir(images_dir)
        .map(|entries| {
            entries.filter_map(|e| e.ok()).any(|e| {
                let path = e.path();
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(EXT_IMAGE))
            })
        })
        .unwrap_or(false)
}

/// `libraries=a;b` with one `a=<jar>;<description>` entry per library
fn addon_libraries(dir: &Path, ini: &Properties, warnings: &mut Vec<String>) -> Vec<OptionalLibrary> {
    let Some(list) = ini.get(keys::ADDON_INI_LIBRARIES) else {
        return Vec::new();
    };
    let mut libraries = Vec::new();
    for name in list.split(';').map(str::trim).filter(|n| !n.is_empty()) {
        let entry = ini.get(name).and_then(|value| ADDON_LIBRARY.captures(value.trim()));
        match entry {
            Some(caps) => libraries.push(OptionalLibrary {
                name: name.to_string(),
                jar: dir.join(FD_ADDON_LIBS).join(&caps[1]),
                description: caps[2].trim().to_string(),
                manifest_entry_required: true,
            }),
            None => warnings.push(format!("ignoring malformed library entry '{}'", name)),
        }
    }
    libraries
}

fn parse_usb_vendor(raw: &str, warnings: &mut Vec<String>) -> Option<u16> {
    let raw = raw.trim();
    if !USB_VENDOR.is_match(raw) {
        warnings.push(format!("ignoring malformed usb-vendor {:?}", raw));
        return None;
    }
    u16::from_str_radix(&raw[2..], 16).ok()
}

fn skin_key(skin: &Path) -> String {
    skin.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn find_skin(skins: &[PathBuf], name: &str) -> Option<PathBuf> {
    let wanted = name.trim().to_lowercase();
    skins.iter().find(|s| skin_key(s) == wanted).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::Revision;
    use crate::testutil::SdkFixture;

    fn platform_pkg(dir: &Path, api: u32) -> LocalPkgInfo {
        let props = read_properties(&dir.join("source.properties")).unwrap();
        LocalPkgInfo::new(
            PkgDesc::Platform {
                revision: Revision::new(2, 0, 0),
                version: AndroidVersion::new(api, None),
                min_tools_rev: None,
            },
            dir,
            props,
        )
    }

    fn no_inputs() -> TargetInputs {
        TargetInputs {
            system_images: Vec::new(),
            sample_dir: None,
            source_dir: None,
            build_tool: None,
            base: None,
        }
    }

    #[test]
    fn test_platform_basics() {
        let sdk = SdkFixture::new();
        let dir = sdk.platform("android-19", 19, "2");
        sdk.skin("platforms/android-19/skins", "WVGA800");
        sdk.write(
            "platforms/android-19/optional/optional.json",
            r#"[{"name": "org.apache.http.legacy", "jar": "org.apache.http.legacy.jar", "manifest": false}]"#,
        );

        let mut warnings = Vec::new();
        let target = platform_target(&platform_pkg(&dir, 19), no_inputs(), &mut warnings).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(target.hash_string(), "android-19");
        assert_eq!(target.name(), "Android 4.4");
        assert_eq!(target.revision(), 2);
        assert_eq!(target.skins().len(), 1);
        assert_eq!(target.default_skin(), Some(target.skins()[0].as_path()));
        assert_eq!(target.optional_libraries().len(), 1);
        assert!(target.is_platform());
    }

    #[test]
    fn test_platform_requires_build_prop() {
        let sdk = SdkFixture::new();
        let dir = sdk.source_props(
            "platforms/android-19",
            &[("Pkg.Revision", "2"), ("AndroidVersion.ApiLevel", "19")],
        );

        let mut warnings = Vec::new();
        let err = platform_target(&platform_pkg(&dir, 19), no_inputs(), &mut warnings).unwrap_err();
        assert!(err.contains("build.prop"));
    }

    #[test]
    fn test_platform_missing_framework_is_warning() {
        let sdk = SdkFixture::new();
        let dir = sdk.source_props("platforms/android-19", &[("Pkg.Revision", "2")]);
        sdk.write("platforms/android-19/build.prop", "ro.build.version.sdk=19\n");

        let mut warnings = Vec::new();
        let target = platform_target(&platform_pkg(&dir, 19), no_inputs(), &mut warnings).unwrap();
        assert_eq!(target.version().api_level(), 19);
        assert_eq!(target.version_name(), "19");
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_image_precedence() {
        let sdk = SdkFixture::new();
        let dir = sdk.platform("android-19", 19, "2");
        sdk.write("platforms/android-19/images/x86/system.img", "");
        sdk.write("platforms/android-19/images/armeabi-v7a/system.img", "");
        let packaged_x86 = sdk.system_image(19, "default", "x86", None);

        let packaged = SystemImage::new(
            &packaged_x86,
            LocationType::InSystemImage,
            IdDisplay::from_id("default"),
            None,
            "x86",
            Vec::new(),
        );
        let images = collect_system_images(
            &dir,
            std::iter::once(&packaged),
            IdDisplay::from_id(DEFAULT_TAG_ID),
            None,
        );

        assert_eq!(images.len(), 2);
        let x86 = images.iter().find(|i| i.abi() == "x86").unwrap();
        assert_eq!(x86.location_type(), LocationType::InSystemImage);
        let arm = images.iter().find(|i| i.abi() == "armeabi-v7a").unwrap();
        assert_eq!(arm.location_type(), LocationType::InImagesSubfolder);
    }

    #[test]
    fn test_legacy_flat_images() {
        let sdk = SdkFixture::new();
        let dir = sdk.platform("android-8", 8, "3");
        sdk.write("platforms/android-8/images/system.img", "");
        sdk.write("platforms/android-8/images/ramdisk.IMG", "");

        let images = collect_system_images(
            &dir,
            std::iter::empty(),
            IdDisplay::from_id(DEFAULT_TAG_ID),
            None,
        );
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].abi(), ABI_ARMEABI);
        assert_eq!(images[0].location_type(), LocationType::InLegacyFolder);
    }

    #[test]
    fn test_addon_libraries_and_usb() {
        let dir = Path::new("/sdk/add-ons/addon-google_apis-google-19");
        let ini = crate::props::parse_properties(
            "libraries=com.google.android.maps;com.android.future.usb.accessory;broken\n\
             com.google.android.maps=maps.jar;API for Google Maps\n\
             com.android.future.usb.accessory=usb.jar;USB Open Accessory Library\n\
             broken=not-a-jar\n",
        );
        let mut warnings = Vec::new();
        let libs = addon_libraries(dir, &ini, &mut warnings);
        assert_eq!(libs.len(), 2);
        assert_eq!(libs[0].jar, dir.join("libs").join("maps.jar"));
        assert_eq!(libs[0].description, "API for Google Maps");
        assert_eq!(warnings.len(), 1);

        assert_eq!(parse_usb_vendor("0x18D1", &mut warnings), Some(0x18d1));
        assert_eq!(parse_usb_vendor("18d1", &mut warnings), None);
        assert_eq!(warnings.len(), 2);
    }
}
