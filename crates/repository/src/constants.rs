//! SDK layout constants
//!
//! File names, folder names and property keys shared by the scanners
//! and target resolution.

/// Package manifest present in every installed package folder
pub const FN_SOURCE_PROP: &str = "source.properties";
/// Platform build properties
pub const FN_BUILD_PROP: &str = "build.prop";
/// Platform SDK properties
pub const FN_SDK_PROP: &str = "sdk.properties";
/// Add-on manifest
pub const FN_MANIFEST_INI: &str = "manifest.ini";
pub const FN_FRAMEWORK_LIBRARY: &str = "android.jar";
pub const FN_FRAMEWORK_AIDL: &str = "framework.aidl";
pub const FN_LAYOUTLIB_JAR: &str = "layoutlib.jar";
pub const FN_DOC_INDEX: &str = "index.html";
pub const FN_OPTIONAL_LIBS_JSON: &str = "optional.json";
/// Marker file for a skin folder
pub const FN_SKIN_LAYOUT: &str = "layout";
pub const FN_DX_JAR: &str = "dx.jar";

pub const FD_IMAGES: &str = "images";
pub const FD_SKINS: &str = "skins";
pub const FD_DATA: &str = "data";
pub const FD_RES: &str = "res";
pub const FD_FONTS: &str = "fonts";
pub const FD_LIB: &str = "lib";
pub const FD_OPTIONAL: &str = "optional";
pub const FD_RENDERSCRIPT: &str = "renderscript";
pub const FD_INCLUDE: &str = "include";
pub const FD_CLANG_INCLUDE: &str = "clang-include";
/// Add-on library jars
pub const FD_ADDON_LIBS: &str = "libs";
pub const FD_SAMPLES: &str = "samples";

/// Extension of legacy flat system image files
pub const EXT_IMAGE: &str = "img";

/// Tag assigned to images without an explicit tag
pub const DEFAULT_TAG_ID: &str = "default";
/// ABI assumed for the legacy flat `images/` layout
pub const ABI_ARMEABI: &str = "armeabi";

/// Platform-tools revisions below this still bundle the build tools
pub const MIN_BUILD_TOOLS_SPLIT_MAJOR: u32 = 17;

/// Vendor of every platform target
pub const PLATFORM_VENDOR: &str = "Android Open Source Project";

/// Vendor prefix used in platform hash strings
pub const PLATFORM_HASH_PREFIX: &str = "android-";

/// Keys read from `source.properties`
pub mod keys {
    pub const PKG_REVISION: &str = "Pkg.Revision";
    pub const PKG_DESC: &str = "Pkg.Desc";
    pub const VERSION_API_LEVEL: &str = "AndroidVersion.ApiLevel";
    pub const VERSION_CODENAME: &str = "AndroidVersion.CodeName";
    pub const PLATFORM_VERSION: &str = "Platform.Version";
    pub const MIN_TOOLS_REV: &str = "Platform.MinToolsRev";
    pub const MIN_PLATFORM_TOOLS_REV: &str = "Platform.MinPlatformToolsRev";
    pub const ADDON_NAME: &str = "Addon.Name";
    pub const ADDON_NAME_ID: &str = "Addon.NameId";
    pub const ADDON_NAME_DISPLAY: &str = "Addon.NameDisplay";
    pub const ADDON_VENDOR: &str = "Addon.Vendor";
    pub const ADDON_VENDOR_ID: &str = "Addon.VendorId";
    pub const ADDON_VENDOR_DISPLAY: &str = "Addon.VendorDisplay";
    pub const SYS_IMG_ABI: &str = "SystemImage.Abi";
    pub const SYS_IMG_TAG_ID: &str = "SystemImage.TagId";
    pub const SYS_IMG_TAG_DISPLAY: &str = "SystemImage.TagDisplay";
    pub const EXTRA_VENDOR_DISPLAY: &str = "Extra.VendorDisplay";
    pub const EXTRA_NAME_DISPLAY: &str = "Extra.NameDisplay";
    pub const EXTRA_OLD_PATHS: &str = "Extra.OldPaths";
    pub const LAYOUTLIB_API: &str = "Layoutlib.Api";
    pub const LAYOUTLIB_REV: &str = "Layoutlib.Revision";

    /// Keys read from `build.prop`
    pub const BUILD_VERSION_SDK: &str = "ro.build.version.sdk";
    pub const BUILD_VERSION_CODENAME: &str = "ro.build.version.codename";
    pub const BUILD_VERSION_RELEASE: &str = "ro.build.version.release";

    /// Key read from `sdk.properties`
    pub const SDK_DEFAULT_SKIN: &str = "sdk.skin.default";

    /// Keys read from an add-on `manifest.ini`
    pub const ADDON_INI_NAME: &str = "name";
    pub const ADDON_INI_VENDOR: &str = "vendor";
    pub const ADDON_INI_API: &str = "api";
    pub const ADDON_INI_DESCRIPTION: &str = "description";
    pub const ADDON_INI_LIBRARIES: &str = "libraries";
    pub const ADDON_INI_SKIN: &str = "skin";
    pub const ADDON_INI_USB_VENDOR: &str = "usb-vendor";
    pub const ADDON_INI_REVISION: &str = "revision";
    pub const ADDON_INI_REVISION_OLD: &str = "version";
}

/// Name of an executable for the host OS
pub fn exe_name(base: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", base)
    } else {
        base.to_string()
    }
}

/// Name of a launcher script for the host OS
pub fn script_name(base: &str) -> String {
    if cfg!(windows) {
        format!("{}.bat", base)
    } else {
        base.to_string()
    }
}
