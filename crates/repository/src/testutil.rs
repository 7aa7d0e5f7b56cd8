//! Throwaway SDK trees for tests

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::constants::{
    FN_BUILD_PROP, FN_FRAMEWORK_AIDL, FN_FRAMEWORK_LIBRARY, FN_MANIFEST_INI, FN_SKIN_LAYOUT,
    FN_SOURCE_PROP,
};

pub(crate) struct SdkFixture {
    dir: TempDir,
}

impl SdkFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Write `contents` to `rel`, creating parent folders
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Write `source.properties` in `rel_dir`
    pub fn source_props(&self, rel_dir: &str, entries: &[(&str, &str)]) -> PathBuf {
        let text: String = entries
            .iter()
            .map(|(k, v)| format!("{}={}\n", k, v))
            .collect();
        self.write(&format!("{}/{}", rel_dir, FN_SOURCE_PROP), &text);
        self.path(rel_dir)
    }

    /// A complete platform folder `platforms/<folder>`
    pub fn platform(&self, folder: &str, api: u32, revision: &str) -> PathBuf {
        let rel = format!("platforms/{}", folder);
        self.source_props(
            &rel,
            &[
                ("Pkg.Revision", revision),
                ("AndroidVersion.ApiLevel", &api.to_string()),
                ("Platform.Version", "4.4"),
            ],
        );
        self.write(
            &format!("{}/{}", rel, FN_BUILD_PROP),
            &format!("ro.build.version.sdk={}\nro.build.version.release=4.4\n", api),
        );
        self.write(&format!("{}/{}", rel, FN_FRAMEWORK_LIBRARY), "jar");
        self.write(&format!("{}/{}", rel, FN_FRAMEWORK_AIDL), "aidl");
        self.path(&rel)
    }

    pub fn build_tools(&self, revision: &str) -> PathBuf {
        self.source_props(&format!("build-tools/{}", revision), &[("Pkg.Revision", revision)])
    }

    pub fn platform_tools(&self, revision: &str) -> PathBuf {
        self.source_props("platform-tools", &[("Pkg.Revision", revision)])
    }

    /// A system image `system-images/android-<api>/<tag>/<abi>`
    pub fn system_image(&self, api: u32, tag: &str, abi: &str, vendor: Option<&str>) -> PathBuf {
        let rel = format!("system-images/android-{}/{}/{}", api, tag, abi);
        let api = api.to_string();
        let mut entries = vec![
            ("Pkg.Revision", "1"),
            ("AndroidVersion.ApiLevel", api.as_str()),
            ("SystemImage.Abi", abi),
            ("SystemImage.TagId", tag),
        ];
        if let Some(vendor) = vendor {
            entries.push(("Addon.VendorId", vendor));
        }
        self.source_props(&rel, &entries);
        self.path(&rel)
    }

    /// An add-on folder `add-ons/<folder>` with a `manifest.ini`
    pub fn addon(&self, folder: &str, vendor: &str, name: &str, api: u32, extra_ini: &str) -> PathBuf {
        let rel = format!("add-ons/{}", folder);
        let api_str = api.to_string();
        self.source_props(
            &rel,
            &[
                ("Pkg.Revision", "3"),
                ("AndroidVersion.ApiLevel", &api_str),
                ("Addon.Vendor", vendor),
                ("Addon.Name", name),
            ],
        );
        self.write(
            &format!("{}/{}", rel, FN_MANIFEST_INI),
            &format!("name={}\nvendor={}\napi={}\nrevision=3\n{}", name, vendor, api, extra_ini),
        );
        self.path(&rel)
    }

    pub fn skin(&self, rel_skins_dir: &str, name: &str) -> PathBuf {
        self.write(&format!("{}/{}/{}", rel_skins_dir, name, FN_SKIN_LAYOUT), "parts {}\n");
        self.path(&format!("{}/{}", rel_skins_dir, name))
    }
}
