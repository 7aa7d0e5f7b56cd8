//! Directory fingerprints
//!
//! A cheap signature of a package folder used to tell whether it needs
//! to be rescanned. It covers the folder's own mtime, the mtime and
//! content checksum of its `source.properties`, and the mtimes of its
//! immediate children. Only one level is inspected: a change two or more
//! folders deep goes unnoticed.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::constants::FN_SOURCE_PROP;

/// Signature of a package folder at scan time
#[derive(Debug, Clone)]
pub struct DirFingerprint {
    exists: bool,
    modified: Option<SystemTime>,
    manifest: Option<ManifestStamp>,
    children: u64,
}

/// Signature of the folder's `source.properties`
#[derive(Debug, Clone)]
struct ManifestStamp {
    modified: Option<SystemTime>,
    /// `None` when the file could not be read
    checksum: Option<String>,
}

impl ManifestStamp {
    fn capture(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok().filter(|m| m.is_file())?;
        let checksum = match fs::read(path) {
            Ok(data) => {
                let mut hasher = Sha256::new();
                hasher.update(&data);
                Some(hex::encode(hasher.finalize()))
            }
            Err(e) => {
                debug!("Cannot checksum {:?}: {}", path, e);
                None
            }
        };
        Some(Self {
            modified: meta.modified().ok(),
            checksum,
        })
    }

    fn differs(&self, other: &ManifestStamp) -> bool {
        if self.modified != other.modified {
            return true;
        }
        match (&self.checksum, &other.checksum) {
            (Some(a), Some(b)) => a != b,
            // Unknown content always counts as changed
            _ => true,
        }
    }
}

impl DirFingerprint {
    /// Capture the current state of `dir`. Never fails; a missing folder
    /// is recorded as such.
    pub fn capture(dir: &Path) -> Self {
        let meta = fs::metadata(dir).ok().filter(|m| m.is_dir());
        let Some(meta) = meta else {
            return Self {
                exists: false,
                modified: None,
                manifest: None,
                children: 0,
            };
        };

        let modified = meta.modified().ok();
        Self {
            exists: true,
            modified,
            manifest: ManifestStamp::capture(&dir.join(FN_SOURCE_PROP)),
            children: fold_children(dir, modified),
        }
    }

    /// Whether `dir` no longer matches this fingerprint
    pub fn has_changed(&self, dir: &Path) -> bool {
        let meta = fs::metadata(dir).ok().filter(|m| m.is_dir());
        let meta = match (self.exists, meta) {
            (false, None) => return false,
            (false, Some(_)) | (true, None) => return true,
            (true, Some(meta)) => meta,
        };

        let modified = meta.modified().ok();
        if modified != self.modified {
            return true;
        }

        let manifest = ManifestStamp::capture(&dir.join(FN_SOURCE_PROP));
        match (&self.manifest, &manifest) {
            (None, None) => {}
            (Some(before), Some(now)) => {
                if before.differs(now) {
                    return true;
                }
            }
            _ => return true,
        }

        fold_children(dir, modified) != self.children
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn has_manifest(&self) -> bool {
        self.manifest.is_some()
    }
}

/// Fold child mtimes, in case-insensitive name order, into a seed taken
/// from the folder's own mtime
fn fold_children(dir: &Path, modified: Option<SystemTime>) -> u64 {
    let mut children: Vec<(String, PathBuf)> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| (e.file_name().to_string_lossy().to_lowercase(), e.path()))
            .collect(),
        Err(e) => {
            debug!("Cannot list {:?}: {}", dir, e);
            Vec::new()
        }
    };
    children.sort();

    children.iter().fold(stamp(modified), |acc, (_, path)| {
        let child = fs::metadata(path).ok().and_then(|m| m.modified().ok());
        acc.wrapping_mul(31).wrapping_add(stamp(child))
    })
}

fn stamp(time: Option<SystemTime>) -> u64 {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    fn mtime(path: &Path) -> SystemTime {
        fs::metadata(path).unwrap().modified().unwrap()
    }

    fn package_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(FN_SOURCE_PROP), "Pkg.Revision=19.1.0\n").unwrap();
        fs::write(dir.path().join("aapt"), "binary").unwrap();
        dir
    }

    #[test]
    fn test_unchanged() {
        let dir = package_dir();
        let fp = DirFingerprint::capture(dir.path());
        assert!(fp.exists());
        assert!(fp.has_manifest());
        assert!(!fp.has_changed(dir.path()));
    }

    #[test]
    fn test_manifest_content_change_detected() {
        let dir = package_dir();
        let manifest = dir.path().join(FN_SOURCE_PROP);
        let before = mtime(&manifest);
        let fp = DirFingerprint::capture(dir.path());

        fs::write(&manifest, "Pkg.Revision=19.1.1\n").unwrap();
        set_mtime(&manifest, before);

        assert!(fp.has_changed(dir.path()));
    }

    #[test]
    fn test_child_touch_detected() {
        let dir = package_dir();
        let child = dir.path().join("aapt");
        let fp = DirFingerprint::capture(dir.path());

        set_mtime(&child, mtime(&child) + Duration::from_secs(60));

        assert!(fp.has_changed(dir.path()));
    }

    #[test]
    fn test_reverted_touch_goes_unnoticed() {
        let dir = package_dir();
        let child = dir.path().join("aapt");
        let original = mtime(&child);
        let fp = DirFingerprint::capture(dir.path());

        fs::write(&child, "new binary").unwrap();
        set_mtime(&child, original);

        assert!(!fp.has_changed(dir.path()));
    }

    #[test]
    fn test_new_child_detected() {
        let dir = package_dir();
        let fp = DirFingerprint::capture(dir.path());

        fs::create_dir(dir.path().join("lib")).unwrap();

        assert!(fp.has_changed(dir.path()));
    }

    #[test]
    fn test_nested_change_not_detected() {
        let dir = package_dir();
        let nested = dir.path().join("lib");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("dx.jar"), "v1").unwrap();
        let fp = DirFingerprint::capture(dir.path());

        fs::write(nested.join("dx.jar"), "v2 with more bytes").unwrap();
        set_mtime(&nested.join("dx.jar"), mtime(&nested.join("dx.jar")) + Duration::from_secs(60));

        assert!(!fp.has_changed(dir.path()));
    }

    #[test]
    fn test_manifest_removed_detected() {
        let dir = package_dir();
        let fp = DirFingerprint::capture(dir.path());

        fs::remove_file(dir.path().join(FN_SOURCE_PROP)).unwrap();

        assert!(fp.has_changed(dir.path()));
    }

    #[test]
    fn test_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("build-tools");
        let fp = DirFingerprint::capture(&missing);
        assert!(!fp.exists());
        assert!(!fp.has_changed(&missing));

        fs::create_dir(&missing).unwrap();
        assert!(fp.has_changed(&missing));

        let fp = DirFingerprint::capture(&missing);
        fs::remove_dir(&missing).unwrap();
        assert!(fp.has_changed(&missing));
    }

    #[test]
    fn test_unknown_checksum_always_changed() {
        let dir = package_dir();
        let mut fp = DirFingerprint::capture(dir.path());
        if let Some(manifest) = fp.manifest.as_mut() {
            manifest.checksum = None;
        }
        assert!(fp.has_changed(dir.path()));
    }
}
