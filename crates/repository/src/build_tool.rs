//! Build tools
//!
//! Paths to the tools shipped in a build-tools package, or in an old
//! platform-tools package that predates the build-tools split.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::{
    exe_name, script_name, FD_CLANG_INCLUDE, FD_INCLUDE, FD_LIB, FD_RENDERSCRIPT, FN_DX_JAR,
};
use crate::revision::Revision;

/// Tools a build-tools package may provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathId {
    Aapt,
    Aidl,
    Dx,
    DxJar,
    LlvmRsCc,
    AndroidRs,
    AndroidRsClang,
    Dexdump,
    BccCompat,
    LdArm,
    LdX86,
    LdMips,
    ZipAlign,
    Jack,
    Jill,
    SplitSelect,
}

impl PathId {
    pub const ALL: [PathId; 16] = [
        PathId::Aapt,
        PathId::Aidl,
        PathId::Dx,
        PathId::DxJar,
        PathId::LlvmRsCc,
        PathId::AndroidRs,
        PathId::AndroidRsClang,
        PathId::Dexdump,
        PathId::BccCompat,
        PathId::LdArm,
        PathId::LdX86,
        PathId::LdMips,
        PathId::ZipAlign,
        PathId::Jack,
        PathId::Jill,
        PathId::SplitSelect,
    ];

    /// First build-tools revision shipping this tool
    pub fn min_revision(&self) -> Revision {
        match self {
            PathId::Aapt
            | PathId::Aidl
            | PathId::Dx
            | PathId::DxJar
            | PathId::LlvmRsCc
            | PathId::AndroidRs
            | PathId::AndroidRsClang
            | PathId::Dexdump => Revision::new(1, 0, 0),
            PathId::BccCompat | PathId::LdArm | PathId::LdX86 | PathId::LdMips => {
                Revision::new(18, 1, 0)
            }
            PathId::ZipAlign => Revision::new(19, 1, 0),
            PathId::Jack | PathId::Jill => Revision::new(21, 1, 0),
            PathId::SplitSelect => Revision::new(22, 0, 0),
        }
    }

    pub fn is_present_in(&self, revision: &Revision) -> bool {
        *revision >= self.min_revision()
    }

    /// Location relative to the package folder
    pub fn relative_path(&self) -> PathBuf {
        match self {
            PathId::Aapt => PathBuf::from(exe_name("aapt")),
            PathId::Aidl => PathBuf::from(exe_name("aidl")),
            PathId::Dx => PathBuf::from(script_name("dx")),
            PathId::DxJar => Path::new(FD_LIB).join(FN_DX_JAR),
            PathId::LlvmRsCc => PathBuf::from(exe_name("llvm-rs-cc")),
            PathId::AndroidRs => Path::new(FD_RENDERSCRIPT).join(FD_INCLUDE),
            PathId::AndroidRsClang => Path::new(FD_RENDERSCRIPT).join(FD_CLANG_INCLUDE),
            PathId::Dexdump => PathBuf::from(exe_name("dexdump")),
            PathId::BccCompat => PathBuf::from(exe_name("bcc_compat")),
            PathId::LdArm => PathBuf::from(exe_name("arm-linux-androideabi-ld")),
            PathId::LdX86 => PathBuf::from(exe_name("i686-linux-android-ld")),
            PathId::LdMips => PathBuf::from(exe_name("mipsel-linux-android-ld")),
            PathId::ZipAlign => PathBuf::from(exe_name("zipalign")),
            PathId::Jack => Path::new(FD_LIB).join("jack.jar"),
            PathId::Jill => Path::new(FD_LIB).join("jill.jar"),
            PathId::SplitSelect => PathBuf::from(exe_name("split-select")),
        }
    }

    /// Whether the path names a folder rather than a file
    pub fn is_folder(&self) -> bool {
        matches!(self, PathId::AndroidRs | PathId::AndroidRsClang)
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Tool paths of one build-tools revision
#[derive(Debug, Clone)]
pub struct BuildToolInfo {
    revision: Revision,
    location: PathBuf,
    paths: BTreeMap<PathId, PathBuf>,
}

impl BuildToolInfo {
    /// Tools of a build-tools package installed at `location`
    pub fn new(revision: Revision, location: impl Into<PathBuf>) -> Self {
        let location = location.into();
        let paths = PathId::ALL
            .iter()
            .filter(|id| id.is_present_in(&revision))
            .map(|id| (*id, location.join(id.relative_path())))
            .collect();
        Self { revision, location, paths }
    }

    /// Tools bundled in a platform-tools package from before the build-tools split
    pub fn legacy(revision: Revision, platform_tools: impl Into<PathBuf>) -> Self {
        let location = platform_tools.into();
        let paths = [
            PathId::Aapt,
            PathId::Aidl,
            PathId::Dx,
            PathId::DxJar,
            PathId::LlvmRsCc,
            PathId::AndroidRs,
            PathId::AndroidRsClang,
            PathId::ZipAlign,
        ]
        .iter()
        .map(|id| (*id, location.join(id.relative_path())))
        .collect();
        Self { revision, location, paths }
    }

    pub fn revision(&self) -> &Revision {
        &self.revision
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn path(&self, id: PathId) -> Option<&Path> {
        self.paths.get(&id).map(PathBuf::as_path)
    }

    pub fn paths(&self) -> impl Iterator<Item = (PathId, &Path)> {
        self.paths.iter().map(|(id, p)| (*id, p.as_path()))
    }

    /// Tools that are expected but absent on disk
    pub fn missing_paths(&self) -> Vec<PathId> {
        self.paths
            .iter()
            .filter(|(id, path)| {
                if id.is_folder() {
                    !path.is_dir()
                } else {
                    !path.is_file()
                }
            })
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.missing_paths().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_revision() {
        let old = BuildToolInfo::new(Revision::new(18, 0, 1), "/sdk/build-tools/18.0.1");
        assert!(old.path(PathId::Aapt).is_some());
        assert!(old.path(PathId::BccCompat).is_none());
        assert!(old.path(PathId::ZipAlign).is_none());

        let newer = BuildToolInfo::new(Revision::new(19, 1, 0), "/sdk/build-tools/19.1.0");
        assert!(newer.path(PathId::BccCompat).is_some());
        assert_eq!(
            newer.path(PathId::DxJar).unwrap(),
            Path::new("/sdk/build-tools/19.1.0/lib/dx.jar")
        );
        assert!(newer.path(PathId::Jack).is_none());

        let latest = BuildToolInfo::new(Revision::new(22, 0, 1), "/sdk/build-tools/22.0.1");
        assert_eq!(latest.paths().count(), PathId::ALL.len());
    }

    #[test]
    fn test_legacy_points_into_platform_tools() {
        let legacy = BuildToolInfo::legacy(Revision::new(16, 0, 0), "/sdk/platform-tools");
        assert_eq!(legacy.paths().count(), 8);
        assert_eq!(
            legacy.path(PathId::AndroidRsClang).unwrap(),
            Path::new("/sdk/platform-tools/renderscript/clang-include")
        );
        assert!(legacy.path(PathId::ZipAlign).is_some());
        assert!(legacy.path(PathId::Dexdump).is_none());
    }

    #[test]
    fn test_validity() {
        let dir = tempfile::tempdir().unwrap();
        let info = BuildToolInfo::new(Revision::new(17, 0, 0), dir.path());
        assert!(!info.is_valid());

        for (id, path) in info.paths() {
            if id.is_folder() {
                std::fs::create_dir_all(path).unwrap();
            } else {
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(path, "").unwrap();
            }
        }
        assert!(info.is_valid());
    }
}
