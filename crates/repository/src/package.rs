//! Installed packages
//!
//! A [`LocalPkgInfo`] is created by a scanner for each valid package
//! folder. It is immutable apart from the memoized target of platform
//! and add-on packages.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::build_tool::BuildToolInfo;
use crate::descriptor::{PkgDesc, PkgType};
use crate::props::Properties;
use crate::target::{AndroidTarget, SystemImage};

/// Outcome of a lazy computation that runs at most once
#[derive(Debug, Clone, Default)]
pub enum Resolution<T> {
    #[default]
    NotAttempted,
    Failed(String),
    Resolved(T),
}

impl<T> Resolution<T> {
    pub fn is_attempted(&self) -> bool {
        !matches!(self, Resolution::NotAttempted)
    }

    pub fn resolved(&self) -> Option<&T> {
        match self {
            Resolution::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Resolution::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Kind-specific data
#[derive(Debug)]
enum Payload {
    Plain,
    BuildTool(BuildToolInfo),
    SystemImage(SystemImage),
    Target(Mutex<Resolution<Arc<AndroidTarget>>>),
}

/// A package found on disk
#[derive(Debug)]
pub struct LocalPkgInfo {
    desc: PkgDesc,
    local_dir: PathBuf,
    source_props: Properties,
    load_errors: Vec<String>,
    payload: Payload,
}

impl LocalPkgInfo {
    pub fn new(desc: PkgDesc, local_dir: impl Into<PathBuf>, source_props: Properties) -> Self {
        let local_dir = local_dir.into();
        let payload = match &desc {
            PkgDesc::BuildTools { revision } => {
                Payload::BuildTool(BuildToolInfo::new(*revision, local_dir.clone()))
            }
            PkgDesc::Platform { .. } | PkgDesc::Addon { .. } => {
                Payload::Target(Mutex::new(Resolution::NotAttempted))
            }
            _ => Payload::Plain,
        };
        Self {
            desc,
            local_dir,
            source_props,
            load_errors: Vec::new(),
            payload,
        }
    }

    /// Attach the image a system-image package provides
    pub fn with_system_image(mut self, image: SystemImage) -> Self {
        self.payload = Payload::SystemImage(image);
        self
    }

    /// Record a non-fatal problem found while loading
    pub fn with_load_error(mut self, error: impl Into<String>) -> Self {
        self.load_errors.push(error.into());
        self
    }

    pub fn desc(&self) -> &PkgDesc {
        &self.desc
    }

    pub fn kind(&self) -> PkgType {
        self.desc.kind()
    }

    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    pub fn source_props(&self) -> &Properties {
        &self.source_props
    }

    pub fn load_errors(&self) -> &[String] {
        &self.load_errors
    }

    pub fn has_load_errors(&self) -> bool {
        !self.load_errors.is_empty()
    }

    pub fn list_description(&self) -> String {
        self.desc.list_description()
    }

    pub fn build_tool(&self) -> Option<&BuildToolInfo> {
        match &self.payload {
            Payload::BuildTool(info) => Some(info),
            _ => None,
        }
    }

    pub fn system_image(&self) -> Option<&SystemImage> {
        match &self.payload {
            Payload::SystemImage(image) => Some(image),
            _ => None,
        }
    }

    /// The target, if it has already been resolved
    pub fn target(&self) -> Option<Arc<AndroidTarget>> {
        match &self.payload {
            Payload::Target(slot) => slot.lock().resolved().cloned(),
            _ => None,
        }
    }

    /// Why target resolution failed, if it did
    pub fn target_failure(&self) -> Option<String> {
        match &self.payload {
            Payload::Target(slot) => slot.lock().failure().map(str::to_string),
            _ => None,
        }
    }

    pub(crate) fn target_slot(&self) -> Option<&Mutex<Resolution<Arc<AndroidTarget>>>> {
        match &self.payload {
            Payload::Target(slot) => Some(slot),
            _ => None,
        }
    }
}

impl PartialEq for LocalPkgInfo {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LocalPkgInfo {}

impl Ord for LocalPkgInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.desc
            .cmp(&other.desc)
            .then_with(|| self.desc.revision().cmp(other.desc.revision()))
            .then_with(|| self.local_dir.cmp(&other.local_dir))
    }
}

impl PartialOrd for LocalPkgInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
