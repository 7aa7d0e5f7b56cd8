//! Local SDK catalog
//!
//! [`LocalSdk`] is the lazily-populated, kind-partitioned catalog of the
//! packages installed under one SDK root. A kind is scanned the first time
//! it is queried; results stay cached until the kind is invalidated.
//! Derived views (targets, missing targets, latest build tool) are
//! memoized the same way.
//!
//! All state sits behind a single lock held for the duration of each
//! public call, so the catalog can be shared across threads.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::build_tool::BuildToolInfo;
use crate::constants::MIN_BUILD_TOOLS_SPLIT_MAJOR;
use crate::descriptor::{PkgDesc, PkgType};
use crate::error::{RepositoryError, Result};
use crate::fingerprint::DirFingerprint;
use crate::package::{LocalPkgInfo, Resolution};
use crate::resolve::{addon_target, platform_target, TargetInputs};
use crate::revision::Revision;
use crate::scanner::{scan_kind, Diagnostic, VisitedDirs};
use crate::target::{AndroidTarget, MissingTarget, SdkTarget, SystemImage};
use crate::version::AndroidVersion;

/// Catalog of the packages installed in a local SDK
pub struct LocalSdk {
    state: Mutex<SdkState>,
}

struct SdkState {
    root: PathBuf,
    packages: HashMap<PkgType, Vec<Arc<LocalPkgInfo>>>,
    visited: HashMap<PkgType, VisitedDirs>,
    diagnostics: HashMap<PkgType, Vec<Diagnostic>>,
    latest_build_tool: Resolution<BuildToolInfo>,
    targets: Option<Vec<Arc<AndroidTarget>>>,
    missing_targets: Option<Vec<MissingTarget>>,
    scan_count: usize,
}

impl LocalSdk {
    /// Open the SDK installed at `root`
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = checked_root(root.into())?;
        info!("Opening local SDK at {:?}", root);
        Ok(Self {
            state: Mutex::new(SdkState::new(root)),
        })
    }

    pub fn location(&self) -> PathBuf {
        self.state.lock().root.clone()
    }

    /// Point the catalog at another root, dropping everything cached
    pub fn set_location(&self, root: impl Into<PathBuf>) -> Result<()> {
        let root = checked_root(root.into())?;
        info!("Switching local SDK to {:?}", root);
        *self.state.lock() = SdkState::new(root);
        Ok(())
    }

    /// Packages of the given kinds, sorted
    pub fn query(&self, kinds: &[PkgType]) -> Vec<Arc<LocalPkgInfo>> {
        let mut state = self.state.lock();
        let mut result = Vec::new();
        for kind in unique_kinds(kinds) {
            result.extend(state.packages_of(kind));
        }
        result.sort();
        result
    }

    /// Every installed package
    pub fn query_all(&self) -> Vec<Arc<LocalPkgInfo>> {
        self.query(&PkgType::ALL)
    }

    /// The package of a unique kind (tools, platform-tools, docs, NDK)
    pub fn unique_package(&self, kind: PkgType) -> Result<Option<Arc<LocalPkgInfo>>> {
        if !kind.is_unique() {
            return Err(invalid_kind("unique_package", kind));
        }
        Ok(self.state.lock().packages_of(kind).into_iter().next())
    }

    /// The package whose identity equals `desc`
    pub fn by_descriptor(&self, desc: &PkgDesc) -> Option<Arc<LocalPkgInfo>> {
        self.state
            .lock()
            .packages_of(desc.kind())
            .into_iter()
            .find(|p| p.desc() == desc)
    }

    /// Platform, sample or source package for `version`
    pub fn by_version(&self, kind: PkgType, version: &AndroidVersion) -> Result<Option<Arc<LocalPkgInfo>>> {
        require_kind("by_version", kind, &[PkgType::Platform, PkgType::Sample, PkgType::Source])?;
        Ok(self
            .state
            .lock()
            .packages_of(kind)
            .into_iter()
            .find(|p| p.desc().version() == Some(version)))
    }

    /// Build-tools package with exactly `revision`
    pub fn by_revision(&self, kind: PkgType, revision: &Revision) -> Result<Option<Arc<LocalPkgInfo>>> {
        require_kind("by_revision", kind, &[PkgType::BuildTools])?;
        Ok(self
            .state
            .lock()
            .packages_of(kind)
            .into_iter()
            .find(|p| p.desc().revision() == revision))
    }

    /// Platform or add-on package by target hash string
    pub fn by_path(&self, kind: PkgType, path: &str) -> Result<Option<Arc<LocalPkgInfo>>> {
        require_kind("by_path", kind, &[PkgType::Platform, PkgType::Addon])?;
        Ok(self
            .state
            .lock()
            .packages_of(kind)
            .into_iter()
            .find(|p| p.desc().path().as_deref() == Some(path)))
    }

    /// Extra by vendor id and path, or add-on by vendor id and target hash
    pub fn by_vendor_and_path(
        &self,
        kind: PkgType,
        vendor: &str,
        path: &str,
    ) -> Result<Option<Arc<LocalPkgInfo>>> {
        require_kind("by_vendor_and_path", kind, &[PkgType::Extra, PkgType::Addon])?;
        Ok(self
            .state
            .lock()
            .packages_of(kind)
            .into_iter()
            .find(|p| match p.desc() {
                PkgDesc::Extra { vendor: v, path: extra_path, .. } => {
                    v.id() == vendor && extra_path == path
                }
                PkgDesc::Addon { vendor: v, .. } => {
                    v.id() == vendor && p.desc().path().as_deref() == Some(path)
                }
                _ => false,
            }))
    }

    pub fn extra(&self, vendor: &str, path: &str) -> Option<Arc<LocalPkgInfo>> {
        self.by_vendor_and_path(PkgType::Extra, vendor, path)
            .ok()
            .flatten()
    }

    pub fn build_tool(&self, revision: &Revision) -> Option<BuildToolInfo> {
        self.by_revision(PkgType::BuildTools, revision)
            .ok()
            .flatten()
            .and_then(|p| p.build_tool().cloned())
    }

    /// Highest installed build tools, or the tools bundled with an old
    /// platform-tools package when no build-tools package exists
    pub fn latest_build_tool(&self) -> Option<BuildToolInfo> {
        self.state.lock().latest_build_tool()
    }

    /// One target per resolvable platform and add-on
    pub fn targets(&self) -> Vec<Arc<AndroidTarget>> {
        self.state.lock().targets()
    }

    /// Placeholders for system images whose platform or add-on is absent
    pub fn missing_targets(&self) -> Vec<MissingTarget> {
        self.state.lock().missing_targets()
    }

    pub fn target_from_hash(&self, hash: &str) -> Option<Arc<AndroidTarget>> {
        self.state
            .lock()
            .targets()
            .into_iter()
            .find(|t| t.hash_string() == hash)
    }

    /// Installed or missing target with the given hash string. Installed
    /// targets win when both share a hash.
    pub fn any_target_from_hash(&self, hash: &str) -> Option<SdkTarget> {
        let mut state = self.state.lock();
        if let Some(target) = state.targets().into_iter().find(|t| t.hash_string() == hash) {
            return Some(SdkTarget::Installed(target));
        }
        state
            .missing_targets()
            .into_iter()
            .find(|m| m.hash_string() == hash)
            .map(SdkTarget::Missing)
    }

    /// Target of a platform or add-on package, resolved at most once
    pub fn resolve_target(&self, pkg: &LocalPkgInfo) -> Option<Arc<AndroidTarget>> {
        self.state.lock().resolve(pkg)
    }

    /// Drop cached packages and derived views for `kinds`
    pub fn invalidate(&self, kinds: &[PkgType]) {
        let mut state = self.state.lock();
        for kind in unique_kinds(kinds) {
            state.clear_kind(kind);
        }
    }

    /// Whether any folder visited for `kinds` changed on disk
    pub fn has_changed(&self, kinds: &[PkgType]) -> bool {
        let state = self.state.lock();
        kinds.iter().any(|kind| {
            state.visited.get(kind).is_some_and(|dirs| {
                dirs.iter().any(|(dir, fingerprint)| {
                    let changed = fingerprint.has_changed(dir);
                    if changed {
                        debug!("{:?} changed since last scan", dir);
                    }
                    changed
                })
            })
        })
    }

    /// Why folders were skipped or packages could not be resolved
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let state = self.state.lock();
        PkgType::ALL
            .iter()
            .filter_map(|kind| state.diagnostics.get(kind))
            .flatten()
            .cloned()
            .collect()
    }

    /// Number of scanner runs so far
    pub fn scan_count(&self) -> usize {
        self.state.lock().scan_count
    }
}

impl SdkState {
    fn new(root: PathBuf) -> Self {
        Self {
            root,
            packages: HashMap::new(),
            visited: HashMap::new(),
            diagnostics: HashMap::new(),
            latest_build_tool: Resolution::NotAttempted,
            targets: None,
            missing_targets: None,
            scan_count: 0,
        }
    }

    fn packages_of(&mut self, kind: PkgType) -> Vec<Arc<LocalPkgInfo>> {
        self.ensure_scanned(kind);
        self.packages.get(&kind).cloned().unwrap_or_default()
    }

    fn ensure_scanned(&mut self, kind: PkgType) {
        if self.packages.get(&kind).is_some_and(|p| !p.is_empty()) {
            return;
        }
        let folder = self.root.join(kind.folder_name());
        let visited = self.visited.entry(kind).or_default();
        if visited.contains_key(&folder) {
            return;
        }

        let diagnostics = self.diagnostics.entry(kind).or_default();
        let mut found = scan_kind(kind, &self.root, visited, diagnostics);
        visited.insert(folder.clone(), DirFingerprint::capture(&folder));
        self.scan_count += 1;

        found.sort();
        debug!("Loaded {} {} package(s)", found.len(), kind);
        self.packages
            .insert(kind, found.into_iter().map(Arc::new).collect());
    }

    fn clear_kind(&mut self, kind: PkgType) {
        debug!("Invalidating {} packages", kind);
        self.packages.remove(&kind);
        self.visited.remove(&kind);
        self.diagnostics.remove(&kind);

        if kind.has_target() {
            self.targets = None;
            self.missing_targets = None;
        }
        if matches!(kind, PkgType::SystemImage | PkgType::AddonSystemImage) {
            self.missing_targets = None;
        }
        if matches!(kind, PkgType::BuildTools | PkgType::PlatformTools) {
            self.latest_build_tool = Resolution::NotAttempted;
        }
    }

    fn latest_build_tool(&mut self) -> Option<BuildToolInfo> {
        if !self.latest_build_tool.is_attempted() {
            self.latest_build_tool = self.find_latest_build_tool();
        }
        self.latest_build_tool.resolved().cloned()
    }

    fn find_latest_build_tool(&mut self) -> Resolution<BuildToolInfo> {
        let latest = self
            .packages_of(PkgType::BuildTools)
            .iter()
            .filter_map(|p| p.build_tool())
            .max_by(|a, b| a.revision().cmp(b.revision()))
            .cloned();
        if let Some(latest) = latest {
            return Resolution::Resolved(latest);
        }

        let split = Revision::new(MIN_BUILD_TOOLS_SPLIT_MAJOR, 0, 0);
        match self.packages_of(PkgType::PlatformTools).first() {
            Some(pt) if *pt.desc().revision() < split => {
                info!(
                    "No build-tools installed, using tools bundled with platform-tools {}",
                    pt.desc().revision()
                );
                Resolution::Resolved(BuildToolInfo::legacy(*pt.desc().revision(), pt.local_dir()))
            }
            _ => Resolution::Failed("no build tools installed".to_string()),
        }
    }

    fn targets(&mut self) -> Vec<Arc<AndroidTarget>> {
        if let Some(targets) = &self.targets {
            return targets.clone();
        }

        let mut targets = Vec::new();
        let candidates = self
            .packages_of(PkgType::Platform)
            .into_iter()
            .chain(self.packages_of(PkgType::Addon));
        for pkg in candidates {
            if let Some(target) = self.resolve(&pkg) {
                targets.push(target);
            }
        }

        debug!("Resolved {} target(s)", targets.len());
        self.targets = Some(targets.clone());
        targets
    }

    fn resolve(&mut self, pkg: &LocalPkgInfo) -> Option<Arc<AndroidTarget>> {
        let slot = pkg.target_slot()?;
        {
            let memo = slot.lock();
            if memo.is_attempted() {
                return memo.resolved().cloned();
            }
        }

        let mut warnings = Vec::new();
        let outcome = match pkg.desc() {
            PkgDesc::Platform { version, .. } => {
                let inputs = self.platform_inputs(version);
                platform_target(pkg, inputs, &mut warnings)
            }
            PkgDesc::Addon { version, .. } => {
                let inputs = self.addon_inputs(version);
                addon_target(pkg, inputs, &mut warnings)
            }
            _ => return None,
        };

        for warning in warnings {
            self.report(pkg, warning);
        }
        match outcome {
            Ok(target) => {
                let target = Arc::new(target);
                *slot.lock() = Resolution::Resolved(target.clone());
                Some(target)
            }
            Err(reason) => {
                self.report(pkg, format!("unable to resolve target: {}", reason));
                *slot.lock() = Resolution::Failed(reason);
                None
            }
        }
    }

    fn report(&mut self, pkg: &LocalPkgInfo, message: String) {
        warn!("{:?}: {}", pkg.local_dir(), message);
        self.diagnostics.entry(pkg.kind()).or_default().push(Diagnostic {
            kind: pkg.kind(),
            path: pkg.local_dir().to_path_buf(),
            message,
        });
    }

    fn platform_inputs(&mut self, version: &AndroidVersion) -> TargetInputs {
        let first_dir = |pkgs: Vec<Arc<LocalPkgInfo>>| {
            pkgs.into_iter()
                .find(|p| p.desc().version() == Some(version))
                .map(|p| p.local_dir().to_path_buf())
        };
        let sample_dir = first_dir(self.packages_of(PkgType::Sample));
        let source_dir = first_dir(self.packages_of(PkgType::Source));
        TargetInputs {
            system_images: self.images_for(PkgType::SystemImage, version),
            sample_dir,
            source_dir,
            build_tool: self.latest_build_tool(),
            base: None,
        }
    }

    fn addon_inputs(&mut self, version: &AndroidVersion) -> TargetInputs {
        let base = self
            .packages_of(PkgType::Platform)
            .into_iter()
            .find(|p| p.desc().version() == Some(version));
        TargetInputs {
            system_images: self.images_for(PkgType::AddonSystemImage, version),
            sample_dir: None,
            source_dir: None,
            build_tool: None,
            base: base.and_then(|p| self.resolve(&p)),
        }
    }

    fn images_for(&mut self, kind: PkgType, version: &AndroidVersion) -> Vec<Arc<LocalPkgInfo>> {
        self.packages_of(kind)
            .into_iter()
            .filter(|p| p.desc().version() == Some(version))
            .collect()
    }

    fn missing_targets(&mut self) -> Vec<MissingTarget> {
        if let Some(missing) = &self.missing_targets {
            return missing.clone();
        }

        let seen: HashSet<PathBuf> = self
            .targets()
            .iter()
            .flat_map(|t| t.system_images().iter().map(|img| img.location().to_path_buf()))
            .collect();

        let mut groups: BTreeMap<(AndroidVersion, Option<String>, String), Vec<SystemImage>> =
            BTreeMap::new();
        let images = self
            .packages_of(PkgType::AddonSystemImage)
            .into_iter()
            .chain(self.packages_of(PkgType::SystemImage));
        for pkg in images {
            let (Some(image), Some(version)) = (pkg.system_image(), pkg.desc().version()) else {
                continue;
            };
            if seen.contains(image.location()) {
                continue;
            }
            let vendor = image.addon_vendor().map(|v| v.display().to_string());
            groups
                .entry((version.clone(), vendor, image.tag().display().to_string()))
                .or_default()
                .push(image.clone());
        }

        let missing: Vec<MissingTarget> = groups
            .into_iter()
            .map(|((version, vendor, tag), mut system_images)| {
                system_images.sort();
                MissingTarget { vendor, tag, version, system_images }
            })
            .collect();

        if !missing.is_empty() {
            info!("{} system image group(s) have no matching target", missing.len());
        }
        self.missing_targets = Some(missing.clone());
        missing
    }
}

fn checked_root(root: PathBuf) -> Result<PathBuf> {
    if root.is_dir() {
        Ok(root)
    } else {
        Err(RepositoryError::InvalidSdkRoot(root))
    }
}

fn invalid_kind(operation: &'static str, kind: PkgType) -> RepositoryError {
    RepositoryError::InvalidKind { operation, kind }
}

fn require_kind(operation: &'static str, kind: PkgType, allowed: &[PkgType]) -> Result<()> {
    if allowed.contains(&kind) {
        Ok(())
    } else {
        Err(invalid_kind(operation, kind))
    }
}

fn unique_kinds(kinds: &[PkgType]) -> Vec<PkgType> {
    let mut unique = kinds.to_vec();
    unique.sort();
    unique.dedup();
    unique
}

impl std::fmt::Debug for LocalSdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSdk")
            .field("root", &self.location())
            .finish()
    }
}
