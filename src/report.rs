//! Inventory report
//!
//! Serializable summary of what a local SDK contains.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use droidsdk_core::ReportConfig;
use droidsdk_repository::{Diagnostic, LocalSdk, PkgType};

/// One installed package
#[derive(Debug, Clone, Serialize)]
pub struct PackageEntry {
    pub kind: PkgType,
    pub description: String,
    pub path: PathBuf,
    pub revision: String,
    pub load_errors: Vec<String>,
}

/// One resolved platform or add-on
#[derive(Debug, Clone, Serialize)]
pub struct TargetEntry {
    pub hash: String,
    pub name: String,
    pub api_level: String,
    pub system_images: usize,
    pub default_skin: Option<PathBuf>,
}

/// System images waiting for a platform or add-on
#[derive(Debug, Clone, Serialize)]
pub struct MissingTargetEntry {
    pub hash: String,
    pub tag: String,
    pub system_images: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildToolEntry {
    pub revision: String,
    pub location: PathBuf,
    pub missing: Vec<String>,
}

/// Everything found under one SDK root
#[derive(Debug, Clone, Serialize)]
pub struct InventoryReport {
    pub sdk_root: PathBuf,
    pub packages: Vec<PackageEntry>,
    pub targets: Vec<TargetEntry>,
    pub missing_targets: Vec<MissingTargetEntry>,
    pub latest_build_tool: Option<BuildToolEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

impl InventoryReport {
    /// Scan `sdk` as far as `config` asks and summarize the result
    pub fn collect(sdk: &LocalSdk, config: &ReportConfig) -> Self {
        let packages = sdk
            .query_all()
            .iter()
            .map(|pkg| PackageEntry {
                kind: pkg.kind(),
                description: pkg.list_description(),
                path: pkg.local_dir().to_path_buf(),
                revision: pkg.desc().revision().to_string(),
                load_errors: pkg.load_errors().to_vec(),
            })
            .collect();

        let targets = sdk
            .targets()
            .iter()
            .map(|target| TargetEntry {
                hash: target.hash_string().to_string(),
                name: target.name().to_string(),
                api_level: target.version().api_string(),
                system_images: target.system_images().len(),
                default_skin: target.default_skin().map(|p| p.to_path_buf()),
            })
            .collect();

        let missing_targets = if config.include_missing_targets {
            sdk.missing_targets()
                .iter()
                .map(|missing| MissingTargetEntry {
                    hash: missing.hash_string(),
                    tag: missing.tag().to_string(),
                    system_images: missing
                        .system_images()
                        .iter()
                        .map(|img| img.location().to_path_buf())
                        .collect(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let latest_build_tool = sdk.latest_build_tool().map(|tool| BuildToolEntry {
            revision: tool.revision().to_string(),
            location: tool.location().to_path_buf(),
            missing: tool.missing_paths().iter().map(|id| id.to_string()).collect(),
        });

        let diagnostics = if config.include_diagnostics {
            sdk.diagnostics()
        } else {
            Vec::new()
        };

        Self {
            sdk_root: sdk.location(),
            packages,
            targets,
            missing_targets,
            latest_build_tool,
            diagnostics,
        }
    }

    /// Write the summary to the log
    pub fn log(&self) {
        info!("SDK root: {:?}", self.sdk_root);
        info!("{} packages installed", self.packages.len());
        for pkg in &self.packages {
            info!("  {} ({})", pkg.description, pkg.path.display());
            for error in &pkg.load_errors {
                warn!("    {}", error);
            }
        }

        for target in &self.targets {
            info!(
                "Target {} [{}] API {} with {} system images",
                target.hash, target.name, target.api_level, target.system_images
            );
        }

        for missing in &self.missing_targets {
            warn!("Missing target {} ({} images)", missing.hash, missing.system_images.len());
        }

        match &self.latest_build_tool {
            Some(tool) => info!("Latest build tools: {} at {:?}", tool.revision, tool.location),
            None => warn!("No build tools installed"),
        }

        for diagnostic in &self.diagnostics {
            warn!("{}", diagnostic);
        }
    }
}
