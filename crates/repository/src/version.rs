//! Android platform versions
//!
//! An API level plus an optional preview codename.

use std::fmt;
use serde::Serialize;

use crate::constants::keys;
use crate::props::Properties;

/// Version errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("Missing {0}")]
    MissingApiLevel(&'static str),
    #[error("Invalid API level: {0:?}")]
    InvalidApiLevel(String),
}

/// API level and optional codename.
///
/// Releases sort before the preview of the same API level.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AndroidVersion {
    api_level: u32,
    codename: Option<String>,
}

impl AndroidVersion {
    /// Create a version. A codename of `REL` or a blank codename means a release.
    pub fn new(api_level: u32, codename: Option<&str>) -> Self {
        Self {
            api_level,
            codename: sanitize_codename(codename),
        }
    }

    /// Read `AndroidVersion.ApiLevel` / `AndroidVersion.CodeName`
    pub fn from_properties(props: &Properties) -> Result<Self, VersionError> {
        Self::from_keys(props, keys::VERSION_API_LEVEL, keys::VERSION_CODENAME)
    }

    /// Read `ro.build.version.sdk` / `ro.build.version.codename` from a `build.prop`
    pub fn from_build_properties(props: &Properties) -> Result<Self, VersionError> {
        Self::from_keys(props, keys::BUILD_VERSION_SDK, keys::BUILD_VERSION_CODENAME)
    }

    fn from_keys(props: &Properties, api_key: &'static str, codename_key: &str) -> Result<Self, VersionError> {
        let raw = props
            .get(api_key)
            .ok_or(VersionError::MissingApiLevel(api_key))?;
        let api_level = raw
            .trim()
            .parse::<u32>()
            .map_err(|_| VersionError::InvalidApiLevel(raw.clone()))?;
        Ok(Self::new(api_level, props.get(codename_key).map(String::as_str)))
    }

    pub fn api_level(&self) -> u32 {
        self.api_level
    }

    pub fn codename(&self) -> Option<&str> {
        self.codename.as_deref()
    }

    pub fn is_preview(&self) -> bool {
        self.codename.is_some()
    }

    /// The codename for previews, the API number otherwise
    pub fn api_string(&self) -> String {
        match &self.codename {
            Some(codename) => codename.clone(),
            None => self.api_level.to_string(),
        }
    }

    /// API level a preview will ship as
    pub fn feature_level(&self) -> u32 {
        if self.is_preview() {
            self.api_level + 1
        } else {
            self.api_level
        }
    }
}

fn sanitize_codename(codename: Option<&str>) -> Option<String> {
    codename
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != "REL")
        .map(str::to_string)
}

impl fmt::Display for AndroidVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.codename {
            Some(codename) => write!(f, "API {}, {} preview", self.api_level, codename),
            None => write!(f, "API {}", self.api_level),
        }
    }
}
