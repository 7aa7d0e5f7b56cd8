//! Package revisions
//!
//! Four-part revision numbers: `major.minor.micro` plus an optional
//! preview suffix (`rc1`, `beta2`, `alpha3`).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

static REVISION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([0-9]+)(?:\.([0-9]+)(?:\.([0-9]+))?)?[\s-]*(?:(rc|alpha|beta)([0-9]+))?\s*$")
        .expect("revision pattern is valid")
});

/// Revision parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RevisionParseError {
    #[error("Invalid revision: {0:?}")]
    Invalid(String),
    #[error("Revision component out of range: {0:?}")]
    OutOfRange(String),
}

/// Preview channel, ordered from least to most stable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreviewType {
    Alpha,
    Beta,
    Rc,
}

impl PreviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewType::Alpha => "alpha",
            PreviewType::Beta => "beta",
            PreviewType::Rc => "rc",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "alpha" => Some(PreviewType::Alpha),
            "beta" => Some(PreviewType::Beta),
            "rc" => Some(PreviewType::Rc),
            _ => None,
        }
    }
}

/// A package revision.
///
/// A final release sorts after every preview of the same `major.minor.micro`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Revision {
    major: u32,
    minor: u32,
    micro: u32,
    preview: Option<(PreviewType, u32)>,
}

impl Revision {
    pub const fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self { major, minor, micro, preview: None }
    }

    pub const fn with_preview(major: u32, minor: u32, micro: u32, kind: PreviewType, number: u32) -> Self {
        Self { major, minor, micro, preview: Some((kind, number)) }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn micro(&self) -> u32 {
        self.micro
    }

    pub fn preview(&self) -> Option<(PreviewType, u32)> {
        self.preview
    }

    pub fn is_preview(&self) -> bool {
        self.preview.is_some()
    }

    /// Render without trailing zero components, e.g. `19.1` or `21`
    pub fn to_short_string(&self) -> String {
        let mut s = self.major.to_string();
        if self.minor != 0 || self.micro != 0 {
            s.push_str(&format!(".{}", self.minor));
        }
        if self.micro != 0 {
            s.push_str(&format!(".{}", self.micro));
        }
        if let Some((kind, n)) = self.preview {
            s.push_str(&format!(" {}{}", kind.as_str(), n));
        }
        s
    }
}

impl FromStr for Revision {
    type Err = RevisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = REVISION_PATTERN
            .captures(s)
            .ok_or_else(|| RevisionParseError::Invalid(s.to_string()))?;

        let number = |idx: usize| -> Result<u32, RevisionParseError> {
            match caps.get(idx) {
                Some(m) => m
                    .as_str()
                    .parse::<u32>()
                    .map_err(|_| RevisionParseError::OutOfRange(s.to_string())),
                None => Ok(0),
            }
        };

        let preview = match caps.get(4).and_then(|m| PreviewType::parse(m.as_str())) {
            Some(kind) => Some((kind, number(5)?)),
            None => None,
        };

        Ok(Self {
            major: number(1)?,
            minor: number(2)?,
            micro: number(3)?,
            preview,
        })
    }
}

impl Ord for Revision {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.micro.cmp(&other.micro))
            .then_with(|| match (self.preview, other.preview) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(&b),
            })
    }
}

impl PartialOrd for Revision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if let Some((kind, n)) = self.preview {
            write!(f, " {}{}", kind.as_str(), n)?;
        }
        Ok(())
    }
}

impl Serialize for Revision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!("19".parse::<Revision>().unwrap(), Revision::new(19, 0, 0));
        assert_eq!("19.1".parse::<Revision>().unwrap(), Revision::new(19, 1, 0));
        assert_eq!(" 19.1.0 ".parse::<Revision>().unwrap(), Revision::new(19, 1, 0));
        assert_eq!(
            "21.0.0 rc3".parse::<Revision>().unwrap(),
            Revision::with_preview(21, 0, 0, PreviewType::Rc, 3)
        );
        assert_eq!(
            "22.0.1-beta2".parse::<Revision>().unwrap(),
            Revision::with_preview(22, 0, 1, PreviewType::Beta, 2)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Revision>().is_err());
        assert!("abc".parse::<Revision>().is_err());
        assert!("19.x".parse::<Revision>().is_err());
        assert!(matches!(
            "99999999999".parse::<Revision>(),
            Err(RevisionParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_ordering() {
        let rc1 = Revision::with_preview(19, 1, 0, PreviewType::Rc, 1);
        let beta9 = Revision::with_preview(19, 1, 0, PreviewType::Beta, 9);
        let release = Revision::new(19, 1, 0);

        assert!(Revision::new(19, 0, 3) < Revision::new(19, 1, 0));
        assert!(Revision::new(2, 0, 0) < Revision::new(10, 0, 0));
        assert!(beta9 < rc1);
        assert!(rc1 < release);
        assert!(release < Revision::new(19, 1, 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Revision::new(19, 1, 0).to_string(), "19.1.0");
        assert_eq!(Revision::new(19, 1, 0).to_short_string(), "19.1");
        assert_eq!(Revision::new(21, 0, 0).to_short_string(), "21");
        assert_eq!(
            Revision::with_preview(21, 0, 0, PreviewType::Rc, 3).to_string(),
            "21.0.0 rc3"
        );
    }
}
