//! Repository errors

use std::path::PathBuf;
use thiserror::Error;

use crate::descriptor::PkgType;

/// Errors returned by the local repository
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Invalid SDK root: {0:?} is not a directory")]
    InvalidSdkRoot(PathBuf),

    #[error("{operation} does not accept package kind {kind:?}")]
    InvalidKind {
        operation: &'static str,
        kind: PkgType,
    },
}

/// Result type alias for repository operations
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = RepositoryError::InvalidKind {
            operation: "by_revision",
            kind: PkgType::Platform,
        };
        assert_eq!(err.to_string(), "by_revision does not accept package kind Platform");

        let err = RepositoryError::InvalidSdkRoot(PathBuf::from("/nope"));
        assert!(err.to_string().contains("/nope"));
    }

    #[test]
    fn test_every_variant_is_a_caller_error() {
        let is_caller_error = |err: &RepositoryError| match err {
            RepositoryError::InvalidSdkRoot(_) | RepositoryError::InvalidKind { .. } => true,
        };
        assert!(is_caller_error(&RepositoryError::InvalidSdkRoot(PathBuf::from("/nope"))));
    }
}
