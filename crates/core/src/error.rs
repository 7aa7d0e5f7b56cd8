//! Error types for DroidSdk
//! 
//! Shared error handling using thiserror.

use thiserror::Error;

/// Main error type for configuration and shared IO
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for DroidSdk operations
pub type Result<T> = std::result::Result<T, SdkError>;

impl SdkError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            SdkError::Io(e) => format!("File operation failed: {}", e),
            SdkError::Config(msg) => format!("Configuration error: {}", msg),
            SdkError::TomlParse(e) => format!("Config file is not valid TOML: {}", e),
            SdkError::NotFound(msg) => format!("Not found: {}", msg),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let err = SdkError::Config("missing sdk path".into());
        assert_eq!(err.user_message(), "Configuration error: missing sdk path");

        let err = SdkError::NotFound("platforms".into());
        assert_eq!(err.to_string(), "Not found: platforms");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SdkError = io.into();
        assert!(matches!(err, SdkError::Io(_)));
        assert!(err.user_message().starts_with("File operation failed"));
    }
}
