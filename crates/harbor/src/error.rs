//! Error types for registry reconciliation.
//!
//! Every remote failure surfaces as an [`Error`]. Errors are categorized so the
//! CLI can print targeted advice; nothing in this crate retries.

use std::fmt;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP status the registry returns for a missing project or repository.
pub const STATUS_NOT_FOUND: u16 = 404;

/// Categories of registry errors for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network or HTTP-level failure.
    Network,
    /// The remote object does not exist.
    NotFound,
    /// The request conflicts with remote state (e.g. project not empty).
    Conflict,
    /// The registry answered with something we could not interpret.
    Format,
    /// The declared configuration is invalid.
    Config,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Registry request failed",
            Self::NotFound => "Object not found in the registry",
            Self::Conflict => "Registry state prevents this change",
            Self::Format => "Unreadable registry response",
            Self::Config => "Invalid configuration",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check the registry URL, credentials and connectivity",
            Self::NotFound => "Run `regsync refresh` to drop objects deleted out-of-band",
            Self::Conflict => "Set force_destroy = true to delete the project's repositories",
            Self::Format => "Verify the registry API version matches api_path",
            Self::Config => "Fix the configuration file and try again",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while reconciling a project.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced a usable HTTP response.
    #[error("HTTP request failed: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// The registry answered with a status other than the expected one.
    #[error("unexpected status code got: {status} expected: {expected}: {body}")]
    UnexpectedStatus {
        /// Status returned by the registry.
        status: u16,
        /// Status the operation expected.
        expected: u16,
        /// Response body, usually the registry's error payload.
        body: String,
    },

    /// The response body is not a well-formed record of the expected shape.
    #[error("resource state unreadable: {0}")]
    Decode(String),

    /// The project was created but the response carried no usable identifier.
    #[error("project created but no identifier returned (location: {location:?})")]
    IdentityExtraction {
        /// Raw `Location` header, if one was present.
        location: Option<String>,
    },

    /// An operation that needs the persisted identity was called without one.
    #[error("project {project} has no recorded identity")]
    MissingIdentity {
        /// Project name.
        project: String,
    },

    /// Delete refused because repositories exist and cascade was not requested.
    #[error(
        "project {project} is not empty ({repositories} repositories), set force_destroy = true to delete all repositories"
    )]
    NotEmpty {
        /// Project name.
        project: String,
        /// Number of repositories found.
        repositories: usize,
    },

    /// The declared configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Transport {
            message: message.into(),
            status,
        }
    }

    /// HTTP status attached to this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => *status,
            Error::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a failed request whose status was 404.
    ///
    /// Read and Delete are the only operations that give this case meaning.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(STATUS_NOT_FOUND)
    }

    /// Get the error category for user feedback.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        if self.is_not_found() {
            return ErrorCategory::NotFound;
        }
        match self {
            Error::Transport { .. } | Error::UnexpectedStatus { .. } => ErrorCategory::Network,
            Error::Decode(_) | Error::IdentityExtraction { .. } => ErrorCategory::Format,
            Error::NotEmpty { .. } => ErrorCategory::Conflict,
            Error::InvalidConfig(_) => ErrorCategory::Config,
            Error::MissingIdentity { .. } => ErrorCategory::Other,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Transport {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            other => Self::Transport {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_from_unexpected_status() {
        let err = Error::UnexpectedStatus {
            status: 404,
            expected: 200,
            body: "{\"errors\":[]}".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_not_found_from_transport() {
        let err = Error::transport("HTTP 404", Some(404));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_other_statuses_are_not_not_found() {
        let err = Error::UnexpectedStatus {
            status: 500,
            expected: 200,
            body: String::new(),
        };
        assert!(!err.is_not_found());
        assert_eq!(err.category(), ErrorCategory::Network);

        let err = Error::transport("connection refused", None);
        assert!(!err.is_not_found());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_not_empty_names_project_and_flag() {
        let err = Error::NotEmpty {
            project: "team-a".to_string(),
            repositories: 3,
        };
        let display = err.to_string();
        assert!(display.contains("team-a"));
        assert!(display.contains("force_destroy"));
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn test_decode_category() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Decode(_)));
        assert_eq!(err.category(), ErrorCategory::Format);
    }

    #[test]
    fn test_identity_extraction_display() {
        let err = Error::IdentityExtraction { location: None };
        assert!(err.to_string().contains("no identifier"));
        assert_eq!(err.category(), ErrorCategory::Format);
    }

    #[test]
    fn test_category_advice_not_empty() {
        for category in [
            ErrorCategory::Network,
            ErrorCategory::NotFound,
            ErrorCategory::Conflict,
            ErrorCategory::Format,
            ErrorCategory::Config,
            ErrorCategory::Other,
        ] {
            assert!(!category.description().is_empty());
            assert!(!category.advice().is_empty());
        }
    }
}
