//! Errors raised while loading, tagging and submitting causes.

use thiserror::Error;

pub type TaggingResult<T> = std::result::Result<T, TaggingError>;

/// Failures scoped to a single cause tagging screen.
///
/// None of these are fatal to the process. Application plumbing (config,
/// files, CLI) reports through `anyhow` instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaggingError {
    /// Catalog read returned a non-success status or never reached the server.
    #[error("failed to load causes{}: {message}", status_suffix(.status))]
    Fetch {
        status: Option<u16>,
        message: String,
    },

    /// Submission attempted with a selection the screen does not accept.
    #[error("{0}")]
    Validation(String),

    /// No usable bearer token for an authenticated call.
    #[error("not signed in: {0}")]
    Auth(String),

    /// Selection write returned a non-success status or never reached the server.
    #[error("failed to save causes{}: {message}", status_suffix(.status))]
    Submit {
        status: Option<u16>,
        message: String,
    },

    #[error("causes are still loading")]
    NotReady,

    #[error("request cancelled because the screen was closed")]
    Cancelled,

    #[error("request timed out after {0}s")]
    Timeout(u64),
}

impl TaggingError {
    pub fn fetch(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Fetch {
            status,
            message: message.into(),
        }
    }

    pub fn submit(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Submit {
            status,
            message: message.into(),
        }
    }

    /// Whether the screen should offer a retry button for this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::Submit { .. } | Self::Auth(_) | Self::Timeout(_)
        )
    }

    /// Text shown to the user. Transport details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Fetch { .. } => "We couldn't load causes. Check your connection and try again.".to_string(),
            Self::Submit { .. } => "We couldn't save your causes. Please try again.".to_string(),
            Self::Auth(_) => "Your session has expired. Please sign in again.".to_string(),
            Self::Timeout(_) => "The server took too long to respond. Please try again.".to_string(),
            Self::Validation(message) => message.clone(),
            Self::NotReady => "Causes are still loading.".to_string(),
            Self::Cancelled => String::new(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_http_status_when_known() {
        let err = TaggingError::fetch(Some(503), "unavailable");
        assert_eq!(err.to_string(), "failed to load causes (HTTP 503): unavailable");

        let err = TaggingError::submit(None, "connection refused");
        assert_eq!(err.to_string(), "failed to save causes: connection refused");
    }

    #[test]
    fn validation_is_not_retryable() {
        assert!(!TaggingError::Validation("pick one".into()).is_retryable());
        assert!(!TaggingError::NotReady.is_retryable());
        assert!(TaggingError::Auth("missing".into()).is_retryable());
        assert!(TaggingError::Timeout(15).is_retryable());
    }
}
