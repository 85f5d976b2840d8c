//! Client error handling
//!
//! Typed errors for paste store requests and edit session operations, with
//! classification into terminal and retryable failures.

use thiserror::Error;

use crate::models::PasteIdError;

/// Errors talking to the paste store
#[derive(Error, Debug)]
pub enum ClientError {
    /// Paste doesn't exist or couldn't be loaded
    #[error("Paste not found: {id}")]
    NotFound { id: String },

    /// Paste has been retired on the server (HTTP 410)
    #[error("Paste {id} has been deleted and cannot be edited")]
    Gone { id: String },

    /// Content exceeds the server's size limit (HTTP 413)
    #[error("Paste too large: {message}")]
    TooLarge { message: String },

    /// Content is empty or whitespace only; never sent
    #[error("Content cannot be empty")]
    EmptyContent,

    /// Server answered with some other non-success status
    #[error("Server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Server response was missing something we need
    #[error("Unexpected response from server: {0}")]
    UnexpectedResponse(String),

    #[error("Invalid paste ID: {0}")]
    InvalidId(#[from] PasteIdError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Network-level failure (connect, timeout, decode)
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    /// Whether this error means the paste is permanently read-only
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClientError::Gone { .. })
    }

    /// Whether the user may retry the same request by hand
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Rejected { .. } | ClientError::Http(_) | ClientError::UnexpectedResponse(_)
        )
    }

    /// Short notice suitable for showing to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            ClientError::NotFound { .. } => "Error: Paste not found",
            ClientError::Gone { .. } => "This paste has been deleted and cannot be edited",
            ClientError::TooLarge { .. } => "Paste is too large to save",
            ClientError::EmptyContent => "Content cannot be empty",
            ClientError::InvalidId(_) | ClientError::InvalidUrl(_) => "Invalid paste address",
            ClientError::Rejected { .. }
            | ClientError::UnexpectedResponse(_)
            | ClientError::Http(_) => "Failed to save changes",
        }
    }
}

/// Errors from edit session operations that never reach the network
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Paste is retired; editing is disabled
    #[error("Cannot edit deleted paste")]
    Retired,

    /// Operation requires an active edit session
    #[error("Not in edit mode")]
    NotEditing,

    /// Draft is empty or whitespace only
    #[error("Content cannot be empty")]
    EmptyDraft,
}

/// Result type for paste store operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gone_is_terminal() {
        let err = ClientError::Gone {
            id: "00001".to_string(),
        };
        assert!(err.is_terminal());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("00001"));
    }

    #[test]
    fn test_rejected_is_retryable() {
        let err = ClientError::Rejected {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!err.is_terminal());
        assert!(err.is_retryable());
        assert_eq!(err.user_message(), "Failed to save changes");

        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_local_errors_not_retryable() {
        assert!(!ClientError::EmptyContent.is_retryable());
        assert!(!ClientError::TooLarge {
            message: "max 1 MB".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_not_found_message() {
        let err = ClientError::NotFound {
            id: "00009".to_string(),
        };
        assert_eq!(err.user_message(), "Error: Paste not found");
    }
}
