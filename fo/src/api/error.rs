//! Session API error types

use thiserror::Error;

/// Errors that can occur while talking to the session backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Check if the server reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Api { status: 404, .. })
    }

    /// HTTP status code, when the server produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_not_found() {
        let err = ApiError::Api {
            status: 404,
            message: "Session not found".to_string(),
        };
        assert!(err.is_not_found());

        let err = ApiError::Api {
            status: 500,
            message: "Server error".to_string(),
        };
        assert!(!err.is_not_found());

        assert!(!ApiError::InvalidResponse("bad".to_string()).is_not_found());
    }

    #[test]
    fn test_status() {
        let err = ApiError::Api {
            status: 422,
            message: "Unprocessable".to_string(),
        };
        assert_eq!(err.status(), Some(422));
        assert_eq!(ApiError::InvalidResponse("bad".to_string()).status(), None);
    }

    #[test]
    fn test_display_includes_status_and_message() {
        let err = ApiError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error 500: boom");
    }
}
