//! Error types for buildkite-mcp-server.

use thiserror::Error;

/// Main error type for Buildkite operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(String),

    /// 401 from the API
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 403 from the API
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 404 from the API
    #[error("Not found: {0}")]
    NotFound(String),

    /// 429 from the API
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Any other non-success status
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response could not be interpreted
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Map an HTTP status code and response body to an error.
    ///
    /// The body is kept as-is so callers can surface it verbatim.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => Error::Unauthorized(body),
            403 => Error::Forbidden(body),
            404 => Error::NotFound(body),
            429 => Error::RateLimited(body),
            _ => Error::Api {
                status,
                message: body,
            },
        }
    }

    /// Raw upstream response body, when this error came from a non-success response
    /// that carried one.
    pub fn raw_body(&self) -> Option<&str> {
        let body = match self {
            Error::Unauthorized(body)
            | Error::Forbidden(body)
            | Error::NotFound(body)
            | Error::RateLimited(body) => body,
            Error::Api { message, .. } => message,
            _ => return None,
        };

        if body.is_empty() {
            None
        } else {
            Some(body)
        }
    }

    /// HTTP status code for errors that came from an API response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Unauthorized(_) => Some(401),
            Error::Forbidden(_) => Some(403),
            Error::NotFound(_) => Some(404),
            Error::RateLimited(_) => Some(429),
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for Buildkite operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            Error::from_status(401, "no".into()),
            Error::Unauthorized(_)
        ));
        assert!(matches!(
            Error::from_status(403, "no".into()),
            Error::Forbidden(_)
        ));
        assert!(matches!(
            Error::from_status(404, "gone".into()),
            Error::NotFound(_)
        ));
        assert!(matches!(
            Error::from_status(429, "slow down".into()),
            Error::RateLimited(_)
        ));
        assert!(matches!(
            Error::from_status(502, "bad gateway".into()),
            Error::Api { status: 502, .. }
        ));
    }

    #[test]
    fn test_raw_body() {
        let err = Error::from_status(404, r#"{"message":"Not Found"}"#.to_string());
        assert_eq!(err.raw_body(), Some(r#"{"message":"Not Found"}"#));
        assert_eq!(err.status(), Some(404));

        let empty = Error::from_status(500, String::new());
        assert_eq!(empty.raw_body(), None);
        assert_eq!(empty.status(), Some(500));

        let http = Error::Http("connection refused".to_string());
        assert_eq!(http.raw_body(), None);
        assert_eq!(http.status(), None);
    }

    #[test]
    fn test_display() {
        let err = Error::from_status(500, "boom".to_string());
        assert_eq!(err.to_string(), "API error: 500 - boom");
    }
}
