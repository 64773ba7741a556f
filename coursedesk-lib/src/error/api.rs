//! API error types

use std::time::Duration;

/// Errors that can occur during API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-success HTTP response from the backend.
    ///
    /// Validation and business errors (4xx with a message body) arrive here
    /// untouched so the calling form can show them.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message, taken from the body's `message` field when present.
        message: String,
        /// Parsed response body, if it was JSON.
        body: Option<serde_json::Value>,
    },

    /// Network error reported by the HTTP client.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Transport failure that did not come from `reqwest`.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request timed out.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Failed to parse API response.
    #[error("Response parse error: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
        /// Raw response body, if available.
        body: Option<String>,
    },
}

impl ApiError {
    /// Creates an HTTP error from a status code and raw body.
    ///
    /// The message is lifted from a JSON `message` (or `error`) field when the
    /// body has one, otherwise the raw text is used.
    pub fn from_response(status: u16, raw: &[u8]) -> Self {
        let body: Option<serde_json::Value> = serde_json::from_slice(raw).ok();
        let message = body
            .as_ref()
            .and_then(|b| b.get("message").or_else(|| b.get("error")))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| String::from_utf8_lossy(raw).into_owned());

        Self::Http {
            status,
            message,
            body,
        }
    }

    /// Creates a new parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: None,
        }
    }

    /// Creates a new parse error with the raw response body.
    pub fn parse_with_body(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: Some(body.into()),
        }
    }

    /// Returns the HTTP status code if this is an HTTP error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the parsed error body if the server sent one.
    pub fn body(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_lifted_from_json_body() {
        let err = ApiError::from_response(422, br#"{"message":"Email already taken"}"#);
        assert_eq!(err.status_code(), Some(422));
        assert_eq!(err.to_string(), "HTTP 422: Email already taken");
        assert!(err.body().is_some());
    }

    #[test]
    fn test_plain_text_body() {
        let err = ApiError::from_response(502, b"Bad Gateway");
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
        assert!(err.body().is_none());
    }
}
