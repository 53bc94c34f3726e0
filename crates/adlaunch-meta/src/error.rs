//! Graph API error type
//!
//! Upstream failures keep the structured error fields Meta returns
//! (`code`, `error_subcode`, `type`) alongside the human-readable message so
//! outcome classification can key off codes first and fall back to text.

use thiserror::Error;

/// Errors from the Meta Graph API surface.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Structured platform error parsed from a Graph `{"error": {...}}` body.
    #[error("Graph API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        error_type: Option<String>,
        code: Option<i64>,
        error_subcode: Option<i64>,
        fbtrace_id: Option<String>,
    },

    /// Non-2xx response whose body was not a Graph error object.
    #[error("HTTP {status} from Graph API: {body}")]
    Http { status: u16, body: String },

    /// Connection/timeout failures before a response arrived.
    #[error("Transport error: {0}")]
    Transport(String),

    /// 2xx response whose body did not match the expected shape.
    #[error("Invalid Graph API response: {0}")]
    InvalidResponse(String),
}

impl GraphError {
    /// HTTP status of the failure, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            GraphError::Api { status, .. } | GraphError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 4xx responses are non-retryable: the request itself is wrong.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(s) if (400..500).contains(&s))
    }

    /// 5xx and transport failures may succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            GraphError::Transport(_) => true,
            _ => matches!(self.status(), Some(s) if s >= 500),
        }
    }

    pub fn api_code(&self) -> Option<i64> {
        match self {
            GraphError::Api { code, .. } => *code,
            _ => None,
        }
    }

    pub fn api_subcode(&self) -> Option<i64> {
        match self {
            GraphError::Api { error_subcode, .. } => *error_subcode,
            _ => None,
        }
    }

    pub fn api_error_type(&self) -> Option<&str> {
        match self {
            GraphError::Api { error_type, .. } => error_type.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        GraphError::Transport(err.to_string())
    }
}
