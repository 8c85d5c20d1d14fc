use thiserror::Error;

pub const CONNECTION_MESSAGE: &str = "Please check your internet connection and try again.";
pub const LOGIN_MESSAGE: &str = "Please login to continue.";
pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors returned by the marketplace API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No usable response: connection failure, TLS failure or the request timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 401. Callers turn this into the login prompt, never a bare error.
    #[error("authentication required")]
    Unauthorized,

    /// Any other non-2xx status, or a 2xx envelope with `"success": false`.
    #[error("API error (status {status}): {message:?}")]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ClientError {
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    /// `true` when no response was received at all.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.status().is_none())
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized => Some(401),
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Text suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Http(e) if e.status().is_none() => CONNECTION_MESSAGE.to_string(),
            ClientError::Unauthorized => LOGIN_MESSAGE.to_string(),
            ClientError::Api {
                message: Some(m), ..
            } if !m.trim().is_empty() => m.clone(),
            _ => GENERIC_MESSAGE.to_string(),
        }
    }
}
