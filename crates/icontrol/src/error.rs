use thiserror::Error;

/// Top-level error type for the `icontrol` crate.
///
/// Every failure a [`Session`](crate::Session) can surface: rejected
/// credentials, non-success HTTP responses, body parsing, URI building,
/// and the transport itself. The `Display` text of the HTTP-facing
/// variants is the message callers match on, so it is kept stable.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Credentials or token rejected by the device.
    ///
    /// Raised for a rejected token fetch and for any `401` on a data
    /// request. Never retried internally.
    #[error("{message}")]
    Authentication {
        status: Option<u16>,
        url: String,
        message: String,
    },

    // ── HTTP ────────────────────────────────────────────────────────
    /// Non-success response from a data request.
    #[error("{message}")]
    Http {
        status: u16,
        reason: String,
        url: String,
        message: String,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// The response carried no body to parse (e.g. after a DELETE).
    #[error("response body is empty")]
    EmptyBody,

    /// A request body could not be serialized to JSON.
    #[error("failed to serialize request body: {0}")]
    Serialization(#[from] serde_json::Error),

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Addressing ──────────────────────────────────────────────────
    /// Structured URI parts could not be composed into a resource path.
    #[error("Invalid URI parts: {message}")]
    InvalidUri { message: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),
}

impl Error {
    /// HTTP status carried by the error, if the device answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } => *status,
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if the device rejected the credentials or token.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    /// `Http` error for a non-success response that is not an auth rejection.
    pub(crate) fn from_status(status: reqwest::StatusCode, url: &url::Url, body: String) -> Self {
        Self::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
            url: url.to_string(),
            message: status_message(status, url, &body),
            body,
        }
    }

    /// The device's raw response body, when one was captured.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Http { body, .. } | Self::Deserialization { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Error bodies from the device: `{"code": 404, "message": "...", "errorStack": []}`.
#[derive(serde::Deserialize)]
struct DeviceError {
    message: Option<String>,
}

/// Human-readable message for a non-success response.
///
/// A structured `message` from the device wins. Otherwise the message is
/// composed from the status line and URL, with the raw body appended.
pub(crate) fn status_message(status: reqwest::StatusCode, url: &url::Url, body: &str) -> String {
    if let Ok(DeviceError {
        message: Some(message),
    }) = serde_json::from_str::<DeviceError>(body)
    {
        if !message.is_empty() {
            return message;
        }
    }

    let reason = status.canonical_reason().unwrap_or("Unknown Status");
    let mut message = format!("{} Unexpected Error: {reason} for uri: {url}", status.as_u16());
    let body = body.trim();
    if !body.is_empty() {
        let preview: String = body.chars().take(500).collect();
        message.push_str(&format!("\nText: {preview:?}"));
    }
    message
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn device_message_is_used_verbatim() {
        let url = url::Url::parse("https://h/mgmt/shared/authn/login").unwrap();
        let body = r#"{"code":401,"message":"Authentication required!","errorStack":[]}"#;
        assert_eq!(
            status_message(reqwest::StatusCode::UNAUTHORIZED, &url, body),
            "Authentication required!"
        );
    }

    #[test]
    fn composed_message_names_reason_and_uri() {
        let url = url::Url::parse("https://h/mgmt/tm/bogus").unwrap();
        let message = status_message(reqwest::StatusCode::NOT_FOUND, &url, "");
        assert_eq!(message, "404 Unexpected Error: Not Found for uri: https://h/mgmt/tm/bogus");

        let message = status_message(reqwest::StatusCode::BAD_GATEWAY, &url, "<html>down</html>");
        assert!(message.starts_with("502 Unexpected Error: Bad Gateway for uri: https://h/mgmt/tm/bogus"));
        assert!(message.ends_with("Text: \"<html>down</html>\""));
    }

    #[test]
    fn http_error_displays_composed_message() {
        let err = Error::Http {
            status: 404,
            reason: "Not Found".into(),
            url: "https://h/mgmt/tm/bogus".into(),
            message: "404 Unexpected Error: Not Found for uri: https://h/mgmt/tm/bogus".into(),
            body: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "404 Unexpected Error: Not Found for uri: https://h/mgmt/tm/bogus"
        );
        assert!(err.is_not_found());
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn auth_error_reports_status() {
        let err = Error::Authentication {
            status: Some(401),
            url: "https://h/mgmt/shared/authn/login".into(),
            message: "Authentication required!".into(),
        };
        assert_eq!(err.status(), Some(401));
        assert!(err.is_auth_failure());
        assert!(!err.is_transient());
    }

    #[test]
    fn gateway_errors_are_transient() {
        let err = Error::Http {
            status: 503,
            reason: "Service Unavailable".into(),
            url: "https://h/mgmt/tm/sys".into(),
            message: String::new(),
            body: String::new(),
        };
        assert!(err.is_transient());
        assert_eq!(err.body(), Some(""));
    }
}
