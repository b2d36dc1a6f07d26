//! CLI error types with miette diagnostics.
//!
//! Maps `icontrol::Error` and `ConfigError` variants into user-facing
//! errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use icontrol_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to device at {url}")]
    #[diagnostic(
        code(icr::connection_failed),
        help(
            "Check that the device management address is reachable.\n\
             URL: {url}\n\
             Self-signed certificate? Try: icr --insecure ..."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(icr::tls_error),
        help("Use --insecure (-k) to accept self-signed certificates, or set ca_cert in your profile.")
    )]
    TlsError { message: String },

    #[error("Request timed out: {url}")]
    #[diagnostic(
        code(icr::timeout),
        help("Increase timeout with --timeout or check device responsiveness.")
    )]
    Timeout { url: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(icr::auth_failed),
        help("Verify the username and password, or try --auth basic / --auth token.")
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(icr::no_credentials),
        help("Pass --username/--password or set ICONTROL_USERNAME and ICONTROL_PASSWORD.")
    )]
    NoCredentials { profile: String },

    // ── Responses ────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(icr::not_found))]
    NotFound { message: String },

    #[error("{message}")]
    #[diagnostic(code(icr::http_error))]
    Http { status: u16, message: String },

    #[error("Unexpected response body: {message}")]
    #[diagnostic(code(icr::invalid_response))]
    InvalidResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(icr::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No device configured")]
    #[diagnostic(
        code(icr::no_config),
        help(
            "Pass --host, set ICONTROL_HOST, or add a profile to\n\
             {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(icr::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(icr::json), help("Check the JSON body and try again."))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::Json(_) | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Library error mapping ────────────────────────────────────────────

impl From<icontrol::Error> for CliError {
    fn from(err: icontrol::Error) -> Self {
        match err {
            icontrol::Error::Authentication { message, .. } => Self::AuthFailed { message },

            icontrol::Error::Http {
                status: 404,
                message,
                ..
            } => Self::NotFound { message },

            icontrol::Error::Http {
                status, message, ..
            } => Self::Http { status, message },

            icontrol::Error::Transport(e) => {
                let url = e.url().map(ToString::to_string).unwrap_or_default();
                if e.is_timeout() {
                    Self::Timeout { url }
                } else {
                    Self::ConnectionFailed {
                        url,
                        source: Box::new(e),
                    }
                }
            }

            icontrol::Error::Tls(message) => Self::TlsError { message },

            icontrol::Error::InvalidUri { message } => Self::Validation {
                field: "target".into(),
                reason: message,
            },

            icontrol::Error::InvalidUrl(e) => Self::Validation {
                field: "target".into(),
                reason: e.to_string(),
            },

            icontrol::Error::Serialization(e) => Self::Json(e),

            err @ (icontrol::Error::EmptyBody | icontrol::Error::Deserialization { .. }) => {
                Self::InvalidResponse {
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Io(e) => Self::Io(e),
            ConfigError::Serialization(e) => Self::Validation {
                field: "config".into(),
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_errors_map_to_exit_codes() {
        let auth: CliError = icontrol::Error::Authentication {
            status: Some(401),
            url: "https://h/mgmt/shared/authn/login".into(),
            message: "Authentication required!".into(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_code::AUTH);
        assert_eq!(auth.to_string(), "Authentication required!");

        let missing: CliError = icontrol::Error::Http {
            status: 404,
            reason: "Not Found".into(),
            url: "https://h/mgmt/tm/bogus".into(),
            message: "404 Unexpected Error: Not Found for uri: https://h/mgmt/tm/bogus".into(),
            body: String::new(),
        }
        .into();
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);

        let bad_uri: CliError = icontrol::Error::InvalidUri {
            message: "name is required".into(),
        }
        .into();
        assert_eq!(bad_uri.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn config_errors_map() {
        let err: CliError = ConfigError::NoCredentials {
            profile: "lab".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn missing_host_is_usage_error() {
        let err = CliError::NoConfig {
            path: "/tmp/config.toml".into(),
        };
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
