//! Configuration for iControl REST sessions.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `icontrol::SessionConfig`. The `icr` binary adds
//! flag-aware wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use icontrol::{AuthStrategy, Credentials, SessionConfig, TlsMode, TransportConfig};

/// Env var prefix for config overrides, e.g. `ICONTROL_DEFAULTS__TIMEOUT=60`.
pub const ENV_PREFIX: &str = "ICONTROL_";

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "icontrol";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_partition")]
    pub partition: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
            partition: default_partition(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_partition() -> String {
    icontrol::DEFAULT_PARTITION.into()
}
fn default_true() -> bool {
    true
}

/// A named BIG-IP profile.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Profile {
    /// Device host or base URL ("10.0.0.1" or "https://10.0.0.1:8443").
    pub host: String,

    /// Account name.
    pub username: Option<String>,

    /// Password in plaintext. Prefer `password_env` or the keyring.
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Look the password up in the system keyring.
    #[serde(default = "default_true")]
    pub keyring: bool,

    /// Auth mode: "basic" or "token".
    #[serde(default)]
    pub auth: Option<String>,

    /// `loginProviderName` for token requests (e.g. "tmos").
    pub login_provider: Option<String>,

    /// Partition used when a request names none.
    pub partition: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "icontrol", "icontrol").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("icontrol");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, layered as defaults < file < environment.
///
/// A missing file is not an error; figment simply skips it.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the username: profile value, then `ICONTROL_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var("ICONTROL_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve the password through the credential chain.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Global env var
    if let Ok(pw) = std::env::var("ICONTROL_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if profile.keyring {
        if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
            if let Ok(pw) = entry.get_password() {
                return Ok(SecretString::from(pw));
            }
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve username + password for a profile.
pub fn resolve_credentials(profile: &Profile, profile_name: &str) -> Result<Credentials, ConfigError> {
    let username = resolve_username(profile, profile_name)?;
    let password = resolve_password(profile, profile_name)?;
    Ok(Credentials { username, password })
}

/// Parse the profile's auth mode; basic when unset.
pub fn resolve_auth(profile: &Profile) -> Result<AuthStrategy, ConfigError> {
    profile
        .auth
        .as_deref()
        .map_or(Ok(AuthStrategy::Basic), str::parse)
        .map_err(|reason| ConfigError::Validation {
            field: "auth".into(),
            reason,
        })
}

/// Turn a host or URL into a base URL, defaulting to `https://`.
pub fn parse_host(host: &str) -> Result<url::Url, ConfigError> {
    let raw = if host.contains("://") {
        host.to_owned()
    } else {
        format!("https://{host}")
    };
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "host".into(),
        reason: format!("invalid URL: {host}"),
    })?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("missing host: {host}"),
        });
    }
    Ok(url)
}

/// Build a `SessionConfig` from a profile, with `defaults` filling gaps.
pub fn profile_to_session_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<SessionConfig, ConfigError> {
    let credentials = resolve_credentials(profile, profile_name)?;
    session_config_with_credentials(profile, defaults, credentials)
}

/// Like [`profile_to_session_config`], with credentials supplied by the caller.
pub fn session_config_with_credentials(
    profile: &Profile,
    defaults: &Defaults,
    credentials: Credentials,
) -> Result<SessionConfig, ConfigError> {
    let base_url = parse_host(&profile.host)?;
    let auth = resolve_auth(profile)?;

    let mut config = SessionConfig::new(base_url, credentials)
        .with_auth(auth)
        .with_default_partition(profile.partition.as_deref().unwrap_or(&defaults.partition))
        .with_transport(profile_transport(profile, defaults));
    if let Some(ref provider) = profile.login_provider {
        config = config.with_login_provider(provider.clone());
    }
    Ok(config)
}

/// TLS and timeout settings for a profile.
pub fn profile_transport(profile: &Profile, defaults: &Defaults) -> TransportConfig {
    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    TransportConfig::default().with_tls(tls).with_timeout(timeout)
}
