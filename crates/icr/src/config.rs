//! CLI configuration: a thin wrapper around `icontrol_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--host, --username, --auth, etc.) on top of profile values.

use std::time::Duration;

use secrecy::SecretString;

use icontrol::{Credentials, SessionConfig, TlsMode, TransportConfig};
use icontrol_config::{Config, Profile};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `SessionConfig` from the config file, profile, and CLI overrides.
pub fn build_session_config(global: &GlobalOpts) -> Result<SessionConfig, CliError> {
    let cfg = icontrol_config::load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    match cfg.profiles.get(&profile_name) {
        Some(profile) => resolve_profile(profile, &profile_name, &cfg, global),
        None => from_flags(global, &profile_name),
    }
}

/// Translate a `Profile` + global flags into a `SessionConfig`.
///
/// CLI flag overrides take priority over profile values.
fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<SessionConfig, CliError> {
    // 1. Credentials (flag > profile chain)
    let username = match global.username {
        Some(ref username) => username.clone(),
        None => icontrol_config::resolve_username(profile, profile_name)?,
    };
    let password = match global.password {
        Some(ref password) => SecretString::from(password.clone()),
        None => icontrol_config::resolve_password(profile, profile_name)?,
    };
    let credentials = Credentials { username, password };

    // 2. Profile settings
    let mut config =
        icontrol_config::session_config_with_credentials(profile, &cfg.defaults, credentials)?;

    // 3. Host (flag > profile)
    if let Some(ref host) = global.host {
        config.base_url = icontrol_config::parse_host(host)?;
    }

    apply_overrides(&mut config, global);
    Ok(config)
}

/// Build a `SessionConfig` from flags / env vars alone.
fn from_flags(global: &GlobalOpts, profile_name: &str) -> Result<SessionConfig, CliError> {
    let host = global.host.as_deref().ok_or_else(|| CliError::NoConfig {
        path: icontrol_config::config_path().display().to_string(),
    })?;
    let base_url = icontrol_config::parse_host(host)?;

    let (Some(username), Some(password)) = (global.username.clone(), global.password.clone())
    else {
        return Err(CliError::NoCredentials {
            profile: profile_name.into(),
        });
    };
    let credentials = Credentials::new(username, SecretString::from(password));

    let mut config = SessionConfig::new(base_url, credentials)
        .with_transport(TransportConfig::default().with_tls(TlsMode::System));
    apply_overrides(&mut config, global);
    Ok(config)
}

fn apply_overrides(config: &mut SessionConfig, global: &GlobalOpts) {
    if let Some(mode) = global.auth {
        config.auth = mode.into();
    }
    if let Some(ref provider) = global.login_provider {
        config.login_provider = Some(provider.clone());
    }
    if let Some(ref partition) = global.default_partition {
        config.default_partition.clone_from(partition);
    }
    if global.insecure {
        config.transport.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.transport.timeout = Duration::from_secs(secs);
    }
}
