use std::fmt;
use std::future::Future;
use std::str::FromStr;

use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::Error;
use crate::token::TokenAuth;

/// Which authentication strategy a session uses.
///
/// Marker enum (no data) -- the actual credentials live in [`Credentials`].
/// Useful for branching on auth flow without carrying secret material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStrategy {
    /// HTTP basic credentials on every request.
    #[default]
    Basic,
    /// `X-F5-Auth-Token` header, fetched from the login endpoint and cached.
    Token,
}

impl fmt::Display for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Basic => "basic",
            Self::Token => "token",
        })
    }
}

impl FromStr for AuthStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "token" => Ok(Self::Token),
            other => Err(format!("expected 'basic' or 'token', got '{other}'")),
        }
    }
}

/// Username and password for a BIG-IP account.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Stamps outgoing requests with credentials.
///
/// `sign` receives the session's HTTP client and base URL so strategies
/// that need a side request (the token fetch) can make one before the
/// data request goes out.
pub trait Authenticator: Send + Sync {
    fn sign(
        &self,
        http: &reqwest::Client,
        base_url: &Url,
        request: RequestBuilder,
    ) -> impl Future<Output = Result<RequestBuilder, Error>> + Send;
}

/// HTTP basic authentication.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    credentials: Credentials,
}

impl BasicAuth {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }
}

impl Authenticator for BasicAuth {
    async fn sign(
        &self,
        _http: &reqwest::Client,
        _base_url: &Url,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, Error> {
        Ok(request.basic_auth(
            &self.credentials.username,
            Some(self.credentials.password.expose_secret()),
        ))
    }
}

/// The authenticator attached to a session.
#[derive(Debug)]
pub enum Auth {
    Basic(BasicAuth),
    Token(TokenAuth),
}

impl Auth {
    /// Build the authenticator for `strategy`.
    ///
    /// `login_provider` is only meaningful for token auth; basic auth
    /// ignores it.
    pub fn new(strategy: AuthStrategy, credentials: Credentials, login_provider: Option<String>) -> Self {
        match strategy {
            AuthStrategy::Basic => Self::Basic(BasicAuth::new(credentials)),
            AuthStrategy::Token => {
                let auth = TokenAuth::new(credentials);
                Self::Token(match login_provider {
                    Some(provider) => auth.with_login_provider(provider),
                    None => auth,
                })
            }
        }
    }

    pub fn strategy(&self) -> AuthStrategy {
        match self {
            Self::Basic(_) => AuthStrategy::Basic,
            Self::Token(_) => AuthStrategy::Token,
        }
    }

    /// The token authenticator, when the session uses one.
    pub fn as_token(&self) -> Option<&TokenAuth> {
        match self {
            Self::Token(auth) => Some(auth),
            Self::Basic(_) => None,
        }
    }
}

impl Authenticator for Auth {
    async fn sign(
        &self,
        http: &reqwest::Client,
        base_url: &Url,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, Error> {
        match self {
            Self::Basic(auth) => auth.sign(http, base_url, request).await,
            Self::Token(auth) => auth.sign(http, base_url, request).await,
        }
    }
}
