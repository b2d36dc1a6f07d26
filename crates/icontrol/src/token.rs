// Token authentication
//
// Fetches an `X-F5-Auth-Token` from the login endpoint, caches it, and
// renews it lazily once it has expired. Expiry is checked on each sign,
// never by a timer.

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{RequestBuilder, StatusCode};
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::{Authenticator, Credentials};
use crate::error::{self, Error};

/// Login endpoint that issues tokens.
pub const LOGIN_PATH: &str = "/mgmt/shared/authn/login";

/// Header carrying the token on signed requests.
pub const TOKEN_HEADER: &str = "X-F5-Auth-Token";

#[derive(Deserialize)]
struct LoginResponse {
    token: Option<IssuedToken>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssuedToken {
    token: Option<String>,
    expiration_micros: Option<i64>,
    last_update_micros: Option<i64>,
    timeout: Option<i64>,
}

impl IssuedToken {
    /// Local expiry for this token.
    ///
    /// The device clock may disagree with ours, so when both timestamps
    /// are present only their difference is used, applied to `now`.
    ///
    /// Out-of-range values yield `None` rather than overflowing.
    fn expiration(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match (self.expiration_micros, self.last_update_micros, self.timeout) {
            (Some(expires), Some(issued), _) if expires > issued => expires
                .checked_sub(issued)
                .map(TimeDelta::microseconds)
                .and_then(|lifetime| now.checked_add_signed(lifetime)),
            (_, _, Some(secs)) if secs > 0 => {
                TimeDelta::try_seconds(secs).and_then(|lifetime| now.checked_add_signed(lifetime))
            }
            (Some(expires), _, _) => DateTime::from_timestamp_micros(expires),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct TokenState {
    token: Option<SecretString>,
    expiration: Option<DateTime<Utc>>,
    attempts: u32,
}

impl TokenState {
    /// A token expiring exactly at `now` counts as expired.
    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.token.is_some() && self.expiration.is_some_and(|expires| now < expires)
    }

    fn clear(&mut self) {
        self.token = None;
        self.expiration = None;
    }
}

/// Token-based authenticator.
///
/// Holds the credentials used to obtain tokens plus the cached token
/// state. The state lock is held across a fetch, so concurrent signers on
/// one session wait for a single fetch instead of racing.
#[derive(Debug)]
pub struct TokenAuth {
    credentials: Credentials,
    login_provider: Option<String>,
    state: Mutex<TokenState>,
}

impl TokenAuth {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            login_provider: None,
            state: Mutex::new(TokenState::default()),
        }
    }

    /// Send `loginProviderName` with token requests (e.g. `tmos`).
    pub fn with_login_provider(mut self, provider: impl Into<String>) -> Self {
        self.login_provider = Some(provider.into());
        self
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    /// Number of token fetches performed, rejected ones included.
    pub async fn attempts(&self) -> u32 {
        self.state.lock().await.attempts
    }

    /// Expiry of the cached token, if one has been fetched.
    pub async fn expiration(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.expiration
    }

    /// Override the cached token's expiry.
    ///
    /// Setting a past instant forces a fetch on the next request.
    pub async fn set_expiration(&self, expiration: DateTime<Utc>) {
        self.state.lock().await.expiration = Some(expiration);
    }

    pub async fn has_token(&self) -> bool {
        self.state.lock().await.token.is_some()
    }

    /// Drop the cached token so the next request fetches a new one.
    pub async fn invalidate(&self) {
        self.state.lock().await.clear();
    }

    /// Return a currently-valid token, fetching one if none is cached or
    /// the cached one has expired.
    pub async fn ensure_valid_token(
        &self,
        http: &reqwest::Client,
        base_url: &Url,
    ) -> Result<SecretString, Error> {
        let mut state = self.state.lock().await;

        if state.is_valid_at(Utc::now()) {
            if let Some(token) = state.token.as_ref() {
                trace!("reusing cached auth token");
                return Ok(token.clone());
            }
        }

        state.attempts += 1;
        match self.fetch(http, base_url).await {
            Ok((token, expiration)) => {
                debug!(attempts = state.attempts, %expiration, "auth token acquired");
                state.token = Some(token.clone());
                state.expiration = Some(expiration);
                Ok(token)
            }
            Err(e) => {
                warn!(attempts = state.attempts, "auth token request failed");
                state.clear();
                Err(e)
            }
        }
    }

    async fn fetch(
        &self,
        http: &reqwest::Client,
        base_url: &Url,
    ) -> Result<(SecretString, DateTime<Utc>), Error> {
        let url = base_url.join(LOGIN_PATH)?;
        debug!("requesting auth token at {url}");

        let mut body = json!({
            "username": self.credentials.username,
            "password": self.credentials.password.expose_secret(),
        });
        if let Some(ref provider) = self.login_provider {
            body["loginProviderName"] = json!(provider);
        }

        let resp = http.post(url.clone()).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        // 5xx and 429 stay HTTP errors so callers can retry them.
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(Error::Authentication {
                status: Some(status.as_u16()),
                url: url.to_string(),
                message: error::status_message(status, &url, &text),
            });
        }
        if !status.is_success() {
            return Err(Error::from_status(status, &url, text));
        }

        let login: LoginResponse = serde_json::from_str(&text).map_err(|e| Error::Deserialization {
            message: format!("malformed token response: {e}"),
            body: text.clone(),
        })?;

        let issued = login.token.ok_or_else(|| missing(&url, "token response carried no token"))?;
        let expiration = issued
            .expiration(Utc::now())
            .ok_or_else(|| missing(&url, "token response carried no expiration"))?;
        let token = issued
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| missing(&url, "token response carried no token"))?;

        Ok((SecretString::from(token), expiration))
    }
}

fn missing(url: &Url, message: &str) -> Error {
    Error::Authentication {
        status: None,
        url: url.to_string(),
        message: message.to_owned(),
    }
}

impl Authenticator for TokenAuth {
    async fn sign(
        &self,
        http: &reqwest::Client,
        base_url: &Url,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, Error> {
        let token = self.ensure_valid_token(http, base_url).await?;
        let mut value = HeaderValue::from_str(token.expose_secret()).map_err(|e| Error::Authentication {
            status: None,
            url: base_url.to_string(),
            message: format!("token is not a valid header value: {e}"),
        })?;
        value.set_sensitive(true);
        Ok(request.header(TOKEN_HEADER, value))
    }
}
