// iControl REST session
//
// Wraps `reqwest::Client` with target resolution (literal URL or
// structured parts), per-request signing through the attached
// authenticator, and status-to-error mapping. Payloads pass through
// untouched as JSON.

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::auth::{Auth, AuthStrategy, Authenticator, Credentials};
use crate::error::{self, Error};
use crate::response::Response;
use crate::token::TokenAuth;
use crate::transport::TransportConfig;
use crate::uri::{self, DEFAULT_PARTITION, Target};

/// Reason the device gives when basic credentials are rejected.
pub const BASIC_AUTH_REALM: &str = "F5 Authorization Required";

/// Everything needed to construct a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Device root, e.g. `https://10.0.0.1`.
    pub base_url: Url,
    pub credentials: Credentials,
    pub auth: AuthStrategy,
    /// `loginProviderName` sent with token requests.
    pub login_provider: Option<String>,
    /// Partition used when structured parts omit one.
    pub default_partition: String,
    pub transport: TransportConfig,
}

impl SessionConfig {
    pub fn new(base_url: Url, credentials: Credentials) -> Self {
        Self {
            base_url,
            credentials,
            auth: AuthStrategy::Basic,
            login_provider: None,
            default_partition: DEFAULT_PARTITION.into(),
            transport: TransportConfig::default(),
        }
    }

    pub fn with_auth(mut self, auth: AuthStrategy) -> Self {
        self.auth = auth;
        self
    }

    /// Shorthand for `with_auth(AuthStrategy::Token)`.
    pub fn with_token(self) -> Self {
        self.with_auth(AuthStrategy::Token)
    }

    pub fn with_login_provider(mut self, provider: impl Into<String>) -> Self {
        self.login_provider = Some(provider.into());
        self
    }

    pub fn with_default_partition(mut self, partition: impl Into<String>) -> Self {
        self.default_partition = partition.into();
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }
}

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub json: Option<serde_json::Value>,
    pub params: Vec<(String, String)>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// An authenticated session against one BIG-IP device.
///
/// Configuration is fixed at construction. The only mutable state is the
/// token cache inside the attached authenticator; each session owns its
/// authenticator exclusively.
pub struct Session {
    http: reqwest::Client,
    base_url: Url,
    auth: Auth,
    default_partition: String,
}

impl Session {
    /// Create a session, building its HTTP client from `config.transport`.
    pub fn new(config: SessionConfig) -> Result<Self, Error> {
        let http = config.transport.build_client()?;
        Ok(Self::with_client(http, config))
    }

    /// Create a session around a pre-built `reqwest::Client`.
    ///
    /// `config.transport` is ignored; the client's own settings apply.
    pub fn with_client(http: reqwest::Client, config: SessionConfig) -> Self {
        let auth = Auth::new(config.auth, config.credentials, config.login_provider);
        Self {
            http,
            base_url: config.base_url,
            auth,
            default_partition: config.default_partition,
        }
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// The token authenticator, if this session uses token auth.
    pub fn token_auth(&self) -> Option<&TokenAuth> {
        self.auth.as_token()
    }

    pub fn default_partition(&self) -> &str {
        &self.default_partition
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Verbs ────────────────────────────────────────────────────────

    pub async fn get(&self, target: impl Into<Target>) -> Result<Response, Error> {
        self.request(Method::GET, target, RequestOptions::default())
            .await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        target: impl Into<Target>,
        body: &B,
    ) -> Result<Response, Error> {
        let options = RequestOptions::default().json(serde_json::to_value(body)?);
        self.request(Method::POST, target, options).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        target: impl Into<Target>,
        body: &B,
    ) -> Result<Response, Error> {
        let options = RequestOptions::default().json(serde_json::to_value(body)?);
        self.request(Method::PUT, target, options).await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        target: impl Into<Target>,
        body: &B,
    ) -> Result<Response, Error> {
        let options = RequestOptions::default().json(serde_json::to_value(body)?);
        self.request(Method::PATCH, target, options).await
    }

    pub async fn delete(&self, target: impl Into<Target>) -> Result<Response, Error> {
        self.request(Method::DELETE, target, RequestOptions::default())
            .await
    }

    /// Send one request and map any non-2xx status to an error.
    ///
    /// The response body is returned as-is; nothing about its payload is
    /// interpreted here.
    pub async fn request(
        &self,
        method: Method,
        target: impl Into<Target>,
        options: RequestOptions,
    ) -> Result<Response, Error> {
        let target = target.into();
        let url = uri::resolve(&target, &self.base_url, &self.default_partition)?;
        debug!("{method} {url}");

        let mut builder = self.http.request(method, url).headers(options.headers);
        if !options.params.is_empty() {
            builder = builder.query(&options.params);
        }
        if let Some(ref body) = options.json {
            builder = builder.json(body);
        }

        let builder = self.auth.sign(&self.http, &self.base_url, builder).await?;
        let resp = Response::read(builder.send().await?).await?;

        if resp.status().is_success() {
            return Ok(resp);
        }
        Err(self.status_error(&resp).await)
    }

    async fn status_error(&self, resp: &Response) -> Error {
        let status = resp.status();
        let url = resp.url();
        let body = resp.text();
        debug!(status = status.as_u16(), "request to {url} failed");

        if status == StatusCode::UNAUTHORIZED {
            let message = match &self.auth {
                Auth::Basic(_) => format!("401 Client Error: {BASIC_AUTH_REALM} for uri: {url}"),
                Auth::Token(token) => {
                    // Device dropped the token; the next request fetches a new one.
                    token.invalidate().await;
                    error::status_message(status, url, &body)
                }
            };
            return Error::Authentication {
                status: Some(status.as_u16()),
                url: url.to_string(),
                message,
            };
        }

        Error::from_status(status, url, body)
    }
}
