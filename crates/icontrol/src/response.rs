use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::Error;

/// A fully-read HTTP response.
///
/// The session reads the body eagerly so the status check and the error
/// message can both see it. Payload interpretation is left to the caller.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    url: Url,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub(crate) async fn read(resp: reqwest::Response) -> Result<Self, Error> {
        let status = resp.status();
        let url = resp.url().clone();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;
        Ok(Self {
            status,
            url,
            headers,
            body,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Shorthand for `status().as_u16()`.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// The URL the request was finally sent to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Parse the body as JSON.
    ///
    /// Fails with [`Error::EmptyBody`] when there is nothing to parse, as
    /// with a successful DELETE.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if self.is_empty() {
            return Err(Error::EmptyBody);
        }
        serde_json::from_slice(&self.body).map_err(|e| {
            let body = self.text();
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn response(body: &'static str) -> Response {
        Response {
            status: StatusCode::OK,
            url: Url::parse("https://h/mgmt/tm/ltm/nat/").unwrap(),
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn empty_body_is_not_json() {
        let err = response("").json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, Error::EmptyBody));
    }

    #[test]
    fn non_json_body_keeps_raw_text() {
        let err = response("<html>oops</html>")
            .json::<serde_json::Value>()
            .unwrap_err();
        assert_eq!(err.body(), Some("<html>oops</html>"));
    }

    #[test]
    fn json_body_parses() {
        let value: serde_json::Value = response(r#"{"name":"foo"}"#).json().unwrap();
        assert_eq!(value["name"], "foo");
        assert_eq!(response("{}").status_code(), 200);
    }
}
