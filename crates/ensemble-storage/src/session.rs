//! Transport session to the storage service.
//!
//! The [`Transport`] trait is the seam between the stores and the network.
//! A transport sends a [`Request`] and hands back whatever status the
//! service answered with: a 404 or 500 is an `Ok(Response)`, not an error.
//! Interpreting the status is the job of [`crate::classify`], and deciding
//! whether to retry is the caller's. Transports never retry.
//!
//! [`HttpSession`] is the production transport, built on `reqwest`. It
//! resolves its [`Connection`] on first use and keeps the outcome, success
//! or failure, for the rest of its life.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;

use crate::config::{Connection, ConnectionSource, StorageConfig};
use crate::error::StorageError;

/// Header carrying the access token.
pub const TOKEN_HEADER: &str = "Token";

/// Content type of the tabular record encoding.
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Content type of JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

// ---------------------------------------------------------------------------
// Request / Response
// ---------------------------------------------------------------------------

/// HTTP verbs used against the storage service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Upper-case verb name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl core::fmt::Display for Method {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
        }
    }
}

/// A request body with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    /// Value of the `content-type` header.
    pub content_type: String,
    /// Raw bytes.
    pub bytes: Vec<u8>,
}

/// A request to the storage service, relative to its base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    path: String,
    params: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Body>,
    expected_status: u16,
}

impl Request {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            headers: Vec::new(),
            body: None,
            expected_status: 200,
        }
    }

    /// A `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// A `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// A `PUT` request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// A `DELETE` request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Add a query parameter.
    #[must_use]
    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.push((name.to_owned(), value.to_string()));
        self
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Attach a raw body.
    #[must_use]
    pub fn body(mut self, content_type: &str, bytes: Vec<u8>) -> Self {
        self.body = Some(Body {
            content_type: content_type.to_owned(),
            bytes,
        });
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if `value` cannot be encoded.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, StorageError> {
        let bytes = serde_json::to_vec(value)?;
        Ok(self.body(JSON_CONTENT_TYPE, bytes))
    }

    /// Status the caller expects; any other status is logged by the session.
    #[must_use]
    pub const fn expect(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    /// The HTTP verb.
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Path relative to the service base URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Value of the first query parameter named `name`.
    pub fn param_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Extra headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The body, if any.
    pub const fn body_ref(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// The status the caller expects.
    pub const fn expected_status(&self) -> u16 {
        self.expected_status
    }
}

/// Status and body returned by the storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Build a response.
    pub const fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// The body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if the body is not valid JSON
    /// for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, StorageError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Something that can carry a [`Request`] to the storage service.
///
/// Implementations return `Err` only when no status was obtained at all.
pub trait Transport: Send + Sync {
    /// Send a request and return the service's answer, whatever its status.
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, StorageError>> + Send;
}

// ---------------------------------------------------------------------------
// HttpSession
// ---------------------------------------------------------------------------

/// `reqwest`-backed transport with a lazily resolved connection.
///
/// Construct one per process and pass it by reference to the stores.
pub struct HttpSession {
    client: reqwest::Client,
    source: ConnectionSource,
    connection: OnceCell<Result<Connection, String>>,
}

impl HttpSession {
    /// Create a session. The connection is not resolved until the first
    /// request.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the HTTP client cannot be built.
    pub fn new(source: ConnectionSource, request_timeout: Duration) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| StorageError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            source,
            connection: OnceCell::new(),
        })
    }

    /// Create a session from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the HTTP client cannot be built.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        Self::new(config.connection.clone(), config.request_timeout)
    }

    /// The resolved connection, resolving it on first call.
    ///
    /// A failed resolution is remembered; every later call fails the same way.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the connection cannot be resolved.
    pub async fn connection(&self) -> Result<&Connection, StorageError> {
        let resolved = self
            .connection
            .get_or_init(|| async {
                let result = self.source.resolve().map_err(|e| e.to_string());
                match &result {
                    Ok(conn) => tracing::info!(base_url = conn.base_url, "Resolved storage connection"),
                    Err(e) => tracing::error!(error = e.as_str(), "Failed to resolve storage connection"),
                }
                result
            })
            .await;
        resolved
            .as_ref()
            .map_err(|e| StorageError::Config(e.clone()))
    }
}

impl Transport for HttpSession {
    async fn send(&self, request: Request) -> Result<Response, StorageError> {
        let connection = self.connection().await?;
        let Request {
            method,
            path,
            params,
            headers,
            body,
            expected_status,
        } = request;

        let url = format!("{}/{}", connection.base_url, path.trim_start_matches('/'));
        let mut builder = self
            .client
            .request(method.into(), &url)
            .query(&params)
            .header(TOKEN_HEADER, connection.token.as_str());
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, body.content_type)
                .body(body.bytes);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| StorageError::Transport(format!("{method} {path} failed: {e}")))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Transport(format!("{method} {path} body read failed: {e}")))?;
        let response = Response::new(status, bytes.to_vec());

        if status == expected_status {
            tracing::debug!(%method, path, status, "Storage request completed");
        } else {
            tracing::error!(
                %method,
                path,
                status,
                response = response.text(),
                "Unexpected status from storage service"
            );
        }

        Ok(response)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_collects_parts() {
        let request = Request::post("ensembles/x/records/r/matrix")
            .param("realization_index", 4)
            .header("accept", CSV_CONTENT_TYPE)
            .body(CSV_CONTENT_TYPE, b",0\n4,1.0\n".to_vec());
        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.param_value("realization_index"), Some("4"));
        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.expected_status(), 200);
        assert_eq!(
            request.body_ref().map(|b| b.content_type.as_str()),
            Some(CSV_CONTENT_TYPE)
        );
    }

    #[test]
    fn json_body_is_tagged() {
        let request = Request::put("p").json(&serde_json::json!({"a": 1})).unwrap();
        let body = request.body_ref().unwrap();
        assert_eq!(body.content_type, JSON_CONTENT_TYPE);
        assert_eq!(body.bytes, br#"{"a":1}"#.to_vec());
    }

    #[test]
    fn response_json_and_text() {
        let response = Response::new(200, br#"["a","b"]"#.to_vec());
        let names: Vec<String> = response.json().unwrap();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(response.text(), r#"["a","b"]"#);
    }

    #[tokio::test]
    async fn failed_resolution_is_sticky() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = dir.path().join("storage_server.json");
        let session = HttpSession::new(
            ConnectionSource::File(descriptor.clone()),
            Duration::from_secs(1),
        )
        .unwrap();
        let first = session.send(Request::get("experiments")).await;
        assert!(matches!(first, Err(StorageError::Config(_))));

        // The service comes up after the first attempt; the session keeps
        // the original failure instead of re-reading the file.
        std::fs::write(
            &descriptor,
            r#"{"urls": ["http://127.0.0.1:9"], "authtoken": "tok"}"#,
        )
        .unwrap();
        let second = session.send(Request::get("experiments")).await;
        assert!(matches!(second, Err(StorageError::Config(_))));
        assert_eq!(first.unwrap_err().to_string(), second.unwrap_err().to_string());
    }
}
