//! Configuration for the storage client.
//!
//! All configuration is loaded from environment variables. The client needs
//! to know which workspace it serves (for the reserved experiment name),
//! where the storage service lives, which token to present, and how long a
//! single request may take.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::StorageError;

/// Default per-request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Address and credential of a running storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Base URL without a trailing slash (e.g. `http://127.0.0.1:51820`).
    pub base_url: String,
    /// Value sent in the `Token` header on every request.
    pub token: String,
}

impl Connection {
    /// Create a connection, normalizing the base URL.
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
        }
    }

    /// Parse a JSON connection descriptor as written by the service on start.
    ///
    /// The descriptor lists one or more URLs and the auth token; the first
    /// URL is used:
    ///
    /// ```json
    /// {"urls": ["http://127.0.0.1:51820"], "authtoken": "secret"}
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the JSON is malformed, the URL
    /// list is empty, or the token is absent.
    pub fn from_descriptor(json: &str) -> Result<Self, StorageError> {
        let descriptor: ConnectionDescriptor = serde_json::from_str(json)
            .map_err(|e| StorageError::Config(format!("invalid connection descriptor: {e}")))?;
        let url = descriptor
            .urls
            .first()
            .ok_or_else(|| StorageError::Config("connection descriptor lists no urls".to_owned()))?;
        let token = descriptor
            .authtoken
            .ok_or_else(|| StorageError::Config("connection descriptor has no authtoken".to_owned()))?;
        Ok(Self::new(url, &token))
    }
}

/// On-disk / environment form of a [`Connection`].
#[derive(Debug, Deserialize)]
struct ConnectionDescriptor {
    #[serde(default)]
    urls: Vec<String>,
    authtoken: Option<String>,
}

/// Where a session finds its [`Connection`] on first use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionSource {
    /// A connection known up front.
    Fixed(Connection),
    /// Environment variables, read at resolution time.
    ///
    /// `ENSEMBLE_STORAGE_CONNECTION` (a JSON descriptor) takes precedence
    /// over the pair `ENSEMBLE_STORAGE_URL` / `ENSEMBLE_STORAGE_TOKEN`.
    Environment,
    /// A JSON descriptor file.
    File(PathBuf),
}

impl ConnectionSource {
    /// Resolve the connection.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the source is incomplete or
    /// unreadable.
    pub fn resolve(&self) -> Result<Connection, StorageError> {
        match self {
            Self::Fixed(connection) => Ok(connection.clone()),
            Self::Environment => resolve_from(|name| std::env::var(name).ok()),
            Self::File(path) => {
                let json = std::fs::read_to_string(path).map_err(|e| {
                    StorageError::Config(format!(
                        "cannot read connection file {}: {e}",
                        path.display()
                    ))
                })?;
                Connection::from_descriptor(&json)
            }
        }
    }
}

/// Resolve a connection from a variable lookup.
fn resolve_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Connection, StorageError> {
    if let Some(json) = lookup("ENSEMBLE_STORAGE_CONNECTION") {
        return Connection::from_descriptor(&json);
    }
    let url = lookup("ENSEMBLE_STORAGE_URL").ok_or_else(|| {
        StorageError::Config(
            "missing ENSEMBLE_STORAGE_CONNECTION or ENSEMBLE_STORAGE_URL".to_owned(),
        )
    })?;
    let token = lookup("ENSEMBLE_STORAGE_TOKEN")
        .ok_or_else(|| StorageError::Config("missing ENSEMBLE_STORAGE_TOKEN".to_owned()))?;
    Ok(Connection::new(&url, &token))
}

/// Complete client configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Workspace root; prefixes the reserved experiment name.
    pub workspace: PathBuf,
    /// Where the session resolves its connection.
    pub connection: ConnectionSource,
    /// Upper bound on a single request, connect through body.
    pub request_timeout: Duration,
}

impl StorageConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `ENSEMBLE_WORKSPACE` -- workspace root (default: current directory)
    /// - `ENSEMBLE_STORAGE_CONNECTION_FILE` -- JSON connection descriptor
    ///   file; when unset the connection is read from the environment
    /// - `REQUEST_TIMEOUT_MS` -- per-request timeout (default 30000)
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StorageError> {
        let workspace = match lookup("ENSEMBLE_WORKSPACE") {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir()
                .map_err(|e| StorageError::Config(format!("cannot determine workspace: {e}")))?,
        };

        let connection = lookup("ENSEMBLE_STORAGE_CONNECTION_FILE")
            .map_or(ConnectionSource::Environment, |path| {
                ConnectionSource::File(PathBuf::from(path))
            });

        let timeout_ms: u64 = lookup("REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|| DEFAULT_REQUEST_TIMEOUT_MS.to_string())
            .parse()
            .map_err(|e| StorageError::Config(format!("invalid REQUEST_TIMEOUT_MS: {e}")))?;

        Ok(Self {
            workspace,
            connection,
            request_timeout: Duration::from_millis(timeout_ms),
        })
    }
}
