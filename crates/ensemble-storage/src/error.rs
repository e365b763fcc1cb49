//! Error types for the storage client.
//!
//! [`StorageError`] is the single error type returned by every client
//! operation. Its first five variants form the domain taxonomy callers use
//! to decide between retrying and aborting:
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | [`StorageError::AlreadyExists`] | Caller logic conflict, never retried |
//! | [`StorageError::NotFound`] | Experiment name does not resolve |
//! | [`StorageError::MissingData`] | Experiment exists, record or metadata does not |
//! | [`StorageError::StorageFailure`] | Any other non-success status |
//! | [`StorageError::Validation`] | Local check failed before any request |
//!
//! The remaining variants cover failures that never produced a status.

use ensemble_types::RecordError;

/// Errors that can occur in the storage client.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The experiment or record being created already exists.
    #[error("already exists: {context}")]
    AlreadyExists {
        /// What was being created.
        context: String,
    },

    /// The named experiment does not exist.
    #[error("experiment not found: {experiment}")]
    NotFound {
        /// The experiment name that failed to resolve.
        experiment: String,
    },

    /// A record or its metadata is absent from an existing experiment.
    #[error("missing data: {context}")]
    MissingData {
        /// Which record (and realization) was looked up.
        context: String,
    },

    /// The service answered with an unexpected status.
    #[error("storage failure ({status}) during {context}: {body}")]
    StorageFailure {
        /// The operation that failed.
        context: String,
        /// HTTP status code returned by the service.
        status: u16,
        /// Raw response text, kept for diagnostics.
        body: String,
    },

    /// A local check rejected the request before anything was sent.
    #[error("validation error: {0}")]
    Validation(String),

    /// The experiment exists but has no ensemble to hold records.
    #[error("experiment {experiment} has no ensemble")]
    NoEnsemble {
        /// The experiment name.
        experiment: String,
    },

    /// The request did not complete (connection, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The session could not be configured or its connection resolved.
    #[error("configuration error: {0}")]
    Config(String),

    /// A tabular record payload could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// A JSON body could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<RecordError> for StorageError {
    fn from(err: RecordError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Where an error happened, carried into the error message.
///
/// Built fluently at each call site:
///
/// ```
/// use ensemble_storage::ErrorContext;
///
/// let ctx = ErrorContext::new("write record")
///     .experiment("poly")
///     .record("coefficients")
///     .realization(3);
/// assert_eq!(
///     ctx.to_string(),
///     "write record (experiment poly, record coefficients, realization 3)"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    operation: &'static str,
    experiment: Option<String>,
    record: Option<String>,
    realization: Option<usize>,
}

impl ErrorContext {
    /// Start a context for the named operation.
    pub const fn new(operation: &'static str) -> Self {
        Self {
            operation,
            experiment: None,
            record: None,
            realization: None,
        }
    }

    /// Attach the experiment name.
    #[must_use]
    pub fn experiment(mut self, name: &str) -> Self {
        self.experiment = Some(name.to_owned());
        self
    }

    /// Attach the record name.
    #[must_use]
    pub fn record(mut self, name: &str) -> Self {
        self.record = Some(name.to_owned());
        self
    }

    /// Attach the realization index.
    #[must_use]
    pub const fn realization(mut self, index: usize) -> Self {
        self.realization = Some(index);
        self
    }
}

impl core::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.operation)?;
        let mut parts = Vec::new();
        if let Some(experiment) = &self.experiment {
            parts.push(format!("experiment {experiment}"));
        }
        if let Some(record) = &self.record {
            parts.push(format!("record {record}"));
        }
        if let Some(realization) = self.realization {
            parts.push(format!("realization {realization}"));
        }
        if !parts.is_empty() {
            write!(f, " ({})", parts.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ensemble_types::RecordKind;

    #[test]
    fn bare_context_is_operation_only() {
        assert_eq!(ErrorContext::new("list experiments").to_string(), "list experiments");
    }

    #[test]
    fn record_error_becomes_validation() {
        let err: StorageError = RecordError::InconsistentKind {
            realization: 1,
            expected: RecordKind::SequenceFloat,
            found: RecordKind::MappingIntFloat,
        }
        .into();
        assert!(matches!(err, StorageError::Validation(msg) if msg.contains("realization 1")));
    }

    #[test]
    fn failure_message_keeps_response_text() {
        let err = StorageError::StorageFailure {
            context: ErrorContext::new("read record").record("r").to_string(),
            status: 500,
            body: "boom".to_owned(),
        };
        assert_eq!(err.to_string(), "storage failure (500) during read record (record r): boom");
    }
}
