//! Maps service responses onto the [`StorageError`] taxonomy.
//!
//! Every transport call site passes its response through [`classify`] with
//! a [`StatusPolicy`] saying which non-success statuses carry domain
//! meaning there. A 404 only means "missing data" on the record data path,
//! and a 409 only means "already exists" where something is being created.
//! Everywhere else they are plain storage failures.

use crate::error::{ErrorContext, StorageError};
use crate::session::Response;

/// Status code for success.
pub const STATUS_OK: u16 = 200;
/// Status code for a missing resource.
pub const STATUS_NOT_FOUND: u16 = 404;
/// Status code for a conflicting (already existing) resource.
pub const STATUS_CONFLICT: u16 = 409;

/// Coarse outcome of a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `200`.
    Success,
    /// `404`.
    Missing,
    /// `409`.
    Conflict,
    /// Anything else.
    Failure(u16),
}

impl Outcome {
    /// Classify a raw status code.
    pub const fn from_status(status: u16) -> Self {
        match status {
            STATUS_OK => Self::Success,
            STATUS_NOT_FOUND => Self::Missing,
            STATUS_CONFLICT => Self::Conflict,
            other => Self::Failure(other),
        }
    }
}

/// Which non-success outcomes have a domain meaning at a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Only success passes; everything else is a storage failure.
    Strict,
    /// A missing resource is [`StorageError::MissingData`].
    DataRead,
    /// A conflict is [`StorageError::AlreadyExists`].
    DataWrite,
}

/// Pass a successful response through, or turn it into a domain error.
///
/// # Errors
///
/// Returns [`StorageError::MissingData`], [`StorageError::AlreadyExists`],
/// or [`StorageError::StorageFailure`] according to `policy`.
pub fn classify(
    response: Response,
    policy: StatusPolicy,
    context: &ErrorContext,
) -> Result<Response, StorageError> {
    match (Outcome::from_status(response.status), policy) {
        (Outcome::Success, _) => Ok(response),
        (Outcome::Missing, StatusPolicy::DataRead) => Err(StorageError::MissingData {
            context: context.to_string(),
        }),
        (Outcome::Conflict, StatusPolicy::DataWrite) => Err(StorageError::AlreadyExists {
            context: context.to_string(),
        }),
        _ => Err(StorageError::StorageFailure {
            context: context.to_string(),
            status: response.status,
            body: response.text(),
        }),
    }
}
