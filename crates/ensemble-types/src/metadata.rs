//! Record metadata persisted alongside every stored record.
//!
//! The tabular encoding of a record carries labels and values but not the
//! record kind, and a single realization cannot tell how many siblings it
//! has. [`RecordMetadata`] supplies both. It is written next to each
//! realization; readers consult realization 0's copy only.
//!
//! Wire form (JSON):
//!
//! ```json
//! {"ensemble_size": 3, "record_type": "MAPPING_STR_FLOAT"}
//! ```

use core::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::record::{EnsembleRecord, RecordError, RecordKind};

/// Size and kind of a stored ensemble record.
///
/// Fields are private and have no setters, so a value is immutable once
/// built. Both the constructor and deserialization reject a zero ensemble
/// size; deserialization also rejects unknown fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordMetadata {
    ensemble_size: NonZeroUsize,
    #[serde(rename = "record_type")]
    record_kind: RecordKind,
}

impl RecordMetadata {
    /// Build metadata from raw parts.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::ZeroEnsembleSize`] if `ensemble_size` is 0.
    pub fn new(ensemble_size: usize, record_kind: RecordKind) -> Result<Self, RecordError> {
        let ensemble_size = NonZeroUsize::new(ensemble_size).ok_or(RecordError::ZeroEnsembleSize)?;
        Ok(Self {
            ensemble_size,
            record_kind,
        })
    }

    /// Derive metadata from an ensemble record about to be written.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Empty`] or [`RecordError::InconsistentKind`]
    /// if the ensemble has no single record kind.
    pub fn for_ensemble(ensemble: &EnsembleRecord) -> Result<Self, RecordError> {
        let record_kind = ensemble.record_kind()?;
        Self::new(ensemble.ensemble_size(), record_kind)
    }

    /// Number of realizations in the stored ensemble record.
    pub const fn ensemble_size(&self) -> usize {
        self.ensemble_size.get()
    }

    /// Kind shared by every realization's record.
    pub const fn record_kind(&self) -> RecordKind {
        self.record_kind
    }
}
