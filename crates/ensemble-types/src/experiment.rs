//! Experiment entries as listed by the storage service.

use serde::{Deserialize, Serialize};

use crate::ids::{EnsembleId, ExperimentId};

/// An experiment as returned by `GET /experiments`.
///
/// The name is the caller-facing identity; the id is what the service
/// addresses. Each experiment currently owns a single ensemble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    /// Server-assigned experiment id.
    pub id: ExperimentId,
    /// Unique experiment name.
    pub name: String,
    /// Ensembles belonging to this experiment, oldest first.
    #[serde(default)]
    pub ensemble_ids: Vec<EnsembleId>,
}

impl Experiment {
    /// The ensemble this client reads and writes.
    ///
    /// Only one ensemble per experiment is supported; this is the first one.
    pub fn primary_ensemble(&self) -> Option<EnsembleId> {
        self.ensemble_ids.first().copied()
    }
}
