//! Experiment directory: name resolution, listing, creation, deletion.
//!
//! The service addresses experiments by id, callers by name. There is no
//! server-side name filter, so every lookup fetches the full listing and
//! searches it. Nothing is cached between calls; a listing is never older
//! than the operation that asked for it.

use std::collections::BTreeSet;

use ensemble_types::{Experiment, ExperimentId};
use serde::{Deserialize, Serialize};

use crate::classify::{StatusPolicy, classify};
use crate::error::{ErrorContext, StorageError};
use crate::session::{Request, Transport};
use crate::workspace::Workspace;

/// Ensemble size sent for the reserved records experiment, whose
/// realization count is not fixed up front.
pub const UNSIZED_ENSEMBLE: i64 = -1;

/// Body of `POST /experiments`.
#[derive(Serialize)]
struct NewExperiment<'b> {
    name: &'b str,
}

/// Answer to `POST /experiments`.
#[derive(Deserialize)]
struct CreatedExperiment {
    id: ExperimentId,
}

/// Body of `POST /experiments/{id}/ensembles`.
#[derive(Serialize)]
struct NewEnsemble<'b> {
    parameter_names: &'b [String],
    response_names: &'b [String],
    size: i64,
}

/// Experiment operations bound to a transport and a workspace.
pub struct ExperimentDirectory<'a, T> {
    transport: &'a T,
    workspace: &'a Workspace,
}

impl<'a, T: Transport> ExperimentDirectory<'a, T> {
    /// Create a directory bound to a transport and workspace.
    pub const fn new(transport: &'a T, workspace: &'a Workspace) -> Self {
        Self {
            transport,
            workspace,
        }
    }

    /// Fetch every experiment known to the service.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::StorageFailure`] on a non-success status.
    pub async fn list(&self) -> Result<Vec<Experiment>, StorageError> {
        let context = ErrorContext::new("list experiments");
        let response = self.transport.send(Request::get("experiments")).await?;
        let response = classify(response, StatusPolicy::Strict, &context)?;
        response.json()
    }

    /// Look up an experiment by name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::StorageFailure`] if the listing fails.
    pub async fn resolve(&self, name: &str) -> Result<Option<Experiment>, StorageError> {
        let experiments = self.list().await?;
        Ok(experiments.into_iter().find(|exp| exp.name == name))
    }

    /// Look up an experiment by name, failing if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if no experiment has this name.
    pub async fn require(&self, name: &str) -> Result<Experiment, StorageError> {
        self.resolve(name)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                experiment: name.to_owned(),
            })
    }

    /// Names of user-visible experiments; reserved workspace experiments
    /// are left out.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::StorageFailure`] if the listing fails.
    pub async fn list_visible_names(&self) -> Result<BTreeSet<String>, StorageError> {
        let experiments = self.list().await?;
        Ok(experiments
            .into_iter()
            .map(|exp| exp.name)
            .filter(|name| !self.workspace.is_reserved(name))
            .collect())
    }

    /// Create an experiment together with its single ensemble.
    ///
    /// Arguments are checked before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Validation`] for an empty name or a zero
    /// ensemble size, [`StorageError::AlreadyExists`] if the name is taken,
    /// and [`StorageError::StorageFailure`] if either creation call fails.
    pub async fn create(
        &self,
        name: &str,
        parameter_names: &[String],
        ensemble_size: usize,
    ) -> Result<ExperimentId, StorageError> {
        if ensemble_size == 0 {
            return Err(StorageError::Validation(
                "ensemble cannot have a size <= 0".to_owned(),
            ));
        }
        let size = i64::try_from(ensemble_size).map_err(|e| {
            StorageError::Validation(format!("ensemble size {ensemble_size} too large: {e}"))
        })?;
        self.create_sized(name, parameter_names, size).await
    }

    /// Create the workspace's reserved experiments.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AlreadyExists`] if the workspace has already
    /// been initialized, or any error from experiment creation.
    pub async fn init_workspace(&self) -> Result<(), StorageError> {
        let existing: BTreeSet<String> =
            self.list().await?.into_iter().map(|exp| exp.name).collect();

        for name in self.workspace.reserved_names() {
            if existing.contains(&name) {
                return Err(StorageError::AlreadyExists {
                    context: format!("storage already initialized for workspace {name}"),
                });
            }
            self.create_sized(&name, &[], UNSIZED_ENSEMBLE).await?;
        }

        tracing::info!(
            workspace = %self.workspace.root().display(),
            "Initialized workspace storage"
        );
        Ok(())
    }

    /// Delete an experiment; the service removes its ensemble and records.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if no experiment has this name and
    /// [`StorageError::StorageFailure`] if the delete call fails.
    pub async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let experiment = self.require(name).await?;
        let context = ErrorContext::new("delete experiment").experiment(name);
        let response = self
            .transport
            .send(Request::delete(format!("experiments/{}", experiment.id)))
            .await?;
        classify(response, StatusPolicy::Strict, &context)?;

        tracing::info!(experiment = name, id = %experiment.id, "Deleted experiment");
        Ok(())
    }

    async fn create_sized(
        &self,
        name: &str,
        parameter_names: &[String],
        size: i64,
    ) -> Result<ExperimentId, StorageError> {
        if name.is_empty() {
            return Err(StorageError::Validation(
                "cannot initialize experiment without a name".to_owned(),
            ));
        }
        if self.resolve(name).await?.is_some() {
            return Err(StorageError::AlreadyExists {
                context: format!("experiment {name}"),
            });
        }

        let context = ErrorContext::new("create experiment").experiment(name);
        let request = Request::post("experiments").json(&NewExperiment { name })?;
        let response = self.transport.send(request).await?;
        let created: CreatedExperiment =
            classify(response, StatusPolicy::DataWrite, &context)?.json()?;

        let context = ErrorContext::new("create ensemble").experiment(name);
        let request = Request::post(format!("experiments/{}/ensembles", created.id)).json(
            &NewEnsemble {
                parameter_names,
                response_names: &[],
                size,
            },
        )?;
        let response = self.transport.send(request).await?;
        classify(response, StatusPolicy::DataWrite, &context)?;

        tracing::info!(
            experiment = name,
            id = %created.id,
            ensemble_size = size,
            parameter_count = parameter_names.len(),
            "Created experiment"
        );
        Ok(created.id)
    }
}
