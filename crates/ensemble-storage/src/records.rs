//! Ensemble record store: realization-wise writes and reads.
//!
//! An [`EnsembleRecord`] is stored as one CSV matrix per realization under
//! the experiment's ensemble, each accompanied by a copy of the record's
//! [`RecordMetadata`]. Readers take size and kind from realization 0's copy
//! and then fetch realizations `0..size` in order.
//!
//! # Wire layout
//!
//! ```text
//! ensembles/{ensemble_id}/records/{name}/matrix?realization_index=i    POST  text/csv
//! ensembles/{ensemble_id}/records/{name}?realization_index=i           GET   text/csv
//! ensembles/{ensemble_id}/records/{name}/userdata?realization_index=i  PUT   JSON metadata
//! ensembles/{ensemble_id}/records/{name}/userdata?realization_index=0  GET   JSON metadata
//! ```
//!
//! # Partial writes
//!
//! Realizations are written one after another and nothing is rolled back.
//! If realization `k` fails, `0..k` stay stored. Replaying the write then
//! fails with [`StorageError::AlreadyExists`] at realization 0, which is how
//! a caller detects the partial state.

use std::collections::BTreeMap;

use ensemble_types::{EnsembleId, EnsembleRecord, RecordMetadata};

use crate::classify::{StatusPolicy, classify};
use crate::codec;
use crate::error::{ErrorContext, StorageError};
use crate::experiments::ExperimentDirectory;
use crate::session::{CSV_CONTENT_TYPE, Request, Transport};
use crate::workspace::Workspace;

/// Query parameter selecting a realization.
const REALIZATION_INDEX: &str = "realization_index";

/// Record operations bound to a transport and a workspace.
///
/// Every operation takes an optional experiment name; `None` means the
/// workspace's reserved records experiment.
pub struct RecordStore<'a, T> {
    transport: &'a T,
    workspace: &'a Workspace,
}

impl<'a, T: Transport> RecordStore<'a, T> {
    /// Create a record store bound to a transport and workspace.
    pub const fn new(transport: &'a T, workspace: &'a Workspace) -> Self {
        Self {
            transport,
            workspace,
        }
    }

    /// Store every realization of `ensemble_record` under `record_name`.
    ///
    /// The record name and kind consistency are checked before any request
    /// is sent.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Validation`] for an empty or mixed-kind ensemble
    ///   or an invalid record name
    /// - [`StorageError::NotFound`] if the experiment does not exist
    /// - [`StorageError::AlreadyExists`] if a realization is already stored
    /// - [`StorageError::StorageFailure`] for any other rejected request
    pub async fn write(
        &self,
        experiment: Option<&str>,
        record_name: &str,
        ensemble_record: &EnsembleRecord,
    ) -> Result<(), StorageError> {
        validate_record_name(record_name)?;
        let metadata = RecordMetadata::for_ensemble(ensemble_record)?;

        let experiment_name = self.scope(experiment)?;
        let ensemble_id = self.ensemble_of(&experiment_name).await?;
        let record_url = record_url(ensemble_id, record_name);

        for (realization, record) in ensemble_record.records().iter().enumerate() {
            let context = ErrorContext::new("write record")
                .experiment(&experiment_name)
                .record(record_name)
                .realization(realization);

            let payload = codec::encode(record, realization)?;
            let request = Request::post(format!("{record_url}/matrix"))
                .param(REALIZATION_INDEX, realization)
                .body(CSV_CONTENT_TYPE, payload);
            let response = self.transport.send(request).await?;
            classify(response, StatusPolicy::DataWrite, &context)?;

            let context = ErrorContext::new("write record metadata")
                .experiment(&experiment_name)
                .record(record_name)
                .realization(realization);
            let request = Request::put(format!("{record_url}/userdata"))
                .param(REALIZATION_INDEX, realization)
                .json(&metadata)?;
            let response = self.transport.send(request).await?;
            classify(response, StatusPolicy::Strict, &context)?;

            tracing::debug!(
                experiment = experiment_name,
                record = record_name,
                realization,
                "Stored realization"
            );
        }

        tracing::info!(
            experiment = experiment_name,
            record = record_name,
            ensemble_size = metadata.ensemble_size(),
            record_kind = %metadata.record_kind(),
            "Stored ensemble record"
        );
        Ok(())
    }

    /// Load every realization of `record_name`.
    ///
    /// Either the whole ensemble record is returned or an error; a failure at
    /// any realization aborts the read.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if the experiment does not exist
    /// - [`StorageError::MissingData`] if the metadata or a realization is absent
    /// - [`StorageError::StorageFailure`] for any other rejected request
    /// - [`StorageError::Serialization`] / [`StorageError::Codec`] for
    ///   malformed payloads
    pub async fn read(
        &self,
        experiment: Option<&str>,
        record_name: &str,
    ) -> Result<EnsembleRecord, StorageError> {
        validate_record_name(record_name)?;

        let experiment_name = self.scope(experiment)?;
        let ensemble_id = self.ensemble_of(&experiment_name).await?;
        let metadata = self
            .read_metadata(ensemble_id, &experiment_name, record_name)
            .await?;
        let record_url = record_url(ensemble_id, record_name);

        // The size comes from the server; grow as realizations arrive.
        let mut records = Vec::new();
        for realization in 0..metadata.ensemble_size() {
            let context = ErrorContext::new("read record")
                .experiment(&experiment_name)
                .record(record_name)
                .realization(realization);

            let request = Request::get(record_url.as_str())
                .param(REALIZATION_INDEX, realization)
                .header("accept", CSV_CONTENT_TYPE);
            let response = self.transport.send(request).await?;
            let response = classify(response, StatusPolicy::DataRead, &context)?;

            let record = codec::decode(&response.body, metadata.record_kind(), realization)
                .map_err(|e| match e {
                    StorageError::Codec(msg) => StorageError::Codec(format!("{context}: {msg}")),
                    other => other,
                })?;
            records.push(record);
        }

        tracing::debug!(
            experiment = experiment_name,
            record = record_name,
            ensemble_size = records.len(),
            "Loaded ensemble record"
        );
        Ok(EnsembleRecord::new(records))
    }

    /// Names of the records stored in an experiment.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the experiment does not exist
    /// and [`StorageError::StorageFailure`] if the listing fails.
    pub async fn list_record_names(
        &self,
        experiment: Option<&str>,
    ) -> Result<Vec<String>, StorageError> {
        let experiment_name = self.scope(experiment)?;
        let ensemble_id = self.ensemble_of(&experiment_name).await?;

        let context = ErrorContext::new("list records").experiment(&experiment_name);
        let response = self
            .transport
            .send(Request::get(format!("ensembles/{ensemble_id}/records")))
            .await?;
        let records: BTreeMap<String, serde_json::Value> =
            classify(response, StatusPolicy::Strict, &context)?.json()?;
        Ok(records.into_keys().collect())
    }

    /// Parameter names declared when the experiment was created.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the experiment does not exist
    /// and [`StorageError::StorageFailure`] if the listing fails.
    pub async fn list_parameter_names(&self, experiment: &str) -> Result<Vec<String>, StorageError> {
        validate_experiment_name(experiment)?;
        let ensemble_id = self.ensemble_of(experiment).await?;

        let context = ErrorContext::new("list parameters").experiment(experiment);
        let response = self
            .transport
            .send(Request::get(format!("ensembles/{ensemble_id}/parameters")))
            .await?;
        classify(response, StatusPolicy::Strict, &context)?.json()
    }

    /// The experiment an operation targets, rejecting an explicit empty name.
    fn scope(&self, experiment: Option<&str>) -> Result<String, StorageError> {
        if let Some(name) = experiment {
            validate_experiment_name(name)?;
        }
        Ok(self.workspace.scope(experiment))
    }

    /// Resolve an experiment name to the ensemble that holds its records.
    async fn ensemble_of(&self, experiment_name: &str) -> Result<EnsembleId, StorageError> {
        let experiment = ExperimentDirectory::new(self.transport, self.workspace)
            .require(experiment_name)
            .await?;
        experiment
            .primary_ensemble()
            .ok_or_else(|| StorageError::NoEnsemble {
                experiment: experiment_name.to_owned(),
            })
    }

    /// Fetch realization 0's metadata, which describes the whole ensemble.
    async fn read_metadata(
        &self,
        ensemble_id: EnsembleId,
        experiment_name: &str,
        record_name: &str,
    ) -> Result<RecordMetadata, StorageError> {
        let context = ErrorContext::new("read record metadata")
            .experiment(experiment_name)
            .record(record_name)
            .realization(0);
        let request = Request::get(format!("{}/userdata", record_url(ensemble_id, record_name)))
            .param(REALIZATION_INDEX, 0);
        let response = self.transport.send(request).await?;
        classify(response, StatusPolicy::DataRead, &context)?.json()
    }
}

fn record_url(ensemble_id: EnsembleId, record_name: &str) -> String {
    format!("ensembles/{ensemble_id}/records/{record_name}")
}

/// Characters that would end or re-encode a URL path segment.
const RESERVED_IN_SEGMENT: [char; 4] = ['/', '?', '#', '%'];

/// Record names become URL path segments.
fn validate_record_name(record_name: &str) -> Result<(), StorageError> {
    if record_name.is_empty() {
        return Err(StorageError::Validation("record name is empty".to_owned()));
    }
    if let Some(c) = record_name.chars().find(|c| RESERVED_IN_SEGMENT.contains(c)) {
        return Err(StorageError::Validation(format!(
            "record name {record_name:?} contains {c:?}"
        )));
    }
    Ok(())
}

fn validate_experiment_name(experiment: &str) -> Result<(), StorageError> {
    if experiment.is_empty() {
        return Err(StorageError::Validation("experiment name is empty".to_owned()));
    }
    Ok(())
}
