//! In-memory stand-in for the storage service.
//!
//! Implements [`Transport`] by routing requests against maps instead of a
//! network. It follows the service's status conventions (200 / 404 / 409),
//! records every request it sees, and can be told to fail specific calls.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing,
    dead_code
)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use ensemble_storage::{Method, Request, Response, StorageError, Transport};
use ensemble_types::{EnsembleId, Experiment, ExperimentId};
use serde::Deserialize;
use serde_json::json;

type RecordKey = (EnsembleId, String, usize);

/// A status to return instead of routing a matching request.
#[derive(Debug, Clone)]
pub struct FailureRule {
    pub method: Method,
    pub path_fragment: String,
    pub realization: Option<usize>,
    pub status: u16,
}

#[derive(Debug)]
struct EnsembleEntry {
    parameter_names: Vec<String>,
    size: i64,
}

#[derive(Default)]
struct State {
    experiments: Vec<Experiment>,
    ensembles: BTreeMap<EnsembleId, EnsembleEntry>,
    matrices: BTreeMap<RecordKey, Vec<u8>>,
    userdata: BTreeMap<RecordKey, Vec<u8>>,
    requests: Vec<(Method, String)>,
    failures: Vec<FailureRule>,
}

#[derive(Deserialize)]
struct NewExperiment {
    name: String,
}

#[derive(Deserialize)]
struct NewEnsemble {
    parameter_names: Vec<String>,
    size: i64,
}

/// The fake service.
#[derive(Default)]
pub struct FakeStorageService {
    state: Mutex<State>,
}

impl FakeStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    /// Requests received so far, as `(method, path)`.
    pub fn requests(&self) -> Vec<(Method, String)> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Answer matching requests with `status` from now on.
    pub fn fail_when(
        &self,
        method: Method,
        path_fragment: &str,
        realization: Option<usize>,
        status: u16,
    ) {
        self.state.lock().unwrap().failures.push(FailureRule {
            method,
            path_fragment: path_fragment.to_owned(),
            realization,
            status,
        });
    }

    /// Stop injecting failures.
    pub fn clear_failures(&self) {
        self.state.lock().unwrap().failures.clear();
    }

    /// Number of stored realization matrices for a record.
    pub fn stored_realizations(&self, record_name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .matrices
            .keys()
            .filter(|(_, name, _)| name == record_name)
            .count()
    }

    /// Stored metadata body for a record realization.
    pub fn stored_userdata(&self, record_name: &str, realization: usize) -> Option<serde_json::Value> {
        let state = self.state.lock().unwrap();
        state
            .userdata
            .iter()
            .find(|((_, name, idx), _)| name == record_name && *idx == realization)
            .map(|(_, body)| serde_json::from_slice(body).unwrap())
    }

    /// Replace the stored metadata body of a record realization.
    pub fn overwrite_userdata(&self, record_name: &str, realization: usize, body: &[u8]) {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .userdata
            .iter_mut()
            .find(|((_, name, idx), _)| name == record_name && *idx == realization)
            .map(|(_, stored)| stored)
            .expect("metadata stored for realization");
        *entry = body.to_vec();
    }

    /// Declared size of an experiment's ensemble.
    pub fn ensemble_size(&self, experiment_name: &str) -> Option<i64> {
        let state = self.state.lock().unwrap();
        let experiment = state.experiments.iter().find(|e| e.name == experiment_name)?;
        let ensemble = experiment.ensemble_ids.first()?;
        state.ensembles.get(ensemble).map(|e| e.size)
    }

    fn route(&self, request: &Request) -> Response {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        state
            .requests
            .push((request.method(), request.path().to_owned()));

        let realization = request
            .param_value("realization_index")
            .and_then(|v| v.parse::<usize>().ok());

        if let Some(rule) = state.failures.iter().find(|rule| {
            rule.method == request.method()
                && request.path().contains(&rule.path_fragment)
                && (rule.realization.is_none() || rule.realization == realization)
        }) {
            return Response::new(rule.status, b"injected failure".to_vec());
        }

        let segments: Vec<&str> = request.path().split('/').collect();
        let body = request.body_ref().map(|b| b.bytes.clone()).unwrap_or_default();

        match (request.method(), segments.as_slice()) {
            (Method::Get, ["experiments"]) => ok_json(&json!(state.experiments)),
            (Method::Post, ["experiments"]) => {
                let new: NewExperiment = serde_json::from_slice(&body).unwrap();
                if state.experiments.iter().any(|e| e.name == new.name) {
                    return status(409);
                }
                let id = ExperimentId::new();
                state.experiments.push(Experiment {
                    id,
                    name: new.name,
                    ensemble_ids: Vec::new(),
                });
                ok_json(&json!({ "id": id }))
            }
            (Method::Delete, ["experiments", id]) => {
                let Ok(id) = id.parse::<ExperimentId>() else {
                    return status(422);
                };
                let Some(pos) = state.experiments.iter().position(|e| e.id == id) else {
                    return status(404);
                };
                let removed = state.experiments.remove(pos);
                for ensemble in &removed.ensemble_ids {
                    state.ensembles.remove(ensemble);
                    state.matrices.retain(|(ens, _, _), _| ens != ensemble);
                    state.userdata.retain(|(ens, _, _), _| ens != ensemble);
                }
                ok_json(&json!(null))
            }
            (Method::Post, ["experiments", id, "ensembles"]) => {
                let Ok(id) = id.parse::<ExperimentId>() else {
                    return status(422);
                };
                let new: NewEnsemble = serde_json::from_slice(&body).unwrap();
                let ensemble_id = EnsembleId::new();
                let Some(experiment) = state.experiments.iter_mut().find(|e| e.id == id) else {
                    return status(404);
                };
                experiment.ensemble_ids.push(ensemble_id);
                state.ensembles.insert(
                    ensemble_id,
                    EnsembleEntry {
                        parameter_names: new.parameter_names,
                        size: new.size,
                    },
                );
                ok_json(&json!({ "id": ensemble_id }))
            }
            (Method::Get, ["ensembles", id, "records"]) => {
                let Some(ensemble) = known_ensemble(state, id) else {
                    return status(404);
                };
                let names: BTreeMap<&str, serde_json::Value> = state
                    .matrices
                    .keys()
                    .filter(|(ens, _, _)| *ens == ensemble)
                    .map(|(_, name, _)| (name.as_str(), json!({ "name": name })))
                    .collect();
                ok_json(&json!(names))
            }
            (Method::Get, ["ensembles", id, "parameters"]) => {
                let Some(ensemble) = known_ensemble(state, id) else {
                    return status(404);
                };
                ok_json(&json!(state.ensembles[&ensemble].parameter_names))
            }
            (Method::Post, ["ensembles", id, "records", name, "matrix"]) => {
                let (Some(ensemble), Some(realization)) = (known_ensemble(state, id), realization)
                else {
                    return status(404);
                };
                let key = (ensemble, (*name).to_owned(), realization);
                if state.matrices.contains_key(&key) {
                    return status(409);
                }
                state.matrices.insert(key, body);
                ok_json(&json!(null))
            }
            (Method::Get, ["ensembles", id, "records", name]) => {
                let (Some(ensemble), Some(realization)) = (known_ensemble(state, id), realization)
                else {
                    return status(404);
                };
                state
                    .matrices
                    .get(&(ensemble, (*name).to_owned(), realization))
                    .map_or_else(|| status(404), |csv| Response::new(200, csv.clone()))
            }
            (Method::Put, ["ensembles", id, "records", name, "userdata"]) => {
                let (Some(ensemble), Some(realization)) = (known_ensemble(state, id), realization)
                else {
                    return status(404);
                };
                state
                    .userdata
                    .insert((ensemble, (*name).to_owned(), realization), body);
                ok_json(&json!(null))
            }
            (Method::Get, ["ensembles", id, "records", name, "userdata"]) => {
                let (Some(ensemble), Some(realization)) = (known_ensemble(state, id), realization)
                else {
                    return status(404);
                };
                state
                    .userdata
                    .get(&(ensemble, (*name).to_owned(), realization))
                    .map_or_else(|| status(404), |meta| Response::new(200, meta.clone()))
            }
            _ => status(405),
        }
    }
}

impl Transport for FakeStorageService {
    async fn send(&self, request: Request) -> Result<Response, StorageError> {
        Ok(self.route(&request))
    }
}

fn known_ensemble(state: &State, id: &str) -> Option<EnsembleId> {
    let id = id.parse::<EnsembleId>().ok()?;
    state.ensembles.contains_key(&id).then_some(id)
}

fn ok_json(value: &serde_json::Value) -> Response {
    Response::new(200, serde_json::to_vec(value).unwrap())
}

fn status(code: u16) -> Response {
    Response::new(code, format!("status {code}").into_bytes())
}
