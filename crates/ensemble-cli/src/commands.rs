//! Command execution against the storage service.

use std::path::Path;

use anyhow::Context;
use ensemble_stats::{Distribution, Shape};
use ensemble_storage::{ExperimentDirectory, RecordStore, Transport, Workspace};
use ensemble_types::EnsembleRecord;

use crate::cli::{Cli, Command, FamilyArg};

/// Run one command and return what should be printed.
pub async fn execute<T: Transport>(
    cli: Cli,
    transport: &T,
    workspace: &Workspace,
) -> anyhow::Result<String> {
    let Cli {
        experiment,
        command,
    } = cli;
    let directory = ExperimentDirectory::new(transport, workspace);
    let store = RecordStore::new(transport, workspace);

    match command {
        Command::Init => {
            directory.init_workspace().await?;
            Ok(format!(
                "Initialized storage for workspace {}",
                workspace.root().display()
            ))
        }
        Command::Experiments => {
            let names = directory.list_visible_names().await?;
            Ok(lines(names))
        }
        Command::CreateExperiment {
            name,
            ensemble_size,
            parameters,
        } => {
            let id = directory
                .create(&name, &parameters, ensemble_size.get())
                .await?;
            Ok(format!("Created experiment {name} ({id})"))
        }
        Command::DeleteExperiment { name } => {
            directory.delete(&name).await?;
            Ok(format!("Deleted experiment {name}"))
        }
        Command::Records => {
            let names = store.list_record_names(experiment.as_deref()).await?;
            Ok(lines(names))
        }
        Command::Parameters { name } => {
            let names = store.list_parameter_names(&name).await?;
            Ok(lines(names))
        }
        Command::PutRecord { name, path } => {
            let ensemble = load_ensemble(&path)?;
            store
                .write(experiment.as_deref(), &name, &ensemble)
                .await?;
            Ok(format!(
                "Stored record {name} ({} realizations)",
                ensemble.ensemble_size()
            ))
        }
        Command::GetRecord { name } => {
            let ensemble = store.read(experiment.as_deref(), &name).await?;
            Ok(serde_json::to_string_pretty(&ensemble)?)
        }
        Command::SampleRecord {
            name,
            family,
            first,
            second,
            size,
            ensemble_size,
        } => {
            let shape = Shape::Size(size.get());
            let distribution = match family {
                FamilyArg::Gaussian => Distribution::gaussian(first, second, shape)?,
                FamilyArg::Uniform => Distribution::uniform(first, second, shape)?,
            };
            let ensemble = distribution.sample_ensemble(ensemble_size.get(), &mut rand::rng())?;
            store
                .write(experiment.as_deref(), &name, &ensemble)
                .await?;
            Ok(format!(
                "Sampled and stored record {name} ({ensemble_size} realizations)"
            ))
        }
    }
}

/// Read an ensemble record from a JSON array of records.
fn load_ensemble(path: &Path) -> anyhow::Result<EnsembleRecord> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("invalid ensemble record in {}", path.display()))
}

fn lines(names: impl IntoIterator<Item = String>) -> String {
    names.into_iter().collect::<Vec<_>>().join("\n")
}
