//! Command-line argument definitions.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};

/// Ensemble record storage client.
#[derive(Debug, Parser)]
#[command(name = "ensemble")]
#[command(about = "Ensemble record storage client")]
#[command(version)]
#[command(after_help = "\
Environment:
  ENSEMBLE_WORKSPACE, ENSEMBLE_STORAGE_CONNECTION, ENSEMBLE_STORAGE_URL,
  ENSEMBLE_STORAGE_TOKEN, ENSEMBLE_STORAGE_CONNECTION_FILE, REQUEST_TIMEOUT_MS,
  RUST_LOG")]
pub struct Cli {
    /// Experiment to use (default: the workspace's records experiment)
    #[arg(short, long, global = true)]
    pub experiment: Option<String>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse `args` (program name first) and check that `--experiment` is
    /// only given to commands scoped by it.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Self::try_parse_from(args)?;
        if cli.experiment.is_some() && !cli.command.takes_experiment() {
            return Err(Self::command().error(
                ErrorKind::ArgumentConflict,
                "--experiment is only accepted by records, put-record, get-record and sample-record",
            ));
        }
        Ok(cli)
    }
}

/// Distribution family named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FamilyArg {
    /// `gaussian <mean> <std>`
    Gaussian,
    /// `uniform <lower> <upper>`
    Uniform,
}

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Create the workspace's reserved experiments
    Init,

    /// List user-visible experiments
    Experiments,

    /// Create an experiment and its ensemble
    CreateExperiment {
        /// Experiment name
        name: String,

        /// Number of realizations
        ensemble_size: NonZeroUsize,

        /// Declared parameter names
        parameters: Vec<String>,
    },

    /// Delete an experiment and its records
    DeleteExperiment {
        /// Experiment name
        name: String,
    },

    /// List records of an experiment
    Records,

    /// List parameter names of an experiment
    Parameters {
        /// Experiment name
        #[arg(value_name = "EXPERIMENT")]
        name: String,
    },

    /// Store an ensemble record from a JSON array of records
    PutRecord {
        /// Record name
        name: String,

        /// JSON file holding one record per realization
        path: PathBuf,
    },

    /// Print an ensemble record as JSON
    GetRecord {
        /// Record name
        name: String,
    },

    /// Sample a parameter record and store it
    SampleRecord {
        /// Record name
        name: String,

        /// Distribution family
        #[arg(value_enum)]
        family: FamilyArg,

        /// Mean (gaussian) or lower bound (uniform)
        #[arg(allow_negative_numbers = true)]
        first: f64,

        /// Standard deviation (gaussian) or upper bound (uniform)
        #[arg(allow_negative_numbers = true)]
        second: f64,

        /// Values per record
        size: NonZeroUsize,

        /// Number of realizations
        ensemble_size: NonZeroUsize,
    },
}

impl Command {
    /// Whether the command reads or writes records of one experiment.
    const fn takes_experiment(&self) -> bool {
        matches!(
            self,
            Self::Records
                | Self::PutRecord { .. }
                | Self::GetRecord { .. }
                | Self::SampleRecord { .. }
        )
    }
}
