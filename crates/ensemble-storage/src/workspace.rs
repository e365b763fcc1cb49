//! Workspace scoping and reserved experiment names.
//!
//! Every workspace owns an implicit experiment named
//! `{workspace}.__ensemble_records__`. Records written without an explicit
//! experiment land there. It is created by workspace initialization and
//! hidden from the visible experiment listing.

use std::path::{Path, PathBuf};

/// Suffix of the reserved per-workspace record experiment.
pub const ENSEMBLE_RECORDS: &str = "__ensemble_records__";

/// All reserved suffixes. Experiments named `{workspace}.{suffix}` are
/// internal.
pub const RESERVED_SUFFIXES: &[&str] = &[ENSEMBLE_RECORDS];

/// A local workspace whose path scopes its reserved experiments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Wrap a workspace root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the reserved experiment with the given suffix.
    pub fn reserved_name(&self, suffix: &str) -> String {
        format!("{}.{suffix}", self.root.display())
    }

    /// Name of the experiment used when no experiment is specified.
    pub fn records_experiment(&self) -> String {
        self.reserved_name(ENSEMBLE_RECORDS)
    }

    /// Names of every reserved experiment of this workspace.
    pub fn reserved_names(&self) -> Vec<String> {
        RESERVED_SUFFIXES
            .iter()
            .map(|suffix| self.reserved_name(suffix))
            .collect()
    }

    /// Whether `name` is one of this workspace's reserved experiments.
    pub fn is_reserved(&self, name: &str) -> bool {
        RESERVED_SUFFIXES
            .iter()
            .any(|suffix| self.reserved_name(suffix) == name)
    }

    /// The experiment to use: `explicit` if given, else the reserved one.
    pub fn scope(&self, explicit: Option<&str>) -> String {
        explicit.map_or_else(|| self.records_experiment(), ToOwned::to_owned)
    }
}
