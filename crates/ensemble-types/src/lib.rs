//! Shared type definitions for the ensemble storage client.
//!
//! This crate is the single source of truth for the data model that flows
//! between the record codec, the storage client, and the sampling layer.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for server-side identifiers
//! - [`record`] -- Records, record kinds, and ensemble records
//! - [`metadata`] -- Per-record side information needed to decode a record
//! - [`experiment`] -- Experiment listing entries

pub mod experiment;
pub mod ids;
pub mod metadata;
pub mod record;

// Re-export all public types at crate root for convenience.
pub use experiment::Experiment;
pub use ids::{EnsembleId, ExperimentId};
pub use metadata::RecordMetadata;
pub use record::{EnsembleRecord, Record, RecordError, RecordKind};
