//! Client for storing ensemble records against a remote storage service.
//!
//! The storage service holds a hierarchy of experiments, each owning one
//! ensemble, each ensemble holding named records stored per realization.
//! This crate keeps a client-side view of that hierarchy without any local
//! state: every operation resolves names afresh and talks to the service
//! through a [`Transport`].
//!
//! # Architecture
//!
//! ```text
//! RecordStore ----------+--> ExperimentDirectory --+
//!   |                   |                          |
//!   +-- codec (CSV) ----+                          +--> Transport (HttpSession)
//!   |                                              |
//!   +------------------ classify <-----------------+
//! ```
//!
//! # Modules
//!
//! - [`session`] -- Requests, responses, the [`Transport`] seam, and the
//!   `reqwest`-backed [`HttpSession`]
//! - [`config`] -- Connection resolution and environment configuration
//! - [`classify`] -- Status codes to [`StorageError`] variants
//! - [`codec`] -- CSV encoding of a realization's record
//! - [`workspace`] -- Reserved, workspace-scoped experiment names
//! - [`experiments`] -- Experiment resolution, creation, and deletion
//! - [`records`] -- Ensemble record writes, reads, and listings
//! - [`error`] -- Shared error types

pub mod classify;
pub mod codec;
pub mod config;
pub mod error;
pub mod experiments;
pub mod records;
pub mod session;
pub mod workspace;

// Re-export primary types for convenience.
pub use classify::{Outcome, StatusPolicy};
pub use config::{Connection, ConnectionSource, StorageConfig};
pub use error::{ErrorContext, StorageError};
pub use experiments::ExperimentDirectory;
pub use records::RecordStore;
pub use session::{HttpSession, Method, Request, Response, Transport};
pub use workspace::Workspace;
