//! Parameter distributions for the ensemble storage client.
//!
//! A [`Distribution`] describes the prior of one parameter record. Sampling
//! it yields a [`Record`](ensemble_types::Record) shaped by its [`Shape`];
//! sampling it `n` times yields an [`EnsembleRecord`](ensemble_types::EnsembleRecord)
//! ready to be stored.
//!
//! # Modules
//!
//! - [`distribution`] -- Distribution families, shapes, sampling, and quantiles
//! - [`normal`] -- Standard normal draws and the normal quantile function
//! - [`error`] -- Error types for invalid distributions ([`StatsError`])

pub mod distribution;
pub mod error;
pub mod normal;

pub use distribution::{Distribution, Family, Shape};
pub use error::StatsError;
