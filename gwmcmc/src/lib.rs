//! Adaptive, parallel-tempered Metropolis-Hastings MCMC engine for
//! gravitational-wave compact-binary parameter estimation.
//!
//! This crate implements the sampler core only: proposal kernels, online
//! covariance estimation, the temperature ladder and swap coordinator, the
//! annealing schedule, prior/boundary handling and the startup search.
//! Waveform generation, likelihood evaluation, detector-data ingestion and
//! configuration/CLI parsing are external collaborators — see
//! [`likelihood::LikelihoodModel`] and [`config::RunConfig`].

pub mod annealing;
pub mod chain;
pub mod cholesky;
pub mod config;
pub mod covariance;
pub mod error;
pub mod likelihood;
pub mod output;
pub mod param;
pub mod prior;
pub mod proposal;
pub mod rng;
pub mod sampler;
pub mod startup;
pub mod swap;
pub mod temperature;

pub use chain::ChainState;
pub use config::RunConfig;
pub use error::{Error, Result};
pub use likelihood::{LikelihoodModel, NetworkId, WaveformId};
pub use param::ParameterDescriptor;
pub use sampler::Sampler;
