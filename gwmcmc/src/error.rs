//! Crate-wide error type.

use thiserror::Error;

/// Errors that can abort a run.
///
/// Per the error-handling design, only configuration problems are fatal:
/// numerical hazards (non-positive-definite covariance updates, a rejected
/// Cholesky factor, prior rejections) are recovered locally and never
/// surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// A parameter descriptor is internally inconsistent (e.g. lower bound
    /// above upper bound, or a start mode that cannot resolve to a value).
    #[error("invalid parameter descriptor for `{name}`: {reason}")]
    InvalidParameterDescriptor {
        /// Short name of the offending parameter.
        name: String,
        /// Human-readable reason.
        reason: String,
    },
    /// A prior range is degenerate or inverted after resolving shifted/scaled bounds.
    #[error("impossible prior range for `{name}`: [{lower}, {upper}]")]
    ImpossiblePriorRange {
        /// Short name of the offending parameter.
        name: String,
        /// Resolved lower bound.
        lower: f64,
        /// Resolved upper bound.
        upper: f64,
    },
    /// A parameter's fix-flag and start-mode request incompatible behavior
    /// (e.g. fixed to best value but asked to start uniform-on-prior).
    #[error("contradictory fix/start configuration for `{name}`")]
    ContradictoryFixStart {
        /// Short name of the offending parameter.
        name: String,
    },
    /// The temperature ladder is malformed (T0 != 1, or non-increasing).
    #[error("invalid temperature ladder: {reason}")]
    InvalidLadder {
        /// Human-readable reason.
        reason: String,
    },
    /// An error that does not originate in this crate.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Catch-all crate result alias.
pub type Result<T> = std::result::Result<T, Error>;
