//! Run configuration surface (SPEC_FULL §10.3).
//!
//! Spec §6 lists this as "consumed, not defined here" for file/CLI parsing,
//! but the sampler still needs a typed surface to validate and run against;
//! loading it from a file or flags is the caller's job.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::param::ParameterDescriptor;
use crate::temperature::LadderMode;

/// All knobs the sampler itself consumes (spec §6's configuration-surface list).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    /// Total outer iterations.
    pub n_iter: u64,
    /// Burn-in length (annealing end-point, also gates adaptation in some runs).
    pub n_burn: u64,
    /// Burn-in start-point for annealing (spec §4.7 `Nburn0`).
    pub n_burn0: u64,
    /// Emit every `thin_output`-th iteration for the T=1 chain.
    pub thin_output: u64,
    /// Additionally multiply `thin_output` by this for hot chains.
    pub save_hot_chains: u64,
    /// Number of temperature rungs, `K`.
    pub n_temps: usize,
    /// How the ladder is built.
    pub ladder_mode: LadderMode,
    /// Whether parallel tempering is enabled at all (`K == 1` forces this false).
    pub parallel_tempering: bool,
    /// Target acceptance rate for componentwise adaptation (spec §4.4: 0.25).
    pub target_acceptance: f64,
    /// Minimum-logL floor (`minLogL`).
    pub min_log_l: f64,
    /// Correlation window length, `nCorr`.
    pub n_corr: usize,
    /// Matrix-accept fraction, `mataccfr`.
    pub mat_acc_fr: f64,
    /// Fraction of iterations using the correlated kernel.
    pub corr_frac: f64,
    /// Fraction of the remaining iterations using the block kernel.
    pub block_frac: f64,
    /// Whether componentwise/correlated adaptation is enabled.
    pub adapt: bool,
    /// Start-offset width multiplier (`offsetX`).
    pub offset_x: f64,
    /// Initial annealing temperature (ignored when `parallel_tempering` is set).
    pub anneal_temp0: f64,
    /// PRNG seed.
    pub seed: u64,
    /// Per-parameter descriptors.
    pub parameters: Vec<ParameterDescriptor>,
}

impl RunConfig {
    /// Validate the fatal-at-startup invariants from spec §7
    /// "Configuration errors": parameter descriptors must resolve, the
    /// ladder size must agree with `n_temps`, and the proposal-mix
    /// fractions and `n_corr` must make sense.
    ///
    /// # Errors
    /// Returns the first [`Error`] found; does not attempt to collect all of them.
    pub fn validate(&mut self) -> Result<()> {
        if self.n_corr == 0 {
            return Err(Error::Other(anyhow::anyhow!(
                "n_corr must be at least 1"
            )));
        }
        if !(0.0..=1.0).contains(&self.corr_frac) || !(0.0..=1.0).contains(&self.block_frac) {
            return Err(Error::Other(anyhow::anyhow!(
                "corr_frac and block_frac must lie in [0, 1]"
            )));
        }
        if self.mat_acc_fr < 0.0 {
            return Err(Error::Other(anyhow::anyhow!(
                "mat_acc_fr must be non-negative"
            )));
        }
        if self.n_temps == 0 {
            return Err(Error::InvalidLadder {
                reason: "n_temps must be at least 1".to_string(),
            });
        }

        for param in &mut self.parameters {
            param.resolve()?;
        }

        Ok(())
    }
}
