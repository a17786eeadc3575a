//! Startup Offset Search (spec §4.8).
//!
//! Grounded on `mcmc_mcmc.c`'s `startMCMCOffset`: seed each parameter from
//! its best/injection value, then — only for parameters whose start mode
//! asks for randomness — redraw and reject until the likelihood clears
//! `minLogL + 1`, or give up after one pass if the injection and sampling
//! waveforms disagree on which parameters exist.

use crate::likelihood::{LikelihoodModel, NetworkId, WaveformId};
use crate::param::{ParameterDescriptor, StartMode};
use crate::prior::admit;
use crate::rng::RandomSource;

/// Outcome of the startup search.
#[derive(Clone, Debug)]
pub struct StartupOutcome {
    /// The accepted (or last-drawn, on give-up) starting parameter vector.
    pub params: Vec<f64>,
    /// Its log-likelihood.
    pub log_l: f64,
    /// Number of candidate draws attempted.
    pub draws: u64,
    /// Whether the search gave up before clearing the floor (spec §7
    /// "Startup search failure").
    pub gave_up: bool,
}

fn seed(descriptor: &ParameterDescriptor, injection: Option<f64>, n_diff_par: &mut u32) -> f64 {
    match descriptor.start {
        StartMode::Best | StartMode::GaussianAroundBest => descriptor.best_value,
        StartMode::Injection | StartMode::GaussianAroundInjection => injection.unwrap_or_else(|| {
            *n_diff_par += 1;
            descriptor.best_value
        }),
        StartMode::UniformPrior => descriptor.best_value,
    }
}

fn needs_random_draw(mode: StartMode) -> bool {
    matches!(
        mode,
        StartMode::GaussianAroundBest | StartMode::GaussianAroundInjection | StartMode::UniformPrior
    )
}

/// Run the startup search.
///
/// `injection[i]` is `Some(value)` when parameter `i` has a corresponding
/// injection value, `None` when the injection waveform doesn't carry that
/// parameter (spec §4.8, §7 "injection waveform differs from the sampling
/// waveform").
#[allow(clippy::too_many_arguments)]
pub fn search_start<M: LikelihoodModel>(
    descriptors: &[ParameterDescriptor],
    injection: &[Option<f64>],
    offset_x: f64,
    min_log_l: f64,
    model: &M,
    network: NetworkId,
    waveform: WaveformId,
    rng: &mut RandomSource,
) -> StartupOutcome {
    let mut n_diff_par = 0u32;
    let mut params: Vec<f64> = descriptors
        .iter()
        .zip(injection)
        .map(|(d, inj)| seed(d, *inj, &mut n_diff_par))
        .collect();

    let any_random = descriptors.iter().any(|d| needs_random_draw(d.start));
    let waveform_mismatch_break = n_diff_par > 0;

    let mut log_l = f64::NEG_INFINITY;
    let mut draws = 0u64;
    let mut gave_up = false;

    if any_random {
        loop {
            let mut admissible = true;
            for (i, descriptor) in descriptors.iter().enumerate() {
                match descriptor.start {
                    StartMode::GaussianAroundBest | StartMode::GaussianAroundInjection => {
                        let candidate = params[i] + offset_x * rng.normal(descriptor.sigma);
                        let admission = admit(candidate, descriptor);
                        params[i] = admission.value;
                        admissible &= admission.admissible;
                    }
                    StartMode::UniformPrior => {
                        let width = descriptor.upper - descriptor.lower;
                        let candidate = descriptor.lower + rng.uniform() * width;
                        let admission = admit(candidate, descriptor);
                        params[i] = admission.value;
                        admissible &= admission.admissible;
                    }
                    StartMode::Best | StartMode::Injection => {}
                }
            }

            draws += 1;
            if admissible {
                model.localize(&mut params, network);
                log_l = model.log_likelihood(&params, network, waveform);
            }

            if log_l >= min_log_l + 1.0 {
                break;
            }
            if waveform_mismatch_break {
                gave_up = true;
                break;
            }
        }
    } else {
        model.localize(&mut params, network);
        log_l = model.log_likelihood(&params, network, waveform);
    }

    StartupOutcome {
        params,
        log_l,
        draws,
        gave_up,
    }
}
