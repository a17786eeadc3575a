//! Proposal Engine: the three Metropolis-Hastings kernels (spec §4.4).
//!
//! Grounded on `mcmc_mcmc.c`'s `uncorrelatedMCMCsingleUpdate`,
//! `uncorrelatedMCMCblockUpdate` and `correlatedMCMCupdate`. All three share
//! the large-jump overlay and the tempered Metropolis test; they differ only
//! in how the jump is drawn and whether acceptance is per-parameter or
//! whole-vector.

use crate::chain::ChainState;
use crate::likelihood::{is_finite_log_l, LikelihoodModel, NetworkId, WaveformId};
use crate::param::ParameterDescriptor;
use crate::prior::admit;
use crate::rng::RandomSource;

const ALPHA_STAR: f64 = 0.25;

/// Rare scaled jump multipliers shared by all three proposal kernels (spec
/// §4.4): an all-parameter multiplier drawn once per proposal, and an
/// independent per-parameter multiplier drawn for each free parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LargeJumpOverlay {
    /// Multiplier applied to every parameter in this proposal.
    pub all: f64,
}

impl LargeJumpOverlay {
    /// Draw the all-parameter multiplier: 100 w.p. 1e-4, else 10 w.p. 1e-3,
    /// else 1.
    #[must_use]
    pub fn draw(rng: &mut RandomSource) -> Self {
        let u = rng.uniform();
        let all = if u < 1.0e-4 {
            100.0
        } else if u < 1.0e-3 {
            10.0
        } else {
            1.0
        };
        Self { all }
    }

    /// Draw an independent per-parameter multiplier: 100 w.p. 1e-3, else 10
    /// w.p. 1e-2, else 1.
    #[must_use]
    pub fn draw_per_parameter(rng: &mut RandomSource) -> f64 {
        let u = rng.uniform();
        if u < 1.0e-3 {
            100.0
        } else if u < 1.0e-2 {
            10.0
        } else {
            1.0
        }
    }
}

/// Tempered Metropolis test (spec §4.4 step 4 / §4.9): accept iff
/// `exp(clamp(log_l_prop - log_l, -30, 0)) > u^temperature` and
/// `log_l_prop > min_log_l`, where `u ~ U(0,1)`.
#[must_use]
pub fn metropolis_accept(
    log_l: f64,
    log_l_prop: f64,
    temperature: f64,
    min_log_l: f64,
    rng: &mut RandomSource,
) -> bool {
    if !is_finite_log_l(log_l_prop) || log_l_prop <= min_log_l {
        return false;
    }
    let delta = (log_l_prop - log_l).clamp(-30.0, 0.0);
    let u: f64 = rng.uniform();
    delta.exp() > u.powf(temperature)
}

/// Robbins-Monro sigma adaptation step (spec §4.4 step 5/6): `gamma =
/// scale * (iter + 1)^(-1/6)`, then `sigma +- gamma * (1 - alpha*)` on
/// accept/`gamma * alpha*` on reject, clamped at zero from below.
fn adapt_sigma(sigma: f64, scale: f64, iter: u64, accepted: bool) -> f64 {
    let gamma = scale * (f64::from(u32::try_from(iter + 1).unwrap_or(u32::MAX))).powf(-1.0 / 6.0);
    let delta = if accepted {
        gamma * (1.0 - ALPHA_STAR)
    } else {
        -gamma * ALPHA_STAR
    };
    (sigma + delta).max(0.0)
}

/// Clamp an adapted sigma to the periodic period for angular parameters
/// (spec §4.4 step 6 "Apply angular-wrap caps to sigma"); a no-op for
/// non-periodic parameters.
fn clamp_periodic_sigma(sigma: f64, descriptor: &ParameterDescriptor) -> f64 {
    match descriptor.prior_kind.period() {
        Some(period) => sigma.min(period),
        None => sigma,
    }
}

/// Componentwise Gaussian proposal with per-parameter adaptive scale (spec
/// §4.4 "Componentwise Gaussian (uncorrelated_single)"). Updates `chain` in
/// place and returns the number of parameters accepted this iteration.
#[allow(clippy::too_many_arguments)]
pub fn uncorrelated_single<M: LikelihoodModel>(
    chain: &mut ChainState,
    params: &[ParameterDescriptor],
    free_mask: &[bool],
    model: &M,
    network: NetworkId,
    waveform: WaveformId,
    temperature: f64,
    min_log_l: f64,
    adapt: bool,
    iter: u64,
    rng: &mut RandomSource,
) -> u32 {
    let all_mult = LargeJumpOverlay::draw(rng).all;
    chain.x_prop.copy_from_slice(&chain.x);
    let mut accepted_count = 0u32;

    for (p, descriptor) in params.iter().enumerate() {
        if !free_mask[p] {
            continue;
        }
        let per_mult = LargeJumpOverlay::draw_per_parameter(rng);
        let z = rng.normal(chain.sigma[p]) * per_mult * all_mult;
        let raw = chain.x[p] + z;

        let admission = admit(raw, descriptor);
        chain.last_jump[p] = z.abs();

        if !admission.admissible {
            if adapt {
                chain.sigma[p] = clamp_periodic_sigma(
                    adapt_sigma(chain.sigma[p], chain.scale[p], iter, false),
                    descriptor,
                );
            }
            continue;
        }

        chain.x_prop[p] = admission.value;
        model.localize(&mut chain.x_prop, network);
        chain.log_l_prop = model.log_likelihood(&chain.x_prop, network, waveform);

        let accept = metropolis_accept(chain.log_l, chain.log_l_prop, temperature, min_log_l, rng);
        if accept {
            chain.x[p] = admission.value;
            chain.log_l = chain.log_l_prop;
            chain.accepted[p] += 1;
            accepted_count += 1;
            if adapt {
                chain.sigma[p] = clamp_periodic_sigma(
                    adapt_sigma(chain.sigma[p], chain.scale[p], iter, true),
                    descriptor,
                );
            }
        } else {
            chain.x_prop[p] = chain.x[p];
            if adapt {
                chain.sigma[p] = clamp_periodic_sigma(
                    adapt_sigma(chain.sigma[p], chain.scale[p], iter, false),
                    descriptor,
                );
            }
        }
    }

    chain.update_running_max();
    accepted_count
}

/// Block Gaussian proposal across all free parameters at once (spec §4.4
/// "Block Gaussian (uncorrelated_block)"). No per-parameter adaptation.
/// Returns whether the whole-vector proposal was accepted.
#[allow(clippy::too_many_arguments)]
pub fn uncorrelated_block<M: LikelihoodModel>(
    chain: &mut ChainState,
    params: &[ParameterDescriptor],
    free_mask: &[bool],
    model: &M,
    network: NetworkId,
    waveform: WaveformId,
    temperature: f64,
    min_log_l: f64,
    rng: &mut RandomSource,
) -> bool {
    let all_mult = LargeJumpOverlay::draw(rng).all;
    chain.x_prop.copy_from_slice(&chain.x);
    let mut admissible = true;

    for (p, descriptor) in params.iter().enumerate() {
        if !free_mask[p] {
            continue;
        }
        let per_mult = LargeJumpOverlay::draw_per_parameter(rng);
        let z = rng.normal(chain.sigma[p]) * per_mult * all_mult;
        let admission = admit(chain.x[p] + z, descriptor);
        chain.x_prop[p] = admission.value;
        admissible &= admission.admissible;
    }

    chain.prior_admissible = admissible;
    if !admissible {
        return false;
    }

    model.localize(&mut chain.x_prop, network);
    chain.log_l_prop = model.log_likelihood(&chain.x_prop, network, waveform);

    let accept = metropolis_accept(chain.log_l, chain.log_l_prop, temperature, min_log_l, rng);
    if accept {
        for (p, &is_free) in free_mask.iter().enumerate() {
            if is_free {
                chain.x[p] = chain.x_prop[p];
                chain.accepted[p] += 1;
            }
        }
        chain.log_l = chain.log_l_prop;
    }
    chain.update_running_max();
    accept
}

/// Correlated multivariate Gaussian proposal via the chain's live Cholesky
/// factor (spec §4.4 "Correlated Gaussian"). Updates `chain.sigma_corr` per
/// the acceptance outcome. Returns whether the proposal was accepted.
#[allow(clippy::too_many_arguments)]
pub fn correlated<M: LikelihoodModel>(
    chain: &mut ChainState,
    params: &[ParameterDescriptor],
    free_mask: &[bool],
    model: &M,
    network: NetworkId,
    waveform: WaveformId,
    temperature: f64,
    min_log_l: f64,
    adapt: bool,
    rng: &mut RandomSource,
) -> bool {
    let all_mult = LargeJumpOverlay::draw(rng).all;
    let n = params.len();
    let z: Vec<f64> = (0..n)
        .map(|_| {
            let per_mult = LargeJumpOverlay::draw_per_parameter(rng);
            rng.standard_normal() * chain.sigma_corr * per_mult * all_mult
        })
        .collect();

    chain.x_prop.copy_from_slice(&chain.x);
    let mut admissible = true;

    for (p1, descriptor) in params.iter().enumerate() {
        if !free_mask[p1] {
            continue;
        }
        let mut delta = 0.0;
        for p2 in 0..=p1 {
            delta += chain.cholesky.get(p1, p2) * z[p2];
        }
        let admission = admit(chain.x[p1] + delta, descriptor);
        chain.x_prop[p1] = admission.value;
        chain.last_jump[p1] = delta.abs();
        admissible &= admission.admissible;
    }

    chain.prior_admissible = admissible;
    if !admissible {
        return false;
    }

    model.localize(&mut chain.x_prop, network);
    chain.log_l_prop = model.log_likelihood(&chain.x_prop, network, waveform);

    let accept = metropolis_accept(chain.log_l, chain.log_l_prop, temperature, min_log_l, rng);
    if accept {
        for (p, &is_free) in free_mask.iter().enumerate() {
            if is_free {
                chain.x[p] = chain.x_prop[p];
                chain.accepted[p] += 1;
            }
        }
        chain.log_l = chain.log_l_prop;
        if adapt {
            chain.sigma_corr *= 10.0;
        }
    } else if adapt {
        chain.sigma_corr *= 0.5;
    }
    chain.update_running_max();
    accept
}

/// Which kernel `select_proposal_kind` chose for one iteration (spec §4.4
/// "Proposal mix per iteration").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalKind {
    /// Componentwise Gaussian.
    Componentwise,
    /// Block Gaussian across all free parameters.
    Block,
    /// Correlated multivariate Gaussian.
    Correlated,
}

/// Draw which kernel to use this iteration: `u > corr_frac` selects an
/// uncorrelated kernel (block if a second draw `< block_frac`, else
/// componentwise); otherwise correlated.
#[must_use]
pub fn select_proposal_kind(corr_frac: f64, block_frac: f64, rng: &mut RandomSource) -> ProposalKind {
    let u: f64 = rng.uniform();
    if u > corr_frac {
        let v: f64 = rng.uniform();
        if v < block_frac {
            ProposalKind::Block
        } else {
            ProposalKind::Componentwise
        }
    } else {
        ProposalKind::Correlated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{FixMode, PriorKind, StartMode};

    struct FixedLikelihood {
        value: f64,
    }

    impl LikelihoodModel for FixedLikelihood {
        fn localize(&self, _params: &mut [f64], _network: NetworkId) {}
        fn log_likelihood(&self, _params: &[f64], _network: NetworkId, _waveform: WaveformId) -> f64 {
            self.value
        }
    }

    fn descriptor(best: f64) -> ParameterDescriptor {
        ParameterDescriptor {
            id: 0,
            short_name: "p".to_string(),
            long_name: "p".to_string(),
            best_value: best,
            sigma: 0.1,
            fix: FixMode::Free,
            start: StartMode::Best,
            prior_kind: PriorKind::Reflect,
            lower: -100.0,
            upper: 100.0,
        }
    }

    #[test]
    fn metropolis_always_accepts_strict_improvement_at_t1() {
        let mut rng = RandomSource::from_seed(1);
        // A slightly-improving likelihood with a generous floor should
        // virtually always pass: exp(0) = 1 > u^1 unless u == 1.0 exactly.
        let accept = metropolis_accept(-1.0, -1.0, 1.0, -100.0, &mut rng);
        assert!(accept);
    }

    #[test]
    fn metropolis_rejects_below_floor() {
        let mut rng = RandomSource::from_seed(2);
        assert!(!metropolis_accept(-1.0, -0.5, 1.0, 0.0, &mut rng));
    }

    #[test]
    fn sigma_never_goes_negative() {
        let mut sigma = 0.001;
        for iter in 0..100 {
            sigma = adapt_sigma(sigma, 10.0, iter, false);
            assert!(sigma >= 0.0);
        }
    }

    #[test]
    fn uncorrelated_single_accepts_with_always_improving_likelihood() {
        let params = vec![descriptor(0.0), descriptor(0.0)];
        let free_mask = vec![true, true];
        let mut chain = ChainState::new(&params, 10, false);
        chain.log_l = 1.0;
        let model = FixedLikelihood { value: 2.0 };
        let mut rng = RandomSource::from_seed(7);

        let accepted = uncorrelated_single(
            &mut chain, &params, &free_mask, &model, 0, 0, 1.0, 0.0, false, 0, &mut rng,
        );
        assert!(accepted > 0);
        assert!((chain.log_l - 2.0).abs() < 1e-12);
    }

    #[test]
    fn block_proposal_rejects_when_out_of_bounds() {
        let mut narrow = descriptor(0.0);
        narrow.lower = -0.001;
        narrow.upper = 0.001;
        narrow.sigma = 1000.0; // guarantees the raw draw overshoots past a single reflection
        let params = vec![narrow];
        let free_mask = vec![true];
        let mut chain = ChainState::new(&params, 10, false);
        chain.log_l = 1.0;
        let model = FixedLikelihood { value: 5.0 };
        let mut rng = RandomSource::from_seed(3);
        let accept =
            uncorrelated_block(&mut chain, &params, &free_mask, &model, 0, 0, 1.0, 0.0, &mut rng);
        if !accept {
            assert!((chain.log_l - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn correlated_with_zero_cholesky_factor_is_a_null_move() {
        let params = vec![descriptor(1.0), descriptor(2.0)];
        let free_mask = vec![true, true];
        let mut chain = ChainState::new(&params, 10, true);
        chain.log_l = 1.0;
        // cholesky is Matrix::zeros by construction: delta is always zero.
        let model = FixedLikelihood { value: 2.0 };
        let mut rng = RandomSource::from_seed(11);
        let accept = correlated(
            &mut chain, &params, &free_mask, &model, 0, 0, 1.0, 0.0, true, &mut rng,
        );
        assert!(accept);
        assert!((chain.x[0] - 1.0).abs() < 1e-12);
        assert!((chain.x[1] - 2.0).abs() < 1e-12);
        assert!((chain.sigma_corr - 10.0).abs() < 1e-9);
    }

    #[test]
    fn select_proposal_kind_is_correlated_below_corr_frac() {
        // corr_frac = 1.0 means u (in [0,1)) is never > corr_frac, so the
        // draw is always correlated regardless of the RNG stream.
        let mut rng = RandomSource::from_seed(42);
        for _ in 0..20 {
            assert_eq!(select_proposal_kind(1.0, 0.5, &mut rng), ProposalKind::Correlated);
        }
    }
}
