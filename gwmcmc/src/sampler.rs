//! Driver Loop: owns the iteration counter and dispatches to every other
//! component each outer iteration (spec §4.9, component 11).
//!
//! Grounded on the `while(iIter<=nIter)` loop in `mcmc_mcmc.c`'s `MCMC()`:
//! per temperature rung, pick and run a proposal kernel, track the running
//! maximum, periodically refresh the covariance factor, then run the swap
//! coordinator (or the annealing schedule when tempering is off).

use tracing::{debug, trace, warn};

use crate::annealing::anneal_temperature;
use crate::chain::{ChainState, CORR_ONLINE_ADAPTIVE};
use crate::config::RunConfig;
use crate::covariance;
use crate::error::Result;
use crate::likelihood::{LikelihoodModel, NetworkId, WaveformId};
use crate::proposal::{self, ProposalKind};
use crate::rng::RandomSource;
use crate::startup::search_start;
use crate::swap::{self, SwapCandidate, SwapStatistics};
use crate::temperature::TemperatureLadder;

/// The adaptive, parallel-tempered Metropolis-Hastings sampler.
pub struct Sampler<M: LikelihoodModel> {
    config: RunConfig,
    free_mask: Vec<bool>,
    ladder: TemperatureLadder,
    chains: Vec<ChainState>,
    swap_stats: SwapStatistics,
    rng: RandomSource,
    iter: u64,
    model: M,
    network: NetworkId,
    waveform: WaveformId,
    /// Per-chain PRNG sub-streams (spec §5 "any parallelization must split
    /// the stream deterministically"), used only by [`Sampler::step_parallel`].
    #[cfg(feature = "parallel-chains")]
    chain_rngs: Vec<RandomSource>,
}

impl<M: LikelihoodModel> Sampler<M> {
    /// Build a sampler: validate the configuration, construct the
    /// temperature ladder, run the startup offset search on the `T = 1`
    /// chain and replicate its starting state into every hot chain (spec
    /// §4.8 step 3).
    ///
    /// # Errors
    /// Propagates [`RunConfig::validate`]'s and [`TemperatureLadder::new`]'s errors.
    pub fn new(
        mut config: RunConfig,
        injection: &[Option<f64>],
        model: M,
        network: NetworkId,
        waveform: WaveformId,
    ) -> Result<Self> {
        config.validate()?;
        let free_mask: Vec<bool> = config
            .parameters
            .iter()
            .map(|p| p.fix == crate::param::FixMode::Free)
            .collect();
        let ladder = TemperatureLadder::new(config.n_temps, &config.ladder_mode, config.n_corr)?;

        let mut rng = RandomSource::from_seed(config.seed);
        let outcome = search_start(
            &config.parameters,
            injection,
            config.offset_x,
            config.min_log_l,
            &model,
            network,
            waveform,
            &mut rng,
        );
        if outcome.gave_up {
            warn!(
                draws = outcome.draws,
                log_l = outcome.log_l,
                "startup search gave up before clearing the likelihood floor"
            );
        } else {
            debug!(draws = outcome.draws, log_l = outcome.log_l, "startup search converged");
        }

        let k = ladder.k();
        let mut chains = Vec::with_capacity(k);
        for _ in 0..k {
            let mut chain = ChainState::new(&config.parameters, config.n_corr, config.adapt);
            chain.x.copy_from_slice(&outcome.params);
            chain.x_prop.copy_from_slice(&outcome.params);
            chain.log_l = outcome.log_l;
            chain.max_log_l = outcome.log_l;
            chain.max_params.copy_from_slice(&outcome.params);
            chains.push(chain);
        }

        let swap_stats = SwapStatistics::new(k);

        #[cfg(feature = "parallel-chains")]
        let chain_rngs = (0..k).map(|i| rng.sub_stream(i)).collect();

        Ok(Self {
            config,
            free_mask,
            ladder,
            chains,
            swap_stats,
            rng,
            iter: 0,
            model,
            network,
            waveform,
            #[cfg(feature = "parallel-chains")]
            chain_rngs,
        })
    }

    /// Current outer iteration index.
    #[must_use]
    pub const fn iteration(&self) -> u64 {
        self.iter
    }

    /// Read-only access to the chain state for rung `i`.
    #[must_use]
    pub fn chain(&self, i: usize) -> &ChainState {
        &self.chains[i]
    }

    /// Read-only access to the swap statistics.
    #[must_use]
    pub const fn swap_statistics(&self) -> &SwapStatistics {
        &self.swap_stats
    }

    /// Number of temperature rungs, `K`.
    #[must_use]
    pub fn n_rungs(&self) -> usize {
        self.ladder.k()
    }

    /// The ladder's base (unmodulated) maximum temperature.
    #[must_use]
    pub fn max_temperature(&self) -> f64 {
        self.ladder.base(self.ladder.k() - 1)
    }

    /// This rung's current effective temperature (ladder-based or annealed,
    /// per [`Sampler::step`]'s dispatch).
    #[must_use]
    pub fn temperature_for(&self, rung: usize) -> f64 {
        if self.config.parallel_tempering {
            self.ladder.effective(rung, self.iter)
        } else if rung == 0 && self.config.anneal_temp0 > 1.0 {
            anneal_temperature(self.config.anneal_temp0, self.config.n_burn, self.config.n_burn0, self.iter)
        } else {
            1.0
        }
    }

    /// Advance every chain by one outer iteration, then run the swap
    /// coordinator (spec §4.9, §5 "Ordering guarantees").
    pub fn step(&mut self) {
        for i in 0..self.ladder.k() {
            let temperature = self.temperature_for(i);
            let kind = proposal::select_proposal_kind(
                self.config.corr_frac,
                self.config.block_frac,
                &mut self.rng,
            );
            match kind {
                ProposalKind::Componentwise => {
                    self.chains[i].prior_admissible = true;
                    proposal::uncorrelated_single(
                        &mut self.chains[i],
                        &self.config.parameters,
                        &self.free_mask,
                        &self.model,
                        self.network,
                        self.waveform,
                        temperature,
                        self.config.min_log_l,
                        self.config.adapt,
                        self.iter,
                        &mut self.rng,
                    );
                }
                ProposalKind::Block => {
                    proposal::uncorrelated_block(
                        &mut self.chains[i],
                        &self.config.parameters,
                        &self.free_mask,
                        &self.model,
                        self.network,
                        self.waveform,
                        temperature,
                        self.config.min_log_l,
                        &mut self.rng,
                    );
                }
                ProposalKind::Correlated => {
                    proposal::correlated(
                        &mut self.chains[i],
                        &self.config.parameters,
                        &self.free_mask,
                        &self.model,
                        self.network,
                        self.waveform,
                        temperature,
                        self.config.min_log_l,
                        self.config.adapt,
                        &mut self.rng,
                    );
                }
            }

            Self::update_covariance_if_due(&mut self.chains[i], &self.free_mask, self.config.mat_acc_fr, i);
            trace!(rung = i, iter = self.iter, log_l = self.chains[i].log_l, "chain advanced");
        }

        if self.config.parallel_tempering && self.ladder.k() > 1 {
            self.attempt_swaps();
        }

        self.iter += 1;
    }

    /// Run the proposal step for every chain concurrently via `rayon`,
    /// each using its own PRNG sub-stream, then run the swap coordinator
    /// on the main thread (spec §5's three conditions for parallelizing
    /// across temperature chains: per-chain sub-streams, a barrier before
    /// swaps, and a covariance estimator serialized per chain — satisfied
    /// here since each chain only ever touches its own history/factor).
    #[cfg(feature = "parallel-chains")]
    pub fn step_parallel(&mut self)
    where
        M: Sync,
    {
        use rayon::prelude::*;

        let config = &self.config;
        let free_mask = &self.free_mask;
        let ladder = &self.ladder;
        let model = &self.model;
        let network = self.network;
        let waveform = self.waveform;
        let iter = self.iter;
        let parallel_tempering = config.parallel_tempering;
        let anneal_temp0 = config.anneal_temp0;
        let n_burn = config.n_burn;
        let n_burn0 = config.n_burn0;

        self.chains
            .par_iter_mut()
            .zip(self.chain_rngs.par_iter_mut())
            .enumerate()
            .for_each(|(i, (chain, chain_rng))| {
                let temperature = if parallel_tempering {
                    ladder.effective(i, iter)
                } else if i == 0 && anneal_temp0 > 1.0 {
                    anneal_temperature(anneal_temp0, n_burn, n_burn0, iter)
                } else {
                    1.0
                };
                let kind = proposal::select_proposal_kind(config.corr_frac, config.block_frac, chain_rng);
                match kind {
                    ProposalKind::Componentwise => {
                        chain.prior_admissible = true;
                        proposal::uncorrelated_single(
                            chain,
                            &config.parameters,
                            free_mask,
                            model,
                            network,
                            waveform,
                            temperature,
                            config.min_log_l,
                            config.adapt,
                            iter,
                            chain_rng,
                        );
                    }
                    ProposalKind::Block => {
                        proposal::uncorrelated_block(
                            chain,
                            &config.parameters,
                            free_mask,
                            model,
                            network,
                            waveform,
                            temperature,
                            config.min_log_l,
                            chain_rng,
                        );
                    }
                    ProposalKind::Correlated => {
                        proposal::correlated(
                            chain,
                            &config.parameters,
                            free_mask,
                            model,
                            network,
                            waveform,
                            temperature,
                            config.min_log_l,
                            config.adapt,
                            chain_rng,
                        );
                    }
                }
                Self::update_covariance_if_due(chain, free_mask, config.mat_acc_fr, i);
            });

        if self.config.parallel_tempering && self.ladder.k() > 1 {
            self.attempt_swaps();
        }
        self.iter += 1;
    }

    fn update_covariance_if_due(chain: &mut ChainState, free_mask: &[bool], mat_acc_fr: f64, rung: usize) {
        if !chain.prior_admissible || chain.corr_update < CORR_ONLINE_ADAPTIVE {
            return;
        }
        let current = chain.x.clone();
        chain.history.push(&current);
        if !chain.history.is_full() {
            return;
        }

        let mut generation = chain.corr_update;
        let (outcome, mean, dev) = covariance::update(
            &chain.history,
            free_mask,
            free_mask.iter().filter(|&&f| f).count(),
            mat_acc_fr,
            &mut chain.cholesky,
            &mut generation,
        );
        chain.corr_update = generation;
        chain.hist_mean = mean;
        chain.hist_dev = dev;
        chain.history.reset();

        if outcome.adopted {
            debug!(rung, improved_diag = outcome.improved_diag, "covariance factor adopted");
        } else {
            warn!(rung, improved_diag = outcome.improved_diag, "covariance update rejected, previous factor retained");
        }
    }

    fn attempt_swaps(&mut self) {
        let candidates: Vec<SwapCandidate> = (0..self.ladder.k())
            .map(|i| SwapCandidate {
                temperature: self.temperature_for(i),
                log_l: self.chains[i].log_l,
            })
            .collect();

        let swapped = swap::attempt_all_pairs(&candidates, &mut self.swap_stats, &mut self.rng, |_, _| {});

        for (i, j) in swapped {
            let (lo, hi) = self.chains.split_at_mut(j);
            let chain_i = &mut lo[i];
            let chain_j = &mut hi[0];
            std::mem::swap(&mut chain_i.x, &mut chain_j.x);
            std::mem::swap(&mut chain_i.log_l, &mut chain_j.log_l);
            debug!(i, j, "chains swapped");
        }
    }

    /// Enable online-adaptive covariance estimation on rung `i` (spec §3
    /// `corrUpdate`), starting from an initial diagonal covariance seeded
    /// from each free parameter's configured sigma.
    pub fn enable_covariance_adaptation(&mut self, i: usize) {
        let chain = &mut self.chains[i];
        for (p, descriptor) in self.config.parameters.iter().enumerate() {
            if self.free_mask[p] {
                chain.cholesky.set(p, p, descriptor.sigma);
            }
        }
        chain.corr_update = CORR_ONLINE_ADAPTIVE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{FixMode, ParameterDescriptor, PriorKind, StartMode};
    use crate::temperature::LadderMode;

    struct GaussianTarget {
        inv_cov_diag: Vec<f64>,
    }

    impl LikelihoodModel for GaussianTarget {
        fn localize(&self, _params: &mut [f64], _network: NetworkId) {}
        fn log_likelihood(&self, params: &[f64], _network: NetworkId, _waveform: WaveformId) -> f64 {
            let neg_half_chi2: f64 = params
                .iter()
                .zip(&self.inv_cov_diag)
                .map(|(&x, &inv_var)| -0.5 * x * x * inv_var)
                .sum();
            // Shift positive: the sampler treats <= 0 as inadmissible.
            neg_half_chi2 + 1000.0
        }
    }

    fn two_param_config() -> RunConfig {
        RunConfig {
            n_iter: 100,
            n_burn: 50,
            n_burn0: 5,
            thin_output: 1,
            save_hot_chains: 1,
            n_temps: 1,
            ladder_mode: LadderMode::GeometricFixed { temp_max: 1.0 },
            parallel_tempering: false,
            target_acceptance: 0.25,
            min_log_l: 0.0,
            n_corr: 50,
            mat_acc_fr: 0.5,
            corr_frac: 0.1,
            block_frac: 0.2,
            adapt: true,
            offset_x: 1.0,
            anneal_temp0: 1.0,
            seed: 123,
            parameters: vec![
                ParameterDescriptor {
                    id: 0,
                    short_name: "x".to_string(),
                    long_name: "x".to_string(),
                    best_value: 0.5,
                    sigma: 0.3,
                    fix: FixMode::Free,
                    start: StartMode::Best,
                    prior_kind: PriorKind::Reflect,
                    lower: -10.0,
                    upper: 10.0,
                },
                ParameterDescriptor {
                    id: 1,
                    short_name: "y".to_string(),
                    long_name: "y".to_string(),
                    best_value: -0.5,
                    sigma: 0.3,
                    fix: FixMode::Free,
                    start: StartMode::Best,
                    prior_kind: PriorKind::Reflect,
                    lower: -10.0,
                    upper: 10.0,
                },
            ],
        }
    }

    #[test]
    fn sampler_runs_and_keeps_priors_satisfied() {
        let config = two_param_config();
        let model = GaussianTarget { inv_cov_diag: vec![1.0, 1.0] };
        let mut sampler = Sampler::new(config, &[None, None], model, 0, 0).unwrap();

        for _ in 0..500 {
            sampler.step();
            let chain = sampler.chain(0);
            for (p, &x) in chain.x.iter().enumerate() {
                let descriptor = &sampler.config.parameters[p];
                assert!(x >= descriptor.lower && x <= descriptor.upper);
            }
        }
        assert_eq!(sampler.iteration(), 500);
    }

    #[test]
    fn running_max_is_monotone_non_decreasing() {
        let config = two_param_config();
        let model = GaussianTarget { inv_cov_diag: vec![1.0, 1.0] };
        let mut sampler = Sampler::new(config, &[None, None], model, 0, 0).unwrap();

        let mut last_max = sampler.chain(0).max_log_l;
        for _ in 0..300 {
            sampler.step();
            let current_max = sampler.chain(0).max_log_l;
            assert!(current_max >= last_max);
            last_max = current_max;
        }
    }

    #[test]
    fn single_rung_ladder_never_swaps() {
        let config = two_param_config();
        let model = GaussianTarget { inv_cov_diag: vec![1.0, 1.0] };
        let mut sampler = Sampler::new(config, &[None, None], model, 0, 0).unwrap();
        for _ in 0..50 {
            sampler.step();
        }
        assert_eq!(sampler.swap_statistics().row_total(0), 0);
    }
}
