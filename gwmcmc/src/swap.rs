//! Parallel Tempering Coordinator's all-pairs swap step (spec §4.6).
//!
//! Grounded on the swap loop in `mcmc_mcmc.c`'s outer iteration (searched for
//! via the `swapTemperatures`-era bookkeeping comments in the same file):
//! every ordered pair `(i, j)`, `i < j`, is tried once per outer iteration,
//! independent of adjacency, giving long-range mixing across temperatures.

use crate::rng::RandomSource;

/// Pairwise swap bookkeeping for a `k`-rung ladder (spec §3 "inter-chain
/// swap counters: pairwise matrix and per-row/per-column totals").
#[derive(Clone, Debug)]
pub struct SwapStatistics {
    k: usize,
    matrix: Vec<u64>,
    row_totals: Vec<u64>,
    col_totals: Vec<u64>,
}

impl SwapStatistics {
    /// Zeroed statistics for a `k`-rung ladder.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k,
            matrix: vec![0; k * k],
            row_totals: vec![0; k],
            col_totals: vec![0; k],
        }
    }

    /// Count of accepted swaps between `i` and `j`.
    #[must_use]
    pub fn count(&self, i: usize, j: usize) -> u64 {
        self.matrix[i * self.k + j]
    }

    /// Total accepted swaps proposed from row `i`.
    #[must_use]
    pub fn row_total(&self, i: usize) -> u64 {
        self.row_totals[i]
    }

    /// Total accepted swaps landing in column `j`.
    #[must_use]
    pub fn col_total(&self, j: usize) -> u64 {
        self.col_totals[j]
    }

    fn record(&mut self, i: usize, j: usize) {
        self.matrix[i * self.k + j] += 1;
        self.row_totals[i] += 1;
        self.col_totals[j] += 1;
    }
}

/// One chain's temperature and log-likelihood, as seen by the swap
/// coordinator (spec §5 "swap decisions use the log-likelihoods produced in
/// the same outer iteration").
#[derive(Clone, Copy, Debug)]
pub struct SwapCandidate {
    /// Chain's current temperature.
    pub temperature: f64,
    /// Chain's current log-likelihood.
    pub log_l: f64,
}

/// Attempt all `i < j` pairs (spec §4.6) over `chains`, swapping
/// `params`/`log_l` in place (via the caller-provided accessor closures) and
/// recording accepted swaps in `stats`. Returns the list of `(i, j)` pairs
/// that swapped.
pub fn attempt_all_pairs<F>(
    chains: &[SwapCandidate],
    stats: &mut SwapStatistics,
    rng: &mut RandomSource,
    mut swap_states: F,
) -> Vec<(usize, usize)>
where
    F: FnMut(usize, usize),
{
    let k = chains.len();
    let mut swapped = Vec::new();
    // Rungs keep their temperature; only parameter vectors/log-likelihoods
    // move between them, so log_l is tracked here and mirrored back to the
    // caller's state via `swap_states`.
    let mut log_l: Vec<f64> = chains.iter().map(|c| c.log_l).collect();

    for i in 0..k {
        for j in (i + 1)..k {
            let delta = (1.0 / chains[i].temperature - 1.0 / chains[j].temperature)
                * (log_l[j] - log_l[i]);
            let u: f64 = rng.uniform();
            if delta.clamp(-30.0, 0.0).exp() > u {
                swap_states(i, j);
                log_l.swap(i, j);
                stats.record(i, j);
                swapped.push((i, j));
            }
        }
    }
    swapped
}
