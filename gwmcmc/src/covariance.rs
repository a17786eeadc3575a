//! Online covariance estimation and Cholesky-factor acceptance (spec §4.3).
//!
//! Grounded on `mcmc_mcmc.c`'s `updateCovarianceMatrix`: accumulate a
//! sliding window of `n_corr` accepted states, compute mean/std-dev/lower
//! covariance, Cholesky-decompose a scratch copy, and decide whether to
//! adopt it. The first two generations of the matrix (SPEC_FULL §11's
//! `generation < 2`) are always adopted; thereafter adoption requires the
//! fraction of tightened free-parameter diagonal entries to reach
//! `mat_acc_fr * n_par_fit`.

use crate::cholesky::{cholesky_in_place, Matrix};

/// Sliding window of the last `n_corr` accepted state vectors for one chain.
///
/// Stored as a single flattened `(n_par, n_corr)` buffer and overwritten
/// circularly (spec §9), even though in practice the window is always
/// drained (reset) as soon as it fills (spec §4.3 "Reset iHist to 0
/// regardless of adoption").
#[derive(Clone, Debug)]
pub struct HistoryWindow {
    n_par: usize,
    n_corr: usize,
    data: Vec<f64>,
    filled: usize,
}

impl HistoryWindow {
    /// A new, empty window for `n_par` parameters and a window length of `n_corr`.
    #[must_use]
    pub fn new(n_par: usize, n_corr: usize) -> Self {
        Self {
            n_par,
            n_corr,
            data: vec![0.0; n_par * n_corr],
            filled: 0,
        }
    }

    /// Number of valid samples currently held, `0 <= filled <= n_corr`.
    #[must_use]
    pub const fn filled(&self) -> usize {
        self.filled
    }

    /// Whether the window has accumulated a full `n_corr` samples.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.filled >= self.n_corr
    }

    /// Append one accepted state vector (length `n_par`), if there is room.
    ///
    /// Mirrors `if(mcmc.iHist[tempi]<nCorr) { ...; iHist += 1 }`: once full,
    /// further pushes are no-ops until [`HistoryWindow::reset`].
    pub fn push(&mut self, state: &[f64]) {
        assert_eq!(state.len(), self.n_par);
        if self.filled >= self.n_corr {
            return;
        }
        for (p, &v) in state.iter().enumerate() {
            self.data[p * self.n_corr + self.filled] = v;
        }
        self.filled += 1;
    }

    /// Clear the window (the next block of `n_corr` samples starts fresh).
    pub fn reset(&mut self) {
        self.filled = 0;
    }

    fn sample(&self, param: usize, slot: usize) -> f64 {
        self.data[param * self.n_corr + slot]
    }

    /// Per-parameter mean over the full window (divisor `n_corr`).
    #[must_use]
    pub fn mean(&self) -> Vec<f64> {
        let n = self.n_corr as f64;
        (0..self.n_par)
            .map(|p| (0..self.n_corr).map(|i| self.sample(p, i)).sum::<f64>() / n)
            .collect()
    }

    /// Per-parameter standard deviation (divisor `n_corr - 1`).
    #[must_use]
    pub fn std_dev(&self, mean: &[f64]) -> Vec<f64> {
        let denom = (self.n_corr - 1) as f64;
        (0..self.n_par)
            .map(|p| {
                let m = mean[p];
                let ss: f64 = (0..self.n_corr)
                    .map(|i| {
                        let d = self.sample(p, i) - m;
                        d * d
                    })
                    .sum();
                (ss / denom).sqrt()
            })
            .collect()
    }

    /// Lower-triangular sample covariance matrix (divisor `n_corr - 1`).
    #[must_use]
    pub fn covariance_lower(&self, mean: &[f64]) -> Matrix {
        let denom = (self.n_corr - 1) as f64;
        let mut cov = Matrix::zeros(self.n_par);
        for p1 in 0..self.n_par {
            for p2 in 0..=p1 {
                let mut acc = 0.0;
                for i in 0..self.n_corr {
                    acc += (self.sample(p1, i) - mean[p1]) * (self.sample(p2, i) - mean[p2]);
                }
                cov.set(p1, p2, acc / denom);
            }
        }
        cov
    }
}

/// Outcome of one covariance-update attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpdateOutcome {
    /// Whether the new factor was adopted.
    pub adopted: bool,
    /// Count of free-parameter diagonal entries that strictly tightened, or
    /// `-1` if any new diagonal was non-positive, NaN or infinite.
    pub improved_diag: i64,
}

/// Evaluate a new covariance estimate from `window` and decide whether to
/// adopt it into `current_l` (the chain's live Cholesky factor).
///
/// `generation` is the chain's `corrUpdate` counter (spec §3): it is
/// incremented on adoption only, and the "always adopt" rule applies while
/// `*generation < 2` (SPEC_FULL §11).
pub fn update(
    window: &HistoryWindow,
    free_mask: &[bool],
    n_par_fit: usize,
    mat_acc_fr: f64,
    current_l: &mut Matrix,
    generation: &mut u32,
) -> (UpdateOutcome, Vec<f64>, Vec<f64>) {
    let mean = window.mean();
    let std_dev = window.std_dev(&mean);
    let mut candidate = window.covariance_lower(&mean);

    cholesky_in_place(&mut candidate, free_mask);

    let mut improved_diag: i64 = 0;
    for (p, &is_free) in free_mask.iter().enumerate() {
        if !is_free {
            continue;
        }
        let new_diag = candidate.get(p, p);
        if new_diag < current_l.get(p, p) {
            improved_diag += 1;
        }
        if !(new_diag > 0.0) || new_diag.is_nan() || new_diag.is_infinite() {
            improved_diag = -9999;
        }
    }
    improved_diag = improved_diag.max(-1);

    let adopted = if improved_diag < 0 {
        false
    } else if *generation < 2 {
        true
    } else {
        improved_diag as f64 >= mat_acc_fr * n_par_fit as f64
    };

    if adopted {
        *current_l = candidate;
        *generation += 1;
    }

    (
        UpdateOutcome {
            adopted,
            improved_diag,
        },
        mean,
        std_dev,
    )
}
