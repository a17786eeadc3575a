//! Per-temperature chain state (spec §3 "Chain state").

use crate::cholesky::Matrix;
use crate::covariance::HistoryWindow;
use crate::param::ParameterDescriptor;

/// Whether/how a chain accumulates and adopts a correlated-proposal
/// covariance factor.
///
/// Stored as a raw counter (not an enum) because, once adaptive, it also
/// serves as the covariance estimator's generation count (spec §3
/// "corrUpdate", pinned down in SPEC_FULL §11): `0` = disabled, `1` =
/// fixed-diagonal (assigned once, never updated again), `>= 2` =
/// online-adaptive, counting adopted generations.
pub type CorrUpdateCounter = u32;

/// Disabled: no initial covariance, no periodic re-estimation.
pub const CORR_DISABLED: CorrUpdateCounter = 0;
/// Fixed-diagonal: an initial diagonal covariance is used and never updated.
pub const CORR_FIXED_DIAGONAL: CorrUpdateCounter = 1;
/// First online-adaptive generation: periodic re-estimation begins.
pub const CORR_ONLINE_ADAPTIVE: CorrUpdateCounter = 2;

/// The full mutable state of one temperature rung.
#[derive(Clone, Debug)]
pub struct ChainState {
    /// Current parameter vector.
    pub x: Vec<f64>,
    /// Proposed parameter vector (scratch space, reused every proposal).
    pub x_prop: Vec<f64>,
    /// Current log-likelihood.
    pub log_l: f64,
    /// Proposed log-likelihood.
    pub log_l_prop: f64,
    /// Max-seen log-likelihood.
    pub max_log_l: f64,
    /// Parameters at the max-seen log-likelihood.
    pub max_params: Vec<f64>,
    /// Per-parameter adaptive proposal sigma.
    pub sigma: Vec<f64>,
    /// Per-parameter adaptation scale (Robbins-Monro rate).
    pub scale: Vec<f64>,
    /// Per-parameter accepted-proposal counters.
    pub accepted: Vec<u64>,
    /// Last emitted proposed jump size per parameter, for diagnostics.
    pub last_jump: Vec<f64>,
    /// Scalar correlated-proposal scale, sigma_corr.
    pub sigma_corr: f64,
    /// Whether the current proposal is prior-admissible.
    pub prior_admissible: bool,
    /// Sliding window of the last n_corr accepted state vectors.
    pub history: HistoryWindow,
    /// Running mean of the history window.
    pub hist_mean: Vec<f64>,
    /// Running standard deviation of the history window.
    pub hist_dev: Vec<f64>,
    /// Current Cholesky factor, lower-triangular.
    pub cholesky: Matrix,
    /// Correlated-update counter/generation (see [`CorrUpdateCounter`]).
    pub corr_update: CorrUpdateCounter,
}

impl ChainState {
    /// Allocate a chain for `params.len()` parameters with the given history
    /// window length. Sigma/scale/sigma_corr are seeded exactly as the
    /// original startup does (SPEC_FULL §11): `sigma = 0.1 * parSigma`
    /// (or `parSigma` verbatim when `adapt` is `false`), `scale = 10 *
    /// parSigma`, `sigma_corr = 1.0`.
    #[must_use]
    pub fn new(params: &[ParameterDescriptor], n_corr: usize, adapt: bool) -> Self {
        let n = params.len();
        let sigma = params
            .iter()
            .map(|p| if adapt { 0.1 * p.sigma } else { p.sigma })
            .collect();
        let scale = params.iter().map(|p| 10.0 * p.sigma).collect();
        let x: Vec<f64> = params.iter().map(|p| p.best_value).collect();

        Self {
            x: x.clone(),
            x_prop: x.clone(),
            log_l: f64::NEG_INFINITY,
            log_l_prop: f64::NEG_INFINITY,
            max_log_l: f64::NEG_INFINITY,
            max_params: x,
            sigma,
            scale,
            accepted: vec![0; n],
            last_jump: vec![0.0; n],
            sigma_corr: 1.0,
            prior_admissible: true,
            history: HistoryWindow::new(n, n_corr),
            hist_mean: vec![0.0; n],
            hist_dev: vec![0.0; n],
            cholesky: Matrix::zeros(n),
            corr_update: CORR_DISABLED,
        }
    }

    /// Record a new running-maximum log-likelihood if `log_l` exceeds it,
    /// snapshotting the current parameter vector.
    pub fn update_running_max(&mut self) {
        if self.log_l > self.max_log_l {
            self.max_log_l = self.log_l;
            self.max_params.copy_from_slice(&self.x);
        }
    }
}
