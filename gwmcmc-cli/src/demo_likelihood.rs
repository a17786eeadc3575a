//! An analytic, uncorrelated Gaussian target standing in for a real
//! waveform/likelihood collaborator (spec §6 external interfaces).
//!
//! This is **not** a physical gravitational-wave waveform: it exists only so
//! `gwmcmc-cli` can exercise the sampler end to end without the detector
//! data ingestion, PSD estimation and waveform generation this crate treats
//! as out of scope (spec §1 "Out of scope").

use gwmcmc::{LikelihoodModel, NetworkId, WaveformId};

/// `log L(x) = C - 1/2 sum_i (x_i - mu_i)^2 / sigma_i^2`, offset by `C` so
/// the result is positive near the mode (the sampler rejects any
/// non-positive or non-finite likelihood, spec §7).
pub struct DemoGaussianTarget {
    mu: Vec<f64>,
    sigma: Vec<f64>,
    offset: f64,
}

impl DemoGaussianTarget {
    /// A target centered at `mu` with per-parameter widths `sigma`.
    #[must_use]
    pub fn new(mu: Vec<f64>, sigma: Vec<f64>) -> Self {
        assert_eq!(mu.len(), sigma.len());
        Self {
            mu,
            sigma,
            offset: 1.0e4,
        }
    }
}

impl LikelihoodModel for DemoGaussianTarget {
    fn localize(&self, _params: &mut [f64], _network: NetworkId) {
        // No per-detector geometry to annotate for an analytic target.
    }

    fn log_likelihood(&self, params: &[f64], _network: NetworkId, _waveform: WaveformId) -> f64 {
        let chi2: f64 = params
            .iter()
            .zip(&self.mu)
            .zip(&self.sigma)
            .map(|((&x, &mu), &sigma)| {
                let z = (x - mu) / sigma;
                z * z
            })
            .sum();
        self.offset - 0.5 * chi2
    }
}
