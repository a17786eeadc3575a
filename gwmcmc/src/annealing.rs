//! Simulated annealing schedule (spec §4.7), used only when parallel
//! tempering is disabled and the initial temperature exceeds 1.
//!
//! Grounded on `mcmc_mcmc.c`'s `annealTemperature`.

/// `T(n) = clamp(exp(ln(T0) * (nburn - n) / (nburn - nburn0)), 1, T0)`.
///
/// Falls monotonically from `T0` at `n = nburn0` to `1` at `n = nburn`.
#[must_use]
pub fn anneal_temperature(temp0: f64, nburn: u64, nburn0: u64, iter: u64) -> f64 {
    let exponent = (nburn as f64 - iter as f64) / (nburn as f64 - nburn0 as f64);
    let raw = (temp0.ln() * exponent).exp();
    raw.max(1.0).min(temp0)
}
