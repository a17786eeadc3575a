//! Temperature ladder construction (spec §4.5).
//!
//! Grounded on `mcmc_mcmc.c`'s temperature-ladder setup block and the
//! sinusoidal-amplitude comment there; the four modes collapse to one
//! function over a `LadderMode` tag (spec §9 "tagged variants with a single
//! dispatch site").

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the temperature ladder is constructed (spec §4.5).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LadderMode {
    /// Geometric spacing up to `temp_max`, no modulation.
    GeometricFixed { temp_max: f64 },
    /// Geometric spacing with sinusoidal per-chain modulation.
    GeometricSinusoidal { temp_max: f64 },
    /// Caller-specified rungs, no modulation.
    ManualFixed { temps: Vec<f64> },
    /// Caller-specified rungs with sinusoidal modulation.
    ManualSinusoidal { temps: Vec<f64> },
}

/// The constructed ladder: `k` rungs, `temps[0] == 1.0` exactly, strictly
/// increasing thereafter, with a parallel amplitude vector (zero unless the
/// mode is sinusoidal).
#[derive(Clone, Debug, PartialEq)]
pub struct TemperatureLadder {
    temps: Vec<f64>,
    amplitudes: Vec<f64>,
    n_corr: usize,
}

impl TemperatureLadder {
    /// Build a ladder of `k` rungs per `mode`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidLadder`] if `k == 0`, if a manual ladder's
    /// length doesn't match `k`, or if the resulting ladder is not strictly
    /// increasing from `T_0 = 1`.
    pub fn new(k: usize, mode: &LadderMode, n_corr: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidLadder {
                reason: "ladder must have at least one rung".to_string(),
            });
        }

        let temps = match mode {
            LadderMode::GeometricFixed { temp_max } | LadderMode::GeometricSinusoidal { temp_max } => {
                geometric_ladder(k, *temp_max)
            }
            LadderMode::ManualFixed { temps } | LadderMode::ManualSinusoidal { temps } => {
                if temps.len() != k {
                    return Err(Error::InvalidLadder {
                        reason: format!(
                            "manual ladder has {} entries, expected {k}",
                            temps.len()
                        ),
                    });
                }
                temps.clone()
            }
        };

        if (temps[0] - 1.0).abs() > 1e-12 {
            return Err(Error::InvalidLadder {
                reason: "T_0 must equal 1 exactly".to_string(),
            });
        }
        for w in temps.windows(2) {
            if w[1] <= w[0] {
                return Err(Error::InvalidLadder {
                    reason: "ladder must be strictly increasing".to_string(),
                });
            }
        }

        let amplitudes = match mode {
            LadderMode::GeometricFixed { .. } | LadderMode::ManualFixed { .. } => vec![0.0; k],
            LadderMode::GeometricSinusoidal { .. } | LadderMode::ManualSinusoidal { .. } => {
                sinusoidal_amplitudes(&temps)
            }
        };

        Ok(Self {
            temps,
            amplitudes,
            n_corr,
        })
    }

    /// Number of rungs.
    #[must_use]
    pub fn k(&self) -> usize {
        self.temps.len()
    }

    /// Base temperature of rung `i` (before sinusoidal modulation).
    #[must_use]
    pub fn base(&self, i: usize) -> f64 {
        self.temps[i]
    }

    /// The effective temperature of rung `i` at outer iteration `n`: `T_i +
    /// A_i * (-1)^i * sin(2*pi*n / (5*n_corr))` (spec §4.5 mode 2/4).
    #[must_use]
    pub fn effective(&self, i: usize, n: u64) -> f64 {
        if self.amplitudes[i] == 0.0 {
            return self.temps[i];
        }
        let phase = std::f64::consts::TAU * (n as f64) / (5.0 * self.n_corr as f64);
        let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
        self.temps[i] + self.amplitudes[i] * sign * phase.sin()
    }
}

fn geometric_ladder(k: usize, temp_max: f64) -> Vec<f64> {
    if k == 1 {
        return vec![1.0];
    }
    (0..k)
        .map(|i| temp_max.powf(i as f64 / (k - 1) as f64))
        .collect()
}

/// `A_i = min(3 * (T_i - T_{i-1}) * r / (r+1), |T_i - T_{i-1}|)` with `r =
/// T_i / T_{i-1}`; for `i > 1` when `k > 10`, additionally bounded by `|T_i -
/// T_{i-2}|` (spec §4.5 mode 2).
fn sinusoidal_amplitudes(temps: &[f64]) -> Vec<f64> {
    let k = temps.len();
    let mut amplitudes = vec![0.0; k];
    for i in 1..k {
        let step = temps[i] - temps[i - 1];
        let r = temps[i] / temps[i - 1];
        let mut a = (3.0 * step * r / (r + 1.0)).min(step.abs());
        if i > 1 && k > 10 {
            a = a.min((temps[i] - temps[i - 2]).abs());
        }
        amplitudes[i] = a;
    }
    amplitudes
}
