//! Parameter descriptors: the static, per-slot configuration the rest of the
//! sampler is parameterized over (spec §3 "Parameter descriptor").

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How a parameter is held during sampling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixMode {
    /// Varied normally.
    Free,
    /// Held at its configured best value for the whole run.
    FixToBest,
    /// Held at the injection (ground-truth) value for the whole run.
    FixToInjection,
}

/// How a chain's starting value for this parameter is chosen (spec §4.8).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartMode {
    /// Start exactly at the configured best value.
    Best,
    /// Start at a Gaussian draw around the best value.
    GaussianAroundBest,
    /// Start exactly at the injection value.
    Injection,
    /// Start at a Gaussian draw around the injection value.
    GaussianAroundInjection,
    /// Start uniformly on the prior range.
    UniformPrior,
}

/// The kind of prior/boundary handling applied to this parameter (spec §4.1).
///
/// `ReflectShiftedByBest` and `ReflectScaledByBest` are resolved into
/// absolute `(lower, upper)` bounds at configuration time (spec §4.1 "Shifted/
/// scaled prior kinds are resolved at configuration time"); by the time a
/// [`ParameterDescriptor`] is handed to the sampler its `prior_kind` has
/// already collapsed to one of `Reflect`, `Wrap2Pi` or `WrapPi`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorKind {
    /// Bounce back from `[lower, upper]`, one reflection, else reject.
    Reflect,
    /// `Reflect`, but bounds are specified relative to the best value.
    ReflectShiftedByBest,
    /// `Reflect`, but bounds are specified as a multiple of the best value.
    ReflectScaledByBest,
    /// Wrap modulo 2*pi into `[0, 2*pi)`.
    Wrap2Pi,
    /// Wrap modulo pi into `[0, pi)`.
    WrapPi,
}

impl PriorKind {
    /// Whether this prior kind is a periodic wrap rather than a reflecting wall.
    #[must_use]
    pub const fn is_periodic(self) -> bool {
        matches!(self, Self::Wrap2Pi | Self::WrapPi)
    }

    /// The period of a periodic prior kind, or `None` for reflecting walls.
    #[must_use]
    pub fn period(self) -> Option<f64> {
        match self {
            Self::Wrap2Pi => Some(std::f64::consts::TAU),
            Self::WrapPi => Some(std::f64::consts::PI),
            Self::Reflect | Self::ReflectShiftedByBest | Self::ReflectScaledByBest => None,
        }
    }
}

/// Static, per-slot description of one of the 9/12/15 waveform parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Integer identity code (spec uses ranges, e.g. 11-19 for GPS-time-valued
    /// parameters; see [`ParameterDescriptor::is_gps_time`]).
    pub id: u32,
    /// Short name, used as the output column header.
    pub short_name: String,
    /// Long/human-readable name.
    pub long_name: String,
    /// Best-guess initial value.
    pub best_value: f64,
    /// Configured 1-sigma proposal width (`parSigma` in the original).
    pub sigma: f64,
    /// Whether/how this parameter is held fixed.
    pub fix: FixMode,
    /// How a chain picks its starting value.
    pub start: StartMode,
    /// Prior/boundary handling.
    pub prior_kind: PriorKind,
    /// Resolved lower prior bound (ignored for periodic prior kinds).
    pub lower: f64,
    /// Resolved upper prior bound (ignored for periodic prior kinds).
    pub upper: f64,
}

impl ParameterDescriptor {
    /// GPS-time-valued parameters get wider output columns (spec §6, pinned
    /// down in SPEC_FULL §11: parameter IDs 11 through 19 inclusive).
    #[must_use]
    pub const fn is_gps_time(id: u32) -> bool {
        id >= 11 && id <= 19
    }

    /// Resolve `ReflectShiftedByBest` / `ReflectScaledByBest` into absolute
    /// `(lower, upper)` bounds and collapse `prior_kind` to `Reflect`.
    ///
    /// Called once at configuration time (spec §4.1): by the time the
    /// sampler runs, every descriptor's prior kind is one of `Reflect`,
    /// `Wrap2Pi` or `WrapPi`.
    pub fn resolve(&mut self) -> Result<()> {
        match self.prior_kind {
            PriorKind::ReflectShiftedByBest => {
                self.lower += self.best_value;
                self.upper += self.best_value;
                self.prior_kind = PriorKind::Reflect;
            }
            PriorKind::ReflectScaledByBest => {
                self.lower *= self.best_value;
                self.upper *= self.best_value;
                self.prior_kind = PriorKind::Reflect;
            }
            PriorKind::Reflect | PriorKind::Wrap2Pi | PriorKind::WrapPi => {}
        }

        if matches!(self.prior_kind, PriorKind::Reflect) && self.lower >= self.upper {
            return Err(Error::ImpossiblePriorRange {
                name: self.short_name.clone(),
                lower: self.lower,
                upper: self.upper,
            });
        }
        if self.sigma < 0.0 {
            return Err(Error::InvalidParameterDescriptor {
                name: self.short_name.clone(),
                reason: "proposal width sigma must be non-negative".to_string(),
            });
        }
        if self.fix != FixMode::Free && matches!(self.start, StartMode::UniformPrior) {
            return Err(Error::ContradictoryFixStart {
                name: self.short_name.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_descriptor() -> ParameterDescriptor {
        ParameterDescriptor {
            id: 0,
            short_name: "Mc".to_string(),
            long_name: "chirp mass".to_string(),
            best_value: 1.5,
            sigma: 0.01,
            fix: FixMode::Free,
            start: StartMode::Best,
            prior_kind: PriorKind::Reflect,
            lower: 1.0,
            upper: 6.0,
        }
    }

    #[test]
    fn resolve_is_noop_for_plain_reflect() {
        let mut p = base_descriptor();
        p.resolve().unwrap();
        assert_eq!(p.lower, 1.0);
        assert_eq!(p.upper, 6.0);
    }

    #[test]
    fn resolve_shifts_by_best() {
        let mut p = base_descriptor();
        p.prior_kind = PriorKind::ReflectShiftedByBest;
        p.lower = -0.5;
        p.upper = 0.5;
        p.resolve().unwrap();
        assert_eq!(p.prior_kind, PriorKind::Reflect);
        assert!((p.lower - 1.0).abs() < 1e-12);
        assert!((p.upper - 2.0).abs() < 1e-12);
    }

    #[test]
    fn resolve_scales_by_best() {
        let mut p = base_descriptor();
        p.prior_kind = PriorKind::ReflectScaledByBest;
        p.lower = 0.5;
        p.upper = 2.0;
        p.resolve().unwrap();
        assert_eq!(p.prior_kind, PriorKind::Reflect);
        assert!((p.lower - 0.75).abs() < 1e-12);
        assert!((p.upper - 3.0).abs() < 1e-12);
    }

    #[test]
    fn resolve_rejects_inverted_bounds() {
        let mut p = base_descriptor();
        p.lower = 5.0;
        p.upper = 1.0;
        assert!(p.resolve().is_err());
    }

    #[test]
    fn resolve_rejects_fixed_uniform_start() {
        let mut p = base_descriptor();
        p.fix = FixMode::FixToBest;
        p.start = StartMode::UniformPrior;
        assert!(p.resolve().is_err());
    }

    #[test]
    fn gps_time_id_range() {
        assert!(!ParameterDescriptor::is_gps_time(10));
        assert!(ParameterDescriptor::is_gps_time(11));
        assert!(ParameterDescriptor::is_gps_time(19));
        assert!(!ParameterDescriptor::is_gps_time(20));
    }
}
