//! Prior & boundary handling (spec §4.1).
//!
//! Grounded on `mcmc_prior.c`'s `prior()`/`prior1()`/`prior2()`: wrap modulo
//! the period for periodic parameters, otherwise bounce once off whichever
//! wall was crossed and reject if still outside afterwards.

use crate::param::ParameterDescriptor;

/// Outcome of admitting a proposed value through a parameter's prior.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Admission {
    /// The (possibly wrapped/reflected) corrected value.
    pub value: f64,
    /// Whether the corrected value is admissible.
    pub admissible: bool,
}

/// Apply parameter `descriptor`'s prior/boundary handling to `value`.
///
/// Periodic parameters always return `admissible = true`: wrapping never
/// rejects. Reflecting parameters bounce once off whichever wall was
/// crossed; if the corrected value is still outside `[lower, upper]` the
/// proposal is rejected.
#[must_use]
pub fn admit(value: f64, descriptor: &ParameterDescriptor) -> Admission {
    if let Some(period) = descriptor.prior_kind.period() {
        // Positive representative of `value mod period`.
        let wrapped = value.rem_euclid(period);
        return Admission {
            value: wrapped,
            admissible: true,
        };
    }

    let (lower, upper) = (descriptor.lower, descriptor.upper);
    if value >= lower && value <= upper {
        return Admission {
            value,
            admissible: true,
        };
    }

    let corrected = if value < lower {
        lower + (value - lower).abs()
    } else {
        upper - (value - upper).abs()
    };

    let admissible = corrected >= lower && corrected <= upper;
    Admission {
        value: corrected,
        admissible,
    }
}
