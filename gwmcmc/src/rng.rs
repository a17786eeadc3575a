//! Seeded pseudorandom source.
//!
//! A thin wrapper around [`rand_pcg::Pcg64`], giving every chain its own
//! deterministic sub-stream derived from the run seed. Reproducibility given
//! `(seed, configuration)` is a first-class requirement (spec §5), so the
//! sampler never reaches for a thread-local or OS-seeded generator.

use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use rand_pcg::Pcg64;

/// Deterministic random source for one chain (or the whole run, for a
/// single-chain sampler).
#[derive(Clone, Debug)]
pub struct RandomSource {
    rng: Pcg64,
}

impl RandomSource {
    /// Construct the top-level source from the run seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// Derive an independent, deterministic sub-stream for chain `index`.
    ///
    /// Used when chains are advanced concurrently (spec §5): each chain's
    /// draws must be reproducible given only the run seed and its index,
    /// never a shared mutable generator.
    #[must_use]
    pub fn sub_stream(&self, index: usize) -> Self {
        // PCG64 streams are selected by odd increment; splitting on the
        // chain index via `seed_from_u64` of a mixed value keeps each
        // sub-stream independent and reproducible.
        let mixed = self
            .rng
            .clone()
            .gen::<u64>()
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
            .wrapping_add(index as u64);
        Self {
            rng: Pcg64::seed_from_u64(mixed),
        }
    }

    /// Draw u ~ U(0, 1).
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Draw z ~ N(0, 1).
    pub fn standard_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.rng)
    }

    /// Draw z ~ N(0, sigma^2) for sigma >= 0.
    pub fn normal(&mut self, sigma: f64) -> f64 {
        self.standard_normal() * sigma
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_given_seed() {
        let mut a = RandomSource::from_seed(42);
        let mut b = RandomSource::from_seed(42);
        for _ in 0..100 {
            assert_eq!(a.uniform(), b.uniform());
            assert_eq!(a.standard_normal(), b.standard_normal());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = RandomSource::from_seed(1);
        let mut b = RandomSource::from_seed(2);
        let draws_a: Vec<f64> = (0..16).map(|_| a.uniform()).collect();
        let draws_b: Vec<f64> = (0..16).map(|_| b.uniform()).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn sub_streams_are_independent_and_deterministic() {
        let base = RandomSource::from_seed(7);
        let mut s0 = base.sub_stream(0);
        let mut s1 = base.sub_stream(1);
        let mut s0_again = base.sub_stream(0);
        assert_eq!(s0.uniform(), s0_again.uniform());
        // Overwhelmingly likely to differ; not a correctness guarantee for
        // all seeds, but catches the obvious "forgot to mix index in" bug.
        assert_ne!(s0.uniform(), s1.uniform());
    }

    #[test]
    fn uniform_is_in_unit_interval() {
        let mut r = RandomSource::from_seed(123);
        for _ in 0..10_000 {
            let u = r.uniform();
            assert!((0.0..1.0).contains(&u));
        }
    }
}
