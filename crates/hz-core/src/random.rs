//! Seed derivation and sampling primitives.
//!
//! Every random draw in a calculation comes from a [`SeedStream`] whose seed
//! was obtained through [`derive_seed`]. Streams are never shared between
//! work units, so the values a unit sees depend only on its seed and on the
//! order in which it consumes the stream.

use rand::distributions::Standard;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::numeric::Real;

/// Deterministic random stream used by samplers and simulators.
pub type SeedStream = ChaCha20Rng;

/// Open a stream for `seed`.
pub fn seed_stream(seed: u64) -> SeedStream {
    ChaCha20Rng::seed_from_u64(seed)
}

/// Derive the seed of child `index` from `parent`.
///
/// SplitMix64 finalizer over the parent seed offset by the golden-ratio
/// increment times `index + 1`; children of one parent are decorrelated and
/// the mapping is stable across platforms and releases.
pub fn derive_seed(parent: u64, index: u64) -> u64 {
    let mut z = parent.wrapping_add(0x9E37_79B9_7F4A_7C15_u64.wrapping_mul(index.wrapping_add(1)));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Uniform draw in `[0, 1)`.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R) -> Real {
    rng.sample(Standard)
}

/// Standard normal draw (Box-Muller, one value per call).
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> Real {
    // 1 - u keeps the log argument in (0, 1]
    let u1 = 1.0 - uniform(rng);
    let u2 = uniform(rng);
    (-2.0 * u1.ln()).sqrt() * (2.0 * core::f64::consts::PI * u2).cos()
}

/// Standard normal draw restricted to `[-level, level]`.
///
/// `None` means unbounded; `Some(0.0)` always yields zero.
pub fn truncated_normal<R: Rng + ?Sized>(rng: &mut R, level: Option<Real>) -> Real {
    match level {
        None => standard_normal(rng),
        Some(t) if t <= 0.0 => 0.0,
        Some(t) => loop {
            let z = standard_normal(rng);
            if z.abs() <= t {
                break z;
            }
        },
    }
}

/// Poisson draw with mean `lambda`.
///
/// Knuth's product method for small means, normal approximation above 500
/// where the product underflows.
pub fn poisson<R: Rng + ?Sized>(rng: &mut R, lambda: Real) -> u64 {
    if lambda <= 0.0 || !lambda.is_finite() {
        return 0;
    }
    if lambda > 500.0 {
        let draw = lambda + lambda.sqrt() * standard_normal(rng);
        return draw.round().max(0.0) as u64;
    }
    let limit = (-lambda).exp();
    let mut k = 0_u64;
    let mut p = uniform(rng);
    while p > limit {
        k += 1;
        p *= uniform(rng);
    }
    k
}

/// Index drawn from `weights` (non-negative, not necessarily normalized).
///
/// Returns `None` for an empty or all-zero slice.
pub fn weighted_index<R: Rng + ?Sized>(rng: &mut R, weights: &[Real]) -> Option<usize> {
    let total: Real = weights.iter().sum();
    if weights.is_empty() || total <= 0.0 {
        return None;
    }
    let target = uniform(rng) * total;
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if target < acc {
            return Some(i);
        }
    }
    // rounding left target at the very top of the range
    weights.iter().rposition(|w| *w > 0.0)
}
