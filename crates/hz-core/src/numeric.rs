/// Floating point type used throughout the engine.
pub type Real = f64;

/// Tolerance applied to every "weights sum to one" check.
pub const WEIGHT_SUM_TOLERANCE: Real = 1e-6;

/// True when `weights` add up to one within [`WEIGHT_SUM_TOLERANCE`].
pub fn weights_sum_to_one<I>(weights: I) -> bool
where
    I: IntoIterator<Item = Real>,
{
    let sum: Real = weights.into_iter().sum();
    (sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
}

/// Linear interpolation of `y` at `x` between `(x0, y0)` and `(x1, y1)`.
///
/// A degenerate segment (`x0 == x1`) yields `y0`.
pub fn lerp(x: Real, x0: Real, x1: Real, y0: Real, y1: Real) -> Real {
    let dx = x1 - x0;
    if dx == 0.0 {
        return y0;
    }
    y0 + (x - x0) / dx * (y1 - y0)
}
