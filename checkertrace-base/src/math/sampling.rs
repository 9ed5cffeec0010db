//! Deterministic sample point generation.
//! This module is private but reexported by its parent.

use num_traits::Float;

use crate::math::{Vector2, Vector3};

/// Returns element `index` of the Halton low-discrepancy sequence in the given `base`,
/// a value in `[0, 1)`.
///
/// Index 0 is always 0, so callers usually start at 1.
///
/// Panics if `base` is less than 2.
pub fn halton(base: u32, mut index: u32) -> f64 {
    assert!(base >= 2, "halton base must be at least 2");
    let b = f64::from(base);
    let mut fraction = 1.0;
    let mut result = 0.0;
    while index > 0 {
        fraction /= b;
        result += fraction * f64::from(index % base);
        index /= base;
    }
    result
}

/// Maps the unit square onto the unit sphere with uniform area density.
///
/// `u` selects the height and `v` the longitude, both in `[0, 1]`.
pub fn point_on_sphere<T: Float>(u: T, v: T) -> Vector3<T> {
    let one = T::one();
    let two = one + one;
    let z = two * u - one;
    let radius = (one - z * z).max(T::zero()).sqrt();
    let (sin, cos) = (two * pi::<T>() * v).sin_cos();
    Vector3::new(radius * cos, radius * sin, z)
}

/// Maps the unit square onto the unit disc with uniform area density.
pub fn uniform_disc<T: Float>(x: T, y: T) -> Vector2<T> {
    let radius = x.sqrt();
    let (sin, cos) = ((T::one() + T::one()) * pi::<T>() * y).sin_cos();
    Vector2::new(radius * cos, radius * sin)
}

fn pi<T: Float>() -> T {
    // Every `Float` can represent an approximation of π; the fallback is unreachable.
    T::from(core::f64::consts::PI).unwrap_or_else(T::zero)
}
