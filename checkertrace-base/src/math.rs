//! Mathematical utilities and decisions.
//!
//! Conventions used throughout:
//!
//! * Matrices are stored **row-major**, and a matrix multiplies a vector on its right,
//!   treating the vector as a column (`M * v`). Composition `A * B` therefore applies `B`
//!   first.
//! * Projection matrices follow the OpenGL conventions: a right-handed view space looking
//!   down −Z, and clip space depth in `[-1, 1]`.
//! * Operations that can fail on degenerate input (normalizing a zero vector, inverting a
//!   singular matrix) return [`Result`] with a [`MathError`] rather than producing NaN.

mod color;
pub use color::*;
mod error;
pub use error::*;
mod matrix;
pub use matrix::*;
mod projection;
pub use projection::*;
mod quaternion;
pub use quaternion::*;
mod sampling;
pub use sampling::*;
mod vector;
pub use vector::*;

/// Coordinates that are not locked to the pixel grid.
///
/// The camera, ray generation, and point clouds all use this precision.
pub type FreeCoordinate = f32;

/// Vector in [`FreeCoordinate`]s.
pub type FreeVector = Vector3<FreeCoordinate>;
