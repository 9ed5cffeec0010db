//! This module is private but reexported by its parent.

use core::ops;

use num_traits::Float;

use crate::math::{MathError, Matrix4x4, Vector3};

/// A quaternion `s + v.x i + v.y j + v.z k`, used to represent rotations.
#[expect(clippy::exhaustive_structs)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quaternion<T> {
    /// Scalar (real) part.
    pub s: T,
    /// Vector (imaginary) part.
    pub v: Vector3<T>,
}

impl<T: Float> Quaternion<T> {
    /// The quaternion representing no rotation.
    #[inline]
    pub fn identity() -> Self {
        Self {
            s: T::one(),
            v: Vector3::zero(),
        }
    }

    /// Returns the unit quaternion rotating by `angle` radians about `axis`, using the same
    /// handedness as [`rotate()`](crate::math::rotate).
    pub fn from_axis_angle(axis: Vector3<T>, angle: T) -> Result<Self, MathError> {
        let axis = axis.normalize()?;
        let half = angle / (T::one() + T::one());
        let (sin, cos) = half.sin_cos();
        Ok(Self {
            s: cos,
            v: axis * sin,
        })
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn length_squared(self) -> T {
        self.s * self.s + self.v.length_squared()
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn length(self) -> T {
        self.length_squared().sqrt()
    }

    /// Scales this quaternion to length 1.
    ///
    /// Like [`Vector3::normalize()`], divides by the largest component magnitude first so
    /// that very large or small quaternions do not overflow.
    pub fn normalize(self) -> Result<Self, MathError> {
        let largest = self
            .s
            .abs()
            .max(self.v.x.abs())
            .max(self.v.y.abs())
            .max(self.v.z.abs());
        if !(largest.is_finite() && largest > T::zero()) {
            return Err(MathError::DegenerateVector);
        }
        let scaled = Self {
            s: self.s / largest,
            v: self.v / largest,
        };
        let length = scaled.length();
        if !(length.is_finite() && length > T::zero()) {
            return Err(MathError::DegenerateVector);
        }
        Ok(Self {
            s: scaled.s / length,
            v: scaled.v / length,
        })
    }

    /// Negates the vector part. For a unit quaternion this is the inverse rotation.
    #[inline]
    #[must_use]
    pub fn conjugate(self) -> Self {
        Self {
            s: self.s,
            v: -self.v,
        }
    }

    /// Converts this quaternion, which should be of unit length, to a rotation matrix.
    pub fn to_matrix(self) -> Matrix4x4<T> {
        let (o, l) = (T::zero(), T::one());
        let two = l + l;
        let w = self.s;
        let Vector3 { x, y, z } = self.v;
        #[rustfmt::skip]
        let m = [
            l - two * (y * y + z * z), two * (x * y - z * w),     two * (x * z + y * w),     o,
            two * (x * y + z * w),     l - two * (x * x + z * z), two * (y * z - x * w),     o,
            two * (x * z - y * w),     two * (y * z + x * w),     l - two * (x * x + y * y), o,
            o,                         o,                         o,                         l,
        ];
        Matrix4x4::from_row_major(m)
    }
}

impl<T: Float> ops::Add for Quaternion<T> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            s: self.s + rhs.s,
            v: self.v + rhs.v,
        }
    }
}

impl<T: Float> ops::Mul for Quaternion<T> {
    type Output = Self;

    /// Hamilton product. As rotations, `a * b` applies `b` first.
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self {
            s: self.s * rhs.s - self.v.dot(rhs.v),
            v: rhs.v * self.s + self.v * rhs.s + self.v.cross(rhs.v),
        }
    }
}
