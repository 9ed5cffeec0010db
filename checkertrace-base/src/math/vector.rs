//! Small fixed-size vectors.
//! This module is private but reexported by its parent.

use core::ops;

use num_traits::{Float, Num};

use crate::math::MathError;

/// Two-component vector.
#[expect(clippy::exhaustive_structs)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Vector2<T> {
    #[allow(missing_docs)]
    pub x: T,
    #[allow(missing_docs)]
    pub y: T,
}

/// Three-component vector, used for both points and directions.
#[expect(clippy::exhaustive_structs)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Vector3<T> {
    #[allow(missing_docs)]
    pub x: T,
    #[allow(missing_docs)]
    pub y: T,
    #[allow(missing_docs)]
    pub z: T,
}

/// Four-component vector, normally a point or direction in homogeneous coordinates.
#[expect(clippy::exhaustive_structs)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Vector4<T> {
    #[allow(missing_docs)]
    pub x: T,
    #[allow(missing_docs)]
    pub y: T,
    #[allow(missing_docs)]
    pub z: T,
    #[allow(missing_docs)]
    pub w: T,
}

#[allow(missing_docs)]
pub type Vector2i = Vector2<i32>;
#[allow(missing_docs)]
pub type Vector2f = Vector2<f32>;
#[allow(missing_docs)]
pub type Vector2d = Vector2<f64>;
#[allow(missing_docs)]
pub type Vector3i = Vector3<i32>;
#[allow(missing_docs)]
pub type Vector3f = Vector3<f32>;
#[allow(missing_docs)]
pub type Vector3d = Vector3<f64>;
#[allow(missing_docs)]
pub type Vector4f = Vector4<f32>;
#[allow(missing_docs)]
pub type Vector4d = Vector4<f64>;

/// Implements everything that works the same way for every component count.
macro_rules! impl_vector_common {
    ($name:ident, $n:literal, $($field:ident),+) => {
        impl<T> $name<T> {
            #[allow(missing_docs)]
            #[inline]
            pub const fn new($($field: T),+) -> Self {
                Self { $($field),+ }
            }

            /// Applies `f` to each component.
            #[inline]
            pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> $name<U> {
                $name { $($field: f(self.$field)),+ }
            }
        }

        impl<T: Copy + Num> $name<T> {
            /// The vector whose components are all zero.
            #[inline]
            pub fn zero() -> Self {
                Self { $($field: T::zero()),+ }
            }

            /// Returns the dot product of `self` and `other`.
            #[inline]
            pub fn dot(self, other: Self) -> T {
                T::zero() $(+ self.$field * other.$field)+
            }

            /// Returns the square of the Euclidean length of this vector.
            #[inline]
            pub fn length_squared(self) -> T {
                self.dot(self)
            }

            /// Multiplies corresponding components.
            #[inline]
            #[must_use]
            pub fn component_mul(self, other: Self) -> Self {
                Self { $($field: self.$field * other.$field),+ }
            }
        }

        impl<T: Copy + PartialOrd> $name<T> {
            /// Componentwise minimum.
            #[inline]
            #[must_use]
            pub fn min(self, other: Self) -> Self {
                Self { $($field: if other.$field < self.$field { other.$field } else { self.$field }),+ }
            }

            /// Componentwise maximum.
            #[inline]
            #[must_use]
            pub fn max(self, other: Self) -> Self {
                Self { $($field: if other.$field > self.$field { other.$field } else { self.$field }),+ }
            }
        }

        impl<T: Float> $name<T> {
            /// Returns the Euclidean length of this vector.
            #[inline]
            pub fn length(self) -> T {
                self.length_squared().sqrt()
            }

            /// Returns the vector of length 1 pointing in the same direction.
            ///
            /// Fails with [`MathError::DegenerateVector`] if the length is zero or
            /// not finite.
            ///
            /// The vector is first divided by its largest component magnitude, so
            /// this succeeds even where [`Self::length_squared()`] would overflow or
            /// underflow.
            #[inline]
            pub fn normalize(self) -> Result<Self, MathError> {
                let largest = T::zero() $(.max(self.$field.abs()))+;
                // `max` ignores NaN, so the finiteness check is repeated below.
                if !(largest.is_finite() && largest > T::zero()) {
                    return Err(MathError::DegenerateVector);
                }
                let scaled = self / largest;
                let normalized = scaled / scaled.length();
                if true $(&& normalized.$field.is_finite())+ {
                    Ok(normalized)
                } else {
                    Err(MathError::DegenerateVector)
                }
            }

            /// Returns whether every component is finite.
            #[inline]
            pub fn is_finite(self) -> bool {
                true $(&& self.$field.is_finite())+
            }
        }

        impl<T> From<[T; $n]> for $name<T> {
            #[inline]
            fn from([$($field),+]: [T; $n]) -> Self {
                Self { $($field),+ }
            }
        }

        impl<T> From<$name<T>> for [T; $n] {
            #[inline]
            fn from(v: $name<T>) -> Self {
                [$(v.$field),+]
            }
        }

        impl<T: ops::Add<Output = T>> ops::Add for $name<T> {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                Self { $($field: self.$field + rhs.$field),+ }
            }
        }

        impl<T: ops::Sub<Output = T>> ops::Sub for $name<T> {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                Self { $($field: self.$field - rhs.$field),+ }
            }
        }

        impl<T: ops::Neg<Output = T>> ops::Neg for $name<T> {
            type Output = Self;
            #[inline]
            fn neg(self) -> Self {
                Self { $($field: -self.$field),+ }
            }
        }

        impl<T: Copy + ops::Mul<Output = T>> ops::Mul<T> for $name<T> {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: T) -> Self {
                Self { $($field: self.$field * rhs),+ }
            }
        }

        impl<T: Copy + ops::Div<Output = T>> ops::Div<T> for $name<T> {
            type Output = Self;
            #[inline]
            fn div(self, rhs: T) -> Self {
                Self { $($field: self.$field / rhs),+ }
            }
        }

        impl<T: ops::AddAssign> ops::AddAssign for $name<T> {
            #[inline]
            fn add_assign(&mut self, rhs: Self) {
                $(self.$field += rhs.$field;)+
            }
        }

        impl<T: ops::SubAssign> ops::SubAssign for $name<T> {
            #[inline]
            fn sub_assign(&mut self, rhs: Self) {
                $(self.$field -= rhs.$field;)+
            }
        }

        impl<T: Copy + ops::MulAssign> ops::MulAssign<T> for $name<T> {
            #[inline]
            fn mul_assign(&mut self, rhs: T) {
                $(self.$field *= rhs;)+
            }
        }

        impl<T: Copy + ops::DivAssign> ops::DivAssign<T> for $name<T> {
            #[inline]
            fn div_assign(&mut self, rhs: T) {
                $(self.$field /= rhs;)+
            }
        }
    };
}

impl_vector_common!(Vector2, 2, x, y);
impl_vector_common!(Vector3, 3, x, y, z);
impl_vector_common!(Vector4, 4, x, y, z, w);

impl<T: ops::Neg<Output = T>> Vector2<T> {
    /// Rotates this vector a quarter turn counterclockwise.
    #[inline]
    #[must_use]
    pub fn perpendicular(self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }
}

impl<T> Vector3<T> {
    /// Appends a fourth component.
    #[inline]
    pub fn extend(self, w: T) -> Vector4<T> {
        Vector4 {
            x: self.x,
            y: self.y,
            z: self.z,
            w,
        }
    }

    /// Discards the Z component.
    #[inline]
    pub fn xy(self) -> Vector2<T> {
        Vector2 {
            x: self.x,
            y: self.y,
        }
    }
}

impl<T: Copy + Num> Vector3<T> {
    /// Returns the cross product `self × other`.
    #[inline]
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }
}

impl<T> Vector4<T> {
    /// Discards the W component.
    #[inline]
    pub fn xyz(self) -> Vector3<T> {
        Vector3 {
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }

    /// Discards the Z and W components.
    #[inline]
    pub fn xy(self) -> Vector2<T> {
        Vector2 {
            x: self.x,
            y: self.y,
        }
    }
}

impl<T: Float> Vector4<T> {
    /// Converts a homogeneous point to a 3D point by dividing by `w`.
    ///
    /// Fails with [`MathError::PointAtInfinity`] if `w` is zero or the quotient is
    /// not finite, so that NaN never leaks into later computation.
    #[inline]
    pub fn perspective_divide(self) -> Result<Vector3<T>, MathError> {
        if self.w == T::zero() {
            return Err(MathError::PointAtInfinity);
        }
        let point = self.xyz() / self.w;
        if point.is_finite() {
            Ok(point)
        } else {
            Err(MathError::PointAtInfinity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng as _, SeedableRng as _};
    use rstest::rstest;

    #[test]
    fn arithmetic() {
        let a = Vector3::new(1, 2, 3);
        let b = Vector3::new(10, 20, 30);
        assert_eq!(a + b, Vector3::new(11, 22, 33));
        assert_eq!(b - a, Vector3::new(9, 18, 27));
        assert_eq!(-a, Vector3::new(-1, -2, -3));
        assert_eq!(a * 2, Vector3::new(2, 4, 6));
        assert_eq!(b / 10, a);
        assert_eq!(a.component_mul(b), Vector3::new(10, 40, 90));
        assert_eq!(a.dot(b), 140);
    }

    #[test]
    fn compound_assignment() {
        let mut v = Vector4::new(1.0, 2.0, 3.0, 4.0);
        v += Vector4::new(1.0, 1.0, 1.0, 1.0);
        v *= 2.0;
        v /= 4.0;
        v -= Vector4::new(0.5, 0.5, 0.5, 0.5);
        assert_eq!(v, Vector4::new(0.5, 1.0, 1.5, 2.0));
    }

    #[test]
    fn cross_is_right_handed() {
        let x = Vector3::new(1, 0, 0);
        let y = Vector3::new(0, 1, 0);
        assert_eq!(x.cross(y), Vector3::new(0, 0, 1));
        assert_eq!(y.cross(x), Vector3::new(0, 0, -1));
    }

    #[test]
    fn min_max() {
        let a = Vector2::new(1.0, 5.0);
        let b = Vector2::new(3.0, -1.0);
        assert_eq!(a.min(b), Vector2::new(1.0, -1.0));
        assert_eq!(a.max(b), Vector2::new(3.0, 5.0));
    }

    #[test]
    fn perpendicular() {
        assert_eq!(Vector2::new(1, 0).perpendicular(), Vector2::new(0, 1));
    }

    #[test]
    fn normalize_zero_is_error() {
        assert_eq!(
            Vector3::<f32>::zero().normalize(),
            Err(MathError::DegenerateVector)
        );
        assert_eq!(
            Vector2::new(f64::NAN, 1.0).normalize(),
            Err(MathError::DegenerateVector)
        );
        assert_eq!(
            Vector3::new(f32::INFINITY, 0.0, 0.0).normalize(),
            Err(MathError::DegenerateVector)
        );
    }

    #[test]
    fn normalize_has_unit_length() {
        let mut rng = rand_xoshiro::Xoshiro256Plus::seed_from_u64(1);
        for _ in 0..1000 {
            let v = Vector3::new(
                rng.random_range(-1e3..1e3),
                rng.random_range(-1e3..1e3),
                rng.random_range(-1e3..1e3),
            );
            let n: Vector3d = v.normalize().unwrap();
            assert!((n.length() - 1.0).abs() < 1e-12, "{v:?} normalized to {n:?}");
            // same direction
            assert!(n.dot(v) > 0.0);
        }
    }

    #[rstest]
    #[case(Vector3::new(1e-25, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0))]
    #[case(Vector3::new(0.0, -3e-30, 4e-30), Vector3::new(0.0, -0.6, 0.8))]
    #[case(Vector3::new(1e25, 1e25, 0.0), Vector3::new(0.707_106_77, 0.707_106_77, 0.0))]
    #[case(Vector3::new(3e37, 0.0, -4e37), Vector3::new(0.6, 0.0, -0.8))]
    #[case(Vector3::new(1e30, 1e-30, 0.0), Vector3::new(1.0, 0.0, 0.0))]
    fn normalize_extreme_magnitudes(#[case] v: Vector3<f32>, #[case] expected: Vector3<f32>) {
        let n = v.normalize().unwrap();
        assert!((n.length() - 1.0).abs() < 1e-6, "{v:?} normalized to {n:?}");
        assert!((n - expected).length() < 1e-6, "{v:?} normalized to {n:?}");
    }

    #[test]
    fn perspective_divide() {
        assert_eq!(
            Vector4::new(2.0, 4.0, 6.0, 2.0).perspective_divide(),
            Ok(Vector3::new(1.0, 2.0, 3.0))
        );
        assert_eq!(
            Vector4::new(2.0, 4.0, 6.0, 0.0).perspective_divide(),
            Err(MathError::PointAtInfinity)
        );
    }

    #[test]
    fn array_conversion() {
        let v: Vector4<i32> = [1, 2, 3, 4].into();
        assert_eq!(v, Vector4::new(1, 2, 3, 4));
        assert_eq!(<[i32; 4]>::from(v), [1, 2, 3, 4]);
        assert_eq!(v.xyz().extend(9), Vector4::new(1, 2, 3, 9));
    }
}
