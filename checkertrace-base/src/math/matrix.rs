//! 4×4 homogeneous transformation matrices.
//! This module is private but reexported by its parent.

use core::fmt;
use core::ops;

use num_traits::{Float, Num};

use crate::math::{MathError, Vector3, Vector4};

/// A 4×4 matrix stored in **row-major** order.
///
/// Element `(row, col)` is at flat index `row * 4 + col`. Translation lives in the last
/// column (indices 3, 7, 11), and vectors are multiplied as columns on the right.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Matrix4x4<T> {
    m: [T; 16],
}

#[allow(missing_docs)]
pub type Matrix4x4f = Matrix4x4<f32>;
#[allow(missing_docs)]
pub type Matrix4x4d = Matrix4x4<f64>;

impl<T> Matrix4x4<T> {
    /// Constructs a matrix from its elements in row-major order, which is also the order
    /// in which one would write them out on paper.
    #[inline]
    pub const fn from_row_major(m: [T; 16]) -> Self {
        Self { m }
    }

    /// Returns the elements in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[T; 16] {
        &self.m
    }

    /// Applies `f` to every element, e.g. to change precision.
    #[inline]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Matrix4x4<U> {
        Matrix4x4 { m: self.m.map(f) }
    }
}

impl<T: Copy> Matrix4x4<T> {
    /// Returns the elements in row-major order.
    #[inline]
    pub fn to_row_major(self) -> [T; 16] {
        self.m
    }

    /// Returns the element at `row`, `col`.
    ///
    /// Panics if either index is 4 or greater.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        assert!(row < 4 && col < 4, "matrix index ({row}, {col}) out of range");
        self.m[row * 4 + col]
    }

    /// Returns the given row as a vector.
    #[inline]
    pub fn row(&self, row: usize) -> Vector4<T> {
        Vector4::new(
            self.get(row, 0),
            self.get(row, 1),
            self.get(row, 2),
            self.get(row, 3),
        )
    }

    /// Returns the given column as a vector.
    #[inline]
    pub fn column(&self, col: usize) -> Vector4<T> {
        Vector4::new(
            self.get(0, col),
            self.get(1, col),
            self.get(2, col),
            self.get(3, col),
        )
    }

    /// Swaps rows and columns.
    #[inline]
    #[must_use]
    pub fn transpose(self) -> Self {
        let m = self.m;
        Self {
            m: core::array::from_fn(|i| m[(i % 4) * 4 + i / 4]),
        }
    }
}

impl<T: Copy + Num> Matrix4x4<T> {
    /// Returns the identity matrix.
    #[inline]
    pub fn identity() -> Self {
        let (o, l) = (T::zero(), T::one());
        #[rustfmt::skip]
        let m = [
            l, o, o, o,
            o, l, o, o,
            o, o, l, o,
            o, o, o, l,
        ];
        Self { m }
    }

    /// Returns whether this is exactly the identity matrix.
    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Multiplies every element by `s`.
    #[inline]
    #[must_use]
    pub fn scaled(self, s: T) -> Self {
        self.map(|e| e * s)
    }

    /// Computes the determinant by cofactor expansion.
    pub fn determinant(&self) -> T {
        let (s, c) = self.sub_determinants();
        s[0] * c[5] - s[1] * c[4] + s[2] * c[3] + s[3] * c[2] - s[4] * c[1] + s[5] * c[0]
    }

    /// Applies this matrix to a point with implicit `w = 1`, discarding the resulting `w`.
    ///
    /// This is only meaningful for affine matrices; use `self * point.extend(1)` and
    /// [`Vector4::perspective_divide`] for projections.
    #[inline]
    pub fn transform_point(&self, p: Vector3<T>) -> Vector3<T> {
        (*self * p.extend(T::one())).xyz()
    }

    /// Applies this matrix to a direction, ignoring translation.
    #[inline]
    pub fn transform_vector(&self, v: Vector3<T>) -> Vector3<T> {
        (*self * v.extend(T::zero())).xyz()
    }

    /// The 2×2 sub-determinants of the top two and bottom two rows, shared by
    /// [`Self::determinant`] and [`Self::inverse`].
    #[inline]
    fn sub_determinants(&self) -> ([T; 6], [T; 6]) {
        let a = |r: usize, c: usize| self.m[r * 4 + c];
        let s = [
            a(0, 0) * a(1, 1) - a(1, 0) * a(0, 1),
            a(0, 0) * a(1, 2) - a(1, 0) * a(0, 2),
            a(0, 0) * a(1, 3) - a(1, 0) * a(0, 3),
            a(0, 1) * a(1, 2) - a(1, 1) * a(0, 2),
            a(0, 1) * a(1, 3) - a(1, 1) * a(0, 3),
            a(0, 2) * a(1, 3) - a(1, 2) * a(0, 3),
        ];
        let c = [
            a(2, 0) * a(3, 1) - a(3, 0) * a(2, 1),
            a(2, 0) * a(3, 2) - a(3, 0) * a(2, 2),
            a(2, 0) * a(3, 3) - a(3, 0) * a(2, 3),
            a(2, 1) * a(3, 2) - a(3, 1) * a(2, 2),
            a(2, 1) * a(3, 3) - a(3, 1) * a(2, 3),
            a(2, 2) * a(3, 3) - a(3, 2) * a(2, 3),
        ];
        (s, c)
    }
}

impl<T: Float> Matrix4x4<T> {
    /// Computes the inverse matrix.
    ///
    /// Fails with [`MathError::SingularMatrix`] if the determinant is zero or not finite.
    /// There is no tolerance: a nearly-singular matrix is inverted, with correspondingly
    /// large elements.
    pub fn inverse(&self) -> Result<Self, MathError> {
        let (s, c) = self.sub_determinants();
        let det = s[0] * c[5] - s[1] * c[4] + s[2] * c[3] + s[3] * c[2] - s[4] * c[1]
            + s[5] * c[0];
        if det == T::zero() || !det.is_finite() {
            return Err(MathError::SingularMatrix);
        }
        let inv_det = det.recip();
        let a = |r: usize, col: usize| self.m[r * 4 + col];

        #[rustfmt::skip]
        let m = [
            a(1, 1) * c[5] - a(1, 2) * c[4] + a(1, 3) * c[3],
            -a(0, 1) * c[5] + a(0, 2) * c[4] - a(0, 3) * c[3],
            a(3, 1) * s[5] - a(3, 2) * s[4] + a(3, 3) * s[3],
            -a(2, 1) * s[5] + a(2, 2) * s[4] - a(2, 3) * s[3],

            -a(1, 0) * c[5] + a(1, 2) * c[2] - a(1, 3) * c[1],
            a(0, 0) * c[5] - a(0, 2) * c[2] + a(0, 3) * c[1],
            -a(3, 0) * s[5] + a(3, 2) * s[2] - a(3, 3) * s[1],
            a(2, 0) * s[5] - a(2, 2) * s[2] + a(2, 3) * s[1],

            a(1, 0) * c[4] - a(1, 1) * c[2] + a(1, 3) * c[0],
            -a(0, 0) * c[4] + a(0, 1) * c[2] - a(0, 3) * c[0],
            a(3, 0) * s[4] - a(3, 1) * s[2] + a(3, 3) * s[0],
            -a(2, 0) * s[4] + a(2, 1) * s[2] - a(2, 3) * s[0],

            -a(1, 0) * c[3] + a(1, 1) * c[1] - a(1, 2) * c[0],
            a(0, 0) * c[3] - a(0, 1) * c[1] + a(0, 2) * c[0],
            -a(3, 0) * s[3] + a(3, 1) * s[1] - a(3, 2) * s[0],
            a(2, 0) * s[3] - a(2, 1) * s[1] + a(2, 2) * s[0],
        ];
        let inverse = Self { m }.scaled(inv_det);
        if inverse.m.iter().all(|e| e.is_finite()) {
            Ok(inverse)
        } else {
            Err(MathError::SingularMatrix)
        }
    }

    /// Returns whether every element of `self` is within `tolerance` of the corresponding
    /// element of `other`.
    pub fn approx_eq(&self, other: &Self, tolerance: T) -> bool {
        self.m
            .iter()
            .zip(other.m.iter())
            .all(|(&a, &b)| (a - b).abs() <= tolerance)
    }
}

impl<T: Copy + Num> Default for Matrix4x4<T> {
    /// Returns the identity matrix.
    #[inline]
    fn default() -> Self {
        Self::identity()
    }
}

impl<T: fmt::Debug> fmt::Debug for Matrix4x4<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rows = f.debug_list();
        for row in self.m.chunks_exact(4) {
            rows.entry(&row);
        }
        rows.finish()
    }
}

impl<T> ops::Index<usize> for Matrix4x4<T> {
    type Output = T;
    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.m[index]
    }
}

impl<T> ops::IndexMut<usize> for Matrix4x4<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.m[index]
    }
}

impl<T: Copy + Num> ops::Mul for Matrix4x4<T> {
    type Output = Self;

    /// Matrix product; `(a * b) * v == a * (b * v)`.
    fn mul(self, rhs: Self) -> Self {
        Self {
            m: core::array::from_fn(|i| {
                let (row, col) = (i / 4, i % 4);
                (0..4).fold(T::zero(), |sum, k| {
                    sum + self.m[row * 4 + k] * rhs.m[k * 4 + col]
                })
            }),
        }
    }
}

impl<T: Copy + Num> ops::MulAssign for Matrix4x4<T> {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<T: Copy + Num> ops::Mul<Vector4<T>> for Matrix4x4<T> {
    type Output = Vector4<T>;

    #[inline]
    fn mul(self, v: Vector4<T>) -> Vector4<T> {
        Vector4::new(
            self.row(0).dot(v),
            self.row(1).dot(v),
            self.row(2).dot(v),
            self.row(3).dot(v),
        )
    }
}
