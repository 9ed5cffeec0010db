//! Constructors for common transformation matrices.
//! This module is private but reexported by its parent.
//!
//! All of these produce the same matrices as the corresponding legacy OpenGL calls
//! (`glTranslate`, `glRotate`, `gluPerspective`, `gluLookAt`, `glOrtho`), written out in
//! row-major order.

use num_traits::Float;

use crate::math::{MathError, Matrix4x4, Vector2, Vector3};

/// Returns a matrix which translates points by `offset`.
#[inline]
pub fn translate<T: Float>(offset: Vector3<T>) -> Matrix4x4<T> {
    let (o, l) = (T::zero(), T::one());
    #[rustfmt::skip]
    let m = [
        l, o, o, offset.x,
        o, l, o, offset.y,
        o, o, l, offset.z,
        o, o, o, l,
    ];
    Matrix4x4::from_row_major(m)
}

/// Returns a matrix which scales each axis by the corresponding component of `factors`.
#[inline]
pub fn scale<T: Float>(factors: Vector3<T>) -> Matrix4x4<T> {
    let (o, l) = (T::zero(), T::one());
    #[rustfmt::skip]
    let m = [
        factors.x, o, o, o,
        o, factors.y, o, o,
        o, o, factors.z, o,
        o, o, o, l,
    ];
    Matrix4x4::from_row_major(m)
}

/// Returns a matrix which rotates counterclockwise by `angle` radians about `axis`
/// (counterclockwise when looking from the tip of `axis` towards the origin).
///
/// `axis` need not be normalized, but must not be zero.
pub fn rotate<T: Float>(axis: Vector3<T>, angle: T) -> Result<Matrix4x4<T>, MathError> {
    let Vector3 { x, y, z } = axis.normalize()?;
    let (s, c) = angle.sin_cos();
    let t = T::one() - c;
    let (o, l) = (T::zero(), T::one());
    #[rustfmt::skip]
    let m = [
        x * x * t + c,     x * y * t - z * s, x * z * t + y * s, o,
        y * x * t + z * s, y * y * t + c,     y * z * t - x * s, o,
        x * z * t - y * s, y * z * t + x * s, z * z * t + c,     o,
        o,                 o,                 o,                 l,
    ];
    Ok(Matrix4x4::from_row_major(m))
}

/// Returns a perspective projection matrix from view space (looking down −Z) to clip space.
///
/// * `fov_y` is the full vertical field of view in radians, and must be in `(0, π)`.
/// * `aspect` is width divided by height, and must be finite and nonzero.
/// * Requires `0 < z_near < z_far`.
///
/// Violating these is reported as [`MathError::Precondition`].
pub fn perspective<T: Float>(
    fov_y: T,
    aspect: T,
    z_near: T,
    z_far: T,
) -> Result<Matrix4x4<T>, MathError> {
    let (o, l) = (T::zero(), T::one());
    let two = l + l;
    if !(fov_y > o && fov_y < T::from(core::f64::consts::PI).unwrap_or(o)) {
        return Err(MathError::Precondition("field of view must be in (0, π)"));
    }
    if !(aspect.is_finite() && aspect != o) {
        return Err(MathError::Precondition(
            "aspect ratio must be finite and nonzero",
        ));
    }
    if !(z_near > o && z_near < z_far && z_far.is_finite()) {
        return Err(MathError::Precondition("requires 0 < z_near < z_far"));
    }

    let f = (fov_y / two).tan().recip();
    let depth = z_near - z_far;
    #[rustfmt::skip]
    let m = [
        f / aspect, o, o,                          o,
        o,          f, o,                          o,
        o,          o, (z_far + z_near) / depth,   two * z_far * z_near / depth,
        o,          o, -l,                         o,
    ];
    Ok(Matrix4x4::from_row_major(m))
}

/// Returns a view matrix placing the eye at `eye`, looking towards `center`, with `up`
/// being the approximate upward direction on screen.
///
/// Fails with [`MathError::DegenerateVector`] if `center == eye` or `up` is parallel to
/// the viewing direction.
pub fn look_at<T: Float>(
    eye: Vector3<T>,
    center: Vector3<T>,
    up: Vector3<T>,
) -> Result<Matrix4x4<T>, MathError> {
    let forward = (center - eye).normalize()?;
    let side = forward.cross(up.normalize()?).normalize()?;
    let up = side.cross(forward);
    let (o, l) = (T::zero(), T::one());
    #[rustfmt::skip]
    let basis = Matrix4x4::from_row_major([
        side.x,     side.y,     side.z,     o,
        up.x,       up.y,       up.z,       o,
        -forward.x, -forward.y, -forward.z, o,
        o,          o,          o,          l,
    ]);
    Ok(basis * translate(-eye))
}

/// Returns an orthographic projection mapping the box with corners `p0` and `p1` onto the
/// clip-space cube. The Z components are the near and far distances, as in `glOrtho`.
pub fn ortho<T: Float>(p0: Vector3<T>, p1: Vector3<T>) -> Result<Matrix4x4<T>, MathError> {
    let extent = p1 - p0;
    if !(extent.x != T::zero() && extent.y != T::zero() && extent.z != T::zero())
        || !extent.is_finite()
    {
        return Err(MathError::Precondition(
            "orthographic volume must have nonzero finite extent",
        ));
    }
    let (o, l) = (T::zero(), T::one());
    let two = l + l;
    #[rustfmt::skip]
    let m = [
        two / extent.x, o,              o,               -(p1.x + p0.x) / extent.x,
        o,              two / extent.y, o,               -(p1.y + p0.y) / extent.y,
        o,              o,              -two / extent.z, -(p1.z + p0.z) / extent.z,
        o,              o,              o,               l,
    ];
    Ok(Matrix4x4::from_row_major(m))
}

/// [`ortho`] with the depth range fixed at `[-1, 1]`, for 2D overlays.
pub fn ortho_2d<T: Float>(p0: Vector2<T>, p1: Vector2<T>) -> Result<Matrix4x4<T>, MathError> {
    let one = T::one();
    ortho(
        Vector3::new(p0.x, p0.y, -one),
        Vector3::new(p1.x, p1.y, one),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vector3d, Vector4};
    use core::f64::consts::PI;
    use rstest::rstest;

    fn assert_close(actual: Vector3d, expected: Vector3d) {
        assert!(
            (actual - expected).length() < 1e-9,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn translate_and_scale() {
        let m = translate(Vector3::new(1.0, 2.0, 3.0)) * scale(Vector3::new(2.0, 2.0, 2.0));
        assert_close(
            m.transform_point(Vector3::new(1.0, 1.0, 1.0)),
            Vector3::new(3.0, 4.0, 5.0),
        );
    }

    #[test]
    fn rotate_quarter_turn_about_y() {
        let m = rotate(Vector3::new(0.0, 2.0, 0.0), PI / 2.0).unwrap();
        assert_close(
            m.transform_vector(Vector3::new(1.0, 0.0, 0.0)),
            Vector3::new(0.0, 0.0, -1.0),
        );
        assert_close(
            m.transform_vector(Vector3::new(0.0, 1.0, 0.0)),
            Vector3::new(0.0, 1.0, 0.0),
        );
    }

    #[test]
    fn rotate_zero_axis_is_error() {
        assert_eq!(
            rotate(Vector3::<f32>::zero(), 1.0),
            Err(MathError::DegenerateVector)
        );
    }

    #[test]
    fn perspective_maps_near_and_far_planes() {
        let m = perspective(PI / 2.0, 1.0, 0.1, 100.0).unwrap();
        let near = (m * Vector4::new(0.0, 0.0, -0.1, 1.0))
            .perspective_divide()
            .unwrap();
        let far = (m * Vector4::new(0.0, 0.0, -100.0, 1.0))
            .perspective_divide()
            .unwrap();
        assert!((near.z + 1.0).abs() < 1e-9, "{near:?}");
        assert!((far.z - 1.0).abs() < 1e-9, "{far:?}");

        // With a 90° field of view, the frustum edge at distance 1 is at ±1.
        let edge = (m * Vector4::new(1.0, 1.0, -1.0, 1.0))
            .perspective_divide()
            .unwrap();
        assert!((edge.x - 1.0).abs() < 1e-9 && (edge.y - 1.0).abs() < 1e-9);
    }

    #[rstest]
    #[case::zero_near(PI / 2.0, 1.0, 0.0, 10.0)]
    #[case::negative_near(PI / 2.0, 1.0, -1.0, 10.0)]
    #[case::near_equals_far(PI / 2.0, 1.0, 10.0, 10.0)]
    #[case::near_beyond_far(PI / 2.0, 1.0, 20.0, 10.0)]
    #[case::zero_fov(0.0, 1.0, 0.1, 10.0)]
    #[case::straight_fov(PI, 1.0, 0.1, 10.0)]
    #[case::zero_aspect(PI / 2.0, 0.0, 0.1, 10.0)]
    #[case::nan_aspect(PI / 2.0, f64::NAN, 0.1, 10.0)]
    fn perspective_preconditions(
        #[case] fov_y: f64,
        #[case] aspect: f64,
        #[case] z_near: f64,
        #[case] z_far: f64,
    ) {
        assert!(matches!(
            perspective(fov_y, aspect, z_near, z_far),
            Err(MathError::Precondition(_))
        ));
    }

    #[test]
    fn look_at_moves_eye_to_origin() {
        let eye = Vector3::new(3.0, 4.0, 5.0);
        let center = Vector3::new(3.0, 4.0, -10.0);
        let view = look_at(eye, center, Vector3::new(0.0, 1.0, 0.0)).unwrap();
        assert_close(view.transform_point(eye), Vector3::zero());
        // Looking straight down −Z from the eye, so the view is a pure translation.
        assert_close(
            view.transform_point(center),
            Vector3::new(0.0, 0.0, -15.0),
        );
    }

    #[test]
    fn look_at_target_is_on_negative_z_axis() {
        let eye = Vector3::new(10.0, 10.0, 0.0);
        let view = look_at(eye, Vector3::zero(), Vector3::new(0.0, 1.0, 0.0)).unwrap();
        let target = view.transform_point(Vector3::zero());
        assert_close(target, Vector3::new(0.0, 0.0, -(200.0f64).sqrt()));
    }

    #[rstest]
    #[case::same_point(Vector3::new(1.0, 1.0, 1.0), Vector3::new(1.0, 1.0, 1.0))]
    #[case::looking_straight_up(Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 5.0, 0.0))]
    fn look_at_degenerate(#[case] eye: Vector3d, #[case] center: Vector3d) {
        assert_eq!(
            look_at(eye, center, Vector3::new(0.0, 1.0, 0.0)),
            Err(MathError::DegenerateVector)
        );
    }

    #[test]
    fn ortho_2d_maps_corners() {
        let m = ortho_2d(Vector2::new(0.0, 0.0), Vector2::new(640.0, 480.0)).unwrap();
        assert_close(
            m.transform_point(Vector3::new(640.0, 480.0, 0.0)),
            Vector3::new(1.0, 1.0, 0.0),
        );
        assert_close(
            m.transform_point(Vector3::new(0.0, 0.0, 0.0)),
            Vector3::new(-1.0, -1.0, 0.0),
        );
        assert!(ortho_2d(Vector2::new(1.0, 0.0), Vector2::new(1.0, 5.0)).is_err());
    }
}
