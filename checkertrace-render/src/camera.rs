//! Camera positioning and the matrices derived from it.

use core::f32::consts::FRAC_PI_2;

use crate::math::{
    FreeCoordinate, MathError, Matrix4x4f, Vector2f, Vector3, Vector3f, look_at, perspective,
    rotate, translate,
};
use crate::raytracer::Ray;

type M = Matrix4x4f;

/// World-space up direction used by [`CameraMode::Target`].
const UP: Vector3f = Vector3::new(0.0, 1.0, 0.0);

/// How a [`Camera`]'s view matrix is determined.
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub enum CameraMode {
    /// The view matrix is recomputed on every [`Camera::update()`] to look from the
    /// camera's position at `target`, with +Y up.
    Target {
        /// Point the camera looks at.
        target: Vector3f,
    },
    /// The view matrix is whatever was last given to [`Camera::set_view_matrix()`], as
    /// modified by [`Camera::translate_local()`] and [`Camera::rotate_local()`]. The
    /// camera's position is derived from it.
    Free,
}

/// A perspective camera.
///
/// All setters only record their input; the derived matrices are computed by
/// [`Camera::update()`], which must be called after any change and before
/// [`Camera::matrices()`] is used.
#[derive(Clone, Debug)]
pub struct Camera {
    // Caller-provided data
    mode: CameraMode,
    position: Vector3f,
    view: M,
    fov_y: FreeCoordinate,
    aspect_ratio: FreeCoordinate,
    z_near: FreeCoordinate,
    z_far: FreeCoordinate,

    // Derived data; `None` when out of date.
    matrices: Option<CameraMatrices>,
}

impl Camera {
    /// Default distance to the near clipping plane.
    pub const DEFAULT_Z_NEAR: FreeCoordinate = 0.1;
    /// Default distance to the far clipping plane.
    pub const DEFAULT_Z_FAR: FreeCoordinate = 100.0;

    /// Creates a camera at `position` looking at `target`, with a 90° vertical field of
    /// view and a square aspect ratio.
    pub fn looking_at(position: Vector3f, target: Vector3f) -> Self {
        Self {
            mode: CameraMode::Target { target },
            position,
            view: M::identity(),
            fov_y: FRAC_PI_2,
            aspect_ratio: 1.0,
            z_near: Self::DEFAULT_Z_NEAR,
            z_far: Self::DEFAULT_Z_FAR,
            matrices: None,
        }
    }

    /// Creates a free camera with the given view (world to eye) matrix.
    pub fn free(view: M) -> Self {
        Self {
            mode: CameraMode::Free,
            view,
            ..Self::looking_at(Vector3::zero(), Vector3::zero())
        }
    }

    #[allow(missing_docs)]
    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// Replaces the mode. Switching from [`CameraMode::Target`] to [`CameraMode::Free`]
    /// keeps the most recently computed view matrix.
    pub fn set_mode(&mut self, mode: CameraMode) {
        self.mode = mode;
        self.matrices = None;
    }

    /// Returns the camera position as of the last [`Self::update()`] (in
    /// [`CameraMode::Free`]) or as last set (in [`CameraMode::Target`]).
    pub fn position(&self) -> Vector3f {
        self.position
    }

    /// Sets the camera position. In [`CameraMode::Free`] this has no effect, since the
    /// position is derived from the view matrix.
    pub fn set_position(&mut self, position: Vector3f) {
        self.position = position;
        self.matrices = None;
    }

    /// Returns the view matrix, transforming world coordinates into eye coordinates.
    pub fn view(&self) -> M {
        self.view
    }

    /// Sets the view matrix and switches to [`CameraMode::Free`].
    pub fn set_view_matrix(&mut self, view: M) {
        self.mode = CameraMode::Free;
        self.view = view;
        self.matrices = None;
    }

    /// Moves the camera by `offset` expressed in its own eye coordinates (−Z forward).
    ///
    /// Only lasting in [`CameraMode::Free`]; a [`CameraMode::Target`] camera recomputes
    /// its view on every update.
    pub fn translate_local(&mut self, offset: Vector3f) {
        self.view = translate(offset) * self.view;
        self.matrices = None;
    }

    /// Rotates the camera by `angle` radians about `axis` expressed in its own eye
    /// coordinates.
    ///
    /// Only lasting in [`CameraMode::Free`], like [`Self::translate_local()`].
    pub fn rotate_local(&mut self, axis: Vector3f, angle: FreeCoordinate) -> Result<(), MathError> {
        self.view = rotate(axis, angle)? * self.view;
        self.matrices = None;
        Ok(())
    }

    /// Returns the vertical field of view in radians.
    pub fn fov_y(&self) -> FreeCoordinate {
        self.fov_y
    }

    /// Sets the vertical field of view in radians.
    pub fn set_fov_y(&mut self, fov_y: FreeCoordinate) {
        self.fov_y = fov_y;
        self.matrices = None;
    }

    /// Sets the aspect ratio (width divided by height) of the projection.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: FreeCoordinate) {
        self.aspect_ratio = aspect_ratio;
        self.matrices = None;
    }

    /// Sets the distances to the near and far clipping planes.
    pub fn set_clip_planes(&mut self, z_near: FreeCoordinate, z_far: FreeCoordinate) {
        self.z_near = z_near;
        self.z_far = z_far;
        self.matrices = None;
    }

    /// Recomputes the view (in target mode) or position (in free mode), and then the
    /// projection matrices.
    ///
    /// On failure, the camera has no valid matrices until a later `update()` succeeds.
    pub fn update(&mut self) -> Result<(), CameraError> {
        self.matrices = None;
        match self.mode {
            CameraMode::Target { target } => {
                self.view = look_at(self.position, target, UP)?;
            }
            CameraMode::Free => {
                self.position = self.view.inverse()?.transform_point(Vector3::zero());
            }
        }
        let projection = perspective(self.fov_y, self.aspect_ratio, self.z_near, self.z_far)?;
        let view_to_clip = projection * self.view;
        let clip_to_view = view_to_clip.inverse()?;
        self.matrices = Some(CameraMatrices {
            view: self.view,
            view_to_clip,
            clip_to_view,
            position: self.position,
        });
        Ok(())
    }

    /// Returns the matrices computed by the last [`Self::update()`].
    ///
    /// Fails with [`CameraError::Stale`] if the camera has changed since then, or the
    /// update failed.
    pub fn matrices(&self) -> Result<CameraMatrices, CameraError> {
        self.matrices.ok_or(CameraError::Stale)
    }
}

/// The matrices of a [`Camera`] as of one [`Camera::update()`].
///
/// This is a small value that can be copied into each rendering job, so that the jobs
/// need not share the camera itself.
#[expect(clippy::exhaustive_structs)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraMatrices {
    /// World to eye coordinates.
    pub view: M,
    /// World to clip coordinates: the projection composed with [`Self::view`].
    pub view_to_clip: M,
    /// Clip to world coordinates: the inverse of [`Self::view_to_clip`].
    pub clip_to_view: M,
    /// Eye position in world coordinates.
    pub position: Vector3f,
}

impl CameraMatrices {
    /// Converts a screen position in normalized device coordinates (range −1 to 1, +Y up)
    /// into a ray in world space.
    ///
    /// The ray starts on the near plane and its direction reaches the far plane; it is not
    /// normalized.
    pub fn project_ndc_into_world(
        &self,
        ndc_x: FreeCoordinate,
        ndc_y: FreeCoordinate,
    ) -> Result<Ray, MathError> {
        let ndc_near = Vector3::new(ndc_x, ndc_y, -1.0).extend(1.0);
        let ndc_far = Vector3::new(ndc_x, ndc_y, 1.0).extend(1.0);
        // World-space endpoints of the ray.
        let world_near = (self.clip_to_view * ndc_near).perspective_divide()?;
        let world_far = (self.clip_to_view * ndc_far).perspective_divide()?;
        Ok(Ray {
            origin: world_near,
            direction: world_far - world_near,
        })
    }

    /// Projects a world-space point into normalized device coordinates.
    ///
    /// Points in or behind the plane of the eye have no meaningful projection and produce
    /// [`MathError::PointAtInfinity`].
    pub fn project_to_ndc(&self, point: Vector3f) -> Result<Vector3f, MathError> {
        let clip = self.view_to_clip * point.extend(1.0);
        if !(clip.w > 0.0) {
            return Err(MathError::PointAtInfinity);
        }
        clip.perspective_divide()
    }
}

/// Dimensions of a framebuffer, for converting between pixel and normalized device
/// coordinates.
#[expect(clippy::exhaustive_structs)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Viewport {
    #[allow(missing_docs)]
    pub width: usize,
    #[allow(missing_docs)]
    pub height: usize,
}

impl Viewport {
    #![allow(clippy::cast_lossless)] // lossiness depends on size of usize

    #[allow(missing_docs)]
    #[inline]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    #[inline]
    pub fn aspect_ratio(&self) -> FreeCoordinate {
        self.width as FreeCoordinate / self.height as FreeCoordinate
    }

    /// Convert an *x* coordinate from the range `0..self.width` (upper exclusive)
    /// to normalized device coordinates, range -1 to 1 (at pixel centers).
    #[inline]
    pub fn normalize_fb_x(&self, x: usize) -> FreeCoordinate {
        (x as FreeCoordinate + 0.5) / self.width as FreeCoordinate * 2.0 - 1.0
    }

    /// Convert a *y* coordinate from the range `0..self.height` (upper exclusive)
    /// to normalized device coordinates, range -1 to 1 (at pixel centers).
    ///
    /// Unlike window-system coordinates, row 0 is at the bottom, so no flip is needed.
    #[inline]
    pub fn normalize_fb_y(&self, y: usize) -> FreeCoordinate {
        (y as FreeCoordinate + 0.5) / self.height as FreeCoordinate * 2.0 - 1.0
    }

    /// Convert normalized device coordinates to continuous framebuffer coordinates, in
    /// which pixel (x, y) covers `[x, x + 1) × [y, y + 1)`.
    #[inline]
    pub fn ndc_to_fb(&self, ndc: Vector2f) -> Vector2f {
        Vector2f::new(
            (ndc.x + 1.0) * self.width as FreeCoordinate / 2.0,
            (ndc.y + 1.0) * self.height as FreeCoordinate / 2.0,
        )
    }
}

/// Error from [`Camera::update()`] or [`Camera::matrices()`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, displaydoc::Display)]
#[non_exhaustive]
pub enum CameraError {
    /// camera matrices are out of date; `Camera::update()` must succeed first
    Stale,

    /// camera matrices could not be computed: {0}
    Math(MathError),
}

impl std::error::Error for CameraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CameraError::Stale => None,
            CameraError::Math(e) => Some(e),
        }
    }
}

impl From<MathError> for CameraError {
    fn from(value: MathError) -> Self {
        Self::Math(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_close(actual: Vector3f, expected: Vector3f) {
        assert!(
            (actual - expected).length() < 1e-3,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn matrices_require_update() {
        let mut camera = Camera::looking_at(Vector3::new(0.0, 5.0, 10.0), Vector3::zero());
        assert_eq!(camera.matrices(), Err(CameraError::Stale));
        camera.update().unwrap();
        assert!(camera.matrices().is_ok());
        camera.set_fov_y(1.0);
        assert_eq!(camera.matrices(), Err(CameraError::Stale));
    }

    #[test]
    fn degenerate_target_leaves_camera_stale() {
        let point = Vector3::new(1.0, 2.0, 3.0);
        let mut camera = Camera::looking_at(point, point);
        assert_eq!(
            camera.update(),
            Err(CameraError::Math(MathError::DegenerateVector))
        );
        assert_eq!(camera.matrices(), Err(CameraError::Stale));
    }

    #[test]
    fn bad_clip_planes_are_a_precondition_error() {
        let mut camera = Camera::looking_at(Vector3::new(0.0, 0.0, 10.0), Vector3::zero());
        camera.set_clip_planes(10.0, 1.0);
        assert!(matches!(
            camera.update(),
            Err(CameraError::Math(MathError::Precondition(_)))
        ));
    }

    #[test]
    fn center_ray_points_at_target() {
        let target = Vector3::new(1.0, 0.0, -2.0);
        let mut camera = Camera::looking_at(Vector3::new(4.0, 6.0, 3.0), target);
        camera.update().unwrap();
        let ray = camera
            .matrices()
            .unwrap()
            .project_ndc_into_world(0.0, 0.0)
            .unwrap();
        let to_target = (target - ray.origin).normalize().unwrap();
        let direction = ray.direction.normalize().unwrap();
        assert_close(direction, to_target);
    }

    #[test]
    fn ray_endpoints_are_on_clip_planes() {
        let position = Vector3::new(0.0, 0.0, 10.0);
        let mut camera = Camera::looking_at(position, Vector3::zero());
        camera.update().unwrap();
        let ray = camera
            .matrices()
            .unwrap()
            .project_ndc_into_world(0.0, 0.0)
            .unwrap();
        assert_close(
            ray.origin,
            Vector3::new(0.0, 0.0, 10.0 - Camera::DEFAULT_Z_NEAR),
        );
        // Depth precision near the far plane is poor in single precision.
        let expected_length = Camera::DEFAULT_Z_FAR - Camera::DEFAULT_Z_NEAR;
        assert!((ray.direction.length() - expected_length).abs() < 1.0);
    }

    #[test]
    fn project_to_ndc() {
        let mut camera = Camera::looking_at(Vector3::new(3.0, 4.0, 5.0), Vector3::zero());
        camera.update().unwrap();
        let matrices = camera.matrices().unwrap();
        // The target is in the middle of the screen, between the clip planes.
        let ndc = matrices.project_to_ndc(Vector3::zero()).unwrap();
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5, "{ndc:?}");
        assert!(ndc.z > -1.0 && ndc.z < 1.0, "{ndc:?}");
        // A point behind the camera has no projection.
        assert_eq!(
            matrices.project_to_ndc(Vector3::new(6.0, 8.0, 10.0)),
            Err(MathError::PointAtInfinity)
        );
    }

    #[test]
    fn free_mode_derives_position() {
        let mut camera = Camera::free(translate(Vector3::new(0.0, -1.0, 0.0)));
        camera.update().unwrap();
        assert_close(camera.position(), Vector3::new(0.0, 1.0, 0.0));

        // Moving forward (−Z in eye space) moves the position along world −Z.
        camera.translate_local(Vector3::new(0.0, 0.0, 2.0));
        camera.update().unwrap();
        assert_close(camera.position(), Vector3::new(0.0, 1.0, -2.0));

        // A half turn about the eye's Y axis keeps the position.
        camera
            .rotate_local(Vector3::new(0.0, 1.0, 0.0), core::f32::consts::PI)
            .unwrap();
        camera.update().unwrap();
        assert_close(camera.position(), Vector3::new(0.0, 1.0, -2.0));
        assert_eq!(camera.matrices().unwrap().position, camera.position());
    }

    #[test]
    fn set_view_matrix_switches_to_free() {
        let mut camera = Camera::looking_at(Vector3::new(0.0, 0.0, 5.0), Vector3::zero());
        camera.set_view_matrix(translate(Vector3::new(0.0, 0.0, -7.0)));
        assert_eq!(camera.mode(), CameraMode::Free);
        camera.update().unwrap();
        assert_close(camera.position(), Vector3::new(0.0, 0.0, 7.0));
    }

    #[test]
    fn viewport_normalization() {
        let viewport = Viewport::new(4, 2);
        assert_eq!(viewport.aspect_ratio(), 2.0);
        assert_eq!(viewport.normalize_fb_x(0), -0.75);
        assert_eq!(viewport.normalize_fb_x(3), 0.75);
        assert_eq!(viewport.normalize_fb_y(0), -0.5);
        assert_eq!(viewport.normalize_fb_y(1), 0.5);
        assert_eq!(
            viewport.ndc_to_fb(Vector2f::new(-1.0, 1.0)),
            Vector2f::new(0.0, 2.0)
        );
    }
}
