use crate::math::{FreeCoordinate, Vector3f};

/// A ray; a half-infinite line segment.
#[expect(clippy::exhaustive_structs)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// The sole endpoint of the ray.
    pub origin: Vector3f,

    /// The direction in which the ray extends infinitely.
    ///
    /// The meaning, if any, of the magnitude of this vector depends on context;
    /// rays produced by [`CameraMatrices::project_ndc_into_world()`] have the length
    /// of the depth of the view frustum.
    ///
    /// [`CameraMatrices::project_ndc_into_world()`]: crate::camera::CameraMatrices::project_ndc_into_world
    pub direction: Vector3f,
}

impl Ray {
    #[allow(missing_docs)]
    #[inline]
    pub const fn new(origin: Vector3f, direction: Vector3f) -> Self {
        Self { origin, direction }
    }

    /// Returns the point `origin + direction * t`.
    #[inline]
    pub fn at(&self, t: FreeCoordinate) -> Vector3f {
        self.origin + self.direction * t
    }

    /// Intersects this ray with the ground plane `y = 0`, returning the ray parameter of
    /// the hit.
    ///
    /// Hits at or behind the origin (`t <= 0`) are not hits, and neither is a ray parallel
    /// to the plane (whose `t` is infinite or NaN).
    #[inline]
    pub fn intersect_ground_plane(&self) -> Option<FreeCoordinate> {
        let t = self.origin.y / -self.direction.y;
        (t.is_finite() && t > 0.0).then_some(t)
    }

    /// Intersects this ray with the infinite vertical cylinder of the given `radius`
    /// around the Y axis, returning the smallest strictly positive ray parameter at which
    /// the ray meets its surface.
    ///
    /// A ray starting inside the cylinder hits it on the way out. A vertical ray never hits.
    pub fn intersect_vertical_cylinder(&self, radius: FreeCoordinate) -> Option<FreeCoordinate> {
        let Vector3f { x: ox, z: oz, .. } = self.origin;
        let Vector3f { x: dx, z: dz, .. } = self.direction;
        let a = dx * dx + dz * dz;
        let b = 2.0 * (ox * dx + oz * dz);
        let c = ox * ox + oz * oz - radius * radius;
        if a == 0.0 {
            return None;
        }
        let discriminant = b * b - 4.0 * a * c;
        if !(discriminant >= 0.0) {
            return None;
        }
        let root = discriminant.sqrt();
        let near = (-b - root) / (2.0 * a);
        let far = (-b + root) / (2.0 * a);
        [near, far].into_iter().find(|t| t.is_finite() && *t > 0.0)
    }
}
