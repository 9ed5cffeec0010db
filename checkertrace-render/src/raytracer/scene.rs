use crate::math::{FreeCoordinate, MathError, Rgba, Vector3f};
use crate::raytracer::Ray;

/// Spatial frequency of the checkerboard: cells per world unit.
pub const CHECKER_FREQUENCY: FreeCoordinate = 5.0;

/// What the raytracer renders.
///
/// The ground plane `y = 0` is always present; the [`Cylinder`] is optional.
#[expect(clippy::exhaustive_structs)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Scene {
    /// Color of rays that hit nothing, and of pixels that could not be traced.
    pub background: Background,
    /// A vertical cylinder standing on the ground plane, if any.
    pub cylinder: Option<Cylinder>,
}

/// An infinite vertical cylinder centered on the Y axis.
///
/// Below `cap_height` it is textured as a wall (checker axes are arc length around the
/// cylinder and height). Above `cap_height` it is textured with the same X/Z checkerboard
/// as the ground, as if projected from above.
#[expect(clippy::exhaustive_structs)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cylinder {
    #[allow(missing_docs)]
    pub radius: FreeCoordinate,
    #[allow(missing_docs)]
    pub cap_height: FreeCoordinate,
}

/// How rays which hit nothing are colored.
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub enum Background {
    /// A single color regardless of direction.
    Solid(Rgba),
    /// A vertical gradient by ray direction, from `horizon` (level rays and below) to
    /// `zenith` (straight up).
    Sky {
        #[allow(missing_docs)]
        horizon: Rgba,
        #[allow(missing_docs)]
        zenith: Rgba,
    },
}

impl Background {
    /// The standard deep blue background.
    pub const DEFAULT: Self = Self::Solid(Rgba::new(0.1, 0.2, 0.8, 1.0));

    /// Returns the color seen along a ray with the given `direction`.
    pub fn color(self, direction: Vector3f) -> Result<Rgba, MathError> {
        match self {
            Background::Solid(color) => Ok(color),
            Background::Sky { horizon, zenith } => {
                let t = direction.normalize()?.y.max(0.0);
                let mix = |a: f32, b: f32| a + (b - a) * t;
                Ok(Rgba::new(
                    mix(horizon.r, zenith.r),
                    mix(horizon.g, zenith.g),
                    mix(horizon.b, zenith.b),
                    mix(horizon.a, zenith.a),
                ))
            }
        }
    }

    /// Returns the color used for pixels whose ray could not be computed at all.
    pub fn fallback_color(self) -> Rgba {
        match self {
            Background::Solid(color) => color,
            Background::Sky { horizon, .. } => horizon,
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What a ray hit first.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Hit {
    Plane(FreeCoordinate),
    Cylinder(FreeCoordinate),
    Nothing,
}

impl Scene {
    /// The ground plane alone, with the default background.
    pub const PLANE: Self = Self {
        background: Background::DEFAULT,
        cylinder: None,
    };

    /// Computes the color seen along `ray`.
    ///
    /// Fails only if the ray is degenerate (zero or non-finite direction) in a way that
    /// prevents the shading computation.
    pub fn trace(&self, ray: &Ray) -> Result<Rgba, MathError> {
        let Some(cylinder) = self.cylinder else {
            return match ray.intersect_ground_plane() {
                Some(t) => {
                    let point = ray.at(t);
                    Ok(checkerboard(point.x, point.z))
                }
                None => self.background.color(ray.direction),
            };
        };

        // Both intersections must be measured along the same direction to be compared.
        let ray = Ray {
            direction: ray.direction.normalize()?,
            ..*ray
        };
        let hit = match (
            ray.intersect_vertical_cylinder(cylinder.radius),
            ray.intersect_ground_plane(),
        ) {
            // The cylinder stands on the plane; where they meet, the cylinder wins.
            (Some(tc), Some(tp)) if tc <= tp => Hit::Cylinder(tc),
            (Some(tc), None) => Hit::Cylinder(tc),
            (_, Some(tp)) => Hit::Plane(tp),
            (None, None) => Hit::Nothing,
        };
        Ok(match hit {
            Hit::Plane(t) => {
                let point = ray.at(t);
                checkerboard(point.x, point.z)
            }
            Hit::Cylinder(t) => {
                let point = ray.at(t);
                if point.y <= cylinder.cap_height {
                    checkerboard(point.z.atan2(point.x) * cylinder.radius, point.y)
                } else {
                    checkerboard(point.x, point.z)
                }
            }
            Hit::Nothing => self.background.color(ray.direction)?,
        })
    }
}

/// Returns the XOR checkerboard color at surface coordinates (`u`, `v`).
///
/// The coordinates are scaled by [`CHECKER_FREQUENCY`] and floored to integer cells; the
/// cells' bitwise XOR selects the color, with red, green, and blue repeating every 256,
/// 128, and 64 cells. Cell (0, 0) is black.
pub fn checkerboard(u: FreeCoordinate, v: FreeCoordinate) -> Rgba {
    // Float-to-int `as` saturates, so very distant hits stay well-defined.
    let xx = (u * CHECKER_FREQUENCY).floor() as i32;
    let yy = (v * CHECKER_FREQUENCY).floor() as i32;
    let n = xx ^ yy;
    Rgba::new(
        (n & 255) as f32 / 255.0,
        (n & 127) as f32 / 127.0,
        (n & 63) as f32 / 63.0,
        1.0,
    )
}
