//! Drawing point clouds over a rendered image.

use crate::Image;
use crate::camera::{CameraMatrices, Viewport};
use crate::math::{FreeCoordinate, Rgba, Vector2f, Vector3f, halton, point_on_sphere};

/// A point cloud with a fixed maximum number of points, each drawn as a 2×2 pixel splat.
///
/// Points are only ever appended; [`PlotPixels::clear()`] empties the cloud for
/// rebuilding.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotPixels {
    points: Vec<(Vector3f, Rgba)>,
    capacity: usize,
}

impl PlotPixels {
    /// Creates an empty point cloud which can hold up to `capacity` points.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Creates a cloud of `count` white points spread evenly over the surface of a sphere.
    pub fn generate_sphere(center: Vector3f, radius: FreeCoordinate, count: usize) -> Self {
        let mut plot = Self::with_capacity(count);
        for i in 0..count {
            let u = (i as f64 + 0.5) / count as f64;
            let v = halton(2, u32::try_from(i + 1).unwrap_or(u32::MAX));
            let point = center + point_on_sphere(u as FreeCoordinate, v as FreeCoordinate) * radius;
            plot.points.push((point, Rgba::WHITE));
        }
        plot
    }

    /// Creates a cloud with one point per pixel of `image`, laid out on a rectangle in the
    /// XY plane with its lower left corner at `origin` and size `size_x` × `size_y`.
    pub fn plot_image(
        origin: Vector3f,
        image: &Image,
        size_x: FreeCoordinate,
        size_y: FreeCoordinate,
    ) -> Self {
        let (w, h) = (image.width(), image.height());
        let mut plot = Self::with_capacity(w * h);
        for (y, row) in image.rows().enumerate() {
            for (x, &pixel) in row.iter().enumerate() {
                let offset = Vector3f::new(
                    size_x * x as FreeCoordinate / w as FreeCoordinate,
                    size_y * y as FreeCoordinate / h as FreeCoordinate,
                    0.0,
                );
                plot.points.push((origin + offset, Rgba::from_packed(pixel)));
            }
        }
        plot
    }

    /// Appends a point.
    ///
    /// Fails without modifying the cloud if it is already full.
    pub fn push(&mut self, position: Vector3f, color: Rgba) -> Result<(), CapacityError> {
        if self.points.len() >= self.capacity {
            return Err(CapacityError {
                capacity: self.capacity,
            });
        }
        self.points.push((position, color));
        Ok(())
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Maximum number of points.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Removes all points, keeping the capacity.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Iterates over the points in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Vector3f, Rgba)> + '_ {
        self.points.iter().copied()
    }

    /// Draws every point into `image` as seen through `matrices`.
    ///
    /// Each point is projected to a pixel `(px, py)` and the 2×2 block of pixels from
    /// `(px - 1, py - 1)` to `(px, py)` is set to its color. Each of the four pixels is
    /// written only if it lies within the image. Points that cannot be projected, such as
    /// those behind the camera, are skipped.
    pub fn splat(&self, image: &mut Image, matrices: &CameraMatrices) -> SplatInfo {
        let viewport = Viewport::new(image.width(), image.height());
        let mut info = SplatInfo {
            points: self.points.len(),
            ..SplatInfo::default()
        };
        for &(position, color) in &self.points {
            let ndc = match matrices.project_to_ndc(position) {
                Ok(ndc) if ndc.x.is_finite() && ndc.y.is_finite() => ndc,
                _ => {
                    info.points_skipped += 1;
                    continue;
                }
            };
            let fb = viewport.ndc_to_fb(Vector2f::new(ndc.x, ndc.y));
            // `as` saturates, so far off-screen points stay far off-screen.
            let px = fb.x.floor() as i64;
            let py = fb.y.floor() as i64;
            for y in [py.saturating_sub(1), py] {
                for x in [px.saturating_sub(1), px] {
                    if image.put_signed(x, y, color) {
                        info.pixels_written += 1;
                    }
                }
            }
        }
        info
    }
}

/// Counts from [`PlotPixels::splat()`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct SplatInfo {
    /// Number of points in the cloud.
    pub points: usize,
    /// Number of pixels written; up to four per point.
    pub pixels_written: usize,
    /// Number of points that could not be projected.
    pub points_skipped: usize,
}

/// Error from [`PlotPixels::push()`] when the cloud is full.
#[derive(Clone, Copy, Debug, Eq, PartialEq, displaydoc::Display)]
#[displaydoc("point cloud is full ({capacity} points)")]
pub struct CapacityError {
    capacity: usize,
}

impl std::error::Error for CapacityError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::math::Vector3;
    use pretty_assertions::assert_eq;

    const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);

    /// Camera on the +Z axis looking at the origin, with a 90° field of view, so that the
    /// plane `z = 0` spans NDC −1..1 over −4..4 in X and Y.
    fn matrices(size: usize) -> CameraMatrices {
        let mut camera = Camera::looking_at(Vector3::new(0.0, 0.0, 4.0), Vector3::zero());
        camera.set_aspect_ratio(Viewport::new(size, size).aspect_ratio());
        camera.update().unwrap();
        camera.matrices().unwrap()
    }

    fn written(image: &Image) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for y in 0..image.height() {
            for x in 0..image.width() {
                if image.get(x, y) != Some(0) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn push_respects_capacity() {
        let mut plot = PlotPixels::with_capacity(2);
        plot.push(Vector3::zero(), RED).unwrap();
        plot.push(Vector3::zero(), RED).unwrap();
        assert_eq!(
            plot.push(Vector3::zero(), Rgba::WHITE),
            Err(CapacityError { capacity: 2 })
        );
        assert_eq!(plot.len(), 2);
        assert!(plot.iter().all(|(_, color)| color == RED));

        plot.clear();
        assert!(plot.is_empty());
        assert_eq!(plot.capacity(), 2);
        assert_eq!(
            CapacityError { capacity: 2 }.to_string(),
            "point cloud is full (2 points)"
        );
    }

    #[test]
    fn splat_center_point() {
        let mut plot = PlotPixels::with_capacity(1);
        plot.push(Vector3::zero(), RED).unwrap();
        let mut image = Image::new(8, 8);
        let info = plot.splat(&mut image, &matrices(8));

        assert_eq!(
            info,
            SplatInfo {
                points: 1,
                pixels_written: 4,
                points_skipped: 0
            }
        );
        assert_eq!(written(&image), vec![(3, 3), (4, 3), (3, 4), (4, 4)]);
        assert_eq!(image.get_rgba(3, 3), Some(RED));
    }

    #[test]
    fn splat_clips_each_corner() {
        // The point (-3.5, -3.5) is at the center of pixel (0, 0).
        let mut plot = PlotPixels::with_capacity(1);
        plot.push(Vector3::new(-3.5, -3.5, 0.0), RED).unwrap();
        let mut image = Image::new(8, 8);
        let info = plot.splat(&mut image, &matrices(8));

        assert_eq!(info.pixels_written, 1);
        assert_eq!(written(&image), vec![(0, 0)]);
    }

    #[test]
    fn splat_skips_points_behind_camera() {
        let mut plot = PlotPixels::with_capacity(2);
        plot.push(Vector3::new(0.0, 0.0, 10.0), RED).unwrap();
        plot.push(Vector3::new(0.0, 0.0, 4.0), RED).unwrap();
        let mut image = Image::new(8, 8);
        let info = plot.splat(&mut image, &matrices(8));

        assert_eq!(info.points_skipped, 2);
        assert_eq!(info.pixels_written, 0);
        assert!(written(&image).is_empty());
    }

    #[test]
    fn splat_far_off_screen() {
        let mut plot = PlotPixels::with_capacity(1);
        plot.push(Vector3::new(1e30, 0.0, 0.0), RED).unwrap();
        let mut image = Image::new(8, 8);
        let info = plot.splat(&mut image, &matrices(8));
        assert_eq!(info.pixels_written, 0);
    }

    #[test]
    fn sphere_points_lie_on_sphere() {
        let center = Vector3::new(1.0, 2.0, 3.0);
        let plot = PlotPixels::generate_sphere(center, 2.0, 100);
        assert_eq!(plot.len(), 100);
        assert_eq!(plot.capacity(), 100);
        for (point, color) in plot.iter() {
            assert!(((point - center).length() - 2.0).abs() < 1e-4, "{point:?}");
            assert_eq!(color, Rgba::WHITE);
        }
    }

    #[test]
    fn image_points_take_pixel_colors() {
        let mut source = Image::new(2, 2);
        source.put(1, 0, RED);
        let plot = PlotPixels::plot_image(Vector3::new(0.0, 0.0, -1.0), &source, 4.0, 2.0);
        let points: Vec<_> = plot.iter().collect();
        assert_eq!(points.len(), 4);
        assert_eq!(points[1], (Vector3::new(2.0, 0.0, -1.0), RED));
        assert_eq!(points[2].0, Vector3::new(0.0, 1.0, -1.0));
    }
}
