use core::iter::Sum;
use core::ops::{AddAssign, Range};

use crate::Image;
use crate::camera::{CameraMatrices, Viewport};
use crate::math::{MathError, Rgba};
use crate::raytracer::Scene;

/// A rectangle of pixels within an image.
#[expect(clippy::exhaustive_structs)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Region {
    /// Leftmost column.
    pub x: usize,
    /// Bottom row.
    pub y: usize,
    #[allow(missing_docs)]
    pub width: usize,
    #[allow(missing_docs)]
    pub height: usize,
}

impl Region {
    /// The region covering all of an image of the given size.
    #[inline]
    pub fn whole(viewport: Viewport) -> Self {
        Self {
            x: 0,
            y: 0,
            width: viewport.width,
            height: viewport.height,
        }
    }

    /// Number of pixels in the region.
    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// The rows the region covers.
    #[inline]
    pub fn rows(&self) -> Range<usize> {
        self.y..self.y + self.height
    }

    /// The columns the region covers.
    #[inline]
    pub fn columns(&self) -> Range<usize> {
        self.x..self.x + self.width
    }
}

/// Performance and quality information about tracing some pixels.
///
/// Information from multiple regions may be combined with `+=` or [`Sum`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub struct RegionInfo {
    /// Number of pixels written.
    pub pixels: usize,
    /// Number of pixels whose ray could not be computed and which were given the
    /// background color instead.
    pub fallback_pixels: usize,
}

impl AddAssign for RegionInfo {
    fn add_assign(&mut self, other: Self) {
        self.pixels += other.pixels;
        self.fallback_pixels += other.fallback_pixels;
    }
}

impl Sum for RegionInfo {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let mut sum = Self::default();
        for part in iter {
            sum += part;
        }
        sum
    }
}

/// Computes the color of pixel (`x`, `y`) of an image of size `viewport`, by casting a ray
/// through the pixel's center.
pub fn trace_pixel(
    scene: &Scene,
    matrices: &CameraMatrices,
    viewport: Viewport,
    x: usize,
    y: usize,
) -> Result<Rgba, MathError> {
    let ray =
        matrices.project_ndc_into_world(viewport.normalize_fb_x(x), viewport.normalize_fb_y(y))?;
    scene.trace(&ray)
}

/// Traces every pixel of `region` of an image of size `viewport`, writing packed pixels
/// into `output` row by row.
///
/// A pixel which cannot be traced gets the background's fallback color and is counted
/// in [`RegionInfo::fallback_pixels`]; one bad ray never aborts the region.
///
/// Panics if `output`'s length does not match the area of `region`.
pub fn trace_region(
    output: &mut [u32],
    region: Region,
    viewport: Viewport,
    matrices: &CameraMatrices,
    scene: &Scene,
) -> RegionInfo {
    assert_eq!(
        output.len(),
        region.area(),
        "output buffer does not match region {region:?}"
    );
    let mut info = RegionInfo::default();
    // x.max(1) is zero-sized-region protection; there will be zero chunks anyway.
    for (y, row) in region
        .rows()
        .zip(output.chunks_exact_mut(region.width.max(1)))
    {
        for (x, pixel) in region.columns().zip(row.iter_mut()) {
            *pixel = trace_pixel_or_fallback(scene, matrices, viewport, x, y, &mut info);
        }
    }
    info
}

/// Traces a full image on the current thread (or, with the `auto-threads` feature, on
/// [`rayon`]’s thread pool), without the job scheduler.
///
/// This is the reference against which the scheduler's output is compared.
pub fn trace_image(image: &mut Image, matrices: &CameraMatrices, scene: &Scene) -> RegionInfo {
    trace_image_impl(image, matrices, scene)
}

#[inline]
fn trace_pixel_or_fallback(
    scene: &Scene,
    matrices: &CameraMatrices,
    viewport: Viewport,
    x: usize,
    y: usize,
    info: &mut RegionInfo,
) -> u32 {
    info.pixels += 1;
    match trace_pixel(scene, matrices, viewport, x, y) {
        Ok(color) => color.to_packed(),
        Err(error) => {
            log::trace!("pixel ({x}, {y}) fell back to background: {error}");
            info.fallback_pixels += 1;
            scene.background.fallback_color().to_packed()
        }
    }
}

#[cfg(feature = "auto-threads")]
fn trace_image_impl(image: &mut Image, matrices: &CameraMatrices, scene: &Scene) -> RegionInfo {
    use rayon::iter::{IndexedParallelIterator as _, ParallelIterator as _};
    use rayon::slice::ParallelSliceMut as _;

    let viewport = Viewport::new(image.width(), image.height());
    image
        .pixels_mut()
        .par_chunks_mut(viewport.width.max(1))
        .enumerate()
        .map(|(y, row)| {
            let mut info = RegionInfo::default();
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = trace_pixel_or_fallback(scene, matrices, viewport, x, y, &mut info);
            }
            info
        })
        .sum()
}

#[cfg(not(feature = "auto-threads"))]
fn trace_image_impl(image: &mut Image, matrices: &CameraMatrices, scene: &Scene) -> RegionInfo {
    let viewport = Viewport::new(image.width(), image.height());
    trace_region(
        image.pixels_mut(),
        Region::whole(viewport),
        viewport,
        matrices,
        scene,
    )
}
