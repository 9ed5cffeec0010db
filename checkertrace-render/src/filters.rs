//! Post-process effects applied to a finished frame.
//!
//! Each filter reads one [`Image`] and writes another of the same size; they cannot work
//! in place, so callers ping-pong between two buffers.

use crate::Image;

/// Distorts `src` into `dst` by displacing each pixel's source position along a cosine
/// wave in X and a sine wave in Y.
///
/// `phase_x` and `phase_y` shift the waves (animating them over time moves the ripples)
/// and `amplitude` is the maximum displacement in pixels. Pixels whose displaced source
/// falls outside the image become `0` (transparent black).
///
/// Panics if the images differ in size.
pub fn wobble(dst: &mut Image, src: &Image, phase_x: f32, phase_y: f32, amplitude: f32) {
    assert_same_size(dst, src);
    let (w, h) = (src.width(), src.height());
    let src_pixels = src.pixels();
    for_each_row(dst, |y, row| {
        // `as` truncates toward zero.
        let yy = y as i64 + (((y as f32 + phase_y) * 0.143).sin() * amplitude) as i64;
        for (x, pixel) in row.iter_mut().enumerate() {
            let xx = x as i64 + (((x as f32 + phase_x) * 0.123).cos() * amplitude) as i64;
            *pixel = match (usize::try_from(xx), usize::try_from(yy)) {
                (Ok(xx), Ok(yy)) if xx < w && yy < h => src_pixels[yy * w + xx],
                _ => 0,
            };
        }
    });
}

/// Writes into `dst` the average of each pixel of `src` and its left neighbor.
/// The leftmost column is copied unchanged.
///
/// Panics if the images differ in size.
pub fn blur_horizontal(dst: &mut Image, src: &Image) {
    assert_same_size(dst, src);
    let w = src.width();
    let src_pixels = src.pixels();
    for_each_row(dst, |y, row| {
        let src_row = &src_pixels[y * w..][..w];
        if let (Some(first), Some(&src_first)) = (row.first_mut(), src_row.first()) {
            *first = src_first;
        }
        for ((pixel, &left), &here) in row.iter_mut().skip(1).zip(src_row).zip(&src_row[1..]) {
            *pixel = average(left, here);
        }
    });
}

/// Writes into `dst` the average of each pixel of `src` and the pixel below it.
/// The bottom row is copied unchanged.
///
/// Panics if the images differ in size.
pub fn blur_vertical(dst: &mut Image, src: &Image) {
    assert_same_size(dst, src);
    let w = src.width();
    let src_pixels = src.pixels();
    for_each_row(dst, |y, row| {
        let src_row = &src_pixels[y * w..][..w];
        match y.checked_sub(1) {
            None => row.copy_from_slice(src_row),
            Some(below) => {
                let below_row = &src_pixels[below * w..][..w];
                for ((pixel, &here), &below) in row.iter_mut().zip(src_row).zip(below_row) {
                    *pixel = average(here, below);
                }
            }
        }
    });
}

/// Per-channel average of two packed pixels, rounding down.
///
/// Each channel is halved before adding, so the sum cannot carry into the next channel.
#[inline]
fn average(a: u32, b: u32) -> u32 {
    ((a >> 1) & 0x7F7F_7F7F) + ((b >> 1) & 0x7F7F_7F7F)
}

fn assert_same_size(dst: &Image, src: &Image) {
    assert!(
        dst.width() == src.width() && dst.height() == src.height(),
        "filter images differ in size: {}×{} and {}×{}",
        dst.width(),
        dst.height(),
        src.width(),
        src.height()
    );
}

/// Calls `f` with the index and contents of each row of `image`.
#[cfg(feature = "auto-threads")]
fn for_each_row(image: &mut Image, f: impl Fn(usize, &mut [u32]) + Sync) {
    use rayon::iter::{IndexedParallelIterator as _, ParallelIterator as _};
    use rayon::slice::ParallelSliceMut as _;

    let w = image.width().max(1);
    image
        .pixels_mut()
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

/// Calls `f` with the index and contents of each row of `image`.
#[cfg(not(feature = "auto-threads"))]
fn for_each_row(image: &mut Image, f: impl Fn(usize, &mut [u32]) + Sync) {
    let w = image.width().max(1);
    for (y, row) in image.pixels_mut().chunks_exact_mut(w).enumerate() {
        f(y, row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::{Rng as _, SeedableRng as _};

    fn noise(width: usize, height: usize, seed: u64) -> Image {
        let mut rng = rand_xoshiro::Xoshiro256Plus::seed_from_u64(seed);
        let mut image = Image::new(width, height);
        for pixel in image.pixels_mut() {
            *pixel = rng.random();
        }
        image
    }

    #[test]
    fn average_is_per_channel() {
        assert_eq!(average(0xFF00_FF00, 0x0000_0000), 0x7F00_7F00);
        assert_eq!(average(0xFFFF_FFFF, 0xFFFF_FFFF), 0xFEFE_FEFE);
        assert_eq!(average(0x0202_0202, 0x0404_0404), 0x0303_0303);
        // Low bits are dropped rather than carried into the neighboring channel.
        assert_eq!(average(0x0001_0101, 0x0001_0101), 0x0000_0000);
    }

    #[test]
    fn blur_horizontal_values() {
        let mut src = Image::new(3, 2);
        src.pixels_mut()
            .copy_from_slice(&[0x10, 0x20, 0x40, 0x80, 0x80, 0x00]);
        let mut dst = Image::filled(3, 2, 0xFFFF_FFFF);
        blur_horizontal(&mut dst, &src);
        assert_eq!(dst.pixels(), &[0x10, 0x18, 0x30, 0x80, 0x80, 0x40]);
    }

    #[test]
    fn blur_vertical_values() {
        let mut src = Image::new(2, 3);
        src.pixels_mut()
            .copy_from_slice(&[0x10, 0x20, 0x30, 0x40, 0x00, 0x00]);
        let mut dst = Image::filled(2, 3, 0xFFFF_FFFF);
        blur_vertical(&mut dst, &src);
        assert_eq!(dst.pixels(), &[0x10, 0x20, 0x20, 0x30, 0x18, 0x20]);
    }

    #[test]
    fn blur_of_uniform_even_image_is_identity() {
        let src = Image::filled(7, 5, 0x4466_88AA);
        let mut dst = Image::new(7, 5);
        blur_horizontal(&mut dst, &src);
        assert_eq!(dst, src);
        blur_vertical(&mut dst, &src);
        assert_eq!(dst, src);
    }

    #[test]
    fn wobble_zero_amplitude_is_identity() {
        let src = noise(17, 9, 1);
        let mut dst = Image::new(17, 9);
        wobble(&mut dst, &src, 12.0, 3.5, 0.0);
        assert_eq!(dst, src);
    }

    #[test]
    fn wobble_displacement() {
        let src = noise(64, 64, 2);
        let mut dst = Image::new(64, 64);
        let amplitude = 6.0;
        wobble(&mut dst, &src, 30.0, 23.4, amplitude);
        for y in 0..64 {
            for x in 0..64 {
                let dx = (((x as f32 + 30.0) * 0.123).cos() * amplitude) as i64;
                let dy = (((y as f32 + 23.4) * 0.143).sin() * amplitude) as i64;
                let (xx, yy) = (x as i64 + dx, y as i64 + dy);
                let expected = if (0..64).contains(&xx) && (0..64).contains(&yy) {
                    src.get(xx as usize, yy as usize).unwrap()
                } else {
                    0
                };
                assert_eq!(dst.get(x, y), Some(expected), "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn wobble_out_of_range_is_cleared() {
        let src = Image::filled(4, 4, 0xFFFF_FFFF);
        let mut dst = Image::new(4, 4);
        // Most displacements are far larger than the image.
        wobble(&mut dst, &src, 0.0, 0.0, 1000.0);
        assert!(dst.pixels().iter().any(|&p| p == 0));
    }

    #[test]
    #[should_panic(expected = "filter images differ in size")]
    fn size_mismatch() {
        blur_horizontal(&mut Image::new(2, 2), &Image::new(2, 3));
    }

    #[test]
    fn empty_images() {
        let mut dst = Image::new(0, 0);
        let src = Image::new(0, 0);
        wobble(&mut dst, &src, 0.0, 0.0, 6.0);
        blur_horizontal(&mut dst, &src);
        blur_vertical(&mut dst, &src);
    }
}
