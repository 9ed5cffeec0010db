use core::ops::Range;

use crate::math::Rgba;

/// A framebuffer of packed 8-bit RGBA pixels.
///
/// Pixels are stored row by row, and **row 0 is the bottom row** of the picture, matching
/// the orientation of OpenGL normalized device coordinates. Each pixel is a `u32` in the
/// format produced by [`Rgba::to_packed`].
///
/// Every accessor is bounds-checked; out-of-range writes are refused rather than wrapping
/// into a neighboring row.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Image {
    width: usize,
    height: usize,
    data: Vec<u32>,
}

impl Image {
    /// Creates an image whose pixels are all transparent black (packed value 0).
    ///
    /// Panics if `width * height` overflows.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    /// Creates an image whose pixels all have the packed value `pixel`.
    ///
    /// Panics if `width * height` overflows.
    pub fn filled(width: usize, height: usize, pixel: u32) -> Self {
        let len = width
            .checked_mul(height)
            .unwrap_or_else(|| panic!("image size {width}×{height} overflows"));
        Self {
            width,
            height,
            data: vec![pixel; len],
        }
    }

    /// Creates an image from a buffer of 8-bit RGBA components, four bytes per pixel,
    /// bottom row first.
    ///
    /// This is the form in which decoded image files are accepted.
    pub fn from_rgba8(width: usize, height: usize, bytes: &[u8]) -> Result<Self, ImageError> {
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or(ImageError::TooLarge { width, height })?;
        if bytes.len() != expected {
            return Err(ImageError::SizeMismatch {
                width,
                height,
                len: bytes.len(),
            });
        }
        let data = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// All pixels, row by row from the bottom.
    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.data
    }

    /// All pixels, row by row from the bottom.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.data
    }

    /// Iterates over rows from the bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        // `max(1)` avoids `chunks_exact(0)`'s panic; a zero-width image has no pixels anyway.
        self.data.chunks_exact(self.width.max(1))
    }

    /// Returns the pixels of the rows in `rows`, which must be within the image.
    ///
    /// Panics if the range extends past the top of the image.
    pub fn row_range_mut(&mut self, rows: Range<usize>) -> &mut [u32] {
        assert!(
            rows.start <= rows.end && rows.end <= self.height,
            "rows {rows:?} out of range for height {}",
            self.height
        );
        &mut self.data[rows.start * self.width..rows.end * self.width]
    }

    /// Returns the packed pixel at (`x`, `y`), or [`None`] if out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        self.index(x, y).map(|i| self.data[i])
    }

    /// Returns the color at (`x`, `y`), or [`None`] if out of bounds.
    #[inline]
    pub fn get_rgba(&self, x: usize, y: usize) -> Option<Rgba> {
        self.get(x, y).map(Rgba::from_packed)
    }

    /// Writes `color` at (`x`, `y`) if it is within bounds.
    ///
    /// Returns whether the pixel was written.
    #[inline]
    pub fn put(&mut self, x: usize, y: usize, color: Rgba) -> bool {
        self.put_packed(x, y, color.to_packed())
    }

    /// Writes the packed pixel at (`x`, `y`) if it is within bounds.
    ///
    /// Returns whether the pixel was written.
    #[inline]
    pub fn put_packed(&mut self, x: usize, y: usize, pixel: u32) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.data[i] = pixel;
                true
            }
            None => false,
        }
    }

    /// Like [`Self::put()`], but accepts signed coordinates, so that callers computing
    /// positions relative to a projected point need not check for negatives first.
    #[inline]
    pub fn put_signed(&mut self, x: i64, y: i64, color: Rgba) -> bool {
        match (usize::try_from(x), usize::try_from(y)) {
            (Ok(x), Ok(y)) => self.put(x, y, color),
            _ => false,
        }
    }

    /// Sets every pixel to the packed value `pixel`.
    pub fn fill(&mut self, pixel: u32) {
        self.data.fill(pixel);
    }

    /// Changes the dimensions of this image. Existing contents are discarded and all
    /// pixels become transparent black.
    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    /// Returns a copy scaled to `width` × `height` by nearest-neighbour sampling, the
    /// way a pixel zoom would draw it.
    #[must_use]
    pub fn scaled_nearest(&self, width: usize, height: usize) -> Self {
        let mut out = Self::new(width, height);
        if out.data.is_empty() || self.data.is_empty() {
            return out;
        }
        for (y, out_row) in out.data.chunks_exact_mut(width).enumerate() {
            let src_y = y * self.height / height;
            let src_row = &self.data[src_y * self.width..][..self.width];
            for (x, pixel) in out_row.iter_mut().enumerate() {
                *pixel = src_row[x * self.width / width];
            }
        }
        out
    }

    /// Returns the pixels as 8-bit RGBA components with the **top** row first, as image
    /// file formats expect.
    pub fn to_rgba8_top_down(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.data.len() * 4);
        for row in self.rows().collect::<Vec<_>>().into_iter().rev() {
            for pixel in row {
                bytes.extend_from_slice(&pixel.to_le_bytes());
            }
        }
        bytes
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }
}

/// Error from [`Image::from_rgba8`].
#[derive(Clone, Debug, Eq, PartialEq, displaydoc::Display)]
#[non_exhaustive]
pub enum ImageError {
    /// pixel buffer of {len} bytes does not match {width}×{height} RGBA image
    SizeMismatch {
        #[allow(missing_docs)]
        width: usize,
        #[allow(missing_docs)]
        height: usize,
        /// Length of the provided buffer in bytes.
        len: usize,
    },

    /// image size {width}×{height} is too large
    TooLarge {
        #[allow(missing_docs)]
        width: usize,
        #[allow(missing_docs)]
        height: usize,
    },
}

impl std::error::Error for ImageError {}
