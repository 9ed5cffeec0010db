//! Color data types. This module is private but reexported by its parent.

use core::fmt;

/// A floating-point RGBA color value.
///
/// Components have a nominal range of 0 to 1; values outside that range are preserved
/// until the color is quantized by [`Rgba::to_rgba8`], which clamps them.
#[expect(clippy::exhaustive_structs)]
#[derive(Clone, Copy, Default, PartialEq)]
pub struct Rgba {
    #[allow(missing_docs)]
    pub r: f32,
    #[allow(missing_docs)]
    pub g: f32,
    #[allow(missing_docs)]
    pub b: f32,
    #[allow(missing_docs)]
    pub a: f32,
}

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Fully transparent black; the packed value is zero.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    #[allow(missing_docs)]
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Converts to 8-bit components.
    ///
    /// Each channel maps to `floor(c * 256)` clamped to `0..=255`, so that the full
    /// 0.0–1.0 range is divided into 256 equal-width buckets. NaN maps to 0.
    #[inline]
    pub fn to_rgba8(self) -> [u8; 4] {
        #[inline(always)]
        fn quantize(c: f32) -> u8 {
            // Float-to-int `as` saturates, and maps NaN to 0.
            (c * 256.0).clamp(0.0, 255.0) as u8
        }
        [
            quantize(self.r),
            quantize(self.g),
            quantize(self.b),
            quantize(self.a),
        ]
    }

    /// Converts 8-bit components back to floating-point, dividing by 255.
    #[inline]
    pub fn from_rgba8([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }

    /// Quantizes and packs into the framebuffer pixel format: red in the low byte, then
    /// green, blue, and alpha in the high byte.
    #[inline]
    pub fn to_packed(self) -> u32 {
        u32::from_le_bytes(self.to_rgba8())
    }

    /// Unpacks a framebuffer pixel (inverse of [`Self::to_packed`], up to quantization).
    #[inline]
    pub fn from_packed(pixel: u32) -> Self {
        Self::from_rgba8(pixel.to_le_bytes())
    }
}

impl fmt::Debug for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { r, g, b, a } = *self;
        write!(f, "Rgba({r:?}, {g:?}, {b:?}, {a:?})")
    }
}
