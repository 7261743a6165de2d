//! Pixel accessors: decode source pixels to linear premultiplied floats.
//!
//! One accessor per source color type. Integer formats decode through the
//! source's gamma; alpha always decodes linearly. Alpha-only sources are
//! tinted with the paint color.

use std::marker::PhantomData;

use crate::basics::{F32x4, I32x4};
use crate::color::{half_to_f32, Color, OrderBgra, OrderRgba};
use crate::gamma::{decode_u8, decode_unit, GammaType};
use crate::pixmap::{ColorType, Pixmap};
use crate::poly_memory::VariantSet;

// ============================================================================
// PixelAccessor trait
// ============================================================================

/// Random access to decoded source pixels.
///
/// Coordinates must lie inside the source; samplers clamp before calling.
pub trait PixelAccessor {
    /// Width and height in pixels.
    fn dimensions(&self) -> (i32, i32);

    /// Raw bytes of row `y`.
    fn row(&self, y: i32) -> &[u8];

    /// Decode pixel `index` of a row returned by [`PixelAccessor::row`].
    fn get_pixel_from_row(&self, row: &[u8], index: usize) -> F32x4;

    fn get_pixel(&self, x: i32, y: i32) -> F32x4 {
        self.get_pixel_from_row(self.row(y), x as usize)
    }

    /// Pixel at `y * width + x`, independent of the row stride.
    fn get_pixel_at(&self, index: usize) -> F32x4 {
        let width = self.dimensions().0 as usize;
        self.get_pixel_from_row(self.row((index / width) as i32), index % width)
    }

    fn get_4_pixels(&self, xs: I32x4, ys: I32x4) -> [F32x4; 4] {
        let xs = xs.to_array();
        let ys = ys.to_array();
        [0, 1, 2, 3].map(|i| self.get_pixel(xs[i], ys[i]))
    }

    /// The first `n` (at most three) lanes; the rest are zero.
    fn get_few_pixels(&self, n: usize, xs: I32x4, ys: I32x4) -> [F32x4; 3] {
        let xs = xs.to_array();
        let ys = ys.to_array();
        let mut out = [F32x4::splat(0.0); 3];
        for (i, px) in out.iter_mut().enumerate().take(n) {
            *px = self.get_pixel(xs[i], ys[i]);
        }
        out
    }
}

// ============================================================================
// Source formats
// ============================================================================

/// Decoder for one packed pixel layout.
pub trait SourceFormat {
    const COLOR_TYPE: ColorType;

    /// Decode the bytes of one pixel.
    fn decode(px: &[u8], gamma: GammaType) -> F32x4;
}

#[derive(Debug, Clone, Copy)]
pub struct Gray8;

impl SourceFormat for Gray8 {
    const COLOR_TYPE: ColorType = ColorType::Gray8;

    #[inline]
    fn decode(px: &[u8], gamma: GammaType) -> F32x4 {
        let g = decode_u8(px[0], gamma);
        F32x4::new([g, g, g, 1.0])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rgb565;

impl SourceFormat for Rgb565 {
    const COLOR_TYPE: ColorType = ColorType::Rgb565;

    #[inline]
    fn decode(px: &[u8], gamma: GammaType) -> F32x4 {
        let v = u16::from_le_bytes([px[0], px[1]]);
        let r = ((v >> 11) & 0x1f) as f32 / 31.0;
        let g = ((v >> 5) & 0x3f) as f32 / 63.0;
        let b = (v & 0x1f) as f32 / 31.0;
        F32x4::new([
            decode_unit(r, gamma),
            decode_unit(g, gamma),
            decode_unit(b, gamma),
            1.0,
        ])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Argb4444;

impl SourceFormat for Argb4444 {
    const COLOR_TYPE: ColorType = ColorType::Argb4444;

    #[inline]
    fn decode(px: &[u8], gamma: GammaType) -> F32x4 {
        let v = u16::from_le_bytes([px[0], px[1]]);
        let nibble = |shift: u16| ((v >> shift) & 0xf) as f32 / 15.0;
        F32x4::new([
            decode_unit(nibble(12), gamma),
            decode_unit(nibble(8), gamma),
            decode_unit(nibble(4), gamma),
            nibble(0),
        ])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rgba8888;

impl SourceFormat for Rgba8888 {
    const COLOR_TYPE: ColorType = ColorType::Rgba8888;

    #[inline]
    fn decode(px: &[u8], gamma: GammaType) -> F32x4 {
        F32x4::new([
            decode_u8(px[OrderRgba::R], gamma),
            decode_u8(px[OrderRgba::G], gamma),
            decode_u8(px[OrderRgba::B], gamma),
            px[OrderRgba::A] as f32 * (1.0 / 255.0),
        ])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Bgra8888;

impl SourceFormat for Bgra8888 {
    const COLOR_TYPE: ColorType = ColorType::Bgra8888;

    #[inline]
    fn decode(px: &[u8], gamma: GammaType) -> F32x4 {
        F32x4::new([
            decode_u8(px[OrderBgra::R], gamma),
            decode_u8(px[OrderBgra::G], gamma),
            decode_u8(px[OrderBgra::B], gamma),
            px[OrderBgra::A] as f32 * (1.0 / 255.0),
        ])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RgbaF16;

impl SourceFormat for RgbaF16 {
    const COLOR_TYPE: ColorType = ColorType::RgbaF16;

    #[inline]
    fn decode(px: &[u8], _gamma: GammaType) -> F32x4 {
        let h = |i: usize| half_to_f32(u16::from_le_bytes([px[2 * i], px[2 * i + 1]]));
        F32x4::new([h(0), h(1), h(2), h(3)])
    }
}

// ============================================================================
// Accessors
// ============================================================================

/// Accessor for any [`SourceFormat`].
#[derive(Debug)]
pub struct FormatAccessor<'a, F> {
    pixmap: Pixmap<'a>,
    format: PhantomData<F>,
}

impl<'a, F: SourceFormat> FormatAccessor<'a, F> {
    pub fn new(pixmap: Pixmap<'a>) -> Self {
        debug_assert_eq!(pixmap.info().color_type(), F::COLOR_TYPE);
        Self {
            pixmap,
            format: PhantomData,
        }
    }
}

impl<F: SourceFormat> PixelAccessor for FormatAccessor<'_, F> {
    fn dimensions(&self) -> (i32, i32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn row(&self, y: i32) -> &[u8] {
        self.pixmap.row(y)
    }

    #[inline]
    fn get_pixel_from_row(&self, row: &[u8], index: usize) -> F32x4 {
        let bpp = F::COLOR_TYPE.bytes_per_pixel();
        F::decode(&row[index * bpp..(index + 1) * bpp], self.pixmap.info().gamma())
    }
}

/// Alpha-only source scaled by a tint color.
#[derive(Debug)]
pub struct TintedAlphaAccessor<'a> {
    pixmap: Pixmap<'a>,
    tint: F32x4,
}

impl<'a> TintedAlphaAccessor<'a> {
    /// The tint is the paint color with its alpha dropped; paint alpha is
    /// applied later by the blender.
    pub fn new(pixmap: Pixmap<'a>, paint_color: Color) -> Self {
        debug_assert_eq!(pixmap.info().color_type(), ColorType::Alpha8);
        let tint = paint_color.opaque_lanes(pixmap.info().gamma());
        Self { pixmap, tint }
    }
}

impl PixelAccessor for TintedAlphaAccessor<'_> {
    fn dimensions(&self) -> (i32, i32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn row(&self, y: i32) -> &[u8] {
        self.pixmap.row(y)
    }

    #[inline]
    fn get_pixel_from_row(&self, row: &[u8], index: usize) -> F32x4 {
        let a = row[index] as f32 * (1.0 / 255.0);
        self.tint * F32x4::splat(a)
    }
}

// ============================================================================
// Accessor slot
// ============================================================================

/// Everything the accessor slot can hold.
pub enum AccessorVariant<'a> {
    Alpha8(TintedAlphaAccessor<'a>),
    Gray8(FormatAccessor<'a, Gray8>),
    Rgb565(FormatAccessor<'a, Rgb565>),
    Argb4444(FormatAccessor<'a, Argb4444>),
    Rgba8888(FormatAccessor<'a, Rgba8888>),
    Bgra8888(FormatAccessor<'a, Bgra8888>),
    RgbaF16(FormatAccessor<'a, RgbaF16>),
}

impl<'a> VariantSet for AccessorVariant<'a> {
    type Interface = dyn PixelAccessor + 'a;
    const CAPACITY: usize = 64;

    fn interface(&self) -> &Self::Interface {
        match self {
            Self::Alpha8(a) => a,
            Self::Gray8(a) => a,
            Self::Rgb565(a) => a,
            Self::Argb4444(a) => a,
            Self::Rgba8888(a) => a,
            Self::Bgra8888(a) => a,
            Self::RgbaF16(a) => a,
        }
    }
}

impl<'a> From<TintedAlphaAccessor<'a>> for AccessorVariant<'a> {
    fn from(a: TintedAlphaAccessor<'a>) -> Self {
        Self::Alpha8(a)
    }
}

impl<'a> From<FormatAccessor<'a, Gray8>> for AccessorVariant<'a> {
    fn from(a: FormatAccessor<'a, Gray8>) -> Self {
        Self::Gray8(a)
    }
}

impl<'a> From<FormatAccessor<'a, Rgb565>> for AccessorVariant<'a> {
    fn from(a: FormatAccessor<'a, Rgb565>) -> Self {
        Self::Rgb565(a)
    }
}

impl<'a> From<FormatAccessor<'a, Argb4444>> for AccessorVariant<'a> {
    fn from(a: FormatAccessor<'a, Argb4444>) -> Self {
        Self::Argb4444(a)
    }
}

impl<'a> From<FormatAccessor<'a, Rgba8888>> for AccessorVariant<'a> {
    fn from(a: FormatAccessor<'a, Rgba8888>) -> Self {
        Self::Rgba8888(a)
    }
}

impl<'a> From<FormatAccessor<'a, Bgra8888>> for AccessorVariant<'a> {
    fn from(a: FormatAccessor<'a, Bgra8888>) -> Self {
        Self::Bgra8888(a)
    }
}

impl<'a> From<FormatAccessor<'a, RgbaF16>> for AccessorVariant<'a> {
    fn from(a: FormatAccessor<'a, RgbaF16>) -> Self {
        Self::RgbaF16(a)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::f32_to_half;
    use crate::pixmap::{AlphaType, ImageInfo};

    fn info(w: i32, h: i32, ct: ColorType) -> ImageInfo {
        ImageInfo::new_premul(w, h, ct)
    }

    #[test]
    fn test_rgba_and_bgra_agree() {
        let rgba = [255u8, 0, 51, 255];
        let bgra = [51u8, 0, 255, 255];
        let a = FormatAccessor::<Rgba8888>::new(
            Pixmap::new_packed(info(1, 1, ColorType::Rgba8888), &rgba).unwrap(),
        );
        let b = FormatAccessor::<Bgra8888>::new(
            Pixmap::new_packed(info(1, 1, ColorType::Bgra8888), &bgra).unwrap(),
        );
        assert_eq!(a.get_pixel(0, 0).to_array(), b.get_pixel(0, 0).to_array());
        let [r, g, b, alpha] = a.get_pixel(0, 0).to_array();
        assert_eq!((r, g, alpha), (1.0, 0.0, 1.0));
        assert!((b - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_srgb_source_decodes_to_linear() {
        let px = [128u8, 128, 128, 255];
        let i = info(1, 1, ColorType::Rgba8888).with_gamma(GammaType::Srgb);
        let a = FormatAccessor::<Rgba8888>::new(Pixmap::new_packed(i, &px).unwrap());
        let [r, _, _, alpha] = a.get_pixel(0, 0).to_array();
        assert!((r - 0.2158).abs() < 1e-3);
        assert_eq!(alpha, 1.0);
    }

    #[test]
    fn test_565_channels() {
        let v: u16 = 0xf800 | 0x001f;
        let px = v.to_le_bytes();
        let a = FormatAccessor::<Rgb565>::new(
            Pixmap::new_packed(info(1, 1, ColorType::Rgb565), &px).unwrap(),
        );
        assert_eq!(a.get_pixel(0, 0).to_array(), [1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_4444_channels() {
        let v: u16 = 0xf00f;
        let px = v.to_le_bytes();
        let a = FormatAccessor::<Argb4444>::new(
            Pixmap::new_packed(info(1, 1, ColorType::Argb4444), &px).unwrap(),
        );
        assert_eq!(a.get_pixel(0, 0).to_array(), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_gray_and_f16() {
        let gray = [255u8];
        let g = FormatAccessor::<Gray8>::new(
            Pixmap::new_packed(info(1, 1, ColorType::Gray8), &gray).unwrap(),
        );
        assert_eq!(g.get_pixel(0, 0).to_array(), [1.0; 4]);

        let mut f16 = Vec::new();
        for c in [0.5f32, 0.25, 1.0, 1.0] {
            f16.extend_from_slice(&f32_to_half(c).to_le_bytes());
        }
        let f = FormatAccessor::<RgbaF16>::new(
            Pixmap::new_packed(info(1, 1, ColorType::RgbaF16), &f16).unwrap(),
        );
        assert_eq!(f.get_pixel(0, 0).to_array(), [0.5, 0.25, 1.0, 1.0]);
    }

    #[test]
    fn test_alpha8_is_tinted() {
        let px = [0u8, 255];
        let i = ImageInfo::new(2, 1, ColorType::Alpha8, AlphaType::Premul, GammaType::Linear);
        let a = TintedAlphaAccessor::new(
            Pixmap::new_packed(i, &px).unwrap(),
            Color::from_argb(0x80, 255, 0, 0),
        );
        assert_eq!(a.get_pixel(0, 0).to_array(), [0.0; 4]);
        assert_eq!(a.get_pixel(1, 0).to_array(), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_pixel_at_ignores_stride() {
        let px = [1u8, 2, 0, 3, 4, 0];
        let g = FormatAccessor::<Gray8>::new(
            Pixmap::new(info(2, 2, ColorType::Gray8), &px, 3).unwrap(),
        );
        let v = g.get_pixel_at(2).to_array()[0];
        assert_eq!(v, 3.0 * (1.0 / 255.0));
    }

    #[test]
    fn test_four_and_few() {
        let px = [0u8, 85, 170, 255];
        let g = FormatAccessor::<Gray8>::new(
            Pixmap::new_packed(info(4, 1, ColorType::Gray8), &px).unwrap(),
        );
        let four = g.get_4_pixels(I32x4::new([3, 2, 1, 0]), I32x4::splat(0));
        assert_eq!(four[0].to_array()[0], 1.0);
        assert_eq!(four[3].to_array()[0], 0.0);

        let few = g.get_few_pixels(2, I32x4::new([3, 3, 0, 0]), I32x4::splat(0));
        assert_eq!(few[1].to_array()[0], 1.0);
        assert_eq!(few[2].to_array(), [0.0; 4]);
    }

    #[test]
    fn test_variants_fit_slot() {
        use std::mem::size_of;
        assert!(size_of::<TintedAlphaAccessor<'static>>() <= AccessorVariant::CAPACITY);
        assert!(size_of::<FormatAccessor<'static, RgbaF16>>() <= AccessorVariant::CAPACITY);
    }
}
