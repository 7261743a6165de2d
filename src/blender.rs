//! Blend stage: the last step before memory.
//!
//! `ShadeBlender` writes unblended `Pm4f` results for shading.
//! `BlitBlender` reads the destination pixel, composites in linear float
//! and encodes back into the destination format.

use crate::basics::F32x4;
use crate::blend_mode::BlendMode;
use crate::color::{f32_to_half, half_to_f32, premultiply, OrderBgra, OrderRgba, Pm4f};
use crate::error::{PipelineError, PipelineResult};
use crate::gamma::{decode_u8, encode_u8, GammaType};
use crate::pixmap::{AlphaType, ColorType, ImageInfo};
use crate::poly_memory::variant_set;
use crate::processor::{BlendStrategy, DstCursor};

// ============================================================================
// Destination codecs
// ============================================================================

/// Decode one destination pixel of a blittable format.
pub fn load_pixel(format: ColorType, gamma: GammaType, px: &[u8]) -> F32x4 {
    match format {
        ColorType::Rgba8888 => F32x4::new([
            decode_u8(px[OrderRgba::R], gamma),
            decode_u8(px[OrderRgba::G], gamma),
            decode_u8(px[OrderRgba::B], gamma),
            px[OrderRgba::A] as f32 * (1.0 / 255.0),
        ]),
        ColorType::Bgra8888 => F32x4::new([
            decode_u8(px[OrderBgra::R], gamma),
            decode_u8(px[OrderBgra::G], gamma),
            decode_u8(px[OrderBgra::B], gamma),
            px[OrderBgra::A] as f32 * (1.0 / 255.0),
        ]),
        ColorType::RgbaF16 => {
            let h = |i: usize| half_to_f32(u16::from_le_bytes([px[2 * i], px[2 * i + 1]]));
            F32x4::new([h(0), h(1), h(2), h(3)])
        }
        _ => F32x4::splat(0.0),
    }
}

/// Encode one pixel into a blittable format.
pub fn store_pixel(format: ColorType, gamma: GammaType, pixel: F32x4, px: &mut [u8]) {
    let [r, g, b, a] = pixel.to_array();
    match format {
        ColorType::Rgba8888 => {
            px[OrderRgba::R] = encode_u8(r, gamma);
            px[OrderRgba::G] = encode_u8(g, gamma);
            px[OrderRgba::B] = encode_u8(b, gamma);
            px[OrderRgba::A] = encode_u8(a, GammaType::Linear);
        }
        ColorType::Bgra8888 => {
            px[OrderBgra::R] = encode_u8(r, gamma);
            px[OrderBgra::G] = encode_u8(g, gamma);
            px[OrderBgra::B] = encode_u8(b, gamma);
            px[OrderBgra::A] = encode_u8(a, GammaType::Linear);
        }
        ColorType::RgbaF16 => {
            for (i, c) in [r, g, b, a].into_iter().enumerate() {
                px[2 * i..2 * i + 2].copy_from_slice(&f32_to_half(c).to_le_bytes());
            }
        }
        _ => {}
    }
}

// ============================================================================
// Shade blender
// ============================================================================

/// Writes `Pm4f` values scaled by the paint alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadeBlender {
    post_alpha: f32,
    premultiply: bool,
}

impl ShadeBlender {
    /// `premultiply` is set for unpremultiplied sources.
    pub fn new(post_alpha: f32, premultiply: bool) -> Self {
        Self {
            post_alpha,
            premultiply,
        }
    }
}

impl BlendStrategy for ShadeBlender {
    #[inline]
    fn blend_pixel(&self, pixel: F32x4, dst: &mut DstCursor<'_>) {
        let pixel = if self.premultiply {
            premultiply(pixel)
        } else {
            pixel
        };
        let out = Pm4f::from_lanes(pixel * F32x4::splat(self.post_alpha));
        dst.next_pixel(std::mem::size_of::<Pm4f>())
            .copy_from_slice(bytemuck::bytes_of(&out));
    }
}

// ============================================================================
// Blit blender
// ============================================================================

/// Composites into a packed destination with one blend mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlitBlender {
    mode: BlendMode,
    format: ColorType,
    gamma: GammaType,
    premultiply: bool,
    final_alpha: f32,
}

impl BlitBlender {
    /// Pick the blender for `dst`, or fail if the pair is unsupported.
    ///
    /// Destinations must hold premultiplied (or opaque) pixels; the
    /// destination codecs neither unpremultiply on load nor on store.
    pub fn select(
        mode: BlendMode,
        dst: &ImageInfo,
        src_alpha: AlphaType,
        final_alpha: f32,
    ) -> PipelineResult<Self> {
        let format = dst.color_type();
        let format_ok = matches!(
            format,
            ColorType::Rgba8888 | ColorType::Bgra8888 | ColorType::RgbaF16
        );
        let alpha_ok = dst.alpha_type() != AlphaType::Unpremul;
        if !format_ok || !alpha_ok || !mode.is_blittable() {
            return Err(PipelineError::UnsupportedBlit {
                color_type: format,
                blend_mode: mode,
            });
        }
        Ok(Self {
            mode,
            format,
            gamma: dst.gamma(),
            premultiply: src_alpha == AlphaType::Unpremul,
            final_alpha,
        })
    }

    pub fn mode(&self) -> BlendMode {
        self.mode
    }
}

impl BlendStrategy for BlitBlender {
    #[inline]
    fn blend_pixel(&self, pixel: F32x4, dst: &mut DstCursor<'_>) {
        let src = if self.premultiply {
            premultiply(pixel)
        } else {
            pixel
        };
        let src = src * F32x4::splat(self.final_alpha);
        let px = dst.next_pixel(self.format.bytes_per_pixel());
        let d = load_pixel(self.format, self.gamma, px);
        let out = self.mode.apply(src, d).unwrap_or(d);
        store_pixel(self.format, self.gamma, out, px);
    }
}

// ============================================================================
// Blend slot
// ============================================================================

variant_set! {
    /// Everything the blend slot can hold.
    pub enum BlendVariant: dyn BlendStrategy, capacity = 48;
    Shade(ShadeBlender),
    Blit(BlitBlender),
}

// ============================================================================
// Tests
// ============================================================================
