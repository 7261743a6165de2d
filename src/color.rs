//! Color types shared by the pipeline.
//!
//! - `Color`: packed 8-bit unpremultiplied ARGB, the paint color
//! - `Pm4f`: premultiplied linear RGBA in f32, the shading output
//!
//! Also the byte orders of the 8888 formats and half-float conversion used
//! by the F16 format.

use bytemuck::{Pod, Zeroable};

use crate::basics::F32x4;
use crate::gamma::{decode_u8, GammaType};

// ============================================================================
// Component orders
// ============================================================================

/// RGBA component order: R=0, G=1, B=2, A=3
pub struct OrderRgba;
impl OrderRgba {
    pub const R: usize = 0;
    pub const G: usize = 1;
    pub const B: usize = 2;
    pub const A: usize = 3;
}

/// BGRA component order: B=0, G=1, R=2, A=3
pub struct OrderBgra;
impl OrderBgra {
    pub const B: usize = 0;
    pub const G: usize = 1;
    pub const R: usize = 2;
    pub const A: usize = 3;
}

// ============================================================================
// Color
// ============================================================================

/// Packed unpremultiplied color, `0xAARRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub u32);

impl Color {
    pub const TRANSPARENT: Color = Color(0x0000_0000);
    pub const BLACK: Color = Color(0xFF00_0000);
    pub const WHITE: Color = Color(0xFFFF_FFFF);

    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Alpha as a 0..1 float.
    pub fn alpha_f(self) -> f32 {
        self.alpha() as f32 * (1.0 / 255.0)
    }

    /// The color channels decoded to linear with alpha forced to one.
    pub fn opaque_lanes(self, gamma: GammaType) -> F32x4 {
        F32x4::new([
            decode_u8(self.red(), gamma),
            decode_u8(self.green(), gamma),
            decode_u8(self.blue(), gamma),
            1.0,
        ])
    }
}

// ============================================================================
// Pm4f
// ============================================================================

/// A premultiplied linear color with f32 channels.
///
/// Layout is four consecutive floats, so a `[Pm4f]` can be viewed as bytes
/// and written by the same path that writes packed destinations.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Pm4f {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Pm4f {
    pub const TRANSPARENT: Pm4f = Pm4f::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_lanes(v: F32x4) -> Self {
        let [r, g, b, a] = v.to_array();
        Self { r, g, b, a }
    }

    pub fn to_lanes(self) -> F32x4 {
        F32x4::new([self.r, self.g, self.b, self.a])
    }
}

/// Multiply the color lanes by the alpha lane.
#[inline]
pub fn premultiply(px: F32x4) -> F32x4 {
    let a = px.to_array()[3];
    px * F32x4::new([a, a, a, 1.0])
}

// ============================================================================
// Half floats
// ============================================================================

/// Widen an IEEE binary16 value.
pub fn half_to_f32(h: u16) -> f32 {
    let sign = ((h >> 15) & 1) as u32;
    let exp = ((h >> 10) & 0x1f) as u32;
    let mant = (h & 0x3ff) as u32;
    let bits = if exp == 0 {
        if mant == 0 {
            sign << 31
        } else {
            // Subnormal: mant * 2^-24.
            let v = mant as f32 * (1.0 / 16_777_216.0);
            return if sign == 1 { -v } else { v };
        }
    } else if exp == 0x1f {
        (sign << 31) | 0x7f80_0000 | (mant << 13)
    } else {
        (sign << 31) | ((exp + 112) << 23) | (mant << 13)
    };
    f32::from_bits(bits)
}

/// Narrow to IEEE binary16, rounding to nearest even.
pub fn f32_to_half(v: f32) -> u16 {
    let bits = v.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32;
    let mant = bits & 0x7f_ffff;

    if exp == 0xff {
        return sign | 0x7c00 | if mant != 0 { 0x200 } else { 0 };
    }
    let e = exp - 127 + 15;
    if e >= 0x1f {
        return sign | 0x7c00;
    }
    if e <= 0 {
        if e < -10 {
            return sign;
        }
        let m = mant | 0x80_0000;
        let shift = (14 - e) as u32;
        let round = (m >> (shift - 1)) & 1;
        return sign | ((m >> shift) + round) as u16;
    }

    let half = (sign as u32) | ((e as u32) << 10) | (mant >> 13);
    let round_bit = (mant >> 12) & 1;
    let sticky = mant & 0xfff;
    // A carry out of the mantissa bumps the exponent, which is still correct.
    if round_bit == 1 && (sticky != 0 || (half & 1) == 1) {
        (half + 1) as u16
    } else {
        half as u16
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_channels() {
        let c = Color::from_argb(0x80, 0x10, 0x20, 0x30);
        assert_eq!(c.0, 0x8010_2030);
        assert_eq!(c.alpha(), 0x80);
        assert_eq!(c.red(), 0x10);
        assert_eq!(c.green(), 0x20);
        assert_eq!(c.blue(), 0x30);
    }

    #[test]
    fn test_opaque_lanes_ignore_alpha() {
        let c = Color::from_argb(0, 255, 0, 255);
        assert_eq!(c.opaque_lanes(GammaType::Linear).to_array(), [1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_premultiply() {
        let px = premultiply(F32x4::new([1.0, 0.5, 0.25, 0.5]));
        assert_eq!(px.to_array(), [0.5, 0.25, 0.125, 0.5]);
    }

    #[test]
    fn test_pm4f_is_four_floats() {
        assert_eq!(std::mem::size_of::<Pm4f>(), 16);
        let px = [Pm4f::new(1.0, 2.0, 3.0, 4.0)];
        let floats: &[f32] = bytemuck::cast_slice(&px);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_half_known_values() {
        assert_eq!(f32_to_half(1.0), 0x3c00);
        assert_eq!(f32_to_half(0.5), 0x3800);
        assert_eq!(f32_to_half(0.0), 0x0000);
        assert_eq!(f32_to_half(-2.0), 0xc000);
        assert_eq!(half_to_f32(0x3c00), 1.0);
        assert_eq!(half_to_f32(0x3555), 0.333_496_093_75);
    }

    #[test]
    fn test_half_round_trip_unit_range() {
        for h in 0..=0x3c00u16 {
            assert_eq!(f32_to_half(half_to_f32(h)), h);
        }
    }

    #[test]
    fn test_half_overflow_to_infinity() {
        assert_eq!(f32_to_half(1.0e6), 0x7c00);
        assert!(half_to_f32(0x7c00).is_infinite());
    }
}
