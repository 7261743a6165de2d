//! Gamma encodings and the lookup table used to decode 8-bit sRGB.
//!
//! Every stored channel is either linear or sRGB encoded. Decoding happens
//! once in the pixel accessor, encoding once in the blit blender; everything
//! between runs in linear float.

use std::sync::OnceLock;

// ============================================================================
// Gamma type
// ============================================================================

/// How a bitmap's color channels are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GammaType {
    /// Values are already linear.
    #[default]
    Linear,
    /// Values use the sRGB transfer curve.
    Srgb,
}

// ============================================================================
// sRGB transfer functions
// ============================================================================

/// Convert sRGB value (0..1) to linear.
#[inline]
pub fn srgb_to_linear(x: f64) -> f64 {
    if x <= 0.04045 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert linear value (0..1) to sRGB.
#[inline]
pub fn linear_to_srgb(x: f64) -> f64 {
    if x <= 0.0031308 {
        x * 12.92
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

// ============================================================================
// Decode table
// ============================================================================

/// 256-entry table mapping an 8-bit sRGB value to linear float.
pub struct SrgbLut {
    to_linear: [f32; 256],
}

impl SrgbLut {
    fn build() -> Self {
        let mut to_linear = [0.0f32; 256];
        for (i, entry) in to_linear.iter_mut().enumerate() {
            *entry = srgb_to_linear(i as f64 / 255.0) as f32;
        }
        Self { to_linear }
    }

    /// The process-wide table, built on first use.
    pub fn get() -> &'static SrgbLut {
        static LUT: OnceLock<SrgbLut> = OnceLock::new();
        LUT.get_or_init(SrgbLut::build)
    }

    #[inline]
    pub fn dir(&self, v: u8) -> f32 {
        self.to_linear[v as usize]
    }
}

// ============================================================================
// Channel codecs
// ============================================================================

/// Decode an 8-bit channel to linear float.
#[inline]
pub fn decode_u8(v: u8, gamma: GammaType) -> f32 {
    match gamma {
        GammaType::Linear => v as f32 * (1.0 / 255.0),
        GammaType::Srgb => SrgbLut::get().dir(v),
    }
}

/// Decode a channel already normalized to 0..1.
#[inline]
pub fn decode_unit(v: f32, gamma: GammaType) -> f32 {
    match gamma {
        GammaType::Linear => v,
        GammaType::Srgb => srgb_to_linear(v as f64) as f32,
    }
}

/// Encode a linear channel to 8 bits, rounding to nearest.
///
/// Input is clamped to 0..1 first; NaN encodes as zero.
#[inline]
pub fn encode_u8(v: f32, gamma: GammaType) -> u8 {
    let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
    let encoded = match gamma {
        GammaType::Linear => v as f64,
        GammaType::Srgb => linear_to_srgb(v as f64),
    };
    (encoded * 255.0 + 0.5) as u8
}

// ============================================================================
// Tests
// ============================================================================
