//! Foundation types shared by every stage.
//!
//! Lane aliases for the four-wide SIMD values that flow through the chain,
//! the [`Point`] type, texel indexing and float stepping.

pub use wide::{f32x4 as F32x4, i32x4 as I32x4};

// ============================================================================
// Point
// ============================================================================

/// A 2D point in single precision.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// Texel indexing
// ============================================================================

/// Floor a coordinate to a texel index clamped to `[0, size)`.
#[inline]
pub fn texel_index(v: f32, size: i32) -> i32 {
    (v.floor() as i32).clamp(0, size - 1)
}

/// [`texel_index`] applied to every lane.
#[inline]
pub fn texel_indices(v: F32x4, size: i32) -> I32x4 {
    I32x4::new(v.to_array().map(|c| texel_index(c, size)))
}

// ============================================================================
// Float stepping
// ============================================================================

/// The next representable `f32` after `x` in the direction of `target`.
///
/// Returns `target` when the two are equal.
pub fn next_toward(x: f32, target: f32) -> f32 {
    if x.is_nan() || target.is_nan() {
        return f32::NAN;
    }
    if x == target {
        return target;
    }
    if x == 0.0 {
        let tiny = f32::from_bits(1);
        return if target > 0.0 { tiny } else { -tiny };
    }
    let bits = x.to_bits();
    // Moving away from zero increases the magnitude bits.
    let away_from_zero = (target > x) == (x > 0.0);
    f32::from_bits(if away_from_zero { bits + 1 } else { bits - 1 })
}

// ============================================================================
// Tests
// ============================================================================
