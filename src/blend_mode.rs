//! Blend modes and their premultiplied float formulas.
//!
//! The full list of compositing operators is named so callers can ask for
//! any of them; only the Porter-Duff subset has a float formula here, and
//! only [`BlendMode::is_blittable`] modes get a blit blender.

use crate::basics::F32x4;

/// Compositing operator applied when writing into a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    Clear,
    Src,
    Dst,
    #[default]
    SrcOver,
    DstOver,
    SrcIn,
    DstIn,
    SrcOut,
    DstOut,
    SrcAtop,
    DstAtop,
    Xor,
    Plus,
    Minus,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

impl BlendMode {
    /// Modes a blit blender can be built for.
    pub const fn is_blittable(self) -> bool {
        matches!(
            self,
            BlendMode::Clear
                | BlendMode::Src
                | BlendMode::SrcOver
                | BlendMode::DstOver
                | BlendMode::Plus
        )
    }

    /// SrcOver with a source that covers every pixel is plain Src.
    pub fn normalized(self, src_opaque: bool, final_alpha: f32) -> Self {
        if self == BlendMode::SrcOver && src_opaque && final_alpha >= 1.0 {
            BlendMode::Src
        } else {
            self
        }
    }

    /// Combine premultiplied `src` over `dst`.
    ///
    /// Returns `None` for the separable and non-separable modes.
    pub fn apply(self, src: F32x4, dst: F32x4) -> Option<F32x4> {
        let sa = F32x4::splat(src.to_array()[3]);
        let da = F32x4::splat(dst.to_array()[3]);
        let one = F32x4::splat(1.0);
        let out = match self {
            BlendMode::Clear => F32x4::splat(0.0),
            BlendMode::Src => src,
            BlendMode::Dst => dst,
            BlendMode::SrcOver => src + dst * (one - sa),
            BlendMode::DstOver => dst + src * (one - da),
            BlendMode::SrcIn => src * da,
            BlendMode::DstIn => dst * sa,
            BlendMode::SrcOut => src * (one - da),
            BlendMode::DstOut => dst * (one - sa),
            BlendMode::SrcAtop => src * da + dst * (one - sa),
            BlendMode::DstAtop => dst * sa + src * (one - da),
            BlendMode::Xor => src * (one - da) + dst * (one - sa),
            BlendMode::Plus => (src + dst).min(one),
            _ => return None,
        };
        Some(out)
    }
}
