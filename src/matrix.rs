//! Projective 2D matrix in single precision and its type classification.
//!
//! The pipeline receives the inverse of the drawing transform, mapping
//! device pixel centers back into source space, and picks the cheapest
//! matrix stage the [`TypeMask`] allows.

use std::ops::BitOr;

// ============================================================================
// Type mask
// ============================================================================

/// Which kinds of terms a matrix contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeMask(u8);

impl TypeMask {
    pub const IDENTITY: TypeMask = TypeMask(0);
    pub const TRANSLATE: TypeMask = TypeMask(1);
    pub const SCALE: TypeMask = TypeMask(2);
    pub const AFFINE: TypeMask = TypeMask(4);
    pub const PERSPECTIVE: TypeMask = TypeMask(8);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: TypeMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_identity(self) -> bool {
        self.0 == 0
    }

    /// No terms beyond a translation.
    pub const fn is_translate_only(self) -> bool {
        self.0 & !Self::TRANSLATE.0 == 0
    }
}

impl BitOr for TypeMask {
    type Output = TypeMask;

    fn bitor(self, rhs: TypeMask) -> TypeMask {
        TypeMask(self.0 | rhs.0)
    }
}

// ============================================================================
// Matrix
// ============================================================================

/// Projective 2D transformation (3×3 matrix).
///
/// ```text
/// | sx  shy  w0 |
/// | shx  sy  w1 |
/// | tx   ty  w2 |
/// ```
///
/// Transform: `m = 1/(x*w0 + y*w1 + w2)`, then
/// `x' = m*(x*sx + y*shx + tx)`, `y' = m*(x*shy + y*sy + ty)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub sx: f32,
    pub shy: f32,
    pub w0: f32,
    pub shx: f32,
    pub sy: f32,
    pub w1: f32,
    pub tx: f32,
    pub ty: f32,
    pub w2: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new_affine(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new_translation(tx: f32, ty: f32) -> Self {
        Self::new_affine(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub const fn new_scale_translate(sx: f32, sy: f32, tx: f32, ty: f32) -> Self {
        Self::new_affine(sx, 0.0, 0.0, sy, tx, ty)
    }

    /// Affine matrix from its six terms.
    pub const fn new_affine(sx: f32, shy: f32, shx: f32, sy: f32, tx: f32, ty: f32) -> Self {
        Self {
            sx,
            shy,
            w0: 0.0,
            shx,
            sy,
            w1: 0.0,
            tx,
            ty,
            w2: 1.0,
        }
    }

    /// Custom matrix from 9 values.
    #[allow(clippy::too_many_arguments)]
    pub const fn new_from_values(
        v0: f32,
        v1: f32,
        v2: f32,
        v3: f32,
        v4: f32,
        v5: f32,
        v6: f32,
        v7: f32,
        v8: f32,
    ) -> Self {
        Self {
            sx: v0,
            shy: v1,
            w0: v2,
            shx: v3,
            sy: v4,
            w1: v5,
            tx: v6,
            ty: v7,
            w2: v8,
        }
    }

    pub fn has_perspective(&self) -> bool {
        self.w0 != 0.0 || self.w1 != 0.0 || self.w2 != 1.0
    }

    pub fn type_mask(&self) -> TypeMask {
        let mut mask = TypeMask::IDENTITY;
        if self.tx != 0.0 || self.ty != 0.0 {
            mask = mask | TypeMask::TRANSLATE;
        }
        if self.sx != 1.0 || self.sy != 1.0 {
            mask = mask | TypeMask::SCALE;
        }
        if self.shx != 0.0 || self.shy != 0.0 {
            mask = mask | TypeMask::AFFINE;
        }
        if self.has_perspective() {
            mask = mask | TypeMask::PERSPECTIVE;
        }
        mask
    }

    /// Map a point.
    pub fn transform(&self, x: f32, y: f32) -> (f32, f32) {
        let m = 1.0 / (x * self.w0 + y * self.w1 + self.w2);
        (
            m * (x * self.sx + y * self.shx + self.tx),
            m * (x * self.shy + y * self.sy + self.ty),
        )
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert!(Matrix::IDENTITY.type_mask().is_identity());
        assert_eq!(Matrix::IDENTITY.transform(3.0, 4.0), (3.0, 4.0));
    }

    #[test]
    fn test_translation_mask() {
        let m = Matrix::new_translation(2.0, -1.0);
        assert_eq!(m.type_mask(), TypeMask::TRANSLATE);
        assert!(m.type_mask().is_translate_only());
        assert_eq!(m.transform(1.0, 1.0), (3.0, 0.0));
    }

    #[test]
    fn test_scale_mask() {
        let m = Matrix::new_scale_translate(2.0, 3.0, 0.0, 0.0);
        assert_eq!(m.type_mask(), TypeMask::SCALE);
        assert!(!m.type_mask().is_translate_only());
        assert_eq!(m.transform(1.0, 1.0), (2.0, 3.0));
    }

    #[test]
    fn test_affine_mask() {
        let m = Matrix::new_affine(1.0, 0.5, 0.0, 1.0, 1.0, 0.0);
        let mask = m.type_mask();
        assert!(mask.contains(TypeMask::AFFINE));
        assert!(mask.contains(TypeMask::TRANSLATE));
        assert!(!mask.contains(TypeMask::PERSPECTIVE));
        assert_eq!(m.transform(2.0, 0.0), (3.0, 1.0));
    }

    #[test]
    fn test_perspective_divide() {
        let m = Matrix::new_from_values(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0);
        assert!(m.type_mask().contains(TypeMask::PERSPECTIVE));
        assert_eq!(m.transform(4.0, 2.0), (2.0, 1.0));
    }
}
