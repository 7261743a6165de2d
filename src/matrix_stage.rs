//! Matrix stage: map device pixel centers into source space.
//!
//! Four variants, cheapest first. Translate and scale keep a span a span,
//! so they rewrite it in one step; affine and perspective map points.

use crate::basics::{F32x4, Point};
use crate::matrix::{Matrix, TypeMask};
use crate::poly_memory::variant_set;
use crate::processor::{MatrixStrategy, PointProcessor};
use crate::span::Span;
use crate::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslateMatrix {
    tx: f32,
    ty: f32,
}

impl TranslateMatrix {
    pub fn new(tx: f32, ty: f32) -> Self {
        Self { tx, ty }
    }
}

impl MatrixStrategy for TranslateMatrix {
    #[inline]
    fn map_points(&self, xs: F32x4, ys: F32x4) -> (F32x4, F32x4) {
        (xs + F32x4::splat(self.tx), ys + F32x4::splat(self.ty))
    }

    fn maybe_process_span(&self, span: Span, next: &mut dyn PointProcessor) -> bool {
        next.point_span(span.translated(self.tx, self.ty));
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleMatrix {
    sx: f32,
    sy: f32,
    tx: f32,
    ty: f32,
}

impl ScaleMatrix {
    pub fn new(sx: f32, sy: f32, tx: f32, ty: f32) -> Self {
        Self { sx, sy, tx, ty }
    }
}

impl MatrixStrategy for ScaleMatrix {
    #[inline]
    fn map_points(&self, xs: F32x4, ys: F32x4) -> (F32x4, F32x4) {
        (
            xs * F32x4::splat(self.sx) + F32x4::splat(self.tx),
            ys * F32x4::splat(self.sy) + F32x4::splat(self.ty),
        )
    }

    fn maybe_process_span(&self, span: Span, next: &mut dyn PointProcessor) -> bool {
        let start = span.start();
        let mapped = Span::new(
            Point::new(start.x * self.sx + self.tx, start.y * self.sy + self.ty),
            span.length() * self.sx,
            span.count(),
        );
        next.point_span(mapped);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineMatrix {
    sx: f32,
    shy: f32,
    shx: f32,
    sy: f32,
    tx: f32,
    ty: f32,
}

impl AffineMatrix {
    pub fn new(m: &Matrix) -> Self {
        Self {
            sx: m.sx,
            shy: m.shy,
            shx: m.shx,
            sy: m.sy,
            tx: m.tx,
            ty: m.ty,
        }
    }
}

impl MatrixStrategy for AffineMatrix {
    #[inline]
    fn map_points(&self, xs: F32x4, ys: F32x4) -> (F32x4, F32x4) {
        (
            xs * F32x4::splat(self.sx) + ys * F32x4::splat(self.shx) + F32x4::splat(self.tx),
            xs * F32x4::splat(self.shy) + ys * F32x4::splat(self.sy) + F32x4::splat(self.ty),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveMatrix {
    m: Matrix,
}

impl PerspectiveMatrix {
    pub fn new(m: &Matrix) -> Self {
        Self { m: *m }
    }
}

impl MatrixStrategy for PerspectiveMatrix {
    #[inline]
    fn map_points(&self, xs: F32x4, ys: F32x4) -> (F32x4, F32x4) {
        let m = &self.m;
        let w = xs * F32x4::splat(m.w0) + ys * F32x4::splat(m.w1) + F32x4::splat(m.w2);
        let x = xs * F32x4::splat(m.sx) + ys * F32x4::splat(m.shx) + F32x4::splat(m.tx);
        let y = xs * F32x4::splat(m.shy) + ys * F32x4::splat(m.sy) + F32x4::splat(m.ty);
        (x / w, y / w)
    }
}

variant_set! {
    /// Everything the matrix slot can hold.
    #[derive(Debug, Clone, Copy)]
    pub enum MatrixVariant: dyn MatrixStrategy, capacity = 56;
    Translate(TranslateMatrix),
    Scale(ScaleMatrix),
    Affine(AffineMatrix),
    Perspective(PerspectiveMatrix),
}

/// Place the cheapest variant for `m` into `stage`, forwarding to `next`.
///
/// Returns `false`, leaving the stage empty, for the identity.
pub fn init_matrix_stage<L: Copy>(stage: &mut Stage<MatrixVariant, L>, next: L, m: &Matrix) -> bool {
    let mask = m.type_mask();
    if mask.is_identity() {
        return false;
    }
    if mask.contains(TypeMask::PERSPECTIVE) {
        stage.init_stage(next, PerspectiveMatrix::new(m));
    } else if mask.contains(TypeMask::AFFINE) {
        stage.init_stage(next, AffineMatrix::new(m));
    } else if mask.contains(TypeMask::SCALE) {
        stage.init_stage(next, ScaleMatrix::new(m.sx, m.sy, m.tx, m.ty));
    } else {
        stage.init_stage(next, TranslateMatrix::new(m.tx, m.ty));
    }
    true
}

// ============================================================================
// Tests
// ============================================================================
