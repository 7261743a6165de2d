//! Tile stage: fold source-space points back into the source bounds.
//!
//! Each axis is tiled independently (clamp, repeat or mirror). The nearest
//! tiler forwards tiled points and splits repeating spans at the tile edge
//! so the sampler keeps its row fast path. The bilinear tiler expands each
//! point into its four tiled neighbor centers.

use crate::basics::{next_toward, F32x4, Point};
use crate::poly_memory::variant_set;
use crate::processor::{SampleProcessor, TileStrategy};
use crate::span::Span;

// ============================================================================
// Tile mode
// ============================================================================

/// What happens to coordinates outside the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileMode {
    /// Extend the edge pixels.
    #[default]
    Clamp,
    /// Wrap around.
    Repeat,
    /// Wrap around, flipping every other copy.
    Mirror,
}

// ============================================================================
// Tile axis
// ============================================================================

/// Tiling along one axis of a source `size` pixels long.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileAxis {
    mode: TileMode,
    max: f32,
    // Largest float below `max`, so floor() never reaches `size`.
    limit: f32,
    inv_max: f32,
}

impl TileAxis {
    pub fn new(mode: TileMode, size: i32) -> Self {
        debug_assert!(size > 0);
        let max = size as f32;
        Self {
            mode,
            max,
            limit: next_toward(max, 0.0),
            inv_max: 1.0 / max,
        }
    }

    pub fn mode(&self) -> TileMode {
        self.mode
    }

    pub fn size(&self) -> f32 {
        self.max
    }

    /// Map `v` into `[0, size)`.
    #[inline]
    pub fn tile(&self, v: f32) -> f32 {
        let t = match self.mode {
            TileMode::Clamp => v,
            TileMode::Repeat => v - (v * self.inv_max).floor() * self.max,
            TileMode::Mirror => {
                let period = 2.0 * self.max;
                let m = v - (v * self.inv_max * 0.5).floor() * period;
                if m >= self.max {
                    period - m
                } else {
                    m
                }
            }
        };
        t.max(0.0).min(self.limit)
    }

    #[inline]
    pub fn tile_lanes(&self, v: F32x4) -> F32x4 {
        F32x4::new(v.to_array().map(|c| self.tile(c)))
    }
}

// ============================================================================
// Nearest tiler
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestTile {
    x: TileAxis,
    y: TileAxis,
}

impl NearestTile {
    pub fn new(x: TileAxis, y: TileAxis) -> Self {
        Self { x, y }
    }

    /// A span entirely on one side of a clamped axis is one pixel repeated.
    fn clamp_span(&self, span: Span, next: &mut dyn SampleProcessor) -> bool {
        let lo = span.start_x().min(span.end_x());
        let hi = span.start_x().max(span.end_x());
        if hi < 0.0 || lo >= self.x.size() {
            let x = self.x.tile(span.start_x());
            next.repeat_span(Span::new(Point::new(x, span.start_y()), 0.0, 1), span.count());
            return true;
        }
        false
    }

    /// Cut a forward span at each tile edge and send the pieces in order.
    fn repeat_span(&self, span: Span, next: &mut dyn SampleProcessor) -> bool {
        let dx = span.step();
        let width = self.x.size();
        if span.count() <= 1 || dx <= 0.0 || dx >= width {
            return false;
        }

        let start = Point::new(self.x.tile(span.start_x()), span.start_y());
        let mut rest = Span::new(start, span.length(), span.count());
        while !rest.is_empty() {
            let piece = rest.break_at(width, dx);
            if !piece.is_empty() {
                next.point_span(piece);
            }
            rest.offset(-width);
        }
        true
    }
}

impl TileStrategy for NearestTile {
    fn point_list_few(&self, n: usize, xs: F32x4, ys: F32x4, next: &mut dyn SampleProcessor) {
        next.point_list_few(n, self.x.tile_lanes(xs), self.y.tile_lanes(ys));
    }

    fn point_list4(&self, xs: F32x4, ys: F32x4, next: &mut dyn SampleProcessor) {
        next.point_list4(self.x.tile_lanes(xs), self.y.tile_lanes(ys));
    }

    fn maybe_process_span(&self, span: Span, next: &mut dyn SampleProcessor) -> bool {
        if span.is_empty() {
            return true;
        }
        let y = self.y.tile(span.start_y());
        let span = Span::new(Point::new(span.start_x(), y), span.length(), span.count());
        if span.completely_within(0.0, self.x.size()) {
            next.point_span(span);
            return true;
        }
        match self.x.mode() {
            TileMode::Clamp => self.clamp_span(span, next),
            TileMode::Repeat => self.repeat_span(span, next),
            TileMode::Mirror => false,
        }
    }
}

// ============================================================================
// Bilinear tiler
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BilerpTile {
    x: TileAxis,
    y: TileAxis,
}

impl BilerpTile {
    pub fn new(x: TileAxis, y: TileAxis) -> Self {
        Self { x, y }
    }

    fn bilerp_point(&self, x: f32, y: f32, next: &mut dyn SampleProcessor) {
        let x0 = x - 0.5;
        let y0 = y - 0.5;
        let ix = x0.floor();
        let iy = y0.floor();
        let cx0 = self.x.tile(ix + 0.5);
        let cx1 = self.x.tile(ix + 1.5);
        let cy0 = self.y.tile(iy + 0.5);
        let cy1 = self.y.tile(iy + 1.5);
        next.bilerp_edge(
            F32x4::new([cx0, cx1, cx0, cx1]),
            F32x4::new([cy0, cy0, cy1, cy1]),
            x0 - ix,
            y0 - iy,
        );
    }
}

impl TileStrategy for BilerpTile {
    fn point_list_few(&self, n: usize, xs: F32x4, ys: F32x4, next: &mut dyn SampleProcessor) {
        let points = xs.to_array().into_iter().zip(ys.to_array());
        for (x, y) in points.take(n.min(3)) {
            self.bilerp_point(x, y, next);
        }
    }

    fn point_list4(&self, xs: F32x4, ys: F32x4, next: &mut dyn SampleProcessor) {
        for (x, y) in xs.to_array().into_iter().zip(ys.to_array()) {
            self.bilerp_point(x, y, next);
        }
    }

    fn maybe_process_span(&self, span: Span, next: &mut dyn SampleProcessor) -> bool {
        if span.is_empty() {
            return true;
        }
        let y = span.start_y();
        let y_inside = y >= 0.5 && y < self.y.size() - 0.5;
        if y_inside && span.completely_within(0.5, self.x.size() - 0.5) {
            next.bilerp_span(span);
            return true;
        }
        false
    }
}

// ============================================================================
// Tile slot
// ============================================================================

variant_set! {
    /// Everything the tile slot can hold.
    pub enum TileVariant: dyn TileStrategy, capacity = 48;
    Nearest(NearestTile),
    Bilerp(BilerpTile),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poly_memory::VariantSet;
    use crate::processor::testing::Recorder;

    #[test]
    fn test_clamp_axis() {
        let axis = TileAxis::new(TileMode::Clamp, 4);
        assert_eq!(axis.tile(-3.0), 0.0);
        assert_eq!(axis.tile(2.5), 2.5);
        let edge = axis.tile(7.0);
        assert!(edge < 4.0 && edge.floor() == 3.0);
    }

    #[test]
    fn test_repeat_axis() {
        let axis = TileAxis::new(TileMode::Repeat, 4);
        assert_eq!(axis.tile(5.5), 1.5);
        assert_eq!(axis.tile(-0.5), 3.5);
        assert_eq!(axis.tile(8.0), 0.0);
    }

    #[test]
    fn test_mirror_axis() {
        let axis = TileAxis::new(TileMode::Mirror, 4);
        assert_eq!(axis.tile(-0.5), 0.5);
        assert_eq!(axis.tile(4.5), 3.5);
        assert_eq!(axis.tile(7.5), 0.5);
        assert_eq!(axis.tile(8.5), 0.5);
        assert_eq!(axis.tile(4.0).floor(), 3.0);
    }

    #[test]
    fn test_tile_nan_goes_to_zero() {
        let axis = TileAxis::new(TileMode::Repeat, 4);
        assert_eq!(axis.tile(f32::NAN), 0.0);
    }

    fn nearest(x: TileMode, y: TileMode) -> NearestTile {
        NearestTile::new(TileAxis::new(x, 4), TileAxis::new(y, 2))
    }

    #[test]
    fn test_span_inside_passes_through() {
        let tile = nearest(TileMode::Clamp, TileMode::Clamp);
        let mut rec = Recorder::default();
        let span = Span::new(Point::new(0.5, 1.5), 3.0, 4);
        assert!(tile.maybe_process_span(span, &mut rec));
        assert_eq!(rec.calls, vec![format!("span {span:?}")]);
    }

    #[test]
    fn test_span_y_is_tiled() {
        let tile = nearest(TileMode::Clamp, TileMode::Repeat);
        let mut rec = Recorder::default();
        assert!(tile.maybe_process_span(Span::new(Point::new(0.5, 3.5), 3.0, 4), &mut rec));
        let expected = Span::new(Point::new(0.5, 1.5), 3.0, 4);
        assert_eq!(rec.calls, vec![format!("span {expected:?}")]);
    }

    #[test]
    fn test_repeat_span_splits_at_edge() {
        let tile = nearest(TileMode::Repeat, TileMode::Clamp);
        let mut rec = Recorder::default();
        assert!(tile.maybe_process_span(Span::new(Point::new(2.5, 0.5), 5.0, 6), &mut rec));
        assert_eq!(
            rec.calls,
            vec![
                format!("span {:?}", Span::new(Point::new(2.5, 0.5), 1.0, 2)),
                format!("span {:?}", Span::new(Point::new(0.5, 0.5), 3.0, 4)),
            ]
        );
    }

    #[test]
    fn test_repeat_span_starting_outside() {
        let tile = nearest(TileMode::Repeat, TileMode::Clamp);
        let mut rec = Recorder::default();
        assert!(tile.maybe_process_span(Span::new(Point::new(-1.5, 0.5), 2.0, 3), &mut rec));
        assert_eq!(
            rec.calls,
            vec![
                format!("span {:?}", Span::new(Point::new(2.5, 0.5), 1.0, 2)),
                format!("span {:?}", Span::new(Point::new(0.5, 0.5), 0.0, 1)),
            ]
        );
    }

    #[test]
    fn test_clamp_span_outside_repeats_edge_pixel() {
        let tile = nearest(TileMode::Clamp, TileMode::Clamp);
        let mut rec = Recorder::default();
        assert!(tile.maybe_process_span(Span::new(Point::new(10.5, 0.5), 3.0, 4), &mut rec));
        let pixel = Span::new(Point::new(TileAxis::new(TileMode::Clamp, 4).tile(10.5), 0.5), 0.0, 1);
        assert_eq!(rec.calls, vec![format!("repeat {pixel:?} 4")]);
    }

    #[test]
    fn test_mirror_span_falls_back() {
        let tile = nearest(TileMode::Mirror, TileMode::Clamp);
        let mut rec = Recorder::default();
        assert!(!tile.maybe_process_span(Span::new(Point::new(2.5, 0.5), 4.0, 5), &mut rec));
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn test_nearest_points_are_tiled() {
        let tile = nearest(TileMode::Repeat, TileMode::Mirror);
        let mut rec = Recorder::default();
        tile.point_list4(
            F32x4::new([-0.5, 4.5, 1.0, 2.0]),
            F32x4::new([-0.5, 2.5, 0.0, 0.0]),
            &mut rec,
        );
        assert_eq!(
            rec.calls,
            vec![format!(
                "four {:?} {:?}",
                [3.5f32, 0.5, 1.0, 2.0],
                [0.5f32, 1.5, 0.0, 0.0]
            )]
        );
    }

    #[test]
    fn test_bilerp_edge_neighbors() {
        let tile = BilerpTile::new(
            TileAxis::new(TileMode::Repeat, 4),
            TileAxis::new(TileMode::Clamp, 2),
        );
        let mut rec = Recorder::default();
        tile.point_list_few(
            1,
            F32x4::new([0.25, 0.0, 0.0, 0.0]),
            F32x4::new([1.0, 0.0, 0.0, 0.0]),
            &mut rec,
        );
        assert_eq!(
            rec.calls,
            vec![format!(
                "edge {:?} {:?} 0.75 0.5",
                [3.5f32, 0.5, 3.5, 0.5],
                [0.5f32, 0.5, 1.5, 1.5]
            )]
        );
    }

    #[test]
    fn test_bilerp_interior_span() {
        let tile = BilerpTile::new(
            TileAxis::new(TileMode::Clamp, 8),
            TileAxis::new(TileMode::Clamp, 4),
        );
        let mut rec = Recorder::default();
        let inside = Span::new(Point::new(1.0, 2.0), 4.0, 5);
        assert!(tile.maybe_process_span(inside, &mut rec));
        assert_eq!(rec.calls, vec![format!("bilerp {inside:?}")]);

        let edge = Span::new(Point::new(0.25, 2.0), 4.0, 5);
        assert!(!tile.maybe_process_span(edge, &mut rec));
    }

    #[test]
    fn test_variants_fit_slot() {
        use std::mem::size_of;
        assert!(size_of::<NearestTile>() <= TileVariant::CAPACITY);
        assert!(size_of::<BilerpTile>() <= TileVariant::CAPACITY);
    }
}
