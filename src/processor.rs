//! Stage interfaces and the per-call bindings that chain them.
//!
//! Each slot stores one variant from a closed set. The variants implement a
//! strategy trait whose methods take the downstream stage explicitly. For
//! the duration of one span call the driver binds each strategy to its
//! successor, producing the chain of processors below:
//!
//! ```text
//! MatrixBinding -> TileBinding -> SamplerBinding -> BlendBinding -> dst
//!                              \-> SinkBinding -> dst
//! ```
//!
//! Bindings borrow the stages, so the pipeline itself holds no pointers and
//! can be moved freely between calls.

use crate::basics::F32x4;
use crate::pixel_accessor::PixelAccessor;
use crate::span::{span_fallback, Span};

// ============================================================================
// Interfaces
// ============================================================================

/// Consumes sample points in source or device space.
pub trait PointProcessor {
    /// The first `n` lanes (`n < 4`) are valid.
    fn point_list_few(&mut self, n: usize, xs: F32x4, ys: F32x4);
    fn point_list4(&mut self, xs: F32x4, ys: F32x4);
    fn point_span(&mut self, span: Span);
}

/// Consumes tiled points; the extra entries carry filtering context.
pub trait SampleProcessor: PointProcessor {
    /// Process `span` `repeat_count` times in a row.
    fn repeat_span(&mut self, span: Span, repeat_count: usize);
    /// Four neighbor centers (x0y0, x1y0, x0y1, x1y1) and the weights of
    /// the sample between them.
    fn bilerp_edge(&mut self, xs: F32x4, ys: F32x4, fx: f32, fy: f32);
    /// A span whose bilinear neighbors all lie inside the source.
    fn bilerp_span(&mut self, span: Span);
}

/// Consumes linear premultiplied pixels.
pub trait BlendProcessor {
    fn blend_pixel(&mut self, pixel: F32x4);
    fn blend_4_pixels(&mut self, p0: F32x4, p1: F32x4, p2: F32x4, p3: F32x4);
}

/// The final stage: where the next `count` pixels go.
pub trait Destination<'d> {
    fn set_destination(&mut self, dst: &'d mut [u8], count: usize);
}

// ============================================================================
// Destination cursor
// ============================================================================

/// Write position in a destination buffer.
#[derive(Debug, Default)]
pub struct DstCursor<'d> {
    bytes: &'d mut [u8],
    written: usize,
    count: usize,
}

impl<'d> DstCursor<'d> {
    pub fn new(bytes: &'d mut [u8], count: usize) -> Self {
        Self {
            bytes,
            written: 0,
            count,
        }
    }

    /// Bytes of the next `n` pixels. Advances the cursor.
    ///
    /// Panics if the buffer is too small.
    #[inline]
    pub fn next_pixels(&mut self, n: usize, bytes_per_pixel: usize) -> &mut [u8] {
        debug_assert!(
            self.written + n <= self.count,
            "destination overrun: {} + {} > {}",
            self.written,
            n,
            self.count
        );
        let start = self.written * bytes_per_pixel;
        self.written += n;
        &mut self.bytes[start..start + n * bytes_per_pixel]
    }

    #[inline]
    pub fn next_pixel(&mut self, bytes_per_pixel: usize) -> &mut [u8] {
        self.next_pixels(1, bytes_per_pixel)
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn remaining(&self) -> usize {
        self.count.saturating_sub(self.written)
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// Matrix-slot variants.
pub trait MatrixStrategy {
    fn map_points(&self, xs: F32x4, ys: F32x4) -> (F32x4, F32x4);

    /// Map a whole span at once when the transform keeps it a span.
    fn maybe_process_span(&self, _span: Span, _next: &mut dyn PointProcessor) -> bool {
        false
    }
}

/// Tile-slot variants.
pub trait TileStrategy {
    fn point_list_few(&self, n: usize, xs: F32x4, ys: F32x4, next: &mut dyn SampleProcessor);
    fn point_list4(&self, xs: F32x4, ys: F32x4, next: &mut dyn SampleProcessor);
    fn maybe_process_span(&self, span: Span, next: &mut dyn SampleProcessor) -> bool;
}

/// Sample-slot variants.
pub trait SamplerStrategy {
    fn point_list_few(
        &self,
        n: usize,
        xs: F32x4,
        ys: F32x4,
        accessor: &dyn PixelAccessor,
        next: &mut dyn BlendProcessor,
    );
    fn point_list4(
        &self,
        xs: F32x4,
        ys: F32x4,
        accessor: &dyn PixelAccessor,
        next: &mut dyn BlendProcessor,
    );
    fn bilerp_edge(
        &self,
        xs: F32x4,
        ys: F32x4,
        fx: f32,
        fy: f32,
        accessor: &dyn PixelAccessor,
        next: &mut dyn BlendProcessor,
    );

    fn maybe_process_span(
        &self,
        _span: Span,
        _accessor: &dyn PixelAccessor,
        _next: &mut dyn BlendProcessor,
    ) -> bool {
        false
    }
}

/// Blend-slot variants.
pub trait BlendStrategy {
    fn blend_pixel(&self, pixel: F32x4, dst: &mut DstCursor<'_>);
}

/// Sample-slot variants that also terminate the chain by copying source
/// bytes straight into the destination.
pub trait DestinationStrategy {
    fn store_points(
        &self,
        n: usize,
        xs: F32x4,
        ys: F32x4,
        accessor: &dyn PixelAccessor,
        dst: &mut DstCursor<'_>,
    );

    fn maybe_store_span(
        &self,
        _span: Span,
        _accessor: &dyn PixelAccessor,
        _dst: &mut DstCursor<'_>,
    ) -> bool {
        false
    }
}

// ============================================================================
// Bindings
// ============================================================================

/// A matrix strategy chained to its successor.
pub struct MatrixBinding<'a> {
    strategy: &'a dyn MatrixStrategy,
    next: &'a mut dyn PointProcessor,
}

impl<'a> MatrixBinding<'a> {
    pub fn new(strategy: &'a dyn MatrixStrategy, next: &'a mut dyn PointProcessor) -> Self {
        Self { strategy, next }
    }
}

impl PointProcessor for MatrixBinding<'_> {
    fn point_list_few(&mut self, n: usize, xs: F32x4, ys: F32x4) {
        let (xs, ys) = self.strategy.map_points(xs, ys);
        self.next.point_list_few(n, xs, ys);
    }

    fn point_list4(&mut self, xs: F32x4, ys: F32x4) {
        let (xs, ys) = self.strategy.map_points(xs, ys);
        self.next.point_list4(xs, ys);
    }

    fn point_span(&mut self, span: Span) {
        if !self.strategy.maybe_process_span(span, self.next) {
            span_fallback(span, self);
        }
    }
}

/// A tile strategy chained to its successor.
pub struct TileBinding<'a> {
    strategy: &'a dyn TileStrategy,
    next: &'a mut dyn SampleProcessor,
}

impl<'a> TileBinding<'a> {
    pub fn new(strategy: &'a dyn TileStrategy, next: &'a mut dyn SampleProcessor) -> Self {
        Self { strategy, next }
    }
}

impl PointProcessor for TileBinding<'_> {
    fn point_list_few(&mut self, n: usize, xs: F32x4, ys: F32x4) {
        self.strategy.point_list_few(n, xs, ys, self.next);
    }

    fn point_list4(&mut self, xs: F32x4, ys: F32x4) {
        self.strategy.point_list4(xs, ys, self.next);
    }

    fn point_span(&mut self, span: Span) {
        if !self.strategy.maybe_process_span(span, self.next) {
            span_fallback(span, self);
        }
    }
}

/// A sampler strategy chained to its accessor and successor.
pub struct SamplerBinding<'a> {
    strategy: &'a dyn SamplerStrategy,
    accessor: &'a dyn PixelAccessor,
    next: &'a mut dyn BlendProcessor,
}

impl<'a> SamplerBinding<'a> {
    pub fn new(
        strategy: &'a dyn SamplerStrategy,
        accessor: &'a dyn PixelAccessor,
        next: &'a mut dyn BlendProcessor,
    ) -> Self {
        Self {
            strategy,
            accessor,
            next,
        }
    }
}

impl PointProcessor for SamplerBinding<'_> {
    fn point_list_few(&mut self, n: usize, xs: F32x4, ys: F32x4) {
        self.strategy
            .point_list_few(n, xs, ys, self.accessor, self.next);
    }

    fn point_list4(&mut self, xs: F32x4, ys: F32x4) {
        self.strategy.point_list4(xs, ys, self.accessor, self.next);
    }

    fn point_span(&mut self, span: Span) {
        if !self
            .strategy
            .maybe_process_span(span, self.accessor, self.next)
        {
            span_fallback(span, self);
        }
    }
}

impl SampleProcessor for SamplerBinding<'_> {
    fn repeat_span(&mut self, span: Span, repeat_count: usize) {
        for _ in 0..repeat_count {
            self.point_span(span);
        }
    }

    fn bilerp_edge(&mut self, xs: F32x4, ys: F32x4, fx: f32, fy: f32) {
        self.strategy
            .bilerp_edge(xs, ys, fx, fy, self.accessor, self.next);
    }

    fn bilerp_span(&mut self, span: Span) {
        self.point_span(span);
    }
}

/// A destination-capable sample variant acting as the last stage.
pub struct SinkBinding<'a, 'd> {
    strategy: &'a dyn DestinationStrategy,
    accessor: &'a dyn PixelAccessor,
    dst: DstCursor<'d>,
}

impl<'a, 'd> SinkBinding<'a, 'd> {
    pub fn new(strategy: &'a dyn DestinationStrategy, accessor: &'a dyn PixelAccessor) -> Self {
        Self {
            strategy,
            accessor,
            dst: DstCursor::default(),
        }
    }

    pub fn written(&self) -> usize {
        self.dst.written()
    }
}

impl<'d> Destination<'d> for SinkBinding<'_, 'd> {
    fn set_destination(&mut self, dst: &'d mut [u8], count: usize) {
        self.dst = DstCursor::new(dst, count);
    }
}

impl PointProcessor for SinkBinding<'_, '_> {
    fn point_list_few(&mut self, n: usize, xs: F32x4, ys: F32x4) {
        self.strategy
            .store_points(n, xs, ys, self.accessor, &mut self.dst);
    }

    fn point_list4(&mut self, xs: F32x4, ys: F32x4) {
        self.strategy
            .store_points(4, xs, ys, self.accessor, &mut self.dst);
    }

    fn point_span(&mut self, span: Span) {
        if !self
            .strategy
            .maybe_store_span(span, self.accessor, &mut self.dst)
        {
            span_fallback(span, self);
        }
    }
}

impl SampleProcessor for SinkBinding<'_, '_> {
    fn repeat_span(&mut self, span: Span, repeat_count: usize) {
        for _ in 0..repeat_count {
            self.point_span(span);
        }
    }

    fn bilerp_edge(&mut self, xs: F32x4, ys: F32x4, fx: f32, fy: f32) {
        // Copy the neighbor the sample is closest to.
        let i = usize::from(fx >= 0.5) + 2 * usize::from(fy >= 0.5);
        let x = F32x4::splat(xs.to_array()[i]);
        let y = F32x4::splat(ys.to_array()[i]);
        self.point_list_few(1, x, y);
    }

    fn bilerp_span(&mut self, span: Span) {
        self.point_span(span);
    }
}

/// A blend strategy writing into the destination.
pub struct BlendBinding<'a, 'd> {
    strategy: &'a dyn BlendStrategy,
    dst: DstCursor<'d>,
}

impl<'a, 'd> BlendBinding<'a, 'd> {
    pub fn new(strategy: &'a dyn BlendStrategy) -> Self {
        Self {
            strategy,
            dst: DstCursor::default(),
        }
    }

    pub fn written(&self) -> usize {
        self.dst.written()
    }
}

impl<'d> Destination<'d> for BlendBinding<'_, 'd> {
    fn set_destination(&mut self, dst: &'d mut [u8], count: usize) {
        self.dst = DstCursor::new(dst, count);
    }
}

impl BlendProcessor for BlendBinding<'_, '_> {
    fn blend_pixel(&mut self, pixel: F32x4) {
        self.strategy.blend_pixel(pixel, &mut self.dst);
    }

    fn blend_4_pixels(&mut self, p0: F32x4, p1: F32x4, p2: F32x4, p3: F32x4) {
        for p in [p0, p1, p2, p3] {
            self.strategy.blend_pixel(p, &mut self.dst);
        }
    }
}

// ============================================================================
// Test doubles
// ============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records every call made to a sample stage.
    #[derive(Default, Debug, PartialEq)]
    pub(crate) struct Recorder {
        pub calls: Vec<String>,
    }

    impl PointProcessor for Recorder {
        fn point_list_few(&mut self, n: usize, xs: F32x4, ys: F32x4) {
            self.calls
                .push(format!("few {n} {:?} {:?}", xs.to_array(), ys.to_array()));
        }

        fn point_list4(&mut self, xs: F32x4, ys: F32x4) {
            self.calls
                .push(format!("four {:?} {:?}", xs.to_array(), ys.to_array()));
        }

        fn point_span(&mut self, span: Span) {
            self.calls.push(format!("span {span:?}"));
        }
    }

    impl SampleProcessor for Recorder {
        fn repeat_span(&mut self, span: Span, repeat_count: usize) {
            self.calls.push(format!("repeat {span:?} {repeat_count}"));
        }

        fn bilerp_edge(&mut self, xs: F32x4, ys: F32x4, fx: f32, fy: f32) {
            self.calls.push(format!(
                "edge {:?} {:?} {fx} {fy}",
                xs.to_array(),
                ys.to_array()
            ));
        }

        fn bilerp_span(&mut self, span: Span) {
            self.calls.push(format!("bilerp {span:?}"));
        }
    }

    /// Collects blended pixels.
    #[derive(Default, Debug)]
    pub(crate) struct Pixels(pub Vec<[f32; 4]>);

    impl BlendProcessor for Pixels {
        fn blend_pixel(&mut self, pixel: F32x4) {
            self.0.push(pixel.to_array());
        }

        fn blend_4_pixels(&mut self, p0: F32x4, p1: F32x4, p2: F32x4, p3: F32x4) {
            for p in [p0, p1, p2, p3] {
                self.blend_pixel(p);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
