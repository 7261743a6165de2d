//! Sample stage: fetch and filter source pixels at tiled coordinates.
//!
//! Three variants fill the slot:
//! - `NearestNeighborSampler`: floor to the containing pixel
//! - `BilerpSampler`: weight the four surrounding pixel centers
//! - `UnitCopySampler`: copy source bytes unchanged; also a sink

use crate::basics::{texel_index, texel_indices, F32x4};
use crate::pixel_accessor::PixelAccessor;
use crate::poly_memory::{variant_set, Probe};
use crate::processor::{BlendProcessor, DestinationStrategy, DstCursor, SamplerStrategy};
use crate::span::Span;

// ============================================================================
// Filter quality
// ============================================================================

/// Requested filtering. Low and above sample bilinearly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum FilterQuality {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl FilterQuality {
    pub fn is_nearest(self) -> bool {
        self == FilterQuality::None
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Blend weights of the four neighbors (x0y0, x1y0, x0y1, x1y1).
#[inline]
fn bilerp(px: [F32x4; 4], fx: f32, fy: f32) -> F32x4 {
    let fx1 = 1.0 - fx;
    let fy1 = 1.0 - fy;
    px[0] * F32x4::splat(fx1 * fy1)
        + px[1] * F32x4::splat(fx * fy1)
        + px[2] * F32x4::splat(fx1 * fy)
        + px[3] * F32x4::splat(fx * fy)
}

/// Pixels along row `y` from column `x`, stepping by `dir` (±1).
fn row_run(
    x: i32,
    y: i32,
    dir: i32,
    count: usize,
    accessor: &dyn PixelAccessor,
    next: &mut dyn BlendProcessor,
) {
    let row = accessor.row(y);
    let at = |i: usize| accessor.get_pixel_from_row(row, (x + dir * i as i32) as usize);
    let mut i = 0;
    while count - i >= 4 {
        next.blend_4_pixels(at(i), at(i + 1), at(i + 2), at(i + 3));
        i += 4;
    }
    while i < count {
        next.blend_pixel(at(i));
        i += 1;
    }
}

/// Unit-step span that stays inside one row: `(x, y, dir)`.
fn unit_run(span: &Span, width: i32, height: i32) -> Option<(i32, i32, i32)> {
    let dx = span.step();
    if dx.abs() != 1.0 {
        return None;
    }
    let x0 = span.start_x().floor();
    let x1 = x0 + dx * (span.count() - 1) as f32;
    let y = span.start_y().floor();
    let inside = |v: f32, size: i32| v >= 0.0 && v < size as f32;
    if inside(x0, width) && inside(x1, width) && inside(y, height) {
        Some((x0 as i32, y as i32, dx as i32))
    } else {
        None
    }
}

// ============================================================================
// Nearest neighbor
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NearestNeighborSampler;

impl SamplerStrategy for NearestNeighborSampler {
    fn point_list_few(
        &self,
        n: usize,
        xs: F32x4,
        ys: F32x4,
        accessor: &dyn PixelAccessor,
        next: &mut dyn BlendProcessor,
    ) {
        let (w, h) = accessor.dimensions();
        let px = accessor.get_few_pixels(n, texel_indices(xs, w), texel_indices(ys, h));
        for p in px.into_iter().take(n) {
            next.blend_pixel(p);
        }
    }

    fn point_list4(
        &self,
        xs: F32x4,
        ys: F32x4,
        accessor: &dyn PixelAccessor,
        next: &mut dyn BlendProcessor,
    ) {
        let (w, h) = accessor.dimensions();
        let [p0, p1, p2, p3] = accessor.get_4_pixels(texel_indices(xs, w), texel_indices(ys, h));
        next.blend_4_pixels(p0, p1, p2, p3);
    }

    fn bilerp_edge(
        &self,
        xs: F32x4,
        ys: F32x4,
        fx: f32,
        fy: f32,
        accessor: &dyn PixelAccessor,
        next: &mut dyn BlendProcessor,
    ) {
        let i = usize::from(fx >= 0.5) + 2 * usize::from(fy >= 0.5);
        let (w, h) = accessor.dimensions();
        let x = texel_index(xs.to_array()[i], w);
        let y = texel_index(ys.to_array()[i], h);
        next.blend_pixel(accessor.get_pixel(x, y));
    }

    fn maybe_process_span(
        &self,
        span: Span,
        accessor: &dyn PixelAccessor,
        next: &mut dyn BlendProcessor,
    ) -> bool {
        if span.is_empty() {
            return true;
        }
        let (w, h) = accessor.dimensions();
        if span.count() == 1 || span.length() == 0.0 {
            let x = texel_index(span.start_x(), w);
            let y = texel_index(span.start_y(), h);
            let pixel = accessor.get_pixel_at(y as usize * w as usize + x as usize);
            for _ in 0..span.count() {
                next.blend_pixel(pixel);
            }
            return true;
        }
        match unit_run(&span, w, h) {
            Some((x, y, dir)) => {
                row_run(x, y, dir, span.count(), accessor, next);
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Bilinear
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BilerpSampler;

impl BilerpSampler {
    /// Filter around an untiled point, clamping neighbors to the source.
    fn sample(&self, x: f32, y: f32, accessor: &dyn PixelAccessor) -> F32x4 {
        let (w, h) = accessor.dimensions();
        let x0 = x - 0.5;
        let y0 = y - 0.5;
        let fx0 = x0.floor();
        let fy0 = y0.floor();
        let ix0 = texel_index(fx0, w);
        let ix1 = texel_index(fx0 + 1.0, w);
        let iy0 = texel_index(fy0, h);
        let iy1 = texel_index(fy0 + 1.0, h);
        let px = [
            accessor.get_pixel(ix0, iy0),
            accessor.get_pixel(ix1, iy0),
            accessor.get_pixel(ix0, iy1),
            accessor.get_pixel(ix1, iy1),
        ];
        bilerp(px, x0 - fx0, y0 - fy0)
    }
}

impl SamplerStrategy for BilerpSampler {
    fn point_list_few(
        &self,
        n: usize,
        xs: F32x4,
        ys: F32x4,
        accessor: &dyn PixelAccessor,
        next: &mut dyn BlendProcessor,
    ) {
        let points = xs.to_array().into_iter().zip(ys.to_array());
        for (x, y) in points.take(n.min(3)) {
            next.blend_pixel(self.sample(x, y, accessor));
        }
    }

    fn point_list4(
        &self,
        xs: F32x4,
        ys: F32x4,
        accessor: &dyn PixelAccessor,
        next: &mut dyn BlendProcessor,
    ) {
        let xs = xs.to_array();
        let ys = ys.to_array();
        let [p0, p1, p2, p3] = [0, 1, 2, 3].map(|i| self.sample(xs[i], ys[i], accessor));
        next.blend_4_pixels(p0, p1, p2, p3);
    }

    fn bilerp_edge(
        &self,
        xs: F32x4,
        ys: F32x4,
        fx: f32,
        fy: f32,
        accessor: &dyn PixelAccessor,
        next: &mut dyn BlendProcessor,
    ) {
        let (w, h) = accessor.dimensions();
        let px = accessor.get_4_pixels(texel_indices(xs, w), texel_indices(ys, h));
        next.blend_pixel(bilerp(px, fx, fy));
    }
}

// ============================================================================
// Unit copy
// ============================================================================

/// Copies source pixels byte for byte when source and destination share a
/// format. Acts as an ordinary nearest sampler when chained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitCopySampler {
    bytes_per_pixel: usize,
}

impl UnitCopySampler {
    pub fn new(bytes_per_pixel: usize) -> Self {
        Self { bytes_per_pixel }
    }
}

impl SamplerStrategy for UnitCopySampler {
    fn point_list_few(
        &self,
        n: usize,
        xs: F32x4,
        ys: F32x4,
        accessor: &dyn PixelAccessor,
        next: &mut dyn BlendProcessor,
    ) {
        NearestNeighborSampler.point_list_few(n, xs, ys, accessor, next);
    }

    fn point_list4(
        &self,
        xs: F32x4,
        ys: F32x4,
        accessor: &dyn PixelAccessor,
        next: &mut dyn BlendProcessor,
    ) {
        NearestNeighborSampler.point_list4(xs, ys, accessor, next);
    }

    fn bilerp_edge(
        &self,
        xs: F32x4,
        ys: F32x4,
        fx: f32,
        fy: f32,
        accessor: &dyn PixelAccessor,
        next: &mut dyn BlendProcessor,
    ) {
        NearestNeighborSampler.bilerp_edge(xs, ys, fx, fy, accessor, next);
    }

    fn maybe_process_span(
        &self,
        span: Span,
        accessor: &dyn PixelAccessor,
        next: &mut dyn BlendProcessor,
    ) -> bool {
        NearestNeighborSampler.maybe_process_span(span, accessor, next)
    }
}

impl DestinationStrategy for UnitCopySampler {
    fn store_points(
        &self,
        n: usize,
        xs: F32x4,
        ys: F32x4,
        accessor: &dyn PixelAccessor,
        dst: &mut DstCursor<'_>,
    ) {
        let bpp = self.bytes_per_pixel;
        let (w, h) = accessor.dimensions();
        let xs = texel_indices(xs, w).to_array();
        let ys = texel_indices(ys, h).to_array();
        for (x, y) in xs.into_iter().zip(ys).take(n) {
            let start = x as usize * bpp;
            let src = &accessor.row(y)[start..start + bpp];
            dst.next_pixel(bpp).copy_from_slice(src);
        }
    }

    fn maybe_store_span(
        &self,
        span: Span,
        accessor: &dyn PixelAccessor,
        dst: &mut DstCursor<'_>,
    ) -> bool {
        if span.is_empty() {
            return true;
        }
        let (w, h) = accessor.dimensions();
        match unit_run(&span, w, h) {
            Some((x, y, 1)) => {
                let bpp = self.bytes_per_pixel;
                let start = x as usize * bpp;
                let count = span.count();
                let src = &accessor.row(y)[start..start + count * bpp];
                dst.next_pixels(count, bpp).copy_from_slice(src);
                true
            }
            _ => false,
        }
    }
}

// ============================================================================
// Sample slot
// ============================================================================

variant_set! {
    /// Everything the sample slot can hold.
    pub enum SampleVariant: dyn SamplerStrategy, capacity = 160;
    Nearest(NearestNeighborSampler),
    Bilerp(BilerpSampler),
    UnitCopy(UnitCopySampler),
}

impl Probe<dyn DestinationStrategy> for SampleVariant {
    fn probe(&self) -> Option<&(dyn DestinationStrategy + 'static)> {
        match self {
            SampleVariant::UnitCopy(sink) => Some(sink),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::Point;
    use crate::pixel_accessor::{FormatAccessor, Gray8};
    use crate::pixmap::{ColorType, ImageInfo, Pixmap};
    use crate::poly_memory::VariantSet;
    use crate::processor::testing::Pixels;

    const GRAY: [u8; 8] = [0, 51, 102, 153, 204, 255, 10, 20];

    fn gray_4x2() -> FormatAccessor<'static, Gray8> {
        let info = ImageInfo::new_premul(4, 2, ColorType::Gray8);
        FormatAccessor::new(Pixmap::new_packed(info, &GRAY).unwrap())
    }

    fn level(v: u8) -> f32 {
        v as f32 * (1.0 / 255.0)
    }

    fn reds(px: &Pixels) -> Vec<f32> {
        px.0.iter().map(|p| p[0]).collect()
    }

    #[test]
    fn test_nearest_points() {
        let acc = gray_4x2();
        let mut out = Pixels::default();
        NearestNeighborSampler.point_list4(
            F32x4::new([0.5, 1.9, 3.0, 9.0]),
            F32x4::new([0.5, 0.5, 1.2, -4.0]),
            &acc,
            &mut out,
        );
        assert_eq!(
            reds(&out),
            vec![level(0), level(51), level(20), level(153)]
        );
    }

    #[test]
    fn test_nearest_few() {
        let acc = gray_4x2();
        let mut out = Pixels::default();
        NearestNeighborSampler.point_list_few(
            2,
            F32x4::new([3.5, 0.5, 0.0, 0.0]),
            F32x4::splat(1.5),
            &acc,
            &mut out,
        );
        assert_eq!(reds(&out), vec![level(20), level(204)]);
    }

    #[test]
    fn test_nearest_row_fast_path_both_directions() {
        let acc = gray_4x2();
        let mut out = Pixels::default();
        let span = Span::new(Point::new(0.5, 0.5), 3.0, 4);
        assert!(NearestNeighborSampler.maybe_process_span(span, &acc, &mut out));
        assert_eq!(reds(&out), vec![level(0), level(51), level(102), level(153)]);

        let mut back = Pixels::default();
        let span = Span::new(Point::new(3.5, 1.5), -3.0, 4);
        assert!(NearestNeighborSampler.maybe_process_span(span, &acc, &mut back));
        assert_eq!(reds(&back), vec![level(20), level(10), level(255), level(204)]);
    }

    #[test]
    fn test_nearest_zero_length_repeats_pixel() {
        let acc = gray_4x2();
        let mut out = Pixels::default();
        let span = Span::new(Point::new(2.5, 1.5), 0.0, 3);
        assert!(NearestNeighborSampler.maybe_process_span(span, &acc, &mut out));
        assert_eq!(reds(&out), vec![level(10); 3]);
    }

    #[test]
    fn test_nearest_scaled_span_declines() {
        let acc = gray_4x2();
        let mut out = Pixels::default();
        let span = Span::new(Point::new(0.5, 0.5), 3.0, 7);
        assert!(!NearestNeighborSampler.maybe_process_span(span, &acc, &mut out));
        assert!(out.0.is_empty());
    }

    #[test]
    fn test_bilerp_center_and_between() {
        let acc = gray_4x2();
        let mut out = Pixels::default();
        BilerpSampler.point_list_few(
            2,
            F32x4::new([1.5, 1.0, 0.0, 0.0]),
            F32x4::new([0.5, 0.5, 0.0, 0.0]),
            &acc,
            &mut out,
        );
        assert_eq!(out.0[0][0], level(51));
        let mid = (level(0) + level(51)) * 0.5;
        assert!((out.0[1][0] - mid).abs() < 1e-6);
    }

    #[test]
    fn test_bilerp_edge_weights() {
        let acc = gray_4x2();
        let mut out = Pixels::default();
        BilerpSampler.bilerp_edge(
            F32x4::new([0.5, 1.5, 0.5, 1.5]),
            F32x4::new([0.5, 0.5, 1.5, 1.5]),
            0.0,
            1.0,
            &acc,
            &mut out,
        );
        assert_eq!(out.0[0][0], level(204));
    }

    #[test]
    fn test_unit_copy_stores_bytes() {
        let acc = gray_4x2();
        let sink = UnitCopySampler::new(1);
        let mut buf = [0u8; 6];
        let mut dst = DstCursor::new(&mut buf, 6);
        assert!(sink.maybe_store_span(Span::new(Point::new(1.5, 0.5), 2.0, 3), &acc, &mut dst));
        sink.store_points(
            3,
            F32x4::new([3.5, 0.5, 1.5, 0.0]),
            F32x4::splat(1.5),
            &acc,
            &mut dst,
        );
        assert_eq!(dst.remaining(), 0);
        drop(dst);
        assert_eq!(buf, [51, 102, 153, 20, 204, 255]);
    }

    #[test]
    fn test_unit_copy_declines_backwards_span() {
        let acc = gray_4x2();
        let mut buf = [0u8; 3];
        let mut dst = DstCursor::new(&mut buf, 3);
        let span = Span::new(Point::new(2.5, 0.5), -2.0, 3);
        assert!(!UnitCopySampler::new(1).maybe_store_span(span, &acc, &mut dst));
    }

    #[test]
    fn test_probe() {
        let sink: SampleVariant = UnitCopySampler::new(4).into();
        assert!(Probe::<dyn DestinationStrategy>::probe(&sink).is_some());
        let nearest: SampleVariant = NearestNeighborSampler.into();
        assert!(Probe::<dyn DestinationStrategy>::probe(&nearest).is_none());
    }

    #[test]
    fn test_variants_fit_slot() {
        use std::mem::size_of;
        assert!(size_of::<UnitCopySampler>() <= SampleVariant::CAPACITY);
        assert!(size_of::<BilerpSampler>() <= SampleVariant::CAPACITY);
    }

    #[test]
    fn test_filter_quality() {
        assert!(FilterQuality::None.is_nearest());
        assert!(!FilterQuality::Low.is_nearest());
        assert!(FilterQuality::High > FilterQuality::Low);
    }
}
