//! The linear bitmap pipeline: assembly, respecialization and span drivers.
//!
//! A pipeline owns four chained slots (matrix, tile, sampler, blender) and
//! one accessor slot. Slots record which stage follows them; the span
//! drivers resolve that chain into borrowed bindings for the duration of
//! one call, so a pipeline is a plain value and can be moved freely.
//!
//! ```text
//!   matrix -> tile -> sampler -> blender -> dst
//!                        |
//!                     accessor -> src
//! ```

use crate::basics::{next_toward, Point};
use crate::blend_mode::BlendMode;
use crate::blender::{BlendVariant, BlitBlender, ShadeBlender};
use crate::color::{Color, Pm4f};
use crate::embeddable::EmbeddableLinearPipeline;
use crate::error::{PipelineError, PipelineResult};
use crate::matrix::{Matrix, TypeMask};
use crate::matrix_stage::{init_matrix_stage, MatrixVariant};
use crate::pixel_accessor::{self as formats, AccessorVariant, FormatAccessor, TintedAlphaAccessor};
use crate::pixmap::{AlphaType, ColorType, ImageInfo, Pixmap};
use crate::poly_memory::PolyMemory;
use crate::processor::{
    BlendBinding, Destination, DestinationStrategy, MatrixBinding, PointProcessor,
    SampleProcessor, SamplerBinding, SinkBinding, TileBinding,
};
use crate::sampler::{BilerpSampler, FilterQuality, NearestNeighborSampler, SampleVariant, UnitCopySampler};
use crate::span::Span;
use crate::stage::Stage;
use crate::tile_stage::{BilerpTile, NearestTile, TileAxis, TileMode, TileVariant};

// ============================================================================
// Stage designators
// ============================================================================

/// Names a stage of the chain. Slots store these instead of pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    Matrix,
    Tile,
    Sampler,
    Blender,
}

pub type MatrixStage = Stage<MatrixVariant, StageId>;
pub type TileStage = Stage<TileVariant, StageId>;
pub type SampleStage = Stage<SampleVariant, StageId>;
pub type BlenderStage = Stage<BlendVariant, StageId>;
pub type Accessor<'a> = PolyMemory<AccessorVariant<'a>>;

/// The sampling parameters a pipeline was assembled with.
///
/// A respecialization request must echo these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SamplingKey {
    pub matrix_mask: TypeMask,
    pub x_tile: TileMode,
    pub y_tile: TileMode,
    pub filter_quality: FilterQuality,
}

// ============================================================================
// Pipeline
// ============================================================================

/// A chain of specialized stages mapping destination spans to source
/// pixels and on into destination memory.
#[repr(align(16))]
pub struct LinearBitmapPipeline<'a> {
    first: StageId,
    last: StageId,
    matrix_stage: MatrixStage,
    tile_stage: TileStage,
    sample_stage: SampleStage,
    blender_stage: BlenderStage,
    accessor: Accessor<'a>,
    key: SamplingKey,
    paint_color: Color,
}

impl<'a> LinearBitmapPipeline<'a> {
    fn empty(key: SamplingKey, paint_color: Color) -> Self {
        Self {
            first: StageId::Tile,
            last: StageId::Blender,
            matrix_stage: Stage::new(),
            tile_stage: Stage::new(),
            sample_stage: Stage::new(),
            blender_stage: Stage::new(),
            accessor: PolyMemory::new(),
            key,
            paint_color,
        }
    }

    /// Assemble a shading pipeline.
    ///
    /// `inverse` maps device space to source space. `paint_color` tints
    /// alpha-only sources and its alpha scales every output pixel.
    /// Every combination of inputs yields a drivable pipeline.
    #[tracing::instrument(level = "debug", skip(inverse, src))]
    pub fn new(
        inverse: &Matrix,
        filter_quality: FilterQuality,
        x_tile: TileMode,
        y_tile: TileMode,
        paint_color: Color,
        src: &Pixmap<'a>,
    ) -> Self {
        let key = SamplingKey {
            matrix_mask: inverse.type_mask(),
            x_tile,
            y_tile,
            filter_quality,
        };
        let mut p = Self::empty(key, paint_color);

        let post_alpha = paint_color.alpha_f();
        let premultiply = src.info().alpha_type() == AlphaType::Unpremul;
        p.blender_stage
            .init_sink(ShadeBlender::new(post_alpha, premultiply));

        choose_accessor(&mut p.accessor, src, paint_color);
        choose_sampler(&mut p.sample_stage, filter_quality);
        choose_tiler(&mut p.tile_stage, src, x_tile, y_tile, filter_quality);

        let adjusted = adjust_for_nearest(inverse, filter_quality);
        p.first = if init_matrix_stage(&mut p.matrix_stage, StageId::Tile, &adjusted) {
            StageId::Matrix
        } else {
            StageId::Tile
        };
        p.last = StageId::Blender;

        tracing::debug!(first = ?p.first, color_type = ?src.info().color_type(), "assembled pipeline");
        p
    }

    /// Respecialize `pipeline` for blitting into `dst_info` with `blend_mode`.
    ///
    /// The matrix, tile and sample stages are cloned from `pipeline`; the
    /// accessor is rebuilt over `src` and a new blender is chosen for the
    /// destination. `matrix_mask`, the tile modes and `filter_quality` must
    /// be the ones `pipeline` was assembled with.
    ///
    /// `final_alpha` is the only alpha applied on this path. The paint
    /// color is kept for tinting `Alpha8` sources, but its alpha is not
    /// reapplied, so callers pass the paint alpha as `final_alpha`.
    ///
    /// Fails with [`PipelineError::UnsupportedBlit`] when no blender covers
    /// the destination format and blend mode or the destination is
    /// unpremultiplied, and with
    /// [`PipelineError::StorageOccupied`] when `storage` already holds a
    /// pipeline. `storage` is left untouched on failure.
    #[allow(clippy::too_many_arguments)]
    #[tracing::instrument(level = "debug", skip(storage, pipeline, src, dst_info))]
    pub fn clone_pipeline_for_blitting(
        storage: &mut EmbeddableLinearPipeline<'a>,
        pipeline: &LinearBitmapPipeline<'_>,
        matrix_mask: TypeMask,
        x_tile: TileMode,
        y_tile: TileMode,
        filter_quality: FilterQuality,
        src: &Pixmap<'a>,
        final_alpha: f32,
        blend_mode: BlendMode,
        dst_info: &ImageInfo,
    ) -> PipelineResult<()> {
        if storage.is_initialized() {
            return Err(PipelineError::StorageOccupied);
        }
        let key = SamplingKey {
            matrix_mask,
            x_tile,
            y_tile,
            filter_quality,
        };
        debug_assert_eq!(key, pipeline.key, "respecialization must echo the sampling key");
        if key != pipeline.key {
            tracing::debug!(requested = ?key, built = ?pipeline.key, "sampling key mismatch");
        }

        let blend_mode = blend_mode.normalized(src.info().is_opaque(), final_alpha);
        let cloned = Self::for_blitting(pipeline, key, src, final_alpha, blend_mode, dst_info)
            .map_err(|e| {
                tracing::trace!(error = %e, "no specialized blit");
                e
            })?;
        storage.init(cloned)?;
        Ok(())
    }

    fn for_blitting(
        pipeline: &LinearBitmapPipeline<'_>,
        key: SamplingKey,
        src: &Pixmap<'a>,
        final_alpha: f32,
        blend_mode: BlendMode,
        dst_info: &ImageInfo,
    ) -> PipelineResult<Self> {
        let unit_copy = key.matrix_mask.is_translate_only()
            && key.filter_quality.is_nearest()
            && final_alpha == 1.0
            && blend_mode == BlendMode::Src
            && src.info().color_type().is_8888()
            && dst_info.alpha_type() != AlphaType::Unpremul
            && same_encoding(src.info(), dst_info);

        let mut p = Self::empty(key, pipeline.paint_color);
        if unit_copy {
            p.sample_stage
                .init_sink(UnitCopySampler::new(dst_info.bytes_per_pixel()));
            p.last = StageId::Sampler;
        } else {
            let blender =
                BlitBlender::select(blend_mode, dst_info, src.info().alpha_type(), final_alpha)?;
            p.blender_stage.init_sink(blender);
            if pipeline
                .sample_stage
                .clone_stage_to(StageId::Blender, &mut p.sample_stage)
                .is_none()
            {
                choose_sampler(&mut p.sample_stage, key.filter_quality);
            }
            p.last = StageId::Blender;
        }

        choose_accessor(&mut p.accessor, src, pipeline.paint_color);
        if pipeline
            .tile_stage
            .clone_stage_to(StageId::Sampler, &mut p.tile_stage)
            .is_none()
        {
            choose_tiler(&mut p.tile_stage, src, key.x_tile, key.y_tile, key.filter_quality);
        }
        p.first = match pipeline.first {
            StageId::Matrix => {
                pipeline
                    .matrix_stage
                    .clone_stage_to(StageId::Tile, &mut p.matrix_stage);
                StageId::Matrix
            }
            _ => StageId::Tile,
        };

        tracing::debug!(?blend_mode, unit_copy, "respecialized pipeline for blitting");
        Ok(p)
    }

    pub fn sampling_key(&self) -> SamplingKey {
        self.key
    }

    /// The stage a span enters through.
    pub fn first(&self) -> StageId {
        self.first
    }

    /// The stage that writes the destination.
    pub fn last(&self) -> StageId {
        self.last
    }

    pub fn matrix_stage(&self) -> &MatrixStage {
        &self.matrix_stage
    }

    pub fn tile_stage(&self) -> &TileStage {
        &self.tile_stage
    }

    pub fn sample_stage(&self) -> &SampleStage {
        &self.sample_stage
    }

    pub fn blender_stage(&self) -> &BlenderStage {
        &self.blender_stage
    }

    // ========================================================================
    // Span drivers
    // ========================================================================

    /// Shade `count` pixels of row `y` starting at column `x` into `dst`
    /// as unblended linear premultiplied color.
    pub fn shade_span_4f(&self, x: i32, y: i32, dst: &mut [Pm4f], count: usize) {
        self.blit_span(x, y, bytemuck::cast_slice_mut(dst), count);
    }

    /// Drive `count` pixels of row `y` starting at column `x` through the
    /// chain. The terminal stage writes `dst` in its own encoding.
    ///
    /// `dst` must hold `count` destination pixels.
    pub fn blit_span(&self, x: i32, y: i32, dst: &mut [u8], count: usize) {
        if count == 0 {
            return;
        }
        let span = Span::new(
            Point::new(x as f32 + 0.5, y as f32 + 0.5),
            (count - 1) as f32,
            count,
        );
        let accessor = self.accessor.get();

        if self.last == StageId::Sampler {
            let Some(sink) = self.sample_stage.get_interface::<dyn DestinationStrategy>() else {
                unreachable!("terminal sampler without a destination");
            };
            let mut tail = SinkBinding::new(sink, accessor);
            tail.set_destination(dst, count);
            self.drive_front(&mut tail, span);
            debug_assert_eq!(tail.written(), count);
        } else {
            let mut blend = BlendBinding::new(self.blender_stage.get());
            blend.set_destination(dst, count);
            {
                let mut sampler = SamplerBinding::new(self.sample_stage.get(), accessor, &mut blend);
                self.drive_front(&mut sampler, span);
            }
            debug_assert_eq!(blend.written(), count);
        }
    }

    /// Feed `span` through the matrix and tile stages into `sampler`.
    fn drive_front(&self, sampler: &mut dyn SampleProcessor, span: Span) {
        debug_assert_eq!(self.tile_stage.next(), Some(StageId::Sampler));
        let mut tiler = TileBinding::new(self.tile_stage.get(), sampler);
        match self.first {
            StageId::Matrix => {
                MatrixBinding::new(self.matrix_stage.get(), &mut tiler).point_span(span);
            }
            _ => tiler.point_span(span),
        }
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Nudge the translation of a non-negative scale one ULP toward its floor,
/// so pixel centers landing exactly on a texel edge pick the lower texel.
fn adjust_for_nearest(inverse: &Matrix, filter_quality: FilterQuality) -> Matrix {
    let mut m = *inverse;
    if filter_quality.is_nearest() && !m.has_perspective() {
        if m.sx >= 0.0 {
            m.tx = next_toward(m.tx, m.tx.floor());
        }
        if m.sy >= 0.0 {
            m.ty = next_toward(m.ty, m.ty.floor());
        }
    }
    m
}

fn choose_accessor<'a>(accessor: &mut Accessor<'a>, src: &Pixmap<'a>, paint_color: Color) {
    let pixmap = *src;
    match src.info().color_type() {
        ColorType::Alpha8 => accessor.init(TintedAlphaAccessor::new(pixmap, paint_color)),
        ColorType::Gray8 => accessor.init(FormatAccessor::<formats::Gray8>::new(pixmap)),
        ColorType::Rgb565 => accessor.init(FormatAccessor::<formats::Rgb565>::new(pixmap)),
        ColorType::Argb4444 => accessor.init(FormatAccessor::<formats::Argb4444>::new(pixmap)),
        ColorType::Rgba8888 => accessor.init(FormatAccessor::<formats::Rgba8888>::new(pixmap)),
        ColorType::Bgra8888 => accessor.init(FormatAccessor::<formats::Bgra8888>::new(pixmap)),
        ColorType::RgbaF16 => accessor.init(FormatAccessor::<formats::RgbaF16>::new(pixmap)),
    }
}

fn choose_sampler(stage: &mut SampleStage, filter_quality: FilterQuality) {
    if filter_quality.is_nearest() {
        stage.init_stage(StageId::Blender, NearestNeighborSampler);
    } else {
        stage.init_stage(StageId::Blender, BilerpSampler);
    }
}

fn choose_tiler(
    stage: &mut TileStage,
    src: &Pixmap<'_>,
    x_tile: TileMode,
    y_tile: TileMode,
    filter_quality: FilterQuality,
) {
    let x = TileAxis::new(x_tile, src.width());
    let y = TileAxis::new(y_tile, src.height());
    if filter_quality.is_nearest() {
        stage.init_stage(StageId::Sampler, NearestTile::new(x, y));
    } else {
        stage.init_stage(StageId::Sampler, BilerpTile::new(x, y));
    }
}

/// Source bytes can be copied verbatim into the destination.
fn same_encoding(src: &ImageInfo, dst: &ImageInfo) -> bool {
    src.color_type() == dst.color_type()
        && src.alpha_type() == dst.alpha_type()
        && src.gamma() == dst.gamma()
}

// ============================================================================
// Tests
// ============================================================================
