//! # linear-pipeline
//!
//! Allocation-free bitmap sampling and compositing in linear floating point
//! color.
//!
//! A [`LinearBitmapPipeline`] is assembled once per shader draw from an
//! inverse transform, a filter quality, per-axis tile modes, a paint color
//! and a source pixmap. Each stage is picked from a closed set of
//! specialized variants and stored inline in a fixed-capacity slot, so the
//! per-pixel path makes no allocations and no per-pixel decisions beyond
//! one indirect call per stage.
//!
//! ## Architecture
//!
//! Spans of destination pixels flow through five stages:
//!
//! 1. **Matrix** maps device pixel centers into source space
//! 2. **Tile** applies clamp, repeat or mirror per axis
//! 3. **Sample** fetches texels through the **Accessor** and filters them
//! 4. **Blend** composites into the destination (or stores unblended color)
//! 5. **Destination** receives the encoded pixels
//!
//! A shading pipeline can be respecialized for blitting with
//! [`LinearBitmapPipeline::clone_pipeline_for_blitting`], which clones the
//! sampling stages and builds a new blender for a destination format and
//! blend mode.

// Foundation
pub mod basics;
pub mod color;
pub mod error;
pub mod gamma;
pub mod matrix;
pub mod pixmap;
pub mod span;

// Slot machinery
pub mod poly_memory;
pub mod processor;
pub mod stage;

// Stage variants
pub mod blend_mode;
pub mod blender;
pub mod matrix_stage;
pub mod pixel_accessor;
pub mod sampler;
pub mod tile_stage;

// Assembly
pub mod embeddable;
pub mod pipeline;

pub use blend_mode::BlendMode;
pub use color::{Color, Pm4f};
pub use embeddable::EmbeddableLinearPipeline;
pub use error::{PipelineError, PipelineResult};
pub use gamma::GammaType;
pub use matrix::{Matrix, TypeMask};
pub use pipeline::{LinearBitmapPipeline, SamplingKey, StageId};
pub use pixmap::{AlphaType, ColorType, ImageInfo, Pixmap};
pub use sampler::FilterQuality;
pub use tile_stage::TileMode;
