//! Single-initialization storage for a pipeline inside a larger object.
//!
//! The cell is as aligned as the pipeline it holds, wherever the owner
//! places it. Dropping the cell drops the pipeline only if one was stored.

use std::ops::{Deref, DerefMut};

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::LinearBitmapPipeline;

/// Holds at most one [`LinearBitmapPipeline`], set once.
#[derive(Default)]
pub struct EmbeddableLinearPipeline<'a> {
    pipeline: Option<LinearBitmapPipeline<'a>>,
}

impl<'a> EmbeddableLinearPipeline<'a> {
    pub const fn new() -> Self {
        Self { pipeline: None }
    }

    /// Store `pipeline`. Fails if the cell is already occupied.
    pub fn init(
        &mut self,
        pipeline: LinearBitmapPipeline<'a>,
    ) -> PipelineResult<&mut LinearBitmapPipeline<'a>> {
        if self.pipeline.is_some() {
            return Err(PipelineError::StorageOccupied);
        }
        Ok(self.pipeline.insert(pipeline))
    }

    pub fn is_initialized(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn get(&self) -> Option<&LinearBitmapPipeline<'a>> {
        self.pipeline.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut LinearBitmapPipeline<'a>> {
        self.pipeline.as_mut()
    }
}

impl<'a> Deref for EmbeddableLinearPipeline<'a> {
    type Target = LinearBitmapPipeline<'a>;

    /// Panics if the cell is empty.
    fn deref(&self) -> &Self::Target {
        match &self.pipeline {
            Some(p) => p,
            None => panic!("EmbeddableLinearPipeline accessed before init"),
        }
    }
}

impl DerefMut for EmbeddableLinearPipeline<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.pipeline {
            Some(p) => p,
            None => panic!("EmbeddableLinearPipeline accessed before init"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
