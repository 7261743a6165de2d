//! Pixel formats, image descriptions and the borrowed pixel view.
//!
//! A [`Pixmap`] is a read-only window onto caller-owned memory: width,
//! height, stride and the format needed to decode it. Pipelines borrow it
//! for their whole lifetime and never copy pixels.

use crate::error::{PipelineError, PipelineResult};
use crate::gamma::GammaType;

// ============================================================================
// Color type
// ============================================================================

/// Memory layout of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorType {
    /// 8-bit coverage only.
    Alpha8,
    /// 8-bit luminance, opaque.
    Gray8,
    /// Little-endian 16-bit, red in the top five bits.
    Rgb565,
    /// Little-endian 16-bit, red in bits 12-15 and alpha in bits 0-3.
    Argb4444,
    /// Bytes R, G, B, A.
    #[default]
    Rgba8888,
    /// Bytes B, G, R, A.
    Bgra8888,
    /// Four little-endian half floats, always linear.
    RgbaF16,
}

impl ColorType {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            ColorType::Alpha8 | ColorType::Gray8 => 1,
            ColorType::Rgb565 | ColorType::Argb4444 => 2,
            ColorType::Rgba8888 | ColorType::Bgra8888 => 4,
            ColorType::RgbaF16 => 8,
        }
    }

    /// True for the two byte-per-channel four-channel layouts.
    pub const fn is_8888(self) -> bool {
        matches!(self, ColorType::Rgba8888 | ColorType::Bgra8888)
    }
}

/// How the color channels relate to alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlphaType {
    /// Every pixel is fully opaque.
    Opaque,
    /// Color channels are premultiplied by alpha.
    #[default]
    Premul,
    /// Color channels are independent of alpha.
    Unpremul,
}

// ============================================================================
// Image info
// ============================================================================

/// Dimensions plus format of a bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageInfo {
    width: i32,
    height: i32,
    color_type: ColorType,
    alpha_type: AlphaType,
    gamma: GammaType,
}

impl ImageInfo {
    pub const fn new(
        width: i32,
        height: i32,
        color_type: ColorType,
        alpha_type: AlphaType,
        gamma: GammaType,
    ) -> Self {
        Self {
            width,
            height,
            color_type,
            alpha_type,
            gamma,
        }
    }

    /// Premultiplied, linear.
    pub const fn new_premul(width: i32, height: i32, color_type: ColorType) -> Self {
        Self::new(width, height, color_type, AlphaType::Premul, GammaType::Linear)
    }

    pub const fn width(&self) -> i32 {
        self.width
    }

    pub const fn height(&self) -> i32 {
        self.height
    }

    pub const fn color_type(&self) -> ColorType {
        self.color_type
    }

    pub const fn alpha_type(&self) -> AlphaType {
        self.alpha_type
    }

    /// Channel encoding. Half-float pixels are always linear.
    pub const fn gamma(&self) -> GammaType {
        match self.color_type {
            ColorType::RgbaF16 => GammaType::Linear,
            _ => self.gamma,
        }
    }

    pub const fn with_gamma(self, gamma: GammaType) -> Self {
        Self { gamma, ..self }
    }

    pub const fn bytes_per_pixel(&self) -> usize {
        self.color_type.bytes_per_pixel()
    }

    /// Bytes needed for one tightly packed row.
    pub const fn min_row_bytes(&self) -> usize {
        self.width as usize * self.bytes_per_pixel()
    }

    pub const fn is_opaque(&self) -> bool {
        matches!(self.alpha_type, AlphaType::Opaque)
    }
}

// ============================================================================
// Pixmap
// ============================================================================

/// Borrowed, read-only pixel memory with a row stride.
#[derive(Debug, Clone, Copy)]
pub struct Pixmap<'a> {
    info: ImageInfo,
    pixels: &'a [u8],
    row_bytes: usize,
}

impl<'a> Pixmap<'a> {
    /// Wrap `pixels`, checking that every row fits.
    pub fn new(info: ImageInfo, pixels: &'a [u8], row_bytes: usize) -> PipelineResult<Self> {
        if info.width() <= 0 || info.height() <= 0 {
            return Err(PipelineError::invalid_pixmap(format!(
                "empty dimensions {}x{}",
                info.width(),
                info.height()
            )));
        }
        if row_bytes < info.min_row_bytes() {
            return Err(PipelineError::invalid_pixmap(format!(
                "row bytes {} below {}",
                row_bytes,
                info.min_row_bytes()
            )));
        }
        let needed = (info.height() as usize - 1) * row_bytes + info.min_row_bytes();
        if pixels.len() < needed {
            return Err(PipelineError::invalid_pixmap(format!(
                "buffer holds {} bytes, {} needed",
                pixels.len(),
                needed
            )));
        }
        Ok(Self {
            info,
            pixels,
            row_bytes,
        })
    }

    /// Wrap tightly packed pixels.
    pub fn new_packed(info: ImageInfo, pixels: &'a [u8]) -> PipelineResult<Self> {
        Self::new(info, pixels, info.min_row_bytes())
    }

    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    pub fn width(&self) -> i32 {
        self.info.width()
    }

    pub fn height(&self) -> i32 {
        self.info.height()
    }

    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    /// The pixel bytes of row `y`, without stride padding.
    ///
    /// Panics if `y` is outside the image.
    #[inline]
    pub fn row(&self, y: i32) -> &'a [u8] {
        assert!(
            y >= 0 && y < self.info.height(),
            "row {} outside 0..{}",
            y,
            self.info.height()
        );
        let start = y as usize * self.row_bytes;
        &self.pixels[start..start + self.info.min_row_bytes()]
    }
}

// ============================================================================
// Tests
// ============================================================================
