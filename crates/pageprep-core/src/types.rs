use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// An owned RGBA8 page image.
///
/// Ownership of the pixel buffer transfers with the value: moving a
/// `PageBitmap` into the pipeline hands over the buffer, and it is dropped
/// as soon as its pixels have been copied into working storage — on
/// success and failure paths alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBitmap {
    pub width: u32,
    pub height: u32,
    /// RGBA8, row-major, top-left origin; `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl PageBitmap {
    /// Wrap an RGBA8 buffer, validating dimensions before anything else
    /// touches the data.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PrepError::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(PrepError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// One luminance byte per pixel; derived from a bitmap, transient.
#[derive(Debug, Clone)]
pub struct GrayBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl GrayBuffer {
    pub fn row(&self, y: usize) -> &[u8] {
        let w = self.width as usize;
        &self.data[y * w..(y + 1) * w]
    }
}

/// A horizontal band of rows containing text, as a half-open row range.
///
/// Bands produced by the analyzer are ordered by `start`, non-overlapping,
/// and at least `min_band_rows` tall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBand {
    pub start: usize,
    pub end: usize,
}

impl TextBand {
    pub fn rows(&self) -> usize {
        self.end - self.start
    }

    pub fn contains_row(&self, y: usize) -> bool {
        y >= self.start && y < self.end
    }
}

/// Wall-clock stage timings for one page invocation, in milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageTiming {
    pub filter_ms: f32,
    pub grayscale_ms: f32,
    pub analyze_ms: f32,
    pub binarize_ms: f32,
    pub cleanup_ms: f32,
    pub total_ms: f32,
}

/// One page handed to the pipeline.
///
/// `page_number` is an opaque correlation id echoed back in the response;
/// the pipeline never interprets it.
#[derive(Debug)]
pub struct PageRequest {
    pub bitmap: PageBitmap,
    pub page_number: u64,
}

/// Outcome of one page invocation.
///
/// The input bitmap is consumed whatever the outcome; on success the
/// processed bitmap's ownership passes to the caller. There is never a
/// partial result — a complete binarized page plus metadata, or a failure.
#[derive(Debug)]
pub enum PageResponse {
    Success {
        page_number: u64,
        processed: PageBitmap,
        /// Zero or one gutter x-coordinates (single- or two-column model).
        column_splits: Vec<u32>,
        timing: StageTiming,
    },
    Failure {
        page_number: u64,
        error: String,
    },
}

impl PageResponse {
    pub fn page_number(&self) -> u64 {
        match self {
            PageResponse::Success { page_number, .. } => *page_number,
            PageResponse::Failure { page_number, .. } => *page_number,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PageResponse::Success { .. })
    }
}

/// Allocate a zeroed page-sized buffer, surfacing allocation failure as an
/// error instead of aborting the process.
pub fn alloc_pixels(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|e| PrepError::OutOfMemory(format!("{len} bytes: {e}")))?;
    buf.resize(len, 0);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_rejects_zero_dimensions() {
        assert!(matches!(
            PageBitmap::new(0, 10, vec![]),
            Err(PrepError::InvalidDimensions { width: 0, height: 10 })
        ));
        assert!(matches!(
            PageBitmap::new(10, 0, vec![]),
            Err(PrepError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn bitmap_rejects_short_buffer() {
        let result = PageBitmap::new(4, 4, vec![0u8; 4 * 4 * 4 - 1]);
        assert!(matches!(result, Err(PrepError::InvalidDimensions { .. })));
    }

    #[test]
    fn bitmap_accepts_exact_buffer() {
        let bmp = PageBitmap::new(4, 3, vec![0u8; 4 * 3 * 4]).unwrap();
        assert_eq!(bmp.pixel_count(), 12);
    }

    #[test]
    fn band_contains_half_open() {
        let band = TextBand { start: 10, end: 30 };
        assert!(band.contains_row(10));
        assert!(band.contains_row(29));
        assert!(!band.contains_row(30));
        assert_eq!(band.rows(), 20);
    }
}
