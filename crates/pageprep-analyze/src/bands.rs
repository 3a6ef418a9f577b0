use pageprep_core::{GrayBuffer, TextBand};

use crate::config::AnalyzerConfig;
use crate::profile::row_dark_counts;

/// Detect horizontal text bands from the row projection profile.
///
/// A row qualifies when its dark-pixel count exceeds `row_ink_fraction` of
/// the image width. A band closes on the first non-qualifying row; bands
/// shorter than `min_band_rows` are discarded as noise.
///
/// The returned bands are ordered by start row and non-overlapping.
pub fn detect_text_bands(gray: &GrayBuffer, config: &AnalyzerConfig) -> Vec<TextBand> {
    let counts = row_dark_counts(gray, config.dark_luma);
    let min_ink = (gray.width as f32 * config.row_ink_fraction) as u32;

    let mut bands = Vec::new();
    let mut open: Option<usize> = None;

    for (y, &count) in counts.iter().enumerate() {
        if count > min_ink {
            if open.is_none() {
                open = Some(y);
            }
        } else if let Some(start) = open.take() {
            if y - start >= config.min_band_rows {
                bands.push(TextBand { start, end: y });
            }
        }
    }

    // A band reaching the bottom edge closes at the image end.
    if let Some(start) = open {
        let end = counts.len();
        if end - start >= config.min_band_rows {
            bands.push(TextBand { start, end });
        }
    }

    tracing::debug!(
        bands = bands.len(),
        height = gray.height,
        "text band detection"
    );

    bands
}
