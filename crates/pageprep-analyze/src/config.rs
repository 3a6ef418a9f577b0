use serde::{Deserialize, Serialize};

/// Tuning for structural analysis.
///
/// The defaults are empirical; they hold across typical 150–600 dpi scans
/// and should not be changed without new evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Pixels with luminance below this count as "dark" in projection
    /// profiles.
    pub dark_luma: u8,
    /// A row is in a text band when its dark-pixel count exceeds this
    /// fraction of the image width.
    pub row_ink_fraction: f32,
    /// Bands shorter than this many rows are discarded as noise.
    pub min_band_rows: usize,
    /// Column-gutter search window, as fractions of image width.
    /// The search covers `[lo * width, hi * width)`.
    pub gutter_search_lo: f32,
    pub gutter_search_hi: f32,
    /// Width of the moving-average window over column densities.
    pub gutter_window: usize,
    /// A gutter is reported only when its windowed dark density is below
    /// this fraction of the image height.
    pub gutter_density_fraction: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            dark_luma: 128,
            row_ink_fraction: 0.01,
            min_band_rows: 10,
            gutter_search_lo: 0.35,
            gutter_search_hi: 0.65,
            gutter_window: 5,
            gutter_density_fraction: 0.02,
        }
    }
}
