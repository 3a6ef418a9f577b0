use serde::{Deserialize, Serialize};

/// Tuning for tiled adaptive binarization.
///
/// The defaults are empirical; keep them unless new evidence says
/// otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinarizeConfig {
    /// Tiles per axis. Tile dimensions are `floor(dim / grid)`; the last
    /// row/column of tiles absorbs the remainder pixels.
    pub grid: usize,
    /// A tile whose fraction of pixels darker than its threshold exceeds
    /// this is flagged for polarity inversion (light text on dark
    /// background).
    pub invert_dark_ratio: f32,
    /// Threshold multiplier applied outside text bands, pushing ambiguous
    /// inter-line whitespace toward white.
    pub out_of_band_relax: f32,
}

impl Default for BinarizeConfig {
    fn default() -> Self {
        Self {
            grid: 8,
            invert_dark_ratio: 0.55,
            out_of_band_relax: 0.8,
        }
    }
}
