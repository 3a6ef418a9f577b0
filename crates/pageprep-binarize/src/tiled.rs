use rayon::prelude::*;

use pageprep_core::{alloc_pixels, GrayBuffer, PageBitmap, Result, TextBand};

use crate::config::BinarizeConfig;
use crate::otsu::otsu_threshold;

/// Per-tile binarization decision: the local Otsu threshold and whether
/// the tile's polarity is inverted (light text on dark background).
#[derive(Debug, Clone, Copy, Default)]
pub struct TilePlan {
    pub threshold: u8,
    pub invert: bool,
}

/// The fixed grid of tiles over one page, with each tile's plan.
///
/// Tile dimensions are `floor(dim / grid)`; the last tile row/column
/// absorbs the remainder, so the grid partitions the image exactly — no
/// gaps, no overlap.
#[derive(Debug)]
pub struct TileGrid {
    grid: usize,
    tile_w: usize,
    tile_h: usize,
    width: usize,
    height: usize,
    plans: Vec<TilePlan>,
}

impl TileGrid {
    /// Plan pass: per-tile histogram, Otsu threshold, and inversion flag.
    ///
    /// Tiles are statistically independent, so they are planned in
    /// parallel.
    pub fn plan(gray: &GrayBuffer, config: &BinarizeConfig) -> Self {
        let grid = config.grid;
        let width = gray.width as usize;
        let height = gray.height as usize;
        let tile_w = width / grid;
        let tile_h = height / grid;

        let plans: Vec<TilePlan> = (0..grid * grid)
            .into_par_iter()
            .map(|idx| {
                let (tx, ty) = (idx % grid, idx / grid);
                let (x0, x1) = span(tx, tile_w, width, grid);
                let (y0, y1) = span(ty, tile_h, height, grid);

                let mut histogram = [0u64; 256];
                for y in y0..y1 {
                    for &p in &gray.data[y * width + x0..y * width + x1] {
                        histogram[p as usize] += 1;
                    }
                }

                let threshold = otsu_threshold(&histogram);

                // The threshold bin belongs to the dark class, so the dark
                // fraction is the histogram mass at or below it.
                let total: u64 = histogram.iter().sum();
                let dark: u64 = histogram[..=threshold as usize].iter().sum();
                let invert = total > 0
                    && dark as f32 / total as f32 > config.invert_dark_ratio;

                TilePlan { threshold, invert }
            })
            .collect();

        Self {
            grid,
            tile_w,
            tile_h,
            width,
            height,
            plans,
        }
    }

    /// The plan governing pixel (x, y).
    pub fn plan_at(&self, x: usize, y: usize) -> TilePlan {
        let tx = index_for(x, self.tile_w, self.grid);
        let ty = index_for(y, self.tile_h, self.grid);
        self.plans[ty * self.grid + tx]
    }

    pub fn plans(&self) -> &[TilePlan] {
        &self.plans
    }

    /// Pixel bounds of tile (tx, ty): `(x0, x1, y0, y1)`, half-open.
    pub fn tile_bounds(&self, tx: usize, ty: usize) -> (usize, usize, usize, usize) {
        let (x0, x1) = span(tx, self.tile_w, self.width, self.grid);
        let (y0, y1) = span(ty, self.tile_h, self.height, self.grid);
        (x0, x1, y0, y1)
    }

    pub fn grid(&self) -> usize {
        self.grid
    }
}

/// Half-open pixel span of tile `t` along one axis.
fn span(t: usize, tile_dim: usize, dim: usize, grid: usize) -> (usize, usize) {
    let start = t * tile_dim;
    let end = if t + 1 == grid { dim } else { (t + 1) * tile_dim };
    (start.min(dim), end)
}

/// Tile index owning pixel coordinate `c` (remainder pixels belong to the
/// last tile).
fn index_for(c: usize, tile_dim: usize, grid: usize) -> usize {
    if tile_dim == 0 {
        return grid - 1;
    }
    (c / tile_dim).min(grid - 1)
}

/// Apply pass: binarize the page against the tile grid, band-aware.
///
/// Pixels on rows inside a text band compare against the tile's threshold;
/// rows outside any band use the relaxed `out_of_band_relax * t`, pushing
/// ambiguous inter-line whitespace toward white. Pixels at or below the
/// effective threshold become black, the rest white; tiles flagged for
/// inversion swap the two. Output rows are independent and processed in
/// parallel.
pub fn binarize(
    gray: &GrayBuffer,
    bands: &[TextBand],
    config: &BinarizeConfig,
) -> Result<PageBitmap> {
    let width = gray.width as usize;
    let height = gray.height as usize;

    let tiles = TileGrid::plan(gray, config);

    let mut in_band = vec![false; height];
    for band in bands {
        for flag in &mut in_band[band.start..band.end.min(height)] {
            *flag = true;
        }
    }

    let mut out = alloc_pixels(width * height * 4)?;
    out.par_chunks_exact_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let src = gray.row(y);
            for x in 0..width {
                let plan = tiles.plan_at(x, y);
                let threshold = if in_band[y] {
                    plan.threshold as f32
                } else {
                    plan.threshold as f32 * config.out_of_band_relax
                };
                let mut black = src[x] as f32 <= threshold;
                if plan.invert {
                    black = !black;
                }
                let v = if black { 0 } else { 255 };
                row[x * 4] = v;
                row[x * 4 + 1] = v;
                row[x * 4 + 2] = v;
                row[x * 4 + 3] = 255;
            }
        });

    let inverted = tiles.plans().iter().filter(|p| p.invert).count();
    tracing::debug!(
        grid = tiles.grid(),
        inverted_tiles = inverted,
        "tiled binarization"
    );

    PageBitmap::new(gray.width, gray.height, out)
}
