use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use pageprep_core::PageBitmap;

/// Which cleanup passes run after binarization.
///
/// The two variants are deliberate, named configurations — not
/// interchangeable defaults. The accelerated path runs `SpeckleOnly`
/// (erosion); the CPU fallback path runs `SpeckleAndConsolidate`
/// (erosion followed by dilation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CleanupVariant {
    /// Erosion only: speckle noise removal.
    SpeckleOnly,
    /// Erosion, then dilation: speckle removal plus stroke consolidation.
    SpeckleAndConsolidate,
}

/// Run the morphological cleanup passes on a binarized page in place.
///
/// Each pass reads a snapshot of the pre-pass buffer, so writes never
/// influence neighbor reads within the same pass. Rows are independent
/// against the snapshot and processed in parallel.
pub fn clean(image: &mut PageBitmap, variant: CleanupVariant) {
    let width = image.width as usize;
    let height = image.height as usize;

    erode(&mut image.data, width, height);
    if variant == CleanupVariant::SpeckleAndConsolidate {
        dilate(&mut image.data, width, height);
    }

    tracing::debug!(?variant, "morphological cleanup");
}

/// Erosion pass: a black pixel with more than 6 of its 8 neighbors white
/// flips to white. Border pixels count only in-bounds neighbors, so they
/// can never reach 7 white neighbors and are left unchanged.
fn erode(data: &mut [u8], width: usize, height: usize) {
    let snapshot = data.to_vec();
    data.par_chunks_exact_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                if row[x * 4] != 0 {
                    continue;
                }
                if count_neighbors(&snapshot, width, height, x, y, 255) > 6 {
                    row[x * 4] = 255;
                    row[x * 4 + 1] = 255;
                    row[x * 4 + 2] = 255;
                }
            }
        });
}

/// Dilation pass: a white pixel with more than 3 of its 8 neighbors black
/// flips to black.
fn dilate(data: &mut [u8], width: usize, height: usize) {
    let snapshot = data.to_vec();
    data.par_chunks_exact_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                if row[x * 4] != 255 {
                    continue;
                }
                if count_neighbors(&snapshot, width, height, x, y, 0) > 3 {
                    row[x * 4] = 0;
                    row[x * 4 + 1] = 0;
                    row[x * 4 + 2] = 0;
                }
            }
        });
}

/// Count the 8-connected in-bounds neighbors of (x, y) whose red channel
/// equals `value` (the buffer is binary, so one channel suffices).
fn count_neighbors(
    snapshot: &[u8],
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    value: u8,
) -> u32 {
    let mut count = 0;
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                continue;
            }
            if snapshot[(ny as usize * width + nx as usize) * 4] == value {
                count += 1;
            }
        }
    }
    count
}
