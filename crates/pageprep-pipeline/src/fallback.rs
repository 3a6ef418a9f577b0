use rayon::prelude::*;

use pageprep_core::{alloc_pixels, PrepError, Result};

/// Scalar 3x3 sharpen for the CPU fallback path: kernel center 5, four
/// orthogonal neighbors -1, applied per RGB channel and clamped to
/// [0, 255].
///
/// Out-of-bounds taps at the image edges are simply skipped — no kernel
/// weight renormalization — so edge pixels accumulate fewer negative
/// taps. Alpha passes through unchanged. Rows are independent and run in
/// parallel.
pub fn sharpen_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(PrepError::InvalidDimensions { width, height });
    }
    let w = width as usize;
    let h = height as usize;
    if data.len() != w * h * 4 {
        return Err(PrepError::InvalidDimensions { width, height });
    }

    let mut out = alloc_pixels(w * h * 4)?;
    out.par_chunks_exact_mut(w * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w {
                let at = |px: usize, py: usize, ch: usize| data[(py * w + px) * 4 + ch] as i32;
                for ch in 0..3 {
                    let mut acc = 5 * at(x, y, ch);
                    if x > 0 {
                        acc -= at(x - 1, y, ch);
                    }
                    if x + 1 < w {
                        acc -= at(x + 1, y, ch);
                    }
                    if y > 0 {
                        acc -= at(x, y - 1, ch);
                    }
                    if y + 1 < h {
                        acc -= at(x, y + 1, ch);
                    }
                    row[x * 4 + ch] = acc.clamp(0, 255) as u8;
                }
                row[x * 4 + 3] = data[(y * w + x) * 4 + 3];
            }
        });

    Ok(out)
}
