//! Shared fixtures for the pageprep benchmarks.

use pageprep_core::PageBitmap;

/// Synthetic two-column scan: 20 text rows alternating with 20 blank
/// rows, with a 5% blank gutter in the middle and 5% side margins.
pub fn synthetic_page(width: u32, height: u32) -> PageBitmap {
    let w = width as usize;
    let mut data = vec![255u8; w * height as usize * 4];
    let gutter = (w * 475 / 1000)..(w * 525 / 1000);
    let margin = w / 20;
    for y in 0..height as usize {
        if (y / 20) % 2 != 0 {
            continue;
        }
        for x in margin..w - margin {
            if gutter.contains(&x) {
                continue;
            }
            let i = (y * w + x) * 4;
            data[i] = 0;
            data[i + 1] = 0;
            data[i + 2] = 0;
        }
    }
    PageBitmap::new(width, height, data).expect("synthetic page is well-formed")
}
