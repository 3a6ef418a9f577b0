use pageprep_core::GrayBuffer;

/// Per-row count of pixels darker than `dark_luma`.
pub fn row_dark_counts(gray: &GrayBuffer, dark_luma: u8) -> Vec<u32> {
    let w = gray.width as usize;
    let h = gray.height as usize;
    let mut counts = vec![0u32; h];
    for (y, count) in counts.iter_mut().enumerate() {
        *count = gray.data[y * w..(y + 1) * w]
            .iter()
            .filter(|&&p| p < dark_luma)
            .count() as u32;
    }
    counts
}

/// Per-column count of pixels darker than `dark_luma`, over the full
/// image height.
pub fn column_dark_counts(gray: &GrayBuffer, dark_luma: u8) -> Vec<u32> {
    let w = gray.width as usize;
    let h = gray.height as usize;
    let mut counts = vec![0u32; w];
    for y in 0..h {
        let row = &gray.data[y * w..(y + 1) * w];
        for (x, &p) in row.iter().enumerate() {
            if p < dark_luma {
                counts[x] += 1;
            }
        }
    }
    counts
}
