/// Convert a framebuffer readback from bottom-left origin to top-left
/// raster order by swapping the top and bottom halves of the image
/// row-by-row.
///
/// Runs before any downstream stage touches the data. The middle row of
/// an odd-height image stays in place.
pub fn correct_origin(pixels: &mut [u8], width: u32, height: u32) {
    let row_bytes = width as usize * 4;
    let h = height as usize;
    debug_assert_eq!(pixels.len(), row_bytes * h);

    for y in 0..h / 2 {
        let top = y * row_bytes;
        let bottom = (h - 1 - y) * row_bytes;
        let (head, tail) = pixels.split_at_mut(bottom);
        head[top..top + row_bytes].swap_with_slice(&mut tail[..row_bytes]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(height: u32) -> Vec<u8> {
        // 2px-wide image where every byte of row y is y.
        (0..height as u8)
            .flat_map(|y| [y; 8])
            .collect()
    }

    #[test]
    fn even_height_fully_reverses_rows() {
        let mut pixels = rows(4);
        correct_origin(&mut pixels, 2, 4);
        assert_eq!(pixels, rows(4).chunks(8).rev().flatten().copied().collect::<Vec<_>>());
    }

    #[test]
    fn odd_height_keeps_middle_row() {
        let mut pixels = rows(5);
        correct_origin(&mut pixels, 2, 5);
        assert_eq!(&pixels[2 * 8..3 * 8], &[2u8; 8]);
        assert_eq!(&pixels[0..8], &[4u8; 8]);
        assert_eq!(&pixels[4 * 8..5 * 8], &[0u8; 8]);
    }

    #[test]
    fn correction_is_an_involution() {
        let original = rows(7);
        let mut pixels = original.clone();
        correct_origin(&mut pixels, 2, 7);
        correct_origin(&mut pixels, 2, 7);
        assert_eq!(pixels, original);
    }

    #[test]
    fn single_row_is_unchanged() {
        let original = vec![7u8; 8];
        let mut pixels = original.clone();
        correct_origin(&mut pixels, 2, 1);
        assert_eq!(pixels, original);
    }
}
