use pageprep_core::{alloc_pixels, GrayBuffer, PrepError, Result};

/// Reduce an RGBA8 buffer to one luminance byte per pixel (BT.601 integer
/// weights). Alpha is ignored.
pub fn reduce_rgba(data: &[u8], width: u32, height: u32) -> Result<GrayBuffer> {
    if width == 0 || height == 0 {
        return Err(PrepError::InvalidDimensions { width, height });
    }
    let n = width as usize * height as usize;
    if data.len() != n * 4 {
        return Err(PrepError::InvalidDimensions { width, height });
    }

    let mut gray = alloc_pixels(n)?;
    for (i, out) in gray.iter_mut().enumerate() {
        let r = data[i * 4] as u32;
        let g = data[i * 4 + 1] as u32;
        let b = data[i * 4 + 2] as u32;
        *out = ((r * 77 + g * 150 + b * 29) >> 8) as u8;
    }

    Ok(GrayBuffer {
        width,
        height,
        data: gray,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_maps_to_white() {
        let gray = reduce_rgba(&[255, 255, 255, 255], 1, 1).unwrap();
        assert_eq!(gray.data, vec![255]);
    }

    #[test]
    fn black_maps_to_black() {
        let gray = reduce_rgba(&[0, 0, 0, 255], 1, 1).unwrap();
        assert_eq!(gray.data, vec![0]);
    }

    #[test]
    fn green_dominates_luma() {
        let g = reduce_rgba(&[0, 255, 0, 255], 1, 1).unwrap().data[0];
        let r = reduce_rgba(&[255, 0, 0, 255], 1, 1).unwrap().data[0];
        let b = reduce_rgba(&[0, 0, 255, 255], 1, 1).unwrap().data[0];
        assert!(g > r && r > b);
    }

    #[test]
    fn mismatched_buffer_rejected() {
        assert!(reduce_rgba(&[0u8; 5], 1, 1).is_err());
    }
}
