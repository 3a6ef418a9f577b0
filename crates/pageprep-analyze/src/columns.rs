use pageprep_core::GrayBuffer;

use crate::config::AnalyzerConfig;
use crate::profile::column_dark_counts;

/// Detect at most one column gutter from the column projection profile.
///
/// Only the central `[gutter_search_lo, gutter_search_hi)` slice of the
/// width is searched: the layout model assumes single- or two-column pages,
/// so a gutter can only sit near the middle. The minimum of a
/// `gutter_window`-column moving average is taken as the candidate; it is
/// reported (as the window's center column) only when its density is below
/// `gutter_density_fraction` of the image height.
pub fn detect_column_split(gray: &GrayBuffer, config: &AnalyzerConfig) -> Option<u32> {
    let w = gray.width as usize;
    let counts = column_dark_counts(gray, config.dark_luma);

    let lo = (w as f32 * config.gutter_search_lo) as usize;
    let hi = (w as f32 * config.gutter_search_hi) as usize;
    let window = config.gutter_window;
    if hi <= lo || hi - lo < window {
        return None;
    }

    let averages: Vec<f32> = (lo..=(hi - window))
        .map(|x| {
            let sum: u32 = counts[x..x + window].iter().sum();
            sum as f32 / window as f32
        })
        .collect();

    let best_avg = averages.iter().copied().fold(f32::MAX, f32::min);

    // A blank gutter yields a run of windows at the same minimum; take the
    // run's midpoint so the split lands at the gutter center rather than
    // its left edge.
    let first = averages.iter().position(|&a| a == best_avg).unwrap_or(0);
    let last = averages.iter().rposition(|&a| a == best_avg).unwrap_or(0);
    let best_center = lo + (first + last) / 2 + window / 2;

    let max_density = gray.height as f32 * config.gutter_density_fraction;
    if best_avg < max_density {
        tracing::debug!(
            split = best_center,
            density = best_avg,
            "column gutter detected"
        );
        Some(best_center as u32)
    } else {
        tracing::debug!(density = best_avg, "no column gutter below density bound");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Page with every row dark across the full width except a blank
    /// vertical gutter `gutter` (half-open column range).
    fn page(width: u32, height: u32, gutter: Option<std::ops::Range<usize>>) -> GrayBuffer {
        let w = width as usize;
        let mut data = vec![0u8; w * height as usize];
        if let Some(g) = gutter {
            for y in 0..height as usize {
                data[y * w + g.start..y * w + g.end].fill(255);
            }
        }
        GrayBuffer {
            width,
            height,
            data,
        }
    }

    #[test]
    fn uniform_single_column_page_has_no_split() {
        let gray = page(800, 1000, None);
        assert_eq!(detect_column_split(&gray, &AnalyzerConfig::default()), None);
    }

    #[test]
    fn centered_gutter_reported_near_center() {
        // 40px blank gutter centered at x=400 on an 800x1000 page.
        let gray = page(800, 1000, Some(380..420));
        let split = detect_column_split(&gray, &AnalyzerConfig::default())
            .expect("gutter should be detected");
        assert!(
            split.abs_diff(400) <= 3,
            "split {split} should sit at the gutter center"
        );
    }

    #[test]
    fn gutter_outside_search_window_ignored() {
        // Blank gutter at 10% of width — outside [35%, 65%).
        let gray = page(800, 1000, Some(60..100));
        assert_eq!(detect_column_split(&gray, &AnalyzerConfig::default()), None);
    }

    #[test]
    fn dense_gutter_above_bound_rejected() {
        // A "gutter" that still carries ink on 5% of rows is too dense.
        let mut gray = page(800, 1000, Some(380..420));
        for y in (0..1000).step_by(20) {
            let w = 800;
            gray.data[y * w + 380..y * w + 420].fill(0);
        }
        assert_eq!(detect_column_split(&gray, &AnalyzerConfig::default()), None);
    }

    #[test]
    fn narrow_image_returns_none() {
        let gray = page(10, 10, None);
        assert_eq!(detect_column_split(&gray, &AnalyzerConfig::default()), None);
    }
}
