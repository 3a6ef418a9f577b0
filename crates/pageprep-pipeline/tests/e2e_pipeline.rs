//! End-to-end pipeline tests on synthetic scanned pages.
//!
//! All tests force the CPU path so they run identically with and without
//! a GPU present; the accelerated path shares every stage downstream of
//! the filter.

use pageprep_analyze::reduce_rgba;
use pageprep_binarize::{BinarizeConfig, TileGrid};
use pageprep_core::{PageBitmap, PageRequest, PageResponse};
use pageprep_pipeline::{PagePipeline, PipelineConfig};

const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

fn blank_page(width: u32, height: u32) -> PageBitmap {
    let mut data = vec![255u8; (width * height * 4) as usize];
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&WHITE);
    }
    PageBitmap::new(width, height, data).unwrap()
}

/// Paint text rows (20 dark, 20 blank, repeating) across the given column
/// ranges.
fn paint_text(page: &mut PageBitmap, columns: &[std::ops::Range<usize>]) {
    let w = page.width as usize;
    for y in 0..page.height as usize {
        if (y / 20) % 2 != 0 {
            continue;
        }
        for range in columns {
            for x in range.clone() {
                page.data[(y * w + x) * 4..(y * w + x) * 4 + 4].copy_from_slice(&BLACK);
            }
        }
    }
}

/// 800x1000 two-column page: text in [40, 380) and [420, 760), blank
/// 40px gutter centered at x=400.
fn two_column_page() -> PageBitmap {
    let mut page = blank_page(800, 1000);
    paint_text(&mut page, &[40..380, 420..760]);
    page
}

fn cpu_pipeline() -> PagePipeline {
    PagePipeline::build(PipelineConfig::cpu_only()).unwrap()
}

fn process(pipeline: &PagePipeline, bitmap: PageBitmap, page_number: u64) -> PageResponse {
    pipeline.process(PageRequest {
        bitmap,
        page_number,
    })
}

fn expect_success(response: PageResponse) -> (PageBitmap, Vec<u32>) {
    match response {
        PageResponse::Success {
            processed,
            column_splits,
            ..
        } => (processed, column_splits),
        PageResponse::Failure { error, .. } => panic!("pipeline failed: {error}"),
    }
}

fn assert_strictly_binary(page: &PageBitmap) {
    for px in page.data.chunks_exact(4) {
        assert!(
            px == BLACK || px == WHITE,
            "non-binary output pixel {px:?}"
        );
    }
}

#[test]
fn output_dimensions_match_input() {
    let pipeline = cpu_pipeline();
    for (w, h) in [(37u32, 23u32), (64, 64), (100, 250)] {
        let (processed, _) = expect_success(process(&pipeline, blank_page(w, h), 0));
        assert_eq!((processed.width, processed.height), (w, h));
        assert_eq!(processed.data.len(), (w * h * 4) as usize);
        assert_strictly_binary(&processed);
    }
}

#[test]
fn all_white_page_stays_white() {
    let pipeline = cpu_pipeline();
    let (processed, splits) = expect_success(process(&pipeline, blank_page(200, 200), 1));
    // A blank page trivially satisfies the gutter density bound, so at
    // most one (harmless) split may be reported — never more.
    assert!(splits.len() <= 1);
    assert!(processed.data.chunks_exact(4).all(|px| px == WHITE));
}

#[test]
fn single_column_page_has_no_split() {
    let mut page = blank_page(800, 1000);
    paint_text(&mut page, &[40..760]);

    let pipeline = cpu_pipeline();
    let (_, splits) = expect_success(process(&pipeline, page, 2));
    assert!(splits.is_empty());
}

#[test]
fn two_column_page_end_to_end() {
    let page = two_column_page();

    // No tile of this page crosses the inversion bound.
    let gray = reduce_rgba(&page.data, page.width, page.height).unwrap();
    let tiles = TileGrid::plan(&gray, &BinarizeConfig::default());
    assert!(tiles.plans().iter().all(|p| !p.invert));

    let pipeline = cpu_pipeline();
    assert!(!pipeline.is_accelerated());
    let (processed, splits) = expect_success(process(&pipeline, page, 3));

    assert_eq!((processed.width, processed.height), (800, 1000));
    assert_strictly_binary(&processed);

    assert_eq!(splits.len(), 1, "exactly one gutter expected");
    assert!(
        splits[0].abs_diff(400) <= 3,
        "split {} should sit at the gutter center",
        splits[0]
    );

    let px = |x: usize, y: usize| &processed.data[(y * 800 + x) * 4..(y * 800 + x) * 4 + 4];
    // Text rows binarize foreground black, background white.
    assert_eq!(px(100, 10), BLACK, "left column text");
    assert_eq!(px(600, 10), BLACK, "right column text");
    assert_eq!(px(400, 10), WHITE, "gutter stays white");
    assert_eq!(px(100, 30), WHITE, "inter-line whitespace stays white");
}

#[test]
fn identical_input_yields_identical_output() {
    let pipeline = cpu_pipeline();
    let (first, first_splits) = expect_success(process(&pipeline, two_column_page(), 4));
    let (second, second_splits) = expect_success(process(&pipeline, two_column_page(), 5));
    assert_eq!(first.data, second.data);
    assert_eq!(first_splits, second_splits);
}

#[test]
fn invalid_dimensions_fail_without_panicking() {
    let pipeline = cpu_pipeline();
    // Field-constructed bitmap the checked constructor would refuse.
    let bitmap = PageBitmap {
        width: 0,
        height: 0,
        data: Vec::new(),
    };
    match process(&pipeline, bitmap, 9) {
        PageResponse::Failure {
            page_number, error, ..
        } => {
            assert_eq!(page_number, 9);
            assert!(error.contains("invalid page dimensions"), "{error}");
        }
        PageResponse::Success { .. } => panic!("zero-sized page must fail"),
    }
}

#[test]
fn batch_keeps_order_and_isolates_failures() {
    let pipeline = cpu_pipeline();
    let requests = vec![
        PageRequest {
            bitmap: blank_page(64, 64),
            page_number: 0,
        },
        PageRequest {
            bitmap: PageBitmap {
                width: 10,
                height: 10,
                data: vec![0u8; 7], // wrong length
            },
            page_number: 1,
        },
        PageRequest {
            bitmap: blank_page(64, 64),
            page_number: 2,
        },
    ];

    let responses = pipeline.process_batch(requests);
    assert_eq!(responses.len(), 3);
    assert_eq!(
        responses.iter().map(|r| r.page_number()).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert!(responses[0].is_success());
    assert!(!responses[1].is_success(), "bad page fails alone");
    assert!(responses[2].is_success(), "failure does not block others");
}

#[test]
fn warmup_runs_clean() {
    let pipeline = cpu_pipeline();
    pipeline.warmup();
    // The pipeline stays usable afterwards.
    let (processed, _) = expect_success(process(&pipeline, blank_page(32, 32), 10));
    assert_strictly_binary(&processed);
}
