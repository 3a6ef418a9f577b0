use std::time::Instant;

use pageprep_analyze::{detect_column_split, detect_text_bands, reduce_rgba};
use pageprep_binarize::{binarize, clean, CleanupVariant};
use pageprep_core::{
    PageBitmap, PageRequest, PageResponse, PrepError, Result, StageTiming,
};
use pageprep_gpu::{FilterKind, ShaderEngine};

use crate::config::{AccelerationPolicy, PipelineConfig};
use crate::fallback::sharpen_rgba;
use crate::scheduler::PageScheduler;

/// Filter backend for the enhancement stage.
///
/// The two variants deliberately apply different filter subsets: the
/// accelerated path runs the AdaptiveStretch program (lighting
/// normalization before thresholding) and erosion-only cleanup; the CPU
/// path runs the scalar sharpen convolution and erosion-plus-dilation
/// cleanup. They are distinct named variants, not a merged pass.
enum FilterBackend {
    Accelerated(ShaderEngine),
    Cpu,
}

/// The page preparation pipeline: filter → grayscale → structural
/// analysis → tiled binarization → morphological cleanup.
///
/// One `process` call is one isolated page invocation; stages within it
/// run strictly sequentially, each consuming the complete output of the
/// prior stage. The pipeline itself is long-lived and shared across
/// invocations; the engine's surface and programs are reused, never
/// rebuilt.
pub struct PagePipeline {
    backend: FilterBackend,
    scheduler: PageScheduler,
    config: PipelineConfig,
}

impl PagePipeline {
    /// Build the pipeline from configuration.
    ///
    /// Acceleration is resolved here, once: under `Prefer` an engine
    /// failure logs and selects the CPU variant; under `Require` it is
    /// fatal; `Disable` skips the engine entirely.
    pub fn build(config: PipelineConfig) -> Result<Self> {
        let backend = match config.acceleration {
            AccelerationPolicy::Disable => {
                tracing::info!("using CPU filter path (acceleration disabled)");
                FilterBackend::Cpu
            }
            AccelerationPolicy::Require => {
                let engine = ShaderEngine::new()?;
                tracing::info!(adapter = %engine.adapter_name(), "using accelerated filter path");
                FilterBackend::Accelerated(engine)
            }
            AccelerationPolicy::Prefer => match ShaderEngine::new() {
                Ok(engine) => {
                    tracing::info!(adapter = %engine.adapter_name(), "using accelerated filter path");
                    FilterBackend::Accelerated(engine)
                }
                Err(e) => {
                    tracing::info!(
                        reason = %e,
                        "acceleration unavailable, falling back to CPU filter path"
                    );
                    FilterBackend::Cpu
                }
            },
        };

        let scheduler = PageScheduler::new(config.num_workers);

        Ok(Self {
            backend,
            scheduler,
            config,
        })
    }

    pub fn is_accelerated(&self) -> bool {
        matches!(self.backend, FilterBackend::Accelerated(_))
    }

    /// Process one page.
    ///
    /// The request's bitmap is consumed whatever the outcome; errors are
    /// converted into the failure response at this boundary — callers
    /// never see a panic or a half-processed buffer.
    pub fn process(&self, request: PageRequest) -> PageResponse {
        let page_number = request.page_number;
        match self.run(request.bitmap, page_number) {
            Ok((processed, split, timing)) => PageResponse::Success {
                page_number,
                processed,
                column_splits: split.into_iter().collect(),
                timing,
            },
            Err(e) => {
                tracing::warn!(page = page_number, error = %e, "page preparation failed");
                PageResponse::Failure {
                    page_number,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Process many pages, one isolated invocation each, across the
    /// worker pool. Responses come back in request order and one page's
    /// failure never blocks another.
    pub fn process_batch(&self, requests: Vec<PageRequest>) -> Vec<PageResponse> {
        tracing::debug!(pages = requests.len(), "batch dispatch");
        self.scheduler.dispatch(requests, |request| self.process(request))
    }

    /// Run a dummy page through the pipeline so first-page latency
    /// excludes one-time setup cost.
    pub fn warmup(&self) {
        tracing::info!("warming up pipeline");
        let bitmap = PageBitmap {
            width: 64,
            height: 64,
            data: vec![255u8; 64 * 64 * 4],
        };
        let _ = self.process(PageRequest {
            bitmap,
            page_number: u64::MAX,
        });
        tracing::info!("warmup complete");
    }

    fn run(
        &self,
        bitmap: PageBitmap,
        page_number: u64,
    ) -> Result<(PageBitmap, Option<u32>, StageTiming)> {
        let total_start = Instant::now();
        let mut timing = StageTiming::default();

        let (width, height) = (bitmap.width, bitmap.height);
        // Reject before any allocation; the field-constructed case can
        // carry dimensions the checked constructor would have refused.
        if width == 0 || height == 0 {
            return Err(PrepError::InvalidDimensions { width, height });
        }
        if bitmap.data.len() != width as usize * height as usize * 4 {
            return Err(PrepError::InvalidDimensions { width, height });
        }

        // Stage 1: enhancement filter. The input bitmap is released as
        // soon as its pixels have been copied into the filter output.
        let stage = Instant::now();
        let filtered = match &self.backend {
            FilterBackend::Accelerated(engine) => {
                engine.apply(&bitmap, FilterKind::AdaptiveStretch)?
            }
            FilterBackend::Cpu => sharpen_rgba(&bitmap.data, width, height)?,
        };
        drop(bitmap);
        timing.filter_ms = elapsed_ms(stage);

        // Stage 2: grayscale reduction.
        let stage = Instant::now();
        let gray = reduce_rgba(&filtered, width, height)?;
        drop(filtered);
        timing.grayscale_ms = elapsed_ms(stage);

        // Stage 3: structural analysis.
        let stage = Instant::now();
        let bands = detect_text_bands(&gray, &self.config.analyzer);
        let split = detect_column_split(&gray, &self.config.analyzer);
        timing.analyze_ms = elapsed_ms(stage);

        // Stage 4: tiled adaptive binarization (band-aware).
        let stage = Instant::now();
        let mut page = binarize(&gray, &bands, &self.config.binarize)?;
        drop(gray);
        timing.binarize_ms = elapsed_ms(stage);

        // Stage 5: morphological cleanup, variant fixed per filter path.
        let stage = Instant::now();
        let variant = match &self.backend {
            FilterBackend::Accelerated(_) => CleanupVariant::SpeckleOnly,
            FilterBackend::Cpu => CleanupVariant::SpeckleAndConsolidate,
        };
        clean(&mut page, variant);
        timing.cleanup_ms = elapsed_ms(stage);

        timing.total_ms = elapsed_ms(total_start);
        tracing::info!(
            page = page_number,
            width,
            height,
            bands = bands.len(),
            split = ?split,
            total_ms = timing.total_ms,
            "page prepared"
        );

        Ok((page, split, timing))
    }
}

fn elapsed_ms(since: Instant) -> f32 {
    since.elapsed().as_secs_f32() * 1000.0
}
