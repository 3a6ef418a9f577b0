use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use pageprep_core::{PageBitmap, PageRequest, PageResponse};
use pageprep_pipeline::PagePipeline;

#[derive(Parser)]
#[command(
    name = "pageprep",
    about = "Document page preparation — scan enhancement, binarization, layout analysis"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a pipeline config file (JSON).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Force the CPU fallback path even when a GPU is present.
    #[arg(long, global = true)]
    pub cpu: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Prepare a single page image and write the binarized result.
    Process {
        /// Input image path (PNG, JPEG, TIFF, ...).
        #[arg(required = true)]
        input: PathBuf,
        /// Output path; defaults to `<stem>.prepared.png` next to the
        /// input.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Prepare every image in a directory.
    Batch {
        /// Input directory.
        #[arg(required = true)]
        input_dir: PathBuf,
        /// Output directory for prepared pages.
        #[arg(required = true)]
        output_dir: PathBuf,
    },
}

/// Extensions treated as page images during batch scans.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

pub fn is_page_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Default output path for a prepared page: `<stem>.prepared.png`.
pub fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("page");
    input.with_file_name(format!("{stem}.prepared.png"))
}

/// Process one file: decode, run the pipeline, write the binarized PNG,
/// and print the layout metadata as one JSON line.
pub fn process_file(
    pipeline: &PagePipeline,
    input: &Path,
    output: &Path,
    page_number: u64,
) -> anyhow::Result<()> {
    let img = image::open(input)?.to_rgba8();
    let (width, height) = img.dimensions();
    let bitmap = PageBitmap::new(width, height, img.into_raw())?;

    match pipeline.process(PageRequest {
        bitmap,
        page_number,
    }) {
        PageResponse::Success {
            processed,
            column_splits,
            timing,
            ..
        } => {
            let out = image::RgbaImage::from_raw(processed.width, processed.height, processed.data)
                .ok_or_else(|| anyhow::anyhow!("output buffer size mismatch"))?;
            out.save(output)?;

            let metadata = serde_json::json!({
                "page_number": page_number,
                "input": input.display().to_string(),
                "output": output.display().to_string(),
                "column_splits": column_splits,
                "timing": timing,
            });
            println!("{}", serde_json::to_string(&metadata)?);
            Ok(())
        }
        PageResponse::Failure { error, .. } => {
            anyhow::bail!("page preparation failed: {error}")
        }
    }
}
