use clap::Parser;
use tracing_subscriber::EnvFilter;

use pageprep_pipeline::{AccelerationPolicy, PagePipeline, PipelineConfig};

mod cli;

use cli::{Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_target(true)
        .init();

    tracing::info!("pageprep v{}", env!("CARGO_PKG_VERSION"));

    let mut config = if let Some(config_path) = &cli.config {
        let data = std::fs::read_to_string(config_path)?;
        serde_json::from_str::<PipelineConfig>(&data)?
    } else {
        PipelineConfig::default()
    };

    if cli.cpu {
        config.acceleration = AccelerationPolicy::Disable;
    }

    let pipeline = PagePipeline::build(config)?;
    tracing::info!(accelerated = pipeline.is_accelerated(), "pipeline ready");

    match cli.command {
        Command::Process { input, output } => {
            let output = output.unwrap_or_else(|| cli::default_output(&input));
            cli::process_file(&pipeline, &input, &output, 0)?;
        }
        Command::Batch {
            input_dir,
            output_dir,
        } => {
            tracing::info!(
                input = %input_dir.display(),
                output = %output_dir.display(),
                "batch processing"
            );
            std::fs::create_dir_all(&output_dir)?;

            let mut entries: Vec<_> = std::fs::read_dir(&input_dir)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file() && cli::is_page_image(p))
                .collect();
            entries.sort();

            for (page_number, path) in entries.iter().enumerate() {
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("page");
                let output = output_dir.join(format!("{stem}.prepared.png"));
                tracing::info!(file = %path.display(), "processing");
                if let Err(e) = cli::process_file(&pipeline, path, &output, page_number as u64) {
                    tracing::error!(file = %path.display(), error = %e, "failed");
                }
            }
        }
    }

    Ok(())
}
