//!
//! Command-line interface for fiber endpoint extraction from LIF
//! microscopy containers.
#![allow(clippy::uninlined_format_args, clippy::cast_precision_loss)]

use clap::{Parser, Subcommand, ValueEnum};

use fibertrace_algorithms::{edge_maps, trace_fibers};
use fibertrace_core::{PipelineConfig, SkeletonMode, TraceSummary};
use fibertrace_io::{FiberFileWriter, LifFileReader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    FibertraceIo(#[from] fibertrace_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] fibertrace_core::Error),

    #[error("Container error: {0}")]
    Lif(#[from] fibertrace_lif::Error),
}

/// Skeletonization strategy selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Thin the full 3D volume (keeps inter-slice connections)
    #[value(name = "3d")]
    Volume3d,
    /// Thin each z slice independently (faster, loses z connectivity)
    PerSlice,
}

impl From<Mode> for SkeletonMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Volume3d => SkeletonMode::Volume3d,
            Mode::PerSlice => SkeletonMode::PerSlice,
        }
    }
}

/// Fiber endpoint extraction from microscopy stacks.
#[derive(Parser)]
#[command(name = "fibertrace")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract fiber start/end coordinates from a container series
    Trace {
        /// Input LIF container
        input: PathBuf,

        /// Optional JSON pipeline configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Series index to process (default 0)
        #[arg(short, long)]
        series: Option<usize>,

        /// Gaussian smoothing standard deviation in pixels (default 1.0)
        #[arg(long)]
        sigma: Option<f64>,

        /// Minimum surviving object size in pixels (default 64)
        #[arg(long)]
        min_object_size: Option<usize>,

        /// Maximum hole area to fill in pixels (default 64)
        #[arg(long)]
        min_hole_area: Option<usize>,

        /// Skeletonization strategy (default 3d)
        #[arg(short, long, value_enum)]
        mode: Option<Mode>,

        /// Compute diagnostic per-slice edge maps
        #[arg(long)]
        edges: bool,

        /// Disable parallel plane preprocessing
        #[arg(long)]
        sequential: bool,

        /// Output file path (.csv or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show information about a container
    Info {
        /// Input LIF container
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Trace {
            input,
            config,
            series,
            sigma,
            min_object_size,
            min_hole_area,
            mode,
            edges,
            sequential,
            output,
            verbose,
        } => {
            // Processing pipeline:
            // 1. Open container, select series, read z stack
            // 2. Preprocess planes (smooth, threshold, clean)
            // 3. Assemble volume, skeletonize, analyze graph
            // 4. Report fiber records

            // Flags override config-file values only when given.
            let mut config = match config {
                Some(path) => PipelineConfig::from_file(path)?,
                None => PipelineConfig::default(),
            };
            if let Some(series) = series {
                config = config.with_series_index(series);
            }
            if let Some(sigma) = sigma {
                config = config.with_sigma(sigma);
            }
            if let Some(size) = min_object_size {
                config = config.with_min_object_size(size);
            }
            if let Some(area) = min_hole_area {
                config = config.with_min_hole_area(area);
            }
            if let Some(mode) = mode {
                config = config.with_skeleton_mode(mode.into());
            }
            if edges {
                config = config.with_compute_edges(true);
            }
            if sequential {
                config = config.with_parallel(false);
            }
            config.validate()?;

            if verbose {
                eprintln!("Reading: {}", input.display());
                eprintln!("Series: {}", config.series_index);
                eprintln!("Sigma: {} px", config.sigma);
                eprintln!("Min object size: {} px", config.min_object_size);
                eprintln!("Min hole area: {} px", config.min_hole_area);
                eprintln!("Skeleton mode: {:?}", config.skeleton_mode);
            }

            let start = Instant::now();
            let reader = LifFileReader::open(&input)?;
            let series_reader = reader.series(config.series_index)?;
            let planes = series_reader.z_stack()?;

            if verbose {
                let info = series_reader.info();
                eprintln!(
                    "Loaded '{}': {} x {} px, {} slices, {} channel(s), {}-bit",
                    info.name,
                    info.width,
                    info.height,
                    info.z_count,
                    info.channel_count,
                    info.bits_per_pixel
                );
            }

            if config.compute_edges {
                for (z, map) in edge_maps(&planes, &config).iter().enumerate() {
                    let count = map.iter().filter(|&&v| v).count();
                    eprintln!("Slice {}: {} edge pixels", z, count);
                }
            }

            let summary = trace_fibers(&planes, &config)?;
            report(&summary);

            if let Some(path) = &output {
                write_output(path, &summary)?;
                if verbose {
                    eprintln!("Wrote output to: {}", path.display());
                }
            }

            let elapsed = start.elapsed();
            println!(
                "Extracted {} fiber(s) across {} component(s) in {:.2}s",
                summary.fibers.len(),
                summary.component_count,
                elapsed.as_secs_f64()
            );
        }

        Commands::Info { input } => {
            let reader = LifFileReader::open(&input)?;

            println!("File: {}", input.display());
            println!(
                "Size: {} bytes ({:.2} MB)",
                reader.file_size(),
                reader.file_size() as f64 / 1_000_000.0
            );
            println!("Version: {}", reader.version());
            println!("Series: {}", reader.series_count());

            for (i, info) in reader.series_infos().iter().enumerate() {
                println!(
                    "  [{}] '{}': {} x {} px, z={}, t={}, c={}, {}-bit ({})",
                    i,
                    info.name,
                    info.width,
                    info.height,
                    info.z_count,
                    info.t_count,
                    info.channel_count,
                    info.bits_per_pixel,
                    info.memory_block_id
                );
            }
        }
    }

    Ok(())
}

/// Prints one line per fiber, 1-based, in branch order.
fn report(summary: &TraceSummary) {
    for (i, fiber) in summary.fibers.iter().enumerate() {
        println!("Fiber {}: {}", i + 1, fiber);
    }
}

/// Writes the summary by output extension: CSV for `.csv`, JSON
/// otherwise.
fn write_output(path: &Path, summary: &TraceSummary) -> Result<()> {
    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or_else(|| "json".to_string(), str::to_lowercase);
    let mut writer = FiberFileWriter::create(path)?;
    match format.as_str() {
        "csv" => writer.write_records_csv(&summary.fibers)?,
        _ => writer.write_summary_json(summary)?,
    }
    Ok(())
}
