mod progress;
mod summary;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use luna_core::align::WarpMode;
use luna_core::io::image_dir::{OUTPUT_PNG, OUTPUT_TIFF};
use luna_core::pipeline::{run_pipeline_reported, StackerConfig};

use progress::CliReporter;

#[derive(Clone, Copy, ValueEnum)]
enum WarpModeArg {
    Translation,
    Affine,
}

impl From<WarpModeArg> for WarpMode {
    fn from(arg: WarpModeArg) -> Self {
        match arg {
            WarpModeArg::Translation => WarpMode::Translation,
            WarpModeArg::Affine => WarpMode::Affine,
        }
    }
}

#[derive(Parser)]
#[command(name = "luna", about = "Moon auto-alignment and stacking (ECC + median)")]
#[command(version)]
struct Cli {
    /// Stacker config file (TOML); explicit flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input directory of raw moon photos (default: moon_photos)
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Output directory (default: moon_output)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Alignment model (default: affine)
    #[arg(long, value_enum)]
    warp_mode: Option<WarpModeArg>,

    /// Max iterations for ECC (default: 300)
    #[arg(long)]
    ecc_max_iters: Option<usize>,

    /// Convergence threshold for ECC (default: 1e-7)
    #[arg(long)]
    ecc_eps: Option<f64>,

    /// Resize factor for alignment speed-up (default: 1.0)
    #[arg(long)]
    resize: Option<f32>,

    /// Disable CLAHE contrast enhancement
    #[arg(long)]
    no_clahe: bool,

    /// Unsharp mask strength 0~1 (default: 0.5)
    #[arg(long)]
    unsharp_amount: Option<f32>,

    /// Gaussian radius for unsharp mask (default: 1.2)
    #[arg(long)]
    gauss_sigma: Option<f32>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn build_config(cli: &Cli) -> Result<StackerConfig> {
    let mut config = if let Some(ref path) = cli.config {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&contents).context("Invalid stacker config")?
    } else {
        StackerConfig::default()
    };

    if let Some(ref dir) = cli.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(ref dir) = cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(mode) = cli.warp_mode {
        config.warp_mode = mode.into();
    }
    if let Some(iters) = cli.ecc_max_iters {
        config.ecc_max_iters = iters;
    }
    if let Some(eps) = cli.ecc_eps {
        config.ecc_eps = eps;
    }
    if let Some(resize) = cli.resize {
        config.resize_for_speed = resize;
    }
    if cli.no_clahe {
        config.use_clahe = false;
    }
    if let Some(amount) = cli.unsharp_amount {
        config.unsharp_amount = amount;
    }
    if let Some(sigma) = cli.gauss_sigma {
        config.gauss_sigma = sigma;
    }

    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = build_config(&cli)?;
    summary::print_run_summary(&config);

    let reporter = CliReporter::default();
    run_pipeline_reported(&config, &reporter)?;

    summary::print_outputs(
        &config.output_dir.join(OUTPUT_TIFF),
        &config.output_dir.join(OUTPUT_PNG),
    );
    Ok(())
}
