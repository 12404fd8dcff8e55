mod config;

use crate::config::Config;
use anyhow::{Context, Result};
use avghash::Fingerprint;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "avghash.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare two bitmaps by their average hash
    Compare {
        first: PathBuf,
        second: PathBuf,
        /// Maximum number of differing bits for the images to count as similar
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=64))]
        threshold: Option<u32>,
    },
    /// Print the average hash of each bitmap
    Hash {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Resample a bitmap with bilinear interpolation
    Resize {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        width: usize,
        #[arg(long)]
        height: usize,
        /// Use the scalar resampler instead of the SIMD one
        #[arg(long)]
        scalar: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout only carries the report.
    // Override with RUST_LOG, e.g.: RUST_LOG=avghash=debug
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = match Config::load_from_file(&args.config) {
        Ok(c) => c,
        Err(e) if args.config.exists() => {
            warn!(
                "Invalid config {:?}: {:#}. Using defaults.",
                args.config, e
            );
            Config::default_config()
        }
        Err(e) => {
            info!(
                "Failed to load config from {:?}: {:#}. Using defaults.",
                args.config, e
            );
            Config::default_config()
        }
    };
    debug!("Config loaded: {:?}", config);

    match args.command {
        Command::Compare {
            first,
            second,
            threshold,
        } => {
            let threshold = threshold.unwrap_or(config.similarity.threshold);
            compare(&first, &second, threshold)
        }
        Command::Hash { images } => {
            for path in &images {
                println!("{} average hash:\t{}", path.display(), fingerprint(path)?);
            }
            Ok(())
        }
        Command::Resize {
            input,
            output,
            width,
            height,
            scalar,
        } => resize(&input, &output, width, height, scalar || config.resize.scalar),
    }
}

fn fingerprint(path: &Path) -> Result<Fingerprint> {
    let image = avghash::load(path).with_context(|| {
        format!(
            "Failed to load bitmap {}, only 24bpp BMPs are supported",
            path.display()
        )
    })?;
    avghash::compute_fingerprint(&image)
        .with_context(|| format!("Failed to compute average hash of {}", path.display()))
}

fn compare(first: &Path, second: &Path, threshold: u32) -> Result<()> {
    let hash1 = fingerprint(first)?;
    let hash2 = fingerprint(second)?;

    println!("{} average hash:\t{}", first.display(), hash1);
    println!("{} average hash:\t{}", second.display(), hash2);

    let distance = hash1.hamming_distance(hash2);
    debug!("Hamming distance {} (threshold {})", distance, threshold);
    if avghash::compare_fingerprints(hash1, hash2, threshold) {
        println!("[Images are SIMILAR]");
    } else {
        println!("[Images are DIFFERENT]");
    }
    Ok(())
}

fn resize(input: &Path, output: &Path, width: usize, height: usize, scalar: bool) -> Result<()> {
    let image = avghash::load(input)
        .with_context(|| format!("Failed to load bitmap {}", input.display()))?;

    let resized = if scalar {
        avghash::resize_scalar(&image, width, height)
    } else {
        avghash::resize(&image, width, height)
    }
    .with_context(|| format!("Failed to resize {} to {}x{}", input.display(), width, height))?;

    avghash::save(&resized, output)
        .with_context(|| format!("Failed to save bitmap {}", output.display()))?;
    info!(
        "Resized {} ({}x{}) to {} ({}x{})",
        input.display(),
        image.width(),
        image.height(),
        output.display(),
        width,
        height
    );
    Ok(())
}
