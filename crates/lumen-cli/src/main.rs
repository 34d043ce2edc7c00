//! Lumen CLI - Command-line interface for the Lumen IBL pipeline

mod commands;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{defines, inspect, lut, probe};
use config::LumenConfig;
use lumen_environment::QualityTier;
use lumen_shading::ShadingChange;
use std::path::Path;

#[derive(Parser)]
#[command(name = "lumen")]
#[command(about = "Image-based lighting probes and PBR shader permutations", long_about = None)]
#[command(version)]
struct Cli {
    /// Read this config file instead of the global and project layers
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the textures, harmonics and lights of an environment package
    Inspect {
        /// Package path or URL (defaults to the configured package)
        package: Option<String>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Print the define set the shading configuration compiles to
    Defines {
        /// Apply a change first (e.g. "ndf=Beckmann", "specular_aa=true")
        #[arg(long = "set", value_parser = parse_change)]
        changes: Vec<ShadingChange>,

        /// Print `#define` lines instead of bare symbols
        #[arg(long)]
        preamble: bool,

        /// Print the PBR shader resolved against the defines
        #[arg(long, conflicts_with = "preamble")]
        wgsl: bool,
    },

    /// Load an environment package and bind a preview surface to it
    Probe {
        /// Package path or URL (defaults to the configured package)
        package: Option<String>,

        /// Upload to a headless GPU device instead of the CPU backend
        #[arg(long)]
        gpu: bool,

        /// Quality tier (auto, full or reduced)
        #[arg(long, value_parser = parse_quality)]
        quality: Option<QualityTier>,

        /// Request the panorama specular layout
        #[arg(long)]
        panorama: bool,
    },

    /// Integrate the split-sum BRDF table and write it as a PNG
    Lut {
        /// Output image path
        #[arg(short, long, default_value = "brdf_lut.png")]
        out: String,

        /// Table edge length in texels
        #[arg(long)]
        size: Option<u32>,

        /// Samples per texel
        #[arg(long)]
        samples: Option<u32>,
    },
}

fn parse_change(s: &str) -> Result<ShadingChange, String> {
    s.parse().map_err(|e: lumen_core::ConfigError| e.to_string())
}

fn parse_quality(s: &str) -> Result<QualityTier, String> {
    config::parse_quality_tier(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => LumenConfig::load_from_file(Path::new(path)),
        None => LumenConfig::load(),
    }
    .context("Failed to load configuration")?;

    match cli.command {
        Commands::Inspect { package, format } => inspect::run(&config, package.as_deref(), &format),
        Commands::Defines {
            changes,
            preamble,
            wgsl,
        } => defines::run(
            &config,
            defines::DefinesArgs {
                changes,
                preamble,
                wgsl,
            },
        ),
        Commands::Probe {
            package,
            gpu,
            quality,
            panorama,
        } => probe::run(
            &config,
            probe::ProbeArgs {
                package,
                gpu,
                quality,
                panorama,
            },
        ),
        Commands::Lut { out, size, samples } => lut::run(&config, &out, size, samples),
    }
}
