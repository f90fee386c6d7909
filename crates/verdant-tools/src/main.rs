//! # Verdant
//!
//! Command-line front end for the terrain generator: builds one grid, prints
//! a preview and summary, and optionally writes PNG and JSON files.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod config;
mod export;

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use verdant_terrain::{FeatureType, Generation, TerrainGenerator, TerrainType};

use crate::config::ToolConfig;

/// Seeded terrain generator.
#[derive(Debug, Parser)]
#[command(name = "verdant", version, about)]
struct Args {
    /// Grid width in tiles
    #[arg(long)]
    width: Option<u32>,
    /// Grid depth in tiles
    #[arg(long)]
    depth: Option<u32>,
    /// Seed; a random one is chosen and reported when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Configuration file (defaults to ./verdant.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write a PNG preview here
    #[arg(long)]
    png: Option<PathBuf>,
    /// Pixels per tile in the PNG preview
    #[arg(long)]
    png_scale: Option<u32>,
    /// Write a JSON dump here
    #[arg(long)]
    json: Option<PathBuf>,
    /// Skip the ASCII preview
    #[arg(long)]
    no_ascii: bool,
    /// Save the resolved configuration here and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

impl Args {
    fn resolve(self) -> Result<ToolConfig> {
        let mut config = match &self.config {
            Some(path) => ToolConfig::try_load_from(path)?,
            None => ToolConfig::load(),
        };
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(depth) = self.depth {
            config.depth = depth;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.png.is_some() {
            config.png = self.png;
        }
        if let Some(scale) = self.png_scale {
            config.png_scale = scale;
        }
        if self.json.is_some() {
            config.json = self.json;
        }
        if self.no_ascii {
            config.ascii = false;
        }
        config.validate();
        Ok(config)
    }
}

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("verdant=info".parse()?))
        .init();

    let mut args = Args::parse();
    let write_config = args.write_config.take();
    let config = args.resolve()?;
    info!("Verdant {}", env!("CARGO_PKG_VERSION"));

    if let Some(path) = write_config {
        config.save_to(path)?;
        return Ok(());
    }

    let generator = TerrainGenerator::new(config.generator.clone())?;
    let generation = generator.generate(config.width, config.depth, config.seed)?;

    if config.ascii {
        print!("{}", export::ascii_preview(&generation.grid));
    }
    print!("{}", summary(&generation)?);

    if let Some(path) = &config.png {
        export::write_png(&generation.grid, config.png_scale, path)?;
    }
    if let Some(path) = &config.json {
        export::write_json(&generation, path)?;
    }
    Ok(())
}

/// Human-readable run statistics.
fn summary(generation: &Generation) -> Result<String, std::fmt::Error> {
    let Generation { grid, report } = generation;
    let cells = grid.tiles().len();
    let mut out = String::new();

    writeln!(out, "seed:        {}", report.seed)?;
    writeln!(out, "size:        {}x{}", grid.width(), grid.depth())?;
    writeln!(out, "seeds:       {}", report.growth.seeds)?;
    writeln!(
        out,
        "fallbacks:   {} ({:.1}%)",
        report.growth.fallbacks.len(),
        report.growth.fallback_ratio(cells) * 100.0
    )?;
    writeln!(out, "reseeds:     {}", report.growth.coverage_reseeds)?;
    writeln!(
        out,
        "smoothed:    {} ({} reclassified)",
        report.post.smoothed_cells, report.post.reclassified_cells
    )?;

    writeln!(out, "terrain:")?;
    let counts = grid.count_by_type();
    for terrain in TerrainType::ALL {
        let count = counts[terrain.index()];
        if count > 0 {
            writeln!(out, "  {} {:<14} {count}", terrain.glyph(), terrain.display_name())?;
        }
    }

    let mut features = [0usize; FeatureType::COUNT];
    for tile in grid.tiles() {
        for feature in tile.features.iter() {
            features[feature.index()] += 1;
        }
    }
    writeln!(out, "features:")?;
    for feature in FeatureType::ALL {
        let count = features[feature.index()];
        if count > 0 {
            writeln!(out, "  {:<16} {count}", feature.display_name())?;
        }
    }
    Ok(out)
}
