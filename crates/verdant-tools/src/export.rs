//! Preview and dump writers.

use std::fs;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use serde::Serialize;
use tracing::info;
use verdant_terrain::{color_for, Generation, GenerationReport, TileGrid};

/// Height the shading is normalized against.
const SHADE_HEIGHT: f32 = 15.0;

#[derive(Serialize)]
struct Dump<'a> {
    report: &'a GenerationReport,
    grid: &'a TileGrid,
}

/// Renders one character per tile, one line per row.
pub fn ascii_preview(grid: &TileGrid) -> String {
    let width = grid.width() as usize;
    let mut out = String::with_capacity((width + 1) * grid.depth() as usize);
    for row in grid.tiles().chunks(width) {
        out.extend(row.iter().map(|t| t.terrain.glyph()));
        out.push('\n');
    }
    out
}

/// Renders the grid with palette colors darkened in low areas.
pub fn render_image(grid: &TileGrid, scale: u32) -> RgbImage {
    let scale = scale.max(1);
    RgbImage::from_fn(grid.width() * scale, grid.depth() * scale, |px, pz| {
        let Some(tile) = grid.get(px / scale, pz / scale) else {
            return Rgb([0, 0, 0]);
        };
        let shade = 0.6 + 0.4 * (tile.height / SHADE_HEIGHT).clamp(0.0, 1.0);
        Rgb(color_for(tile.terrain).map(|c| (c * shade * 255.0).round().clamp(0.0, 255.0) as u8))
    })
}

/// Writes a PNG preview.
pub fn write_png(grid: &TileGrid, scale: u32, path: &Path) -> Result<()> {
    create_parent(path)?;
    render_image(grid, scale)
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))?;
    info!("Wrote preview to {}", path.display());
    Ok(())
}

/// Writes the grid and its report as pretty JSON.
pub fn write_json(generation: &Generation, path: &Path) -> Result<()> {
    create_parent(path)?;
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let dump = Dump {
        report: &generation.report,
        grid: &generation.grid,
    };
    serde_json::to_writer_pretty(BufWriter::new(file), &dump)?;
    info!("Wrote grid dump to {}", path.display());
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
