//! Fixed terrain colors for renderers.

use crate::terrain::TerrainType;

/// Linear RGB color in `[0, 1]` for a terrain type. Stable across runs.
#[must_use]
pub const fn color_for(terrain: TerrainType) -> [f32; 3] {
    match terrain {
        TerrainType::DeepWater => [0.05, 0.15, 0.45],
        TerrainType::ShallowWater => [0.15, 0.40, 0.70],
        TerrainType::Beach => [0.90, 0.85, 0.60],
        TerrainType::Grassland => [0.45, 0.70, 0.30],
        TerrainType::Forest => [0.20, 0.50, 0.20],
        TerrainType::DenseForest => [0.08, 0.32, 0.12],
        TerrainType::Hills => [0.55, 0.55, 0.35],
        TerrainType::Mountains => [0.50, 0.45, 0.42],
        TerrainType::SnowPeaks => [0.95, 0.95, 0.98],
        TerrainType::Desert => [0.92, 0.78, 0.45],
        TerrainType::Swamp => [0.30, 0.38, 0.25],
        TerrainType::Wasteland => [0.52, 0.40, 0.32],
    }
}

/// [`color_for`] as 8-bit channels.
#[must_use]
pub fn color_for_rgb8(terrain: TerrainType) -> [u8; 3] {
    color_for(terrain).map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}
