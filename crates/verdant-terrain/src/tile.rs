//! Terrain tiles and the finished tile grid.

use serde::{Deserialize, Serialize};
use verdant_common::{GridCoord, GridDims, GridError};

use crate::terrain::{FeatureSet, TerrainType};

/// One cell of the terrain grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainTile {
    /// Height on the rule set's scale
    pub height: f32,
    /// Terrain classification
    pub terrain: TerrainType,
    /// Moisture in `[0, 1]`
    pub moisture: f32,
    /// Temperature in `[0, 1]`
    pub temperature: f32,
    /// Decorative markers
    pub features: FeatureSet,
}

impl TerrainTile {
    /// Creates a tile without features.
    #[must_use]
    pub const fn new(height: f32, terrain: TerrainType, moisture: f32, temperature: f32) -> Self {
        Self {
            height,
            terrain,
            moisture,
            temperature,
            features: FeatureSet::EMPTY,
        }
    }
}

/// A fully decided grid of tiles.
///
/// Handed to renderers as a read-only snapshot. A new terrain is produced by
/// running generation again, never by editing a grid in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    dims: GridDims,
    seed: u64,
    tiles: Vec<TerrainTile>,
}

impl TileGrid {
    /// Builds a grid from row-major tiles.
    pub fn from_tiles(dims: GridDims, seed: u64, tiles: Vec<TerrainTile>) -> Result<Self, GridError> {
        if tiles.len() != dims.len() {
            return Err(GridError::InvalidDimensions {
                width: dims.width(),
                depth: dims.depth(),
            });
        }
        Ok(Self { dims, seed, tiles })
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn dims(&self) -> GridDims {
        self.dims
    }

    /// Grid width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.dims.width()
    }

    /// Grid depth.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.dims.depth()
    }

    /// Seed the grid was generated from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Tile at `(x, z)`, if in bounds.
    #[must_use]
    pub fn get(&self, x: u32, z: u32) -> Option<&TerrainTile> {
        self.tile(GridCoord::new(x, z))
    }

    /// Tile at a coordinate, if in bounds.
    #[must_use]
    pub fn tile(&self, coord: GridCoord) -> Option<&TerrainTile> {
        self.dims.index(coord).ok().map(|i| &self.tiles[i])
    }

    /// All tiles, row-major.
    #[must_use]
    pub fn tiles(&self) -> &[TerrainTile] {
        &self.tiles
    }

    /// Tiles paired with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, &TerrainTile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(|(i, tile)| (self.dims.coord(i), tile))
    }

    /// Tile count per terrain type, indexed by [`TerrainType::index`].
    #[must_use]
    pub fn count_by_type(&self) -> [usize; TerrainType::COUNT] {
        let mut counts = [0; TerrainType::COUNT];
        for tile in &self.tiles {
            counts[tile.terrain.index()] += 1;
        }
        counts
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [TerrainTile] {
        &mut self.tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(w: u32, d: u32) -> TileGrid {
        let dims = GridDims::new(w, d).expect("valid dims");
        let tiles = (0..dims.len())
            .map(|i| TerrainTile::new(i as f32, TerrainType::Grassland, 0.5, 0.5))
            .collect();
        TileGrid::from_tiles(dims, 1, tiles).expect("sized")
    }

    #[test]
    fn test_row_major_access() {
        let grid = flat(4, 3);
        assert_eq!(grid.get(1, 2).map(|t| t.height), Some(9.0));
        assert!(grid.get(4, 0).is_none());
        assert_eq!(grid.iter().nth(5).map(|(c, _)| c), Some(GridCoord::new(1, 1)));
    }

    #[test]
    fn test_from_tiles_checks_length() {
        let dims = GridDims::new(2, 2).expect("valid dims");
        assert!(TileGrid::from_tiles(dims, 0, Vec::new()).is_err());
    }

    #[test]
    fn test_count_by_type() {
        let grid = flat(3, 3);
        assert_eq!(grid.count_by_type()[TerrainType::Grassland.index()], 9);
    }
}
