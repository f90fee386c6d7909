//! Grid coordinates and dimensions.
//!
//! Tiles are stored row-major in a flat arena: `index = z * width + x`.

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Offsets of the 4-connected neighborhood: west, east, north, south.
const OFFSETS_4: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Offsets of the 8-connected neighborhood, row by row.
const OFFSETS_8: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Cell coordinate on the terrain grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    /// Column, in `[0, width)`
    pub x: u32,
    /// Row, in `[0, depth)`
    pub z: u32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: u32, z: u32) -> Self {
        Self { x, z }
    }
}

/// Validated grid dimensions.
///
/// Only constructible through [`GridDims::new`], so a value of this type
/// always describes a non-empty grid whose cell count fits in `usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDims", into = "RawDims")]
pub struct GridDims {
    width: u32,
    depth: u32,
}

#[derive(Serialize, Deserialize)]
struct RawDims {
    width: u32,
    depth: u32,
}

impl TryFrom<RawDims> for GridDims {
    type Error = GridError;

    fn try_from(raw: RawDims) -> Result<Self, Self::Error> {
        Self::new(raw.width, raw.depth)
    }
}

impl From<GridDims> for RawDims {
    fn from(dims: GridDims) -> Self {
        Self {
            width: dims.width,
            depth: dims.depth,
        }
    }
}

impl GridDims {
    /// Validates and creates grid dimensions.
    pub fn new(width: u32, depth: u32) -> Result<Self, GridError> {
        if width == 0 || depth == 0 {
            return Err(GridError::InvalidDimensions { width, depth });
        }
        (width as usize)
            .checked_mul(depth as usize)
            .ok_or(GridError::InvalidDimensions { width, depth })?;
        Ok(Self { width, depth })
    }

    /// Grid width (x extent).
    #[must_use]
    pub const fn width(self) -> u32 {
        self.width
    }

    /// Grid depth (z extent).
    #[must_use]
    pub const fn depth(self) -> u32 {
        self.depth
    }

    /// Total number of cells.
    #[must_use]
    pub const fn len(self) -> usize {
        self.width as usize * self.depth as usize
    }

    /// Always false; a validated grid has at least one cell.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        false
    }

    /// Whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn contains(self, coord: GridCoord) -> bool {
        coord.x < self.width && coord.z < self.depth
    }

    /// Linear arena index for a coordinate, or an error if out of bounds.
    pub fn index(self, coord: GridCoord) -> Result<usize, GridError> {
        if !self.contains(coord) {
            return Err(GridError::OutOfBounds {
                x: coord.x,
                z: coord.z,
                width: self.width,
                depth: self.depth,
            });
        }
        Ok(coord.z as usize * self.width as usize + coord.x as usize)
    }

    /// Coordinate of a linear arena index.
    #[must_use]
    pub const fn coord(self, index: usize) -> GridCoord {
        let width = self.width as usize;
        GridCoord {
            x: (index % width) as u32,
            z: (index / width) as u32,
        }
    }

    /// In-bounds 4-connected neighbors of `index` (west, east, north, south).
    pub fn neighbors4(self, index: usize) -> impl Iterator<Item = usize> {
        self.offset_neighbors(index, &OFFSETS_4)
    }

    /// In-bounds 8-connected neighbors of `index`, diagonals included.
    pub fn neighbors8(self, index: usize) -> impl Iterator<Item = usize> {
        self.offset_neighbors(index, &OFFSETS_8)
    }

    fn offset_neighbors(
        self,
        index: usize,
        offsets: &'static [(i64, i64)],
    ) -> impl Iterator<Item = usize> {
        let origin = self.coord(index);
        let (width, depth) = (i64::from(self.width), i64::from(self.depth));
        offsets.iter().filter_map(move |&(dx, dz)| {
            let x = i64::from(origin.x) + dx;
            let z = i64::from(origin.z) + dz;
            if x < 0 || z < 0 || x >= width || z >= depth {
                return None;
            }
            Some(z as usize * width as usize + x as usize)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_corner_neighbors() {
        let dims = GridDims::new(3, 3).expect("valid dims");
        let corner: Vec<usize> = dims.neighbors4(0).collect();
        assert_eq!(corner, vec![1, 3]);

        let center: Vec<usize> = dims.neighbors4(4).collect();
        assert_eq!(center, vec![3, 5, 1, 7]);

        assert_eq!(dims.neighbors8(4).count(), 8);
        assert_eq!(dims.neighbors8(8).count(), 3);
    }

    #[test]
    fn test_single_cell_grid_has_no_neighbors() {
        let dims = GridDims::new(1, 1).expect("valid dims");
        assert_eq!(dims.neighbors4(0).count(), 0);
        assert_eq!(dims.neighbors8(0).count(), 0);
    }

    #[test]
    fn test_out_of_bounds_index() {
        let dims = GridDims::new(4, 2).expect("valid dims");
        assert!(matches!(
            dims.index(GridCoord::new(4, 0)),
            Err(GridError::OutOfBounds { x: 4, z: 0, .. })
        ));
        assert_eq!(dims.index(GridCoord::new(3, 1)).expect("in bounds"), 7);
    }

    #[test]
    fn test_raw_dims_are_validated() {
        assert!(GridDims::try_from(RawDims { width: 0, depth: 2 }).is_err());
        let dims = GridDims::try_from(RawDims { width: 5, depth: 2 }).expect("valid dims");
        assert_eq!(dims.len(), 10);
    }

    proptest! {
        #[test]
        fn prop_index_round_trip(width in 1u32..64, depth in 1u32..64, x in 0u32..64, z in 0u32..64) {
            let dims = GridDims::new(width, depth).expect("valid dims");
            let coord = GridCoord::new(x % width, z % depth);
            let index = dims.index(coord).expect("in bounds");
            prop_assert!(index < dims.len());
            prop_assert_eq!(dims.coord(index), coord);
        }

        #[test]
        fn prop_neighbors_are_adjacent(width in 1u32..32, depth in 1u32..32, seed in 0usize..1024) {
            let dims = GridDims::new(width, depth).expect("valid dims");
            let index = seed % dims.len();
            let origin = dims.coord(index);
            for n in dims.neighbors4(index) {
                let c = dims.coord(n);
                let dist = origin.x.abs_diff(c.x) + origin.z.abs_diff(c.z);
                prop_assert_eq!(dist, 1);
            }
        }
    }
}
