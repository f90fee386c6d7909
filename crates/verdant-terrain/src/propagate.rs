//! Constrained terrain growth.
//!
//! Cells start undecided. A handful of seeds are planted, then a FIFO work
//! queue grows terrain outward: each undecided neighbor of a decided cell is
//! given a height and type that agree with every decided neighbor, sampled
//! with a bounded number of retries. When the retries run out the cell is
//! forced to the midpoint of its valid range and recorded as a fallback, so
//! growth always terminates.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use verdant_common::{GenerationError, GridCoord, GridDims, GridError};

use crate::classify::TileClassifier;
use crate::climate::ClimateFields;
use crate::postprocess::roll_spawn_features;
use crate::rules::{HeightRange, TerrainRuleSet};
use crate::terrain::TerrainType;
use crate::tile::{TerrainTile, TileGrid};

/// Growth settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Global lower height bound
    pub min_height: f32,
    /// Global upper height bound
    pub max_height: f32,
    /// Largest height step allowed between 4-connected neighbors
    pub max_height_delta: f32,
    /// Sampling attempts per cell before falling back
    pub retry_budget: u32,
    /// Minimum number of seeds
    pub seed_floor: u32,
    /// Seeds = sqrt(width * depth) / divisor, at least `seed_floor`
    pub seed_divisor: f32,
    /// Largest random upward bump for hills
    pub hill_bump: f32,
    /// Largest random upward bump for mountains
    pub mountain_bump: f32,
    /// Roll spawn features on seed tiles
    pub seed_features: bool,
    /// Fallback share of cells above which a run logs a warning
    pub fallback_warn_ratio: f32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            min_height: 0.0,
            max_height: 15.0,
            max_height_delta: 2.0,
            retry_budget: 5,
            seed_floor: 2,
            seed_divisor: 20.0,
            hill_bump: 0.5,
            mountain_bump: 1.0,
            seed_features: true,
            fallback_warn_ratio: 0.05,
        }
    }
}

impl GrowthConfig {
    /// Global height bound as a range.
    #[must_use]
    pub fn height_bounds(&self) -> HeightRange {
        HeightRange::new(self.min_height, self.max_height.max(self.min_height))
    }

    /// Number of random seeds for a grid.
    #[must_use]
    pub fn seed_count(&self, dims: GridDims) -> usize {
        let scaled = if self.seed_divisor > 0.0 {
            ((dims.len() as f64).sqrt() / f64::from(self.seed_divisor)) as usize
        } else {
            0
        };
        scaled.max(self.seed_floor as usize).clamp(1, dims.len())
    }
}

/// Arena slot: a cell is either still open or holds its tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    /// Not assigned yet
    Undecided,
    /// Assigned; never reverts to undecided
    Decided(TerrainTile),
}

impl Cell {
    /// The tile, if decided.
    #[must_use]
    pub const fn tile(&self) -> Option<&TerrainTile> {
        match self {
            Self::Undecided => None,
            Self::Decided(tile) => Some(tile),
        }
    }

    /// Whether the cell has been assigned.
    #[must_use]
    pub const fn is_decided(&self) -> bool {
        matches!(self, Self::Decided(_))
    }
}

/// What happened during growth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthReport {
    /// Seeds planted, including coverage reseeds
    pub seeds: usize,
    /// Cells forced to the midpoint of their valid range
    pub fallbacks: Vec<GridCoord>,
    /// Seeds planted after the queue drained with cells still open
    pub coverage_reseeds: usize,
}

impl GrowthReport {
    /// Share of `cells` that went through the fallback path.
    #[must_use]
    pub fn fallback_ratio(&self, cells: usize) -> f32 {
        if cells == 0 {
            return 0.0;
        }
        self.fallbacks.len() as f32 / cells as f32
    }

    /// Whether the cell at `coord` was a fallback.
    #[must_use]
    pub fn is_fallback(&self, coord: GridCoord) -> bool {
        self.fallbacks.contains(&coord)
    }
}

/// Queue-driven growth over an arena of cells.
pub struct GrowthPropagator<'a> {
    config: &'a GrowthConfig,
    rules: &'a TerrainRuleSet,
    classifier: &'a TileClassifier,
    climate: &'a ClimateFields,
    rng: &'a mut fastrand::Rng,
    dims: GridDims,
    bounds: HeightRange,
    cells: Vec<Cell>,
    undecided: usize,
    queue: VecDeque<usize>,
    report: GrowthReport,
}

impl<'a> GrowthPropagator<'a> {
    /// Creates a propagator over the grid described by `climate`.
    pub fn new(
        config: &'a GrowthConfig,
        rules: &'a TerrainRuleSet,
        classifier: &'a TileClassifier,
        climate: &'a ClimateFields,
        rng: &'a mut fastrand::Rng,
    ) -> Self {
        let dims = climate.dims();
        Self {
            config,
            rules,
            classifier,
            climate,
            rng,
            dims,
            bounds: config.height_bounds(),
            cells: vec![Cell::Undecided; dims.len()],
            undecided: dims.len(),
            queue: VecDeque::new(),
            report: GrowthReport::default(),
        }
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn dims(&self) -> GridDims {
        self.dims
    }

    /// Cell at a coordinate, if in bounds.
    #[must_use]
    pub fn cell(&self, coord: GridCoord) -> Option<&Cell> {
        self.dims.index(coord).ok().map(|i| &self.cells[i])
    }

    /// Number of cells still undecided.
    #[must_use]
    pub const fn undecided_count(&self) -> usize {
        self.undecided
    }

    /// Seeds, grows and fills the whole grid, then hands it over.
    pub fn run(mut self, seed: u64) -> Result<(TileGrid, GrowthReport), GenerationError> {
        self.seed_random();
        self.propagate();
        self.ensure_coverage();
        self.finish(seed)
    }

    /// Plants the configured number of seeds at random open cells.
    pub fn seed_random(&mut self) -> usize {
        let count = self.config.seed_count(self.dims);
        let mut planted = 0;
        for _ in 0..count {
            let Some(index) = self.random_undecided() else {
                break;
            };
            self.plant(index);
            planted += 1;
        }
        debug!("Planted {planted} seeds on {}x{} grid", self.dims.width(), self.dims.depth());
        planted
    }

    /// Plants a seed with a given height. The type is classified from the
    /// height and the cell's climate; no neighbor validation is done.
    ///
    /// Returns `false` if the cell was already decided.
    pub fn seed_at(&mut self, coord: GridCoord, height: f32) -> Result<bool, GridError> {
        let index = self.dims.index(coord)?;
        if self.cells[index].is_decided() {
            return Ok(false);
        }
        let height = self.bounds.clamp(height);
        let (moisture, temperature) = self.climate_at(index);
        let terrain = self.classifier.classify_climate(height, moisture, temperature);
        self.decide(index, TerrainTile::new(height, terrain, moisture, temperature));
        self.report.seeds += 1;
        Ok(true)
    }

    /// Drains the work queue, deciding every open neighbor of each popped cell.
    pub fn propagate(&mut self) {
        while let Some(index) = self.queue.pop_front() {
            for neighbor in self.dims.neighbors4(index) {
                if !self.cells[neighbor].is_decided() {
                    self.resolve(neighbor);
                }
            }
        }
    }

    /// Reseeds and floods any region left open after the queue drained.
    ///
    /// Returns the number of reseeds. Each one points at too few seeds.
    pub fn ensure_coverage(&mut self) -> usize {
        let mut reseeds = 0;
        while self.undecided > 0 {
            let Some(index) = self.cells.iter().position(|c| !c.is_decided()) else {
                break;
            };
            let coord = self.dims.coord(index);
            warn!(
                "{} cells undecided after propagation, reseeding at ({}, {})",
                self.undecided, coord.x, coord.z
            );
            self.plant(index);
            self.propagate();
            reseeds += 1;
        }
        self.report.coverage_reseeds += reseeds;
        reseeds
    }

    /// Converts the arena into a tile grid.
    pub fn finish(self, seed: u64) -> Result<(TileGrid, GrowthReport), GenerationError> {
        if self.undecided > 0 {
            return Err(GenerationError::UnreachableCells {
                count: self.undecided,
            });
        }
        let tiles: Vec<TerrainTile> = self.cells.iter().filter_map(Cell::tile).copied().collect();
        let missing = self.dims.len() - tiles.len();
        let grid = TileGrid::from_tiles(self.dims, seed, tiles)
            .map_err(|_| GenerationError::UnreachableCells { count: missing })?;
        Ok((grid, self.report))
    }

    fn climate_at(&self, index: usize) -> (f32, f32) {
        (
            self.climate.moisture().get(index),
            self.climate.temperature().get(index),
        )
    }

    fn random_undecided(&mut self) -> Option<usize> {
        if self.undecided == 0 {
            return None;
        }
        let len = self.cells.len();
        for _ in 0..8 {
            let index = self.rng.usize(..len);
            if !self.cells[index].is_decided() {
                return Some(index);
            }
        }
        let start = self.rng.usize(..len);
        (0..len)
            .map(|k| (start + k) % len)
            .find(|&i| !self.cells[i].is_decided())
    }

    /// Seeds one cell. A seed touching decided cells is validated like any
    /// propagated cell.
    fn plant(&mut self, index: usize) {
        let has_neighbors = self
            .dims
            .neighbors4(index)
            .any(|n| self.cells[n].is_decided());

        if has_neighbors {
            self.resolve(index);
        } else {
            let (moisture, temperature) = self.climate_at(index);
            let height = self.bounds.clamp(self.rules.weighted_height(self.rng));
            let terrain = self.classifier.classify_climate(height, moisture, temperature);
            let height = self.settle_height(height, terrain, self.bounds);
            self.decide(index, TerrainTile::new(height, terrain, moisture, temperature));
        }

        if self.config.seed_features {
            if let Cell::Decided(tile) = &mut self.cells[index] {
                roll_spawn_features(self.rules, tile.terrain, &mut tile.features, self.rng);
            }
        }
        self.report.seeds += 1;
    }

    /// Assigns one open cell against its decided neighbors.
    fn resolve(&mut self, index: usize) {
        let mut neighbors = [(0.0, TerrainType::Grassland); 4];
        let mut count = 0;
        for n in self.dims.neighbors4(index) {
            if let Some(tile) = self.cells[n].tile() {
                neighbors[count] = (tile.height, tile.terrain);
                count += 1;
            }
        }
        let neighbors = &neighbors[..count];
        let window = self.valid_range(neighbors);
        let (moisture, temperature) = self.climate_at(index);

        // An empty window means no height is within reach of every neighbor.
        if let Some(range) = window {
            for attempt in 0..self.config.retry_budget {
                let height = if attempt == 0 {
                    self.bounds.clamp(self.rules.weighted_height(self.rng))
                } else {
                    range.sample(self.rng)
                };
                let terrain = self.classifier.classify_climate(height, moisture, temperature);
                if self.is_consistent(height, terrain, neighbors) {
                    let height = self.settle_height(height, terrain, range);
                    self.decide(index, TerrainTile::new(height, terrain, moisture, temperature));
                    return;
                }
            }
        }

        let height = window.unwrap_or_else(|| self.mean_window(neighbors)).midpoint();
        let terrain = self.classifier.classify_climate(height, moisture, temperature);
        let coord = self.dims.coord(index);
        trace!(
            "Fallback at ({}, {}): {} at {height:.2}",
            coord.x,
            coord.z,
            terrain.display_name()
        );
        self.report.fallbacks.push(coord);
        self.decide(index, TerrainTile::new(height, terrain, moisture, temperature));
    }

    /// Heights within the max delta of every decided neighbor, inside the
    /// global bound: the intersection of every neighbor's own window, which
    /// always lies within the neighbor mean plus or minus the delta. With no
    /// decided neighbors the whole bound is valid; `None` when the windows
    /// do not overlap.
    fn valid_range(&self, neighbors: &[(f32, TerrainType)]) -> Option<HeightRange> {
        let delta = self.config.max_height_delta;
        let (min, max) = neighbors
            .iter()
            .fold((self.bounds.min, self.bounds.max), |(min, max), &(h, _)| {
                (min.max(h - delta), max.min(h + delta))
            });
        (min <= max).then(|| HeightRange::new(min, max))
    }

    /// Neighbor mean plus or minus the delta, inside the global bound.
    fn mean_window(&self, neighbors: &[(f32, TerrainType)]) -> HeightRange {
        if neighbors.is_empty() {
            return self.bounds;
        }
        let delta = self.config.max_height_delta;
        let mean = neighbors.iter().map(|&(h, _)| h).sum::<f32>() / neighbors.len() as f32;
        HeightRange::new(mean - delta, mean + delta).clamp_to(self.bounds)
    }

    fn is_consistent(&self, height: f32, terrain: TerrainType, neighbors: &[(f32, TerrainType)]) -> bool {
        neighbors.iter().all(|&(h, t)| {
            self.rules.is_compatible(terrain, t) && (height - h).abs() <= self.config.max_height_delta
        })
    }

    /// Type-specific height variation, kept inside both the type's range and
    /// the window the height was drawn from.
    fn settle_height(&mut self, height: f32, terrain: TerrainType, window: HeightRange) -> f32 {
        let bumped = match terrain {
            TerrainType::Hills => height + self.rng.f32() * self.config.hill_bump,
            TerrainType::Mountains => height + self.rng.f32() * self.config.mountain_bump,
            TerrainType::DeepWater | TerrainType::ShallowWater | TerrainType::Beach => height,
            _ => return height,
        };
        self.rules
            .height_range(terrain)
            .clamp_to(window)
            .clamp(bumped)
    }

    fn decide(&mut self, index: usize, tile: TerrainTile) {
        debug_assert!(!self.cells[index].is_decided());
        self.cells[index] = Cell::Decided(tile);
        self.undecided -= 1;
        self.queue.push_back(index);
    }
}
