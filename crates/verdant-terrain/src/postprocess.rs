//! Post-processing of a fully decided grid.
//!
//! Two passes, in order:
//!
//! 1. **Smoothing.** Heights that stick out from their 4-neighbor average by
//!    more than a threshold are nudged one step toward it and reclassified.
//!    Moisture and temperature are blended with their neighbor averages.
//!    Reads come from a snapshot taken before any write, so the pass does
//!    not depend on iteration order.
//! 2. **Features.** Each cell rolls its terrain's spawn table, then a fixed
//!    set of contextual rules that look at the features on the 8 surrounding
//!    cells. This sweep reads neighbors' *current* features: a feature placed
//!    earlier in the sweep can trigger rules further along it. That spreading
//!    is intentional and changing it changes the output distribution.
//!
//! Features are only ever added.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::TileClassifier;
use crate::rules::TerrainRuleSet;
use crate::terrain::{FeatureSet, FeatureType, TerrainType};
use crate::tile::TileGrid;

/// Smoothing settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Deviation from the neighbor average that triggers a nudge
    pub height_threshold: f32,
    /// Size of one nudge
    pub height_step: f32,
    /// Weight of the neighbor average when blending climate (0 = keep, 1 = replace)
    pub climate_blend: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            height_threshold: 2.0,
            height_step: 1.0,
            climate_blend: 0.5,
        }
    }
}

/// A feature that may appear on a cell given its terrain and surroundings.
#[derive(Debug, Clone, Copy)]
pub struct ContextRule {
    /// Feature added when the rule fires
    pub feature: FeatureType,
    /// Terrain filter for the cell itself
    pub terrain: fn(TerrainType) -> bool,
    /// Feature that must be present on an 8-neighbor, if any
    pub near: Option<FeatureType>,
    /// Chance of firing when the conditions hold
    pub probability: f32,
}

fn is_land(terrain: TerrainType) -> bool {
    !terrain.is_water()
}

fn is_upland(terrain: TerrainType) -> bool {
    matches!(terrain, TerrainType::Hills | TerrainType::Mountains)
}

fn is_mountain(terrain: TerrainType) -> bool {
    terrain == TerrainType::Mountains
}

fn is_high_peak(terrain: TerrainType) -> bool {
    matches!(terrain, TerrainType::Mountains | TerrainType::SnowPeaks)
}

fn is_forsaken(terrain: TerrainType) -> bool {
    matches!(terrain, TerrainType::Swamp | TerrainType::Wasteland)
}

/// Built-in contextual feature rules, checked in this order.
pub static CONTEXT_RULES: [ContextRule; 7] = [
    ContextRule {
        feature: FeatureType::Castle,
        terrain: is_upland,
        near: Some(FeatureType::Village),
        probability: 0.30,
    },
    ContextRule {
        feature: FeatureType::MagicalCrystal,
        terrain: is_land,
        near: Some(FeatureType::Ruins),
        probability: 0.15,
    },
    ContextRule {
        feature: FeatureType::CaveEntrance,
        terrain: is_mountain,
        near: None,
        probability: 0.05,
    },
    ContextRule {
        feature: FeatureType::Temple,
        terrain: is_land,
        near: Some(FeatureType::StandingStones),
        probability: 0.20,
    },
    ContextRule {
        feature: FeatureType::Tower,
        terrain: is_land,
        near: Some(FeatureType::Castle),
        probability: 0.15,
    },
    ContextRule {
        feature: FeatureType::DragonLair,
        terrain: is_high_peak,
        near: Some(FeatureType::CaveEntrance),
        probability: 0.05,
    },
    ContextRule {
        feature: FeatureType::Portal,
        terrain: is_forsaken,
        near: Some(FeatureType::MagicalCrystal),
        probability: 0.10,
    },
];

/// Counts from one post-processing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReport {
    /// Cells whose height was nudged
    pub smoothed_cells: usize,
    /// Nudged cells whose terrain type changed
    pub reclassified_cells: usize,
    /// Features added by the feature pass
    pub features_added: usize,
}

/// Rolls a terrain's spawn table onto `features`. Returns how many were added.
pub(crate) fn roll_spawn_features(
    rules: &TerrainRuleSet,
    terrain: TerrainType,
    features: &mut FeatureSet,
    rng: &mut fastrand::Rng,
) -> usize {
    let mut added = 0;
    for (feature, probability) in rules.feature_probabilities(terrain) {
        if !features.contains(feature) && rng.f32() < probability && features.insert(feature) {
            added += 1;
        }
    }
    added
}

/// Runs the smoothing and feature passes.
#[derive(Debug, Clone, Copy)]
pub struct PostProcessor<'a> {
    config: &'a SmoothingConfig,
    rules: &'a TerrainRuleSet,
    classifier: &'a TileClassifier,
    context_rules: &'a [ContextRule],
}

impl<'a> PostProcessor<'a> {
    /// Creates a post-processor with the built-in contextual rules.
    #[must_use]
    pub fn new(
        config: &'a SmoothingConfig,
        rules: &'a TerrainRuleSet,
        classifier: &'a TileClassifier,
    ) -> Self {
        Self {
            config,
            rules,
            classifier,
            context_rules: &CONTEXT_RULES,
        }
    }

    /// Replaces the contextual rule list.
    #[must_use]
    pub fn with_context_rules(mut self, context_rules: &'a [ContextRule]) -> Self {
        self.context_rules = context_rules;
        self
    }

    /// Smoothing, then features.
    pub fn run(&self, grid: &mut TileGrid, rng: &mut fastrand::Rng) -> PostReport {
        let (smoothed_cells, reclassified_cells) = self.smooth(grid);
        let features_added = self.place_features(grid, rng);
        debug!(
            "Post-processing: {smoothed_cells} smoothed, {reclassified_cells} reclassified, {features_added} features"
        );
        PostReport {
            smoothed_cells,
            reclassified_cells,
            features_added,
        }
    }

    /// Smoothing pass. Returns (nudged cells, reclassified cells).
    pub fn smooth(&self, grid: &mut TileGrid) -> (usize, usize) {
        let dims = grid.dims();
        let snapshot: Vec<[f32; 3]> = grid
            .tiles()
            .iter()
            .map(|t| [t.height, t.moisture, t.temperature])
            .collect();

        let mut smoothed = 0;
        let mut reclassified = 0;
        for (i, tile) in grid.tiles_mut().iter_mut().enumerate() {
            let mut sum = [0.0f32; 3];
            let mut count = 0u8;
            for n in dims.neighbors4(i) {
                for (acc, v) in sum.iter_mut().zip(snapshot[n]) {
                    *acc += v;
                }
                count += 1;
            }
            if count == 0 {
                continue;
            }
            let [avg_height, avg_moisture, avg_temperature] = sum.map(|s| s / f32::from(count));
            let [height, moisture, temperature] = snapshot[i];

            let diff = avg_height - height;
            if diff.abs() > self.config.height_threshold {
                tile.height = height + diff.signum() * self.config.height_step.min(diff.abs());
                let terrain = self
                    .classifier
                    .classify_climate(tile.height, moisture, temperature);
                if terrain != tile.terrain {
                    reclassified += 1;
                }
                tile.terrain = terrain;
                smoothed += 1;
            }

            let blend = self.config.climate_blend;
            tile.moisture = moisture + (avg_moisture - moisture) * blend;
            tile.temperature = temperature + (avg_temperature - temperature) * blend;
        }
        (smoothed, reclassified)
    }

    /// Feature pass. Returns the number of features added.
    pub fn place_features(&self, grid: &mut TileGrid, rng: &mut fastrand::Rng) -> usize {
        let dims = grid.dims();
        let tiles = grid.tiles_mut();
        let mut added = 0;

        for i in 0..tiles.len() {
            let nearby = dims
                .neighbors8(i)
                .fold(FeatureSet::EMPTY, |acc, n| acc.union(tiles[n].features));
            let terrain = tiles[i].terrain;
            let mut features = tiles[i].features;

            added += roll_spawn_features(self.rules, terrain, &mut features, rng);
            for rule in self.context_rules {
                if features.contains(rule.feature) || !(rule.terrain)(terrain) {
                    continue;
                }
                if rule.near.is_some_and(|near| !nearby.contains(near)) {
                    continue;
                }
                if rng.f32() < rule.probability && features.insert(rule.feature) {
                    added += 1;
                }
            }
            tiles[i].features = features;
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::default_entries;
    use crate::tile::TerrainTile;
    use verdant_common::GridDims;

    fn quiet_rules() -> TerrainRuleSet {
        let mut entries = default_entries();
        for entry in &mut entries {
            entry.features.clear();
        }
        TerrainRuleSet::from_entries(entries).expect("valid")
    }

    fn grid_from(width: u32, depth: u32, heights: &[f32]) -> TileGrid {
        let dims = GridDims::new(width, depth).expect("valid dims");
        let classifier = TileClassifier::default();
        let tiles = heights
            .iter()
            .map(|&h| TerrainTile::new(h, classifier.classify_height(h), 0.5, 0.5))
            .collect();
        TileGrid::from_tiles(dims, 0, tiles).expect("sized")
    }

    fn deviations(grid: &TileGrid) -> Vec<f32> {
        let dims = grid.dims();
        let tiles = grid.tiles();
        (0..tiles.len())
            .map(|i| {
                let (sum, count) = dims
                    .neighbors4(i)
                    .fold((0.0, 0.0), |(s, c), n| (s + tiles[n].height, c + 1.0));
                (tiles[i].height - sum / count).abs()
            })
            .collect()
    }

    #[test]
    fn test_spike_is_nudged_one_step() {
        let mut heights = vec![5.0; 25];
        heights[12] = 10.5;
        let mut grid = grid_from(5, 5, &heights);
        assert_eq!(grid.tiles()[12].terrain, TerrainType::Mountains);
        let before = deviations(&grid);

        let config = SmoothingConfig::default();
        let rules = quiet_rules();
        let classifier = TileClassifier::default();
        let (smoothed, reclassified) =
            PostProcessor::new(&config, &rules, &classifier).smooth(&mut grid);

        assert_eq!(smoothed, 1);
        assert_eq!(reclassified, 1);
        assert_eq!(grid.tiles()[12].height, 9.5);
        assert_eq!(grid.tiles()[12].terrain, TerrainType::Hills);

        let after = deviations(&grid);
        for (b, a) in before.iter().zip(&after) {
            assert!(a <= b, "deviation grew from {b} to {a}");
        }
    }

    #[test]
    fn test_flat_grid_unchanged() {
        let mut grid = grid_from(4, 4, &[6.0; 16]);
        let original = grid.clone();
        let config = SmoothingConfig::default();
        let rules = quiet_rules();
        let classifier = TileClassifier::default();
        assert_eq!(
            PostProcessor::new(&config, &rules, &classifier).smooth(&mut grid),
            (0, 0)
        );
        assert_eq!(grid, original);
    }

    #[test]
    fn test_climate_blends_halfway() {
        let mut grid = grid_from(3, 1, &[5.0; 3]);
        grid.tiles_mut()[1].moisture = 1.0;
        grid.tiles_mut()[0].moisture = 0.0;
        grid.tiles_mut()[2].moisture = 0.0;

        let config = SmoothingConfig::default();
        let rules = quiet_rules();
        let classifier = TileClassifier::default();
        PostProcessor::new(&config, &rules, &classifier).smooth(&mut grid);

        assert_eq!(grid.tiles()[1].moisture, 0.5);
        assert_eq!(grid.tiles()[0].moisture, 0.5);
        assert_eq!(grid.tiles()[0].temperature, 0.5);
    }

    #[test]
    fn test_context_rule_fires_next_to_required_feature() {
        let mut grid = grid_from(3, 3, &[8.0; 9]);
        grid.tiles_mut()[0].features.insert(FeatureType::Village);

        let certain = [ContextRule {
            probability: 1.0,
            ..CONTEXT_RULES[0]
        }];
        let config = SmoothingConfig::default();
        let rules = quiet_rules();
        let classifier = TileClassifier::default();
        let processor =
            PostProcessor::new(&config, &rules, &classifier).with_context_rules(&certain);
        let mut rng = fastrand::Rng::with_seed(1);
        processor.place_features(&mut grid, &mut rng);

        let castles: Vec<usize> = grid
            .tiles()
            .iter()
            .enumerate()
            .filter(|(_, t)| t.features.contains(FeatureType::Castle))
            .map(|(i, _)| i)
            .collect();
        // Castles only appear next to the village; the village cell itself
        // has no village neighbor.
        assert_eq!(castles, vec![1, 3, 4]);
    }

    #[test]
    fn test_sweep_reads_current_neighbor_state() {
        let mut grid = grid_from(5, 1, &[5.0; 5]);
        grid.tiles_mut()[0].features.insert(FeatureType::Ruins);

        let spreading = [ContextRule {
            feature: FeatureType::Ruins,
            terrain: is_land,
            near: Some(FeatureType::Ruins),
            probability: 1.0,
        }];
        let config = SmoothingConfig::default();
        let rules = quiet_rules();
        let classifier = TileClassifier::default();
        let mut rng = fastrand::Rng::with_seed(9);
        let added = PostProcessor::new(&config, &rules, &classifier)
            .with_context_rules(&spreading)
            .place_features(&mut grid, &mut rng);

        assert_eq!(added, 4);
        assert!(grid
            .tiles()
            .iter()
            .all(|t| t.features.contains(FeatureType::Ruins)));
    }

    #[test]
    fn test_features_only_grow() {
        let heights: Vec<f32> = (0..64).map(|i| (i % 15) as f32).collect();
        let mut grid = grid_from(8, 8, &heights);
        grid.tiles_mut()[10].features.insert(FeatureType::Ruins);
        grid.tiles_mut()[20].features.insert(FeatureType::Village);
        let before: Vec<FeatureSet> = grid.tiles().iter().map(|t| t.features).collect();

        let config = SmoothingConfig::default();
        let rules = TerrainRuleSet::default();
        let classifier = TileClassifier::default();
        let mut rng = fastrand::Rng::with_seed(77);
        PostProcessor::new(&config, &rules, &classifier).run(&mut grid, &mut rng);

        for (old, tile) in before.iter().zip(grid.tiles()) {
            assert!(tile.features.is_superset(*old));
        }
    }

    #[test]
    fn test_water_never_gets_land_rules() {
        let mut grid = grid_from(3, 3, &[1.0; 9]);
        grid.tiles_mut()[4].features.insert(FeatureType::StandingStones);
        let certain: Vec<ContextRule> = CONTEXT_RULES
            .iter()
            .map(|r| ContextRule {
                probability: 1.0,
                ..*r
            })
            .collect();
        let config = SmoothingConfig::default();
        let rules = quiet_rules();
        let classifier = TileClassifier::default();
        let mut rng = fastrand::Rng::with_seed(4);
        let added = PostProcessor::new(&config, &rules, &classifier)
            .with_context_rules(&certain)
            .place_features(&mut grid, &mut rng);
        assert_eq!(added, 0);
    }
}
