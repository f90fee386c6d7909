//! End-to-end scenarios for the generation pipeline.
//!
//! These run the real stages together (climate, growth, post-processing) and
//! check the properties a finished grid must have.

#![cfg(test)]

use verdant_common::{GenerationError, GridCoord, GridDims, GridError, VerdantError};

use crate::classify::TileClassifier;
use crate::climate::{ClimateConfig, ClimateFieldGenerator, ClimateFields};
use crate::generation::{generate_terrain, GeneratorConfig, TerrainGenerator};
use crate::postprocess::{PostProcessor, SmoothingConfig};
use crate::propagate::{GrowthConfig, GrowthPropagator, GrowthReport};
use crate::rules::TerrainRuleSet;
use crate::terrain::TerrainType;
use crate::tile::TileGrid;

/// Stages shared by the scenarios, with real climate fields.
struct Pipeline {
    growth: GrowthConfig,
    rules: TerrainRuleSet,
    classifier: TileClassifier,
    climate: ClimateFields,
    rng: fastrand::Rng,
}

impl Pipeline {
    fn new(width: u32, depth: u32, seed: u64) -> Self {
        let dims = GridDims::new(width, depth).expect("valid dims");
        Self {
            growth: GrowthConfig::default(),
            rules: TerrainRuleSet::default(),
            classifier: TileClassifier::default(),
            climate: ClimateFieldGenerator::new(ClimateConfig::default()).generate_pair(dims, seed),
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    fn propagator(&mut self) -> GrowthPropagator<'_> {
        GrowthPropagator::new(
            &self.growth,
            &self.rules,
            &self.classifier,
            &self.climate,
            &mut self.rng,
        )
    }

    fn grow(&mut self, seed: u64) -> (TileGrid, GrowthReport) {
        self.propagator().run(seed).expect("full coverage")
    }
}

fn assert_violations_are_fallbacks(grid: &TileGrid, rules: &TerrainRuleSet, report: &GrowthReport) {
    let dims = grid.dims();
    for (i, tile) in grid.tiles().iter().enumerate() {
        for n in dims.neighbors4(i) {
            let other = &grid.tiles()[n];
            if rules.is_compatible(tile.terrain, other.terrain) {
                continue;
            }
            assert!(
                report.is_fallback(dims.coord(i)) || report.is_fallback(dims.coord(n)),
                "{} next to {} at {:?} without a recorded fallback",
                tile.terrain.display_name(),
                other.terrain.display_name(),
                dims.coord(i)
            );
        }
    }
}

mod growth_scenarios {
    use super::*;

    #[test]
    fn e2e_every_cell_is_assigned() {
        for (width, depth, seed) in [(1, 1, 1), (1, 40, 2), (40, 1, 3), (37, 23, 4), (64, 64, 5)] {
            let grid = generate_terrain(width, depth, Some(seed)).expect("generated");
            assert_eq!(grid.tiles().len(), (width * depth) as usize);
            assert_eq!(grid.iter().count(), (width * depth) as usize);
        }
    }

    #[test]
    fn e2e_heights_lie_in_declared_ranges() {
        let generator = TerrainGenerator::with_defaults().expect("defaults are valid");
        let rules = &generator.config().rules;
        for seed in [1, 42, 4242] {
            let generation = generator.generate(48, 32, Some(seed)).expect("generated");
            for (coord, tile) in generation.grid.iter() {
                let range = rules.height_range(tile.terrain);
                assert!(
                    range.contains(tile.height),
                    "{} at {:?} has height {} outside [{}, {}]",
                    tile.terrain.display_name(),
                    coord,
                    tile.height,
                    range.min,
                    range.max
                );
            }
        }
    }

    #[test]
    fn e2e_adjacency_violations_only_at_fallbacks() {
        for (size, seed) in [(40, 7), (40, 8), (40, 9), (50, 1), (50, 42), (50, 99)] {
            let mut pipeline = Pipeline::new(size, size, seed);
            let (grid, report) = pipeline.grow(seed);
            assert_violations_are_fallbacks(&grid, &pipeline.rules, &report);
            assert!(
                report.fallback_ratio(grid.tiles().len()) < 0.05,
                "fallback ratio {} for seed {seed}",
                report.fallback_ratio(grid.tiles().len())
            );
        }
    }

    #[test]
    fn e2e_small_grid_grows_from_one_explicit_seed() {
        let mut pipeline = Pipeline::new(5, 5, 11);
        let mut propagator = pipeline.propagator();
        assert!(propagator
            .seed_at(GridCoord::new(0, 0), 1.0)
            .expect("in bounds"));
        assert_eq!(propagator.undecided_count(), 24);

        propagator.propagate();
        assert_eq!(propagator.undecided_count(), 0);
        assert_eq!(propagator.ensure_coverage(), 0);

        let (grid, report) = propagator.finish(11).expect("full coverage");
        assert_eq!(report.seeds, 1);
        assert_eq!(report.coverage_reseeds, 0);

        let origin = grid.get(0, 0).expect("origin");
        assert_eq!(origin.terrain, TerrainType::DeepWater);
        assert_eq!(origin.height, 1.0);

        let corner = grid.get(4, 4).expect("corner");
        assert!((0.0..=15.0).contains(&corner.height));
        assert_violations_are_fallbacks(&grid, &pipeline.rules, &report);
    }

    #[test]
    fn e2e_unseeded_regions_are_reseeded() {
        let mut pipeline = Pipeline::new(9, 9, 13);
        let mut propagator = pipeline.propagator();
        propagator.propagate();
        assert_eq!(propagator.undecided_count(), 81);
        assert_eq!(propagator.ensure_coverage(), 1);
        let (grid, report) = propagator.finish(13).expect("full coverage");
        assert_eq!(report.coverage_reseeds, 1);
        assert_eq!(grid.tiles().len(), 81);
    }
}

mod determinism_scenarios {
    use super::*;

    #[test]
    fn e2e_same_seed_same_grid() {
        let first = generate_terrain(50, 50, Some(42)).expect("generated");
        let second = generate_terrain(50, 50, Some(42)).expect("generated");
        assert_eq!(first, second);
    }

    #[test]
    fn e2e_independent_generators_agree() {
        let a = TerrainGenerator::with_defaults().expect("valid");
        let b = TerrainGenerator::with_defaults().expect("valid");
        assert_eq!(
            a.generate(30, 20, Some(99)).expect("generated"),
            b.generate(30, 20, Some(99)).expect("generated")
        );
    }

    #[test]
    fn e2e_unseeded_runs_report_their_seed() {
        let generator = TerrainGenerator::with_defaults().expect("valid");
        let generation = generator.generate(16, 16, None).expect("generated");
        let replay = generator
            .generate(16, 16, Some(generation.report.seed))
            .expect("generated");
        assert_eq!(generation, replay);
    }
}

mod post_scenarios {
    use super::*;

    #[test]
    fn e2e_post_processing_never_removes_features() {
        let mut pipeline = Pipeline::new(40, 30, 17);
        let (mut grid, _) = pipeline.grow(17);
        let before = grid.clone();

        let smoothing = SmoothingConfig::default();
        let post = PostProcessor::new(&smoothing, &pipeline.rules, &pipeline.classifier);
        let report = post.run(&mut grid, &mut pipeline.rng);

        let mut added = 0;
        for (old, new) in before.tiles().iter().zip(grid.tiles()) {
            assert!(new.features.is_superset(old.features));
            added += new.features.len() - old.features.len();
        }
        assert_eq!(added, report.features_added);
    }

    #[test]
    fn e2e_smoothing_never_moves_a_cell_away_from_its_neighbors() {
        let mut pipeline = Pipeline::new(48, 48, 31);
        let (mut grid, growth) = pipeline.grow(31);
        let dims = grid.dims();
        let before: Vec<f32> = grid.tiles().iter().map(|t| t.height).collect();

        let smoothing = SmoothingConfig::default();
        let (smoothed, _) =
            PostProcessor::new(&smoothing, &pipeline.rules, &pipeline.classifier).smooth(&mut grid);
        let after: Vec<f32> = grid.tiles().iter().map(|t| t.height).collect();

        let deviation = |heights: &[f32], own: f32, i: usize| {
            let (sum, count) = dims
                .neighbors4(i)
                .fold((0.0f32, 0u8), |(sum, count), n| (sum + heights[n], count + 1));
            (own - sum / f32::from(count)).abs()
        };

        let mut drifted = 0;
        for i in 0..dims.len() {
            let pre = deviation(&before, before[i], i);
            // Against the neighbors as they were read, every cell moves closer or stays.
            assert!(deviation(&before, after[i], i) <= pre + 1e-4, "cell {i} moved away");
            // Neighbors move in the same pass, so the final deviation can grow.
            if deviation(&after, after[i], i) > pre + 1e-4 {
                drifted += 1;
            }
        }

        // Only a nudged cell or a neighbor of one can change its deviation,
        // and only fallback seams are steep enough to be nudged.
        assert!(drifted <= 5 * smoothed, "{drifted} drifted, {smoothed} smoothed");
        assert!(smoothed <= 5 * growth.fallbacks.len());
    }

    #[test]
    fn e2e_smoothing_keeps_heights_in_range() {
        let mut pipeline = Pipeline::new(32, 32, 23);
        let (mut grid, _) = pipeline.grow(23);
        let smoothing = SmoothingConfig::default();
        PostProcessor::new(&smoothing, &pipeline.rules, &pipeline.classifier).smooth(&mut grid);
        for tile in grid.tiles() {
            assert!(pipeline.rules.height_range(tile.terrain).contains(tile.height));
            assert!((0.0..=1.0).contains(&tile.moisture));
            assert!((0.0..=1.0).contains(&tile.temperature));
        }
    }
}

mod error_scenarios {
    use super::*;

    #[test]
    fn e2e_zero_width_is_invalid() {
        assert!(matches!(
            generate_terrain(0, 5, Some(1)),
            Err(VerdantError::Grid(GridError::InvalidDimensions { width: 0, depth: 5 }))
        ));
        assert!(generate_terrain(5, 0, None).is_err());
    }

    #[test]
    fn e2e_rule_set_gap_is_reported() {
        let mut entries = crate::rules::default_entries();
        entries.retain(|e| e.terrain != TerrainType::Swamp);
        let err = TerrainRuleSet::from_entries(entries).expect_err("gap");
        assert!(matches!(err, GenerationError::RuleSetGap { .. }));
        assert!(err.to_string().contains("Swamp"), "{err}");
    }

    #[test]
    fn e2e_missing_adjacency_is_a_gap() {
        let mut entries = crate::rules::default_entries();
        entries[0].neighbors = None;
        let terrain = entries[0].terrain;
        assert_eq!(
            TerrainRuleSet::from_entries(entries),
            Err(GenerationError::RuleSetGap {
                table: "adjacency",
                terrain: terrain.display_name().to_string(),
            })
        );
    }

    #[test]
    fn e2e_gap_in_config_file_fails_generator() {
        let text = r#"
[[rules]]
terrain = "deep_water"
height = { min = 0.0, max = 2.0 }
weight = 1.0
neighbors = ["deep_water"]
"#;
        assert!(GeneratorConfig::from_toml_str(text).is_err());
    }
}
