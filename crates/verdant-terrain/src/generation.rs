//! Terrain generation entry point.
//!
//! One run: climate fields, then growth, then post-processing. A run owns its
//! random generator and produces a finished [`TileGrid`]; nothing is shared
//! between runs, so independent runs may execute in parallel.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use verdant_common::{GridDims, VerdantError, VerdantResult};

use crate::classify::{ClassifierThresholds, TileClassifier};
use crate::climate::{ClimateConfig, ClimateFieldGenerator};
use crate::postprocess::{PostProcessor, PostReport, SmoothingConfig};
use crate::propagate::{GrowthConfig, GrowthPropagator, GrowthReport};
use crate::rules::TerrainRuleSet;
use crate::tile::TileGrid;

/// Complete generator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Growth settings
    pub growth: GrowthConfig,
    /// Climate field settings
    pub climate: ClimateConfig,
    /// Smoothing settings
    pub smoothing: SmoothingConfig,
    /// Classifier bands and thresholds
    pub classifier: ClassifierThresholds,
    /// Rule tables
    pub rules: TerrainRuleSet,
}

impl GeneratorConfig {
    /// Parses a TOML document. Missing sections use defaults; a `rules`
    /// list that leaves out a terrain type is rejected.
    pub fn from_toml_str(text: &str) -> VerdantResult<Self> {
        toml::from_str(text).map_err(|e| VerdantError::Config(e.to_string()))
    }

    /// Reads and parses a TOML file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> VerdantResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded generator config from {}", path.display());
        Ok(config)
    }

    /// Serializes to TOML.
    pub fn to_toml_string(&self) -> VerdantResult<String> {
        toml::to_string_pretty(self).map_err(|e| VerdantError::Config(e.to_string()))
    }

    /// Checks values the type system cannot.
    pub fn validate(&self) -> VerdantResult<()> {
        let g = &self.growth;
        if !(g.min_height.is_finite() && g.max_height.is_finite()) || g.min_height >= g.max_height {
            return Err(VerdantError::Config(format!(
                "height bounds [{}, {}] are empty",
                g.min_height, g.max_height
            )));
        }
        if !g.max_height_delta.is_finite() || g.max_height_delta <= 0.0 {
            return Err(VerdantError::Config(format!(
                "max_height_delta {} must be positive",
                g.max_height_delta
            )));
        }
        if !(0.0..=1.0).contains(&self.smoothing.climate_blend) {
            return Err(VerdantError::Config(format!(
                "climate_blend {} outside [0, 1]",
                self.smoothing.climate_blend
            )));
        }
        TerrainRuleSet::from_entries(self.rules.entries())?;
        Ok(())
    }
}

/// Statistics for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Seed the run used
    pub seed: u64,
    /// Growth statistics
    pub growth: GrowthReport,
    /// Post-processing statistics
    pub post: PostReport,
}

/// Output of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// The finished grid
    pub grid: TileGrid,
    /// What happened while producing it
    pub report: GenerationReport,
}

/// Terrain generator.
#[derive(Debug)]
pub struct TerrainGenerator {
    config: GeneratorConfig,
    classifier: TileClassifier,
    climate: ClimateFieldGenerator,
    seeds: fastrand::Rng,
}

impl TerrainGenerator {
    /// Creates a generator after validating the configuration.
    pub fn new(config: GeneratorConfig) -> VerdantResult<Self> {
        Self::with_seed_source(config, fastrand::u64(..))
    }

    /// Like [`TerrainGenerator::new`], with a fixed seed for the stream that
    /// [`TerrainGenerator::regenerate`] draws from.
    pub fn with_seed_source(config: GeneratorConfig, seed_source: u64) -> VerdantResult<Self> {
        config.validate()?;
        Ok(Self {
            classifier: TileClassifier::new(config.classifier),
            climate: ClimateFieldGenerator::new(config.climate),
            config,
            seeds: fastrand::Rng::with_seed(seed_source),
        })
    }

    /// Creates a generator with the default configuration.
    pub fn with_defaults() -> VerdantResult<Self> {
        Self::new(GeneratorConfig::default())
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates a grid. Without a seed one is drawn at random and logged.
    pub fn generate(&self, width: u32, depth: u32, seed: Option<u64>) -> VerdantResult<Generation> {
        let dims = GridDims::new(width, depth)?;
        let seed = seed.unwrap_or_else(|| fastrand::u64(..));
        self.run(dims, seed)
    }

    /// Generates a whole new grid from the next seed in this generator's
    /// stream. Earlier grids are untouched.
    pub fn regenerate(&mut self, width: u32, depth: u32) -> VerdantResult<Generation> {
        let dims = GridDims::new(width, depth)?;
        let seed = self.seeds.u64(..);
        self.run(dims, seed)
    }

    fn run(&self, dims: GridDims, seed: u64) -> VerdantResult<Generation> {
        info!(
            "Generating {}x{} terrain with seed {seed}",
            dims.width(),
            dims.depth()
        );
        let config = &self.config;
        let climate = self.climate.generate_pair(dims, seed);
        let mut rng = fastrand::Rng::with_seed(seed);

        let (mut grid, growth) = GrowthPropagator::new(
            &config.growth,
            &config.rules,
            &self.classifier,
            &climate,
            &mut rng,
        )
        .run(seed)?;

        let ratio = growth.fallback_ratio(dims.len());
        if ratio > config.growth.fallback_warn_ratio {
            warn!(
                "{} of {} cells used the fallback ({:.1}%)",
                growth.fallbacks.len(),
                dims.len(),
                ratio * 100.0
            );
        }

        let post = PostProcessor::new(&config.smoothing, &config.rules, &self.classifier)
            .run(&mut grid, &mut rng);

        info!(
            "Terrain ready: {} seeds, {} fallbacks, {} reseeds, {} smoothed, {} features",
            growth.seeds,
            growth.fallbacks.len(),
            growth.coverage_reseeds,
            post.smoothed_cells,
            post.features_added
        );

        Ok(Generation {
            grid,
            report: GenerationReport { seed, growth, post },
        })
    }
}

/// Generates a grid with the default configuration.
pub fn generate_terrain(width: u32, depth: u32, seed: Option<u64>) -> VerdantResult<TileGrid> {
    let generator = TerrainGenerator::with_defaults()?;
    Ok(generator.generate(width, depth, seed)?.grid)
}
