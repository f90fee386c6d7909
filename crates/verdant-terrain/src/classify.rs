//! Tile classification.
//!
//! Maps height, and optionally moisture and temperature, to a terrain type.
//! Height bands overlap with climate-driven types, so the checks run in a
//! fixed priority order and the first match wins:
//!
//! 1. deep water band
//! 2. shallow water band
//! 3. peak band
//! 4. hot and dry: desert
//! 5. wet lowland: swamp
//! 6. cold and above the mountain line: snow peaks
//! 7. mountain band
//! 8. hill band
//! 9. beach band
//! 10. very dry: wasteland
//! 11. very wet: dense forest
//! 12. wet: forest
//! 13. grassland
//!
//! The last branch is unconditional, so every input has a type.

use serde::{Deserialize, Serialize};

use crate::terrain::TerrainType;

/// Neutral climate used when only a height is known.
const NEUTRAL_CLIMATE: f32 = 0.5;

/// Band limits and climate thresholds used by [`TileClassifier`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// Heights below this are deep water
    pub deep_water_max: f32,
    /// Heights below this are shallow water
    pub shallow_water_max: f32,
    /// Heights below this (and above water) are beach
    pub beach_max: f32,
    /// Lower bound of the hill band
    pub hill_min: f32,
    /// Lower bound of the mountain band
    pub mountain_min: f32,
    /// Lower bound of the peak band
    pub peak_min: f32,
    /// Temperature above which dry cells become desert
    pub arid_temperature: f32,
    /// Moisture below which hot cells become desert
    pub arid_moisture: f32,
    /// Moisture below which cells become wasteland
    pub barren_moisture: f32,
    /// Moisture above which lowland becomes swamp
    pub wetland_moisture: f32,
    /// Temperature below which mountains become snow peaks
    pub cold_temperature: f32,
    /// Moisture above which vegetation is dense forest
    pub dense_moisture: f32,
    /// Moisture above which vegetation is forest
    pub vegetation_moisture: f32,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            deep_water_max: 2.0,
            shallow_water_max: 3.5,
            beach_max: 4.5,
            hill_min: 7.0,
            mountain_min: 10.0,
            peak_min: 13.0,
            arid_temperature: 0.7,
            arid_moisture: 0.3,
            barren_moisture: 0.12,
            wetland_moisture: 0.75,
            cold_temperature: 0.2,
            dense_moisture: 0.65,
            vegetation_moisture: 0.45,
        }
    }
}

/// Pure mapping from (height, moisture, temperature) to [`TerrainType`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TileClassifier {
    thresholds: ClassifierThresholds,
}

impl TileClassifier {
    /// Creates a classifier with custom thresholds.
    #[must_use]
    pub const fn new(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    /// The thresholds in use.
    #[must_use]
    pub const fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    /// Classifies a cell. Missing climate values are treated as neutral.
    #[must_use]
    pub fn classify(
        &self,
        height: f32,
        moisture: Option<f32>,
        temperature: Option<f32>,
    ) -> TerrainType {
        self.classify_climate(
            height,
            moisture.unwrap_or(NEUTRAL_CLIMATE),
            temperature.unwrap_or(NEUTRAL_CLIMATE),
        )
    }

    /// Height-only classification.
    #[must_use]
    pub fn classify_height(&self, height: f32) -> TerrainType {
        self.classify_climate(height, NEUTRAL_CLIMATE, NEUTRAL_CLIMATE)
    }

    /// Full classification with known climate.
    #[must_use]
    pub fn classify_climate(&self, height: f32, moisture: f32, temperature: f32) -> TerrainType {
        let t = &self.thresholds;

        // NaN compares false everywhere; treat it as the lowest height.
        let height = if height.is_nan() { f32::MIN } else { height };

        if height < t.deep_water_max {
            return TerrainType::DeepWater;
        }
        if height < t.shallow_water_max {
            return TerrainType::ShallowWater;
        }
        if height >= t.peak_min {
            return TerrainType::SnowPeaks;
        }
        if temperature > t.arid_temperature && moisture < t.arid_moisture {
            return TerrainType::Desert;
        }
        if moisture > t.wetland_moisture && height < t.hill_min {
            return TerrainType::Swamp;
        }
        if temperature < t.cold_temperature && height > t.mountain_min {
            return TerrainType::SnowPeaks;
        }
        if height >= t.mountain_min {
            return TerrainType::Mountains;
        }
        if height >= t.hill_min {
            return TerrainType::Hills;
        }
        if height < t.beach_max {
            return TerrainType::Beach;
        }
        if moisture < t.barren_moisture {
            return TerrainType::Wasteland;
        }
        if moisture > t.dense_moisture {
            return TerrainType::DenseForest;
        }
        if moisture > t.vegetation_moisture {
            return TerrainType::Forest;
        }
        TerrainType::Grassland
    }
}
