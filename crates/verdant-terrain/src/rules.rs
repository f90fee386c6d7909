//! Terrain rule tables.
//!
//! Height ranges, adjacency compatibility, selection weights and feature
//! spawn probabilities, one entry per [`TerrainType`]. The rule set is
//! immutable once built and is shared by reference with every stage of a
//! generation run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use verdant_common::GenerationError;

use crate::terrain::{FeatureType, TerrainType};

const T: usize = TerrainType::COUNT;
const F: usize = FeatureType::COUNT;

/// Closed height interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightRange {
    /// Lower bound (inclusive)
    pub min: f32,
    /// Upper bound (inclusive)
    pub max: f32,
}

impl HeightRange {
    /// Creates a new range.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Whether `height` lies inside the range.
    #[must_use]
    pub fn contains(self, height: f32) -> bool {
        height >= self.min && height <= self.max
    }

    /// Clamps `height` into the range.
    #[must_use]
    pub fn clamp(self, height: f32) -> f32 {
        height.clamp(self.min, self.max)
    }

    /// Center of the range.
    #[must_use]
    pub fn midpoint(self) -> f32 {
        (self.min + self.max) * 0.5
    }

    /// Intersection with `other`, collapsed to a point at the nearer bound
    /// when the two do not overlap.
    #[must_use]
    pub fn clamp_to(self, other: Self) -> Self {
        let min = other.clamp(self.min);
        let max = other.clamp(self.max);
        Self::new(min, max.max(min))
    }

    /// Uniform sample inside the range.
    pub fn sample(self, rng: &mut fastrand::Rng) -> f32 {
        self.min + rng.f32() * (self.max - self.min)
    }

    fn is_valid(self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// One terrain type's row in every rule table.
///
/// This is the serialized form of a [`TerrainRuleSet`]. Fields are optional so
/// that an incomplete configuration can be reported precisely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEntry {
    /// Terrain type this entry describes
    pub terrain: TerrainType,
    /// Declared height range
    pub height: Option<HeightRange>,
    /// Relative selection weight (non-negative)
    pub weight: Option<f32>,
    /// Types allowed as direct 4-connected neighbors
    pub neighbors: Option<Vec<TerrainType>>,
    /// Spawn probability per feature; unspecified features are 0
    #[serde(default)]
    pub features: BTreeMap<FeatureType, f32>,
}

/// Immutable rule tables, total over [`TerrainType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RuleEntry>", into = "Vec<RuleEntry>")]
pub struct TerrainRuleSet {
    heights: [HeightRange; T],
    compatible: [[bool; T]; T],
    weights: [f32; T],
    total_weight: f32,
    features: [[f32; F]; T],
}

impl TerrainRuleSet {
    /// Builds and validates a rule set.
    ///
    /// Every terrain type needs a height range, a weight and a neighbor list;
    /// a missing one is a [`GenerationError::RuleSetGap`]. Adjacency is made
    /// symmetric: if A lists B, B accepts A. Every type accepts itself.
    pub fn from_entries(entries: Vec<RuleEntry>) -> Result<Self, GenerationError> {
        let mut rows: [Option<&RuleEntry>; T] = [None; T];
        for entry in &entries {
            let slot = &mut rows[entry.terrain.index()];
            if slot.is_some() {
                return Err(GenerationError::InvalidRule(format!(
                    "duplicate entry for {}",
                    entry.terrain.display_name()
                )));
            }
            *slot = Some(entry);
        }

        for terrain in TerrainType::ALL {
            let gap = |table| GenerationError::RuleSetGap {
                table,
                terrain: terrain.display_name().to_string(),
            };
            let entry = rows[terrain.index()].ok_or_else(|| gap("height range"))?;
            let height = entry.height.ok_or_else(|| gap("height range"))?;
            let weight = entry.weight.ok_or_else(|| gap("weight"))?;
            if entry.neighbors.is_none() {
                return Err(gap("adjacency"));
            }

            if !height.is_valid() {
                return Err(GenerationError::InvalidRule(format!(
                    "{} height range [{}, {}] is empty",
                    terrain.display_name(),
                    height.min,
                    height.max
                )));
            }
            if !weight.is_finite() || weight < 0.0 {
                return Err(GenerationError::InvalidRule(format!(
                    "{} weight {weight} is negative",
                    terrain.display_name()
                )));
            }
            if let Some((feature, p)) = entry
                .features
                .iter()
                .find(|(_, p)| !(0.0..=1.0).contains(*p))
            {
                return Err(GenerationError::InvalidRule(format!(
                    "{} {} probability {p} outside [0, 1]",
                    terrain.display_name(),
                    feature.display_name()
                )));
            }
        }

        let rules = Self::assemble(&entries);
        if rules.total_weight <= 0.0 {
            return Err(GenerationError::InvalidRule(
                "at least one terrain weight must be positive".into(),
            ));
        }
        Ok(rules)
    }

    /// Fills the tables from entries, defaulting anything absent to zero.
    fn assemble(entries: &[RuleEntry]) -> Self {
        let mut heights = [HeightRange::new(0.0, 0.0); T];
        let mut compatible = [[false; T]; T];
        let mut weights = [0.0; T];
        let mut features = [[0.0; F]; T];

        for entry in entries {
            let a = entry.terrain.index();
            if let Some(height) = entry.height {
                heights[a] = height;
            }
            weights[a] = entry.weight.unwrap_or(0.0);
            for neighbor in entry.neighbors.iter().flatten() {
                let b = neighbor.index();
                compatible[a][b] = true;
                compatible[b][a] = true;
            }
            for (feature, p) in &entry.features {
                features[a][feature.index()] = *p;
            }
        }
        for (i, row) in compatible.iter_mut().enumerate() {
            row[i] = true;
        }

        Self {
            heights,
            compatible,
            weights,
            total_weight: weights.iter().sum(),
            features,
        }
    }

    /// Declared height range of a terrain type.
    #[must_use]
    pub fn height_range(&self, terrain: TerrainType) -> HeightRange {
        self.heights[terrain.index()]
    }

    /// Whether `a` and `b` may be direct neighbors. Symmetric.
    #[must_use]
    pub fn is_compatible(&self, a: TerrainType, b: TerrainType) -> bool {
        self.compatible[a.index()][b.index()]
    }

    /// Raw selection weight.
    #[must_use]
    pub fn weight(&self, terrain: TerrainType) -> f32 {
        self.weights[terrain.index()]
    }

    /// Spawn probability of one feature on one terrain type.
    #[must_use]
    pub fn feature_probability(&self, terrain: TerrainType, feature: FeatureType) -> f32 {
        self.features[terrain.index()][feature.index()]
    }

    /// Non-zero feature spawn probabilities of a terrain type.
    pub fn feature_probabilities(
        &self,
        terrain: TerrainType,
    ) -> impl Iterator<Item = (FeatureType, f32)> + '_ {
        let row = &self.features[terrain.index()];
        FeatureType::ALL
            .into_iter()
            .map(move |feature| (feature, row[feature.index()]))
            .filter(|(_, p)| *p > 0.0)
    }

    /// Picks a terrain type with probability proportional to its weight.
    pub fn sample_type(&self, rng: &mut fastrand::Rng) -> TerrainType {
        let target = rng.f32() * self.total_weight;
        let mut cumulative = 0.0;
        let mut last_positive = TerrainType::Grassland;
        for terrain in TerrainType::ALL {
            let weight = self.weights[terrain.index()];
            if weight <= 0.0 {
                continue;
            }
            cumulative += weight;
            last_positive = terrain;
            if target < cumulative {
                return terrain;
            }
        }
        // Rounding can leave `target` just past the final bucket.
        last_positive
    }

    /// Weighted-random height: pick a type by weight, then a uniform height
    /// inside its declared range.
    pub fn weighted_height(&self, rng: &mut fastrand::Rng) -> f32 {
        let terrain = self.sample_type(rng);
        self.height_range(terrain).sample(rng)
    }

    /// Serializable form of the tables.
    #[must_use]
    pub fn entries(&self) -> Vec<RuleEntry> {
        TerrainType::ALL
            .into_iter()
            .map(|terrain| {
                let a = terrain.index();
                RuleEntry {
                    terrain,
                    height: Some(self.heights[a]),
                    weight: Some(self.weights[a]),
                    neighbors: Some(
                        TerrainType::ALL
                            .into_iter()
                            .filter(|other| self.compatible[a][other.index()])
                            .collect(),
                    ),
                    features: self.feature_probabilities(terrain).collect(),
                }
            })
            .collect()
    }
}

impl TryFrom<Vec<RuleEntry>> for TerrainRuleSet {
    type Error = GenerationError;

    fn try_from(entries: Vec<RuleEntry>) -> Result<Self, Self::Error> {
        Self::from_entries(entries)
    }
}

impl From<TerrainRuleSet> for Vec<RuleEntry> {
    fn from(rules: TerrainRuleSet) -> Self {
        rules.entries()
    }
}

impl Default for TerrainRuleSet {
    fn default() -> Self {
        Self::assemble(&default_entries())
    }
}

/// Pairs that may never touch in the default tables.
const FORBIDDEN: &[(TerrainType, TerrainType)] = {
    use TerrainType::*;
    &[
        (DeepWater, Grassland),
        (DeepWater, Forest),
        (DeepWater, DenseForest),
        (DeepWater, Hills),
        (DeepWater, Mountains),
        (DeepWater, SnowPeaks),
        (DeepWater, Desert),
        (DeepWater, Wasteland),
        (SnowPeaks, ShallowWater),
        (SnowPeaks, Beach),
        (SnowPeaks, Swamp),
        (SnowPeaks, Desert),
        (Desert, Swamp),
        (Desert, DenseForest),
        (Swamp, Mountains),
    ]
};

/// Built-in rule tables on a 0-15 height scale.
#[must_use]
pub fn default_entries() -> Vec<RuleEntry> {
    use FeatureType as Feat;
    use TerrainType::*;

    let row = |terrain: TerrainType,
               min: f32,
               max: f32,
               weight: f32,
               features: &[(FeatureType, f32)]| {
        let neighbors = TerrainType::ALL
            .into_iter()
            .filter(|other| {
                !FORBIDDEN
                    .iter()
                    .any(|&(a, b)| (a, b) == (terrain, *other) || (b, a) == (terrain, *other))
            })
            .collect();
        RuleEntry {
            terrain,
            height: Some(HeightRange::new(min, max)),
            weight: Some(weight),
            neighbors: Some(neighbors),
            features: features.iter().copied().collect(),
        }
    };

    vec![
        row(DeepWater, 0.0, 2.0, 0.12, &[]),
        row(ShallowWater, 2.0, 3.5, 0.10, &[(Feat::Shipwreck, 0.01)]),
        row(
            Beach,
            3.5,
            4.5,
            0.06,
            &[(Feat::Shipwreck, 0.02), (Feat::Village, 0.005)],
        ),
        row(
            Grassland,
            4.5,
            7.0,
            0.18,
            &[
                (Feat::Village, 0.02),
                (Feat::StandingStones, 0.005),
                (Feat::Ruins, 0.005),
            ],
        ),
        row(
            Forest,
            4.5,
            7.0,
            0.14,
            &[
                (Feat::Ruins, 0.01),
                (Feat::Village, 0.008),
                (Feat::StandingStones, 0.008),
            ],
        ),
        row(
            DenseForest,
            4.5,
            7.0,
            0.06,
            &[(Feat::Ruins, 0.015), (Feat::Temple, 0.003)],
        ),
        row(
            Hills,
            7.0,
            10.0,
            0.10,
            &[
                (Feat::Village, 0.01),
                (Feat::Tower, 0.01),
                (Feat::StandingStones, 0.01),
            ],
        ),
        row(
            Mountains,
            10.0,
            13.0,
            0.07,
            &[(Feat::Tower, 0.005), (Feat::CaveEntrance, 0.02)],
        ),
        row(
            SnowPeaks,
            10.0,
            15.0,
            0.03,
            &[(Feat::DragonLair, 0.005), (Feat::Temple, 0.003)],
        ),
        row(
            Desert,
            3.5,
            13.0,
            0.05,
            &[(Feat::Ruins, 0.02), (Feat::Temple, 0.005)],
        ),
        row(
            Swamp,
            3.5,
            7.0,
            0.04,
            &[(Feat::Ruins, 0.01), (Feat::Portal, 0.002)],
        ),
        row(
            Wasteland,
            4.5,
            7.0,
            0.03,
            &[
                (Feat::Ruins, 0.02),
                (Feat::Portal, 0.005),
                (Feat::StandingStones, 0.01),
            ],
        ),
    ]
}
