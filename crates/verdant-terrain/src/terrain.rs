//! Terrain and feature enumerations.

use serde::{Deserialize, Serialize};

/// Discrete biome/height classification of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainType {
    /// Open ocean floor.
    DeepWater,
    /// Coastal shelf and lakes.
    ShallowWater,
    /// Sand between water and land.
    Beach,
    /// Open land, the most permissive type.
    Grassland,
    /// Moderate tree cover.
    Forest,
    /// Heavy tree cover in wet regions.
    DenseForest,
    /// Rolling uplands.
    Hills,
    /// High rocky ground.
    Mountains,
    /// Ice and snow above the tree line.
    SnowPeaks,
    /// Hot and dry.
    Desert,
    /// Wet lowland.
    Swamp,
    /// Barren, very dry ground.
    Wasteland,
}

impl TerrainType {
    /// Number of terrain types.
    pub const COUNT: usize = 12;

    /// Every terrain type, in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::DeepWater,
        Self::ShallowWater,
        Self::Beach,
        Self::Grassland,
        Self::Forest,
        Self::DenseForest,
        Self::Hills,
        Self::Mountains,
        Self::SnowPeaks,
        Self::Desert,
        Self::Swamp,
        Self::Wasteland,
    ];

    /// Position in [`TerrainType::ALL`], used to index rule tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::DeepWater => "Deep Water",
            Self::ShallowWater => "Shallow Water",
            Self::Beach => "Beach",
            Self::Grassland => "Grassland",
            Self::Forest => "Forest",
            Self::DenseForest => "Dense Forest",
            Self::Hills => "Hills",
            Self::Mountains => "Mountains",
            Self::SnowPeaks => "Snow Peaks",
            Self::Desert => "Desert",
            Self::Swamp => "Swamp",
            Self::Wasteland => "Wasteland",
        }
    }

    /// Single-character symbol for text previews.
    #[must_use]
    pub fn glyph(self) -> char {
        match self {
            Self::DeepWater => '~',
            Self::ShallowWater => '-',
            Self::Beach => '.',
            Self::Grassland => ',',
            Self::Forest => 't',
            Self::DenseForest => 'T',
            Self::Hills => 'n',
            Self::Mountains => 'M',
            Self::SnowPeaks => 'A',
            Self::Desert => ':',
            Self::Swamp => '%',
            Self::Wasteland => 'x',
        }
    }

    /// Whether this is one of the water bands.
    #[must_use]
    pub fn is_water(self) -> bool {
        matches!(self, Self::DeepWater | Self::ShallowWater)
    }
}

/// Decorative marker placed on a tile during post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    /// Small settlement.
    Village,
    /// Fortified keep.
    Castle,
    /// Lone watchtower.
    Tower,
    /// Ancient ruins.
    Ruins,
    /// Shrine or temple.
    Temple,
    /// Stone circle.
    StandingStones,
    /// Glowing crystal outcrop.
    MagicalCrystal,
    /// Arcane gateway.
    Portal,
    /// Dragon's den.
    DragonLair,
    /// Wrecked ship on the shore.
    Shipwreck,
    /// Mouth of a cave system.
    CaveEntrance,
}

impl FeatureType {
    /// Number of feature types.
    pub const COUNT: usize = 11;

    /// Every feature type, in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Village,
        Self::Castle,
        Self::Tower,
        Self::Ruins,
        Self::Temple,
        Self::StandingStones,
        Self::MagicalCrystal,
        Self::Portal,
        Self::DragonLair,
        Self::Shipwreck,
        Self::CaveEntrance,
    ];

    /// Position in [`FeatureType::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Village => "Village",
            Self::Castle => "Castle",
            Self::Tower => "Tower",
            Self::Ruins => "Ruins",
            Self::Temple => "Temple",
            Self::StandingStones => "Standing Stones",
            Self::MagicalCrystal => "Magical Crystal",
            Self::Portal => "Portal",
            Self::DragonLair => "Dragon Lair",
            Self::Shipwreck => "Shipwreck",
            Self::CaveEntrance => "Cave Entrance",
        }
    }

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Set of features on one tile.
///
/// Stored as a bit mask; an empty set stands for "no feature".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<FeatureType>", into = "Vec<FeatureType>")]
pub struct FeatureSet(u16);

impl FeatureSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Adds a feature. Returns `true` if it was not present before.
    pub fn insert(&mut self, feature: FeatureType) -> bool {
        let added = !self.contains(feature);
        self.0 |= feature.bit();
        added
    }

    /// Whether the feature is present.
    #[must_use]
    pub const fn contains(self, feature: FeatureType) -> bool {
        self.0 & feature.bit() != 0
    }

    /// Union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether every feature of `other` is also in `self`.
    #[must_use]
    pub const fn is_superset(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Number of features in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether the set has no features.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Features in declaration order.
    pub fn iter(self) -> impl Iterator<Item = FeatureType> {
        FeatureType::ALL
            .into_iter()
            .filter(move |feature| self.contains(*feature))
    }
}

impl FromIterator<FeatureType> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = FeatureType>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for feature in iter {
            set.insert(feature);
        }
        set
    }
}

impl From<Vec<FeatureType>> for FeatureSet {
    fn from(features: Vec<FeatureType>) -> Self {
        features.into_iter().collect()
    }
}

impl From<FeatureSet> for Vec<FeatureType> {
    fn from(set: FeatureSet) -> Self {
        set.iter().collect()
    }
}
