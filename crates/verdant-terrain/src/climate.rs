//! Climate field generation.
//!
//! Produces one scalar per cell in `[0, 1]` for moisture and temperature.
//! Fields are independent of terrain types and are generated before
//! propagation starts.

use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};
use verdant_common::{GridCoord, GridDims, GridError};

/// Sub-seed stream for the moisture field.
const MOISTURE_STREAM: u64 = 0x6d6f_6973_7475_7265;
/// Sub-seed stream for the temperature field.
const TEMPERATURE_STREAM: u64 = 0x7465_6d70_6572_6174;

/// How climate values are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimateMode {
    /// Fractal Perlin noise, spatially coherent.
    #[default]
    Perlin,
    /// Independent uniform value per cell.
    Uniform,
}

/// Climate generation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateConfig {
    /// Noise source
    pub mode: ClimateMode,
    /// Base noise frequency in cells (smaller = broader regions)
    pub scale: f64,
    /// Fractal octaves
    pub octaves: u32,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            mode: ClimateMode::Perlin,
            scale: 0.08,
            octaves: 3,
        }
    }
}

/// A width x depth field of values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateField {
    dims: GridDims,
    values: Vec<f32>,
}

impl ClimateField {
    /// Field filled with a constant.
    #[must_use]
    pub fn constant(dims: GridDims, value: f32) -> Self {
        Self {
            dims,
            values: vec![value.clamp(0.0, 1.0); dims.len()],
        }
    }

    /// Field dimensions.
    #[must_use]
    pub const fn dims(&self) -> GridDims {
        self.dims
    }

    /// Value at a linear index.
    #[must_use]
    pub fn get(&self, index: usize) -> f32 {
        self.values[index]
    }

    /// Value at a coordinate, if in bounds.
    #[must_use]
    pub fn at(&self, coord: GridCoord) -> Option<f32> {
        self.dims.index(coord).ok().map(|i| self.values[i])
    }

    /// All values, row-major.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Moisture and temperature for one run, always over the same grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateFields {
    moisture: ClimateField,
    temperature: ClimateField,
}

impl ClimateFields {
    /// Pairs two fields, rejecting fields of different sizes.
    pub fn new(moisture: ClimateField, temperature: ClimateField) -> Result<Self, GridError> {
        let (m, t) = (moisture.dims(), temperature.dims());
        if m != t {
            return Err(GridError::MismatchedDimensions {
                width: m.width(),
                depth: m.depth(),
                other_width: t.width(),
                other_depth: t.depth(),
            });
        }
        Ok(Self {
            moisture,
            temperature,
        })
    }

    /// Grid both fields cover.
    #[must_use]
    pub const fn dims(&self) -> GridDims {
        self.moisture.dims
    }

    /// Moisture, 0 = arid, 1 = saturated.
    #[must_use]
    pub const fn moisture(&self) -> &ClimateField {
        &self.moisture
    }

    /// Temperature, 0 = frozen, 1 = scorching.
    #[must_use]
    pub const fn temperature(&self) -> &ClimateField {
        &self.temperature
    }

    /// Neutral climate everywhere (0.5 / 0.5).
    #[must_use]
    pub fn neutral(dims: GridDims) -> Self {
        Self {
            moisture: ClimateField::constant(dims, 0.5),
            temperature: ClimateField::constant(dims, 0.5),
        }
    }
}

/// Generates climate fields from a seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClimateFieldGenerator {
    config: ClimateConfig,
}

impl ClimateFieldGenerator {
    /// Creates a generator.
    #[must_use]
    pub const fn new(config: ClimateConfig) -> Self {
        Self { config }
    }

    /// Generates one field.
    #[must_use]
    pub fn generate(&self, dims: GridDims, seed: u64) -> ClimateField {
        let raw: Vec<f32> = match self.config.mode {
            ClimateMode::Uniform => {
                let mut rng = fastrand::Rng::with_seed(seed);
                (0..dims.len()).map(|_| rng.f32()).collect()
            },
            ClimateMode::Perlin => self.fractal(dims, seed),
        };

        ClimateField {
            dims,
            values: normalize(raw),
        }
    }

    /// Generates moisture and temperature from independent sub-seeds.
    #[must_use]
    pub fn generate_pair(&self, dims: GridDims, seed: u64) -> ClimateFields {
        ClimateFields {
            moisture: self.generate(dims, derive_seed(seed, MOISTURE_STREAM)),
            temperature: self.generate(dims, derive_seed(seed, TEMPERATURE_STREAM)),
        }
    }

    fn fractal(&self, dims: GridDims, seed: u64) -> Vec<f32> {
        let perlin = Perlin::new(seed as u32 ^ (seed >> 32) as u32);
        let octaves = self.config.octaves.max(1);
        let scale = self.config.scale;

        (0..dims.len())
            .map(|index| {
                let coord = dims.coord(index);
                let x = f64::from(coord.x) * scale;
                let z = f64::from(coord.z) * scale;

                let mut value = 0.0;
                let mut amplitude = 1.0;
                let mut frequency = 1.0;
                for _ in 0..octaves {
                    value += perlin.get([x * frequency, z * frequency]) * amplitude;
                    amplitude *= 0.5;
                    frequency *= 2.0;
                }
                value as f32
            })
            .collect()
    }
}

/// Rescales values to span `[0, 1]`. A flat field becomes 0.5.
fn normalize(mut values: Vec<f32>) -> Vec<f32> {
    let (lo, hi) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = hi - lo;
    if !span.is_finite() || span <= f32::EPSILON {
        values.fill(0.5);
        return values;
    }
    for v in &mut values {
        *v = ((*v - lo) / span).clamp(0.0, 1.0);
    }
    values
}

/// Splitmix64 mix of a run seed and a stream tag.
#[must_use]
pub fn derive_seed(seed: u64, stream: u64) -> u64 {
    let mut z = seed.wrapping_add(stream.wrapping_mul(0x9e37_79b9_7f4a_7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
