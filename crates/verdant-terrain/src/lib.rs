//! # Verdant Terrain
//!
//! Seeded, queue-driven terrain growth.
//!
//! This crate handles:
//! - Climate fields (moisture and temperature)
//! - Rule tables and tile classification
//! - Breadth-first growth from seed tiles
//! - Smoothing and feature placement
//!
//! ```no_run
//! let grid = verdant_terrain::generate_terrain(64, 48, Some(42))?;
//! assert_eq!(grid.tiles().len(), 64 * 48);
//! # Ok::<(), verdant_common::VerdantError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod classify;
pub mod climate;
pub mod generation;
pub mod palette;
pub mod postprocess;
pub mod propagate;
pub mod rules;
pub mod terrain;
pub mod tile;

mod scenario_tests;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classify::*;
    pub use crate::climate::*;
    pub use crate::generation::*;
    pub use crate::palette::*;
    pub use crate::postprocess::*;
    pub use crate::propagate::*;
    pub use crate::rules::*;
    pub use crate::terrain::*;
    pub use crate::tile::*;
}

pub use prelude::*;
