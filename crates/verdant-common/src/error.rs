//! Error types for Verdant.

use thiserror::Error;

/// Top-level error type for Verdant operations.
#[derive(Debug, Error)]
pub enum VerdantError {
    /// Grid shape or addressing errors
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    /// Rule set or propagation errors
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Configuration could not be parsed or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Grid shape and addressing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Width or depth is zero, or the cell count overflows
    #[error("Invalid grid dimensions {width}x{depth}")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested depth
        depth: u32,
    },

    /// Two per-cell fields that must share a grid do not
    #[error("Field of {other_width}x{other_depth} does not match {width}x{depth} grid")]
    MismatchedDimensions {
        /// Grid width
        width: u32,
        /// Grid depth
        depth: u32,
        /// Width of the mismatched field
        other_width: u32,
        /// Depth of the mismatched field
        other_depth: u32,
    },

    /// Coordinate outside the grid
    #[error("Coordinate ({x}, {z}) outside {width}x{depth} grid")]
    OutOfBounds {
        /// X coordinate
        x: u32,
        /// Z coordinate
        z: u32,
        /// Grid width
        width: u32,
        /// Grid depth
        depth: u32,
    },
}

/// Terrain generation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// A terrain type has no entry in a required rule table
    #[error("Rule set has no {table} entry for {terrain}")]
    RuleSetGap {
        /// Table missing the entry (height range, adjacency, weight)
        table: &'static str,
        /// Terrain type name
        terrain: String,
    },

    /// A rule entry is present but unusable
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// Cells were still undecided when propagation finished
    #[error("{count} cells left undecided after propagation")]
    UnreachableCells {
        /// Number of undecided cells
        count: usize,
    },
}

/// Result type alias for Verdant operations.
pub type VerdantResult<T> = Result<T, VerdantError>;
