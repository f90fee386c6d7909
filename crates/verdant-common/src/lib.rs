//! # Verdant Common
//!
//! Shared types for the Verdant terrain generator.
//!
//! This crate provides:
//! - Grid coordinates and dimensions (row-major arena indexing)
//! - The error taxonomy used by generation and tooling
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dims_reject_zero() {
        assert!(matches!(
            GridDims::new(0, 4),
            Err(GridError::InvalidDimensions { width: 0, depth: 4 })
        ));
        assert!(GridDims::new(4, 0).is_err());
        assert!(GridDims::new(1, 1).is_ok());
    }

    #[test]
    fn test_error_wrapping() {
        let err: VerdantError = GridError::InvalidDimensions { width: 0, depth: 0 }.into();
        assert!(err.to_string().contains("0x0"));

        let err: VerdantError = GenerationError::UnreachableCells { count: 3 }.into();
        assert!(err.to_string().contains('3'));
    }
}
