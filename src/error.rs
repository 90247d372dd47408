//! Error types for veld operations.

use crate::feature::{Crs, FeatureId};
use thiserror::Error;

/// Errors that can occur during geometry construction, indexing, and analysis.
#[derive(Error, Debug)]
pub enum VeldError {
    /// Geometry is degenerate or self-inconsistent (open ring, too few
    /// vertices, non-finite coordinate).
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A parameter is out of range or otherwise unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The operation is undefined on an empty collection.
    #[error("Operation undefined on empty collection: {0}")]
    EmptyCollection(&'static str),

    /// A feature with this identifier already exists in the collection.
    #[error("Duplicate feature identifier: {0}")]
    DuplicateFeature(FeatureId),

    /// Two collections with different CRS tags were combined without
    /// reprojection.
    #[error("CRS mismatch: {left} vs {right}")]
    CrsMismatch { left: Crs, right: Crs },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VeldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VeldError::InvalidGeometry("ring has 2 distinct vertices".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid geometry: ring has 2 distinct vertices"
        );

        let err = VeldError::CrsMismatch {
            left: Crs::wgs84(),
            right: Crs::web_mercator(),
        };
        assert_eq!(err.to_string(), "CRS mismatch: EPSG:4326 vs EPSG:3857");
    }

    #[test]
    fn test_duplicate_feature_display() {
        let err = VeldError::DuplicateFeature(FeatureId(7));
        assert!(err.to_string().contains('7'));
    }
}
