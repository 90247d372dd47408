//! Embedded spatial index and analysis engine for vector features.
//!
//! `veld` builds an STR-packed R-tree over an in-memory feature
//! collection and answers range, nearest-neighbor, and predicate-join
//! queries, with buffer/dissolve/difference aggregation layered on top.
//! All operations are pure transforms over immutable collections; the
//! built index is read-only and freely shared across threads.
//!
//! ```rust
//! use veld::{Coord, Crs, Feature, FeatureCollection, FeatureId, Geometry, SpatialIndex};
//!
//! let mut cities = FeatureCollection::new(Crs::wgs84());
//! cities.push(Feature::new(FeatureId(1), Geometry::point(-74.006, 40.713)?))?;
//! cities.push(Feature::new(FeatureId(2), Geometry::point(-73.935, 40.730)?))?;
//!
//! let index = SpatialIndex::build(&cities)?;
//! let nearest = index.nearest(&Coord::new(-74.0, 40.7), 1);
//! assert_eq!(nearest[0].0, FeatureId(1));
//! # Ok::<(), veld::VeldError>(())
//! ```

pub mod config;
pub mod coverage;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod index;
pub mod join;

mod maybe_rayon;

pub use config::Config;
pub use error::{Result, VeldError};

pub use geometry::buffer::buffer;
pub use geometry::overlay::{difference, union_all};
pub use geometry::predicates::{distance, intersects, within};
pub use geometry::{BoundingBox, Coord, Geometry, LineString, Polygon, Ring};

pub use feature::{AttrValue, Crs, Feature, FeatureCollection, FeatureId, Reproject};

pub use index::{IndexStats, SpatialIndex};

pub use join::{JoinMatch, JoinPredicate, JoinResult, join};

pub use coverage::{
    Assignment, assign_nearest, buffer_features, coverage_gaps, dissolve, service_coverage,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Config, Result, VeldError};

    pub use crate::{BoundingBox, Coord, Geometry, LineString, Polygon, Ring};

    pub use crate::{AttrValue, Crs, Feature, FeatureCollection, FeatureId, Reproject};

    pub use crate::{IndexStats, SpatialIndex};

    pub use crate::{JoinMatch, JoinPredicate, JoinResult, join};

    pub use crate::{
        Assignment, assign_nearest, buffer, buffer_features, coverage_gaps, dissolve,
        service_coverage,
    };
}
