//! Predicate joins between an indexed collection and a probe collection.
//!
//! Each probe feature queries the index for bounding-box candidates,
//! then the exact predicate filters them. With the `parallel` feature,
//! probes are processed on rayon workers into disjoint per-probe slots
//! and assembled afterwards; no shared mutable map is involved.

use crate::error::{Result, VeldError};
use crate::feature::{FeatureCollection, FeatureId};
use crate::geometry::predicates;
use crate::index::SpatialIndex;
use crate::maybe_rayon::*;
use rustc_hash::FxHashMap;

/// Spatial relationship tested between a probe feature (left) and an
/// indexed feature (right).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JoinPredicate {
    /// The pair shares at least one point.
    Intersects,
    /// The probe lies entirely inside or on the boundary of the indexed
    /// feature. False (never an error) when the indexed feature has no
    /// area.
    Within,
    /// True geometric distance is at most the threshold.
    WithinDistance(f64),
}

/// One matched indexed feature, with the pair distance when the
/// predicate is distance-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinMatch {
    pub id: FeatureId,
    pub distance: Option<f64>,
}

/// Join output: probe feature id to its matches, sorted by indexed id.
///
/// Probes with no matches are absent. Pairs are unique.
#[derive(Debug, Clone, Default)]
pub struct JoinResult {
    pairs: FxHashMap<FeatureId, Vec<JoinMatch>>,
}

impl JoinResult {
    /// Matches for one probe feature, or `None` when nothing matched.
    pub fn get(&self, probe: FeatureId) -> Option<&[JoinMatch]> {
        self.pairs.get(&probe).map(Vec::as_slice)
    }

    /// Number of probe features with at least one match.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Total number of matched pairs.
    pub fn total_pairs(&self) -> usize {
        self.pairs.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, &[JoinMatch])> {
        self.pairs.iter().map(|(&id, matches)| (id, matches.as_slice()))
    }
}

/// Pair every probe feature with the indexed features satisfying the
/// predicate.
///
/// The probe bounding box is expanded by the threshold for
/// distance-based predicates, the index supplies candidates, and the
/// exact predicate keeps true matches. Near-linear for spatially
/// well-distributed collections.
///
/// # Errors
///
/// `CrsMismatch` when the collections carry different CRS tags;
/// `InvalidInput` for a non-finite or negative distance threshold.
///
/// # Example
///
/// ```rust
/// use veld::{
///     Coord, Crs, Feature, FeatureCollection, FeatureId, Geometry, JoinPredicate, Polygon,
///     SpatialIndex, join,
/// };
///
/// let square = Polygon::from_exterior_coords(vec![
///     Coord::new(0.0, 0.0),
///     Coord::new(4.0, 0.0),
///     Coord::new(4.0, 4.0),
///     Coord::new(0.0, 4.0),
/// ])?;
/// let mut zones = FeatureCollection::new(Crs::wgs84());
/// zones.push(Feature::new(FeatureId(10), Geometry::Polygon(square)))?;
/// let index = SpatialIndex::build(&zones)?;
///
/// let mut probes = FeatureCollection::new(Crs::wgs84());
/// probes.push(Feature::new(FeatureId(1), Geometry::point(2.0, 2.0)?))?;
///
/// let result = join(&index, &probes, JoinPredicate::Within)?;
/// assert_eq!(result.get(FeatureId(1)).unwrap()[0].id, FeatureId(10));
/// # Ok::<(), veld::VeldError>(())
/// ```
pub fn join(
    index: &SpatialIndex,
    probes: &FeatureCollection,
    predicate: JoinPredicate,
) -> Result<JoinResult> {
    if index.crs() != probes.crs() {
        return Err(VeldError::CrsMismatch {
            left: index.crs().clone(),
            right: probes.crs().clone(),
        });
    }
    if let JoinPredicate::WithinDistance(threshold) = predicate {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(VeldError::InvalidInput(format!(
                "Distance threshold must be finite and non-negative, got {}",
                threshold
            )));
        }
    }

    let per_probe: Vec<(FeatureId, Vec<JoinMatch>)> = probes
        .features()
        .into_par_iter()
        .map(|probe| {
            let mut query_box = probe.bounding_box();
            if let JoinPredicate::WithinDistance(threshold) = predicate {
                query_box = query_box.expand(threshold);
            }

            let mut matches: Vec<JoinMatch> = Vec::new();
            for candidate in index.query(&query_box) {
                // Candidates come from this index's own query, so the
                // geometry lookup cannot miss.
                let Some(geometry) = index.geometry(candidate) else {
                    continue;
                };
                let matched = match predicate {
                    JoinPredicate::Intersects => {
                        predicates::intersects(&probe.geometry, geometry)
                            .then_some(JoinMatch {
                                id: candidate,
                                distance: None,
                            })
                    }
                    JoinPredicate::Within => predicates::within(&probe.geometry, geometry)
                        .then_some(JoinMatch {
                            id: candidate,
                            distance: None,
                        }),
                    JoinPredicate::WithinDistance(threshold) => {
                        let dist = predicates::distance(&probe.geometry, geometry);
                        (dist <= threshold).then_some(JoinMatch {
                            id: candidate,
                            distance: Some(dist),
                        })
                    }
                };
                matches.extend(matched);
            }
            matches.sort_by_key(|m| m.id);
            (probe.id, matches)
        })
        .collect();

    let mut pairs = FxHashMap::default();
    for (probe_id, matches) in per_probe {
        if !matches.is_empty() {
            pairs.insert(probe_id, matches);
        }
    }

    log::debug!(
        "Join over {} probes produced {} matched probes",
        probes.len(),
        pairs.len()
    );
    Ok(JoinResult { pairs })
}
