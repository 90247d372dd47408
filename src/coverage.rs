//! Service-area aggregation: buffers, dissolve, coverage gaps, and
//! nearest-facility assignment.
//!
//! Everything here is a pure transform over immutable collections.
//! Dissolve finds connected components of the pairwise-intersects graph
//! with union-find over index-provided candidate pairs, then performs
//! one geometric union per component through the overlay kernel.

use crate::config::Config;
use crate::error::{Result, VeldError};
use crate::feature::{AttrValue, Crs, Feature, FeatureCollection, FeatureId};
use crate::geometry::buffer::buffer;
use crate::geometry::overlay;
use crate::geometry::{Geometry, Polygon, predicates};
use crate::index::SpatialIndex;

/// Buffer every feature of a collection by one radius.
///
/// Ids and attributes carry over; geometries become the buffer
/// polygons. `config.buffer_segments` controls circle fidelity.
///
/// # Errors
///
/// `InvalidInput` for a bad radius or segment count.
pub fn buffer_features(
    collection: &FeatureCollection,
    radius: f64,
    config: &Config,
) -> Result<FeatureCollection> {
    let mut buffered = FeatureCollection::new(collection.crs().clone());
    for feature in collection.iter() {
        let zone = buffer(&feature.geometry, radius, config.buffer_segments)?;
        buffered.push(Feature {
            id: feature.id,
            geometry: Geometry::Polygon(zone),
            attributes: feature.attributes.clone(),
        })?;
    }
    Ok(buffered)
}

/// Plain union-find over polygon slots.
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, slot: usize) -> usize {
        let mut root = slot;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression
        let mut cursor = slot;
        while self.parent[cursor] != root {
            let next = self.parent[cursor];
            self.parent[cursor] = root;
            cursor = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Group polygons into connected components of the pairwise-intersects
/// graph. Candidate pairs come from a temporary index over the
/// polygons' bounding boxes, so well-distributed inputs stay far from
/// quadratic.
fn connected_components(polygons: &[Polygon]) -> Vec<Vec<usize>> {
    let geometries: Vec<Geometry> = polygons
        .iter()
        .map(|p| Geometry::Polygon(p.clone()))
        .collect();

    let mut sets = DisjointSets::new(polygons.len());
    // The temporary collection is internal: sequential slot ids cannot
    // collide and the CRS tag is never compared.
    let mut fc = FeatureCollection::new(Crs::default());
    for (slot, geometry) in geometries.iter().enumerate() {
        let _ = fc.push(Feature::new(FeatureId(slot as u64), geometry.clone()));
    }
    let index = match SpatialIndex::build(&fc) {
        Ok(index) => index,
        // Build only fails on a sub-2 node capacity; the default is 16.
        Err(err) => unreachable!("index build over dissolve candidates: {err}"),
    };
    for (slot, geometry) in geometries.iter().enumerate() {
        for candidate in index.query(&geometry.bounding_box()) {
            let other = candidate.0 as usize;
            if other > slot && predicates::intersects(geometry, &geometries[other]) {
                sets.union(slot, other);
            }
        }
    }

    let mut components: Vec<Vec<usize>> = Vec::new();
    let mut roots: Vec<Option<usize>> = vec![None; polygons.len()];
    for slot in 0..polygons.len() {
        let root = sets.find(slot);
        match roots[root] {
            Some(component) => components[component].push(slot),
            None => {
                roots[root] = Some(components.len());
                components.push(vec![slot]);
            }
        }
    }
    components
}

/// Merge overlapping and touching polygons into maximal connected
/// regions.
///
/// Zero polygons dissolve to an empty set; disjoint polygons pass
/// through unchanged. Idempotent: dissolving the output again changes
/// nothing.
pub fn dissolve(polygons: &[Polygon]) -> Vec<Polygon> {
    let components = connected_components(polygons);
    let mut regions = Vec::with_capacity(components.len());
    for component in &components {
        if let [single] = component.as_slice() {
            regions.push(polygons[*single].clone());
            continue;
        }
        let members: Vec<Polygon> = component.iter().map(|&s| polygons[s].clone()).collect();
        regions.extend(overlay::union_all(&members));
    }
    log::debug!(
        "Dissolved {} polygons into {} regions",
        polygons.len(),
        regions.len()
    );
    regions
}

/// Buffer facilities and dissolve the buffers into coverage regions.
///
/// The result is a new collection in the facilities' CRS with fresh
/// sequential ids; each region carries a `sources` attribute counting
/// the facilities merged into it.
///
/// # Errors
///
/// `InvalidInput` for a bad radius or segment count.
pub fn service_coverage(
    facilities: &FeatureCollection,
    radius: f64,
    config: &Config,
) -> Result<FeatureCollection> {
    let mut buffers: Vec<Polygon> = Vec::with_capacity(facilities.len());
    for feature in facilities.iter() {
        buffers.push(buffer(&feature.geometry, radius, config.buffer_segments)?);
    }

    let components = connected_components(&buffers);
    let mut coverage = FeatureCollection::new(facilities.crs().clone());
    let mut next_id = 0u64;
    for component in &components {
        let members: Vec<Polygon> = component.iter().map(|&s| buffers[s].clone()).collect();
        let regions = if members.len() == 1 {
            members
        } else {
            overlay::union_all(&members)
        };
        for region in regions {
            coverage.push(
                Feature::new(FeatureId(next_id), Geometry::Polygon(region))
                    .with_attr("sources", AttrValue::Int(component.len() as i64)),
            )?;
            next_id += 1;
        }
    }
    Ok(coverage)
}

/// Parts of the study area covered by no coverage polygon.
///
/// Subtraction runs through the same overlay kernel as dissolve; the
/// coverage set is dissolved first so overlapping regions are not
/// clipped twice.
pub fn coverage_gaps(study_area: &Polygon, coverage: &[Polygon]) -> Vec<Polygon> {
    let dissolved = dissolve(coverage);
    overlay::difference(study_area, &dissolved)
}

/// One demand feature assigned to its closest facility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignment {
    pub demand: FeatureId,
    pub facility: FeatureId,
    pub distance: f64,
}

/// Assign every demand feature to the nearest indexed facility.
///
/// Uses a k=1 nearest query per demand; equal distances resolve to the
/// lower facility identifier. An empty facility index yields an empty
/// assignment list.
///
/// # Errors
///
/// `CrsMismatch` when the demand collection's CRS differs from the
/// index's.
pub fn assign_nearest(
    facilities: &SpatialIndex,
    demands: &FeatureCollection,
) -> Result<Vec<Assignment>> {
    if facilities.crs() != demands.crs() {
        return Err(VeldError::CrsMismatch {
            left: facilities.crs().clone(),
            right: demands.crs().clone(),
        });
    }

    let mut assignments = Vec::with_capacity(demands.len());
    for demand in demands.iter() {
        let anchor = demand.geometry.centroid();
        if let Some(&(facility, distance)) = facilities.nearest(&anchor, 1).first() {
            assignments.push(Assignment {
                demand: demand.id,
                facility,
                distance,
            });
        }
    }
    Ok(assignments)
}
