//! Bounding-box spatial index over a feature collection.
//!
//! The tree is bulk-loaded with sort-tile-recursive (STR) packing into a
//! flat node arena: children of an internal node occupy a contiguous
//! arena range, so traversal needs no pointer chasing and the finished
//! index is freely shared across threads. The index is read-only after
//! construction; rebuild it when the source collection changes.
//!
//! `query` answers at the bounding-box level and returns a candidate
//! set. Exact predicates are re-checked by the caller (the join engine
//! does this). `nearest` and `within_distance` rank by true geometric
//! distance.

use crate::config::Config;
use crate::error::{Result, VeldError};
use crate::feature::{Crs, FeatureCollection, FeatureId};
use crate::geometry::{BoundingBox, Coord, Geometry, predicates};
use crate::maybe_rayon::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::ops::Range;

/// A packed (id, bbox, geometry) record referenced by leaf nodes.
#[derive(Debug, Clone)]
struct Entry {
    id: FeatureId,
    bbox: BoundingBox,
    geometry: Geometry,
}

#[derive(Debug, Clone)]
enum NodeKind {
    /// Range into the entry array.
    Leaf(Range<usize>),
    /// Range into the node arena.
    Internal(Range<usize>),
}

#[derive(Debug, Clone)]
struct Node {
    bbox: BoundingBox,
    kind: NodeKind,
}

/// Structural counters for a built index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub entries: usize,
    pub nodes: usize,
    pub depth: usize,
}

/// Immutable STR-packed R-tree over one feature collection.
///
/// # Example
///
/// ```rust
/// use veld::{BoundingBox, Crs, Feature, FeatureCollection, FeatureId, Geometry, SpatialIndex};
///
/// let mut fc = FeatureCollection::new(Crs::wgs84());
/// for i in 0..100u64 {
///     let point = Geometry::point(i as f64, (i % 10) as f64)?;
///     fc.push(Feature::new(FeatureId(i), point))?;
/// }
///
/// let index = SpatialIndex::build(&fc)?;
/// let hits = index.query(&BoundingBox::new(0.0, 0.0, 9.0, 9.0));
/// assert_eq!(hits.len(), 10);
///
/// let closest = index.nearest(&veld::Coord::new(50.0, 0.0), 3);
/// assert_eq!(closest.len(), 3);
/// # Ok::<(), veld::VeldError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    crs: Crs,
    entries: Vec<Entry>,
    nodes: Vec<Node>,
    root: Option<usize>,
    slots: FxHashMap<FeatureId, usize>,
    depth: usize,
}

impl SpatialIndex {
    /// Bulk-load an index with the default configuration.
    pub fn build(collection: &FeatureCollection) -> Result<Self> {
        Self::build_with_config(collection, &Config::default())
    }

    /// Bulk-load an index via STR packing in O(n log n).
    ///
    /// An empty collection yields a valid empty index.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the configured node capacity is below 2.
    pub fn build_with_config(collection: &FeatureCollection, config: &Config) -> Result<Self> {
        let capacity = config.node_capacity;
        if capacity < 2 {
            return Err(VeldError::InvalidInput(format!(
                "Node capacity must be at least 2, got {}",
                capacity
            )));
        }

        let mut entries: Vec<Entry> = collection
            .iter()
            .map(|f| Entry {
                id: f.id,
                bbox: f.geometry.bounding_box(),
                geometry: f.geometry.clone(),
            })
            .collect();
        let n = entries.len();

        if n == 0 {
            return Ok(Self {
                crs: collection.crs().clone(),
                entries,
                nodes: Vec::new(),
                root: None,
                slots: FxHashMap::default(),
                depth: 0,
            });
        }

        // STR: sort by center x, cut into vertical slices, sort each
        // slice by center y, then chunk into leaves.
        let leaf_count = n.div_ceil(capacity);
        let slice_count = (leaf_count as f64).sqrt().ceil() as usize;
        let slice_len = n.div_ceil(slice_count);

        entries.par_sort_unstable_by(|a, b| a.bbox.center().x.total_cmp(&b.bbox.center().x));
        for slice in entries.chunks_mut(slice_len) {
            slice.par_sort_unstable_by(|a, b| a.bbox.center().y.total_cmp(&b.bbox.center().y));
        }

        let mut nodes: Vec<Node> = Vec::with_capacity(2 * leaf_count);
        let mut start = 0;
        while start < n {
            let slice_end = (start + slice_len).min(n);
            let mut lo = start;
            while lo < slice_end {
                let hi = (lo + capacity).min(slice_end);
                nodes.push(Node {
                    bbox: enclose_entries(&entries[lo..hi]),
                    kind: NodeKind::Leaf(lo..hi),
                });
                lo = hi;
            }
            start = slice_end;
        }
        let mut level = 0..nodes.len();

        // Pack upward level by level. Each level is pushed contiguously,
        // so a parent's children form a contiguous arena range.
        let mut depth = 1;
        while level.len() > 1 {
            let next_start = nodes.len();
            let mut lo = level.start;
            while lo < level.end {
                let hi = (lo + capacity).min(level.end);
                nodes.push(Node {
                    bbox: enclose_nodes(&nodes[lo..hi]),
                    kind: NodeKind::Internal(lo..hi),
                });
                lo = hi;
            }
            level = next_start..nodes.len();
            depth += 1;
        }

        let slots = entries
            .iter()
            .enumerate()
            .map(|(slot, e)| (e.id, slot))
            .collect();

        log::debug!(
            "Built spatial index over {} features: {} nodes, depth {}",
            n,
            nodes.len(),
            depth
        );

        Ok(Self {
            crs: collection.crs().clone(),
            entries,
            root: Some(level.start),
            nodes,
            slots,
            depth,
        })
    }

    /// CRS tag inherited from the source collection.
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Geometry of an indexed feature.
    pub fn geometry(&self, id: FeatureId) -> Option<&Geometry> {
        self.slots.get(&id).map(|&slot| &self.entries[slot].geometry)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            entries: self.entries.len(),
            nodes: self.nodes.len(),
            depth: self.depth,
        }
    }

    /// Every feature whose bounding box intersects the query box.
    ///
    /// This is a candidate set at the bounding-box level; callers apply
    /// exact predicates to the candidates. A malformed or non-finite
    /// query box yields an empty result.
    pub fn query(&self, query_box: &BoundingBox) -> Vec<FeatureId> {
        if !query_box.is_finite()
            || query_box.min_x > query_box.max_x
            || query_box.min_y > query_box.max_y
        {
            log::warn!("Rejecting bounding box query with malformed coordinates");
            return Vec::new();
        }
        let Some(root) = self.root else {
            return Vec::new();
        };

        let mut results = Vec::new();
        let mut stack = vec![root];
        while let Some(slot) = stack.pop() {
            let node = &self.nodes[slot];
            if !node.bbox.intersects(query_box) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf(range) => {
                    for entry in &self.entries[range.clone()] {
                        if entry.bbox.intersects(query_box) {
                            results.push(entry.id);
                        }
                    }
                }
                NodeKind::Internal(range) => stack.extend(range.clone()),
            }
        }
        results
    }

    /// The k features closest to a point by true geometric distance,
    /// ascending, ties broken by lower identifier.
    ///
    /// Branch-and-bound over the tree: nodes are visited in increasing
    /// min-distance order and pruned once k results closer than the
    /// node's min-distance are held. Pruning is strict so equal-distance
    /// candidates in other subtrees still compete on identifier.
    pub fn nearest(&self, point: &Coord, k: usize) -> Vec<(FeatureId, f64)> {
        if k == 0 {
            return Vec::new();
        }
        if !point.is_finite() {
            log::warn!("Rejecting nearest query with non-finite point");
            return Vec::new();
        }
        let Some(root) = self.root else {
            return Vec::new();
        };

        let target = Geometry::Point(*point);
        let mut queue: BinaryHeap<QueueItem> = BinaryHeap::new();
        queue.push(QueueItem {
            dist: self.nodes[root].bbox.min_distance_to(point),
            slot: root,
        });
        // Max-heap of the best k so far; the worst sits on top.
        let mut best: BinaryHeap<Candidate> = BinaryHeap::new();

        while let Some(QueueItem { dist, slot }) = queue.pop() {
            if best.len() == k && best.peek().is_some_and(|worst| dist > worst.dist) {
                break;
            }
            match &self.nodes[slot].kind {
                NodeKind::Leaf(range) => {
                    for entry in &self.entries[range.clone()] {
                        let dist = predicates::distance(&target, &entry.geometry);
                        best.push(Candidate { dist, id: entry.id });
                        if best.len() > k {
                            best.pop();
                        }
                    }
                }
                NodeKind::Internal(range) => {
                    for child in range.clone() {
                        let child_dist = self.nodes[child].bbox.min_distance_to(point);
                        if best.len() < k
                            || best.peek().is_some_and(|worst| child_dist <= worst.dist)
                        {
                            queue.push(QueueItem {
                                dist: child_dist,
                                slot: child,
                            });
                        }
                    }
                }
            }
        }

        let mut results: Vec<(FeatureId, f64)> =
            best.into_iter().map(|c| (c.id, c.dist)).collect();
        results.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        results
    }

    /// All features within `radius` of the point by true geometric
    /// distance, ascending, ties broken by lower identifier.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a non-finite or negative radius.
    pub fn within_distance(&self, point: &Coord, radius: f64) -> Result<Vec<(FeatureId, f64)>> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(VeldError::InvalidInput(format!(
                "Search radius must be finite and non-negative, got {}",
                radius
            )));
        }
        let Some(root) = self.root else {
            return Ok(Vec::new());
        };

        let target = Geometry::Point(*point);
        let mut results: Vec<(FeatureId, f64)> = Vec::new();
        let mut stack = vec![root];
        while let Some(slot) = stack.pop() {
            let node = &self.nodes[slot];
            if node.bbox.min_distance_to(point) > radius {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf(range) => {
                    for entry in &self.entries[range.clone()] {
                        let dist = predicates::distance(&target, &entry.geometry);
                        if dist <= radius {
                            results.push((entry.id, dist));
                        }
                    }
                }
                NodeKind::Internal(range) => stack.extend(range.clone()),
            }
        }
        results.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        Ok(results)
    }
}

fn enclose_entries(entries: &[Entry]) -> BoundingBox {
    let mut bbox = entries[0].bbox;
    for entry in &entries[1..] {
        bbox = bbox.merge(&entry.bbox);
    }
    bbox
}

fn enclose_nodes(nodes: &[Node]) -> BoundingBox {
    let mut bbox = nodes[0].bbox;
    for node in &nodes[1..] {
        bbox = bbox.merge(&node.bbox);
    }
    bbox
}

/// Traversal frontier item ordered as a min-heap on min-distance.
#[derive(Debug, PartialEq)]
struct QueueItem {
    dist: f64,
    slot: usize,
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap
        other.dist.total_cmp(&self.dist)
    }
}

/// Result candidate; the heap keeps the worst (distance, id) on top.
#[derive(Debug, PartialEq)]
struct Candidate {
    dist: f64,
    id: FeatureId,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist.total_cmp(&other.dist).then(self.id.cmp(&other.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;

    /// Deterministic scatter over [0, 100)^2.
    fn scatter(count: u64) -> FeatureCollection {
        let mut fc = FeatureCollection::new(Crs::wgs84());
        for i in 0..count {
            let x = (i.wrapping_mul(2654435761) % 10_000) as f64 / 100.0;
            let y = (i.wrapping_mul(40503) % 10_000) as f64 / 100.0;
            fc.push(Feature::new(FeatureId(i), Geometry::point(x, y).unwrap()))
                .unwrap();
        }
        fc
    }

    #[test]
    fn test_empty_index() {
        let fc = FeatureCollection::new(Crs::wgs84());
        let index = SpatialIndex::build(&fc).unwrap();

        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert!(index.query(&BoundingBox::new(0.0, 0.0, 10.0, 10.0)).is_empty());
        assert!(index.nearest(&Coord::new(0.0, 0.0), 5).is_empty());
        assert!(
            index
                .within_distance(&Coord::new(0.0, 0.0), 10.0)
                .unwrap()
                .is_empty()
        );
        assert_eq!(index.stats().depth, 0);
    }

    #[test]
    fn test_build_rejects_tiny_capacity() {
        let fc = scatter(10);
        let config = Config {
            node_capacity: 1,
            ..Config::default()
        };
        assert!(matches!(
            SpatialIndex::build_with_config(&fc, &config),
            Err(VeldError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_query_matches_brute_force() {
        let fc = scatter(500);
        let index = SpatialIndex::build(&fc).unwrap();
        let query_box = BoundingBox::new(20.0, 30.0, 60.0, 70.0);

        let mut hits = index.query(&query_box);
        hits.sort();

        let mut expected: Vec<FeatureId> = fc
            .iter()
            .filter(|f| f.bounding_box().intersects(&query_box))
            .map(|f| f.id)
            .collect();
        expected.sort();

        assert!(!expected.is_empty());
        assert_eq!(hits, expected);
    }

    #[test]
    fn test_query_rejects_malformed_box() {
        let index = SpatialIndex::build(&scatter(50)).unwrap();
        // min > max
        assert!(index.query(&BoundingBox::new(10.0, 0.0, 0.0, 10.0)).is_empty());
        assert!(
            index
                .query(&BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0))
                .is_empty()
        );
    }

    #[test]
    fn test_nearest_matches_brute_force() {
        let fc = scatter(300);
        let index = SpatialIndex::build(&fc).unwrap();
        let point = Coord::new(50.0, 50.0);

        let got = index.nearest(&point, 1);
        assert_eq!(got.len(), 1);

        let expected = fc
            .iter()
            .map(|f| {
                (
                    f.id,
                    predicates::distance(&Geometry::Point(point), &f.geometry),
                )
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .unwrap();
        assert_eq!(got[0].0, expected.0);
        assert!((got[0].1 - expected.1).abs() < 1e-12);
    }

    #[test]
    fn test_nearest_k_sorted_and_distinct() {
        let fc = scatter(1000);
        let index = SpatialIndex::build(&fc).unwrap();

        let results = index.nearest(&Coord::new(50.0, 50.0), 5);
        assert_eq!(results.len(), 5);
        for pair in results.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
            assert_ne!(pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn test_nearest_ties_break_on_lower_id() {
        let mut fc = FeatureCollection::new(Crs::wgs84());
        // Two points equidistant from the origin
        fc.push(Feature::new(FeatureId(7), Geometry::point(3.0, 0.0).unwrap()))
            .unwrap();
        fc.push(Feature::new(FeatureId(2), Geometry::point(0.0, 3.0).unwrap()))
            .unwrap();
        fc.push(Feature::new(FeatureId(5), Geometry::point(9.0, 9.0).unwrap()))
            .unwrap();
        let index = SpatialIndex::build(&fc).unwrap();

        let results = index.nearest(&Coord::new(0.0, 0.0), 1);
        assert_eq!(results[0].0, FeatureId(2));

        let two = index.nearest(&Coord::new(0.0, 0.0), 2);
        assert_eq!(two[0].0, FeatureId(2));
        assert_eq!(two[1].0, FeatureId(7));
    }

    #[test]
    fn test_nearest_k_exceeding_len() {
        let fc = scatter(4);
        let index = SpatialIndex::build(&fc).unwrap();
        let results = index.nearest(&Coord::new(0.0, 0.0), 10);
        assert_eq!(results.len(), 4);
        assert!(index.nearest(&Coord::new(0.0, 0.0), 0).is_empty());
    }

    #[test]
    fn test_nearest_uses_true_geometry_distance() {
        let mut fc = FeatureCollection::new(Crs::wgs84());
        // A large polygon whose center is far but whose edge is close
        let far_center_near_edge = Geometry::Polygon(
            crate::geometry::Polygon::from_exterior_coords(vec![
                Coord::new(2.0, -50.0),
                Coord::new(100.0, -50.0),
                Coord::new(100.0, 50.0),
                Coord::new(2.0, 50.0),
            ])
            .unwrap(),
        );
        fc.push(Feature::new(FeatureId(1), far_center_near_edge))
            .unwrap();
        fc.push(Feature::new(FeatureId(2), Geometry::point(10.0, 0.0).unwrap()))
            .unwrap();
        let index = SpatialIndex::build(&fc).unwrap();

        let results = index.nearest(&Coord::new(0.0, 0.0), 2);
        // Polygon edge at x=2 beats the point at x=10
        assert_eq!(results[0].0, FeatureId(1));
        assert_eq!(results[0].1, 2.0);
        assert_eq!(results[1].0, FeatureId(2));
        assert_eq!(results[1].1, 10.0);
    }

    #[test]
    fn test_within_distance() {
        let mut fc = FeatureCollection::new(Crs::wgs84());
        for (id, x) in [(1u64, 1.0), (2, 4.0), (3, 9.0)] {
            fc.push(Feature::new(FeatureId(id), Geometry::point(x, 0.0).unwrap()))
                .unwrap();
        }
        let index = SpatialIndex::build(&fc).unwrap();

        let hits = index.within_distance(&Coord::new(0.0, 0.0), 5.0).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, FeatureId(1));
        assert_eq!(hits[1].0, FeatureId(2));

        assert!(index.within_distance(&Coord::new(0.0, 0.0), -1.0).is_err());
        assert!(
            index
                .within_distance(&Coord::new(0.0, 0.0), f64::INFINITY)
                .is_err()
        );
    }

    #[test]
    fn test_small_capacity_deep_tree() {
        let fc = scatter(200);
        let config = Config::default().with_node_capacity(2);
        let index = SpatialIndex::build_with_config(&fc, &config).unwrap();

        let stats = index.stats();
        assert_eq!(stats.entries, 200);
        assert!(stats.depth >= 4);

        // Same answers as the default tree
        let query_box = BoundingBox::new(10.0, 10.0, 40.0, 40.0);
        let mut deep = index.query(&query_box);
        deep.sort();
        let mut wide = SpatialIndex::build(&fc).unwrap().query(&query_box);
        wide.sort();
        assert_eq!(deep, wide);
    }

    #[test]
    fn test_geometry_lookup() {
        let fc = scatter(10);
        let index = SpatialIndex::build(&fc).unwrap();
        assert!(index.geometry(FeatureId(3)).is_some());
        assert!(index.geometry(FeatureId(99)).is_none());
        assert_eq!(index.crs(), &Crs::wgs84());
    }
}
