//! Spatial predicates over geometry pairs.
//!
//! Each predicate switches on the variant pair explicitly. Boundary
//! contact within [`EPSILON`](super::EPSILON) counts as intersecting.

use super::{Coord, EPSILON, Geometry, LineString, Polygon};

/// Distance from a point to a segment.
pub(crate) fn point_segment_distance(p: &Coord, a: &Coord, b: &Coord) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    let proj = Coord::new(a.x + t * dx, a.y + t * dy);
    p.distance_to(&proj)
}

/// Cross product of (b - a) and (c - a); sign gives the turn direction.
fn orient(a: &Coord, b: &Coord, c: &Coord) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// True when the segments cross at an interior point of both.
///
/// Collinear overlaps and endpoint touches are not proper crossings;
/// those are covered by the distance-based contact tests.
pub(crate) fn segments_properly_cross(a1: &Coord, a2: &Coord, b1: &Coord, b2: &Coord) -> bool {
    let o1 = orient(a1, a2, b1);
    let o2 = orient(a1, a2, b2);
    let o3 = orient(b1, b2, a1);
    let o4 = orient(b1, b2, a2);
    o1 * o2 < 0.0 && o3 * o4 < 0.0
}

/// Minimum distance between two segments; zero when they cross.
pub(crate) fn segment_segment_distance(a1: &Coord, a2: &Coord, b1: &Coord, b2: &Coord) -> f64 {
    if segments_properly_cross(a1, a2, b1, b2) {
        return 0.0;
    }
    point_segment_distance(a1, b1, b2)
        .min(point_segment_distance(a2, b1, b2))
        .min(point_segment_distance(b1, a1, a2))
        .min(point_segment_distance(b2, a1, a2))
}

fn point_on_linestring(p: &Coord, line: &LineString) -> bool {
    line.segments()
        .any(|(a, b)| point_segment_distance(p, &a, &b) <= EPSILON)
}

fn on_polygon_boundary(p: &Coord, poly: &Polygon) -> bool {
    poly.rings()
        .any(|ring| ring.segments().any(|(a, b)| point_segment_distance(p, &a, &b) <= EPSILON))
}

fn linestrings_touch(a: &LineString, b: &LineString) -> bool {
    a.segments().any(|(a1, a2)| {
        b.segments()
            .any(|(b1, b2)| segment_segment_distance(&a1, &a2, &b1, &b2) <= EPSILON)
    })
}

fn linestring_polygon_intersects(line: &LineString, poly: &Polygon) -> bool {
    if line.coords().iter().any(|c| poly.contains_coord(c)) {
        return true;
    }
    line.segments().any(|(a1, a2)| {
        poly.rings().any(|ring| {
            ring.segments()
                .any(|(b1, b2)| segment_segment_distance(&a1, &a2, &b1, &b2) <= EPSILON)
        })
    })
}

fn polygons_intersect(a: &Polygon, b: &Polygon) -> bool {
    // A boundary vertex of either polygon inside the other settles it,
    // covering full containment. Boundary contact is caught by the
    // segment pair sweep.
    if a.rings()
        .flat_map(|r| r.coords())
        .any(|c| b.contains_coord(c))
    {
        return true;
    }
    if b.rings()
        .flat_map(|r| r.coords())
        .any(|c| a.contains_coord(c))
    {
        return true;
    }
    a.rings().any(|ra| {
        ra.segments().any(|(a1, a2)| {
            b.rings().any(|rb| {
                rb.segments()
                    .any(|(b1, b2)| segment_segment_distance(&a1, &a2, &b1, &b2) <= EPSILON)
            })
        })
    })
}

/// Check whether two geometries share at least one point.
///
/// Boundary contact counts: a point on a polygon's edge intersects the
/// polygon.
///
/// # Examples
///
/// ```rust
/// use veld::geometry::predicates::intersects;
/// use veld::{Coord, Geometry, Polygon};
///
/// let square = Geometry::Polygon(
///     Polygon::from_exterior_coords(vec![
///         Coord::new(0.0, 0.0),
///         Coord::new(2.0, 0.0),
///         Coord::new(2.0, 2.0),
///         Coord::new(0.0, 2.0),
///     ])
///     .unwrap(),
/// );
/// let inside = Geometry::point(1.0, 1.0).unwrap();
/// let outside = Geometry::point(5.0, 5.0).unwrap();
///
/// assert!(intersects(&inside, &square));
/// assert!(!intersects(&outside, &square));
/// ```
pub fn intersects(a: &Geometry, b: &Geometry) -> bool {
    if !a
        .bounding_box()
        .expand(EPSILON)
        .intersects(&b.bounding_box())
    {
        return false;
    }

    match (a, b) {
        (Geometry::Point(p), Geometry::Point(q)) => p.distance_to(q) <= EPSILON,
        (Geometry::Point(p), Geometry::LineString(l))
        | (Geometry::LineString(l), Geometry::Point(p)) => point_on_linestring(p, l),
        (Geometry::Point(p), Geometry::Polygon(pg))
        | (Geometry::Polygon(pg), Geometry::Point(p)) => pg.contains_coord(p),
        (Geometry::LineString(x), Geometry::LineString(y)) => linestrings_touch(x, y),
        (Geometry::LineString(l), Geometry::Polygon(pg))
        | (Geometry::Polygon(pg), Geometry::LineString(l)) => {
            linestring_polygon_intersects(l, pg)
        }
        (Geometry::Polygon(x), Geometry::Polygon(y)) => polygons_intersect(x, y),
    }
}

fn linestring_within(line: &LineString, container: &Polygon) -> bool {
    if !line.coords().iter().all(|c| container.contains_coord(c)) {
        return false;
    }
    for (a1, a2) in line.segments() {
        for ring in container.rings() {
            for (b1, b2) in ring.segments() {
                if segments_properly_cross(&a1, &a2, &b1, &b2) {
                    return false;
                }
            }
        }
        // A segment can exit and re-enter through boundary vertices
        // without a proper crossing; the midpoint catches that.
        let mid = Coord::new((a1.x + a2.x) / 2.0, (a1.y + a2.y) / 2.0);
        if !container.contains_coord(&mid) {
            return false;
        }
    }
    true
}

fn polygon_within(inner: &Polygon, container: &Polygon) -> bool {
    for ring in inner.rings() {
        if !ring.coords().iter().all(|c| container.contains_coord(c)) {
            return false;
        }
        for (a1, a2) in ring.segments() {
            for cr in container.rings() {
                for (b1, b2) in cr.segments() {
                    if segments_properly_cross(&a1, &a2, &b1, &b2) {
                        return false;
                    }
                }
            }
            let mid = Coord::new((a1.x + a2.x) / 2.0, (a1.y + a2.y) / 2.0);
            if !container.contains_coord(&mid) {
                return false;
            }
        }
    }
    // A container hole strictly inside the inner polygon excludes part
    // of the inner area.
    for hole in container.interiors() {
        for c in hole.coords() {
            if inner.parity_contains(c) && !on_polygon_boundary(c, inner) {
                return false;
            }
        }
    }
    true
}

/// Check whether every point of `a` lies inside or on the boundary of `b`.
///
/// Evaluates to `false` whenever `b` is not a polygon: only area
/// geometries can contain, and a non-area right side is a legal query
/// with an empty answer, never an error.
///
/// # Examples
///
/// ```rust
/// use veld::geometry::predicates::within;
/// use veld::{Coord, Geometry, Polygon};
///
/// let square = Geometry::Polygon(
///     Polygon::from_exterior_coords(vec![
///         Coord::new(0.0, 0.0),
///         Coord::new(2.0, 0.0),
///         Coord::new(2.0, 2.0),
///         Coord::new(0.0, 2.0),
///     ])
///     .unwrap(),
/// );
/// let p = Geometry::point(1.0, 1.0).unwrap();
///
/// assert!(within(&p, &square));
/// // The right side must be an area
/// assert!(!within(&p, &p));
/// ```
pub fn within(a: &Geometry, b: &Geometry) -> bool {
    let Geometry::Polygon(container) = b else {
        return false;
    };
    match a {
        Geometry::Point(p) => container.contains_coord(p),
        Geometry::LineString(l) => linestring_within(l, container),
        Geometry::Polygon(p) => polygon_within(p, container),
    }
}

fn min_over_segments<I>(p: &Coord, segments: I) -> f64
where
    I: Iterator<Item = (Coord, Coord)>,
{
    segments
        .map(|(a, b)| point_segment_distance(p, &a, &b))
        .fold(f64::INFINITY, f64::min)
}

fn min_segment_pairs<I>(a: I, b: &[(Coord, Coord)]) -> f64
where
    I: Iterator<Item = (Coord, Coord)>,
{
    let mut best = f64::INFINITY;
    for (a1, a2) in a {
        for (b1, b2) in b {
            best = best.min(segment_segment_distance(&a1, &a2, b1, b2));
        }
    }
    best
}

fn polygon_segments(p: &Polygon) -> Vec<(Coord, Coord)> {
    p.rings().flat_map(|r| r.segments()).collect()
}

/// Minimum Euclidean distance between two geometries.
///
/// Zero when the geometries intersect, including a point inside a
/// polygon's area. Otherwise the closest approach between their
/// boundaries.
///
/// # Examples
///
/// ```rust
/// use veld::geometry::predicates::distance;
/// use veld::Geometry;
///
/// let a = Geometry::point(0.0, 0.0).unwrap();
/// let b = Geometry::point(3.0, 4.0).unwrap();
/// assert_eq!(distance(&a, &b), 5.0);
/// assert_eq!(distance(&a, &a), 0.0);
/// ```
pub fn distance(a: &Geometry, b: &Geometry) -> f64 {
    if intersects(a, b) {
        return 0.0;
    }

    match (a, b) {
        (Geometry::Point(p), Geometry::Point(q)) => p.distance_to(q),
        (Geometry::Point(p), Geometry::LineString(l))
        | (Geometry::LineString(l), Geometry::Point(p)) => min_over_segments(p, l.segments()),
        (Geometry::Point(p), Geometry::Polygon(pg))
        | (Geometry::Polygon(pg), Geometry::Point(p)) => {
            min_over_segments(p, pg.rings().flat_map(|r| r.segments()))
        }
        (Geometry::LineString(x), Geometry::LineString(y)) => {
            let ys: Vec<_> = y.segments().collect();
            min_segment_pairs(x.segments(), &ys)
        }
        (Geometry::LineString(l), Geometry::Polygon(pg))
        | (Geometry::Polygon(pg), Geometry::LineString(l)) => {
            let ps = polygon_segments(pg);
            min_segment_pairs(l.segments(), &ps)
        }
        (Geometry::Polygon(x), Geometry::Polygon(y)) => {
            let ys = polygon_segments(y);
            min_segment_pairs(x.rings().flat_map(|r| r.segments()), &ys)
        }
    }
}
