//! Vector geometry model: coordinates, bounding boxes, and the geometry
//! variants used throughout the engine.
//!
//! Geometries are immutable once constructed. Constructors validate their
//! input (finite coordinates, closed rings, enough distinct vertices) so
//! that downstream predicates and index operations never see degenerate
//! shapes. Deserialization routes through the same constructors, so
//! serialized input cannot smuggle in shapes the constructors reject.

use crate::error::{Result, VeldError};
use serde::{Deserialize, Serialize};

pub mod buffer;
pub mod overlay;
pub mod predicates;

/// Tolerance used for coordinate snapping and boundary tests.
pub const EPSILON: f64 = 1e-9;

/// A position in 2D Cartesian space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoord")]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

/// Serialized shape of a coordinate; `TryFrom` re-checks finiteness on
/// the way in.
#[derive(Deserialize)]
struct RawCoord {
    x: f64,
    y: f64,
}

impl TryFrom<RawCoord> for Coord {
    type Error = VeldError;

    fn try_from(raw: RawCoord) -> Result<Self> {
        let c = Coord::new(raw.x, raw.y);
        if !c.is_finite() {
            return Err(VeldError::InvalidGeometry(format!(
                "Non-finite coordinate ({}, {})",
                raw.x, raw.y
            )));
        }
        Ok(c)
    }
}

impl Coord {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another coordinate.
    pub fn distance_to(&self, other: &Coord) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle minimally enclosing a geometry.
///
/// Callers constructing one directly are expected to uphold
/// `min_x <= max_x` and `min_y <= max_y`; boxes derived from geometries
/// always do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box enclosing every coordinate, or `None` for an empty
    /// iterator.
    pub fn from_coords<I>(coords: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coord>,
    {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(first.x, first.y, first.x, first.y);
        for c in iter {
            bbox.min_x = bbox.min_x.min(c.x);
            bbox.min_y = bbox.min_y.min(c.y);
            bbox.max_x = bbox.max_x.max(c.x);
            bbox.max_y = bbox.max_y.max(c.y);
        }
        Some(bbox)
    }

    /// Check whether two boxes overlap. Touching edges count as
    /// intersecting.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Check whether a coordinate lies inside or on the boundary.
    pub fn contains_coord(&self, c: &Coord) -> bool {
        c.x >= self.min_x && c.x <= self.max_x && c.y >= self.min_y && c.y <= self.max_y
    }

    /// Grow the box by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self::new(
            self.min_x - margin,
            self.min_y - margin,
            self.max_x + margin,
            self.max_y + margin,
        )
    }

    /// Smallest box enclosing both boxes.
    pub fn merge(&self, other: &BoundingBox) -> Self {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    pub fn center(&self) -> Coord {
        Coord::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Minimum distance from a coordinate to any point of the box.
    /// Zero when the coordinate lies inside.
    pub fn min_distance_to(&self, c: &Coord) -> f64 {
        let dx = (self.min_x - c.x).max(0.0).max(c.x - self.max_x);
        let dy = (self.min_y - c.y).max(0.0).max(c.y - self.max_y);
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }
}

/// Smallest box enclosing a non-empty coordinate slice.
///
/// Invariant-carrying callers (rings and line strings are never empty)
/// use this instead of the `Option` returning constructor.
pub(crate) fn coords_bbox(coords: &[Coord]) -> BoundingBox {
    let mut bbox = BoundingBox::new(
        f64::INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NEG_INFINITY,
    );
    for c in coords {
        bbox.min_x = bbox.min_x.min(c.x);
        bbox.min_y = bbox.min_y.min(c.y);
        bbox.max_x = bbox.max_x.max(c.x);
        bbox.max_y = bbox.max_y.max(c.y);
    }
    bbox
}

/// An ordered sequence of coordinates forming an open path.
///
/// # Example
///
/// ```rust
/// use veld::{Coord, LineString};
///
/// let line = LineString::new(vec![
///     Coord::new(0.0, 0.0),
///     Coord::new(3.0, 4.0),
/// ])
/// .unwrap();
/// assert_eq!(line.length(), 5.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordSeq")]
pub struct LineString {
    coords: Vec<Coord>,
}

/// Serialized shape of a coordinate sequence; `TryFrom` routes line
/// strings and rings back through their validating constructors.
#[derive(Deserialize)]
struct RawCoordSeq {
    coords: Vec<Coord>,
}

impl TryFrom<RawCoordSeq> for LineString {
    type Error = VeldError;

    fn try_from(raw: RawCoordSeq) -> Result<Self> {
        Self::new(raw.coords)
    }
}

impl LineString {
    /// Build a line string from at least two coordinates.
    ///
    /// # Errors
    ///
    /// `InvalidGeometry` if any coordinate is non-finite, fewer than two
    /// coordinates are given, or the total length is zero.
    pub fn new(coords: Vec<Coord>) -> Result<Self> {
        for c in &coords {
            if !c.is_finite() {
                return Err(VeldError::InvalidGeometry(format!(
                    "Line string has non-finite coordinate ({}, {})",
                    c.x, c.y
                )));
            }
        }

        if coords.len() < 2 {
            return Err(VeldError::InvalidGeometry(format!(
                "Line string needs at least 2 coordinates, got {}",
                coords.len()
            )));
        }

        let length: f64 = coords.windows(2).map(|w| w[0].distance_to(&w[1])).sum();
        if length <= EPSILON {
            return Err(VeldError::InvalidGeometry(
                "Zero-length line string".to_string(),
            ));
        }

        Ok(Self { coords })
    }

    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    /// Iterate over consecutive coordinate pairs.
    pub fn segments(&self) -> impl Iterator<Item = (Coord, Coord)> + '_ {
        self.coords.windows(2).map(|w| (w[0], w[1]))
    }

    /// Total path length.
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance_to(&b)).sum()
    }
}

/// A closed ring of coordinates (first equals last).
///
/// Rings are built from an open or closed coordinate sequence; the
/// constructor closes the ring when needed and rejects degenerate input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordSeq")]
pub struct Ring {
    coords: Vec<Coord>,
}

impl TryFrom<RawCoordSeq> for Ring {
    type Error = VeldError;

    fn try_from(raw: RawCoordSeq) -> Result<Self> {
        Self::new(raw.coords)
    }
}

impl Ring {
    /// Build a closed ring.
    ///
    /// Input may be open (the first coordinate is appended) or already
    /// closed (a last coordinate within tolerance of the first is snapped
    /// onto it exactly).
    ///
    /// # Errors
    ///
    /// `InvalidGeometry` if any coordinate is non-finite, fewer than three
    /// distinct vertices remain, or the enclosed area is zero.
    pub fn new(mut coords: Vec<Coord>) -> Result<Self> {
        for c in &coords {
            if !c.is_finite() {
                return Err(VeldError::InvalidGeometry(format!(
                    "Ring has non-finite coordinate ({}, {})",
                    c.x, c.y
                )));
            }
        }

        let Some(&first) = coords.first() else {
            return Err(VeldError::InvalidGeometry(
                "Ring has no coordinates".to_string(),
            ));
        };

        match coords.last() {
            Some(last) if last.distance_to(&first) <= EPSILON && coords.len() > 1 => {
                let n = coords.len();
                coords[n - 1] = first;
            }
            _ => coords.push(first),
        }

        let mut distinct = 0usize;
        let mut prev: Option<Coord> = None;
        for c in &coords[..coords.len() - 1] {
            if prev.is_none_or(|p| p.distance_to(c) > EPSILON) {
                distinct += 1;
                prev = Some(*c);
            }
        }
        if distinct < 3 {
            return Err(VeldError::InvalidGeometry(format!(
                "Ring needs at least 3 distinct vertices, got {}",
                distinct
            )));
        }

        let ring = Self { coords };
        if ring.area() <= EPSILON {
            return Err(VeldError::InvalidGeometry(
                "Ring encloses no area".to_string(),
            ));
        }
        Ok(ring)
    }

    /// The closed coordinate sequence (first equals last).
    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    /// Iterate over the ring's directed edges.
    pub fn segments(&self) -> impl Iterator<Item = (Coord, Coord)> + '_ {
        self.coords.windows(2).map(|w| (w[0], w[1]))
    }

    /// Shoelace area; positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f64 {
        let mut sum = 0.0;
        for (a, b) in self.segments() {
            sum += a.x * b.y - b.x * a.y;
        }
        sum / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// The same ring with opposite winding.
    pub fn reversed(&self) -> Ring {
        let mut coords = self.coords.clone();
        coords.reverse();
        Self { coords }
    }

    pub fn perimeter(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance_to(&b)).sum()
    }

    /// Even-odd ray cast; boundary points are not handled specially.
    pub(crate) fn ray_cast(&self, c: &Coord) -> bool {
        let mut inside = false;
        for (a, b) in self.segments() {
            if (a.y > c.y) != (b.y > c.y) {
                let x_cross = a.x + (c.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if x_cross > c.x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Area-weighted centroid terms: (sum_x, sum_y, signed_area).
    ///
    /// The sums are pre-division, so multiple rings can be combined before
    /// normalizing.
    pub(crate) fn centroid_terms(&self) -> (f64, f64, f64) {
        let mut sx = 0.0;
        let mut sy = 0.0;
        for (a, b) in self.segments() {
            let cross = a.x * b.y - b.x * a.y;
            sx += (a.x + b.x) * cross;
            sy += (a.y + b.y) * cross;
        }
        (sx / 6.0, sy / 6.0, self.signed_area())
    }
}

/// A polygon composed of an exterior ring and zero or more holes.
///
/// The constructor normalizes winding: exterior counter-clockwise, holes
/// clockwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPolygon")]
pub struct Polygon {
    exterior: Ring,
    interiors: Vec<Ring>,
}

/// Serialized shape of a polygon; conversion re-normalizes winding. The
/// rings themselves are validated by their own deserialization.
#[derive(Deserialize)]
struct RawPolygon {
    exterior: Ring,
    #[serde(default)]
    interiors: Vec<Ring>,
}

impl From<RawPolygon> for Polygon {
    fn from(raw: RawPolygon) -> Self {
        Self::new(raw.exterior, raw.interiors)
    }
}

impl Polygon {
    pub fn new(exterior: Ring, interiors: Vec<Ring>) -> Self {
        let exterior = if exterior.is_ccw() {
            exterior
        } else {
            exterior.reversed()
        };
        let interiors = interiors
            .into_iter()
            .map(|r| if r.is_ccw() { r.reversed() } else { r })
            .collect();
        Self {
            exterior,
            interiors,
        }
    }

    /// Build a hole-free polygon straight from exterior coordinates.
    pub fn from_exterior_coords(coords: Vec<Coord>) -> Result<Self> {
        Ok(Self::new(Ring::new(coords)?, Vec::new()))
    }

    pub fn exterior(&self) -> &Ring {
        &self.exterior
    }

    pub fn interiors(&self) -> &[Ring] {
        &self.interiors
    }

    /// Exterior ring followed by the holes.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        std::iter::once(&self.exterior).chain(self.interiors.iter())
    }

    /// Enclosed area with holes subtracted.
    pub fn area(&self) -> f64 {
        let holes: f64 = self.interiors.iter().map(|r| r.area()).sum();
        (self.exterior.area() - holes).max(0.0)
    }

    pub fn perimeter(&self) -> f64 {
        self.rings().map(|r| r.perimeter()).sum()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        coords_bbox(self.exterior.coords())
    }

    /// Even-odd containment across all rings; boundary points are not
    /// handled specially.
    pub(crate) fn parity_contains(&self, c: &Coord) -> bool {
        let mut inside = false;
        for ring in self.rings() {
            if ring.ray_cast(c) {
                inside = !inside;
            }
        }
        inside
    }

    /// Check whether a coordinate is inside the polygon or on its
    /// boundary (within [`EPSILON`]).
    pub fn contains_coord(&self, c: &Coord) -> bool {
        for ring in self.rings() {
            for (a, b) in ring.segments() {
                if predicates::point_segment_distance(c, &a, &b) <= EPSILON {
                    return true;
                }
            }
        }
        self.parity_contains(c)
    }

    /// Area centroid, holes weighted negatively.
    pub fn centroid(&self) -> Coord {
        let mut sx = 0.0;
        let mut sy = 0.0;
        let mut sa = 0.0;
        for ring in self.rings() {
            let (x, y, a) = ring.centroid_terms();
            sx += x;
            sy += y;
            sa += a;
        }
        Coord::new(sx / sa, sy / sa)
    }
}

/// Tagged geometry variant.
///
/// Predicates switch on the variant pair explicitly rather than
/// dispatching through a trait, keeping the hot paths monomorphic.
///
/// # Example
///
/// ```rust
/// use veld::{Coord, Geometry, Polygon};
///
/// let square = Polygon::from_exterior_coords(vec![
///     Coord::new(0.0, 0.0),
///     Coord::new(4.0, 0.0),
///     Coord::new(4.0, 4.0),
///     Coord::new(0.0, 4.0),
/// ])
/// .unwrap();
/// let geom = Geometry::Polygon(square);
/// assert_eq!(geom.area(), 16.0);
///
/// let bbox = geom.bounding_box();
/// assert_eq!(bbox.max_x, 4.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point(Coord),
    LineString(LineString),
    Polygon(Polygon),
}

impl Geometry {
    /// Validated point constructor.
    ///
    /// # Errors
    ///
    /// `InvalidGeometry` if either coordinate is non-finite.
    pub fn point(x: f64, y: f64) -> Result<Self> {
        let c = Coord::new(x, y);
        if !c.is_finite() {
            return Err(VeldError::InvalidGeometry(format!(
                "Point has non-finite coordinate ({}, {})",
                x, y
            )));
        }
        Ok(Self::Point(c))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Geometry::Point(c) => BoundingBox::new(c.x, c.y, c.x, c.y),
            Geometry::LineString(l) => coords_bbox(l.coords()),
            Geometry::Polygon(p) => p.bounding_box(),
        }
    }

    /// Enclosed area; zero for points and line strings.
    pub fn area(&self) -> f64 {
        match self {
            Geometry::Point(_) | Geometry::LineString(_) => 0.0,
            Geometry::Polygon(p) => p.area(),
        }
    }

    /// Path length for line strings, boundary perimeter for polygons,
    /// zero for points.
    pub fn length(&self) -> f64 {
        match self {
            Geometry::Point(_) => 0.0,
            Geometry::LineString(l) => l.length(),
            Geometry::Polygon(p) => p.perimeter(),
        }
    }

    pub fn centroid(&self) -> Coord {
        match self {
            Geometry::Point(c) => *c,
            Geometry::LineString(l) => {
                let mut sx = 0.0;
                let mut sy = 0.0;
                let mut total = 0.0;
                for (a, b) in l.segments() {
                    let len = a.distance_to(&b);
                    sx += (a.x + b.x) / 2.0 * len;
                    sy += (a.y + b.y) / 2.0 * len;
                    total += len;
                }
                Coord::new(sx / total, sy / total)
            }
            Geometry::Polygon(p) => p.centroid(),
        }
    }

    /// Variant name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "point",
            Geometry::LineString(_) => "line string",
            Geometry::Polygon(_) => "polygon",
        }
    }
}

impl From<LineString> for Geometry {
    fn from(value: LineString) -> Self {
        Self::LineString(value)
    }
}

impl From<Polygon> for Geometry {
    fn from(value: Polygon) -> Self {
        Self::Polygon(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Polygon {
        Polygon::from_exterior_coords(vec![
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(1.0, 1.0),
            Coord::new(0.0, 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_coord_distance() {
        let a = Coord::new(0.0, 0.0);
        let b = Coord::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }

    #[test]
    fn test_bbox_intersects() {
        let a = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
        let b = BoundingBox::new(1.0, 1.0, 3.0, 3.0);
        let c = BoundingBox::new(5.0, 5.0, 6.0, 6.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));

        // Touching edges count as intersecting
        let d = BoundingBox::new(2.0, 0.0, 4.0, 2.0);
        assert!(a.intersects(&d));
    }

    #[test]
    fn test_bbox_min_distance() {
        let bbox = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
        assert_eq!(bbox.min_distance_to(&Coord::new(1.0, 1.0)), 0.0);
        assert_eq!(bbox.min_distance_to(&Coord::new(5.0, 1.0)), 3.0);
        assert_eq!(bbox.min_distance_to(&Coord::new(5.0, 6.0)), 5.0);
    }

    #[test]
    fn test_bbox_merge_and_expand() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BoundingBox::new(2.0, -1.0, 3.0, 0.5);
        let merged = a.merge(&b);
        assert_eq!(merged.min_x, 0.0);
        assert_eq!(merged.min_y, -1.0);
        assert_eq!(merged.max_x, 3.0);
        assert_eq!(merged.max_y, 1.0);

        let expanded = a.expand(0.5);
        assert_eq!(expanded.min_x, -0.5);
        assert_eq!(expanded.max_y, 1.5);
    }

    #[test]
    fn test_linestring_validation() {
        assert!(LineString::new(vec![]).is_err());
        assert!(LineString::new(vec![Coord::new(0.0, 0.0)]).is_err());
        // Zero-length line
        assert!(LineString::new(vec![Coord::new(1.0, 1.0), Coord::new(1.0, 1.0)]).is_err());
        // Non-finite coordinate
        assert!(LineString::new(vec![Coord::new(f64::NAN, 0.0), Coord::new(1.0, 1.0)]).is_err());

        let line = LineString::new(vec![
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(1.0, 1.0),
        ])
        .unwrap();
        assert_eq!(line.length(), 2.0);
        assert_eq!(line.segments().count(), 2);
    }

    #[test]
    fn test_ring_closes_open_input() {
        let ring = Ring::new(vec![
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(1.0, 1.0),
        ])
        .unwrap();
        let coords = ring.coords();
        assert_eq!(coords.first(), coords.last());
        assert_eq!(coords.len(), 4);
    }

    #[test]
    fn test_ring_accepts_closed_input() {
        let ring = Ring::new(vec![
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(1.0, 1.0),
            Coord::new(0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(ring.coords().len(), 4);
    }

    #[test]
    fn test_ring_rejects_degenerate() {
        // Single point
        assert!(Ring::new(vec![Coord::new(1.0, 1.0)]).is_err());
        // Two distinct vertices
        assert!(Ring::new(vec![Coord::new(0.0, 0.0), Coord::new(1.0, 0.0)]).is_err());
        // Collinear (zero area)
        assert!(
            Ring::new(vec![
                Coord::new(0.0, 0.0),
                Coord::new(1.0, 0.0),
                Coord::new(2.0, 0.0),
            ])
            .is_err()
        );
    }

    #[test]
    fn test_ring_signed_area_and_winding() {
        let ccw = Ring::new(vec![
            Coord::new(0.0, 0.0),
            Coord::new(2.0, 0.0),
            Coord::new(2.0, 2.0),
            Coord::new(0.0, 2.0),
        ])
        .unwrap();
        assert_eq!(ccw.signed_area(), 4.0);
        assert!(ccw.is_ccw());

        let cw = ccw.reversed();
        assert_eq!(cw.signed_area(), -4.0);
        assert!(!cw.is_ccw());
        assert_eq!(cw.area(), 4.0);
    }

    #[test]
    fn test_polygon_normalizes_winding() {
        let cw_exterior = Ring::new(vec![
            Coord::new(0.0, 0.0),
            Coord::new(0.0, 1.0),
            Coord::new(1.0, 1.0),
            Coord::new(1.0, 0.0),
        ])
        .unwrap();
        assert!(!cw_exterior.is_ccw());

        let poly = Polygon::new(cw_exterior, vec![]);
        assert!(poly.exterior().is_ccw());
    }

    #[test]
    fn test_polygon_area_with_hole() {
        let exterior = Ring::new(vec![
            Coord::new(0.0, 0.0),
            Coord::new(4.0, 0.0),
            Coord::new(4.0, 4.0),
            Coord::new(0.0, 4.0),
        ])
        .unwrap();
        let hole = Ring::new(vec![
            Coord::new(1.0, 1.0),
            Coord::new(2.0, 1.0),
            Coord::new(2.0, 2.0),
            Coord::new(1.0, 2.0),
        ])
        .unwrap();
        let poly = Polygon::new(exterior, vec![hole]);
        assert_eq!(poly.area(), 15.0);
        assert!(!poly.interiors()[0].is_ccw());
    }

    #[test]
    fn test_polygon_contains_coord() {
        let poly = unit_square();
        assert!(poly.contains_coord(&Coord::new(0.5, 0.5)));
        assert!(!poly.contains_coord(&Coord::new(1.5, 0.5)));
        // Boundary is inclusive
        assert!(poly.contains_coord(&Coord::new(1.0, 0.5)));
        assert!(poly.contains_coord(&Coord::new(0.0, 0.0)));
    }

    #[test]
    fn test_polygon_with_hole_contains() {
        let exterior = Ring::new(vec![
            Coord::new(0.0, 0.0),
            Coord::new(4.0, 0.0),
            Coord::new(4.0, 4.0),
            Coord::new(0.0, 4.0),
        ])
        .unwrap();
        let hole = Ring::new(vec![
            Coord::new(1.0, 1.0),
            Coord::new(3.0, 1.0),
            Coord::new(3.0, 3.0),
            Coord::new(1.0, 3.0),
        ])
        .unwrap();
        let poly = Polygon::new(exterior, vec![hole]);

        assert!(poly.contains_coord(&Coord::new(0.5, 0.5)));
        // Inside the hole
        assert!(!poly.contains_coord(&Coord::new(2.0, 2.0)));
        // On the hole's boundary
        assert!(poly.contains_coord(&Coord::new(1.0, 2.0)));
    }

    #[test]
    fn test_polygon_centroid() {
        let poly = unit_square();
        let c = poly.centroid();
        assert_eq!(c.x, 0.5);
        assert_eq!(c.y, 0.5);
    }

    #[test]
    fn test_geometry_bbox_contains_all_coords() {
        let line = LineString::new(vec![
            Coord::new(-1.0, 2.0),
            Coord::new(3.0, -4.0),
            Coord::new(0.5, 7.0),
        ])
        .unwrap();
        let geom = Geometry::LineString(line.clone());
        let bbox = geom.bounding_box();
        for c in line.coords() {
            assert!(bbox.contains_coord(c));
        }
    }

    #[test]
    fn test_geometry_point_validation() {
        assert!(Geometry::point(1.0, 2.0).is_ok());
        assert!(Geometry::point(f64::NAN, 2.0).is_err());
        assert!(Geometry::point(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_geometry_measures() {
        let point = Geometry::point(3.0, 4.0).unwrap();
        assert_eq!(point.area(), 0.0);
        assert_eq!(point.length(), 0.0);
        assert_eq!(point.centroid(), Coord::new(3.0, 4.0));

        let square = Geometry::Polygon(unit_square());
        assert_eq!(square.area(), 1.0);
        assert_eq!(square.length(), 4.0);
    }

    #[test]
    fn test_geometry_serde_round_trip() {
        let geom = Geometry::Polygon(unit_square());
        let json = serde_json::to_string(&geom).unwrap();
        assert!(json.contains("\"type\":\"Polygon\""));
        let back: Geometry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, geom);
    }

    #[test]
    fn test_deserialize_rejects_degenerate_geometry() {
        // Open two-vertex ring inside a polygon
        let open_ring = r#"{
            "type": "Polygon",
            "exterior": {"coords": [{"x": 0.0, "y": 0.0}, {"x": 1.0, "y": 0.0}]}
        }"#;
        assert!(serde_json::from_str::<Geometry>(open_ring).is_err());

        // Single-coordinate line string
        let short_line = r#"{"type": "LineString", "coords": [{"x": 0.0, "y": 0.0}]}"#;
        assert!(serde_json::from_str::<Geometry>(short_line).is_err());

        // Collinear ring encloses no area
        let collinear = r#"{
            "coords": [{"x": 0.0, "y": 0.0}, {"x": 1.0, "y": 0.0}, {"x": 2.0, "y": 0.0}]
        }"#;
        assert!(serde_json::from_str::<Ring>(collinear).is_err());

        // Finiteness is re-checked at the coordinate level
        assert!(Coord::try_from(RawCoord { x: f64::NAN, y: 0.0 }).is_err());
        assert!(Coord::try_from(RawCoord { x: 0.0, y: 1.0 }).is_ok());
    }

    #[test]
    fn test_deserialize_normalizes_polygon_winding() {
        // Clockwise exterior in the serialized form
        let json = r#"{
            "exterior": {"coords": [
                {"x": 0.0, "y": 0.0}, {"x": 0.0, "y": 1.0},
                {"x": 1.0, "y": 1.0}, {"x": 1.0, "y": 0.0}
            ]}
        }"#;
        let poly: Polygon = serde_json::from_str(json).unwrap();
        assert!(poly.exterior().is_ccw());
        assert!(poly.interiors().is_empty());
        assert_eq!(poly.area(), 1.0);
    }
}
