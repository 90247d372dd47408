//! Approximate offset polygons.
//!
//! A point buffers to a regular N-gon inscribed in the radius. Lines
//! and polygons buffer as a Minkowski-sum approximation: one offset
//! rectangle per segment plus one disc per vertex, merged through the
//! overlay kernel. The result always contains the input, and no point
//! of it lies farther than the radius from the input.

use super::overlay::union_all;
use super::{Coord, Geometry, Polygon};
use crate::error::{Result, VeldError};

/// Minimum accepted segment count for a full circle.
pub const MIN_SEGMENTS: usize = 8;

fn validate(radius: f64, segments: usize) -> Result<()> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(VeldError::InvalidInput(format!(
            "Buffer radius must be finite and positive, got {}",
            radius
        )));
    }
    if segments < MIN_SEGMENTS {
        return Err(VeldError::InvalidInput(format!(
            "Buffer needs at least {} segments, got {}",
            MIN_SEGMENTS, segments
        )));
    }
    Ok(())
}

/// Regular N-gon of the given radius around a center.
fn disc(center: &Coord, radius: f64, segments: usize) -> Result<Polygon> {
    let coords: Vec<Coord> = (0..segments)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * i as f64 / segments as f64;
            Coord::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect();
    Polygon::from_exterior_coords(coords)
}

/// Rectangle covering a segment offset by the radius on both sides.
fn segment_box(a: &Coord, b: &Coord, radius: f64) -> Option<Polygon> {
    let len = a.distance_to(b);
    if len == 0.0 {
        return None;
    }
    let nx = -(b.y - a.y) / len * radius;
    let ny = (b.x - a.x) / len * radius;
    Polygon::from_exterior_coords(vec![
        Coord::new(a.x + nx, a.y + ny),
        Coord::new(b.x + nx, b.y + ny),
        Coord::new(b.x - nx, b.y - ny),
        Coord::new(a.x - nx, a.y - ny),
    ])
    .ok()
}

/// Merge buffer pieces; a connected input yields one region, but the
/// union kernel may legitimately split along tangencies, so keep the
/// largest piece.
fn merge_pieces(pieces: Vec<Polygon>) -> Result<Polygon> {
    union_all(&pieces)
        .into_iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()))
        .ok_or_else(|| VeldError::InvalidGeometry("Buffer produced no area".to_string()))
}

/// Approximate offset polygon around a geometry.
///
/// `segments` is the vertex count used per full circle (default 32 via
/// [`Config`](crate::Config), minimum 8).
///
/// # Errors
///
/// `InvalidInput` for a non-positive or non-finite radius, or too few
/// segments.
///
/// # Example
///
/// ```rust
/// use veld::geometry::buffer::buffer;
/// use veld::{Coord, Geometry};
///
/// let point = Geometry::point(0.0, 0.0).unwrap();
/// let zone = buffer(&point, 10.0, 32).unwrap();
/// assert!(zone.contains_coord(&Coord::new(0.0, 0.0)));
/// // Inscribed: the area approaches a circle's from below
/// assert!(zone.area() < std::f64::consts::PI * 100.0);
/// assert!(zone.area() > 0.97 * std::f64::consts::PI * 100.0);
/// ```
pub fn buffer(geometry: &Geometry, radius: f64, segments: usize) -> Result<Polygon> {
    validate(radius, segments)?;

    match geometry {
        Geometry::Point(c) => disc(c, radius, segments),
        Geometry::LineString(line) => {
            let mut pieces: Vec<Polygon> = Vec::new();
            for c in line.coords() {
                pieces.push(disc(c, radius, segments)?);
            }
            for (a, b) in line.segments() {
                pieces.extend(segment_box(&a, &b, radius));
            }
            merge_pieces(pieces)
        }
        Geometry::Polygon(polygon) => {
            let mut pieces: Vec<Polygon> = vec![polygon.clone()];
            for ring in polygon.rings() {
                for c in &ring.coords()[..ring.coords().len() - 1] {
                    pieces.push(disc(c, radius, segments)?);
                }
                for (a, b) in ring.segments() {
                    pieces.extend(segment_box(&a, &b, radius));
                }
            }
            merge_pieces(pieces)
        }
    }
}

/// Expected area of the inscribed N-gon approximating a circle.
#[cfg(test)]
fn ngon_area(radius: f64, segments: usize) -> f64 {
    0.5 * segments as f64 * radius * radius * (2.0 * std::f64::consts::PI / segments as f64).sin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::LineString;
    use crate::geometry::predicates::{distance, within};

    #[test]
    fn test_rejects_bad_parameters() {
        let point = Geometry::point(0.0, 0.0).unwrap();
        assert!(matches!(
            buffer(&point, 0.0, 32),
            Err(VeldError::InvalidInput(_))
        ));
        assert!(matches!(
            buffer(&point, -1.0, 32),
            Err(VeldError::InvalidInput(_))
        ));
        assert!(matches!(
            buffer(&point, f64::NAN, 32),
            Err(VeldError::InvalidInput(_))
        ));
        assert!(matches!(
            buffer(&point, 1.0, 4),
            Err(VeldError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_point_buffer_is_regular_ngon() {
        let point = Geometry::point(3.0, -2.0).unwrap();
        let zone = buffer(&point, 5.0, 32).unwrap();

        assert_eq!(zone.exterior().coords().len(), 33);
        assert!((zone.area() - ngon_area(5.0, 32)).abs() < 1e-9);

        // Every vertex sits exactly on the radius
        let center = Coord::new(3.0, -2.0);
        for c in zone.exterior().coords() {
            assert!((c.distance_to(&center) - 5.0).abs() < 1e-9);
        }
        assert!(zone.contains_coord(&center));
    }

    #[test]
    fn test_point_buffer_fidelity_scales_with_segments() {
        let point = Geometry::point(0.0, 0.0).unwrap();
        let coarse = buffer(&point, 1.0, 8).unwrap();
        let fine = buffer(&point, 1.0, 64).unwrap();
        assert!(coarse.area() < fine.area());
        assert!(fine.area() < std::f64::consts::PI);
    }

    #[test]
    fn test_linestring_buffer_contains_input() {
        let line = LineString::new(vec![
            Coord::new(0.0, 0.0),
            Coord::new(10.0, 0.0),
            Coord::new(10.0, 10.0),
        ])
        .unwrap();
        let geometry = Geometry::LineString(line.clone());
        let zone = buffer(&geometry, 2.0, 32).unwrap();

        assert!(within(&geometry, &Geometry::Polygon(zone.clone())));
        for c in line.coords() {
            assert!(zone.contains_coord(c));
        }
    }

    #[test]
    fn test_linestring_buffer_stays_near_input() {
        let line = Geometry::LineString(
            LineString::new(vec![Coord::new(0.0, 0.0), Coord::new(10.0, 0.0)]).unwrap(),
        );
        let zone = buffer(&line, 2.0, 32).unwrap();
        for c in zone.exterior().coords() {
            let vertex = Geometry::Point(*c);
            assert!(distance(&vertex, &line) <= 2.0 + 1e-9);
        }
    }

    #[test]
    fn test_polygon_buffer_contains_polygon() {
        let square = Polygon::from_exterior_coords(vec![
            Coord::new(0.0, 0.0),
            Coord::new(4.0, 0.0),
            Coord::new(4.0, 4.0),
            Coord::new(0.0, 4.0),
        ])
        .unwrap();
        let geometry = Geometry::Polygon(square);
        let zone = buffer(&geometry, 1.0, 32).unwrap();

        assert!(within(&geometry, &Geometry::Polygon(zone.clone())));
        // Grown outward on every side
        let bbox = zone.bounding_box();
        assert!(bbox.min_x <= -1.0 + 1e-9);
        assert!(bbox.max_x >= 5.0 - 1e-9);
        assert!(zone.area() > 16.0);
    }

    #[test]
    fn test_buffer_bounded_by_radius() {
        let square = Geometry::Polygon(
            Polygon::from_exterior_coords(vec![
                Coord::new(0.0, 0.0),
                Coord::new(4.0, 0.0),
                Coord::new(4.0, 4.0),
                Coord::new(0.0, 4.0),
            ])
            .unwrap(),
        );
        let zone = buffer(&square, 1.5, 32).unwrap();
        for c in zone.exterior().coords() {
            assert!(distance(&Geometry::Point(*c), &square) <= 1.5 + 1e-9);
        }
    }
}
