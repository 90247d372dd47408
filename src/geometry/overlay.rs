//! Polygon set operations: one boundary-clipping kernel parameterized
//! for union and difference.
//!
//! Every input ring is split into fragments at pairwise edge
//! intersections. A fragment survives iff region membership differs
//! between its two sides (union: inside any input; difference: inside
//! the subject and outside every clip). Surviving fragments are oriented
//! with the result interior on the left, deduplicated by quantized
//! endpoints, and stitched into closed rings with a leftmost-turn rule
//! at junctions. Positive-area rings become shells, negative-area rings
//! become holes of the smallest containing shell.

use super::{Coord, EPSILON, Polygon, Ring};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Which membership test a fragment's sides are compared under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverlayOp {
    Union,
    Difference,
}

/// Merge polygons into maximal regions.
///
/// Disjoint inputs pass through unchanged; overlapping and touching
/// inputs melt into one ring per connected region, with holes where the
/// inputs enclose uncovered space.
pub fn union_all(polygons: &[Polygon]) -> Vec<Polygon> {
    match polygons {
        [] => Vec::new(),
        [one] => vec![one.clone()],
        many => overlay(many, &[], OverlayOp::Union),
    }
}

/// Subtract the clip polygons from the subject.
///
/// Returns the parts of `subject` covered by no clip polygon; the
/// result may be empty (fully covered) or disconnected.
pub fn difference(subject: &Polygon, clips: &[Polygon]) -> Vec<Polygon> {
    if clips.is_empty() {
        return vec![subject.clone()];
    }
    overlay(std::slice::from_ref(subject), clips, OverlayOp::Difference)
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    a: Coord,
    b: Coord,
}

#[derive(Debug, Clone, Copy)]
struct Fragment {
    a: Coord,
    b: Coord,
}

/// Quantization grid for junction keys. Coarser than [`EPSILON`] so a
/// junction computed from different edge pairs still lands on one key.
const KEY_GRID: f64 = 1e7;

fn key(c: &Coord) -> (i64, i64) {
    ((c.x * KEY_GRID).round() as i64, (c.y * KEY_GRID).round() as i64)
}

fn cross(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

/// Record where two edges cut each other, as (parameter, point) pairs
/// so both edges share the exact same junction coordinate.
fn split_edges(
    e1: &Edge,
    e2: &Edge,
    cuts1: &mut SmallVec<[(f64, Coord); 4]>,
    cuts2: &mut SmallVec<[(f64, Coord); 4]>,
) {
    let rx = e1.b.x - e1.a.x;
    let ry = e1.b.y - e1.a.y;
    let sx = e2.b.x - e2.a.x;
    let sy = e2.b.y - e2.a.y;
    let qpx = e2.a.x - e1.a.x;
    let qpy = e2.a.y - e1.a.y;

    let denom = cross(rx, ry, sx, sy);
    if denom.abs() > EPSILON {
        let t = cross(qpx, qpy, sx, sy) / denom;
        let u = cross(qpx, qpy, rx, ry) / denom;
        if (-EPSILON..=1.0 + EPSILON).contains(&t) && (-EPSILON..=1.0 + EPSILON).contains(&u) {
            let t = t.clamp(0.0, 1.0);
            let point = Coord::new(e1.a.x + t * rx, e1.a.y + t * ry);
            cuts1.push((t, point));
            cuts2.push((u.clamp(0.0, 1.0), point));
        }
        return;
    }

    // Parallel. Collinear overlaps contribute the other edge's
    // endpoints as cut points so coincident portions become identical
    // fragments (which then classify together).
    if cross(qpx, qpy, rx, ry).abs() > EPSILON {
        return;
    }
    let len1 = rx * rx + ry * ry;
    let len2 = sx * sx + sy * sy;
    for endpoint in [e2.a, e2.b] {
        let t = ((endpoint.x - e1.a.x) * rx + (endpoint.y - e1.a.y) * ry) / len1;
        if t > EPSILON && t < 1.0 - EPSILON {
            cuts1.push((t, endpoint));
        }
    }
    for endpoint in [e1.a, e1.b] {
        let u = ((endpoint.x - e2.a.x) * sx + (endpoint.y - e2.a.y) * sy) / len2;
        if u > EPSILON && u < 1.0 - EPSILON {
            cuts2.push((u, endpoint));
        }
    }
}

fn inside(polygons: &[Polygon], c: &Coord) -> bool {
    polygons.iter().any(|p| p.parity_contains(c))
}

fn overlay(subject: &[Polygon], clip: &[Polygon], op: OverlayOp) -> Vec<Polygon> {
    let mut edges: Vec<Edge> = Vec::new();
    for polygon in subject.iter().chain(clip.iter()) {
        for ring in polygon.rings() {
            for (a, b) in ring.segments() {
                if a.distance_to(&b) > EPSILON {
                    edges.push(Edge { a, b });
                }
            }
        }
    }

    // Split every edge at its crossings with every other edge.
    let mut cuts: Vec<SmallVec<[(f64, Coord); 4]>> = vec![SmallVec::new(); edges.len()];
    for i in 0..edges.len() {
        for j in (i + 1)..edges.len() {
            let (left, right) = cuts.split_at_mut(j);
            split_edges(&edges[i], &edges[j], &mut left[i], &mut right[0]);
        }
    }

    let membership = |c: &Coord| match op {
        OverlayOp::Union => inside(subject, c) || inside(clip, c),
        OverlayOp::Difference => inside(subject, c) && !inside(clip, c),
    };

    // Classify fragments by probing both sides of the midpoint; keep
    // those whose sides disagree, oriented interior-on-left.
    let mut fragments: Vec<Fragment> = Vec::new();
    let mut seen: FxHashSet<((i64, i64), (i64, i64))> = FxHashSet::default();
    for (edge, edge_cuts) in edges.iter().zip(cuts.iter_mut()) {
        edge_cuts.push((0.0, edge.a));
        edge_cuts.push((1.0, edge.b));
        edge_cuts.sort_by(|x, y| x.0.total_cmp(&y.0));

        for pair in edge_cuts.windows(2) {
            let (_, a) = pair[0];
            let (_, b) = pair[1];
            let len = a.distance_to(&b);
            if len <= EPSILON {
                continue;
            }
            let mid = Coord::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
            let dx = (b.x - a.x) / len;
            let dy = (b.y - a.y) / len;
            // Probe offset scales with the fragment so short arcs near
            // junctions still land on the correct side.
            let delta = (len * 1e-3).max(EPSILON * 10.0);
            let left = membership(&Coord::new(mid.x - dy * delta, mid.y + dx * delta));
            let right = membership(&Coord::new(mid.x + dy * delta, mid.y - dx * delta));

            let fragment = match (left, right) {
                (true, false) => Fragment { a, b },
                (false, true) => Fragment { a: b, b: a },
                _ => continue,
            };
            if seen.insert((key(&fragment.a), key(&fragment.b))) {
                fragments.push(fragment);
            }
        }
    }

    stitch(fragments)
}

/// Connect oriented fragments end-to-start into closed rings, then
/// assemble shells and holes into polygons.
fn stitch(fragments: Vec<Fragment>) -> Vec<Polygon> {
    let mut starts: FxHashMap<(i64, i64), SmallVec<[usize; 2]>> = FxHashMap::default();
    for (slot, fragment) in fragments.iter().enumerate() {
        starts.entry(key(&fragment.a)).or_default().push(slot);
    }

    let mut used = vec![false; fragments.len()];
    let mut shells: Vec<Ring> = Vec::new();
    let mut holes: Vec<Ring> = Vec::new();

    for first in 0..fragments.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let origin = key(&fragments[first].a);
        let mut coords = vec![fragments[first].a, fragments[first].b];
        let mut current = first;
        let mut closed = false;

        while coords.len() <= fragments.len() + 1 {
            let tail = key(&fragments[current].b);
            if tail == origin {
                closed = true;
                break;
            }
            let Some(next) = pick_next(&fragments, &starts, &used, current, tail) else {
                break;
            };
            used[next] = true;
            coords.push(fragments[next].b);
            current = next;
        }

        if !closed {
            continue;
        }
        // Slivers below the area tolerance fail ring construction and
        // are dropped here.
        if let Ok(ring) = Ring::new(coords) {
            if ring.signed_area() > 0.0 {
                shells.push(ring);
            } else {
                holes.push(ring);
            }
        }
    }

    assemble(shells, holes)
}

/// Choose the outgoing fragment at a junction: the leftmost turn from
/// the incoming direction, keeping the interior tight on the left.
fn pick_next(
    fragments: &[Fragment],
    starts: &FxHashMap<(i64, i64), SmallVec<[usize; 2]>>,
    used: &[bool],
    current: usize,
    tail: (i64, i64),
) -> Option<usize> {
    let candidates = starts.get(&tail)?;
    let incoming = &fragments[current];
    let dx = incoming.b.x - incoming.a.x;
    let dy = incoming.b.y - incoming.a.y;

    let mut best: Option<(usize, f64)> = None;
    for &slot in candidates {
        if used[slot] {
            continue;
        }
        let out = &fragments[slot];
        let ox = out.b.x - out.a.x;
        let oy = out.b.y - out.a.y;
        // CCW angle from the incoming direction; the largest value is
        // the leftmost turn.
        let angle = (dx * oy - dy * ox).atan2(dx * ox + dy * oy);
        if best.is_none_or(|(_, best_angle)| angle > best_angle) {
            best = Some((slot, angle));
        }
    }
    best.map(|(slot, _)| slot)
}

/// Attach each hole to the smallest shell containing it.
fn assemble(shells: Vec<Ring>, holes: Vec<Ring>) -> Vec<Polygon> {
    let mut shell_holes: Vec<Vec<Ring>> = (0..shells.len()).map(|_| Vec::new()).collect();

    for hole in holes {
        let probe = ring_interior_point(&hole);
        let owner = shells
            .iter()
            .enumerate()
            .filter(|(_, shell)| shell.ray_cast(&probe))
            .min_by(|(_, x), (_, y)| x.area().total_cmp(&y.area()))
            .map(|(slot, _)| slot);
        if let Some(slot) = owner {
            shell_holes[slot].push(hole);
        }
    }

    shells
        .into_iter()
        .zip(shell_holes)
        .map(|(shell, holes)| Polygon::new(shell, holes))
        .collect()
}

/// A point inside the ring: the centroid when it lands inside, else a
/// vertex nudge along the vertex's interior bisector.
fn ring_interior_point(ring: &Ring) -> Coord {
    let (sx, sy, sa) = ring.centroid_terms();
    if sa.abs() > EPSILON {
        let centroid = Coord::new(sx / sa, sy / sa);
        if ring.ray_cast(&centroid) {
            return centroid;
        }
    }
    // Concave fallback: probe just inside the first corner.
    let coords = ring.coords();
    let a = coords[0];
    let b = coords[1];
    let prev = coords[coords.len() - 2];
    let mx = (b.x + prev.x) / 2.0;
    let my = (b.y + prev.y) / 2.0;
    let delta = 1e-6;
    Coord::new(a.x + (mx - a.x) * delta, a.y + (my - a.y) * delta)
}
