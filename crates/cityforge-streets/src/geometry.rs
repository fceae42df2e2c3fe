//! 2D primitives shared by the street graph and the estate pipeline.
//!
//! Angles are radians in `[0, TAU)`, measured counter-clockwise from +X.
//! Polygons are open rings (the closing edge is implied) and are treated as
//! counter-clockwise wherever winding matters.

use clipper2_rust::{inflate_paths_d, EndType, JoinType, PathD, PathsD, PointD};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Squared distance under which a crossing counts as touching an endpoint.
pub const TOUCH_EPSILON_SQ: f32 = 0.005;

/// Relative tolerance for treating two directions as parallel.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Polygons with less area than this are considered collapsed.
pub const MIN_POLYGON_AREA: f32 = 1e-3;

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Rectangle spanned by two opposite corners, in any order.
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Square of side `size` centred on `center`.
    pub fn from_center_size(center: Vec2, size: f32) -> Self {
        let half = Vec2::splat(size * 0.5);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Degenerate rectangle covering a single point.
    pub fn point(p: Vec2) -> Self {
        Self { min: p, max: p }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Grow (or shrink, for negative margins) on every side.
    pub fn expanded(&self, margin: f32) -> Rect {
        Rect {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }

    /// Whether any part of segment `a..b` lies inside the rectangle.
    ///
    /// Liang–Barsky clipping of the segment parameter against all four slabs.
    pub fn overlaps_segment(&self, a: Vec2, b: Vec2) -> bool {
        let d = b - a;
        let mut t0 = 0.0f32;
        let mut t1 = 1.0f32;
        let slabs = [
            (-d.x, a.x - self.min.x),
            (d.x, self.max.x - a.x),
            (-d.y, a.y - self.min.y),
            (d.y, self.max.y - a.y),
        ];
        for (p, q) in slabs {
            if p.abs() < f32::EPSILON {
                if q < 0.0 {
                    return false;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return false;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return false;
                }
                t1 = t1.min(r);
            }
        }
        t0 <= t1
    }
}

// ── Angles ──────────────────────────────────────────────────────────────

/// Wrap an angle into `[0, TAU)`.
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Smallest absolute difference between two angles, in `[0, PI]`.
pub fn angular_difference(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(TAU);
    d.min(TAU - d)
}

/// Unit vector pointing along `angle`.
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle of a vector in `[0, TAU)`.
pub fn angle_of(v: Vec2) -> f32 {
    normalize_angle(v.y.atan2(v.x))
}

// ── Segments and lines ──────────────────────────────────────────────────

/// Parametric crossing of segments `p0..p1` and `q0..q1`.
///
/// Returns `(t, u)` with the crossing at `p0 + (p1 - p0) * t` and
/// `q0 + (q1 - q0) * u`, both in `[0, 1]`. Parallel or degenerate segments
/// never intersect.
pub fn segment_intersection(p0: Vec2, p1: Vec2, q0: Vec2, q1: Vec2) -> Option<(f32, f32)> {
    let r = p1 - p0;
    let s = q1 - q0;
    let denom = r.perp_dot(s);
    if denom.abs() <= PARALLEL_EPSILON * r.length() * s.length() || denom == 0.0 {
        return None;
    }
    let qp = q0 - p0;
    let t = qp.perp_dot(s) / denom;
    let u = qp.perp_dot(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some((t, u))
    } else {
        None
    }
}

/// Closest point to `p` on segment `a..b` and its parameter along the segment.
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> (Vec2, f32) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return (a, 0.0);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t, t)
}

/// Distance from `p` to segment `a..b`.
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let (closest, _) = closest_point_on_segment(p, a, b);
    p.distance(closest)
}

/// Crossing of the infinite lines `p + d·t` and `q + e·u`.
pub fn line_intersection(p: Vec2, d: Vec2, q: Vec2, e: Vec2) -> Option<Vec2> {
    let denom = d.perp_dot(e);
    if denom.abs() <= PARALLEL_EPSILON * d.length() * e.length() || denom == 0.0 {
        return None;
    }
    let t = (q - p).perp_dot(e) / denom;
    Some(p + d * t)
}

// ── Polygons ────────────────────────────────────────────────────────────

/// Shoelace area; positive for counter-clockwise rings.
pub fn signed_area(polygon: &[Vec2]) -> f32 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0f32;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        twice += a.perp_dot(b);
    }
    twice * 0.5
}

/// Area-weighted centroid, falling back to the vertex mean for slivers.
pub fn centroid(polygon: &[Vec2]) -> Vec2 {
    if polygon.is_empty() {
        return Vec2::ZERO;
    }
    let area = signed_area(polygon);
    if area.abs() < MIN_POLYGON_AREA {
        let sum: Vec2 = polygon.iter().copied().sum();
        return sum / polygon.len() as f32;
    }
    let mut acc = Vec2::ZERO;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        acc += (a + b) * a.perp_dot(b);
    }
    acc / (6.0 * area)
}

/// Length of the shortest edge, closing edge included.
pub fn min_edge_length(polygon: &[Vec2]) -> f32 {
    if polygon.len() < 2 {
        return 0.0;
    }
    (0..polygon.len())
        .map(|i| polygon[i].distance(polygon[(i + 1) % polygon.len()]))
        .fold(f32::INFINITY, f32::min)
}

/// Reverse the ring in place if it winds clockwise.
pub fn ensure_ccw(polygon: &mut [Vec2]) {
    if signed_area(polygon) < 0.0 {
        polygon.reverse();
    }
}

/// True when no two non-adjacent edges touch or cross.
pub fn is_simple_polygon(polygon: &[Vec2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let (a0, a1) = (polygon[i], polygon[(i + 1) % n]);
        if a0.distance_squared(a1) <= f32::EPSILON {
            return false;
        }
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (b0, b1) = (polygon[j], polygon[(j + 1) % n]);
            if segment_intersection(a0, a1, b0, b1).is_some() {
                return false;
            }
        }
    }
    true
}

/// Decimal places kept by the offset engine.
const OFFSET_PRECISION: i32 = 3;

fn to_path(polygon: &[Vec2]) -> PathD {
    polygon
        .iter()
        .map(|p| PointD::new(p.x as f64, p.y as f64))
        .collect()
}

fn from_path(path: &PathD) -> Vec<Vec2> {
    path.iter().map(|p| Vec2::new(p.x as f32, p.y as f32)).collect()
}

/// Offset a polygon inward by `distance` with miter joins.
///
/// Corners whose miter would reach further than `miter_limit × distance`
/// are squared off. When the offset pinches the polygon into several pieces
/// the largest one is kept. The result is counter-clockwise; an empty vector
/// means the polygon collapsed.
pub fn inset_polygon(polygon: &[Vec2], distance: f32, miter_limit: f32) -> Vec<Vec2> {
    if polygon.len() < 3 || signed_area(polygon).abs() <= MIN_POLYGON_AREA {
        return Vec::new();
    }
    let mut ring = polygon.to_vec();
    ensure_ccw(&mut ring);
    if distance <= 0.0 {
        return ring;
    }

    let paths: PathsD = vec![to_path(&ring)];
    let result = inflate_paths_d(
        &paths,
        -(distance as f64),
        JoinType::Miter,
        EndType::Polygon,
        miter_limit as f64,
        OFFSET_PRECISION,
        0.25,
    );

    let mut best: Option<(f32, Vec<Vec2>)> = None;
    for path in result.iter().filter(|path| path.len() >= 3) {
        let mut piece = from_path(path);
        let area = signed_area(&piece);
        if area.abs() <= MIN_POLYGON_AREA {
            continue;
        }
        if best.as_ref().map_or(true, |(a, _)| area.abs() > *a) {
            ensure_ccw(&mut piece);
            best = Some((area.abs(), piece));
        }
    }
    best.map(|(_, piece)| piece).unwrap_or_default()
}
