//! Per-cluster spatial and topological index of street points and strokes.
//!
//! The store is an arena: points and strokes are addressed by [`PointId`] and
//! [`StrokeId`] handles, incidence lists hold handles, and ids are minted by
//! counters local to the store. Two R-trees answer proximity queries (one
//! over point positions, one over stroke bounding boxes) and a set of packed
//! id pairs answers adjacency in O(1).
//!
//! Points exist in the arena before they are stored: the generator mints
//! endpoints for candidate strokes, and only [`StrokeStore::add_stroke`]
//! registers them in the spatial index.

use glam::Vec2;
use std::collections::HashSet;
use std::f32::consts::PI;

use crate::error::StreetError;
use crate::geometry::{
    closest_point_on_segment, direction, line_intersection, normalize_angle,
    segment_intersection, Rect, TOUCH_EPSILON_SQ,
};
use crate::point::{PointId, StreetPoint, StrokeUse};
use crate::spatial::BoxTree;
use crate::stroke::{IntersectionTarget, Stroke, StrokeGeometry, StrokeId, StrokeIntersection};

/// Sections further than this many combined half-widths from the junction
/// come from near-parallel curbs and are replaced by a straight-through point.
const SECTION_REACH: f32 = 4.0;

fn pack(a: PointId, b: PointId) -> u64 {
    ((a.0 as u64) << 32) | b.0 as u64
}

/// All street points and strokes of one cluster.
#[derive(Debug)]
pub struct StrokeStore {
    cluster: u64,
    points: Vec<StreetPoint>,
    street_points: Vec<PointId>,
    strokes: Vec<Option<Stroke>>,
    stroke_count: usize,
    next_stroke_id: u32,
    /// Arena slots of released candidate endpoints, reused by `create_point`.
    free_points: Vec<PointId>,
    point_tree: BoxTree<PointId>,
    stroke_tree: BoxTree<StrokeId>,
    connections: HashSet<u64>,
}

impl StrokeStore {
    /// Empty store for `cluster`, with spatial trees rooted at `bounds`.
    pub fn new(cluster: u64, bounds: Rect) -> Self {
        Self {
            cluster,
            points: Vec::new(),
            street_points: Vec::new(),
            strokes: Vec::new(),
            stroke_count: 0,
            next_stroke_id: 0,
            free_points: Vec::new(),
            point_tree: BoxTree::new(bounds),
            stroke_tree: BoxTree::new(bounds),
            connections: HashSet::new(),
        }
    }

    pub fn cluster_id(&self) -> u64 {
        self.cluster
    }

    pub fn bounds(&self) -> Rect {
        self.point_tree.bounds()
    }

    // ── Arena ───────────────────────────────────────────────────────────

    /// Mint a point in the arena. It joins the spatial index once a stroke uses it.
    pub fn create_point(&mut self, position: Vec2) -> PointId {
        if let Some(id) = self.free_points.pop() {
            self.points[id.index()] = StreetPoint::new(id, position);
            return id;
        }
        let id = PointId(self.points.len() as u32);
        self.points.push(StreetPoint::new(id, position));
        id
    }

    /// Hand an unused arena point back for reuse.
    ///
    /// Only points that were never stored and have no strokes are released.
    /// The caller must not hold on to `id` afterwards.
    pub fn release_point(&mut self, id: PointId) -> bool {
        let unused = self
            .point(id)
            .is_some_and(|p| !p.in_store() && p.degree() == 0);
        if !unused || self.free_points.contains(&id) {
            return false;
        }
        self.free_points.push(id);
        true
    }

    /// Arena slots currently waiting for reuse.
    pub fn free_point_count(&self) -> usize {
        self.free_points.len()
    }

    /// Mint an unstored stroke between two arena points.
    pub fn new_stroke(
        &mut self,
        a: PointId,
        b: PointId,
        weight: f32,
        primary: bool,
    ) -> Result<Stroke, StreetError> {
        self.check_point(a)?;
        self.check_point(b)?;
        let id = StrokeId(self.next_stroke_id);
        self.next_stroke_id += 1;
        Ok(Stroke::new(id, a, b, weight, primary))
    }

    pub fn point(&self, id: PointId) -> Option<&StreetPoint> {
        self.points.get(id.index())
    }

    pub fn stroke(&self, id: StrokeId) -> Option<&Stroke> {
        self.strokes.get(id.index()).and_then(Option::as_ref)
    }

    /// Stored strokes in id order.
    pub fn strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.strokes.iter().flatten()
    }

    /// Listed street points in registration order.
    pub fn street_points(&self) -> impl Iterator<Item = &StreetPoint> {
        self.street_points
            .iter()
            .map(move |id| &self.points[id.index()])
    }

    pub fn street_point_ids(&self) -> &[PointId] {
        &self.street_points
    }

    pub fn stroke_count(&self) -> usize {
        self.stroke_count
    }

    pub fn point_count(&self) -> usize {
        self.street_points.len()
    }

    /// Cached length, direction and angle of `stroke`.
    pub fn geometry<'s>(&self, stroke: &'s Stroke) -> &'s StrokeGeometry {
        stroke.cached_geometry(|| (self.pos(stroke.a()), self.pos(stroke.b())))
    }

    /// Positions of both endpoints of `stroke`.
    pub fn endpoints(&self, stroke: &Stroke) -> (Vec2, Vec2) {
        (self.pos(stroke.a()), self.pos(stroke.b()))
    }

    fn pos(&self, id: PointId) -> Vec2 {
        self.points[id.index()].position()
    }

    fn check_point(&self, id: PointId) -> Result<(), StreetError> {
        if id.index() < self.points.len() {
            Ok(())
        } else {
            Err(StreetError::UnknownPoint(id))
        }
    }

    fn stroke_rect(&self, stroke: &Stroke) -> Rect {
        let (a, b) = self.endpoints(stroke);
        Rect::new(a, b)
    }

    fn half_width(&self, id: StrokeId) -> f32 {
        self.stroke(id).map_or(0.0, |s| s.width() * 0.5)
    }

    // ── Mutation ────────────────────────────────────────────────────────

    /// Store `stroke`, registering any endpoint not yet in the index.
    pub fn add_stroke(&mut self, mut stroke: Stroke) -> Result<StrokeId, StreetError> {
        if let Some(cluster) = stroke.cluster() {
            return Err(StreetError::StrokeAlreadyStored { cluster });
        }
        let (a, b) = (stroke.a(), stroke.b());
        self.check_point(a)?;
        self.check_point(b)?;
        if a == b || self.pos(a).distance_squared(self.pos(b)) <= f32::EPSILON {
            return Err(StreetError::ZeroLengthStroke { a, b });
        }
        let id = stroke.id();
        if self.stroke(id).is_some() {
            return Err(StreetError::StrokeAlreadyStored {
                cluster: self.cluster,
            });
        }

        self.register_point(a);
        self.register_point(b);
        self.points[a.index()].link_outgoing(id);
        self.points[b.index()].link_incoming(id);
        self.connections.insert(pack(a, b));
        self.connections.insert(pack(b, a));
        let rect = self.stroke_rect(&stroke);
        self.stroke_tree.insert(id, rect);

        stroke.set_cluster(Some(self.cluster));
        if self.strokes.len() <= id.index() {
            self.strokes.resize_with(id.index() + 1, || None);
        }
        self.strokes[id.index()] = Some(stroke);
        self.stroke_count += 1;
        Ok(id)
    }

    /// Take `stroke` out of the store. Its endpoints stay registered.
    pub fn remove(&mut self, stroke: &Stroke) -> Result<Stroke, StreetError> {
        match stroke.cluster() {
            None => return Err(StreetError::StrokeNotStored(stroke.id())),
            Some(found) if found != self.cluster => {
                return Err(StreetError::ForeignStroke {
                    expected: self.cluster,
                    found,
                })
            }
            Some(_) => {}
        }
        let id = stroke.id();
        let mut removed = self
            .strokes
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(StreetError::StrokeNotStored(id))?;

        let rect = self.stroke_rect(&removed);
        self.stroke_tree.remove(id, rect);
        let (a, b) = (removed.a(), removed.b());
        self.points[a.index()].unlink(id);
        self.points[b.index()].unlink(id);
        if !self.has_stroke_between(a, b) {
            self.connections.remove(&pack(a, b));
            self.connections.remove(&pack(b, a));
        }
        self.stroke_count -= 1;

        removed.set_cluster(None);
        removed.clear_traversed();
        Ok(removed)
    }

    /// Move a point, re-indexing it and every incident stroke.
    ///
    /// Drops the point's junction caches, the geometry of each incident
    /// stroke, and the junction caches of the neighbours at their far ends.
    pub fn move_point(&mut self, id: PointId, position: Vec2) -> Result<(), StreetError> {
        self.check_point(id)?;
        let old = self.pos(id);
        let in_store = self.points[id.index()].in_store();
        let incident: Vec<StrokeId> = {
            let p = &self.points[id.index()];
            p.outgoing().iter().chain(p.incoming()).copied().collect()
        };

        if in_store {
            self.point_tree.remove(id, Rect::point(old));
        }
        for &sid in &incident {
            if let Some(s) = self.stroke(sid) {
                let rect = self.stroke_rect(s);
                self.stroke_tree.remove(sid, rect);
            }
        }

        self.points[id.index()].set_position(position);
        if in_store {
            self.point_tree.insert(id, Rect::point(position));
        }

        for sid in incident {
            let Some(stroke) = self.strokes.get_mut(sid.index()).and_then(Option::as_mut) else {
                continue;
            };
            stroke.invalidate_geometry();
            let far = stroke.other(id);
            let rect = Rect::new(position, far.map_or(position, |f| self.points[f.index()].position()));
            self.stroke_tree.insert(sid, rect);
            if let Some(far) = far {
                self.points[far.index()].invalidate();
            }
        }
        Ok(())
    }

    /// Recreate an arena point under a known id, padding the arena as needed.
    pub(crate) fn restore_point(&mut self, id: PointId, position: Vec2, in_store: bool) {
        while self.points.len() <= id.index() {
            let filler = PointId(self.points.len() as u32);
            self.points.push(StreetPoint::new(filler, position));
            if filler != id {
                self.free_points.push(filler);
            }
        }
        self.free_points.retain(|&f| f != id);
        self.points[id.index()].set_position(position);
        if in_store {
            self.register_point(id);
        }
    }

    /// Store a stroke under a known id.
    pub(crate) fn restore_stroke(
        &mut self,
        id: StrokeId,
        a: PointId,
        b: PointId,
        weight: f32,
        primary: bool,
    ) -> Result<StrokeId, StreetError> {
        self.check_point(a)?;
        self.check_point(b)?;
        self.next_stroke_id = self.next_stroke_id.max(id.0 + 1);
        self.add_stroke(Stroke::new(id, a, b, weight, primary))
    }

    /// Arena points, stored or not, in id order.
    pub(crate) fn arena(&self) -> &[StreetPoint] {
        &self.points
    }

    fn register_point(&mut self, id: PointId) {
        let point = &mut self.points[id.index()];
        if point.in_store() {
            return;
        }
        point.set_in_store(true);
        let position = point.position();
        self.point_tree.insert(id, Rect::point(position));
        self.street_points.push(id);
    }

    fn has_stroke_between(&self, a: PointId, b: PointId) -> bool {
        let p = &self.points[a.index()];
        p.outgoing()
            .iter()
            .chain(p.incoming())
            .filter_map(|&sid| self.stroke(sid))
            .any(|s| s.other(a) == Some(b))
    }

    /// Reset both traversal flags of every stored stroke.
    pub fn clear_traversed(&mut self) {
        for stroke in self.strokes.iter_mut().flatten() {
            stroke.clear_traversed();
        }
    }

    /// Mark `stroke` as walked starting from `from`.
    pub fn mark_traversed(&mut self, stroke: StrokeId, from: PointId) -> Result<(), StreetError> {
        self.strokes
            .get_mut(stroke.index())
            .and_then(Option::as_mut)
            .ok_or(StreetError::StrokeNotStored(stroke))?
            .mark_traversed_from(from)
    }

    /// Drop stroke-less points from the listing. The spatial index keeps them.
    pub fn polish_street_points(&mut self) -> usize {
        let before = self.street_points.len();
        let points = &self.points;
        self.street_points
            .retain(|id| points[id.index()].degree() > 0);
        before - self.street_points.len()
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Whether a stroke joins `a` and `b`, in either direction.
    pub fn are_connected(&self, a: PointId, b: PointId) -> bool {
        self.connections.contains(&pack(a, b)) || self.connections.contains(&pack(b, a))
    }

    /// Nearest stored point strictly closer than `min_dist` to `position`, other than `excluded`.
    pub fn find_closest_below_but_not(
        &self,
        position: Vec2,
        min_dist: f32,
        excluded: Option<PointId>,
    ) -> Option<PointId> {
        let limit_sq = min_dist * min_dist;
        let mut best: Option<(f32, PointId)> = None;
        for id in self
            .point_tree
            .query(Rect::from_center_size(position, 2.0 * min_dist))
        {
            if Some(id) == excluded {
                continue;
            }
            let d_sq = self.pos(id).distance_squared(position);
            if d_sq < limit_sq && best.map_or(true, |(bd, _)| d_sq < bd) {
                best = Some((d_sq, id));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Nearest stored stroke within `max_distance` of `point`, ignoring strokes at `point`.
    pub fn get_closest_stroke(&self, point: PointId, max_distance: f32) -> Option<StrokeIntersection> {
        self.closest_stroke_excluding(point, max_distance, &[])
    }

    /// Like [`get_closest_stroke`](Self::get_closest_stroke), also ignoring
    /// strokes that touch any of `related`.
    pub fn closest_stroke_excluding(
        &self,
        point: PointId,
        max_distance: f32,
        related: &[PointId],
    ) -> Option<StrokeIntersection> {
        let position = self.point(point)?.position();
        let mut best: Option<StrokeIntersection> = None;
        let mut best_distance = max_distance;
        for sid in self
            .stroke_tree
            .query(Rect::from_center_size(position, 2.0 * max_distance))
        {
            let Some(stroke) = self.stroke(sid) else {
                continue;
            };
            if stroke.touches(point) || related.iter().any(|&r| stroke.touches(r)) {
                continue;
            }
            let (a, b) = self.endpoints(stroke);
            let (closest, t) = closest_point_on_segment(position, a, b);
            let distance = closest.distance(position);
            if distance < best_distance {
                best_distance = distance;
                best = Some(StrokeIntersection {
                    position: closest,
                    existing: sid,
                    existing_scale: t,
                    target: IntersectionTarget::Point {
                        id: point,
                        distance,
                    },
                });
            }
        }
        best
    }

    /// Nearest stored point within `max_distance` of `stroke`, ignoring its endpoints.
    pub fn get_closest_point(&self, stroke: &Stroke, max_distance: f32) -> Option<StrokeIntersection> {
        let (a, b) = self.endpoints(stroke);
        let mut best: Option<StrokeIntersection> = None;
        let mut best_distance = max_distance;
        for pid in self.point_tree.query(Rect::new(a, b).expanded(max_distance)) {
            if stroke.touches(pid) {
                continue;
            }
            let (closest, t) = closest_point_on_segment(self.pos(pid), a, b);
            let distance = closest.distance(self.pos(pid));
            if distance < best_distance {
                best_distance = distance;
                best = Some(StrokeIntersection {
                    position: closest,
                    existing: stroke.id(),
                    existing_scale: t,
                    target: IntersectionTarget::Point { id: pid, distance },
                });
            }
        }
        best
    }

    /// Closest true crossing of `candidate` with a stored stroke, measured from `reference`.
    ///
    /// Crossings within touching distance of any of the four endpoints are
    /// ignored, so strokes meeting at a shared junction never count.
    pub fn intersects_may_touch_closest(
        &self,
        candidate: &Stroke,
        reference: Vec2,
    ) -> Option<StrokeIntersection> {
        let (pa, pb) = self.endpoints(candidate);
        let mut best: Option<(f32, StrokeIntersection)> = None;
        for sid in self.stroke_tree.query(Rect::new(pa, pb)) {
            if sid == candidate.id() {
                continue;
            }
            let Some(existing) = self.stroke(sid) else {
                continue;
            };
            let (qa, qb) = self.endpoints(existing);
            let Some((t, u)) = segment_intersection(pa, pb, qa, qb) else {
                continue;
            };
            let x = pa + (pb - pa) * t;
            if [pa, pb, qa, qb]
                .iter()
                .any(|e| e.distance_squared(x) < TOUCH_EPSILON_SQ)
            {
                continue;
            }
            let d_sq = x.distance_squared(reference);
            if best.as_ref().map_or(true, |(bd, _)| d_sq < *bd) {
                best = Some((
                    d_sq,
                    StrokeIntersection {
                        position: x,
                        existing: sid,
                        existing_scale: u,
                        target: IntersectionTarget::Stroke {
                            id: candidate.id(),
                            scale: t,
                        },
                    },
                ));
            }
        }
        best.map(|(_, hit)| hit)
    }

    // ── Junction caches ─────────────────────────────────────────────────

    /// Incident strokes of `id`, sorted by ascending outgoing angle.
    pub fn angle_array(&self, id: PointId) -> &[StrokeUse] {
        let Some(point) = self.points.get(id.index()) else {
            return &[];
        };
        point
            .angle_cache
            .get_or_init(|| self.compute_angle_array(point))
    }

    fn compute_angle_array(&self, point: &StreetPoint) -> Vec<StrokeUse> {
        let mut uses = Vec::with_capacity(point.degree());
        for &sid in point.outgoing() {
            if let Some(s) = self.stroke(sid) {
                uses.push(StrokeUse {
                    stroke: sid,
                    angle: self.geometry(s).angle,
                    outgoing: true,
                });
            }
        }
        for &sid in point.incoming() {
            if let Some(s) = self.stroke(sid) {
                uses.push(StrokeUse {
                    stroke: sid,
                    angle: normalize_angle(self.geometry(s).angle + PI),
                    outgoing: false,
                });
            }
        }
        uses.sort_by(|x, y| x.angle.total_cmp(&y.angle).then(x.stroke.cmp(&y.stroke)));
        uses
    }

    /// Curb corners of `id`: entry `i` lies between angle-array entries `i` and `i + 1`.
    ///
    /// `None` marks a pair of curbs without a usable crossing. A dead end has
    /// a single entry just past the end of its stroke.
    pub fn section_array(&self, id: PointId) -> &[Option<Vec2>] {
        let Some(point) = self.points.get(id.index()) else {
            return &[];
        };
        point
            .section_cache
            .get_or_init(|| self.compute_section_array(point))
    }

    fn compute_section_array(&self, point: &StreetPoint) -> Vec<Option<Vec2>> {
        let uses = self.angle_array(point.id());
        let center = point.position();
        let n = uses.len();
        (0..n)
            .map(|i| {
                let cur = uses[i];
                let next = uses[(i + 1) % n];
                let hw_cur = self.half_width(cur.stroke);
                let u1 = direction(cur.angle);
                if n == 1 {
                    return Some(center - u1 * hw_cur);
                }
                let hw_next = self.half_width(next.stroke);
                let u2 = direction(next.angle);
                let straight = || {
                    (u1.dot(u2) < 0.0).then(|| center + u1.perp() * (hw_cur + hw_next) * 0.5)
                };
                match line_intersection(center + u1.perp() * hw_cur, u1, center - u2.perp() * hw_next, u2) {
                    Some(p) if p.distance(center) <= SECTION_REACH * (hw_cur + hw_next) => Some(p),
                    _ => straight(),
                }
            })
            .collect()
    }

    /// Curb corner at `id` between `curr` and the next stroke counter-clockwise, `prev`.
    pub fn section_point_by_stroke(
        &self,
        id: PointId,
        curr: StrokeId,
        prev: StrokeId,
    ) -> Option<Vec2> {
        let uses = self.angle_array(id);
        let sections = self.section_array(id);
        let n = uses.len();
        (0..n)
            .find(|&i| uses[i].stroke == curr && uses[(i + 1) % n].stroke == prev)
            .and_then(|i| sections.get(i).copied().flatten())
    }

    // ── Index introspection ─────────────────────────────────────────────

    /// Whether the point index holds `id` at its current position.
    pub fn point_indexed(&self, id: PointId) -> bool {
        self.point(id)
            .is_some_and(|p| self.point_tree.contains(id, Rect::point(p.position())))
    }

    /// Whether the stroke index holds `id` under its current bounding box.
    pub fn stroke_indexed(&self, id: StrokeId) -> bool {
        self.stroke(id)
            .is_some_and(|s| self.stroke_tree.contains(id, self.stroke_rect(s)))
    }

    pub fn indexed_point_count(&self) -> usize {
        self.point_tree.len()
    }

    pub fn indexed_stroke_count(&self) -> usize {
        self.stroke_tree.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn store() -> StrokeStore {
        StrokeStore::new(1, Rect::new(Vec2::splat(-500.0), Vec2::splat(500.0)))
    }

    fn add(store: &mut StrokeStore, a: PointId, b: PointId) -> StrokeId {
        let s = store.new_stroke(a, b, 0.5, false).unwrap();
        store.add_stroke(s).unwrap()
    }

    /// A plus-shaped junction at the origin with arms of length 50.
    fn cross(store: &mut StrokeStore) -> (PointId, [StrokeId; 4]) {
        let c = store.create_point(Vec2::ZERO);
        let e = store.create_point(Vec2::new(50.0, 0.0));
        let n = store.create_point(Vec2::new(0.0, 50.0));
        let w = store.create_point(Vec2::new(-50.0, 0.0));
        let s = store.create_point(Vec2::new(0.0, -50.0));
        let se = add(store, c, e);
        let sn = add(store, n, c);
        let sw = add(store, c, w);
        let ss = add(store, s, c);
        (c, [se, sn, sw, ss])
    }

    #[test]
    fn add_registers_endpoints() {
        let mut st = store();
        let a = st.create_point(Vec2::ZERO);
        let b = st.create_point(Vec2::new(10.0, 0.0));
        assert!(!st.point(a).unwrap().in_store());
        let id = add(&mut st, a, b);
        assert!(st.point(a).unwrap().in_store());
        assert!(st.point_indexed(a) && st.point_indexed(b));
        assert!(st.stroke_indexed(id));
        assert_eq!(st.stroke(id).unwrap().cluster(), Some(1));
        assert_eq!(st.point_count(), 2);
        assert_eq!(st.stroke_count(), 1);
    }

    #[test]
    fn adding_stored_stroke_fails() {
        let mut st = store();
        let a = st.create_point(Vec2::ZERO);
        let b = st.create_point(Vec2::new(10.0, 0.0));
        let id = add(&mut st, a, b);
        let copy = st.stroke(id).unwrap().clone();
        assert_eq!(
            st.add_stroke(copy),
            Err(StreetError::StrokeAlreadyStored { cluster: 1 })
        );
    }

    #[test]
    fn zero_length_stroke_fails() {
        let mut st = store();
        let a = st.create_point(Vec2::ZERO);
        let b = st.create_point(Vec2::ZERO);
        let s = st.new_stroke(a, b, 0.5, false).unwrap();
        assert!(matches!(st.add_stroke(s), Err(StreetError::ZeroLengthStroke { .. })));
    }

    #[test]
    fn remove_rejects_unstored_and_foreign() {
        let mut st = store();
        let a = st.create_point(Vec2::ZERO);
        let b = st.create_point(Vec2::new(10.0, 0.0));
        let loose = st.new_stroke(a, b, 0.5, false).unwrap();
        assert!(matches!(st.remove(&loose), Err(StreetError::StrokeNotStored(_))));

        let mut other = StrokeStore::new(2, st.bounds());
        let oa = other.create_point(Vec2::ZERO);
        let ob = other.create_point(Vec2::new(10.0, 0.0));
        let oid = add(&mut other, oa, ob);
        let foreign = other.stroke(oid).unwrap().clone();
        assert_eq!(
            st.remove(&foreign),
            Err(StreetError::ForeignStroke {
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn remove_then_add_restores_indexes() {
        let mut st = store();
        let (c, arms) = cross(&mut st);
        let connections = st.connection_count();
        let indexed = (st.indexed_point_count(), st.indexed_stroke_count());
        let e = st.stroke(arms[0]).unwrap().b();

        let stored = st.stroke(arms[0]).unwrap().clone();
        let removed = st.remove(&stored).unwrap();
        assert!(!st.are_connected(c, e));
        assert_eq!(removed.cluster(), None);
        assert!(st.point_indexed(e), "endpoints stay indexed");

        let again = st.new_stroke(removed.a(), removed.b(), removed.weight(), false).unwrap();
        st.add_stroke(again).unwrap();
        assert!(st.are_connected(c, e));
        assert_eq!(st.connection_count(), connections);
        assert_eq!((st.indexed_point_count(), st.indexed_stroke_count()), indexed);
    }

    #[test]
    fn adjacency_is_symmetric() {
        let mut st = store();
        let (c, arms) = cross(&mut st);
        for sid in arms {
            let s = st.stroke(sid).unwrap();
            assert!(st.are_connected(s.a(), s.b()));
            assert!(st.are_connected(s.b(), s.a()));
        }
        let e = st.stroke(arms[0]).unwrap().b();
        let w = st.stroke(arms[2]).unwrap().b();
        assert!(!st.are_connected(e, w));
        assert!(!st.are_connected(w, e));
        assert!(st.are_connected(c, w));
    }

    #[test]
    fn angle_array_sorted_and_complete() {
        let mut st = store();
        let (c, arms) = cross(&mut st);
        let uses = st.angle_array(c);
        assert_eq!(uses.len(), 4);
        assert!(uses.windows(2).all(|w| w[0].angle <= w[1].angle));
        let order: Vec<StrokeId> = uses.iter().map(|u| u.stroke).collect();
        assert_eq!(order, vec![arms[0], arms[1], arms[2], arms[3]]);
        assert!((uses[1].angle - FRAC_PI_2).abs() < 1e-5);
        assert!(!uses[1].outgoing);
    }

    #[test]
    fn cross_sections_sit_in_each_quadrant() {
        let mut st = store();
        let (c, arms) = cross(&mut st);
        let hw = st.stroke(arms[0]).unwrap().width() * 0.5;
        let sections = st.section_array(c);
        assert_eq!(sections.len(), 4);
        let expected = [
            Vec2::new(hw, hw),
            Vec2::new(-hw, hw),
            Vec2::new(-hw, -hw),
            Vec2::new(hw, -hw),
        ];
        for (got, want) in sections.iter().zip(expected) {
            let got = got.expect("perpendicular curbs always meet");
            assert!(got.distance(want) < 1e-3, "{got:?} vs {want:?}");
        }
        let ne = st.section_point_by_stroke(c, arms[0], arms[1]).unwrap();
        assert!(ne.distance(Vec2::new(hw, hw)) < 1e-3);
        assert!(st.section_point_by_stroke(c, arms[1], arms[0]).is_none());
    }

    #[test]
    fn dead_end_section_lies_past_the_end() {
        let mut st = store();
        let a = st.create_point(Vec2::ZERO);
        let b = st.create_point(Vec2::new(30.0, 0.0));
        let id = add(&mut st, a, b);
        let hw = st.stroke(id).unwrap().width() * 0.5;
        let tip = st.section_array(b)[0].unwrap();
        assert!(tip.distance(Vec2::new(30.0 + hw, 0.0)) < 1e-4);
    }

    #[test]
    fn straight_through_section_is_offset_sideways() {
        let mut st = store();
        let a = st.create_point(Vec2::new(-40.0, 0.0));
        let m = st.create_point(Vec2::ZERO);
        let b = st.create_point(Vec2::new(40.0, 0.0));
        let s1 = add(&mut st, a, m);
        add(&mut st, m, b);
        let hw = st.stroke(s1).unwrap().width() * 0.5;
        let sections = st.section_array(m);
        assert_eq!(sections.len(), 2);
        let north = sections[0].unwrap();
        let south = sections[1].unwrap();
        assert!(north.distance(Vec2::new(0.0, hw)) < 1e-3);
        assert!(south.distance(Vec2::new(0.0, -hw)) < 1e-3);
    }

    #[test]
    fn closest_queries_skip_own_endpoints() {
        let mut st = store();
        let a = st.create_point(Vec2::ZERO);
        let b = st.create_point(Vec2::new(100.0, 0.0));
        let id = add(&mut st, a, b);
        let c = st.create_point(Vec2::new(50.0, 8.0));
        let d = st.create_point(Vec2::new(50.0, 60.0));
        add(&mut st, c, d);

        let hit = st.get_closest_stroke(c, 10.0).expect("c lies 8 from a..b");
        assert_eq!(hit.existing, id);
        assert!((hit.existing_scale - 0.5).abs() < 1e-4);
        assert!(st.get_closest_stroke(c, 5.0).is_none());

        let stroke = st.stroke(id).unwrap().clone();
        let near = st.get_closest_point(&stroke, 10.0).unwrap();
        assert!(matches!(near.target, IntersectionTarget::Point { id, .. } if id == c));
        assert!(st.get_closest_point(&stroke, 1.0).is_none());
    }

    #[test]
    fn closest_point_below_excludes_given_point() {
        let mut st = store();
        let a = st.create_point(Vec2::ZERO);
        let b = st.create_point(Vec2::new(100.0, 0.0));
        add(&mut st, a, b);
        assert_eq!(st.find_closest_below_but_not(Vec2::new(3.0, 0.0), 5.0, None), Some(a));
        assert_eq!(st.find_closest_below_but_not(Vec2::new(3.0, 0.0), 5.0, Some(a)), None);
        assert_eq!(st.find_closest_below_but_not(Vec2::new(5.0, 0.0), 5.0, None), None);
    }

    #[test]
    fn crossing_found_and_touches_ignored() {
        let mut st = store();
        let a = st.create_point(Vec2::new(-50.0, 0.0));
        let b = st.create_point(Vec2::new(50.0, 0.0));
        let existing = add(&mut st, a, b);

        let c = st.create_point(Vec2::new(0.0, -40.0));
        let d = st.create_point(Vec2::new(0.0, 40.0));
        let cand = st.new_stroke(c, d, 0.5, false).unwrap();
        let hit = st
            .intersects_may_touch_closest(&cand, Vec2::new(0.0, -40.0))
            .expect("vertical candidate crosses");
        assert_eq!(hit.existing, existing);
        assert!(hit.position.distance(Vec2::ZERO) < 1e-4);
        assert!(matches!(hit.target, IntersectionTarget::Stroke { scale, .. } if (scale - 0.5).abs() < 1e-4));

        let touching = st.new_stroke(b, d, 0.5, false).unwrap();
        assert!(st.intersects_may_touch_closest(&touching, Vec2::ZERO).is_none());
    }

    #[test]
    fn released_point_slot_is_reused() {
        let mut st = store();
        let a = st.create_point(Vec2::ZERO);
        let b = st.create_point(Vec2::new(40.0, 0.0));
        let spare = st.create_point(Vec2::new(0.0, 40.0));
        add(&mut st, a, b);

        assert!(!st.release_point(a), "stored points stay");
        assert!(st.release_point(spare));
        assert!(!st.release_point(spare));
        assert_eq!(st.free_point_count(), 1);

        let again = st.create_point(Vec2::new(-40.0, 0.0));
        assert_eq!(again, spare);
        assert_eq!(st.point(again).unwrap().position(), Vec2::new(-40.0, 0.0));
        assert_eq!(st.free_point_count(), 0);
        assert_eq!(st.arena().len(), 3);
    }

    #[test]
    fn polish_drops_only_listing() {
        let mut st = store();
        let a = st.create_point(Vec2::ZERO);
        let b = st.create_point(Vec2::new(40.0, 0.0));
        let id = add(&mut st, a, b);
        let s = st.stroke(id).unwrap().clone();
        st.remove(&s).unwrap();
        assert_eq!(st.polish_street_points(), 2);
        assert_eq!(st.point_count(), 0);
        assert!(st.point(a).unwrap().in_store());
        assert!(st.point_indexed(a));
    }

    #[test]
    fn moving_a_point_invalidates_neighbours() {
        let mut st = store();
        let (c, arms) = cross(&mut st);
        let e = st.stroke(arms[0]).unwrap().b();
        st.angle_array(e);
        st.angle_array(c);
        assert!(st.point(e).unwrap().has_cached_angles());

        st.move_point(c, Vec2::new(0.0, 10.0)).unwrap();
        assert!(!st.point(c).unwrap().has_cached_angles());
        assert!(!st.point(e).unwrap().has_cached_angles());
        assert!(st.point_indexed(c));
        assert!(arms.iter().all(|&s| st.stroke_indexed(s)));
        let g = *st.geometry(st.stroke(arms[0]).unwrap());
        assert!((g.length - (50.0f32 * 50.0 + 100.0).sqrt()).abs() < 1e-3);
    }

    #[test]
    fn traversal_flags_reset() {
        let mut st = store();
        let (c, arms) = cross(&mut st);
        st.mark_traversed(arms[0], c).unwrap();
        assert!(st.mark_traversed(arms[0], c).is_err());
        st.clear_traversed();
        assert!(st.mark_traversed(arms[0], c).is_ok());
    }
}
