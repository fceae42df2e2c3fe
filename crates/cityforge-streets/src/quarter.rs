//! Quarters: the city blocks enclosed by the street graph.
//!
//! [`QuarterGenerator`] walks every face of the planar stroke graph. Each
//! directed stroke use is walked exactly once: arriving at a point, the walk
//! leaves by the next incident stroke clockwise, which keeps the face on its
//! left. Inner faces therefore come out counter-clockwise and the unbounded
//! outer face clockwise. Boundary vertices are the curb corners from each
//! point's section array, so a quarter's polygon already excludes the street
//! surface.

use glam::Vec2;
use log::{debug, warn};

use crate::config::EstateConfig;
use crate::error::StreetError;
use crate::estate::Estate;
use crate::geometry::{centroid, is_simple_polygon, signed_area, MIN_POLYGON_AREA};
use crate::location::LocationProfile;
use crate::point::PointId;
use crate::store::StrokeStore;
use crate::stroke::StrokeId;

/// One side of a quarter: a stroke walked from `from`, ending at `vertex`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuarterDelim {
    pub stroke: StrokeId,
    pub from: PointId,
    /// Curb corner at the far end; `None` when the curbs there never meet.
    pub vertex: Option<Vec2>,
}

/// Why a traced face is not a usable quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuarterFlaw {
    TooFewVertices,
    /// Clockwise or empty centreline ring: the unbounded face around a component.
    OuterBoundary,
    MissingSection,
    /// An inner face whose curb ring turned inside out under wide streets.
    Inverted,
    SelfIntersecting,
}

/// A closed face of the street graph.
#[derive(Debug, Clone)]
pub struct Quarter {
    delims: Vec<QuarterDelim>,
    flaw: Option<QuarterFlaw>,
    dead_end: bool,
    estates: Vec<Estate>,
}

impl Quarter {
    fn new(delims: Vec<QuarterDelim>, dead_end: bool, centerline_area: f32) -> Self {
        let flaw = Self::find_flaw(&delims, centerline_area);
        Self {
            delims,
            flaw,
            dead_end,
            estates: Vec::new(),
        }
    }

    fn find_flaw(delims: &[QuarterDelim], centerline_area: f32) -> Option<QuarterFlaw> {
        if delims.len() < 3 {
            return Some(QuarterFlaw::TooFewVertices);
        }
        if centerline_area <= MIN_POLYGON_AREA {
            return Some(QuarterFlaw::OuterBoundary);
        }
        let Some(ring) = delims.iter().map(|d| d.vertex).collect::<Option<Vec<_>>>() else {
            return Some(QuarterFlaw::MissingSection);
        };
        if signed_area(&ring) <= MIN_POLYGON_AREA {
            return Some(QuarterFlaw::Inverted);
        }
        if !is_simple_polygon(&ring) {
            return Some(QuarterFlaw::SelfIntersecting);
        }
        None
    }

    pub fn delims(&self) -> &[QuarterDelim] {
        &self.delims
    }

    pub fn is_valid(&self) -> bool {
        self.flaw.is_none()
    }

    pub fn flaw(&self) -> Option<QuarterFlaw> {
        self.flaw
    }

    /// Whether the face runs out along a stroke with a free end.
    pub fn is_dead_end(&self) -> bool {
        self.dead_end
    }

    /// Boundary vertices that exist, counter-clockwise for valid quarters.
    pub fn polygon(&self) -> Vec<Vec2> {
        self.delims.iter().filter_map(|d| d.vertex).collect()
    }

    pub fn area(&self) -> f32 {
        signed_area(&self.polygon())
    }

    pub fn center(&self) -> Vec2 {
        centroid(&self.polygon())
    }

    pub fn estates(&self) -> &[Estate] {
        &self.estates
    }

    /// Derive this quarter's estate. Invalid quarters get none.
    pub fn build_estates(&mut self, config: &EstateConfig, profile: &LocationProfile) {
        self.estates.clear();
        if self.is_valid() {
            self.estates
                .push(Estate::derive(&self.polygon(), config, profile));
        }
    }
}

/// Every face traced from one stroke store.
#[derive(Debug, Clone, Default)]
pub struct QuarterStore {
    quarters: Vec<Quarter>,
}

impl QuarterStore {
    /// All traced faces, flawed ones included.
    pub fn quarters(&self) -> &[Quarter] {
        &self.quarters
    }

    pub fn valid_quarters(&self) -> impl Iterator<Item = &Quarter> {
        self.quarters.iter().filter(|q| q.is_valid())
    }

    pub fn len(&self) -> usize {
        self.quarters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quarters.is_empty()
    }

    pub fn build_estates(&mut self, config: &EstateConfig, profile: &LocationProfile) {
        for quarter in &mut self.quarters {
            quarter.build_estates(config, profile);
        }
    }

    /// Buildings across every estate of every quarter.
    pub fn building_count(&self) -> usize {
        self.quarters
            .iter()
            .flat_map(|q| q.estates())
            .map(|e| e.buildings().len())
            .sum()
    }
}

/// Traces the faces of a finished street graph.
pub struct QuarterGenerator<'a> {
    store: &'a mut StrokeStore,
}

impl<'a> QuarterGenerator<'a> {
    pub fn new(store: &'a mut StrokeStore) -> Self {
        Self { store }
    }

    /// Trace every face, starting from every untraversed directed stroke use.
    pub fn generate(&mut self) -> Result<QuarterStore, StreetError> {
        self.store.clear_traversed();
        let mut quarters = Vec::new();
        let starts = self.store.street_point_ids().to_vec();
        for start in starts {
            let uses = self.store.angle_array(start).to_vec();
            for u in uses {
                let walked = self
                    .store
                    .stroke(u.stroke)
                    .ok_or(StreetError::StrokeNotStored(u.stroke))?
                    .is_traversed_from(start);
                if !walked {
                    quarters.push(self.trace(start, u.stroke)?);
                }
            }
        }

        let valid = quarters.iter().filter(|q| q.is_valid()).count();
        debug!(
            "cluster {}: traced {} faces, {} valid quarters",
            self.store.cluster_id(),
            quarters.len(),
            valid
        );
        Ok(QuarterStore { quarters })
    }

    fn trace(&mut self, start: PointId, first: StrokeId) -> Result<Quarter, StreetError> {
        let limit = 2 * self.store.stroke_count() + 1;
        let mut delims = Vec::new();
        let mut dead_end = false;
        let (mut from, mut edge) = (start, first);

        loop {
            if delims.len() >= limit {
                return Err(StreetError::FaceDidNotClose {
                    start,
                    steps: delims.len(),
                });
            }
            self.store.mark_traversed(edge, from)?;
            let to = self
                .store
                .stroke(edge)
                .and_then(|s| s.other(from))
                .ok_or(StreetError::StrokeNotIncident {
                    stroke: edge,
                    point: from,
                })?;

            let uses = self.store.angle_array(to);
            let sections = self.store.section_array(to);
            if uses.len() != sections.len() {
                return Err(StreetError::SectionArrayMismatch {
                    point: to,
                    angles: uses.len(),
                    sections: sections.len(),
                });
            }
            let n = uses.len();
            let k = uses
                .iter()
                .position(|u| u.stroke == edge)
                .ok_or(StreetError::StrokeNotIncident { stroke: edge, point: to })?;
            let next = uses[(k + n - 1) % n].stroke;
            dead_end |= n == 1;

            delims.push(QuarterDelim {
                stroke: edge,
                from,
                vertex: self.store.section_point_by_stroke(to, next, edge),
            });

            from = to;
            edge = next;
            if from == start && edge == first {
                break;
            }
        }

        let centerline: Vec<Vec2> = delims
            .iter()
            .filter_map(|d| self.store.point(d.from).map(|p| p.position()))
            .collect();
        let quarter = Quarter::new(delims, dead_end, signed_area(&centerline));
        match quarter.flaw() {
            Some(flaw @ (QuarterFlaw::MissingSection | QuarterFlaw::SelfIntersecting)) => {
                warn!(
                    "cluster {}: face from {:?} dropped: {:?}",
                    self.store.cluster_id(),
                    start,
                    flaw
                );
            }
            Some(flaw) => debug!("face from {:?} skipped: {:?}", start, flaw),
            None => {}
        }
        Ok(quarter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn store() -> StrokeStore {
        StrokeStore::new(3, Rect::new(Vec2::splat(-500.0), Vec2::splat(500.0)))
    }

    fn link(store: &mut StrokeStore, a: PointId, b: PointId) {
        let s = store.new_stroke(a, b, 0.5, false).unwrap();
        store.add_stroke(s).unwrap();
    }

    fn square(store: &mut StrokeStore) -> [PointId; 4] {
        let p = [
            store.create_point(Vec2::new(0.0, 0.0)),
            store.create_point(Vec2::new(100.0, 0.0)),
            store.create_point(Vec2::new(100.0, 100.0)),
            store.create_point(Vec2::new(0.0, 100.0)),
        ];
        for i in 0..4 {
            link(store, p[i], p[(i + 1) % 4]);
        }
        p
    }

    fn total_delims(quarters: &QuarterStore) -> usize {
        quarters.quarters().iter().map(|q| q.delims().len()).sum()
    }

    #[test]
    fn four_cycle_yields_one_quarter() {
        let mut st = store();
        square(&mut st);
        let quarters = QuarterGenerator::new(&mut st).generate().unwrap();
        assert_eq!(quarters.len(), 2);
        let valid: Vec<&Quarter> = quarters.valid_quarters().collect();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].delims().len(), 4);
        assert!(!valid[0].is_dead_end());

        let hw = st.strokes().next().unwrap().width() * 0.5;
        let side = 100.0 - 2.0 * hw;
        assert!((valid[0].area() - side * side).abs() < 0.5);
        assert_eq!(
            quarters.quarters().iter().filter(|q| q.flaw() == Some(QuarterFlaw::OuterBoundary)).count(),
            1
        );
        assert_eq!(total_delims(&quarters), 2 * st.stroke_count());
    }

    #[test]
    fn every_use_walked_once_and_rerun_works() {
        let mut st = store();
        let p = square(&mut st);
        let mid = st.create_point(Vec2::new(50.0, 50.0));
        link(&mut st, p[0], mid);
        link(&mut st, mid, p[2]);

        let first = QuarterGenerator::new(&mut st).generate().unwrap();
        assert_eq!(total_delims(&first), 2 * st.stroke_count());
        assert_eq!(first.valid_quarters().count(), 2);

        let second = QuarterGenerator::new(&mut st).generate().unwrap();
        assert_eq!(second.len(), first.len());
    }

    #[test]
    fn spur_marks_dead_end() {
        let mut st = store();
        let p = square(&mut st);
        let tip = st.create_point(Vec2::new(30.0, 30.0));
        link(&mut st, p[0], tip);

        let quarters = QuarterGenerator::new(&mut st).generate().unwrap();
        assert_eq!(total_delims(&quarters), 10);
        let valid: Vec<&Quarter> = quarters.valid_quarters().collect();
        assert_eq!(valid.len(), 1);
        assert!(valid[0].is_dead_end());
        assert_eq!(valid[0].delims().len(), 6);
    }

    #[test]
    fn lone_stroke_has_no_quarter() {
        let mut st = store();
        let a = st.create_point(Vec2::ZERO);
        let b = st.create_point(Vec2::new(60.0, 0.0));
        link(&mut st, a, b);
        let quarters = QuarterGenerator::new(&mut st).generate().unwrap();
        assert_eq!(quarters.len(), 1);
        assert_eq!(quarters.quarters()[0].flaw(), Some(QuarterFlaw::TooFewVertices));
        assert!(quarters.quarters()[0].is_dead_end());
    }

    #[test]
    fn narrow_block_under_wide_streets_is_inverted() {
        let mut st = store();
        // Heavy strokes are 12 wide, so an 8 deep block has no room between its curbs.
        let p = [
            st.create_point(Vec2::new(0.0, 0.0)),
            st.create_point(Vec2::new(100.0, 0.0)),
            st.create_point(Vec2::new(100.0, 8.0)),
            st.create_point(Vec2::new(0.0, 8.0)),
        ];
        for i in 0..4 {
            let s = st.new_stroke(p[i], p[(i + 1) % 4], 1.0, true).unwrap();
            st.add_stroke(s).unwrap();
        }

        let quarters = QuarterGenerator::new(&mut st).generate().unwrap();
        let flaws: Vec<_> = quarters.quarters().iter().map(|q| q.flaw()).collect();
        assert_eq!(flaws.len(), 2);
        assert!(flaws.contains(&Some(QuarterFlaw::Inverted)));
        assert!(flaws.contains(&Some(QuarterFlaw::OuterBoundary)));
        assert_eq!(quarters.valid_quarters().count(), 0);
    }

    #[test]
    fn estates_only_for_valid_quarters() {
        let mut st = store();
        square(&mut st);
        let mut quarters = QuarterGenerator::new(&mut st).generate().unwrap();
        quarters.build_estates(&EstateConfig::default(), &LocationProfile::default());
        for q in quarters.quarters() {
            assert_eq!(q.estates().len(), usize::from(q.is_valid()));
        }
    }
}
