//! Stochastic stroke growth.
//!
//! The generator keeps a LIFO worklist of candidate strokes. Each step pops
//! one candidate and either drops it, splits an existing stroke it crosses,
//! or commits it to the [`StrokeStore`] and schedules follow-on candidates
//! from its end point. A run ends when the worklist drains or the step cap
//! is hit.
//!
//! # Step pipeline
//!
//! | Check | Outcome on failure |
//! |-------|--------------------|
//! | Segment overlaps the bounds | `OutOfBounds` |
//! | Endpoints at least `min_point_to_cand_point_distance` apart | `TooShort` |
//! | No stored point near A; near B only, snap B and retry | `PointCollision` |
//! | Endpoints not already joined | `AlreadyConnected` |
//! | No unrelated point near the segment | `PassesNearPoint` |
//! | No unrelated stroke near a new endpoint | `EndsNearStroke` |
//! | Direction clear of incident strokes at both ends | `AngleConflict` |
//! | Crossing far from points and not too shallow | `CrossingTooTight` |

use glam::Vec2;
use log::{debug, trace};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::config::GeneratorConfig;
use crate::error::StreetError;
use crate::geometry::{angular_difference, direction, Rect};
use crate::point::PointId;
use crate::rng::rng_from_key;
use crate::store::StrokeStore;
use crate::stroke::{Stroke, StrokeId, StrokeIntersection};

/// Why a candidate was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    OutOfBounds,
    TooShort,
    PointCollision,
    AlreadyConnected,
    PassesNearPoint,
    EndsNearStroke,
    AngleConflict,
    CrossingTooTight,
}

/// Counters for one generator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub steps: u32,
    pub committed: u32,
    pub splits: u32,
    pub snaps: u32,
    pub rejected_out_of_bounds: u32,
    pub rejected_too_short: u32,
    pub rejected_point_collision: u32,
    pub rejected_already_connected: u32,
    pub rejected_passes_near_point: u32,
    pub rejected_ends_near_stroke: u32,
    pub rejected_angle_conflict: u32,
    pub rejected_crossing_too_tight: u32,
    /// The run stopped at the step cap with candidates left over.
    pub capped: bool,
}

impl GenerationStats {
    fn record(&mut self, rejection: Rejection) {
        let counter = match rejection {
            Rejection::OutOfBounds => &mut self.rejected_out_of_bounds,
            Rejection::TooShort => &mut self.rejected_too_short,
            Rejection::PointCollision => &mut self.rejected_point_collision,
            Rejection::AlreadyConnected => &mut self.rejected_already_connected,
            Rejection::PassesNearPoint => &mut self.rejected_passes_near_point,
            Rejection::EndsNearStroke => &mut self.rejected_ends_near_stroke,
            Rejection::AngleConflict => &mut self.rejected_angle_conflict,
            Rejection::CrossingTooTight => &mut self.rejected_crossing_too_tight,
        };
        *counter += 1;
    }

    /// Total dropped candidates.
    pub fn rejected(&self) -> u32 {
        self.rejected_out_of_bounds
            + self.rejected_too_short
            + self.rejected_point_collision
            + self.rejected_already_connected
            + self.rejected_passes_near_point
            + self.rejected_ends_near_stroke
            + self.rejected_angle_conflict
            + self.rejected_crossing_too_tight
    }
}

/// What a single [`Generator::step`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// The worklist was empty.
    Idle,
    Rejected(Rejection),
    /// An existing stroke was split; the candidate went back on the worklist in two parts.
    Split { existing: StrokeId, at: PointId },
    Committed { stroke: StrokeId, branches: usize },
}

enum Verdict {
    Reject(Rejection),
    Split(StrokeIntersection),
    Commit,
}

/// A stroke waiting on the worklist.
#[derive(Debug)]
struct Candidate {
    stroke: Stroke,
    /// Whether committing it schedules follow-ons. Truncated candidates end
    /// on a fresh junction and do not.
    branch: bool,
}

/// Grows the street graph of one cluster.
#[derive(Debug)]
pub struct Generator {
    config: GeneratorConfig,
    bounds: Rect,
    store: StrokeStore,
    worklist: Vec<Candidate>,
    rng: ChaCha8Rng,
    stats: GenerationStats,
}

impl Generator {
    /// Generator over an empty store for `cluster`.
    pub fn new(seed: &str, bounds: Rect, config: GeneratorConfig, cluster: u64) -> Self {
        Self::from_store(seed, StrokeStore::new(cluster, bounds), config)
    }

    /// Resume growth on an existing store, bounded by the store's bounds.
    pub fn from_store(seed: &str, store: StrokeStore, config: GeneratorConfig) -> Self {
        debug!(
            "generator for cluster {} seeded with {:?} ({} strokes present)",
            store.cluster_id(),
            seed,
            store.stroke_count()
        );
        Self {
            config,
            bounds: store.bounds(),
            store,
            worklist: Vec::new(),
            rng: rng_from_key(seed),
            stats: GenerationStats::default(),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn store(&self) -> &StrokeStore {
        &self.store
    }

    pub fn into_store(self) -> StrokeStore {
        self.store
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    /// Steps taken so far.
    pub fn generation(&self) -> u32 {
        self.stats.steps
    }

    /// Candidates waiting on the worklist.
    pub fn pending(&self) -> usize {
        self.worklist.len()
    }

    /// Queue a candidate between two fresh points.
    pub fn push_candidate(&mut self, from: Vec2, to: Vec2, weight: f32) -> Result<(), StreetError> {
        let a = self.store.create_point(from);
        let b = self.store.create_point(to);
        let primary = weight >= self.config.primary_weight_threshold;
        let stroke = self.store.new_stroke(a, b, weight, primary)?;
        self.worklist.push(Candidate {
            stroke,
            branch: true,
        });
        Ok(())
    }

    /// Queue a candidate leaving an existing point.
    pub fn push_candidate_from(
        &mut self,
        from: PointId,
        to: Vec2,
        weight: f32,
    ) -> Result<(), StreetError> {
        let b = self.store.create_point(to);
        let primary = weight >= self.config.primary_weight_threshold;
        let stroke = self.store.new_stroke(from, b, weight, primary)?;
        self.worklist.push(Candidate {
            stroke,
            branch: true,
        });
        Ok(())
    }

    /// Queue the starting stroke: from the bounds centre in a random direction.
    pub fn seed_center_stroke(&mut self) -> Result<(), StreetError> {
        let center = self.bounds.center();
        let angle = self.rng.gen_range(0.0..TAU);
        let weight = self.config.initial_weight;
        let length = self.stroke_length(weight);
        self.push_candidate(center, center + direction(angle) * length, weight)
    }

    /// Step until the worklist drains or the step cap is reached.
    pub fn run(&mut self) -> Result<GenerationStats, StreetError> {
        while self.stats.steps < self.config.max_generation_steps {
            if self.step()? == StepOutcome::Idle {
                break;
            }
        }
        self.stats.capped = !self.worklist.is_empty();
        if self.stats.capped {
            debug!(
                "cluster {}: step cap {} reached with {} candidates pending",
                self.store.cluster_id(),
                self.config.max_generation_steps,
                self.worklist.len()
            );
        } else {
            debug!(
                "cluster {}: worklist drained after {} steps",
                self.store.cluster_id(),
                self.stats.steps
            );
        }
        debug!("cluster {}: {:?}", self.store.cluster_id(), self.stats);
        Ok(self.stats)
    }

    /// Pop and resolve one candidate.
    pub fn step(&mut self) -> Result<StepOutcome, StreetError> {
        let Some(Candidate { mut stroke, branch }) = self.worklist.pop() else {
            return Ok(StepOutcome::Idle);
        };
        self.stats.steps += 1;

        match self.evaluate(&mut stroke)? {
            Verdict::Reject(reason) => {
                self.stats.record(reason);
                trace!(
                    "step {}: dropped {:?} -> {:?}: {:?}",
                    self.stats.steps,
                    stroke.a(),
                    stroke.b(),
                    reason
                );
                // Fresh endpoints belong to this candidate alone.
                self.store.release_point(stroke.a());
                self.store.release_point(stroke.b());
                Ok(StepOutcome::Rejected(reason))
            }
            Verdict::Split(hit) => {
                let existing = hit.existing;
                let at = self.split(stroke, branch, hit)?;
                self.stats.splits += 1;
                Ok(StepOutcome::Split { existing, at })
            }
            Verdict::Commit => {
                let angle = self.store.geometry(&stroke).angle;
                let (end, weight) = (stroke.b(), stroke.weight());
                let id = self.store.add_stroke(stroke)?;
                self.stats.committed += 1;
                let branches = if branch {
                    self.schedule_branches(end, angle, weight)?
                } else {
                    0
                };
                Ok(StepOutcome::Committed {
                    stroke: id,
                    branches,
                })
            }
        }
    }

    fn evaluate(&mut self, cand: &mut Stroke) -> Result<Verdict, StreetError> {
        let (pa, pb) = self.store.endpoints(cand);
        if !self.bounds.overlaps_segment(pa, pb) {
            return Ok(Verdict::Reject(Rejection::OutOfBounds));
        }

        let min_pp = self.config.min_point_to_cand_point_distance;
        let mut snapped = false;
        loop {
            let (pa, pb) = self.store.endpoints(cand);
            if pa.distance(pb) < min_pp {
                return Ok(Verdict::Reject(Rejection::TooShort));
            }
            if self
                .store
                .find_closest_below_but_not(pa, min_pp, Some(cand.a()))
                .is_some()
            {
                return Ok(Verdict::Reject(Rejection::PointCollision));
            }
            match self.store.find_closest_below_but_not(pb, min_pp, Some(cand.b())) {
                None => break,
                Some(hit) if !snapped => {
                    let replaced = cand.b();
                    cand.set_b(hit)?;
                    self.store.release_point(replaced);
                    snapped = true;
                    self.stats.snaps += 1;
                }
                Some(_) => return Ok(Verdict::Reject(Rejection::PointCollision)),
            }
        }

        let (a, b) = (cand.a(), cand.b());
        let stored = |p: PointId| self.store.point(p).is_some_and(|sp| sp.in_store());
        let (a_stored, b_stored) = (stored(a), stored(b));
        if a_stored && b_stored && self.store.are_connected(a, b) {
            return Ok(Verdict::Reject(Rejection::AlreadyConnected));
        }

        let min_ps = self.config.min_point_to_cand_stroke_distance;
        if self.store.get_closest_point(cand, min_ps).is_some() {
            return Ok(Verdict::Reject(Rejection::PassesNearPoint));
        }
        for (p, is_stored) in [(a, a_stored), (b, b_stored)] {
            if !is_stored
                && self
                    .store
                    .closest_stroke_excluding(p, min_ps, &[a, b])
                    .is_some()
            {
                return Ok(Verdict::Reject(Rejection::EndsNearStroke));
            }
        }

        let angle = self.store.geometry(cand).angle;
        if self.angle_conflict(a, angle) || (b_stored && self.angle_conflict(b, angle + PI)) {
            return Ok(Verdict::Reject(Rejection::AngleConflict));
        }

        let (pa, _) = self.store.endpoints(cand);
        if let Some(hit) = self.store.intersects_may_touch_closest(cand, pa) {
            if self
                .store
                .find_closest_below_but_not(hit.position, min_pp, None)
                .is_some()
            {
                return Ok(Verdict::Reject(Rejection::CrossingTooTight));
            }
            let existing_angle = self
                .store
                .stroke(hit.existing)
                .map_or(angle, |s| self.store.geometry(s).angle);
            let d = angular_difference(angle, existing_angle);
            if d.min(PI - d) < self.config.angle_min_strokes.to_radians() {
                return Ok(Verdict::Reject(Rejection::CrossingTooTight));
            }
            return Ok(Verdict::Split(hit));
        }

        Ok(Verdict::Commit)
    }

    /// Whether a stroke leaving `point` at `angle` comes too close to an incident one.
    fn angle_conflict(&self, point: PointId, angle: f32) -> bool {
        let min = self.config.angle_min_strokes.to_radians();
        self.store
            .angle_array(point)
            .iter()
            .any(|u| angular_difference(u.angle, angle) < min)
    }

    /// Split the crossed stroke at the crossing and queue the candidate in two parts.
    fn split(
        &mut self,
        mut cand: Stroke,
        branch: bool,
        hit: StrokeIntersection,
    ) -> Result<PointId, StreetError> {
        let existing = self
            .store
            .stroke(hit.existing)
            .cloned()
            .ok_or(StreetError::StrokeNotStored(hit.existing))?;
        let removed = self.store.remove(&existing)?;
        let at = self.store.create_point(hit.position);

        let (weight, primary) = (removed.weight(), removed.is_primary());
        let first = self.store.new_stroke(removed.a(), at, weight, primary)?;
        self.store.add_stroke(first)?;
        let second = self.store.new_stroke(at, removed.b(), weight, primary)?;
        self.store.add_stroke(second)?;

        let continuation =
            self.store
                .new_stroke(at, cand.b(), cand.weight(), cand.is_primary())?;
        cand.set_b(at)?;
        trace!(
            "step {}: split {:?} at {:?}",
            self.stats.steps,
            hit.existing,
            hit.position
        );

        // The truncated candidate is popped first.
        self.worklist.push(Candidate {
            stroke: continuation,
            branch,
        });
        self.worklist.push(Candidate {
            stroke: cand,
            branch: false,
        });
        Ok(at)
    }

    /// Queue follow-ons from `end` and return how many were queued.
    fn schedule_branches(
        &mut self,
        end: PointId,
        base: f32,
        weight: f32,
    ) -> Result<usize, StreetError> {
        let c = &self.config;
        let damping = 1.0 - c.branch_weight_damping * weight.clamp(0.0, 1.0);
        let flips = [
            (c.p_forward, 0.0, c.forward_angle_jitter),
            (c.p_right, -FRAC_PI_2, c.turn_angle_jitter),
            (c.p_left, FRAC_PI_2, c.turn_angle_jitter),
        ];
        let p_random = c.p_random;

        let mut angles = Vec::with_capacity(4);
        for (p, offset, jitter) in flips {
            if self.rng.gen::<f32>() < p * damping {
                let jitter = jitter.abs();
                let jitter = self.rng.gen_range(-jitter..=jitter).to_radians();
                angles.push(base + offset + jitter);
            }
        }
        if self.rng.gen::<f32>() < p_random * damping || angles.is_empty() {
            angles.push(self.rng.gen_range(0.0..TAU));
        }

        let origin = self
            .store
            .point(end)
            .ok_or(StreetError::UnknownPoint(end))?
            .position();
        // Reverse so forward comes off the worklist first.
        let queued = angles.len();
        for angle in angles.into_iter().rev() {
            let weight = self.nudge_weight(weight);
            let length = self.stroke_length(weight);
            let to = self.store.create_point(origin + direction(angle) * length);
            let primary = weight >= self.config.primary_weight_threshold;
            let stroke = self.store.new_stroke(end, to, weight, primary)?;
            self.worklist.push(Candidate {
                stroke,
                branch: true,
            });
        }
        Ok(queued)
    }

    fn nudge_weight(&mut self, weight: f32) -> f32 {
        let c = &self.config;
        let (increase, decrease) = (c.weight_increase_factor, c.weight_decrease_factor);
        let (min, max) = (c.weight_min, c.weight_max);
        let mut weight = weight;
        if self.rng.gen::<f32>() < self.config.weight_change_probability {
            weight *= if self.rng.gen_bool(0.5) {
                increase
            } else {
                decrease
            };
        }
        weight.clamp(min, max)
    }

    fn stroke_length(&mut self, weight: f32) -> f32 {
        let c = &self.config;
        let base = c.length_base + c.length_weight_factor * weight * weight;
        let jitter = c.length_jitter.abs();
        base * (1.0 + self.rng.gen_range(-jitter..=jitter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Rect {
        Rect::new(Vec2::splat(-500.0), Vec2::splat(500.0))
    }

    fn endpoints(store: &StrokeStore) -> Vec<(Vec2, Vec2, f32)> {
        store
            .strokes()
            .map(|s| {
                let (a, b) = store.endpoints(s);
                (a, b, s.weight())
            })
            .collect()
    }

    fn grown(seed: &str) -> StrokeStore {
        let mut g = Generator::new(seed, bounds(), GeneratorConfig::default(), 1);
        g.seed_center_stroke().unwrap();
        g.run().unwrap();
        g.into_store()
    }

    #[test]
    fn same_seed_same_graph() {
        let a = grown("riverside");
        let b = grown("riverside");
        assert!(a.stroke_count() > 0);
        assert_eq!(endpoints(&a), endpoints(&b));
    }

    #[test]
    fn different_seed_different_graph() {
        assert_ne!(endpoints(&grown("riverside")), endpoints(&grown("hillside")));
    }

    #[test]
    fn step_cap_stops_run() {
        let config = GeneratorConfig {
            max_generation_steps: 5,
            ..GeneratorConfig::default()
        };
        let mut g = Generator::new("cap", bounds(), config, 1);
        g.seed_center_stroke().unwrap();
        let stats = g.run().unwrap();
        assert!(stats.steps <= 5);
        assert_eq!(g.generation(), stats.steps);
        assert_eq!(stats.capped, g.pending() > 0);
    }

    #[test]
    fn empty_worklist_is_idle() {
        let mut g = Generator::new("idle", bounds(), GeneratorConfig::default(), 1);
        assert_eq!(g.step().unwrap(), StepOutcome::Idle);
        assert_eq!(g.run().unwrap().steps, 0);
    }

    #[test]
    fn short_candidate_rejected() {
        let mut g = Generator::new("short", bounds(), GeneratorConfig::default(), 1);
        g.push_candidate(Vec2::ZERO, Vec2::new(10.0, 0.0), 0.5).unwrap();
        assert_eq!(g.step().unwrap(), StepOutcome::Rejected(Rejection::TooShort));
        assert_eq!(g.stats().rejected_too_short, 1);
        assert_eq!(g.store().stroke_count(), 0);
    }

    #[test]
    fn outside_candidate_rejected() {
        let mut g = Generator::new("far", bounds(), GeneratorConfig::default(), 1);
        g.push_candidate(Vec2::splat(900.0), Vec2::splat(990.0), 0.5).unwrap();
        assert_eq!(g.step().unwrap(), StepOutcome::Rejected(Rejection::OutOfBounds));
    }

    #[test]
    fn crossing_splits_existing_stroke() {
        let mut store = StrokeStore::new(1, bounds());
        let w = store.create_point(Vec2::new(-50.0, 0.0));
        let e = store.create_point(Vec2::new(50.0, 0.0));
        let s = store.new_stroke(w, e, 0.5, false).unwrap();
        let existing = store.add_stroke(s).unwrap();

        let mut g = Generator::from_store("split", store, GeneratorConfig::default());
        g.push_candidate(Vec2::new(0.0, -40.0), Vec2::new(0.0, 40.0), 0.5).unwrap();

        let StepOutcome::Split { existing: hit, at } = g.step().unwrap() else {
            panic!("expected a split");
        };
        assert_eq!(hit, existing);
        assert!(g.store().stroke(existing).is_none());
        assert_eq!(g.store().stroke_count(), 2);
        assert!(g.store().point(at).unwrap().position().distance(Vec2::ZERO) < 1e-4);
        assert_eq!(g.pending(), 2);

        assert!(matches!(
            g.step().unwrap(),
            StepOutcome::Committed { branches: 0, .. }
        ));
        assert!(matches!(g.step().unwrap(), StepOutcome::Committed { .. }));
        assert_eq!(g.store().point(at).unwrap().degree(), 4);
        assert_eq!(g.stats().splits, 1);
    }

    #[test]
    fn near_end_snaps_to_existing_point() {
        let mut store = StrokeStore::new(1, bounds());
        let a = store.create_point(Vec2::ZERO);
        let b = store.create_point(Vec2::new(100.0, 0.0));
        let s = store.new_stroke(a, b, 0.5, false).unwrap();
        store.add_stroke(s).unwrap();

        let mut g = Generator::from_store("snap", store, GeneratorConfig::default());
        g.push_candidate(Vec2::new(200.0, 0.0), Vec2::new(105.0, 5.0), 0.5).unwrap();
        assert!(matches!(g.step().unwrap(), StepOutcome::Committed { .. }));
        assert_eq!(g.stats().snaps, 1);
        assert_eq!(g.store().point_count(), 3);
        assert_eq!(g.store().point(b).unwrap().degree(), 2);
    }

    #[test]
    fn narrow_angle_rejected() {
        let mut store = StrokeStore::new(1, bounds());
        let a = store.create_point(Vec2::ZERO);
        let b = store.create_point(Vec2::new(100.0, 0.0));
        let s = store.new_stroke(a, b, 0.5, false).unwrap();
        store.add_stroke(s).unwrap();

        let mut g = Generator::from_store("narrow", store, GeneratorConfig::default());
        // Leaves b at roughly 20 degrees off the stroke arriving from a.
        g.push_candidate_from(b, Vec2::new(6.0, 34.2), 0.5).unwrap();
        assert_eq!(
            g.step().unwrap(),
            StepOutcome::Rejected(Rejection::AngleConflict)
        );
        assert_eq!(g.stats().rejected_angle_conflict, 1);
    }

    #[test]
    fn rejected_candidate_frees_its_points() {
        let mut g = Generator::new("reuse", bounds(), GeneratorConfig::default(), 1);
        g.push_candidate(Vec2::ZERO, Vec2::new(10.0, 0.0), 0.5).unwrap();
        assert!(matches!(g.step().unwrap(), StepOutcome::Rejected(_)));
        assert_eq!(g.store().free_point_count(), 2);

        for _ in 0..10 {
            g.push_candidate(Vec2::ZERO, Vec2::new(10.0, 0.0), 0.5).unwrap();
            g.step().unwrap();
        }
        assert_eq!(g.store().arena().len(), 2);
    }

    #[test]
    fn snap_frees_the_replaced_end() {
        let mut store = StrokeStore::new(1, bounds());
        let a = store.create_point(Vec2::ZERO);
        let b = store.create_point(Vec2::new(100.0, 0.0));
        let s = store.new_stroke(a, b, 0.5, false).unwrap();
        store.add_stroke(s).unwrap();

        let mut g = Generator::from_store("snap-free", store, GeneratorConfig::default());
        g.push_candidate(Vec2::new(100.0, 80.0), Vec2::new(104.0, 4.0), 0.5).unwrap();
        assert_eq!(g.store().arena().len(), 4);
        let StepOutcome::Committed { branches, .. } = g.step().unwrap() else {
            panic!("expected a commit");
        };
        assert_eq!(g.stats().snaps, 1);
        // The first follow-on end takes the slot the snap gave back.
        assert!(branches >= 1);
        assert_eq!(g.store().arena().len(), 4 + branches - 1);
        assert_eq!(g.store().free_point_count(), 0);
    }

    #[test]
    fn stored_pair_already_connected() {
        let mut store = StrokeStore::new(1, bounds());
        let a = store.create_point(Vec2::ZERO);
        let b = store.create_point(Vec2::new(100.0, 0.0));
        let s = store.new_stroke(a, b, 0.5, false).unwrap();
        store.add_stroke(s).unwrap();

        let mut g = Generator::from_store("dup", store, GeneratorConfig::default());
        // The far end snaps onto b, which a already reaches.
        g.push_candidate_from(a, Vec2::new(105.0, 5.0), 0.5).unwrap();
        assert_eq!(
            g.step().unwrap(),
            StepOutcome::Rejected(Rejection::AlreadyConnected)
        );
        assert_eq!(g.stats().rejected_already_connected, 1);
        assert_eq!(g.store().stroke_count(), 1);
    }

    #[test]
    fn passing_close_to_a_point_rejected() {
        let mut store = StrokeStore::new(1, bounds());
        let p = store.create_point(Vec2::new(0.0, 10.0));
        let q = store.create_point(Vec2::new(0.0, 110.0));
        let s = store.new_stroke(p, q, 0.5, false).unwrap();
        store.add_stroke(s).unwrap();

        let mut g = Generator::from_store("near-point", store, GeneratorConfig::default());
        g.push_candidate(Vec2::new(-100.0, 0.0), Vec2::new(100.0, 0.0), 0.5).unwrap();
        assert_eq!(
            g.step().unwrap(),
            StepOutcome::Rejected(Rejection::PassesNearPoint)
        );
        assert_eq!(g.stats().rejected_passes_near_point, 1);
    }

    #[test]
    fn ending_close_to_a_stroke_rejected() {
        let mut store = StrokeStore::new(1, bounds());
        let w = store.create_point(Vec2::new(-100.0, 0.0));
        let e = store.create_point(Vec2::new(100.0, 0.0));
        let s = store.new_stroke(w, e, 0.5, false).unwrap();
        store.add_stroke(s).unwrap();

        let mut g = Generator::from_store("near-stroke", store, GeneratorConfig::default());
        g.push_candidate(Vec2::new(0.0, 100.0), Vec2::new(0.0, 10.0), 0.5).unwrap();
        assert_eq!(
            g.step().unwrap(),
            StepOutcome::Rejected(Rejection::EndsNearStroke)
        );
        assert_eq!(g.stats().rejected_ends_near_stroke, 1);
    }

    #[test]
    fn crossing_next_to_a_junction_rejected() {
        let mut store = StrokeStore::new(1, bounds());
        let w = store.create_point(Vec2::new(-100.0, 0.0));
        let e = store.create_point(Vec2::new(100.0, 0.0));
        let s = store.new_stroke(w, e, 0.5, false).unwrap();
        store.add_stroke(s).unwrap();

        let mut g = Generator::from_store("tight", store, GeneratorConfig::default());
        // Crosses 25 units from e: clear of the segment check, too close for a new junction.
        g.push_candidate(Vec2::new(75.0, -50.0), Vec2::new(75.0, 50.0), 0.5).unwrap();
        assert_eq!(
            g.step().unwrap(),
            StepOutcome::Rejected(Rejection::CrossingTooTight)
        );
        assert_eq!(g.stats().rejected_crossing_too_tight, 1);
        assert_eq!(g.stats().splits, 0);
    }

    #[test]
    fn negative_angle_jitter_does_not_panic() {
        let config = GeneratorConfig {
            forward_angle_jitter: -5.0,
            turn_angle_jitter: -3.0,
            max_generation_steps: 200,
            ..GeneratorConfig::default()
        };
        let mut g = Generator::new("jitter", bounds(), config, 1);
        g.seed_center_stroke().unwrap();
        let stats = g.run().unwrap();
        assert!(stats.committed > 0);
    }
}
