//! Street points: the junctions of the street graph.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::stroke::StrokeId;

/// Handle of a street point inside its [`StrokeStore`](crate::store::StrokeStore) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PointId(pub u32);

impl PointId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One incident stroke as seen from a street point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeUse {
    pub stroke: StrokeId,
    /// Direction from this point towards the stroke's other end.
    pub angle: f32,
    /// True when this point is the stroke's A endpoint.
    pub outgoing: bool,
}

/// A junction of the street graph.
///
/// The angle-sorted incidence array and the curb section array are memoised
/// and dropped whenever the position or the incident-stroke set changes. They
/// are read through the owning store, which has the stroke geometry needed
/// to fill them.
#[derive(Debug)]
pub struct StreetPoint {
    id: PointId,
    position: Vec2,
    in_store: bool,
    outgoing: Vec<StrokeId>,
    incoming: Vec<StrokeId>,
    pub(crate) angle_cache: OnceLock<Vec<StrokeUse>>,
    pub(crate) section_cache: OnceLock<Vec<Option<Vec2>>>,
}

impl StreetPoint {
    pub(crate) fn new(id: PointId, position: Vec2) -> Self {
        Self {
            id,
            position,
            in_store: false,
            outgoing: Vec::new(),
            incoming: Vec::new(),
            angle_cache: OnceLock::new(),
            section_cache: OnceLock::new(),
        }
    }

    pub fn id(&self) -> PointId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Whether the point is registered in its store's spatial index.
    pub fn in_store(&self) -> bool {
        self.in_store
    }

    /// Strokes whose A endpoint is this point.
    pub fn outgoing(&self) -> &[StrokeId] {
        &self.outgoing
    }

    /// Strokes whose B endpoint is this point.
    pub fn incoming(&self) -> &[StrokeId] {
        &self.incoming
    }

    /// Number of incident strokes.
    pub fn degree(&self) -> usize {
        self.outgoing.len() + self.incoming.len()
    }

    /// Whether `stroke` touches this point.
    pub fn is_incident(&self, stroke: StrokeId) -> bool {
        self.outgoing.contains(&stroke) || self.incoming.contains(&stroke)
    }

    pub(crate) fn set_in_store(&mut self, in_store: bool) {
        self.in_store = in_store;
    }

    pub(crate) fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.invalidate();
    }

    pub(crate) fn link_outgoing(&mut self, stroke: StrokeId) {
        self.outgoing.push(stroke);
        self.invalidate();
    }

    pub(crate) fn link_incoming(&mut self, stroke: StrokeId) {
        self.incoming.push(stroke);
        self.invalidate();
    }

    pub(crate) fn unlink(&mut self, stroke: StrokeId) {
        self.outgoing.retain(|&s| s != stroke);
        self.incoming.retain(|&s| s != stroke);
        self.invalidate();
    }

    /// Drop both junction caches.
    pub(crate) fn invalidate(&mut self) {
        self.angle_cache.take();
        self.section_cache.take();
    }

    /// Whether the angle array is currently memoised.
    pub fn has_cached_angles(&self) -> bool {
        self.angle_cache.get().is_some()
    }
}
