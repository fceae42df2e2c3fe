//! Strokes: the street segments between two street points.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::StreetError;
use crate::geometry::angle_of;
use crate::point::PointId;

/// Curb-to-curb width of a weightless stroke.
pub const STROKE_WIDTH_BASE: f32 = 3.0;
/// Quadratic width gain per unit of weight².
pub const STROKE_WIDTH_QUADRATIC: f32 = 9.0;

/// Street width for a given weight.
pub fn stroke_width(weight: f32) -> f32 {
    STROKE_WIDTH_BASE + STROKE_WIDTH_QUADRATIC * weight * weight
}

/// Handle of a stroke, allocated by its [`StrokeStore`](crate::store::StrokeStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StrokeId(pub u32);

impl StrokeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Derived shape of a stroke, memoised until an endpoint moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeGeometry {
    pub length: f32,
    /// Unit vector from A to B.
    pub unit: Vec2,
    /// Left normal of `unit`.
    pub normal: Vec2,
    /// Angle of `unit` in `[0, TAU)`.
    pub angle: f32,
}

impl StrokeGeometry {
    pub(crate) fn between(a: Vec2, b: Vec2) -> Self {
        let delta = b - a;
        let length = delta.length();
        let unit = delta.normalize_or_zero();
        Self {
            length,
            unit,
            normal: unit.perp(),
            angle: angle_of(delta),
        }
    }
}

/// A street segment from point A to point B.
///
/// Direction matters for traversal bookkeeping only; the street itself is
/// undirected. Endpoints may be reassigned freely until the stroke is added
/// to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    id: StrokeId,
    cluster: Option<u64>,
    a: PointId,
    b: PointId,
    weight: f32,
    primary: bool,
    traversed_ab: bool,
    traversed_ba: bool,
    geometry: OnceLock<StrokeGeometry>,
}

impl Stroke {
    pub(crate) fn new(id: StrokeId, a: PointId, b: PointId, weight: f32, primary: bool) -> Self {
        Self {
            id,
            cluster: None,
            a,
            b,
            weight,
            primary,
            traversed_ab: false,
            traversed_ba: false,
            geometry: OnceLock::new(),
        }
    }

    pub fn id(&self) -> StrokeId {
        self.id
    }

    /// Cluster whose store owns this stroke, if any.
    pub fn cluster(&self) -> Option<u64> {
        self.cluster
    }

    pub fn a(&self) -> PointId {
        self.a
    }

    pub fn b(&self) -> PointId {
        self.b
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn width(&self) -> f32 {
        stroke_width(self.weight)
    }

    /// The endpoint opposite `p`, if `p` is an endpoint at all.
    pub fn other(&self, p: PointId) -> Option<PointId> {
        if p == self.a {
            Some(self.b)
        } else if p == self.b {
            Some(self.a)
        } else {
            None
        }
    }

    pub fn touches(&self, p: PointId) -> bool {
        self.a == p || self.b == p
    }

    pub fn set_a(&mut self, a: PointId) -> Result<(), StreetError> {
        if self.cluster.is_some() {
            return Err(StreetError::EndpointReassignedWhileStored(self.id));
        }
        self.a = a;
        self.geometry.take();
        Ok(())
    }

    pub fn set_b(&mut self, b: PointId) -> Result<(), StreetError> {
        if self.cluster.is_some() {
            return Err(StreetError::EndpointReassignedWhileStored(self.id));
        }
        self.b = b;
        self.geometry.take();
        Ok(())
    }

    /// Whether the stroke has been walked starting from `from`.
    pub fn is_traversed_from(&self, from: PointId) -> bool {
        if from == self.a {
            self.traversed_ab
        } else {
            self.traversed_ba
        }
    }

    /// Record a walk starting from `from`; walking it twice is an invariant violation.
    pub(crate) fn mark_traversed_from(&mut self, from: PointId) -> Result<(), StreetError> {
        let flag = if from == self.a {
            &mut self.traversed_ab
        } else if from == self.b {
            &mut self.traversed_ba
        } else {
            return Err(StreetError::StrokeNotIncident {
                stroke: self.id,
                point: from,
            });
        };
        if *flag {
            return Err(StreetError::EdgeTraversedTwice {
                stroke: self.id,
                from,
            });
        }
        *flag = true;
        Ok(())
    }

    pub(crate) fn clear_traversed(&mut self) {
        self.traversed_ab = false;
        self.traversed_ba = false;
    }

    pub(crate) fn set_cluster(&mut self, cluster: Option<u64>) {
        self.cluster = cluster;
    }

    pub(crate) fn cached_geometry(
        &self,
        endpoints: impl FnOnce() -> (Vec2, Vec2),
    ) -> &StrokeGeometry {
        self.geometry.get_or_init(|| {
            let (pa, pb) = endpoints();
            StrokeGeometry::between(pa, pb)
        })
    }

    pub(crate) fn invalidate_geometry(&mut self) {
        self.geometry.take();
    }
}

/// What a proximity or crossing query hit besides the existing stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntersectionTarget {
    /// A candidate stroke crossing the existing one at `scale` along itself.
    Stroke { id: StrokeId, scale: f32 },
    /// A street point lying `distance` away from the existing stroke.
    Point { id: PointId, distance: f32 },
}

/// Result of a crossing or proximity query against stored strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeIntersection {
    pub position: Vec2,
    pub existing: StrokeId,
    /// Parameter of `position` along the existing stroke, A = 0, B = 1.
    pub existing_scale: f32,
    pub target: IntersectionTarget,
}
