//! Invariant violations raised while building a cluster's street graph.
//!
//! Soft rejections of the growth algorithm (too-close points, narrow angles,
//! near-duplicate crossings) are not errors; they only show up in
//! [`GenerationStats`](crate::generator::GenerationStats). Everything here means a broken
//! precondition and aborts generation for the cluster.

use crate::point::PointId;
use crate::stroke::StrokeId;

/// A broken street-graph invariant.
#[derive(Debug, Clone, PartialEq)]
pub enum StreetError {
    /// The stroke already belongs to the store of the given cluster.
    StrokeAlreadyStored { cluster: u64 },
    /// The stroke is not registered in any store.
    StrokeNotStored(StrokeId),
    /// The stroke belongs to another cluster's store.
    ForeignStroke { expected: u64, found: u64 },
    /// The point handle does not belong to this store.
    UnknownPoint(PointId),
    /// An endpoint was reassigned while the stroke was stored.
    EndpointReassignedWhileStored(StrokeId),
    /// Both endpoints of a stroke coincide.
    ZeroLengthStroke { a: PointId, b: PointId },
    /// A directed stroke use was walked by two faces.
    EdgeTraversedTwice { stroke: StrokeId, from: PointId },
    /// Angle and section caches of a point disagree in length.
    SectionArrayMismatch {
        point: PointId,
        angles: usize,
        sections: usize,
    },
    /// A stroke was expected at a point it does not touch.
    StrokeNotIncident { stroke: StrokeId, point: PointId },
    /// Face tracing ran past every directed stroke use without closing.
    FaceDidNotClose { start: PointId, steps: usize },
}

impl std::fmt::Display for StreetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreetError::StrokeAlreadyStored { cluster } => {
                write!(f, "stroke already belongs to the store of cluster {}", cluster)
            }
            StreetError::StrokeNotStored(id) => write!(f, "stroke #{} is not stored", id.0),
            StreetError::ForeignStroke { expected, found } => write!(
                f,
                "stroke belongs to cluster {}, not to cluster {}",
                found, expected
            ),
            StreetError::UnknownPoint(id) => write!(f, "unknown street point #{}", id.0),
            StreetError::EndpointReassignedWhileStored(id) => {
                write!(f, "endpoint of stored stroke #{} was reassigned", id.0)
            }
            StreetError::ZeroLengthStroke { a, b } => {
                write!(f, "zero-length stroke between #{} and #{}", a.0, b.0)
            }
            StreetError::EdgeTraversedTwice { stroke, from } => write!(
                f,
                "stroke #{} traversed twice starting from point #{}",
                stroke.0, from.0
            ),
            StreetError::SectionArrayMismatch {
                point,
                angles,
                sections,
            } => write!(
                f,
                "point #{} has {} incident strokes but {} sections",
                point.0, angles, sections
            ),
            StreetError::StrokeNotIncident { stroke, point } => {
                write!(f, "stroke #{} is not incident to point #{}", stroke.0, point.0)
            }
            StreetError::FaceDidNotClose { start, steps } => write!(
                f,
                "face starting at point #{} did not close after {} steps",
                start.0, steps
            ),
        }
    }
}

impl std::error::Error for StreetError {}
