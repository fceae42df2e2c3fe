//! Versioned binary snapshots of a stroke store.
//!
//! Snapshots record identity, not caches: stored points with their ids and
//! positions, and strokes with their ids, endpoints, weight and primary flag.
//! Loading replays every stroke through `add_stroke`, so a corrupt snapshot
//! fails with the same errors live generation would.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::error::StreetError;
use crate::geometry::Rect;
use crate::point::PointId;
use crate::store::StrokeStore;
use crate::stroke::StrokeId;

/// Current snapshot format version. Increment on breaking changes.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: PointId,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeRecord {
    pub id: StrokeId,
    pub a: PointId,
    pub b: PointId,
    pub weight: f32,
    pub primary: bool,
}

#[derive(Serialize, Deserialize)]
struct SnapshotData {
    version: u32,
    cluster: u64,
    bounds: Rect,
    points: Vec<PointRecord>,
    strokes: Vec<StrokeRecord>,
}

impl SnapshotData {
    fn capture(store: &StrokeStore) -> Self {
        let points = store
            .arena()
            .iter()
            .filter(|p| p.in_store())
            .map(|p| PointRecord {
                id: p.id(),
                position: p.position(),
            })
            .collect();
        let strokes = store
            .strokes()
            .map(|s| StrokeRecord {
                id: s.id(),
                a: s.a(),
                b: s.b(),
                weight: s.weight(),
                primary: s.is_primary(),
            })
            .collect();
        Self {
            version: SNAPSHOT_VERSION,
            cluster: store.cluster_id(),
            bounds: store.bounds(),
            points,
            strokes,
        }
    }
}

/// Write `store` to `writer`.
pub fn save_snapshot<W: Write>(store: &StrokeStore, writer: W) -> Result<(), SnapshotError> {
    bincode::serialize_into(writer, &SnapshotData::capture(store))?;
    Ok(())
}

/// Snapshot bytes of `store`.
pub fn snapshot_bytes(store: &StrokeStore) -> Result<Vec<u8>, SnapshotError> {
    Ok(bincode::serialize(&SnapshotData::capture(store))?)
}

/// Rebuild a store from a snapshot.
pub fn load_snapshot<R: Read>(reader: R) -> Result<StrokeStore, SnapshotError> {
    let data: SnapshotData = bincode::deserialize_from(reader)?;

    if data.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::VersionMismatch {
            expected: SNAPSHOT_VERSION,
            found: data.version,
        });
    }

    let mut store = StrokeStore::new(data.cluster, data.bounds);
    for p in &data.points {
        store.restore_point(p.id, p.position, true);
    }
    for s in &data.strokes {
        store.restore_stroke(s.id, s.a, s.b, s.weight, s.primary)?;
    }
    Ok(store)
}

/// Errors that can occur while saving or loading a snapshot
#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
    /// The snapshot decoded but describes an inconsistent graph.
    Street(StreetError),
}

impl From<std::io::Error> for SnapshotError {
    fn from(e: std::io::Error) -> Self {
        SnapshotError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SnapshotError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SnapshotError::Bincode(e)
    }
}

impl From<StreetError> for SnapshotError {
    fn from(e: StreetError) -> Self {
        SnapshotError::Street(e)
    }
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "IO error: {}", e),
            SnapshotError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SnapshotError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Snapshot version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            SnapshotError::Street(e) => write!(f, "Invalid street graph: {}", e),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Io(e) => Some(e),
            SnapshotError::Bincode(e) => Some(e.as_ref()),
            SnapshotError::Street(e) => Some(e),
            SnapshotError::VersionMismatch { .. } => None,
        }
    }
}
