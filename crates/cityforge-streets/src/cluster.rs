//! One-call street synthesis for a cluster.

use glam::Vec2;
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::StreetConfig;
use crate::error::StreetError;
use crate::generator::{GenerationStats, Generator};
use crate::geometry::Rect;
use crate::location::LocationProfile;
use crate::quarter::{QuarterGenerator, QuarterStore};
use crate::store::StrokeStore;

/// What identifies a cluster to the street pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub id: u64,
    pub seed: String,
    /// Edge length of the cluster's square footprint.
    pub size: f32,
    pub bounds: Rect,
}

impl ClusterSpec {
    /// A square cluster of edge `size` centred on the origin.
    pub fn centered(id: u64, seed: impl Into<String>, size: f32) -> Self {
        Self {
            id,
            seed: seed.into(),
            size,
            bounds: Rect::from_center_size(Vec2::ZERO, size),
        }
    }
}

/// Streets, quarters and estates of one cluster.
#[derive(Debug)]
pub struct ClusterStreets {
    spec: ClusterSpec,
    store: StrokeStore,
    quarters: QuarterStore,
    stats: GenerationStats,
    dead_points: usize,
}

impl ClusterStreets {
    pub fn spec(&self) -> &ClusterSpec {
        &self.spec
    }

    pub fn store(&self) -> &StrokeStore {
        &self.store
    }

    pub fn quarters(&self) -> &QuarterStore {
        &self.quarters
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    /// Points dropped from the listing after growth.
    pub fn dead_points(&self) -> usize {
        self.dead_points
    }

    pub fn into_store(self) -> StrokeStore {
        self.store
    }
}

/// Grow the street graph, trace its quarters and derive their estates.
pub fn generate_cluster(
    spec: &ClusterSpec,
    config: &StreetConfig,
    profile: &LocationProfile,
) -> Result<ClusterStreets, StreetError> {
    let mut generator = Generator::new(&spec.seed, spec.bounds, config.generator.clone(), spec.id);
    generator.seed_center_stroke()?;
    let stats = generator.run()?;

    let mut store = generator.into_store();
    let dead_points = store.polish_street_points();
    let mut quarters = QuarterGenerator::new(&mut store).generate()?;
    quarters.build_estates(&config.estate, profile);

    info!(
        "cluster {} ({:?}): {} strokes, {} points, {} quarters ({} valid), {} buildings",
        spec.id,
        spec.seed,
        store.stroke_count(),
        store.point_count(),
        quarters.len(),
        quarters.valid_quarters().count(),
        quarters.building_count()
    );

    Ok(ClusterStreets {
        spec: spec.clone(),
        store,
        quarters,
        stats,
        dead_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_spec_spans_size() {
        let spec = ClusterSpec::centered(4, "docks", 600.0);
        assert_eq!(spec.bounds.width(), 600.0);
        assert_eq!(spec.bounds.center(), Vec2::ZERO);
    }

    #[test]
    fn pipeline_produces_streets_and_quarters() {
        let spec = ClusterSpec::centered(1, "old town", 1000.0);
        let streets =
            generate_cluster(&spec, &StreetConfig::default(), &LocationProfile::default()).unwrap();
        assert!(streets.store().stroke_count() > 0);
        assert!(streets.store().point_count() >= 2);
        assert!(!streets.quarters().is_empty());
        let stats = streets.stats();
        assert_eq!(
            (stats.committed + stats.splits) as usize,
            streets.store().stroke_count()
        );
    }
}
