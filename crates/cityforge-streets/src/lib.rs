//! Procedural street synthesis for CityForge clusters.
//!
//! Grows a street graph inside a cluster's bounds, traces the city blocks it
//! encloses and derives a lot and building for each block. Everything is
//! deterministic for a given seed string and configuration, and nothing here
//! touches rendering, persistence layers or an ECS.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`cluster`] | One-call pipeline: growth, quarters, estates |
//! | [`config`] | Generator and estate knobs, JSON loading and validation |
//! | [`error`] | Street-graph invariant violations |
//! | [`estate`] | Inset lots, buildings with height tiers, shopfronts |
//! | [`generator`] | Worklist-driven stochastic stroke growth |
//! | [`geometry`] | Rectangles, segments, polygon area/simplicity/inset |
//! | [`location`] | Downtownness and shoppingness strategies |
//! | [`point`] | Street points and their junction caches |
//! | [`quarter`] | Planar face tracing into quarters |
//! | [`rng`] | Seeded random streams keyed by strings and positions |
//! | [`snapshot`] | Versioned bincode export/import of a stroke store |
//! | [`spatial`] | R-tree behind the store's proximity queries |
//! | [`store`] | Per-cluster arena and index of points and strokes |
//! | [`stroke`] | Street segments, widths, intersection results |

pub mod cluster;
pub mod config;
pub mod error;
pub mod estate;
pub mod generator;
pub mod geometry;
pub mod location;
pub mod point;
pub mod quarter;
pub mod rng;
pub mod snapshot;
pub mod spatial;
pub mod store;
pub mod stroke;

pub use cluster::{generate_cluster, ClusterSpec, ClusterStreets};
pub use config::StreetConfig;
pub use error::StreetError;
pub use location::LocationProfile;
