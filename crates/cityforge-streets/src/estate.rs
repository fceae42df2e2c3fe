//! Estates, buildings and shopfronts derived from a quarter polygon.
//!
//! A quarter's curb polygon is pulled in by a sidewalk to give the estate
//! lot. The lot carries at most one building covering it entirely; its
//! height tier comes from how roomy the lot is and how central the location
//! is. All random choices come from a stream keyed by the quarter centre so
//! a quarter always gets the same building.

use glam::Vec2;
use log::trace;
use rand::Rng;

use crate::config::EstateConfig;
use crate::geometry::{centroid, ensure_ccw, inset_polygon, min_edge_length};
use crate::location::LocationProfile;
use crate::rng::quarter_rng;

/// A storefront along one facade edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShopFront {
    points: [Vec2; 2],
}

impl ShopFront {
    pub fn points(&self) -> [Vec2; 2] {
        self.points
    }

    pub fn length(&self) -> f32 {
        self.points[0].distance(self.points[1])
    }
}

/// A building footprint extruded to a height.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    points: Vec<Vec2>,
    stories: u32,
    height: f32,
    shop_fronts: Vec<ShopFront>,
}

impl Building {
    /// Raise a building on `footprint`, drawing the story count and shop roll from `rng`.
    pub fn raise(
        footprint: &[Vec2],
        downtownness: f32,
        shoppingness: f32,
        config: &EstateConfig,
        rng: &mut impl Rng,
    ) -> Building {
        let mut points = footprint.to_vec();
        ensure_ccw(&mut points);

        let cap = config
            .max_stories(min_edge_length(&points), downtownness)
            .max(1);
        let stories = rng.gen_range(1..=cap);
        let shop_fronts = if rng.gen::<f32>() < shoppingness {
            shop_fronts(&points, config.shopfront_width, config.shopfront_inset)
        } else {
            Vec::new()
        };

        Building {
            points,
            stories,
            height: stories as f32 * config.story_height,
            shop_fronts,
        }
    }

    /// Footprint, counter-clockwise.
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn stories(&self) -> u32 {
        self.stories
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn shop_fronts(&self) -> &[ShopFront] {
        &self.shop_fronts
    }
}

/// Cut each edge of a counter-clockwise footprint into `width` pieces,
/// centred on the edge and pushed `inset` towards the interior.
fn shop_fronts(points: &[Vec2], width: f32, inset: f32) -> Vec<ShopFront> {
    let mut fronts = Vec::new();
    if width <= 0.0 {
        return fronts;
    }
    for (i, &p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        let len = p.distance(q);
        let count = (len / width).floor() as usize;
        if count == 0 {
            continue;
        }
        let dir = (q - p) / len;
        let inward = dir.perp() * inset;
        let margin = (len - count as f32 * width) * 0.5;
        for k in 0..count {
            let start = p + dir * (margin + k as f32 * width) + inward;
            fronts.push(ShopFront {
                points: [start, start + dir * width],
            });
        }
    }
    fronts
}

/// A buildable lot inside a quarter.
#[derive(Debug, Clone, PartialEq)]
pub struct Estate {
    polygon: Vec<Vec2>,
    sidewalk_width: f32,
    buildings: Vec<Building>,
}

impl Estate {
    /// Inset the quarter polygon by a sidewalk and maybe raise a building on it.
    pub fn derive(quarter: &[Vec2], config: &EstateConfig, profile: &LocationProfile) -> Estate {
        let center = centroid(quarter);
        let downtownness = profile.downtownness(center);
        let sidewalk_width = config.sidewalk_width(downtownness);
        let polygon = inset_polygon(quarter, sidewalk_width, config.miter_limit);
        let mut estate = Estate {
            polygon,
            sidewalk_width,
            buildings: Vec::new(),
        };
        if estate.is_degenerate() {
            trace!("estate at {center:?} vanished under a {sidewalk_width} sidewalk");
            return estate;
        }

        let mut rng = quarter_rng(center, config.seed_quantum);
        if rng.gen::<f32>() < config.skip_probability {
            return estate;
        }
        let shoppingness = profile.shoppingness(center);
        estate.buildings.push(Building::raise(
            &estate.polygon,
            downtownness,
            shoppingness,
            config,
            &mut rng,
        ));
        estate
    }

    /// Lot outline, counter-clockwise; empty when the sidewalk swallowed it.
    pub fn polygon(&self) -> &[Vec2] {
        &self.polygon
    }

    pub fn sidewalk_width(&self) -> f32 {
        self.sidewalk_width
    }

    pub fn is_degenerate(&self) -> bool {
        self.polygon.is_empty()
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }
}
