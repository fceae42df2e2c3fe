//! Location attributes sampled by estate derivation.
//!
//! A cluster's surroundings decide how dense and commercial its lots are.
//! Both attributes lie in `[0, 1]`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Strategy answering downtownness and shoppingness at a position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationProfile {
    /// The same values everywhere.
    Uniform { downtownness: f32, shoppingness: f32 },
    /// Peaks at `center`, fading linearly to zero at `radius`.
    Radial {
        center: Vec2,
        radius: f32,
        peak_downtownness: f32,
        peak_shoppingness: f32,
    },
}

impl Default for LocationProfile {
    fn default() -> Self {
        LocationProfile::Uniform {
            downtownness: 0.5,
            shoppingness: 0.3,
        }
    }
}

impl LocationProfile {
    pub fn downtownness(&self, at: Vec2) -> f32 {
        match *self {
            LocationProfile::Uniform { downtownness, .. } => downtownness.clamp(0.0, 1.0),
            LocationProfile::Radial {
                center,
                radius,
                peak_downtownness,
                ..
            } => (peak_downtownness * falloff(center, radius, at)).clamp(0.0, 1.0),
        }
    }

    pub fn shoppingness(&self, at: Vec2) -> f32 {
        match *self {
            LocationProfile::Uniform { shoppingness, .. } => shoppingness.clamp(0.0, 1.0),
            LocationProfile::Radial {
                center,
                radius,
                peak_shoppingness,
                ..
            } => (peak_shoppingness * falloff(center, radius, at)).clamp(0.0, 1.0),
        }
    }
}

fn falloff(center: Vec2, radius: f32, at: Vec2) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    (1.0 - at.distance(center) / radius).clamp(0.0, 1.0)
}
