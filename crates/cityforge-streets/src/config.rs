//! Tunable parameters for street growth and estate derivation.
//!
//! All structs deserialize with `#[serde(default)]`, so a JSON file only
//! needs the fields it overrides.
//!
//! ```
//! use cityforge_streets::config::{validate_config, StreetConfig};
//!
//! let config = StreetConfig::from_json(r#"{ "generator": { "max_generation_steps": 200 } }"#).unwrap();
//! assert_eq!(config.generator.max_generation_steps, 200);
//! assert!(validate_config(&config).is_empty());
//! ```

use serde::{Deserialize, Serialize};

/// Knobs of the stroke-growth algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Hard cap on worklist pops per run.
    pub max_generation_steps: u32,
    /// Minimum distance between two street points.
    pub min_point_to_cand_point_distance: f32,
    /// Minimum clearance between a point and an unrelated stroke.
    pub min_point_to_cand_stroke_distance: f32,
    /// Minimum angle in degrees between strokes meeting at a point.
    pub angle_min_strokes: f32,
    /// Weight of the first stroke.
    pub initial_weight: f32,
    pub weight_min: f32,
    pub weight_max: f32,
    /// Strokes at or above this weight are primary streets.
    pub primary_weight_threshold: f32,
    /// Chance that a follow-on stroke changes weight at all.
    pub weight_change_probability: f32,
    pub weight_increase_factor: f32,
    pub weight_decrease_factor: f32,
    pub p_forward: f32,
    pub p_right: f32,
    pub p_left: f32,
    pub p_random: f32,
    /// Fraction of each branch probability removed at weight 1.
    pub branch_weight_damping: f32,
    /// Stroke length at weight 0.
    pub length_base: f32,
    /// Extra length per unit of weight².
    pub length_weight_factor: f32,
    /// Relative length jitter, applied as `1 ± jitter`.
    pub length_jitter: f32,
    /// Degrees a forward stroke may bend.
    pub forward_angle_jitter: f32,
    /// Degrees a side branch may deviate from a right angle.
    pub turn_angle_jitter: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_generation_steps: 1000,
            min_point_to_cand_point_distance: 30.0,
            min_point_to_cand_stroke_distance: 18.0,
            angle_min_strokes: 35.0,
            initial_weight: 0.9,
            weight_min: 0.15,
            weight_max: 1.0,
            primary_weight_threshold: 0.6,
            weight_change_probability: 0.5,
            weight_increase_factor: 1.15,
            weight_decrease_factor: 0.8,
            p_forward: 0.92,
            p_right: 0.4,
            p_left: 0.4,
            p_random: 0.05,
            branch_weight_damping: 0.35,
            length_base: 40.0,
            length_weight_factor: 50.0,
            length_jitter: 0.2,
            forward_angle_jitter: 12.0,
            turn_angle_jitter: 8.0,
        }
    }
}

/// One rung of the building-height ladder.
///
/// A lot qualifies when its shortest inset edge and its downtownness both
/// reach the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightTier {
    pub min_edge: f32,
    pub min_downtownness: f32,
    pub max_stories: u32,
}

/// Knobs of estate and building derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstateConfig {
    /// Width of one sidewalk step; lots are inset by 1 to 6 steps.
    pub sidewalk_unit: f32,
    /// Miter length limit, in multiples of the inset distance.
    pub miter_limit: f32,
    /// Chance that a lot stays empty.
    pub skip_probability: f32,
    pub story_height: f32,
    /// Tiers from tallest to shortest; the first match wins.
    pub height_tiers: Vec<HeightTier>,
    /// Story cap when no tier matches.
    pub fallback_max_stories: u32,
    pub shopfront_width: f32,
    /// How far shopfronts sit inside the facade.
    pub shopfront_inset: f32,
    /// Grid the quarter centre snaps to before seeding its random stream.
    pub seed_quantum: f32,
}

impl Default for EstateConfig {
    fn default() -> Self {
        Self {
            sidewalk_unit: 1.0,
            miter_limit: 2.0,
            skip_probability: 0.3,
            story_height: 3.0,
            height_tiers: vec![
                HeightTier {
                    min_edge: 20.0,
                    min_downtownness: 0.75,
                    max_stories: 160,
                },
                HeightTier {
                    min_edge: 10.0,
                    min_downtownness: 0.45,
                    max_stories: 8,
                },
                HeightTier {
                    min_edge: 4.0,
                    min_downtownness: 0.2,
                    max_stories: 2,
                },
            ],
            fallback_max_stories: 1,
            shopfront_width: 5.0,
            shopfront_inset: 0.1,
            seed_quantum: 0.5,
        }
    }
}

impl EstateConfig {
    /// Story cap for a lot with the given shortest edge and downtownness.
    pub fn max_stories(&self, min_edge: f32, downtownness: f32) -> u32 {
        self.height_tiers
            .iter()
            .find(|t| min_edge >= t.min_edge && downtownness >= t.min_downtownness)
            .map_or(self.fallback_max_stories, |t| t.max_stories)
    }

    /// Inset distance from the street edge, stepping with downtownness.
    pub fn sidewalk_width(&self, downtownness: f32) -> f32 {
        let steps = 1.0 + (downtownness.clamp(0.0, 1.0) * 5.999).floor();
        self.sidewalk_unit * steps
    }
}

/// Everything the cluster pipeline needs, as stored in `street_config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreetConfig {
    pub generator: GeneratorConfig,
    pub estate: EstateConfig,
}

impl StreetConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A probability lies outside `[0, 1]`.
    ProbabilityOutOfRange(&'static str, f32),
    /// A distance or length is zero or negative.
    NonPositive(&'static str, f32),
    /// A spread or factor that may be zero is negative.
    Negative(&'static str, f32),
    /// `length_jitter` must lie in `[0, 1)` so every stroke keeps a positive length.
    LengthJitterOutOfRange(f32),
    /// `weight_min` exceeds `weight_max`.
    WeightRangeInverted { min: f32, max: f32 },
    /// The minimum stroke angle leaves no room for a junction.
    AngleOutOfRange(f32),
    /// Height tiers are not ordered from tallest to shortest.
    TiersUnordered,
    /// A step cap of zero never grows anything.
    NoGenerationSteps,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ProbabilityOutOfRange(name, v) => {
                write!(f, "{name} = {v} is not a probability")
            }
            ConfigError::NonPositive(name, v) => write!(f, "{name} = {v} must be positive"),
            ConfigError::Negative(name, v) => write!(f, "{name} = {v} must not be negative"),
            ConfigError::LengthJitterOutOfRange(v) => {
                write!(f, "length_jitter {v} must lie in [0, 1)")
            }
            ConfigError::WeightRangeInverted { min, max } => {
                write!(f, "weight_min {min} exceeds weight_max {max}")
            }
            ConfigError::AngleOutOfRange(a) => {
                write!(f, "angle_min_strokes {a} must lie in (0, 180) degrees")
            }
            ConfigError::TiersUnordered => {
                write!(f, "height tiers must be ordered from tallest to shortest")
            }
            ConfigError::NoGenerationSteps => write!(f, "max_generation_steps must be non-zero"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validate a street configuration, returning all errors found.
pub fn validate_config(config: &StreetConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    let g = &config.generator;
    let e = &config.estate;

    if g.max_generation_steps == 0 {
        errors.push(ConfigError::NoGenerationSteps);
    }
    for (name, p) in [
        ("p_forward", g.p_forward),
        ("p_right", g.p_right),
        ("p_left", g.p_left),
        ("p_random", g.p_random),
        ("weight_change_probability", g.weight_change_probability),
        ("branch_weight_damping", g.branch_weight_damping),
        ("skip_probability", e.skip_probability),
    ] {
        if !(0.0..=1.0).contains(&p) {
            errors.push(ConfigError::ProbabilityOutOfRange(name, p));
        }
    }
    for (name, v) in [
        ("min_point_to_cand_point_distance", g.min_point_to_cand_point_distance),
        ("min_point_to_cand_stroke_distance", g.min_point_to_cand_stroke_distance),
        ("length_base", g.length_base),
        ("sidewalk_unit", e.sidewalk_unit),
        ("miter_limit", e.miter_limit),
        ("story_height", e.story_height),
        ("shopfront_width", e.shopfront_width),
        ("seed_quantum", e.seed_quantum),
    ] {
        if v.is_nan() || v <= 0.0 {
            errors.push(ConfigError::NonPositive(name, v));
        }
    }
    for (name, v) in [
        ("forward_angle_jitter", g.forward_angle_jitter),
        ("turn_angle_jitter", g.turn_angle_jitter),
        ("length_weight_factor", g.length_weight_factor),
        ("shopfront_inset", e.shopfront_inset),
    ] {
        if v.is_nan() || v < 0.0 {
            errors.push(ConfigError::Negative(name, v));
        }
    }
    if !(0.0..1.0).contains(&g.length_jitter) {
        errors.push(ConfigError::LengthJitterOutOfRange(g.length_jitter));
    }
    if g.weight_min > g.weight_max {
        errors.push(ConfigError::WeightRangeInverted {
            min: g.weight_min,
            max: g.weight_max,
        });
    }
    if !(g.angle_min_strokes > 0.0 && g.angle_min_strokes < 180.0) {
        errors.push(ConfigError::AngleOutOfRange(g.angle_min_strokes));
    }
    if e.height_tiers
        .windows(2)
        .any(|w| w[0].max_stories < w[1].max_stories)
    {
        errors.push(ConfigError::TiersUnordered);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&StreetConfig::default()).is_empty());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = StreetConfig::from_json(r#"{ "estate": { "story_height": 4.0 } }"#).unwrap();
        assert_eq!(config.estate.story_height, 4.0);
        assert_eq!(config.generator, GeneratorConfig::default());
        assert_eq!(config.estate.height_tiers.len(), 3);
    }

    #[test]
    fn json_round_trip() {
        let config = StreetConfig::default();
        let back = StreetConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn bad_values_reported() {
        let mut config = StreetConfig::default();
        config.generator.p_left = 1.5;
        config.generator.weight_min = 2.0;
        config.generator.angle_min_strokes = 0.0;
        config.estate.story_height = -1.0;
        let errors = validate_config(&config);
        assert!(errors.contains(&ConfigError::ProbabilityOutOfRange("p_left", 1.5)));
        assert!(errors.contains(&ConfigError::AngleOutOfRange(0.0)));
        assert!(errors.contains(&ConfigError::NonPositive("story_height", -1.0)));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::WeightRangeInverted { .. })));
    }

    #[test]
    fn negative_angle_jitter_reported() {
        let mut config = StreetConfig::default();
        config.generator.forward_angle_jitter = -5.0;
        config.generator.turn_angle_jitter = -1.0;
        let errors = validate_config(&config);
        assert!(errors.contains(&ConfigError::Negative("forward_angle_jitter", -5.0)));
        assert!(errors.contains(&ConfigError::Negative("turn_angle_jitter", -1.0)));
    }

    #[test]
    fn zero_angle_jitter_allowed() {
        let mut config = StreetConfig::default();
        config.generator.forward_angle_jitter = 0.0;
        config.generator.turn_angle_jitter = 0.0;
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn length_jitter_must_keep_lengths_positive() {
        let mut config = StreetConfig::default();
        config.generator.length_jitter = 1.0;
        assert_eq!(
            validate_config(&config),
            vec![ConfigError::LengthJitterOutOfRange(1.0)]
        );
        config.generator.length_jitter = -0.1;
        assert_eq!(
            validate_config(&config),
            vec![ConfigError::LengthJitterOutOfRange(-0.1)]
        );
    }

    #[test]
    fn height_tiers() {
        let e = EstateConfig::default();
        assert_eq!(e.max_stories(25.0, 0.9), 160);
        assert_eq!(e.max_stories(25.0, 0.5), 8);
        assert_eq!(e.max_stories(12.0, 0.9), 8);
        assert_eq!(e.max_stories(5.0, 0.3), 2);
        assert_eq!(e.max_stories(1.5, 0.1), 1);
        assert_eq!(e.max_stories(1.5, 1.0), 1);
    }

    #[test]
    fn sidewalk_steps_with_downtownness() {
        let e = EstateConfig::default();
        assert_eq!(e.sidewalk_width(0.0), 1.0);
        assert_eq!(e.sidewalk_width(0.5), 3.0);
        assert_eq!(e.sidewalk_width(1.0), 6.0);
    }
}
