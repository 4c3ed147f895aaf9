// Simulation configuration. Every tunable lives here with its default;
// callers override fields with struct-update syntax.

use bevy_ecs::prelude::*;
use thiserror::Error;

use super::components::Layer;

/// Constants shaping each creature's per-frame motion.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct MotionTuning {
    /// Fraction of the gap to cruise velocity closed each frame.
    pub steering_blend: f32,
    /// Multiplier applied to speed in excess of the cruise speed each frame.
    pub damping: f32,
    /// Speed cap as a multiple of the creature's base speed.
    pub max_speed_factor: f32,
    /// Fraction of the angular gap to the velocity direction closed each frame.
    pub heading_blend: f32,
    /// Below this speed the heading is left alone.
    pub heading_speed_threshold: f32,
    /// Frame duration that velocity is expressed against.
    pub nominal_frame_ms: f32,
    /// Longest frame the stepper will integrate; longer gaps are clamped.
    pub max_frame_ms: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            steering_blend: 0.02,
            damping: 0.98,
            max_speed_factor: 2.5,
            heading_blend: 0.05,
            heading_speed_threshold: 0.01,
            nominal_frame_ms: 16.67,
            max_frame_ms: 100.0,
        }
    }
}

/// Relative odds of each layer when spawning. Need not sum to one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerWeights {
    pub foreground: f32,
    pub midground: f32,
    pub background: f32,
}

impl Default for LayerWeights {
    fn default() -> Self {
        Self {
            foreground: 0.15,
            midground: 0.60,
            background: 0.25,
        }
    }
}

impl LayerWeights {
    pub fn total(&self) -> f32 {
        self.foreground + self.midground + self.background
    }

    /// Map a uniform roll in `[0, 1)` to a layer. Foreground takes the first
    /// slice, then midground, then background.
    pub fn pick(&self, roll: f32) -> Layer {
        let scaled = roll * self.total();
        if scaled < self.foreground {
            Layer::Foreground
        } else if scaled < self.foreground + self.midground {
            Layer::Midground
        } else {
            Layer::Background
        }
    }
}

/// Rising-bubble field parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleSettings {
    pub count: usize,
    pub min_size: f32,
    pub max_size: f32,
    pub max_delay_s: f32,
    pub min_duration_s: f32,
    pub max_duration_s: f32,
}

impl Default for BubbleSettings {
    fn default() -> Self {
        Self {
            count: 25,
            min_size: 10.0,
            max_size: 40.0,
            max_delay_s: 25.0,
            min_duration_s: 10.0,
            max_duration_s: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Number of creatures spawned at start.
    pub creature_count: usize,
    /// Seed for the spawn RNG. `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub layer_weights: LayerWeights,
    pub motion: MotionTuning,
    pub bubbles: BubbleSettings,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            creature_count: 15,
            seed: None,
            layer_weights: LayerWeights::default(),
            motion: MotionTuning::default(),
            bubbles: BubbleSettings::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SimConfigError {
    #[error("creature_count must be greater than 0")]
    NoCreatures,
    #[error("too many creatures: {actual} > max {max}")]
    TooManyCreatures { max: usize, actual: usize },
    #[error("layer weights must be finite, non-negative and not all zero")]
    InvalidLayerWeights,
    #[error("{name} must be finite and within {range}")]
    InvalidTuning { name: &'static str, range: &'static str },
    #[error("too many bubbles: {actual} > max {max}")]
    TooManyBubbles { max: usize, actual: usize },
    #[error("bubble {name} range is invalid")]
    InvalidBubbleRange { name: &'static str },
}

impl SimConfig {
    /// Upper bound on pooled creatures; also caps the GPU instance buffer.
    pub const MAX_CREATURES: usize = 2_000;
    pub const MAX_BUBBLES: usize = 2_000;

    pub fn validate(&self) -> Result<(), SimConfigError> {
        self.validate_population()?;
        self.validate_layer_weights()?;
        self.validate_motion()?;
        self.validate_bubbles()?;
        Ok(())
    }

    fn validate_population(&self) -> Result<(), SimConfigError> {
        if self.creature_count == 0 {
            return Err(SimConfigError::NoCreatures);
        }
        if self.creature_count > Self::MAX_CREATURES {
            return Err(SimConfigError::TooManyCreatures {
                max: Self::MAX_CREATURES,
                actual: self.creature_count,
            });
        }
        Ok(())
    }

    fn validate_layer_weights(&self) -> Result<(), SimConfigError> {
        let w = &self.layer_weights;
        let each_ok = [w.foreground, w.midground, w.background]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0);
        if !each_ok || w.total() <= 0.0 {
            return Err(SimConfigError::InvalidLayerWeights);
        }
        Ok(())
    }

    fn validate_motion(&self) -> Result<(), SimConfigError> {
        let m = &self.motion;
        check_unit_interval("steering_blend", m.steering_blend)?;
        check_unit_interval("damping", m.damping)?;
        check_unit_interval("heading_blend", m.heading_blend)?;
        if !(m.max_speed_factor.is_finite() && m.max_speed_factor >= 1.0) {
            return Err(SimConfigError::InvalidTuning {
                name: "max_speed_factor",
                range: "[1, inf)",
            });
        }
        if !(m.heading_speed_threshold.is_finite() && m.heading_speed_threshold >= 0.0) {
            return Err(SimConfigError::InvalidTuning {
                name: "heading_speed_threshold",
                range: "[0, inf)",
            });
        }
        check_positive("nominal_frame_ms", m.nominal_frame_ms)?;
        check_positive("max_frame_ms", m.max_frame_ms)?;
        Ok(())
    }

    fn validate_bubbles(&self) -> Result<(), SimConfigError> {
        let b = &self.bubbles;
        if b.count > Self::MAX_BUBBLES {
            return Err(SimConfigError::TooManyBubbles {
                max: Self::MAX_BUBBLES,
                actual: b.count,
            });
        }
        if !valid_range(b.min_size, b.max_size) || b.min_size <= 0.0 {
            return Err(SimConfigError::InvalidBubbleRange { name: "size" });
        }
        if !valid_range(b.min_duration_s, b.max_duration_s) || b.min_duration_s <= 0.0 {
            return Err(SimConfigError::InvalidBubbleRange { name: "duration" });
        }
        if !(b.max_delay_s.is_finite() && b.max_delay_s >= 0.0) {
            return Err(SimConfigError::InvalidBubbleRange { name: "delay" });
        }
        Ok(())
    }
}

fn check_unit_interval(name: &'static str, value: f32) -> Result<(), SimConfigError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(SimConfigError::InvalidTuning { name, range: "(0, 1]" })
    }
}

fn check_positive(name: &'static str, value: f32) -> Result<(), SimConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimConfigError::InvalidTuning { name, range: "(0, inf)" })
    }
}

fn valid_range(min: f32, max: f32) -> bool {
    min.is_finite() && max.is_finite() && min <= max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_empty_and_oversized_pools() {
        let empty = SimConfig { creature_count: 0, ..SimConfig::default() };
        assert_eq!(empty.validate(), Err(SimConfigError::NoCreatures));

        let huge = SimConfig { creature_count: SimConfig::MAX_CREATURES + 1, ..SimConfig::default() };
        assert!(matches!(huge.validate(), Err(SimConfigError::TooManyCreatures { .. })));
    }

    #[test]
    fn rejects_bad_layer_weights() {
        let zero = SimConfig {
            layer_weights: LayerWeights { foreground: 0.0, midground: 0.0, background: 0.0 },
            ..SimConfig::default()
        };
        assert_eq!(zero.validate(), Err(SimConfigError::InvalidLayerWeights));

        let negative = SimConfig {
            layer_weights: LayerWeights { foreground: -1.0, midground: 1.0, background: 1.0 },
            ..SimConfig::default()
        };
        assert_eq!(negative.validate(), Err(SimConfigError::InvalidLayerWeights));
    }

    #[test]
    fn rejects_out_of_range_tuning() {
        let cases = [
            MotionTuning { damping: 1.5, ..MotionTuning::default() },
            MotionTuning { steering_blend: 0.0, ..MotionTuning::default() },
            MotionTuning { heading_blend: f32::NAN, ..MotionTuning::default() },
            MotionTuning { max_speed_factor: 0.5, ..MotionTuning::default() },
            MotionTuning { nominal_frame_ms: 0.0, ..MotionTuning::default() },
            MotionTuning { max_frame_ms: f32::INFINITY, ..MotionTuning::default() },
            MotionTuning { heading_speed_threshold: -0.1, ..MotionTuning::default() },
        ];
        for motion in cases {
            let config = SimConfig { motion, ..SimConfig::default() };
            assert!(
                matches!(config.validate(), Err(SimConfigError::InvalidTuning { .. })),
                "{motion:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_bad_bubble_settings() {
        let inverted = SimConfig {
            bubbles: BubbleSettings { min_size: 40.0, max_size: 10.0, ..BubbleSettings::default() },
            ..SimConfig::default()
        };
        assert_eq!(inverted.validate(), Err(SimConfigError::InvalidBubbleRange { name: "size" }));

        let zero_duration = SimConfig {
            bubbles: BubbleSettings { min_duration_s: 0.0, ..BubbleSettings::default() },
            ..SimConfig::default()
        };
        assert_eq!(
            zero_duration.validate(),
            Err(SimConfigError::InvalidBubbleRange { name: "duration" })
        );

        let many = SimConfig {
            bubbles: BubbleSettings { count: SimConfig::MAX_BUBBLES + 1, ..BubbleSettings::default() },
            ..SimConfig::default()
        };
        assert!(matches!(many.validate(), Err(SimConfigError::TooManyBubbles { .. })));
    }

    #[test]
    fn layer_pick_follows_weights() {
        let w = LayerWeights::default();
        assert_eq!(w.pick(0.0), Layer::Foreground);
        assert_eq!(w.pick(0.14), Layer::Foreground);
        assert_eq!(w.pick(0.16), Layer::Midground);
        assert_eq!(w.pick(0.74), Layer::Midground);
        assert_eq!(w.pick(0.76), Layer::Background);
        assert_eq!(w.pick(0.999), Layer::Background);
    }
}
