// Core simulation data: creatures, depth layers and the per-frame resources
// the frame driver stores in its ECS world.

use bevy_ecs::prelude::*;
use glam::Vec2;

// ============================================================================
// LAYERS
// ============================================================================

/// Depth tier of a creature. Determines its size, speed and reactivity ranges
/// and where it sits in the draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Background,
    Midground,
    Foreground,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Background, Layer::Midground, Layer::Foreground];

    /// Static motion/appearance ranges for this layer.
    pub fn config(self) -> &'static LayerConfig {
        match self {
            Layer::Background => &BACKGROUND,
            Layer::Midground => &MIDGROUND,
            Layer::Foreground => &FOREGROUND,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Layer::Background => "background",
            Layer::Midground => "midground",
            Layer::Foreground => "foreground",
        }
    }
}

/// Per-layer parameter ranges. Sizes are in screen pixels, speeds in pixels
/// per nominal frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerConfig {
    pub min_size: f32,
    pub max_size: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub min_opacity: f32,
    pub max_opacity: f32,
    pub repulsion_radius: f32,
    pub repulsion_strength: f32,
    pub stack_order: u32,
}

// Background creatures are too "far away" to notice the pointer.
const BACKGROUND: LayerConfig = LayerConfig {
    min_size: 30.0,
    max_size: 50.0,
    min_speed: 0.3,
    max_speed: 0.6,
    min_opacity: 0.15,
    max_opacity: 0.3,
    repulsion_radius: 0.0,
    repulsion_strength: 0.0,
    stack_order: 21,
};

const MIDGROUND: LayerConfig = LayerConfig {
    min_size: 50.0,
    max_size: 80.0,
    min_speed: 0.5,
    max_speed: 1.0,
    min_opacity: 0.3,
    max_opacity: 0.5,
    repulsion_radius: 150.0,
    repulsion_strength: 1.5,
    stack_order: 22,
};

const FOREGROUND: LayerConfig = LayerConfig {
    min_size: 80.0,
    max_size: 110.0,
    min_speed: 0.8,
    max_speed: 1.5,
    min_opacity: 0.5,
    max_opacity: 0.7,
    repulsion_radius: 200.0,
    repulsion_strength: 3.0,
    stack_order: 23,
};

// ============================================================================
// CREATURE KINDS
// ============================================================================

/// Visual kind of a creature. Purely cosmetic; motion is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatureKind {
    Fish,
    Crab,
}

impl CreatureKind {
    pub const ALL: [CreatureKind; 2] = [CreatureKind::Fish, CreatureKind::Crab];

    /// Width / height of the creature's artwork.
    pub fn aspect_ratio(self) -> f32 {
        match self {
            CreatureKind::Fish => 2.0,
            CreatureKind::Crab => 50.0 / 40.0,
        }
    }

    /// Rotation added to the heading so the artwork faces along its velocity.
    /// The fish is drawn nose-left.
    pub fn facing_offset(self) -> f32 {
        match self {
            CreatureKind::Fish => std::f32::consts::PI,
            CreatureKind::Crab => 0.0,
        }
    }
}

// ============================================================================
// CREATURE
// ============================================================================

/// One simulated creature. Only `position`, `velocity` and `heading` change
/// after creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Creature {
    pub position: Vec2,
    /// Pixels per nominal frame interval.
    pub velocity: Vec2,
    pub base_speed: f32,
    pub size: f32,
    pub aspect_ratio: f32,
    pub opacity: f32,
    pub layer: Layer,
    pub kind: CreatureKind,
    pub repulsion_radius: f32,
    pub repulsion_strength: f32,
    /// Radians. Smoothed toward the velocity direction; never feeds back into
    /// physics except as the steering direction when nearly stopped.
    pub heading: f32,
}

impl Creature {
    /// Rotation handed to the renderer.
    pub fn render_rotation(&self) -> f32 {
        self.heading + self.kind.facing_offset()
    }

    /// Rendered height in pixels (`size` is the width).
    pub fn height(&self) -> f32 {
        self.size / self.aspect_ratio
    }

    #[cfg(test)]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn max_speed(&self, max_speed_factor: f32) -> f32 {
        self.base_speed * max_speed_factor
    }
}

// ============================================================================
// FRAME RESOURCES
// ============================================================================

/// Every creature in the simulation, indexed by position. Owned by the frame
/// driver's world; nothing else mutates it.
#[derive(Resource, Debug, Clone, Default)]
pub struct CreaturePool {
    pub creatures: Vec<Creature>,
}

/// Visible area in logical pixels. Wrap bounds are `[-size, width + size]`.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Pointer/touch position as of the start of the current frame.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct InteractionPoint(pub Option<Vec2>);

/// Elapsed milliseconds since the previous frame, as supplied by the host.
/// Clamped by the stepper, not here.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct FrameTime {
    pub dt_ms: f32,
}

/// Running frame counter and accumulated simulated time.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub frames: u64,
    /// Seconds of simulated (clamped) time.
    pub elapsed_s: f64,
}
