// Per-creature stepper and the ECS systems that run it once per frame.
// Each stage is a free function so it can be tested on its own; `step_creature`
// runs them in order.

use bevy_ecs::prelude::*;
use glam::Vec2;
use std::f32::consts::{PI, TAU};

use super::bubbles::BubbleClock;
use super::components::*;
use super::config::MotionTuning;

const EPSILON: f32 = 1e-6;

// ============================================================================
// STEPPER STAGES
// ============================================================================

/// Impulse pushing a creature at `position` away from `point`.
///
/// Magnitude is `(1 - dist / radius) * strength` inside the radius and zero
/// outside it. When the two positions coincide the impulse points along
/// `fallback_dir`.
pub fn repulsion_impulse(
    position: Vec2,
    point: Vec2,
    radius: f32,
    strength: f32,
    fallback_dir: Vec2,
) -> Vec2 {
    if strength <= 0.0 || radius <= 0.0 {
        return Vec2::ZERO;
    }
    let away = position - point;
    let dist = away.length();
    if dist >= radius {
        return Vec2::ZERO;
    }
    let dir = if dist > EPSILON { away / dist } else { fallback_dir };
    dir * ((1.0 - dist / radius) * strength)
}

/// Unit vector the creature is currently travelling along. Falls back to the
/// stored heading when the velocity is too small to have a direction.
pub fn travel_direction(creature: &Creature) -> Vec2 {
    creature
        .velocity
        .try_normalize()
        .unwrap_or_else(|| Vec2::from_angle(creature.heading))
}

/// Blend velocity toward `base_speed` along the current direction of travel.
pub fn steer_toward_cruise(creature: &mut Creature, blend: f32) {
    let target = travel_direction(creature) * creature.base_speed;
    creature.velocity += (target - creature.velocity) * blend;
}

/// Rescale velocity down to `max_speed` if it is faster, keeping direction.
pub fn clamp_speed(velocity: Vec2, max_speed: f32) -> Vec2 {
    let speed = velocity.length();
    if speed > max_speed && speed > EPSILON {
        velocity * (max_speed / speed)
    } else {
        velocity
    }
}

/// Bleed off speed above the cruise speed. Creatures at or below cruise are
/// left for steering to bring back up.
pub fn damp_excess_speed(creature: &mut Creature, damping: f32) {
    let speed = creature.velocity.length();
    if speed > creature.base_speed && speed > EPSILON {
        let damped = creature.base_speed + (speed - creature.base_speed) * damping;
        creature.velocity *= damped / speed;
    }
}

/// Clamp a host-supplied frame duration to `[0, max_frame_ms]`.
/// Non-finite input counts as zero.
pub fn clamp_dt(dt_ms: f32, max_frame_ms: f32) -> f32 {
    if dt_ms.is_finite() {
        dt_ms.clamp(0.0, max_frame_ms)
    } else {
        0.0
    }
}

/// Advance position by velocity scaled to the elapsed fraction of a nominal
/// frame. `dt_ms` must already be clamped.
pub fn integrate(creature: &mut Creature, dt_ms: f32, nominal_frame_ms: f32) {
    creature.position += creature.velocity * (dt_ms / nominal_frame_ms);
}

/// Toroidal wrap: leaving one side re-enters from the other, with the
/// creature's size as a margin so it slides fully off-screen first.
pub fn wrap_to_viewport(position: &mut Vec2, size: f32, viewport: Viewport) {
    if position.x > viewport.width + size {
        position.x = -size;
    } else if position.x < -size {
        position.x = viewport.width + size;
    }

    if position.y > viewport.height + size {
        position.y = -size;
    } else if position.y < -size {
        position.y = viewport.height + size;
    }
}

/// Wrap an angle into `[-π, π]`.
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid can return TAU itself for tiny negative inputs.
    if wrapped > PI { wrapped - TAU } else { wrapped }
}

/// Turn the heading a fraction of the way toward the velocity direction,
/// taking the short way round.
pub fn update_heading(creature: &mut Creature, blend: f32, speed_threshold: f32) {
    if creature.velocity.length() <= speed_threshold {
        return;
    }
    let target = creature.velocity.y.atan2(creature.velocity.x);
    let diff = normalize_angle(target - creature.heading);
    creature.heading = normalize_angle(creature.heading + diff * blend);
}

/// Advance one creature by one frame.
pub fn step_creature(
    creature: &mut Creature,
    point: Option<Vec2>,
    dt_ms: f32,
    viewport: Viewport,
    tuning: &MotionTuning,
) {
    if let Some(point) = point {
        creature.velocity += repulsion_impulse(
            creature.position,
            point,
            creature.repulsion_radius,
            creature.repulsion_strength,
            travel_direction(creature),
        );
    }

    steer_toward_cruise(creature, tuning.steering_blend);
    creature.velocity = clamp_speed(
        creature.velocity,
        creature.max_speed(tuning.max_speed_factor),
    );
    damp_excess_speed(creature, tuning.damping);

    let dt = clamp_dt(dt_ms, tuning.max_frame_ms);
    integrate(creature, dt, tuning.nominal_frame_ms);
    wrap_to_viewport(&mut creature.position, creature.size, viewport);

    update_heading(creature, tuning.heading_blend, tuning.heading_speed_threshold);
}

// ============================================================================
// ECS SYSTEMS
// ============================================================================

/// Step every creature using the interaction point and frame time stored for
/// this frame.
pub fn creature_motion_system(
    mut pool: ResMut<CreaturePool>,
    point: Res<InteractionPoint>,
    frame: Res<FrameTime>,
    viewport: Res<Viewport>,
    tuning: Res<MotionTuning>,
) {
    let point = point.0;
    let viewport = *viewport;
    for creature in pool.creatures.iter_mut() {
        step_creature(creature, point, frame.dt_ms, viewport, &tuning);
    }
}

/// Advance the bubble animation clock by the clamped frame time.
pub fn bubble_clock_system(
    mut clock: ResMut<BubbleClock>,
    frame: Res<FrameTime>,
    tuning: Res<MotionTuning>,
) {
    clock.elapsed_s += clamp_dt(frame.dt_ms, tuning.max_frame_ms) as f64 / 1000.0;
}

pub fn frame_stats_system(
    mut stats: ResMut<FrameStats>,
    frame: Res<FrameTime>,
    tuning: Res<MotionTuning>,
) {
    stats.frames += 1;
    stats.elapsed_s += clamp_dt(frame.dt_ms, tuning.max_frame_ms) as f64 / 1000.0;
}
