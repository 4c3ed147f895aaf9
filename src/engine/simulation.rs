// Frame driver: owns the ECS world holding the creature pool and runs the
// per-frame schedule.
//
// The host calls `advance` once per display refresh with the elapsed time and
// its current pointer position. The pointer is copied into the world before
// any system runs, so every creature in a frame sees the same value.

use bevy_ecs::prelude::*;
use glam::Vec2;

use super::bubbles::{BubbleClock, BubbleField, BubbleSprite};
use super::components::*;
use super::config::{SimConfig, SimConfigError};
use super::spawn::{create_rng, layer_counts, spawn_creatures};
use super::systems::{bubble_clock_system, creature_motion_system, frame_stats_system};

pub struct Simulation {
    world: World,
    schedule: Schedule,
    running: bool,
}

impl Simulation {
    /// Validate `config`, spawn the creature pool and bubble field, and
    /// build the frame schedule.
    pub fn new(config: &SimConfig, viewport: Viewport) -> Result<Self, SimConfigError> {
        config.validate()?;

        let mut rng = create_rng(config.seed);
        let creatures = spawn_creatures(config.creature_count, viewport, &config.layer_weights, &mut rng);
        let bubbles = BubbleField::spawn(&config.bubbles, &mut rng);

        let [bg, mid, fg] = layer_counts(&creatures);
        log::info!(
            "Spawned {} creatures (background {}, midground {}, foreground {}) and {} bubbles, seed {:?}",
            creatures.len(),
            bg,
            mid,
            fg,
            bubbles.bubbles.len(),
            config.seed,
        );

        let mut world = World::new();
        world.insert_resource(CreaturePool { creatures });
        world.insert_resource(bubbles);
        world.insert_resource(BubbleClock::default());
        world.insert_resource(viewport);
        world.insert_resource(InteractionPoint::default());
        world.insert_resource(FrameTime::default());
        world.insert_resource(FrameStats::default());
        world.insert_resource(config.motion);

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (creature_motion_system, bubble_clock_system, frame_stats_system).chain(),
        );

        Ok(Self { world, schedule, running: true })
    }

    /// Run one frame. `dt_ms` is the host's elapsed time since the previous
    /// frame; `pointer` is the interaction point as of now.
    /// Does nothing after `shutdown`.
    pub fn advance(&mut self, dt_ms: f32, pointer: Option<Vec2>) {
        if !self.running {
            return;
        }
        self.world.resource_mut::<FrameTime>().dt_ms = dt_ms;
        self.world.resource_mut::<InteractionPoint>().0 = pointer;
        self.schedule.run(&mut self.world);
    }

    /// Update wrap bounds for later frames. Zero-sized viewports (minimized
    /// windows) are ignored.
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport.width > 0.0 && viewport.height > 0.0 {
            *self.world.resource_mut::<Viewport>() = viewport;
        }
    }

    /// Stop the driver. Later `advance` calls are no-ops.
    pub fn shutdown(&mut self) {
        if self.running {
            let stats = self.stats();
            log::info!(
                "Simulation stopped after {} frames ({:.1} s simulated)",
                stats.frames,
                stats.elapsed_s
            );
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn creatures(&self) -> &[Creature] {
        &self.world.resource::<CreaturePool>().creatures
    }

    /// Bubble sprites at the current animation time.
    pub fn bubble_sprites(&self) -> Vec<BubbleSprite> {
        let elapsed = self.world.resource::<BubbleClock>().elapsed_s;
        self.world
            .resource::<BubbleField>()
            .sprites(elapsed, self.viewport())
            .collect()
    }

    pub fn bubble_count(&self) -> usize {
        self.world.resource::<BubbleField>().bubbles.len()
    }

    pub fn viewport(&self) -> Viewport {
        *self.world.resource::<Viewport>()
    }

    /// Interaction point used by the most recent frame.
    pub fn interaction_point(&self) -> Option<Vec2> {
        self.world.resource::<InteractionPoint>().0
    }

    pub fn stats(&self) -> FrameStats {
        *self.world.resource::<FrameStats>()
    }

    #[cfg(test)]
    pub fn tuning(&self) -> super::config::MotionTuning {
        *self.world.resource::<super::config::MotionTuning>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport { width: 1024.0, height: 768.0 };

    fn seeded(seed: u64) -> Simulation {
        let config = SimConfig { seed: Some(seed), creature_count: 40, ..SimConfig::default() };
        Simulation::new(&config, VIEWPORT).expect("valid config")
    }

    fn pointer_for(frame: usize) -> Option<Vec2> {
        match frame % 50 {
            0..=19 => Some(Vec2::new(100.0 + frame as f32 * 3.0, 400.0)),
            20..=29 => None,
            _ => Some(Vec2::new(512.0, 384.0)),
        }
    }

    fn dt_for(frame: usize) -> f32 {
        [16.67, 16.0, 33.3, 8.3, 5000.0, 0.0][frame % 6]
    }

    #[test]
    fn rejects_invalid_config() {
        let config = SimConfig { creature_count: 0, ..SimConfig::default() };
        assert!(matches!(
            Simulation::new(&config, VIEWPORT),
            Err(SimConfigError::NoCreatures)
        ));
    }

    #[test]
    fn identical_inputs_are_bit_reproducible() {
        let mut a = seeded(11);
        let mut b = seeded(11);
        for frame in 0..400 {
            a.advance(dt_for(frame), pointer_for(frame));
            b.advance(dt_for(frame), pointer_for(frame));
        }
        for (ca, cb) in a.creatures().iter().zip(b.creatures()) {
            assert_eq!(ca.position.x.to_bits(), cb.position.x.to_bits());
            assert_eq!(ca.position.y.to_bits(), cb.position.y.to_bits());
            assert_eq!(ca.velocity.x.to_bits(), cb.velocity.x.to_bits());
            assert_eq!(ca.velocity.y.to_bits(), cb.velocity.y.to_bits());
            assert_eq!(ca.heading.to_bits(), cb.heading.to_bits());
        }
        assert_eq!(a.bubble_sprites(), b.bubble_sprites());
    }

    #[test]
    fn invariants_hold_every_frame() {
        let mut sim = seeded(3);
        let initial: Vec<Creature> = sim.creatures().to_vec();
        let tuning = sim.tuning();
        for frame in 0..600 {
            sim.advance(dt_for(frame), pointer_for(frame));
            let vp = sim.viewport();
            for (c, c0) in sim.creatures().iter().zip(&initial) {
                assert_eq!(c.size, c0.size);
                assert_eq!(c.opacity, c0.opacity);
                assert!(c.size > 0.0);
                assert!((0.0..=1.0).contains(&c.opacity));
                assert!(c.position.x >= -c.size && c.position.x <= vp.width + c.size);
                assert!(c.position.y >= -c.size && c.position.y <= vp.height + c.size);
                assert!(c.speed() <= c.base_speed * tuning.max_speed_factor + 1e-4);
                assert!(c.position.is_finite() && c.velocity.is_finite() && c.heading.is_finite());
            }
        }
        assert_eq!(sim.stats().frames, 600);
    }

    #[test]
    fn pointer_is_snapshotted_per_frame() {
        let mut sim = seeded(1);
        sim.advance(16.67, Some(Vec2::new(10.0, 20.0)));
        assert_eq!(sim.interaction_point(), Some(Vec2::new(10.0, 20.0)));
        sim.advance(16.67, None);
        assert_eq!(sim.interaction_point(), None);
    }

    #[test]
    fn resize_moves_wrap_bounds_and_ignores_zero() {
        let mut sim = seeded(2);
        let small = Viewport::new(300.0, 200.0);
        sim.resize(small);
        assert_eq!(sim.viewport(), small);
        sim.resize(Viewport::new(0.0, 0.0));
        assert_eq!(sim.viewport(), small);

        sim.advance(16.67, None);
        for c in sim.creatures() {
            assert!(c.position.x <= small.width + c.size);
            assert!(c.position.y <= small.height + c.size);
        }
    }

    #[test]
    fn shutdown_freezes_state() {
        let mut sim = seeded(4);
        sim.advance(16.67, None);
        sim.shutdown();
        assert!(!sim.is_running());
        let frozen: Vec<Creature> = sim.creatures().to_vec();
        sim.advance(16.67, Some(Vec2::ZERO));
        assert_eq!(sim.creatures(), frozen.as_slice());
        assert_eq!(sim.stats().frames, 1);
    }

    #[test]
    fn frame_stats_use_clamped_time() {
        let mut sim = seeded(6);
        sim.advance(5000.0, None);
        let stats = sim.stats();
        assert_eq!(stats.frames, 1);
        assert!((stats.elapsed_s - 0.1).abs() < 1e-6);
    }

    #[test]
    fn bubble_clock_uses_clamped_time() {
        let mut sim = seeded(6);
        sim.advance(5000.0, None);
        let clock = sim.world.resource::<BubbleClock>().elapsed_s;
        assert!((clock - 0.1).abs() < 1e-6, "clock {clock}");

        // Sprites follow the clamped clock, not the raw 5 s gap.
        let viewport = sim.viewport();
        let expected: Vec<BubbleSprite> = sim
            .world
            .resource::<BubbleField>()
            .bubbles
            .iter()
            .map(|b| b.sprite(clock, viewport))
            .collect();
        assert_eq!(sim.bubble_sprites(), expected);
    }
}
