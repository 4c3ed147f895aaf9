// Entity pool initialization.
// The RNG is injected so a fixed seed reproduces the same pool.

use glam::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::f32::consts::TAU;

use super::components::{Creature, CreatureKind, Layer, Viewport};
use super::config::LayerWeights;

/// Deterministic RNG for a seed, or an entropy-seeded one when `None`.
pub fn create_rng(seed: Option<u64>) -> ChaCha12Rng {
    match seed {
        Some(seed) => ChaCha12Rng::seed_from_u64(seed),
        None => ChaCha12Rng::from_entropy(),
    }
}

/// Build `count` creatures scattered across the viewport.
pub fn spawn_creatures<R: Rng>(
    count: usize,
    viewport: Viewport,
    weights: &LayerWeights,
    rng: &mut R,
) -> Vec<Creature> {
    (0..count).map(|_| spawn_creature(viewport, weights, rng)).collect()
}

/// One creature: weighted layer, uniform kind, everything else uniform within
/// the layer's ranges.
pub fn spawn_creature<R: Rng>(viewport: Viewport, weights: &LayerWeights, rng: &mut R) -> Creature {
    let layer = weights.pick(rng.gen_range(0.0..1.0));
    let kind = CreatureKind::ALL[rng.gen_range(0..CreatureKind::ALL.len())];
    let cfg = layer.config();

    let size = rng.gen_range(cfg.min_size..=cfg.max_size);
    let base_speed = rng.gen_range(cfg.min_speed..=cfg.max_speed);
    let opacity = rng.gen_range(cfg.min_opacity..=cfg.max_opacity);

    let position = Vec2::new(
        rng.gen_range(0.0..=viewport.width.max(0.0)),
        rng.gen_range(0.0..=viewport.height.max(0.0)),
    );

    let heading = rng.gen_range(0.0..TAU);
    let velocity = Vec2::from_angle(heading) * base_speed;

    Creature {
        position,
        velocity,
        base_speed,
        size,
        aspect_ratio: kind.aspect_ratio(),
        opacity,
        layer,
        kind,
        repulsion_radius: cfg.repulsion_radius,
        repulsion_strength: cfg.repulsion_strength,
        // Keep within [-π, π] like the stepper does.
        heading: velocity.y.atan2(velocity.x),
    }
}

/// Creature count per layer, in `Layer::ALL` order.
pub fn layer_counts(creatures: &[Creature]) -> [usize; 3] {
    let mut counts = [0; 3];
    for creature in creatures {
        let idx = Layer::ALL.iter().position(|l| *l == creature.layer).unwrap_or(0);
        counts[idx] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport { width: 1280.0, height: 720.0 };

    #[test]
    fn spawns_requested_count_within_layer_ranges() {
        let mut rng = create_rng(Some(7));
        let pool = spawn_creatures(200, VIEWPORT, &LayerWeights::default(), &mut rng);
        assert_eq!(pool.len(), 200);

        for c in &pool {
            let cfg = c.layer.config();
            assert!(c.size > 0.0);
            assert!(c.size >= cfg.min_size && c.size <= cfg.max_size);
            assert!(c.base_speed >= cfg.min_speed && c.base_speed <= cfg.max_speed);
            assert!((0.0..=1.0).contains(&c.opacity));
            assert!(c.opacity >= cfg.min_opacity && c.opacity <= cfg.max_opacity);
            assert!(c.position.x >= 0.0 && c.position.x <= VIEWPORT.width);
            assert!(c.position.y >= 0.0 && c.position.y <= VIEWPORT.height);
            assert!((c.speed() - c.base_speed).abs() < 1e-4);
            assert_eq!(c.aspect_ratio, c.kind.aspect_ratio());
            assert_eq!(c.repulsion_radius, cfg.repulsion_radius);
        }
    }

    #[test]
    fn same_seed_same_pool() {
        let a = spawn_creatures(15, VIEWPORT, &LayerWeights::default(), &mut create_rng(Some(42)));
        let b = spawn_creatures(15, VIEWPORT, &LayerWeights::default(), &mut create_rng(Some(42)));
        assert_eq!(a, b);

        let c = spawn_creatures(15, VIEWPORT, &LayerWeights::default(), &mut create_rng(Some(43)));
        assert_ne!(a, c);
    }

    #[test]
    fn layer_mix_roughly_matches_weights() {
        let mut rng = create_rng(Some(1));
        let pool = spawn_creatures(4000, VIEWPORT, &LayerWeights::default(), &mut rng);
        let [bg, mid, fg] = layer_counts(&pool);
        let frac = |n: usize| n as f32 / pool.len() as f32;
        assert!((frac(fg) - 0.15).abs() < 0.03, "foreground {}", frac(fg));
        assert!((frac(mid) - 0.60).abs() < 0.03, "midground {}", frac(mid));
        assert!((frac(bg) - 0.25).abs() < 0.03, "background {}", frac(bg));
    }

    #[test]
    fn single_layer_weights_only_spawn_that_layer() {
        let weights = LayerWeights { foreground: 0.0, midground: 0.0, background: 1.0 };
        let pool = spawn_creatures(50, VIEWPORT, &weights, &mut create_rng(Some(3)));
        assert!(pool.iter().all(|c| c.layer == Layer::Background));
    }

    #[test]
    fn both_kinds_appear() {
        let pool = spawn_creatures(100, VIEWPORT, &LayerWeights::default(), &mut create_rng(Some(9)));
        assert!(pool.iter().any(|c| c.kind == CreatureKind::Fish));
        assert!(pool.iter().any(|c| c.kind == CreatureKind::Crab));
    }
}
