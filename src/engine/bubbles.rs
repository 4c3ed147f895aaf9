// Rising background bubbles.
//
// Unlike creatures, bubbles have no per-frame state: each one is a looping
// keyframe animation, so its sprite is a pure function of elapsed time.

use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::Rng;

use super::components::Viewport;
use super::config::BubbleSettings;

/// Gap between the viewport's bottom edge and a bubble's bottom edge at the
/// start of a cycle, as a fraction of viewport height.
const START_DEPTH: f32 = 0.1;
/// Distance risen per cycle, as a fraction of viewport height.
const RISE_FRACTION: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bubble {
    /// Horizontal position as a fraction of viewport width.
    pub x_fraction: f32,
    pub size: f32,
    pub delay_s: f32,
    pub duration_s: f32,
}

/// What the renderer needs for one bubble on one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleSprite {
    /// Centre in screen pixels.
    pub position: Vec2,
    pub size: f32,
    pub opacity: f32,
}

impl Bubble {
    /// Fraction of the current cycle completed at `elapsed_s`, in `[0, 1)`.
    /// Zero until the start delay has passed.
    pub fn progress(&self, elapsed_s: f64) -> f32 {
        let t = elapsed_s - self.delay_s as f64;
        if t <= 0.0 {
            return 0.0;
        }
        let duration = self.duration_s as f64;
        (t.rem_euclid(duration) / duration) as f32
    }

    pub fn sprite(&self, elapsed_s: f64, viewport: Viewport) -> BubbleSprite {
        let progress = self.progress(elapsed_s);
        let start_y = viewport.height * (1.0 + START_DEPTH) - self.size * 0.5;
        let y = start_y - progress * RISE_FRACTION * viewport.height;
        BubbleSprite {
            position: Vec2::new(self.x_fraction * viewport.width, y),
            size: self.size,
            opacity: opacity_at(progress),
        }
    }
}

/// Keyframes `[1, 1, 0]` spread evenly over the cycle.
pub fn opacity_at(progress: f32) -> f32 {
    if progress <= 0.5 {
        1.0
    } else {
        (1.0 - (progress - 0.5) * 2.0).clamp(0.0, 1.0)
    }
}

/// All bubbles, created once at startup.
#[derive(Resource, Debug, Clone, Default)]
pub struct BubbleField {
    pub bubbles: Vec<Bubble>,
}

impl BubbleField {
    pub fn spawn<R: Rng>(settings: &BubbleSettings, rng: &mut R) -> Self {
        let bubbles = (0..settings.count)
            .map(|_| Bubble {
                x_fraction: rng.gen_range(0.0..=1.0),
                size: rng.gen_range(settings.min_size..=settings.max_size),
                delay_s: rng.gen_range(0.0..=settings.max_delay_s),
                duration_s: rng.gen_range(settings.min_duration_s..=settings.max_duration_s),
            })
            .collect();
        Self { bubbles }
    }

    pub fn sprites(&self, elapsed_s: f64, viewport: Viewport) -> impl Iterator<Item = BubbleSprite> + '_ {
        self.bubbles.iter().map(move |b| b.sprite(elapsed_s, viewport))
    }
}

/// Seconds of animation time elapsed, advanced by the frame driver.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct BubbleClock {
    pub elapsed_s: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::spawn::create_rng;

    const VIEWPORT: Viewport = Viewport { width: 1000.0, height: 500.0 };

    fn bubble() -> Bubble {
        Bubble { x_fraction: 0.25, size: 20.0, delay_s: 2.0, duration_s: 10.0 }
    }

    #[test]
    fn waits_at_start_until_delay_passes() {
        let b = bubble();
        let before = b.sprite(1.0, VIEWPORT);
        let at_delay = b.sprite(2.0, VIEWPORT);
        assert_eq!(before, at_delay);
        assert_eq!(before.position.x, 250.0);
        assert!(before.position.y > VIEWPORT.height);
        assert_eq!(before.opacity, 1.0);
    }

    #[test]
    fn starts_with_bottom_edge_below_viewport() {
        let b = bubble();
        let start = b.sprite(0.0, VIEWPORT);
        let bottom_edge = start.position.y + b.size * 0.5;
        assert!((bottom_edge - VIEWPORT.height * (1.0 + START_DEPTH)).abs() < 1e-4);
        // Whole bubble is hidden below the viewport.
        assert!(start.position.y - b.size * 0.5 > VIEWPORT.height);
    }

    #[test]
    fn rises_and_loops() {
        let b = bubble();
        let start = b.sprite(2.0, VIEWPORT).position.y;
        let mid = b.sprite(7.0, VIEWPORT).position.y;
        assert!((start - mid - 0.5 * RISE_FRACTION * VIEWPORT.height).abs() < 1e-3);

        let next_cycle = b.sprite(12.0 + 1e-6, VIEWPORT).position.y;
        assert!((next_cycle - start).abs() < 0.01);
    }

    #[test]
    fn ends_cycle_above_viewport() {
        let b = bubble();
        let end = b.sprite(11.999, VIEWPORT);
        assert!(end.position.y + b.size * 0.5 < 0.0);
    }

    #[test]
    fn fades_over_second_half() {
        assert_eq!(opacity_at(0.0), 1.0);
        assert_eq!(opacity_at(0.5), 1.0);
        assert!((opacity_at(0.75) - 0.5).abs() < 1e-6);
        assert!(opacity_at(0.9999) < 0.001);
    }

    #[test]
    fn spawn_respects_settings() {
        let settings = BubbleSettings::default();
        let field = BubbleField::spawn(&settings, &mut create_rng(Some(5)));
        assert_eq!(field.bubbles.len(), settings.count);
        for b in &field.bubbles {
            assert!((0.0..=1.0).contains(&b.x_fraction));
            assert!(b.size >= settings.min_size && b.size <= settings.max_size);
            assert!(b.delay_s >= 0.0 && b.delay_s <= settings.max_delay_s);
            assert!(b.duration_s >= settings.min_duration_s && b.duration_s <= settings.max_duration_s);
        }
        assert_eq!(field.sprites(3.0, VIEWPORT).count(), settings.count);
    }
}
