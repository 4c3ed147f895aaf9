// Screen-space camera.
//
// The simulation works in logical pixels with the origin at the top-left and
// Y pointing down, matching window coordinates. This camera maps that space
// straight onto clip space, so no world/screen conversion is needed anywhere
// else.

use glam::Mat4;
#[cfg(test)]
use glam::{Vec2, Vec4Swizzles};

use super::components::Viewport;

pub struct ScreenCamera {
    viewport: Viewport,
}

impl ScreenCamera {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Orthographic projection: (0, 0) is the top-left corner,
    /// (width, height) the bottom-right.
    pub fn view_projection(&self) -> Mat4 {
        Mat4::orthographic_rh(0.0, self.viewport.width, self.viewport.height, 0.0, -1.0, 1.0)
    }

    /// Clip-space position of a screen point.
    #[cfg(test)]
    pub fn to_clip(&self, point: Vec2) -> Vec2 {
        (self.view_projection() * point.extend(0.0).extend(1.0)).xy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_map_to_clip_corners() {
        let cam = ScreenCamera::new(Viewport::new(800.0, 600.0));
        let top_left = cam.to_clip(Vec2::ZERO);
        let bottom_right = cam.to_clip(Vec2::new(800.0, 600.0));
        assert!((top_left - Vec2::new(-1.0, 1.0)).length() < 1e-5);
        assert!((bottom_right - Vec2::new(1.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn tracks_viewport_changes() {
        let mut cam = ScreenCamera::new(Viewport::new(800.0, 600.0));
        cam.set_viewport(Viewport::new(400.0, 300.0));
        let centre = cam.to_clip(Vec2::new(200.0, 150.0));
        assert!(centre.length() < 1e-5);
    }
}
