use egui::epaint::Shadow;

use super::components::Layer;

pub struct DebugStats {
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub frame_time_min_ms: f32,
    pub frame_time_max_ms: f32,
    pub creature_count: usize,
    /// Creatures per layer, in `Layer::ALL` order.
    pub layer_counts: [usize; 3],
    pub bubble_count: usize,
    pub resolution: (u32, u32),
    pub pointer: Option<(f32, f32)>,
}

/// Repulsion zone of one layer around the pointer, in egui screen points.
pub struct RepulsionRingDraw {
    pub center: egui::Pos2,
    pub radius_px: f32,
    pub layer: Layer,
}

/// Ring for every layer that reacts to the pointer, given the pointer in
/// logical pixels. egui points and logical pixels coincide.
pub fn repulsion_rings(pointer: glam::Vec2) -> Vec<RepulsionRingDraw> {
    Layer::ALL
        .iter()
        .filter(|layer| layer.config().repulsion_strength > 0.0)
        .map(|&layer| RepulsionRingDraw {
            center: egui::pos2(pointer.x, pointer.y),
            radius_px: layer.config().repulsion_radius,
            layer,
        })
        .collect()
}

pub struct DebugOverlay {
    pub stats_visible: bool,
    pub rings_visible: bool,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl DebugOverlay {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let egui_ctx = egui::Context::default();

        // Style: dark, semi-transparent, small monospace white font
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_premultiplied(0, 0, 0, 180);
        visuals.window_stroke = egui::Stroke::NONE;
        visuals.window_shadow = Shadow::NONE;
        visuals.override_text_color = Some(egui::Color32::WHITE);
        egui_ctx.set_visuals(visuals);

        let mut style = (*egui_ctx.style()).clone();
        style.override_font_id = Some(egui::FontId::monospace(13.0));
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            None,  // no depth
            1,     // msaa samples
            false, // no dithering
        );

        Self {
            stats_visible: false,
            rings_visible: false,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn toggle_stats(&mut self) {
        self.stats_visible = !self.stats_visible;
    }

    pub fn toggle_rings(&mut self) {
        self.rings_visible = !self.rings_visible;
    }

    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.egui_state.on_window_event(window, event)
    }

    /// Render one egui frame:
    ///
    /// - `rings` — F4 repulsion radii around the pointer (`None` = hidden).
    /// - `stats` — F3 stats panel (`None` = hidden).
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        view: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        stats: Option<&DebugStats>,
        rings: Option<&[RepulsionRingDraw]>,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            // ── F4: repulsion rings ──────────────────────────────────────────
            if let Some(rings) = rings {
                let painter = ctx.layer_painter(egui::LayerId::new(
                    egui::Order::Background,
                    egui::Id::new("repulsion_rings"),
                ));
                for ring in rings {
                    let color = match ring.layer {
                        Layer::Foreground => egui::Color32::from_rgba_unmultiplied(255, 120, 60, 200),
                        Layer::Midground => egui::Color32::from_rgba_unmultiplied(255, 220, 0, 160),
                        Layer::Background => egui::Color32::from_rgba_unmultiplied(0, 220, 255, 120),
                    };
                    painter.circle_stroke(ring.center, ring.radius_px, egui::Stroke::new(1.0, color));
                }
                if let Some(first) = rings.first() {
                    painter.circle_filled(first.center, 3.0, egui::Color32::WHITE);
                }
            }

            // ── F3: stats panel ──────────────────────────────────────────────
            if let Some(stats) = stats {
                egui::Area::new(egui::Id::new("debug_overlay"))
                    .fixed_pos(egui::pos2(10.0, 10.0))
                    .show(ctx, |ui| {
                        egui::Frame::none()
                            .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 180))
                            .inner_margin(egui::Margin::same(8.0))
                            .rounding(4.0)
                            .show(ui, |ui: &mut egui::Ui| {
                                ui.label(format!("FPS: {}", stats.fps));
                                ui.label(format!(
                                    "Frame: {:.2} ms (min: {:.1} | max: {:.1})",
                                    stats.frame_time_avg_ms,
                                    stats.frame_time_min_ms,
                                    stats.frame_time_max_ms
                                ));
                                ui.label(format!("Creatures: {}", stats.creature_count));
                                for (layer, count) in Layer::ALL.iter().zip(stats.layer_counts) {
                                    ui.label(format!("  {:<10} {}", layer.name(), count));
                                }
                                ui.label(format!("Bubbles: {}", stats.bubble_count));
                                ui.label(format!(
                                    "Resolution: {} x {}",
                                    stats.resolution.0, stats.resolution.1
                                ));
                                match stats.pointer {
                                    Some((x, y)) => ui.label(format!("Pointer: ({:.0}, {:.0})", x, y)),
                                    None => ui.label("Pointer: none"),
                                };
                            });
                    });
            }
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &tris, screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.egui_renderer
                .render(&mut render_pass.forget_lifetime(), &tris, screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rings_only_for_reactive_layers() {
        let rings = repulsion_rings(glam::Vec2::new(100.0, 50.0));
        assert!(rings.iter().all(|r| r.layer != Layer::Background));
        assert_eq!(rings.len(), 2);
        let fg = rings.iter().find(|r| r.layer == Layer::Foreground).map(|r| r.radius_px);
        assert_eq!(fg, Some(Layer::Foreground.config().repulsion_radius));
        assert_eq!(rings[0].center, egui::pos2(100.0, 50.0));
    }
}
