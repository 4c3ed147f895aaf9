// Reef Drift - ambient sea creatures drifting across a window.
// Instanced rendering: every creature and bubble in a single draw call.

mod engine;

use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use wgpu::util::DeviceExt;
use winit::{
    event::{ElementState, Event as WinitEvent, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use engine::camera::ScreenCamera;
use engine::debug_overlay::{repulsion_rings, DebugOverlay, DebugStats};
use engine::input::PointerTracker;
use engine::mesh::{build_instances, QuadVertex, SpriteInstance, QUAD_INDICES, QUAD_VERTICES};
use engine::spawn::layer_counts;
use engine::{SimConfig, Simulation, Viewport};

// ============================================================================
// UNIFORM DATA (camera only)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

// ============================================================================
// FRAME TIMING
// ============================================================================

/// Rolling one-second frame statistics for the log line and the overlay.
struct FrameTimer {
    last_fps_update: Instant,
    frames: u32,
    sum_ms: f32,
    min_ms: f32,
    max_ms: f32,
    // Last completed window
    fps: u32,
    avg_ms: f32,
    window_min_ms: f32,
    window_max_ms: f32,
}

impl FrameTimer {
    fn new() -> Self {
        Self {
            last_fps_update: Instant::now(),
            frames: 0,
            sum_ms: 0.0,
            min_ms: f32::MAX,
            max_ms: 0.0,
            fps: 0,
            avg_ms: 0.0,
            window_min_ms: 0.0,
            window_max_ms: 0.0,
        }
    }

    /// Record one frame. Returns true when a one-second window just closed.
    fn record(&mut self, dt_ms: f32) -> bool {
        self.frames += 1;
        self.sum_ms += dt_ms;
        self.min_ms = self.min_ms.min(dt_ms);
        self.max_ms = self.max_ms.max(dt_ms);

        let now = Instant::now();
        if (now - self.last_fps_update).as_secs_f32() < 1.0 {
            return false;
        }
        self.fps = self.frames;
        self.avg_ms = self.sum_ms / self.frames as f32;
        self.window_min_ms = self.min_ms;
        self.window_max_ms = self.max_ms;
        self.frames = 0;
        self.sum_ms = 0.0;
        self.min_ms = f32::MAX;
        self.max_ms = 0.0;
        self.last_fps_update = now;
        true
    }
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    scale_factor: f64,
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    num_indices: u32,
    max_instances: usize,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    simulation: Simulation,
    tracker: PointerTracker,
    camera: ScreenCamera,
    overlay: DebugOverlay,
    timer: FrameTimer,
    last_update: Instant,
}

impl State {
    async fn new(window: Arc<Window>, sim_config: &SimConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let scale_factor = window.scale_factor();
        let viewport = logical_viewport(size, scale_factor);

        let simulation = Simulation::new(sim_config, viewport)?;

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible GPU adapter")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .context("failed to open GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no texture formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sprite Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader_sprites.wgsl").into()),
        });

        let camera = ScreenCamera::new(viewport);
        let uniforms = Uniforms {
            view_proj: camera.view_projection().to_cols_array_2d(),
        };

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("uniform_bind_group_layout"),
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sprite Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[QuadVertex::desc(), SpriteInstance::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Y-down projection flips winding; sprites are flat anyway.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Index Buffer"),
            contents: bytemuck::cast_slice(QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let max_instances = SimConfig::MAX_CREATURES + SimConfig::MAX_BUBBLES;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (max_instances * std::mem::size_of::<SpriteInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let overlay = DebugOverlay::new(&window, &device, surface_format);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            scale_factor,
            render_pipeline,
            vertex_buffer,
            index_buffer,
            instance_buffer,
            num_indices: QUAD_INDICES.len() as u32,
            max_instances,
            uniform_buffer,
            uniform_bind_group,
            simulation,
            tracker: PointerTracker::new(),
            camera,
            overlay,
            timer: FrameTimer::new(),
            last_update: Instant::now(),
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);

            let viewport = logical_viewport(new_size, self.scale_factor);
            self.camera.set_viewport(viewport);
            self.simulation.resize(viewport);
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt_ms = (now - self.last_update).as_secs_f32() * 1000.0;
        self.last_update = now;

        // Snapshot the pointer once; events during the frame land next frame.
        self.simulation.advance(dt_ms, self.tracker.current());

        if self.timer.record(dt_ms) {
            log::debug!(
                "FPS: {} | Creatures: {} | Bubbles: {} | Draw calls: 1",
                self.timer.fps,
                self.simulation.creatures().len(),
                self.simulation.bubble_count(),
            );
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Collect instance data BEFORE creating render pass
        let bubbles = self.simulation.bubble_sprites();
        let instance_data = build_instances(self.simulation.creatures(), &bubbles, self.max_instances);
        let instance_count = instance_data.len();

        if !instance_data.is_empty() {
            self.queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&instance_data),
            );
        }

        let uniforms = Uniforms {
            view_proj: self.camera.view_projection().to_cols_array_2d(),
        };
        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.38,
                            g: 0.82,
                            b: 0.86,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

            // ONE DRAW CALL for all sprites
            render_pass.draw_indexed(0..self.num_indices, 0, 0..instance_count as u32);
        }

        if self.overlay.stats_visible || self.overlay.rings_visible {
            let stats = self.overlay.stats_visible.then(|| self.debug_stats());
            let rings = if self.overlay.rings_visible {
                self.simulation.interaction_point().map(repulsion_rings)
            } else {
                None
            };
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.config.width, self.config.height],
                pixels_per_point: self.scale_factor as f32,
            };
            self.overlay.render(
                &self.device,
                &self.queue,
                &mut encoder,
                &self.window,
                &view,
                &screen_descriptor,
                stats.as_ref(),
                rings.as_deref(),
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn debug_stats(&self) -> DebugStats {
        let creatures = self.simulation.creatures();
        DebugStats {
            fps: self.timer.fps,
            frame_time_avg_ms: self.timer.avg_ms,
            frame_time_min_ms: self.timer.window_min_ms,
            frame_time_max_ms: self.timer.window_max_ms,
            creature_count: creatures.len(),
            layer_counts: layer_counts(creatures),
            bubble_count: self.simulation.bubble_count(),
            resolution: (self.size.width, self.size.height),
            pointer: self.tracker.current().map(|p| (p.x, p.y)),
        }
    }

    /// Stop the frame driver and the pointer tracker.
    fn shutdown(&mut self) {
        self.tracker.detach();
        self.simulation.shutdown();
    }
}

/// Window size in the logical pixels the simulation works in. Clamped to at
/// least one physical pixel, matching the surface configuration.
fn logical_viewport(size: winit::dpi::PhysicalSize<u32>, scale_factor: f64) -> Viewport {
    let clamped = winit::dpi::PhysicalSize::new(size.width.max(1), size.height.max(1));
    let logical = clamped.to_logical::<f32>(scale_factor);
    Viewport::new(logical.width, logical.height)
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Defaults, overridden by `REEF_DRIFT_SEED` and `REEF_DRIFT_CREATURES`.
fn config_from_env() -> anyhow::Result<SimConfig> {
    let mut config = SimConfig::default();
    if let Ok(seed) = std::env::var("REEF_DRIFT_SEED") {
        config.seed = Some(
            seed.trim()
                .parse()
                .with_context(|| format!("REEF_DRIFT_SEED is not a u64: {seed:?}"))?,
        );
    }
    if let Ok(count) = std::env::var("REEF_DRIFT_CREATURES") {
        config.creature_count = count
            .trim()
            .parse()
            .with_context(|| format!("REEF_DRIFT_CREATURES is not a count: {count:?}"))?;
    }
    config.validate()?;
    Ok(config)
}

// ============================================================================
// MAIN
// ============================================================================

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let sim_config = config_from_env()?;

    let event_loop = EventLoop::new().context("failed to create event loop")?;

    let window_attributes = Window::default_attributes()
        .with_title("AquaGrill - Reef Drift")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

    let window = Arc::new(
        event_loop
            .create_window(window_attributes)
            .context("failed to create window")?,
    );

    let mut state = pollster::block_on(State::new(window.clone(), &sim_config))?;
    log::info!("Press F3 for stats, F4 for repulsion radii, Esc to quit");

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                let _ = state.overlay.handle_window_event(&window, event);
                state.tracker.process_event(event, state.scale_factor);

                match event {
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::Escape),
                                ..
                            },
                        ..
                    } => {
                        state.shutdown();
                        control_flow.exit();
                    }
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(key),
                                repeat: false,
                                ..
                            },
                        ..
                    } => match key {
                        KeyCode::F3 => state.overlay.toggle_stats(),
                        KeyCode::F4 => state.overlay.toggle_rings(),
                        _ => {}
                    },
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                        state.scale_factor = *scale_factor;
                        state.resize(window.inner_size());
                    }
                    WindowEvent::RedrawRequested => {
                        state.update();
                        match state.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => state.resize(state.size),
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("GPU out of memory, exiting");
                                state.shutdown();
                                control_flow.exit();
                            }
                            Err(e) => log::warn!("surface error: {:?}", e),
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                if state.simulation.is_running() {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalSize;

    #[test]
    fn minimized_window_still_gives_usable_viewport() {
        let viewport = logical_viewport(PhysicalSize::new(0, 0), 2.0);
        assert!(viewport.width > 0.0 && viewport.width.is_finite());
        assert!(viewport.height > 0.0 && viewport.height.is_finite());

        let camera = ScreenCamera::new(viewport);
        assert!(camera.view_projection().is_finite());

        let sim = Simulation::new(&SimConfig { seed: Some(8), ..SimConfig::default() }, viewport)
            .expect("valid config");
        for c in sim.creatures() {
            assert!(c.position.is_finite());
        }
    }

    #[test]
    fn viewport_is_in_logical_pixels() {
        let viewport = logical_viewport(PhysicalSize::new(2560, 1440), 2.0);
        assert_eq!(viewport, Viewport::new(1280.0, 720.0));
    }
}
