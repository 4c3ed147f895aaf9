// Sprite geometry and per-instance GPU data.
//
// Every creature and bubble is the same unit quad, stretched, rotated and
// shaded per instance. The fragment shader picks the silhouette from `shape`.

use super::bubbles::BubbleSprite;
use super::components::{Creature, CreatureKind};

// ============================================================================
// QUAD VERTEX
// ============================================================================

/// Corner of the unit quad, in [-0.5, 0.5]².
///   @location(0) corner: vec2<f32>
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub corner: [f32; 2],
}

impl QuadVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        }
    }
}

pub const QUAD_VERTICES: &[QuadVertex] = &[
    QuadVertex { corner: [-0.5, -0.5] },
    QuadVertex { corner: [ 0.5, -0.5] },
    QuadVertex { corner: [ 0.5,  0.5] },
    QuadVertex { corner: [-0.5,  0.5] },
];

pub const QUAD_INDICES: &[u16] = &[0, 1, 2, 0, 2, 3];

// ============================================================================
// SPRITE INSTANCE
// ============================================================================

/// Silhouette selector, matched in `shader_sprites.wgsl`.
pub const SHAPE_FISH: u32 = 0;
pub const SHAPE_CRAB: u32 = 1;
pub const SHAPE_BUBBLE: u32 = 2;

/// Bubbles sit behind every creature layer.
pub const BUBBLE_STACK_ORDER: u32 = 0;

/// One sprite on screen.
///   @location(1) center:   vec2<f32>  (logical pixels)
///   @location(2) size:     vec2<f32>  (width, height)
///   @location(3) rotation: f32        (radians)
///   @location(4) opacity:  f32
///   @location(5) shape:    u32
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteInstance {
    pub center: [f32; 2],
    pub size: [f32; 2],
    pub rotation: f32,
    pub opacity: f32,
    pub shape: u32,
    pub _padding: u32,
}

impl SpriteInstance {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const F32: wgpu::BufferAddress = std::mem::size_of::<f32>() as wgpu::BufferAddress;
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute { offset: 0, shader_location: 1, format: wgpu::VertexFormat::Float32x2 },
                wgpu::VertexAttribute { offset: 2 * F32, shader_location: 2, format: wgpu::VertexFormat::Float32x2 },
                wgpu::VertexAttribute { offset: 4 * F32, shader_location: 3, format: wgpu::VertexFormat::Float32 },
                wgpu::VertexAttribute { offset: 5 * F32, shader_location: 4, format: wgpu::VertexFormat::Float32 },
                wgpu::VertexAttribute { offset: 6 * F32, shader_location: 5, format: wgpu::VertexFormat::Uint32 },
            ],
        }
    }

    pub fn from_creature(creature: &Creature) -> Self {
        Self {
            center: creature.position.to_array(),
            size: [creature.size, creature.height()],
            rotation: creature.render_rotation(),
            opacity: creature.opacity,
            shape: match creature.kind {
                CreatureKind::Fish => SHAPE_FISH,
                CreatureKind::Crab => SHAPE_CRAB,
            },
            _padding: 0,
        }
    }

    pub fn from_bubble(bubble: &BubbleSprite) -> Self {
        Self {
            center: bubble.position.to_array(),
            size: [bubble.size, bubble.size],
            rotation: 0.0,
            opacity: bubble.opacity,
            shape: SHAPE_BUBBLE,
            _padding: 0,
        }
    }
}

/// Build the instance list in back-to-front order: bubbles first, then
/// creatures by ascending stack order. Pool order breaks ties so the draw
/// order is stable between frames.
pub fn build_instances(creatures: &[Creature], bubbles: &[BubbleSprite], max: usize) -> Vec<SpriteInstance> {
    let mut ordered: Vec<(u32, usize, SpriteInstance)> = Vec::with_capacity(creatures.len() + bubbles.len());
    for (i, bubble) in bubbles.iter().enumerate() {
        ordered.push((BUBBLE_STACK_ORDER, i, SpriteInstance::from_bubble(bubble)));
    }
    for (i, creature) in creatures.iter().enumerate() {
        ordered.push((creature.layer.config().stack_order, i, SpriteInstance::from_creature(creature)));
    }
    ordered.sort_by_key(|(order, i, _)| (*order, *i));
    ordered.into_iter().take(max).map(|(_, _, inst)| inst).collect()
}
