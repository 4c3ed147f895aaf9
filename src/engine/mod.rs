// Engine module - the creature simulation plus the pieces the window host
// needs to draw it. Everything except `debug_overlay` and `mesh` runs headless.

pub mod bubbles;
pub mod camera;
pub mod components;
pub mod config;
pub mod debug_overlay;
pub mod input;
pub mod mesh;
pub mod simulation;
pub mod spawn;
pub mod systems;

// Re-export commonly used items
pub use components::*;
pub use config::SimConfig;
pub use simulation::Simulation;
