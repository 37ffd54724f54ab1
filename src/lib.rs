//! Lantern: a small real-time rendering toolkit built directly on OpenGL.
//!
//! The crate wraps raw GL resources (buffers, vertex arrays, framebuffers,
//! textures, shader programs) in ownership types and builds a multi-type
//! shadow-mapping light system on top of them. The `lantern` binary is a
//! viewer that drives every piece: shadow passes for directional, point and
//! spot lights, a forward pass sampling the shadow maps, and a keyboard
//! debug panel for live light editing.

pub mod camera;
pub mod engine;
pub mod renderer;
pub mod scene;
pub mod snapshot;
pub mod ui;

pub use renderer::light::{Attenuation, GpuLight, Light, LightKind, LightState};
pub use renderer::mesh::{Mesh, MeshData, MeshError};
pub use renderer::{BatchRenderer, Drawable, RenderError};
