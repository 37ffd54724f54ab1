pub mod batch;
pub mod bounds;
pub mod buffer;
pub mod culling;
pub mod framebuffer;
pub mod light;
pub mod mesh;
pub mod shader;
pub mod texture;
pub mod vertex_array;

use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::engine::gl_debug;
use batch::MeshBatch;
use buffer::Buffer;
use light::{GpuLight, Light};
use shader::ShaderProgram;

const SCENE_VERT_SRC: &str = include_str!("../../shaders/scene.vert");
const SCENE_FRAG_SRC: &str = include_str!("../../shaders/scene.frag");

/// SSBO binding point for the scene-wide light array.
pub const LIGHT_BUFFER_BINDING: u32 = 1;

const CLEAR_COLOR: Vec3 = Vec3::new(0.05, 0.06, 0.09);

/// Construction-time faults for GPU resources. GL runtime errors are not
/// routed through this type; debug builds surface them via the error queue
/// drain instead.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{stage} shader compile error: {info_log}")]
    ShaderCompile {
        stage: &'static str,
        info_log: String,
    },
    #[error("shader link error: {info_log}")]
    ProgramLink { info_log: String },
    #[error("framebuffer incomplete (status {status:#06x})")]
    FramebufferIncomplete { status: u32 },
    #[error("buffer stride {stride} does not fit a GLsizei")]
    StrideTooLarge { stride: usize },
    #[error("only element-array buffers can be connected as index buffers")]
    NotAnIndexBuffer,
}

/// Something the shadow pass can draw directly: issues its own draw call
/// and exposes the model matrix the pass must push beforehand.
pub trait Drawable {
    fn draw(&self);
    fn model_matrix(&self) -> Mat4;
}

/// Batch draw capability of a model importer: draws every mesh it owns,
/// optionally culled against a light frustum.
pub trait BatchRenderer {
    fn multi_draw(&self, program: &mut ShaderProgram);
    fn multi_draw_culled(&self, program: &mut ShaderProgram, frustum_matrix: Mat4);
}

/// Forward renderer for the viewer: one program, one scene-wide light
/// buffer, shadow maps sampled bindlessly out of the packed light structs.
pub struct SceneRenderer {
    program: ShaderProgram,
    light_buffer: Buffer,
    light_count: i32,
}

impl SceneRenderer {
    pub fn new() -> Result<Self, RenderError> {
        unsafe {
            gl::Enable(gl::DEPTH_TEST);
            gl::Enable(gl::CULL_FACE);
            gl::ClearColor(CLEAR_COLOR.x, CLEAR_COLOR.y, CLEAR_COLOR.z, 1.0);
        }

        let program = ShaderProgram::from_sources(SCENE_VERT_SRC, SCENE_FRAG_SRC)?;
        let light_buffer = Buffer::new(gl::SHADER_STORAGE_BUFFER);

        Ok(Self {
            program,
            light_buffer,
            light_count: 0,
        })
    }

    /// Re-pack every light and upload the array. Call once at startup and
    /// again whenever the debug panel reports a change.
    pub fn upload_lights(&mut self, lights: &[Light]) {
        let packed: Vec<GpuLight> = lights.iter().map(Light::gpu_light).collect();
        self.light_buffer.set_storage(&packed, gl::DYNAMIC_DRAW);
        self.light_count = packed.len() as i32;
        gl_debug::check_gl_errors("light buffer upload");
    }

    pub fn draw_scene(&mut self, batch: &MeshBatch, view: &Mat4, proj: &Mat4, camera_pos: Vec3) {
        unsafe {
            gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);
        }

        self.program.bind();
        self.program.set_mat4("u_view", view);
        self.program.set_mat4("u_projection", proj);
        self.program.set_vec3("u_camera_pos", camera_pos);
        self.program.set_i32("u_light_count", self.light_count);
        self.light_buffer.bind_base(LIGHT_BUFFER_BINDING);

        for mesh in batch.meshes() {
            self.program.set_mat4("u_model", &mesh.model_matrix());
            mesh.draw();
        }
    }
}
