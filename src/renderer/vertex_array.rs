use gl::types::*;

use crate::engine::window;
use crate::renderer::buffer::Buffer;
use crate::renderer::RenderError;

/// Shader input slots shared by every program in the crate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u32)]
pub enum AttributeLocation {
    Position = 0,
    Normal = 1,
    TexCoord = 2,
}

pub struct VertexArray {
    handle: GLuint,
}

impl VertexArray {
    pub fn new() -> Self {
        let mut handle = 0;
        unsafe {
            gl::GenVertexArrays(1, &mut handle);
        }
        Self { handle }
    }

    pub fn bind(&self) {
        unsafe {
            gl::BindVertexArray(self.handle);
        }
    }

    /// Bind a tightly packed float attribute buffer to one of the fixed
    /// input slots. `components` is the per-vertex component count (3 for
    /// vec3 attributes).
    pub fn connect_buffer(
        &self,
        buffer: &Buffer,
        location: AttributeLocation,
        components: GLint,
    ) -> Result<(), RenderError> {
        let stride = GLsizei::try_from(buffer.stride())
            .map_err(|_| RenderError::StrideTooLarge {
                stride: buffer.stride(),
            })?;

        let index = location as GLuint;
        unsafe {
            gl::BindVertexArray(self.handle);
            buffer.bind();
            gl::EnableVertexAttribArray(index);
            gl::VertexAttribPointer(
                index,
                components,
                gl::FLOAT,
                gl::FALSE,
                stride,
                std::ptr::null(),
            );
            gl::BindVertexArray(0);
        }
        Ok(())
    }

    /// Attach the element buffer. Only buffers created with the
    /// element-array target are accepted.
    pub fn connect_index_buffer(&self, buffer: &Buffer) -> Result<(), RenderError> {
        if buffer.target() != gl::ELEMENT_ARRAY_BUFFER {
            return Err(RenderError::NotAnIndexBuffer);
        }
        unsafe {
            gl::BindVertexArray(self.handle);
            buffer.bind();
            gl::BindVertexArray(0);
        }
        Ok(())
    }

    pub fn handle(&self) -> GLuint {
        self.handle
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        if window::context_is_current() {
            unsafe {
                gl::DeleteVertexArrays(1, &self.handle);
            }
        }
    }
}
