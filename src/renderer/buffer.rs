use bytemuck::Pod;
use gl::types::*;
use std::mem;

use crate::engine::window;

/// Owns a single GPU buffer handle. Deleting is skipped when no GL context
/// is current, so teardown after the window is gone stays a no-op.
pub struct Buffer {
    handle: GLuint,
    target: GLenum,
    len: usize,
    stride: usize,
}

impl Buffer {
    pub fn new(target: GLenum) -> Self {
        let mut handle = 0;
        unsafe {
            gl::GenBuffers(1, &mut handle);
        }
        Self {
            handle,
            target,
            len: 0,
            stride: 0,
        }
    }

    /// Upload a typed slice, replacing the buffer's storage. The element
    /// stride is recorded for vertex-array binding.
    pub fn set_storage<T: Pod>(&mut self, data: &[T], usage: GLenum) {
        unsafe {
            gl::BindBuffer(self.target, self.handle);
            gl::BufferData(
                self.target,
                mem::size_of_val(data) as GLsizeiptr,
                data.as_ptr() as *const _,
                usage,
            );
        }
        self.len = data.len();
        self.stride = mem::size_of::<T>();
    }

    pub fn bind(&self) {
        unsafe {
            gl::BindBuffer(self.target, self.handle);
        }
    }

    /// Bind to an indexed binding point (SSBO/UBO targets).
    pub fn bind_base(&self, binding: u32) {
        unsafe {
            gl::BindBufferBase(self.target, binding, self.handle);
        }
    }

    pub fn handle(&self) -> GLuint {
        self.handle
    }

    pub fn target(&self) -> GLenum {
        self.target
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn stride(&self) -> usize {
        self.stride
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if window::context_is_current() {
            unsafe {
                gl::DeleteBuffers(1, &self.handle);
            }
        }
    }
}
