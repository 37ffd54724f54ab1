use gl::types::*;

use crate::engine::window;
use crate::renderer::texture::ShadowMapTarget;
use crate::renderer::RenderError;

/// Offscreen render target. The only constructor the light system needs is
/// the depth-only one: color writes are disabled and the target's depth
/// image is the sole attachment.
pub struct FrameBuffer {
    handle: GLuint,
}

impl FrameBuffer {
    pub fn for_depth_target(target: &dyn ShadowMapTarget) -> Result<Self, RenderError> {
        let mut handle = 0;
        unsafe {
            gl::GenFramebuffers(1, &mut handle);
            gl::BindFramebuffer(gl::FRAMEBUFFER, handle);
        }
        target.attach_to_bound_framebuffer();
        unsafe {
            gl::DrawBuffer(gl::NONE);
            gl::ReadBuffer(gl::NONE);
        }

        let status = unsafe { gl::CheckFramebufferStatus(gl::FRAMEBUFFER) };
        unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        }
        if status != gl::FRAMEBUFFER_COMPLETE {
            unsafe {
                gl::DeleteFramebuffers(1, &handle);
            }
            return Err(RenderError::FramebufferIncomplete { status });
        }

        Ok(Self { handle })
    }

    pub fn bind(&self) {
        unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, self.handle);
        }
    }

    pub fn unbind(&self) {
        unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        }
    }

    pub fn handle(&self) -> GLuint {
        self.handle
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        if window::context_is_current() {
            unsafe {
                gl::DeleteFramebuffers(1, &self.handle);
            }
        }
    }
}
