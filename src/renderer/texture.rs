use std::os::raw::c_void;
use std::sync::OnceLock;

use gl::types::*;
use log::warn;

use crate::engine::window;

type GetTextureHandleFn = unsafe extern "system" fn(texture: GLuint) -> GLuint64;
type MakeTextureHandleResidentFn = unsafe extern "system" fn(handle: GLuint64);

#[derive(Clone, Copy)]
struct BindlessFns {
    get_texture_handle: GetTextureHandleFn,
    make_resident: MakeTextureHandleResidentFn,
}

static BINDLESS: OnceLock<Option<BindlessFns>> = OnceLock::new();

/// Resolve the ARB_bindless_texture entry points. Called once by the
/// window right after the core symbols are loaded; the `gl` crate does not
/// generate extension functions, so these come straight from the loader.
pub fn load_bindless_entry_points<F>(loader: F)
where
    F: Fn(&str) -> *const c_void,
{
    let _ = BINDLESS.set({
        let get = loader("glGetTextureHandleARB");
        let resident = loader("glMakeTextureHandleResidentARB");
        if get.is_null() || resident.is_null() {
            None
        } else {
            Some(BindlessFns {
                get_texture_handle: unsafe { std::mem::transmute(get) },
                make_resident: unsafe { std::mem::transmute(resident) },
            })
        }
    });
}

fn bindless_texture_handle(texture: GLuint) -> u64 {
    match BINDLESS.get().copied().flatten() {
        Some(fns) => unsafe {
            let handle = (fns.get_texture_handle)(texture);
            if handle != 0 {
                (fns.make_resident)(handle);
            }
            handle
        },
        None => {
            warn!("ARB_bindless_texture is unavailable; returning null shadow-map handle");
            0
        }
    }
}

/// Common capability of the depth image a light renders its shadow map
/// into: a flat texture for directional/spot lights, a cubemap for point
/// lights. Each instance is owned by exactly one light.
pub trait ShadowMapTarget {
    fn handle(&self) -> GLuint;
    /// Allocate an empty 32-bit float depth image at the given resolution.
    fn allocate_depth(&self, width: GLsizei, height: GLsizei);
    /// Attach the depth image to the currently bound framebuffer.
    fn attach_to_bound_framebuffer(&self);
    fn generate_mipmap(&self);
    fn bindless_handle(&self) -> u64;
    fn bind(&self, unit: u32);
}

pub struct Texture2d {
    handle: GLuint,
}

impl Texture2d {
    pub fn new(min_filter: GLenum, mag_filter: GLenum) -> Self {
        let mut handle = 0;
        unsafe {
            gl::GenTextures(1, &mut handle);
            gl::BindTexture(gl::TEXTURE_2D, handle);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, min_filter as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, mag_filter as GLint);
        }
        Self { handle }
    }

    pub fn set_wrap(&self, wrap_s: GLenum, wrap_t: GLenum) {
        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, self.handle);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, wrap_s as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, wrap_t as GLint);
        }
    }

    /// Sample as a comparison (shadow) sampler: depth-compare against the
    /// reference value, which gives hardware PCF on supporting drivers.
    pub fn enable_depth_compare(&self) {
        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, self.handle);
            gl::TexParameteri(
                gl::TEXTURE_2D,
                gl::TEXTURE_COMPARE_MODE,
                gl::COMPARE_REF_TO_TEXTURE as GLint,
            );
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_COMPARE_FUNC, gl::LEQUAL as GLint);
        }
    }
}

impl ShadowMapTarget for Texture2d {
    fn handle(&self) -> GLuint {
        self.handle
    }

    fn allocate_depth(&self, width: GLsizei, height: GLsizei) {
        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, self.handle);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::DEPTH_COMPONENT32F as GLint,
                width,
                height,
                0,
                gl::DEPTH_COMPONENT,
                gl::FLOAT,
                std::ptr::null(),
            );
        }
    }

    fn attach_to_bound_framebuffer(&self) {
        unsafe {
            gl::FramebufferTexture2D(
                gl::FRAMEBUFFER,
                gl::DEPTH_ATTACHMENT,
                gl::TEXTURE_2D,
                self.handle,
                0,
            );
        }
    }

    fn generate_mipmap(&self) {
        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, self.handle);
            gl::GenerateMipmap(gl::TEXTURE_2D);
        }
    }

    fn bindless_handle(&self) -> u64 {
        bindless_texture_handle(self.handle)
    }

    fn bind(&self, unit: u32) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit);
            gl::BindTexture(gl::TEXTURE_2D, self.handle);
        }
    }
}

impl Drop for Texture2d {
    fn drop(&mut self) {
        if window::context_is_current() {
            unsafe {
                gl::DeleteTextures(1, &self.handle);
            }
        }
    }
}

pub struct Cubemap {
    handle: GLuint,
}

impl Cubemap {
    pub fn new(min_filter: GLenum, mag_filter: GLenum) -> Self {
        let mut handle = 0;
        unsafe {
            gl::GenTextures(1, &mut handle);
            gl::BindTexture(gl::TEXTURE_CUBE_MAP, handle);
            gl::TexParameteri(
                gl::TEXTURE_CUBE_MAP,
                gl::TEXTURE_MIN_FILTER,
                min_filter as GLint,
            );
            gl::TexParameteri(
                gl::TEXTURE_CUBE_MAP,
                gl::TEXTURE_MAG_FILTER,
                mag_filter as GLint,
            );
            gl::TexParameteri(
                gl::TEXTURE_CUBE_MAP,
                gl::TEXTURE_WRAP_S,
                gl::CLAMP_TO_EDGE as GLint,
            );
            gl::TexParameteri(
                gl::TEXTURE_CUBE_MAP,
                gl::TEXTURE_WRAP_T,
                gl::CLAMP_TO_EDGE as GLint,
            );
            gl::TexParameteri(
                gl::TEXTURE_CUBE_MAP,
                gl::TEXTURE_WRAP_R,
                gl::CLAMP_TO_EDGE as GLint,
            );
        }
        Self { handle }
    }
}

impl ShadowMapTarget for Cubemap {
    fn handle(&self) -> GLuint {
        self.handle
    }

    fn allocate_depth(&self, width: GLsizei, height: GLsizei) {
        unsafe {
            gl::BindTexture(gl::TEXTURE_CUBE_MAP, self.handle);
            for face in 0..6 {
                gl::TexImage2D(
                    gl::TEXTURE_CUBE_MAP_POSITIVE_X + face,
                    0,
                    gl::DEPTH_COMPONENT32F as GLint,
                    width,
                    height,
                    0,
                    gl::DEPTH_COMPONENT,
                    gl::FLOAT,
                    std::ptr::null(),
                );
            }
        }
    }

    fn attach_to_bound_framebuffer(&self) {
        // layered attachment: the geometry shader selects the face
        unsafe {
            gl::FramebufferTexture(gl::FRAMEBUFFER, gl::DEPTH_ATTACHMENT, self.handle, 0);
        }
    }

    fn generate_mipmap(&self) {
        unsafe {
            gl::BindTexture(gl::TEXTURE_CUBE_MAP, self.handle);
            gl::GenerateMipmap(gl::TEXTURE_CUBE_MAP);
        }
    }

    fn bindless_handle(&self) -> u64 {
        bindless_texture_handle(self.handle)
    }

    fn bind(&self, unit: u32) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit);
            gl::BindTexture(gl::TEXTURE_CUBE_MAP, self.handle);
        }
    }
}

impl Drop for Cubemap {
    fn drop(&mut self) {
        if window::context_is_current() {
            unsafe {
                gl::DeleteTextures(1, &self.handle);
            }
        }
    }
}
