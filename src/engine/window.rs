use std::ffi::CStr;
use std::os::raw::c_void;
use std::sync::atomic::{AtomicBool, Ordering};

use gl::types::*;
use log::{debug, error, info, warn};
use sdl2::video::{GLContext, GLProfile, SwapInterval, Window};
use sdl2::Sdl;

use crate::renderer::texture;

/// Whether a GL context is live. GPU resource destructors consult this so
/// that teardown after the context is gone becomes a no-op instead of a
/// call into a dead driver.
static CONTEXT_ALIVE: AtomicBool = AtomicBool::new(false);

pub fn context_is_current() -> bool {
    CONTEXT_ALIVE.load(Ordering::Acquire)
}

pub struct ViewerWindow {
    _gl_context: GLContext,
    window: Window,
}

impl ViewerWindow {
    pub fn new(sdl: &Sdl, title: &str, width: u32, height: u32) -> Self {
        let video = sdl.video().expect("Failed to init SDL2 video");

        let gl_attr = video.gl_attr();
        gl_attr.set_context_profile(GLProfile::Core);
        gl_attr.set_context_version(4, 5);
        if cfg!(debug_assertions) {
            gl_attr.set_context_flags().debug().set();
        }

        let window = video
            .window(title, width, height)
            .opengl()
            .position_centered()
            .build()
            .expect("Failed to create window");

        let gl_context = window
            .gl_create_context()
            .expect("Failed to create GL context");

        gl::load_with(|s| video.gl_get_proc_address(s) as *const _);
        texture::load_bindless_entry_points(|s| video.gl_get_proc_address(s) as *const c_void);

        CONTEXT_ALIVE.store(true, Ordering::Release);

        log_gl_info();
        if cfg!(debug_assertions) {
            install_debug_callback();
        }

        Self {
            _gl_context: gl_context,
            window,
        }
    }

    pub fn swap(&self) {
        self.window.gl_swap_window();
    }

    pub fn size(&self) -> (u32, u32) {
        self.window.size()
    }

    pub fn aspect_ratio(&self) -> f32 {
        let (w, h) = self.window.size();
        w as f32 / h as f32
    }

    pub fn set_vsync(&self, enabled: bool) {
        let interval = if enabled {
            SwapInterval::VSync
        } else {
            SwapInterval::Immediate
        };
        if let Err(err) = self.window.subsystem().gl_set_swap_interval(interval) {
            warn!("could not set swap interval: {err}");
        }
    }

    pub fn extensions(&self) -> Vec<String> {
        let mut count: GLint = 0;
        unsafe {
            gl::GetIntegerv(gl::NUM_EXTENSIONS, &mut count);
        }
        (0..count as GLuint)
            .filter_map(|i| {
                let ptr = unsafe { gl::GetStringi(gl::EXTENSIONS, i) };
                if ptr.is_null() {
                    None
                } else {
                    Some(
                        unsafe { CStr::from_ptr(ptr as *const _) }
                            .to_string_lossy()
                            .into_owned(),
                    )
                }
            })
            .collect()
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions().iter().any(|e| e == name)
    }
}

impl Drop for ViewerWindow {
    fn drop(&mut self) {
        CONTEXT_ALIVE.store(false, Ordering::Release);
    }
}

fn gl_string(name: GLenum) -> String {
    let ptr = unsafe { gl::GetString(name) };
    if ptr.is_null() {
        return String::from("<unavailable>");
    }
    unsafe { CStr::from_ptr(ptr as *const _) }
        .to_string_lossy()
        .into_owned()
}

fn log_gl_info() {
    info!("renderer: {}", gl_string(gl::RENDERER));
    info!("vendor: {}", gl_string(gl::VENDOR));
    info!("version: {}", gl_string(gl::VERSION));
    info!("GLSL version: {}", gl_string(gl::SHADING_LANGUAGE_VERSION));
}

extern "system" fn debug_callback(
    _source: GLenum,
    _gltype: GLenum,
    id: GLuint,
    severity: GLenum,
    _length: GLsizei,
    message: *const GLchar,
    _user_param: *mut c_void,
) {
    // 131204: "texture has no base level" spam from unbound texture units
    if id == 131_204 {
        return;
    }
    let message = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    match severity {
        gl::DEBUG_SEVERITY_HIGH => error!("GL [{id}]: {message}"),
        gl::DEBUG_SEVERITY_MEDIUM => warn!("GL [{id}]: {message}"),
        _ => debug!("GL [{id}]: {message}"),
    }
}

fn install_debug_callback() {
    unsafe {
        gl::Enable(gl::DEBUG_OUTPUT);
        gl::Enable(gl::DEBUG_OUTPUT_SYNCHRONOUS);
        gl::DebugMessageCallback(debug_callback, std::ptr::null());

        // drop notification and low severity noise, keep the rest
        gl::DebugMessageControl(
            gl::DONT_CARE,
            gl::DONT_CARE,
            gl::DEBUG_SEVERITY_NOTIFICATION,
            0,
            std::ptr::null(),
            gl::FALSE,
        );
        gl::DebugMessageControl(
            gl::DONT_CARE,
            gl::DONT_CARE,
            gl::DEBUG_SEVERITY_LOW,
            0,
            std::ptr::null(),
            gl::FALSE,
        );
    }
}
