use log::error;

use crate::engine::window;

/// Drain the GL error queue and log every entry with the given scope.
/// Debug builds only; errors are observable but never fatal.
pub fn check_gl_errors(scope: &str) {
    if !cfg!(debug_assertions) {
        return;
    }
    if !window::context_is_current() {
        return;
    }
    loop {
        let err = unsafe { gl::GetError() };
        if err == gl::NO_ERROR {
            break;
        }
        error!("GL error {err:#06x} after {scope}");
    }
}
