use gl::types::*;
use glam::{Mat4, Vec3};
use std::collections::HashMap;
use std::ffi::CString;
use std::ptr;

use crate::engine::window;
use crate::renderer::RenderError;

pub struct ShaderProgram {
    id: GLuint,
    uniform_cache: HashMap<String, GLint>,
}

impl ShaderProgram {
    pub fn from_sources(vert_src: &str, frag_src: &str) -> Result<Self, RenderError> {
        let vert = compile_shader(vert_src, gl::VERTEX_SHADER)?;
        let frag = compile_shader(frag_src, gl::FRAGMENT_SHADER);
        let frag = match frag {
            Ok(frag) => frag,
            Err(err) => {
                unsafe { gl::DeleteShader(vert) };
                return Err(err);
            }
        };
        link_program(&[vert, frag])
    }

    /// Three-stage variant; the point-light shadow program needs a
    /// geometry stage to fan one draw out to all six cube faces.
    pub fn with_geometry(
        vert_src: &str,
        geom_src: &str,
        frag_src: &str,
    ) -> Result<Self, RenderError> {
        let mut stages = Vec::with_capacity(3);
        for (src, kind) in [
            (vert_src, gl::VERTEX_SHADER),
            (geom_src, gl::GEOMETRY_SHADER),
            (frag_src, gl::FRAGMENT_SHADER),
        ] {
            match compile_shader(src, kind) {
                Ok(stage) => stages.push(stage),
                Err(err) => {
                    for stage in stages {
                        unsafe { gl::DeleteShader(stage) };
                    }
                    return Err(err);
                }
            }
        }
        link_program(&stages)
    }

    pub fn bind(&self) {
        unsafe {
            gl::UseProgram(self.id);
        }
    }

    pub fn id(&self) -> GLuint {
        self.id
    }

    fn uniform_location(&mut self, name: &str) -> GLint {
        if let Some(&loc) = self.uniform_cache.get(name) {
            return loc;
        }
        let cname = CString::new(name).expect("uniform name contains a NUL byte");
        let loc = unsafe { gl::GetUniformLocation(self.id, cname.as_ptr()) };
        self.uniform_cache.insert(name.to_string(), loc);
        loc
    }

    pub fn set_mat4(&mut self, name: &str, mat: &Mat4) {
        let loc = self.uniform_location(name);
        unsafe {
            gl::UniformMatrix4fv(loc, 1, gl::FALSE, mat.to_cols_array().as_ptr());
        }
    }

    pub fn set_vec3(&mut self, name: &str, v: Vec3) {
        let loc = self.uniform_location(name);
        unsafe {
            gl::Uniform3f(loc, v.x, v.y, v.z);
        }
    }

    pub fn set_f32(&mut self, name: &str, val: f32) {
        let loc = self.uniform_location(name);
        unsafe {
            gl::Uniform1f(loc, val);
        }
    }

    pub fn set_i32(&mut self, name: &str, val: i32) {
        let loc = self.uniform_location(name);
        unsafe {
            gl::Uniform1i(loc, val);
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if window::context_is_current() {
            unsafe {
                gl::DeleteProgram(self.id);
            }
        }
    }
}

fn link_program(stages: &[GLuint]) -> Result<ShaderProgram, RenderError> {
    unsafe {
        let program = gl::CreateProgram();
        for &stage in stages {
            gl::AttachShader(program, stage);
        }
        gl::LinkProgram(program);

        let mut success = 0;
        gl::GetProgramiv(program, gl::LINK_STATUS, &mut success);
        let result = if success == 0 {
            let mut len = 0;
            gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
            let mut buf = vec![0u8; len.max(1) as usize];
            gl::GetProgramInfoLog(program, len, ptr::null_mut(), buf.as_mut_ptr() as *mut _);
            buf.pop(); // null terminator
            gl::DeleteProgram(program);
            Err(RenderError::ProgramLink {
                info_log: String::from_utf8_lossy(&buf).to_string(),
            })
        } else {
            Ok(ShaderProgram {
                id: program,
                uniform_cache: HashMap::new(),
            })
        };

        for &stage in stages {
            gl::DeleteShader(stage);
        }
        result
    }
}

fn compile_shader(src: &str, shader_type: GLenum) -> Result<GLuint, RenderError> {
    unsafe {
        let shader = gl::CreateShader(shader_type);
        let c_src = CString::new(src).expect("shader source contains a NUL byte");
        gl::ShaderSource(shader, 1, &c_src.as_ptr(), ptr::null());
        gl::CompileShader(shader);

        let mut success = 0;
        gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut success);
        if success == 0 {
            let mut len = 0;
            gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
            let mut buf = vec![0u8; len.max(1) as usize];
            gl::GetShaderInfoLog(shader, len, ptr::null_mut(), buf.as_mut_ptr() as *mut _);
            buf.pop();
            gl::DeleteShader(shader);
            let stage = match shader_type {
                gl::VERTEX_SHADER => "vertex",
                gl::GEOMETRY_SHADER => "geometry",
                _ => "fragment",
            };
            return Err(RenderError::ShaderCompile {
                stage,
                info_log: String::from_utf8_lossy(&buf).to_string(),
            });
        }
        Ok(shader)
    }
}
