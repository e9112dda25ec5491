//! OpenGL Shaders
//!
//! This module defines the [`Shader`] and [`ShaderProgram`] structs for
//! compiling and linking the GLSL used by the viewer.

use std::sync::Arc;

use glow::HasContext;

/// Represents an individual OpenGL shader.
pub struct Shader {
    gl: Arc<glow::Context>,
    id: glow::Shader,
    _shader_type: u32,
}

impl Shader {
    /// Compiles a new shader from the given source code.
    pub fn new(gl: &Arc<glow::Context>, shader_type: u32, source: &str) -> Result<Self, String> {
        unsafe {
            let shader = gl.create_shader(shader_type).map_err(|e| e.to_string())?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);

            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(log);
            }

            Ok(Self {
                gl: Arc::clone(gl),
                id: shader,
                _shader_type: shader_type,
            })
        }
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_shader(self.id);
        }
    }
}

/// Represents a linked shader program.
pub struct ShaderProgram {
    gl: Arc<glow::Context>,
    id: glow::Program,
}

impl ShaderProgram {
    /// Links a new shader program from the given shaders.
    pub fn new(gl: &Arc<glow::Context>, shaders: &[&Shader]) -> Result<Self, String> {
        unsafe {
            let program = gl.create_program().map_err(|e| e.to_string())?;

            for shader in shaders {
                gl.attach_shader(program, shader.id);
            }

            gl.link_program(program);

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(log);
            }

            for shader in shaders {
                gl.detach_shader(program, shader.id);
            }

            Ok(Self {
                gl: Arc::clone(gl),
                id: program,
            })
        }
    }

    /// Binds the shader program for use.
    pub fn use_program(&self) {
        unsafe {
            self.gl.use_program(Some(self.id));
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_program(self.id);
        }
    }
}
