use gl::types::*;
use glam::{Mat4, Vec3};
use std::mem;
use std::ptr;

use crate::engine::window;
use crate::renderer::shader::ShaderProgram;

const TEXT_VERT_SRC: &str = include_str!("../../shaders/text.vert");
const TEXT_FRAG_SRC: &str = include_str!("../../shaders/text.frag");

/// Glyph cell size in the atlas, pixels.
pub const GLYPH_SIZE: f32 = 8.0;

const MAX_CHARS: usize = 256;
const FLOATS_PER_CHAR: usize = 6 * 4; // two triangles, (x, y, u, v)

/// 8x8 bitmap glyphs for ASCII 32..=95 (uppercase-only). Row 0 is the top
/// of the glyph; bit 0 of each row byte is the leftmost pixel.
#[rustfmt::skip]
const FONT_8X8: [[u8; 8]; 64] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x18, 0x3C, 0x3C, 0x18, 0x18, 0x00, 0x18, 0x00], // '!'
    [0x36, 0x36, 0x12, 0x00, 0x00, 0x00, 0x00, 0x00], // '"'
    [0x36, 0x36, 0x7F, 0x36, 0x7F, 0x36, 0x36, 0x00], // '#'
    [0x0C, 0x3E, 0x03, 0x1E, 0x30, 0x1F, 0x0C, 0x00], // '$'
    [0x00, 0x63, 0x33, 0x18, 0x0C, 0x66, 0x63, 0x00], // '%'
    [0x1C, 0x36, 0x1C, 0x6E, 0x3B, 0x33, 0x6E, 0x00], // '&'
    [0x0C, 0x0C, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00], // '\''
    [0x18, 0x0C, 0x06, 0x06, 0x06, 0x0C, 0x18, 0x00], // '('
    [0x06, 0x0C, 0x18, 0x18, 0x18, 0x0C, 0x06, 0x00], // ')'
    [0x00, 0x66, 0x3C, 0xFF, 0x3C, 0x66, 0x00, 0x00], // '*'
    [0x00, 0x0C, 0x0C, 0x3F, 0x0C, 0x0C, 0x00, 0x00], // '+'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x06], // ','
    [0x00, 0x00, 0x00, 0x3F, 0x00, 0x00, 0x00, 0x00], // '-'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x00], // '.'
    [0x60, 0x30, 0x18, 0x0C, 0x06, 0x03, 0x01, 0x00], // '/'
    [0x3E, 0x63, 0x73, 0x7B, 0x6F, 0x67, 0x3E, 0x00], // '0'
    [0x0C, 0x0E, 0x0C, 0x0C, 0x0C, 0x0C, 0x3F, 0x00], // '1'
    [0x1E, 0x33, 0x30, 0x1C, 0x06, 0x33, 0x3F, 0x00], // '2'
    [0x1E, 0x33, 0x30, 0x1C, 0x30, 0x33, 0x1E, 0x00], // '3'
    [0x38, 0x3C, 0x36, 0x33, 0x7F, 0x30, 0x78, 0x00], // '4'
    [0x3F, 0x03, 0x1F, 0x30, 0x30, 0x33, 0x1E, 0x00], // '5'
    [0x1C, 0x06, 0x03, 0x1F, 0x33, 0x33, 0x1E, 0x00], // '6'
    [0x3F, 0x33, 0x30, 0x18, 0x0C, 0x0C, 0x0C, 0x00], // '7'
    [0x1E, 0x33, 0x33, 0x1E, 0x33, 0x33, 0x1E, 0x00], // '8'
    [0x1E, 0x33, 0x33, 0x3E, 0x30, 0x18, 0x0E, 0x00], // '9'
    [0x00, 0x0C, 0x0C, 0x00, 0x00, 0x0C, 0x0C, 0x00], // ':'
    [0x00, 0x0C, 0x0C, 0x00, 0x00, 0x0C, 0x0C, 0x06], // ';'
    [0x18, 0x0C, 0x06, 0x03, 0x06, 0x0C, 0x18, 0x00], // '<'
    [0x00, 0x00, 0x3F, 0x00, 0x00, 0x3F, 0x00, 0x00], // '='
    [0x06, 0x0C, 0x18, 0x30, 0x18, 0x0C, 0x06, 0x00], // '>'
    [0x1E, 0x33, 0x30, 0x18, 0x0C, 0x00, 0x0C, 0x00], // '?'
    [0x3E, 0x63, 0x7B, 0x7B, 0x7B, 0x03, 0x1E, 0x00], // '@'
    [0x0C, 0x1E, 0x33, 0x33, 0x3F, 0x33, 0x33, 0x00], // 'A'
    [0x3F, 0x66, 0x66, 0x3E, 0x66, 0x66, 0x3F, 0x00], // 'B'
    [0x3C, 0x66, 0x03, 0x03, 0x03, 0x66, 0x3C, 0x00], // 'C'
    [0x1F, 0x36, 0x66, 0x66, 0x66, 0x36, 0x1F, 0x00], // 'D'
    [0x7F, 0x46, 0x16, 0x1E, 0x16, 0x46, 0x7F, 0x00], // 'E'
    [0x7F, 0x46, 0x16, 0x1E, 0x16, 0x06, 0x0F, 0x00], // 'F'
    [0x3C, 0x66, 0x03, 0x03, 0x73, 0x66, 0x7C, 0x00], // 'G'
    [0x33, 0x33, 0x33, 0x3F, 0x33, 0x33, 0x33, 0x00], // 'H'
    [0x1E, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // 'I'
    [0x78, 0x30, 0x30, 0x30, 0x33, 0x33, 0x1E, 0x00], // 'J'
    [0x67, 0x66, 0x36, 0x1E, 0x36, 0x66, 0x67, 0x00], // 'K'
    [0x0F, 0x06, 0x06, 0x06, 0x46, 0x66, 0x7F, 0x00], // 'L'
    [0x63, 0x77, 0x7F, 0x7F, 0x6B, 0x63, 0x63, 0x00], // 'M'
    [0x63, 0x67, 0x6F, 0x7B, 0x73, 0x63, 0x63, 0x00], // 'N'
    [0x1C, 0x36, 0x63, 0x63, 0x63, 0x36, 0x1C, 0x00], // 'O'
    [0x3F, 0x66, 0x66, 0x3E, 0x06, 0x06, 0x0F, 0x00], // 'P'
    [0x1E, 0x33, 0x33, 0x33, 0x3B, 0x1E, 0x38, 0x00], // 'Q'
    [0x3F, 0x66, 0x66, 0x3E, 0x36, 0x66, 0x67, 0x00], // 'R'
    [0x1E, 0x33, 0x07, 0x0E, 0x38, 0x33, 0x1E, 0x00], // 'S'
    [0x3F, 0x2D, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // 'T'
    [0x33, 0x33, 0x33, 0x33, 0x33, 0x33, 0x3F, 0x00], // 'U'
    [0x33, 0x33, 0x33, 0x33, 0x33, 0x1E, 0x0C, 0x00], // 'V'
    [0x63, 0x63, 0x63, 0x6B, 0x7F, 0x77, 0x63, 0x00], // 'W'
    [0x63, 0x63, 0x36, 0x1C, 0x1C, 0x36, 0x63, 0x00], // 'X'
    [0x33, 0x33, 0x33, 0x1E, 0x0C, 0x0C, 0x1E, 0x00], // 'Y'
    [0x7F, 0x63, 0x31, 0x18, 0x4C, 0x66, 0x7F, 0x00], // 'Z'
    [0x1E, 0x06, 0x06, 0x06, 0x06, 0x06, 0x1E, 0x00], // '['
    [0x03, 0x06, 0x0C, 0x18, 0x30, 0x60, 0x40, 0x00], // '\\'
    [0x1E, 0x18, 0x18, 0x18, 0x18, 0x18, 0x1E, 0x00], // ']'
    [0x08, 0x1C, 0x36, 0x63, 0x00, 0x00, 0x00, 0x00], // '^'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF], // '_'
];

const ATLAS_WIDTH: usize = 8;
const ATLAS_HEIGHT: usize = FONT_8X8.len() * 8;

/// Screen-space bitmap text. One atlas texture, one dynamic quad buffer,
/// one draw call per string. Lowercase input is uppercased; glyphs outside
/// the table render as '?'.
pub struct TextRenderer {
    shader: ShaderProgram,
    vao: GLuint,
    vbo: GLuint,
    font_texture: GLuint,
}

impl TextRenderer {
    pub fn new() -> Self {
        let shader = ShaderProgram::from_sources(TEXT_VERT_SRC, TEXT_FRAG_SRC)
            .expect("Failed to compile text shaders");

        let mut vao: GLuint = 0;
        let mut vbo: GLuint = 0;
        unsafe {
            gl::GenVertexArrays(1, &mut vao);
            gl::GenBuffers(1, &mut vbo);

            gl::BindVertexArray(vao);
            gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                (MAX_CHARS * FLOATS_PER_CHAR * mem::size_of::<f32>()) as GLsizeiptr,
                ptr::null(),
                gl::DYNAMIC_DRAW,
            );

            let stride = (4 * mem::size_of::<f32>()) as GLsizei;
            gl::EnableVertexAttribArray(0);
            gl::VertexAttribPointer(0, 2, gl::FLOAT, gl::FALSE, stride, ptr::null());
            gl::EnableVertexAttribArray(1);
            gl::VertexAttribPointer(
                1,
                2,
                gl::FLOAT,
                gl::FALSE,
                stride,
                (2 * mem::size_of::<f32>()) as *const _,
            );
            gl::BindVertexArray(0);
        }

        let font_texture = upload_font_atlas();

        Self {
            shader,
            vao,
            vbo,
            font_texture,
        }
    }

    pub fn measure_text(&self, text: &str, scale: f32) -> f32 {
        text.chars().count() as f32 * GLYPH_SIZE * scale
    }

    /// Caller is responsible for blend/depth state and the UI projection.
    pub fn draw_text(&mut self, text: &str, x: f32, y: f32, scale: f32, color: Vec3, projection: &Mat4) {
        let mut vertices: Vec<f32> = Vec::with_capacity(text.len().min(MAX_CHARS) * FLOATS_PER_CHAR);
        let mut pen_x = x;
        let size = GLYPH_SIZE * scale;

        for c in text.chars().take(MAX_CHARS) {
            let index = glyph_index(c);
            let v0 = (index * 8) as f32 / ATLAS_HEIGHT as f32;
            let v1 = ((index + 1) * 8) as f32 / ATLAS_HEIGHT as f32;

            let (x0, y0, x1, y1) = (pen_x, y, pen_x + size, y + size);
            #[rustfmt::skip]
            vertices.extend_from_slice(&[
                x0, y0, 0.0, v0,
                x1, y0, 1.0, v0,
                x1, y1, 1.0, v1,
                x0, y0, 0.0, v0,
                x1, y1, 1.0, v1,
                x0, y1, 0.0, v1,
            ]);
            pen_x += size;
        }

        if vertices.is_empty() {
            return;
        }

        self.shader.bind();
        self.shader.set_mat4("u_projection", projection);
        self.shader.set_vec3("u_color", color);
        self.shader.set_i32("u_font", 0);

        unsafe {
            gl::ActiveTexture(gl::TEXTURE0);
            gl::BindTexture(gl::TEXTURE_2D, self.font_texture);

            gl::BindVertexArray(self.vao);
            gl::BindBuffer(gl::ARRAY_BUFFER, self.vbo);
            gl::BufferSubData(
                gl::ARRAY_BUFFER,
                0,
                mem::size_of_val(vertices.as_slice()) as GLsizeiptr,
                vertices.as_ptr() as *const _,
            );
            gl::DrawArrays(gl::TRIANGLES, 0, (vertices.len() / 4) as GLsizei);
            gl::BindVertexArray(0);
        }
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TextRenderer {
    fn drop(&mut self) {
        if window::context_is_current() {
            unsafe {
                gl::DeleteVertexArrays(1, &self.vao);
                gl::DeleteBuffers(1, &self.vbo);
                gl::DeleteTextures(1, &self.font_texture);
            }
        }
    }
}

fn glyph_index(c: char) -> usize {
    let c = c.to_ascii_uppercase();
    let code = c as u32;
    if (32..=95).contains(&code) {
        (code - 32) as usize
    } else {
        ('?' as u32 - 32) as usize
    }
}

fn upload_font_atlas() -> GLuint {
    let mut pixels = vec![0u8; ATLAS_WIDTH * ATLAS_HEIGHT];
    for (glyph, rows) in FONT_8X8.iter().enumerate() {
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..8 {
                if bits & (1 << col) != 0 {
                    pixels[(glyph * 8 + row) * ATLAS_WIDTH + col] = 0xFF;
                }
            }
        }
    }

    let mut texture: GLuint = 0;
    unsafe {
        gl::GenTextures(1, &mut texture);
        gl::BindTexture(gl::TEXTURE_2D, texture);
        gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
        gl::TexImage2D(
            gl::TEXTURE_2D,
            0,
            gl::R8 as GLint,
            ATLAS_WIDTH as GLsizei,
            ATLAS_HEIGHT as GLsizei,
            0,
            gl::RED,
            gl::UNSIGNED_BYTE,
            pixels.as_ptr() as *const _,
        );
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::NEAREST as GLint);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::NEAREST as GLint);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint);
    }
    texture
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_lookup_covers_table_and_falls_back() {
        assert_eq!(glyph_index(' '), 0);
        assert_eq!(glyph_index('0'), 16);
        assert_eq!(glyph_index('A'), 33);
        assert_eq!(glyph_index('a'), 33, "lowercase maps onto uppercase");
        assert_eq!(glyph_index('~'), glyph_index('?'));
    }
}
