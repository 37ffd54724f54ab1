use gl::types::*;
use glam::{Mat4, Vec3};
use rayon::prelude::*;
use std::f32::consts::PI;
use std::ptr;
use thiserror::Error;

use crate::engine::gl_debug;
use crate::renderer::bounds::BoundingBox;
use crate::renderer::buffer::Buffer;
use crate::renderer::vertex_array::{AttributeLocation, VertexArray};
use crate::renderer::Drawable;

/// Mesh record as delivered by an importer: raw attribute arrays plus a
/// triangulated face list and an index into the external material table.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 3]>,
    pub triangles: Vec<[u32; 3]>,
    pub material_index: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("mesh has no normals")]
    MissingNormals,
    #[error("mesh has no faces")]
    MissingFaces,
    #[error("attribute count mismatch: {positions} positions vs {attributes} {name}")]
    AttributeCountMismatch {
        name: &'static str,
        positions: usize,
        attributes: usize,
    },
}

/// Geometry resource: CPU-side attribute arrays plus their GPU mirrors.
/// Construction is the only place geometry is established, so the bounding
/// box is always in sync with the vertex data.
pub struct Mesh {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    tex_coords: Vec<Vec3>,
    indices: Vec<u32>,
    vertex_buffer: Buffer,
    normal_buffer: Buffer,
    tex_coord_buffer: Buffer,
    index_buffer: Buffer,
    vao: VertexArray,
    bounding_box: BoundingBox,
    material_index: u32,
    model_matrix: Mat4,
    enabled_for_rendering: bool,
}

impl Mesh {
    /// Build from an imported record. Normals and faces are mandatory;
    /// texture coordinates default to zero when the importer had none.
    pub fn from_data(data: &MeshData) -> Result<Self, MeshError> {
        validate(data)?;

        let vertices = extract_vec3s(&data.positions);
        let normals = extract_vec3s(&data.normals);
        let tex_coords = if data.tex_coords.is_empty() {
            vec![Vec3::ZERO; vertices.len()]
        } else {
            extract_vec3s(&data.tex_coords)
        };
        let indices = flatten_triangles(&data.triangles);

        Self::upload(vertices, normals, tex_coords, indices, data.material_index)
    }

    /// Build from raw attribute arrays, for procedurally generated
    /// geometry that never went through an importer.
    pub fn from_arrays(
        vertices: Vec<Vec3>,
        normals: Vec<Vec3>,
        indices: Vec<u32>,
    ) -> Result<Self, MeshError> {
        if normals.is_empty() {
            return Err(MeshError::MissingNormals);
        }
        if indices.is_empty() {
            return Err(MeshError::MissingFaces);
        }
        if normals.len() != vertices.len() {
            return Err(MeshError::AttributeCountMismatch {
                name: "normals",
                positions: vertices.len(),
                attributes: normals.len(),
            });
        }
        let tex_coords = vec![Vec3::ZERO; vertices.len()];
        Self::upload(vertices, normals, tex_coords, indices, 0)
    }

    fn upload(
        vertices: Vec<Vec3>,
        normals: Vec<Vec3>,
        tex_coords: Vec<Vec3>,
        indices: Vec<u32>,
        material_index: u32,
    ) -> Result<Self, MeshError> {
        let mut vertex_buffer = Buffer::new(gl::ARRAY_BUFFER);
        let mut normal_buffer = Buffer::new(gl::ARRAY_BUFFER);
        let mut tex_coord_buffer = Buffer::new(gl::ARRAY_BUFFER);
        let mut index_buffer = Buffer::new(gl::ELEMENT_ARRAY_BUFFER);
        let vao = VertexArray::new();

        vertex_buffer.set_storage(&vertices, gl::STATIC_DRAW);
        normal_buffer.set_storage(&normals, gl::STATIC_DRAW);
        tex_coord_buffer.set_storage(&tex_coords, gl::STATIC_DRAW);
        index_buffer.set_storage(&indices, gl::STATIC_DRAW);

        connect(&vao, &vertex_buffer, AttributeLocation::Position);
        connect(&vao, &normal_buffer, AttributeLocation::Normal);
        connect(&vao, &tex_coord_buffer, AttributeLocation::TexCoord);
        vao.connect_index_buffer(&index_buffer)
            .expect("index buffer created with the element-array target");

        gl_debug::check_gl_errors("mesh upload");

        let bounding_box = BoundingBox::from_points(&vertices);

        Ok(Self {
            vertices,
            normals,
            tex_coords,
            indices,
            vertex_buffer,
            normal_buffer,
            tex_coord_buffer,
            index_buffer,
            vao,
            bounding_box,
            material_index,
            model_matrix: Mat4::IDENTITY,
            enabled_for_rendering: true,
        })
    }

    /// Draw unless the mesh has been excluded from rendering. Issues zero
    /// GL calls when disabled.
    pub fn draw(&self) {
        if self.enabled_for_rendering {
            self.force_draw();
        }
    }

    pub fn force_draw(&self) {
        self.vao.bind();
        unsafe {
            gl::DrawElements(
                gl::TRIANGLES,
                self.indices.len() as GLsizei,
                gl::UNSIGNED_INT,
                ptr::null(),
            );
            gl::BindVertexArray(0);
        }
    }

    pub fn set_enabled_for_rendering(&mut self, enabled: bool) {
        self.enabled_for_rendering = enabled;
    }

    pub fn is_enabled_for_rendering(&self) -> bool {
        self.enabled_for_rendering
    }

    pub fn set_model_matrix(&mut self, model_matrix: Mat4) {
        self.model_matrix = model_matrix;
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.model_matrix
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn tex_coords(&self) -> &[Vec3] {
        &self.tex_coords
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    pub fn material_index(&self) -> u32 {
        self.material_index
    }
}

impl Drawable for Mesh {
    fn draw(&self) {
        Mesh::draw(self);
    }

    fn model_matrix(&self) -> Mat4 {
        self.model_matrix
    }
}

fn connect(vao: &VertexArray, buffer: &Buffer, location: AttributeLocation) {
    vao.connect_buffer(buffer, location, 3)
        .expect("vec3 attribute stride always fits a GLsizei");
}

/// Reject records a complete mesh cannot be built from.
pub fn validate(data: &MeshData) -> Result<(), MeshError> {
    if data.normals.is_empty() {
        return Err(MeshError::MissingNormals);
    }
    if data.triangles.is_empty() {
        return Err(MeshError::MissingFaces);
    }
    if data.normals.len() != data.positions.len() {
        return Err(MeshError::AttributeCountMismatch {
            name: "normals",
            positions: data.positions.len(),
            attributes: data.normals.len(),
        });
    }
    if !data.tex_coords.is_empty() && data.tex_coords.len() != data.positions.len() {
        return Err(MeshError::AttributeCountMismatch {
            name: "tex coords",
            positions: data.positions.len(),
            attributes: data.tex_coords.len(),
        });
    }
    Ok(())
}

/// Per-vertex attribute conversion. Order-independent, so it runs on the
/// rayon pool; the collect preserves input order.
pub fn extract_vec3s(raw: &[[f32; 3]]) -> Vec<Vec3> {
    raw.par_iter().map(|&v| Vec3::from(v)).collect()
}

/// Flatten a triangulated face list into the index stream the element
/// buffer wants. Order-preserving.
pub fn flatten_triangles(triangles: &[[u32; 3]]) -> Vec<u32> {
    triangles.iter().flat_map(|tri| tri.iter().copied()).collect()
}

/// Flat ground plane centered on the origin, normal up.
pub fn create_plane(size: f32) -> MeshData {
    let h = size * 0.5;
    MeshData {
        positions: vec![[-h, 0.0, -h], [h, 0.0, -h], [h, 0.0, h], [-h, 0.0, h]],
        normals: vec![[0.0, 1.0, 0.0]; 4],
        tex_coords: vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        triangles: vec![[0, 2, 1], [0, 3, 2]],
        material_index: 0,
    }
}

/// Axis-aligned box with per-face normals.
pub fn create_box(width: f32, height: f32, depth: f32) -> MeshData {
    let hw = width * 0.5;
    let hh = height * 0.5;
    let hd = depth * 0.5;

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut triangles = Vec::with_capacity(12);

    // (normal, four corners wound counter-clockwise seen from outside)
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        (
            [0.0, 0.0, 1.0],
            [[-hw, -hh, hd], [hw, -hh, hd], [hw, hh, hd], [-hw, hh, hd]],
        ),
        (
            [0.0, 0.0, -1.0],
            [[hw, -hh, -hd], [-hw, -hh, -hd], [-hw, hh, -hd], [hw, hh, -hd]],
        ),
        (
            [0.0, 1.0, 0.0],
            [[-hw, hh, hd], [hw, hh, hd], [hw, hh, -hd], [-hw, hh, -hd]],
        ),
        (
            [0.0, -1.0, 0.0],
            [[-hw, -hh, -hd], [hw, -hh, -hd], [hw, -hh, hd], [-hw, -hh, hd]],
        ),
        (
            [1.0, 0.0, 0.0],
            [[hw, -hh, hd], [hw, -hh, -hd], [hw, hh, -hd], [hw, hh, hd]],
        ),
        (
            [-1.0, 0.0, 0.0],
            [[-hw, -hh, -hd], [-hw, -hh, hd], [-hw, hh, hd], [-hw, hh, -hd]],
        ),
    ];

    for (normal, corners) in faces {
        let base = positions.len() as u32;
        positions.extend_from_slice(&corners);
        normals.extend_from_slice(&[normal; 4]);
        triangles.push([base, base + 1, base + 2]);
        triangles.push([base, base + 2, base + 3]);
    }

    MeshData {
        positions,
        normals,
        tex_coords: Vec::new(),
        triangles,
        material_index: 0,
    }
}

/// Latitude/longitude sphere.
pub fn create_sphere(radius: f32, stacks: u32, sectors: u32) -> MeshData {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut triangles = Vec::new();

    for i in 0..=stacks {
        let stack_angle = PI / 2.0 - (i as f32) * PI / (stacks as f32);
        let xz = stack_angle.cos();
        let y = stack_angle.sin();

        for j in 0..=sectors {
            let sector_angle = 2.0 * PI * (j as f32) / (sectors as f32);
            let normal = [
                xz * sector_angle.cos(),
                y,
                xz * sector_angle.sin(),
            ];
            positions.push([normal[0] * radius, normal[1] * radius, normal[2] * radius]);
            normals.push(normal);
        }
    }

    for i in 0..stacks {
        for j in 0..sectors {
            let first = i * (sectors + 1) + j;
            let second = first + sectors + 1;
            triangles.push([first, second, first + 1]);
            triangles.push([first + 1, second, second + 1]);
        }
    }

    MeshData {
        positions,
        normals,
        tex_coords: Vec::new(),
        triangles,
        material_index: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_data() -> MeshData {
        MeshData {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            tex_coords: Vec::new(),
            triangles: vec![[0, 1, 2]],
            material_index: 3,
        }
    }

    #[test]
    fn validate_accepts_complete_record() {
        assert_eq!(validate(&triangle_data()), Ok(()));
    }

    #[test]
    fn validate_rejects_missing_normals() {
        let mut data = triangle_data();
        data.normals.clear();
        assert_eq!(validate(&data), Err(MeshError::MissingNormals));
    }

    #[test]
    fn validate_rejects_missing_faces() {
        let mut data = triangle_data();
        data.triangles.clear();
        assert_eq!(validate(&data), Err(MeshError::MissingFaces));
    }

    #[test]
    fn validate_rejects_normal_count_mismatch() {
        let mut data = triangle_data();
        data.normals.pop();
        assert!(matches!(
            validate(&data),
            Err(MeshError::AttributeCountMismatch { name: "normals", .. })
        ));
    }

    #[test]
    fn extraction_preserves_order() {
        let raw = vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let out = extract_vec3s(&raw);
        assert_eq!(
            out,
            vec![
                Vec3::new(1.0, 2.0, 3.0),
                Vec3::new(4.0, 5.0, 6.0),
                Vec3::new(7.0, 8.0, 9.0)
            ]
        );
    }

    #[test]
    fn flatten_preserves_face_order() {
        let triangles = vec![[0, 1, 2], [2, 1, 3], [3, 1, 0]];
        assert_eq!(flatten_triangles(&triangles), vec![0, 1, 2, 2, 1, 3, 3, 1, 0]);
    }

    #[test]
    fn generators_produce_valid_records() {
        for data in [create_plane(10.0), create_box(1.0, 2.0, 3.0), create_sphere(1.0, 8, 12)] {
            assert_eq!(validate(&data), Ok(()));
            let max_index = data
                .triangles
                .iter()
                .flat_map(|t| t.iter())
                .copied()
                .max()
                .unwrap();
            assert!((max_index as usize) < data.positions.len());
        }
    }

    #[test]
    fn box_bounds_match_dimensions() {
        let data = create_box(2.0, 4.0, 6.0);
        let bb = BoundingBox::from_points(&extract_vec3s(&data.positions));
        assert_eq!(bb.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(bb.max, Vec3::new(1.0, 2.0, 3.0));
    }
}
