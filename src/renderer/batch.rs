use glam::Mat4;

use crate::renderer::culling::Frustum;
use crate::renderer::mesh::Mesh;
use crate::renderer::shader::ShaderProgram;
use crate::renderer::BatchRenderer;

/// Holds every mesh of an imported model and draws them as one batch.
/// Stands in for the importer-side batch renderer the lights delegate to.
pub struct MeshBatch {
    meshes: Vec<Mesh>,
}

impl MeshBatch {
    pub fn new() -> Self {
        Self { meshes: Vec::new() }
    }

    pub fn push(&mut self, mesh: Mesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn meshes_mut(&mut self) -> &mut [Mesh] {
        &mut self.meshes
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl Default for MeshBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchRenderer for MeshBatch {
    fn multi_draw(&self, program: &mut ShaderProgram) {
        for mesh in &self.meshes {
            program.set_mat4("u_model", &mesh.model_matrix());
            mesh.draw();
        }
    }

    fn multi_draw_culled(&self, program: &mut ShaderProgram, frustum_matrix: Mat4) {
        let frustum = Frustum::from_matrix(frustum_matrix);
        for mesh in &self.meshes {
            let world_bounds = mesh.bounding_box().transformed(&mesh.model_matrix());
            if !frustum.intersects(&world_bounds) {
                continue;
            }
            program.set_mat4("u_model", &mesh.model_matrix());
            mesh.draw();
        }
    }
}
