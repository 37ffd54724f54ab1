use glam::{IVec2, Mat4, Vec3};

use crate::renderer::batch::MeshBatch;
use crate::renderer::bounds::BoundingBox;
use crate::renderer::light::{Attenuation, Light, DEFAULT_SHADOW_FAR, POINT_SHADOW_MAP_RES};
use crate::renderer::mesh::{create_box, create_plane, create_sphere, Mesh};

/// Everything the viewer renders: a procedural test scene plus one light
/// of every kind.
pub struct DemoScene {
    pub batch: MeshBatch,
    pub lights: Vec<Light>,
}

const SHADOW_RES: IVec2 = IVec2::new(2048, 2048);

pub fn build() -> DemoScene {
    let mut batch = MeshBatch::new();

    let floor = Mesh::from_data(&create_plane(60.0)).expect("floor mesh");
    batch.push(floor);

    let mut tall_box = Mesh::from_data(&create_box(2.0, 6.0, 2.0)).expect("box mesh");
    tall_box.set_model_matrix(Mat4::from_translation(Vec3::new(-6.0, 3.0, -2.0)));
    batch.push(tall_box);

    let mut crate_box = Mesh::from_data(&create_box(3.0, 3.0, 3.0)).expect("box mesh");
    crate_box.set_model_matrix(Mat4::from_translation(Vec3::new(4.0, 1.5, 3.0)));
    batch.push(crate_box);

    let mut sphere = Mesh::from_data(&create_sphere(1.5, 16, 24)).expect("sphere mesh");
    sphere.set_model_matrix(Mat4::from_translation(Vec3::new(0.0, 1.5, -5.0)));
    batch.push(sphere);

    // world-space bounds over the whole batch, for the sun's projection fit
    let scene_bounds = batch
        .meshes()
        .iter()
        .fold(BoundingBox::EMPTY, |bounds, mesh| {
            bounds.union(mesh.bounding_box().transformed(&mesh.model_matrix()))
        });

    let mut sun = Light::directional(
        Vec3::new(1.0, 0.96, 0.9),
        Vec3::new(-0.4, -1.0, -0.3),
        DEFAULT_SHADOW_FAR,
        SHADOW_RES,
    )
    .expect("directional light");
    sun.state_mut().set_scene_bounds(Some(scene_bounds));

    let spot = Light::spot(
        Vec3::new(0.2, 0.5, 1.0),
        Vec3::new(8.0, 10.0, 8.0),
        Vec3::new(-0.5, -1.0, -0.5),
        Attenuation::new(1.0, 0.045, 0.0075),
        0.3,
        0.45,
        100.0,
        SHADOW_RES,
    )
    .expect("spot light");

    // known-limited: point shadows are allocated but unfinished
    let point = Light::point(
        Vec3::new(1.0, 0.4, 0.2),
        Vec3::new(-3.0, 4.0, 4.0),
        Attenuation::new(1.0, 0.09, 0.032),
        50.0,
        POINT_SHADOW_MAP_RES,
    )
    .expect("point light");

    DemoScene {
        batch,
        lights: vec![sun, spot, point],
    }
}
