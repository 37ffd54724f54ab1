use gl::types::*;
use glam::{IVec2, Mat4, Vec3};
use log::warn;

use crate::engine::gl_debug;
use crate::renderer::bounds::BoundingBox;
use crate::renderer::framebuffer::FrameBuffer;
use crate::renderer::shader::ShaderProgram;
use crate::renderer::texture::{Cubemap, ShadowMapTarget, Texture2d};
use crate::renderer::{BatchRenderer, Drawable, RenderError};

const SHADOW_VERT_SRC: &str = include_str!("../../shaders/shadow_depth.vert");
const SHADOW_FRAG_SRC: &str = include_str!("../../shaders/shadow_depth.frag");
const OMNI_VERT_SRC: &str = include_str!("../../shaders/omni_depth.vert");
const OMNI_GEOM_SRC: &str = include_str!("../../shaders/omni_depth.geom");
const OMNI_FRAG_SRC: &str = include_str!("../../shaders/omni_depth.frag");

pub const DEFAULT_SHADOW_MAP_RES: IVec2 = IVec2::new(4096, 4096);
pub const POINT_SHADOW_MAP_RES: IVec2 = IVec2::new(512, 512);
pub const DEFAULT_SHADOW_FAR: f32 = 3000.0;

/// Ortho bounds widening when fitting a scene box: (sqrt(3) - 1) / 3,
/// enough to keep a rotated box inside the projection.
const ORTHO_MARGIN: f32 = 0.244;

/// Half extent of the fallback ortho volume used when no scene bounds are
/// supplied, and the height the light is pinned at in that case.
const FALLBACK_ORTHO_EXTENT: f32 = 2000.0;

const SHADOW_NEAR: f32 = 0.1;

/// Cross products shorter than this mean the light looks straight along
/// world-up and needs the world-X fallback.
const UP_EPSILON: f32 = 0.01;

/// GPU-visible light record, tightly packed for upload into the scene
/// light buffer (std430). Fields a light type does not use keep their -1
/// sentinel and must never be read as meaningful.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuLight {
    pub light_space: Mat4,
    pub color: Vec3,
    /// 0 directional, 1 point, 2 spot
    pub kind: i32,
    pub position: Vec3,
    pub constant: f32,
    pub direction: Vec3,
    pub linear: f32,
    pub shadow_map: u64,
    pub quadratic: f32,
    pub cut_off: f32,
    pub outer_cut_off: f32,
    pub pcf_kernel_size: i32,
    _pad: [i32; 2],
}

impl Default for GpuLight {
    fn default() -> Self {
        Self {
            light_space: Mat4::IDENTITY,
            color: Vec3::ZERO,
            kind: -1,
            position: Vec3::ZERO,
            constant: -1.0,
            direction: Vec3::ZERO,
            linear: -1.0,
            shadow_map: 0,
            quadratic: -1.0,
            cut_off: -1.0,
            outer_cut_off: -1.0,
            pcf_kernel_size: 1,
            _pad: [0; 2],
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    pub fn new(constant: f32, linear: f32, quadratic: f32) -> Self {
        Self {
            constant,
            linear,
            quadratic,
        }
    }
}

/// Closed set of light variants, each carrying only the parameters that
/// apply to it. Cutoffs are stored as cosines of the cone half-angles.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LightKind {
    Directional {
        direction: Vec3,
        /// Derived anchor the view matrix is built from; recomputed by
        /// every light-space recalculation.
        position: Vec3,
    },
    Point {
        position: Vec3,
        attenuation: Attenuation,
    },
    Spot {
        position: Vec3,
        direction: Vec3,
        attenuation: Attenuation,
        cut_off: f32,
        outer_cut_off: f32,
    },
}

impl LightKind {
    pub fn index(&self) -> i32 {
        match self {
            LightKind::Directional { .. } => 0,
            LightKind::Point { .. } => 1,
            LightKind::Spot { .. } => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LightKind::Directional { .. } => "directional",
            LightKind::Point { .. } => "point",
            LightKind::Spot { .. } => "spot",
        }
    }
}

/// Host-side light parameters plus the cached light-space matrices. Pure
/// state: everything here works without a GL context, which is where all
/// the projection math is exercised by tests.
#[derive(Clone, PartialEq, Debug)]
pub struct LightState {
    kind: LightKind,
    color: Vec3,
    casts_shadows: bool,
    shadow_map_res: IVec2,
    sm_far: f32,
    pcf_kernel_size: i32,
    scene_bounds: Option<BoundingBox>,
    projection: Mat4,
    view: Mat4,
    light_space: Mat4,
}

impl LightState {
    pub fn directional(color: Vec3, direction: Vec3, sm_far: f32, resolution: IVec2) -> Self {
        Self::with_kind(
            LightKind::Directional {
                direction,
                position: Vec3::ZERO,
            },
            color,
            sm_far,
            resolution,
        )
    }

    pub fn point(
        color: Vec3,
        position: Vec3,
        attenuation: Attenuation,
        sm_far: f32,
        resolution: IVec2,
    ) -> Self {
        Self::with_kind(
            LightKind::Point {
                position,
                attenuation,
            },
            color,
            sm_far,
            resolution,
        )
    }

    /// Cone angles are half-angles in radians; their cosines are what gets
    /// stored and uploaded.
    #[allow(clippy::too_many_arguments)]
    pub fn spot(
        color: Vec3,
        position: Vec3,
        direction: Vec3,
        attenuation: Attenuation,
        cut_off_angle: f32,
        outer_cut_off_angle: f32,
        sm_far: f32,
        resolution: IVec2,
    ) -> Self {
        Self::with_kind(
            LightKind::Spot {
                position,
                direction,
                attenuation,
                cut_off: cut_off_angle.cos(),
                outer_cut_off: outer_cut_off_angle.cos(),
            },
            color,
            sm_far,
            resolution,
        )
    }

    fn with_kind(kind: LightKind, color: Vec3, sm_far: f32, resolution: IVec2) -> Self {
        let mut state = Self {
            kind,
            color,
            casts_shadows: true,
            shadow_map_res: resolution,
            sm_far,
            pcf_kernel_size: 1,
            scene_bounds: None,
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            light_space: Mat4::IDENTITY,
        };
        state.recalculate_light_space_matrix();
        state
    }

    /// Recompute projection, view and their product from the current
    /// parameters. Idempotent; must be re-run after any setter that moves
    /// or re-aims the light.
    pub fn recalculate_light_space_matrix(&mut self) {
        let (projection, view) = match &mut self.kind {
            LightKind::Directional {
                direction,
                position,
            } => {
                let (projection, anchor) =
                    directional_projection(*direction, self.scene_bounds, self.sm_far);
                *position = anchor;
                (projection, look_along(anchor, *direction))
            }
            LightKind::Spot {
                position,
                direction,
                outer_cut_off,
                ..
            } => (
                spot_projection(*outer_cut_off, self.shadow_map_res, self.sm_far),
                look_along(*position, *direction),
            ),
            LightKind::Point { .. } => {
                // per-face view composition happens in the geometry stage,
                // not on the host
                (
                    point_projection(self.shadow_map_res, self.sm_far),
                    Mat4::IDENTITY,
                )
            }
        };
        self.projection = projection;
        self.view = view;
        self.light_space = projection * view;
    }

    /// Pack for upload. Only the fields the variant uses are written; the
    /// rest keep the -1 sentinels of [`GpuLight::default`].
    pub fn packed(&self, shadow_map: u64) -> GpuLight {
        let mut gpu = GpuLight {
            light_space: self.light_space,
            color: self.color,
            kind: self.kind.index(),
            pcf_kernel_size: self.pcf_kernel_size,
            shadow_map,
            ..GpuLight::default()
        };
        match &self.kind {
            LightKind::Directional {
                direction,
                position,
            } => {
                gpu.direction = *direction;
                gpu.position = *position;
            }
            LightKind::Point {
                position,
                attenuation,
            } => {
                gpu.position = *position;
                gpu.constant = attenuation.constant;
                gpu.linear = attenuation.linear;
                gpu.quadratic = attenuation.quadratic;
            }
            LightKind::Spot {
                position,
                direction,
                attenuation,
                cut_off,
                outer_cut_off,
            } => {
                gpu.position = *position;
                gpu.direction = *direction;
                gpu.constant = attenuation.constant;
                gpu.linear = attenuation.linear;
                gpu.quadratic = attenuation.quadratic;
                gpu.cut_off = *cut_off;
                gpu.outer_cut_off = *outer_cut_off;
            }
        }
        gpu
    }

    pub fn kind(&self) -> &LightKind {
        &self.kind
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    /// Does not touch the cached matrices.
    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
    }

    pub fn position(&self) -> Vec3 {
        match &self.kind {
            LightKind::Directional { position, .. } => *position,
            LightKind::Point { position, .. } => *position,
            LightKind::Spot { position, .. } => *position,
        }
    }

    /// Moves the light and recomputes the light-space matrix. Ignored for
    /// directional lights, whose position is derived.
    pub fn set_position(&mut self, new_position: Vec3) {
        match &mut self.kind {
            LightKind::Point { position, .. } | LightKind::Spot { position, .. } => {
                *position = new_position;
                self.recalculate_light_space_matrix();
            }
            LightKind::Directional { .. } => {
                warn!("ignoring position on a directional light");
            }
        }
    }

    pub fn direction(&self) -> Option<Vec3> {
        match &self.kind {
            LightKind::Directional { direction, .. } | LightKind::Spot { direction, .. } => {
                Some(*direction)
            }
            LightKind::Point { .. } => None,
        }
    }

    /// Re-aims the light and recomputes the light-space matrix. Ignored
    /// for point lights.
    pub fn set_direction(&mut self, new_direction: Vec3) {
        match &mut self.kind {
            LightKind::Directional { direction, .. } | LightKind::Spot { direction, .. } => {
                *direction = new_direction;
                self.recalculate_light_space_matrix();
            }
            LightKind::Point { .. } => {
                warn!("ignoring direction on a point light");
            }
        }
    }

    pub fn attenuation(&self) -> Option<Attenuation> {
        match &self.kind {
            LightKind::Point { attenuation, .. } | LightKind::Spot { attenuation, .. } => {
                Some(*attenuation)
            }
            LightKind::Directional { .. } => None,
        }
    }

    /// Does not touch the cached matrices.
    pub fn set_attenuation(&mut self, new_attenuation: Attenuation) {
        match &mut self.kind {
            LightKind::Point { attenuation, .. } | LightKind::Spot { attenuation, .. } => {
                *attenuation = new_attenuation;
            }
            LightKind::Directional { .. } => {
                warn!("ignoring attenuation on a directional light");
            }
        }
    }

    pub fn cut_off(&self) -> Option<f32> {
        match &self.kind {
            LightKind::Spot { cut_off, .. } => Some(*cut_off),
            _ => None,
        }
    }

    /// Inner cone cosine. Recomputes the light-space matrix.
    pub fn set_cut_off(&mut self, cosine: f32) {
        if let LightKind::Spot { cut_off, .. } = &mut self.kind {
            *cut_off = cosine;
            self.recalculate_light_space_matrix();
        } else {
            warn!("ignoring cutoff on a {} light", self.kind.name());
        }
    }

    pub fn outer_cut_off(&self) -> Option<f32> {
        match &self.kind {
            LightKind::Spot { outer_cut_off, .. } => Some(*outer_cut_off),
            _ => None,
        }
    }

    /// Outer cone cosine. Leaves the cached projection stale until the
    /// next explicit recomputation; the shadow passes recompute every
    /// frame anyway.
    pub fn set_outer_cut_off(&mut self, cosine: f32) {
        if let LightKind::Spot { outer_cut_off, .. } = &mut self.kind {
            *outer_cut_off = cosine;
        } else {
            warn!("ignoring outer cutoff on a {} light", self.kind.name());
        }
    }

    pub fn pcf_kernel_size(&self) -> i32 {
        self.pcf_kernel_size
    }

    pub fn set_pcf_kernel_size(&mut self, size: i32) {
        self.pcf_kernel_size = size;
    }

    pub fn casts_shadows(&self) -> bool {
        self.casts_shadows
    }

    pub fn set_casts_shadows(&mut self, casts: bool) {
        self.casts_shadows = casts;
    }

    pub fn scene_bounds(&self) -> Option<BoundingBox> {
        self.scene_bounds
    }

    /// Scene box directional lights fit their projection around. Picked up
    /// by the next recomputation.
    pub fn set_scene_bounds(&mut self, bounds: Option<BoundingBox>) {
        self.scene_bounds = bounds;
    }

    pub fn shadow_map_resolution(&self) -> IVec2 {
        self.shadow_map_res
    }

    pub fn far_plane(&self) -> f32 {
        self.sm_far
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn light_space_matrix(&self) -> Mat4 {
        self.light_space
    }
}

/// World-up, unless the light looks straight up or down; then world-X
/// keeps the view matrix regular.
pub fn up_vector(direction: Vec3) -> Vec3 {
    if direction.cross(Vec3::Y).length() < UP_EPSILON {
        Vec3::X
    } else {
        Vec3::Y
    }
}

fn look_along(position: Vec3, direction: Vec3) -> Mat4 {
    Mat4::look_at_rh(position, position + direction, up_vector(direction))
}

fn directional_projection(
    direction: Vec3,
    scene_bounds: Option<BoundingBox>,
    sm_far: f32,
) -> (Mat4, Vec3) {
    match scene_bounds {
        None => (
            Mat4::orthographic_rh_gl(
                -FALLBACK_ORTHO_EXTENT,
                FALLBACK_ORTHO_EXTENT,
                -FALLBACK_ORTHO_EXTENT,
                FALLBACK_ORTHO_EXTENT,
                SHADOW_NEAR,
                sm_far,
            ),
            Vec3::new(0.0, FALLBACK_ORTHO_EXTENT, 0.0),
        ),
        Some(bounds) => {
            let diagonal = bounds.diagonal();
            let anchor = bounds.center() + 0.5 * diagonal * (-direction).normalize();

            let lowest = bounds.min.min_element();
            let highest = bounds.max.max_element();
            let lower = lowest - ORTHO_MARGIN * lowest.abs();
            let upper = highest + ORTHO_MARGIN * highest.abs();

            (
                Mat4::orthographic_rh_gl(lower, upper, lower, upper, SHADOW_NEAR, diagonal),
                anchor,
            )
        }
    }
}

fn spot_projection(outer_cut_off: f32, resolution: IVec2, sm_far: f32) -> Mat4 {
    // cutoff carries the cosine, so the full vertical FOV is 2*acos
    let fov_y = 2.0 * outer_cut_off.acos();
    let aspect = resolution.x as f32 / resolution.y as f32;
    Mat4::perspective_rh_gl(fov_y, aspect, SHADOW_NEAR, sm_far)
}

fn point_projection(resolution: IVec2, sm_far: f32) -> Mat4 {
    let aspect = resolution.x as f32 / resolution.y as f32;
    Mat4::perspective_rh_gl(90.0_f32.to_radians(), aspect, SHADOW_NEAR, sm_far)
}

/// Saves viewport and cull-face mode, restores both when dropped. Shadow
/// passes lean on this so every exit path restores the caller's state.
struct PassStateGuard {
    viewport: [GLint; 4],
    cull_face_mode: GLint,
}

impl PassStateGuard {
    fn capture() -> Self {
        let mut viewport = [0; 4];
        let mut cull_face_mode = 0;
        unsafe {
            gl::GetIntegerv(gl::VIEWPORT, viewport.as_mut_ptr());
            gl::GetIntegerv(gl::CULL_FACE_MODE, &mut cull_face_mode);
        }
        Self {
            viewport,
            cull_face_mode,
        }
    }
}

impl Drop for PassStateGuard {
    fn drop(&mut self) {
        unsafe {
            gl::Viewport(
                self.viewport[0],
                self.viewport[1],
                self.viewport[2],
                self.viewport[3],
            );
            gl::CullFace(self.cull_face_mode as GLenum);
        }
    }
}

/// A light plus the GPU resources its shadow map lives in: the depth
/// target (flat texture or cubemap), a private depth-only framebuffer and
/// the shadow-generation program.
pub struct Light {
    state: LightState,
    target: Box<dyn ShadowMapTarget>,
    shadow_fbo: FrameBuffer,
    program: ShaderProgram,
    shadow_handle: u64,
    pushed_light_pos: Option<Vec3>,
}

impl Light {
    pub fn directional(
        color: Vec3,
        direction: Vec3,
        sm_far: f32,
        resolution: IVec2,
    ) -> Result<Self, RenderError> {
        let state = LightState::directional(color, direction, sm_far, resolution);
        let target = flat_shadow_texture(resolution);
        let program = ShaderProgram::from_sources(SHADOW_VERT_SRC, SHADOW_FRAG_SRC)?;
        Self::finish(state, Box::new(target), program)
    }

    /// Point-light shadow mapping is unfinished: the cubemap and the
    /// geometry-stage program are allocated, but per-face view matrices
    /// and culling are missing. Construction logs a warning and proceeds.
    pub fn point(
        color: Vec3,
        position: Vec3,
        attenuation: Attenuation,
        sm_far: f32,
        resolution: IVec2,
    ) -> Result<Self, RenderError> {
        let state = LightState::point(color, position, attenuation, sm_far, resolution);
        let target = Cubemap::new(gl::LINEAR, gl::LINEAR);
        target.allocate_depth(resolution.x, resolution.y);
        let program = ShaderProgram::with_geometry(OMNI_VERT_SRC, OMNI_GEOM_SRC, OMNI_FRAG_SRC)?;

        let mut light = Self::finish(state, Box::new(target), program)?;
        light.program.bind();
        light.program.set_vec3("u_light_pos", position);
        light.program.set_f32("u_far", sm_far);
        light.pushed_light_pos = Some(position);

        // TODO implement per-face view matrices and culling for
        // omnidirectional shadow maps
        warn!("shadow maps for point lights are not supported yet");
        Ok(light)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn spot(
        color: Vec3,
        position: Vec3,
        direction: Vec3,
        attenuation: Attenuation,
        cut_off_angle: f32,
        outer_cut_off_angle: f32,
        sm_far: f32,
        resolution: IVec2,
    ) -> Result<Self, RenderError> {
        let state = LightState::spot(
            color,
            position,
            direction,
            attenuation,
            cut_off_angle,
            outer_cut_off_angle,
            sm_far,
            resolution,
        );
        let target = flat_shadow_texture(resolution);
        let program = ShaderProgram::from_sources(SHADOW_VERT_SRC, SHADOW_FRAG_SRC)?;
        Self::finish(state, Box::new(target), program)
    }

    fn finish(
        state: LightState,
        target: Box<dyn ShadowMapTarget>,
        program: ShaderProgram,
    ) -> Result<Self, RenderError> {
        let shadow_fbo = FrameBuffer::for_depth_target(target.as_ref())?;
        let shadow_handle = target.bindless_handle();

        let mut light = Self {
            state,
            target,
            shadow_fbo,
            program,
            shadow_handle,
            pushed_light_pos: None,
        };
        light.program.bind();
        light.program.set_mat4("u_model", &Mat4::IDENTITY);
        light.recalculate_light_space_matrix();
        gl_debug::check_gl_errors("light construction");
        Ok(light)
    }

    pub fn state(&self) -> &LightState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut LightState {
        &mut self.state
    }

    /// The packed struct for the scene-wide light buffer.
    pub fn gpu_light(&self) -> GpuLight {
        self.state.packed(self.shadow_handle)
    }

    /// Recompute and push the light-space matrix to the generation
    /// program, immediately.
    pub fn recalculate_light_space_matrix(&mut self) {
        self.state.recalculate_light_space_matrix();
        self.program.bind();
        self.program
            .set_mat4("u_light_space", &self.state.light_space_matrix());
    }

    /// Render the shadow map from an explicit list of drawables.
    pub fn render_shadow_map<D: Drawable>(&mut self, meshes: &[D]) {
        self.shadow_pass(|program| {
            for mesh in meshes {
                program.set_mat4("u_model", &mesh.model_matrix());
                mesh.draw();
            }
        });
    }

    /// Render the shadow map through a batch renderer.
    pub fn render_shadow_map_batch<B: BatchRenderer>(&mut self, batch: &B) {
        self.shadow_pass(|program| batch.multi_draw(program));
    }

    /// Batch variant with frustum culling against this light's own
    /// frustum. Point lights have no usable frustum and fall back to the
    /// unculled batch draw.
    pub fn render_shadow_map_culled<B: BatchRenderer>(&mut self, batch: &B) {
        if matches!(self.state.kind(), LightKind::Point { .. }) {
            warn!("shadow-map culling is not supported for point lights; drawing unculled");
            self.render_shadow_map_batch(batch);
            return;
        }
        // recomputed again inside the pass; this copy only seeds the cull
        self.state.recalculate_light_space_matrix();
        let light_space = self.state.light_space_matrix();
        self.shadow_pass(|program| batch.multi_draw_culled(program, light_space));
    }

    fn shadow_pass<F: FnOnce(&mut ShaderProgram)>(&mut self, draw: F) {
        if !self.state.casts_shadows() {
            return;
        }

        // external mutation of the state is picked up every frame
        self.recalculate_light_space_matrix();

        let _pass = PassStateGuard::capture();

        self.program.bind();
        let res = self.state.shadow_map_resolution();
        unsafe {
            gl::Viewport(0, 0, res.x, res.y);
        }
        self.shadow_fbo.bind();
        unsafe {
            gl::Clear(gl::DEPTH_BUFFER_BIT);
            // front-face culling against peter panning on closed meshes
            gl::CullFace(gl::FRONT);
        }

        if let LightKind::Point { position, .. } = *self.state.kind() {
            if self.pushed_light_pos != Some(position) {
                self.program.set_vec3("u_light_pos", position);
                self.pushed_light_pos = Some(position);
            }
        }

        draw(&mut self.program);

        self.target.generate_mipmap();
        self.shadow_fbo.unbind();
        gl_debug::check_gl_errors("shadow pass");
        // guard restores viewport and cull-face mode
    }
}

fn flat_shadow_texture(resolution: IVec2) -> Texture2d {
    let texture = Texture2d::new(gl::LINEAR_MIPMAP_LINEAR, gl::LINEAR);
    texture.set_wrap(gl::CLAMP_TO_EDGE, gl::CLAMP_TO_EDGE);
    texture.enable_depth_compare();
    texture.allocate_depth(resolution.x, resolution.y);
    texture
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat3;

    fn white() -> Vec3 {
        Vec3::ONE
    }

    fn spot_state(outer_angle: f32) -> LightState {
        LightState::spot(
            white(),
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(0.2, -1.0, 0.1),
            Attenuation::new(1.0, 0.09, 0.032),
            outer_angle * 0.8,
            outer_angle,
            DEFAULT_SHADOW_FAR,
            DEFAULT_SHADOW_MAP_RES,
        )
    }

    fn mat4_approx_eq(a: Mat4, b: Mat4, tolerance: f32) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() <= tolerance)
    }

    #[test]
    fn recalculation_is_idempotent() {
        let mut state = LightState::directional(
            white(),
            Vec3::new(-0.4, -1.0, -0.3),
            DEFAULT_SHADOW_FAR,
            DEFAULT_SHADOW_MAP_RES,
        );
        state.recalculate_light_space_matrix();
        let first = state.light_space_matrix();
        state.recalculate_light_space_matrix();
        assert_eq!(first, state.light_space_matrix());
    }

    #[test]
    fn directional_defaults_to_fixed_ortho_volume() {
        let state = LightState::directional(
            white(),
            Vec3::new(0.3, -1.0, 0.2),
            DEFAULT_SHADOW_FAR,
            DEFAULT_SHADOW_MAP_RES,
        );
        let expected =
            Mat4::orthographic_rh_gl(-2000.0, 2000.0, -2000.0, 2000.0, 0.1, DEFAULT_SHADOW_FAR);
        assert_eq!(state.projection(), expected);
        assert_eq!(state.position(), Vec3::new(0.0, 2000.0, 0.0));
    }

    #[test]
    fn directional_bounds_override_widens_by_margin() {
        let bounds = BoundingBox::new(Vec3::new(-10.0, -2.0, -8.0), Vec3::new(6.0, 9.0, 4.0));
        let mut state = LightState::directional(
            white(),
            Vec3::new(0.0, -1.0, -0.2),
            DEFAULT_SHADOW_FAR,
            DEFAULT_SHADOW_MAP_RES,
        );
        state.set_scene_bounds(Some(bounds));
        state.recalculate_light_space_matrix();

        let lower = -10.0 - 0.244 * 10.0;
        let upper = 9.0 + 0.244 * 9.0;
        let expected =
            Mat4::orthographic_rh_gl(lower, upper, lower, upper, 0.1, bounds.diagonal());
        assert!(mat4_approx_eq(state.projection(), expected, 1e-5));

        let direction = state.direction().unwrap();
        let expected_anchor =
            bounds.center() + 0.5 * bounds.diagonal() * (-direction).normalize();
        assert!((state.position() - expected_anchor).length() < 1e-4);
    }

    #[test]
    fn spot_fov_is_twice_acos_of_outer_cutoff() {
        let outer_angle = 0.6;
        let state = spot_state(outer_angle);
        let outer_cos = state.outer_cut_off().unwrap();
        let expected = Mat4::perspective_rh_gl(
            2.0 * outer_cos.acos(),
            1.0,
            0.1,
            DEFAULT_SHADOW_FAR,
        );
        assert!(mat4_approx_eq(state.projection(), expected, 1e-5));
        assert!((2.0 * outer_cos.acos() - 2.0 * outer_angle).abs() < 1e-4);
    }

    #[test]
    fn outer_cutoff_setter_leaves_projection_stale() {
        let mut state = spot_state(0.6);
        let before = state.light_space_matrix();

        state.set_outer_cut_off(0.3_f32.cos());
        assert_eq!(state.light_space_matrix(), before, "stale until recompute");

        state.recalculate_light_space_matrix();
        assert_ne!(state.light_space_matrix(), before);
    }

    #[test]
    fn photometric_setters_do_not_touch_matrices() {
        let mut state = spot_state(0.5);
        let before = state.light_space_matrix();

        state.set_color(Vec3::new(1.0, 0.0, 0.0));
        state.set_attenuation(Attenuation::new(0.5, 0.2, 0.01));
        state.set_pcf_kernel_size(4);
        assert_eq!(state.light_space_matrix(), before);
    }

    #[test]
    fn geometric_setters_recompute_immediately() {
        let mut state = spot_state(0.5);
        let before = state.light_space_matrix();

        state.set_position(Vec3::new(3.0, 8.0, -2.0));
        let after_move = state.light_space_matrix();
        assert_ne!(after_move, before);

        state.set_direction(Vec3::new(-1.0, -0.5, 0.0));
        assert_ne!(state.light_space_matrix(), after_move);
    }

    #[test]
    fn straight_down_direction_falls_back_to_world_x_up() {
        assert_eq!(up_vector(Vec3::new(0.0, -1.0, 0.0)), Vec3::X);
        assert_eq!(up_vector(Vec3::new(0.3, -1.0, 0.2)), Vec3::Y);

        let state = LightState::directional(
            white(),
            Vec3::new(0.0, -1.0, 0.0),
            DEFAULT_SHADOW_FAR,
            DEFAULT_SHADOW_MAP_RES,
        );
        let det = Mat3::from_mat4(state.view()).determinant();
        assert!(det.abs() > 1e-6, "view matrix degenerated: det = {det}");
    }

    #[test]
    fn point_light_defers_view_to_shader() {
        let state = LightState::point(
            white(),
            Vec3::new(1.0, 2.0, 3.0),
            Attenuation::new(1.0, 0.07, 0.017),
            DEFAULT_SHADOW_FAR,
            POINT_SHADOW_MAP_RES,
        );
        assert_eq!(state.view(), Mat4::IDENTITY);
        assert_eq!(state.light_space_matrix(), state.projection());
    }

    #[test]
    fn gpu_light_layout_is_stable() {
        assert_eq!(std::mem::size_of::<GpuLight>(), 144);
        assert_eq!(std::mem::align_of::<GpuLight>(), 16);
    }

    #[test]
    fn packed_directional_keeps_sentinels() {
        let state = LightState::directional(
            white(),
            Vec3::new(0.1, -1.0, 0.0),
            DEFAULT_SHADOW_FAR,
            DEFAULT_SHADOW_MAP_RES,
        );
        let gpu = state.packed(0xABCD);
        assert_eq!(gpu.kind, 0);
        assert_eq!(gpu.shadow_map, 0xABCD);
        assert_eq!(gpu.constant, -1.0);
        assert_eq!(gpu.linear, -1.0);
        assert_eq!(gpu.quadratic, -1.0);
        assert_eq!(gpu.cut_off, -1.0);
        assert_eq!(gpu.outer_cut_off, -1.0);
    }

    #[test]
    fn packed_point_keeps_direction_sentinel() {
        let state = LightState::point(
            white(),
            Vec3::new(4.0, 1.0, 0.0),
            Attenuation::new(1.0, 0.09, 0.032),
            DEFAULT_SHADOW_FAR,
            POINT_SHADOW_MAP_RES,
        );
        let gpu = state.packed(7);
        assert_eq!(gpu.kind, 1);
        assert_eq!(gpu.direction, Vec3::ZERO);
        assert_eq!(gpu.cut_off, -1.0);
        assert_eq!(gpu.constant, 1.0);
        assert_eq!(gpu.position, Vec3::new(4.0, 1.0, 0.0));
    }

    #[test]
    fn mismatched_setters_are_ignored() {
        let mut state = LightState::point(
            white(),
            Vec3::ZERO,
            Attenuation::new(1.0, 0.09, 0.032),
            DEFAULT_SHADOW_FAR,
            POINT_SHADOW_MAP_RES,
        );
        let before = state.clone();
        state.set_direction(Vec3::X);
        state.set_cut_off(0.9);
        state.set_outer_cut_off(0.8);
        assert_eq!(state, before);

        let mut directional = LightState::directional(
            white(),
            Vec3::NEG_Y,
            DEFAULT_SHADOW_FAR,
            DEFAULT_SHADOW_MAP_RES,
        );
        let before = directional.clone();
        directional.set_position(Vec3::ONE);
        directional.set_attenuation(Attenuation::new(0.0, 0.0, 0.0));
        assert_eq!(directional, before);
    }
}
