use glam::{Mat4, Vec3, Vec4};

use crate::renderer::bounds::BoundingBox;

/// Six clip planes extracted from a combined projection*view matrix
/// (Gribb/Hartmann). Plane xyz is the inward normal, w the offset; a point
/// is inside when dot(n, p) + w >= 0.
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    pub fn from_matrix(matrix: Mat4) -> Self {
        let r0 = matrix.row(0);
        let r1 = matrix.row(1);
        let r2 = matrix.row(2);
        let r3 = matrix.row(3);
        Self {
            planes: [
                r3 + r0, // left
                r3 - r0, // right
                r3 + r1, // bottom
                r3 - r1, // top
                r3 + r2, // near
                r3 - r2, // far
            ],
        }
    }

    /// Conservative box test: a box is rejected only when it is fully
    /// outside one plane, so intersecting boxes are always kept.
    pub fn intersects(&self, bb: &BoundingBox) -> bool {
        for plane in &self.planes {
            let normal = plane.truncate();
            // farthest corner along the plane normal
            let p = Vec3::new(
                if normal.x >= 0.0 { bb.max.x } else { bb.min.x },
                if normal.y >= 0.0 { bb.max.y } else { bb.min.y },
                if normal.z >= 0.0 { bb.max.z } else { bb.min.z },
            );
            if normal.dot(p) + plane.w < 0.0 {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ortho_frustum() -> Frustum {
        Frustum::from_matrix(Mat4::orthographic_rh_gl(
            -10.0, 10.0, -10.0, 10.0, 0.1, 100.0,
        ))
    }

    #[test]
    fn box_inside_is_kept() {
        let frustum = ortho_frustum();
        let bb = BoundingBox::new(Vec3::new(-1.0, -1.0, -5.0), Vec3::new(1.0, 1.0, -2.0));
        assert!(frustum.intersects(&bb));
    }

    #[test]
    fn box_left_of_frustum_is_rejected() {
        let frustum = ortho_frustum();
        let bb = BoundingBox::new(Vec3::new(-50.0, -1.0, -5.0), Vec3::new(-20.0, 1.0, -2.0));
        assert!(!frustum.intersects(&bb));
    }

    #[test]
    fn box_behind_near_plane_is_rejected() {
        let frustum = ortho_frustum();
        let bb = BoundingBox::new(Vec3::new(-1.0, -1.0, 5.0), Vec3::new(1.0, 1.0, 10.0));
        assert!(!frustum.intersects(&bb));
    }

    #[test]
    fn straddling_box_is_kept() {
        let frustum = ortho_frustum();
        let bb = BoundingBox::new(Vec3::new(5.0, -1.0, -5.0), Vec3::new(25.0, 1.0, -2.0));
        assert!(frustum.intersects(&bb));
    }
}
