use glam::{Mat4, Vec3};
use rayon::prelude::*;

/// Axis-aligned bounding box. The empty box is the identity element of
/// `union`: +inf lower corner, -inf upper corner.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn of_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn include(self, p: Vec3) -> Self {
        self.union(Self::of_point(p))
    }

    /// Min/max reduction over all points. Associative and commutative, so
    /// the parallel reduction gives the same result for any chunking.
    pub fn from_points(points: &[Vec3]) -> Self {
        points
            .par_iter()
            .map(|&p| Self::of_point(p))
            .reduce(|| Self::EMPTY, Self::union)
    }

    pub fn center(&self) -> Vec3 {
        0.5 * (self.min + self.max)
    }

    pub fn diagonal(&self) -> f32 {
        (self.max - self.min).length()
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Conservative world-space box: transform the corners and re-wrap.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        self.corners()
            .iter()
            .fold(Self::EMPTY, |bb, &corner| {
                bb.include(matrix.transform_point3(corner))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_point_collapses_to_itself() {
        let v = Vec3::new(3.0, -1.0, 7.5);
        let bb = BoundingBox::from_points(&[v]);
        assert_eq!(bb.min, v);
        assert_eq!(bb.max, v);
    }

    #[test]
    fn reduction_is_order_invariant() {
        let points: Vec<Vec3> = (0..257)
            .map(|i| {
                let f = i as f32;
                Vec3::new((f * 1.3).sin() * 50.0, f - 100.0, (f * 0.7).cos() * 20.0)
            })
            .collect();
        let forward = BoundingBox::from_points(&points);

        let mut reversed = points.clone();
        reversed.reverse();
        assert_eq!(forward, BoundingBox::from_points(&reversed));

        // sequential fold must agree with the parallel reduction
        let sequential = points
            .iter()
            .fold(BoundingBox::EMPTY, |bb, &p| bb.include(p));
        assert_eq!(forward, sequential);
    }

    #[test]
    fn union_with_empty_is_identity() {
        let bb = BoundingBox::new(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(4.0, 1.0, 3.0));
        assert_eq!(bb.union(BoundingBox::EMPTY), bb);
        assert_eq!(BoundingBox::EMPTY.union(bb), bb);
    }

    #[test]
    fn transformed_wraps_rotated_corners() {
        let bb = BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let rotated = bb.transformed(&Mat4::from_rotation_y(std::f32::consts::FRAC_PI_4));
        let expected = 2.0_f32.sqrt();
        assert!((rotated.max.x - expected).abs() < 1e-5);
        assert!((rotated.max.z - expected).abs() < 1e-5);
        assert!((rotated.max.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn translation_moves_box() {
        let bb = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
        let moved = bb.transformed(&Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(moved.min, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(moved.max, Vec3::new(11.0, 1.0, 1.0));
    }
}
