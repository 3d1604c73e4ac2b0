use super::NodeId;
use crate::math::{Mat4, Quat, Vec3};

/// Local spatial state of a node.
///
/// World position is the recursive sum of local positions up the parent
/// chain; world rotation is the recursive composition of local rotations
/// with the parent applied after the child. Parent resolution happens in
/// the scene arena, so the transform itself only stores the id.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    /// Center of rotation in object space
    pub pivot: Vec3,
    pub scale: Vec3,
    pub parent: Option<NodeId>,
}

impl Transform {
    pub fn new(parent: Option<NodeId>) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            pivot: Vec3::ZERO,
            scale: Vec3::ONE,
            parent,
        }
    }

    /// Build the object→world model matrix into `m`:
    /// `Scale · Translate(−pivot) · Rotate(worldRot) · Translate(pivot) ·
    /// Translate(worldPos)`, earlier factors applied first.
    pub fn model_into(&self, m: &mut Mat4, world_rotation: Quat, world_position: Vec3) {
        m.reset();
        m.scale(self.scale);
        m.translate(-self.pivot);
        m.rotate(world_rotation);
        m.translate(self.pivot);
        m.translate(world_position);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_scales_before_rotating() {
        let mut t = Transform::new(None);
        t.scale = Vec3::new(2.0, 1.0, 1.0);
        let rot = Quat::from_euler(Vec3::new(0.0, 0.0, std::f64::consts::PI / 2.0));

        let mut m = Mat4::new();
        t.model_into(&mut m, rot, Vec3::ZERO);

        // (1, 0, 0) scales to (2, 0, 0), then rotates +90° about Z to (0, 2, 0)
        let (p, _) = Vec3::new(1.0, 0.0, 0.0).mul_matrix(m.out());
        assert!(p.x.abs() < 1e-12);
        assert!((p.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_model_translates_last() {
        let t = Transform::new(None);
        let mut m = Mat4::new();
        t.model_into(&mut m, Quat::IDENTITY, Vec3::new(10.0, -2.0, 3.0));

        let (p, _) = Vec3::ZERO.mul_matrix(m.out());
        assert_eq!(p, Vec3::new(10.0, -2.0, 3.0));
    }

    #[test]
    fn test_pivot_offsets_rotation_center() {
        let mut t = Transform::new(None);
        t.pivot = Vec3::new(1.0, 0.0, 0.0);
        let rot = Quat::from_euler(Vec3::new(0.0, 0.0, std::f64::consts::PI));

        let mut m = Mat4::new();
        t.model_into(&mut m, rot, Vec3::ZERO);

        // The pivot point itself is fixed by the rotation
        let (p, _) = t.pivot.mul_matrix(m.out());
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!(p.y.abs() < 1e-12);
    }
}
