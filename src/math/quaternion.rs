use std::ops::Mul;

use super::vector::Vec3;

/// Unit quaternion orientation `(x, y, z, w)`.
///
/// The product `a * b` applies `b` first, so a scene-graph world rotation
/// is `parent_world * local`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quat {
    fn default() -> Self {
        Quat::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Orientation from intrinsic XYZ euler angles (radians), built by
    /// half-angle composition. Equals `qx * qy * qz` of the individual
    /// axis rotations.
    pub fn from_euler(euler: Vec3) -> Self {
        let (sx, cx) = (euler.x / 2.0).sin_cos();
        let (sy, cy) = (euler.y / 2.0).sin_cos();
        let (sz, cz) = (euler.z / 2.0).sin_cos();

        Quat {
            x: sx * cy * cz + cx * sy * sz,
            y: cx * sy * cz - sx * cy * sz,
            z: cx * cy * sz + sx * sy * cz,
            w: cx * cy * cz - sx * sy * sz,
        }
    }

    /// Orientation rotating by `angle` radians about `axis`
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Self {
        let axis = axis.normalize();
        let (s, c) = (angle / 2.0).sin_cos();
        Quat {
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
            w: c,
        }
    }

    /// Recover `(axis, angle)` with `angle ∈ [0, π]`.
    ///
    /// A rotation by a negative angle comes back as the same rotation about
    /// the opposite axis; the identity reports the Y axis and zero angle.
    pub fn to_axis_angle(self) -> (Vec3, f64) {
        let v = Vec3::new(self.x, self.y, self.z);
        let len = v.length();
        if len == 0.0 {
            return (Vec3::UP, 0.0);
        }
        let angle = 2.0 * len.atan2(self.w);
        (v * (1.0 / len), angle)
    }

    pub fn conjugate(self) -> Quat {
        Quat::new(-self.x, -self.y, -self.z, self.w)
    }

    pub fn norm_squared(self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    /// Inverse rotation (conjugate over squared norm)
    pub fn inverse(self) -> Quat {
        let n = self.norm_squared();
        if n == 0.0 {
            return Quat::IDENTITY;
        }
        let c = self.conjugate();
        Quat::new(c.x / n, c.y / n, c.z / n, c.w / n)
    }

    pub fn normalize(self) -> Quat {
        let n = self.norm_squared().sqrt();
        if n == 0.0 {
            return Quat::IDENTITY;
        }
        Quat::new(self.x / n, self.y / n, self.z / n, self.w / n)
    }
}

impl Mul for Quat {
    type Output = Quat;

    /// Hamilton product; `rhs` is the rotation applied first.
    fn mul(self, rhs: Quat) -> Quat {
        let (a, b) = (self, rhs);
        Quat {
            x: a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            y: a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            z: a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_axis_angle_round_trip() {
        let axis = Vec3::new(1.0, 2.0, -0.5).normalize();
        // Sweep (−π, π) excluding the endpoints
        for i in 1..63 {
            let angle = -PI + (i as f64) * (2.0 * PI / 63.0);
            if angle == 0.0 {
                continue;
            }
            let q = Quat::from_axis_angle(axis, angle);
            let (axis_out, angle_out) = q.to_axis_angle();
            // (−axis, −angle) names the same rotation; compare the product
            assert_relative_eq!(axis_out.x * angle_out, axis.x * angle, epsilon = 1e-9);
            assert_relative_eq!(axis_out.y * angle_out, axis.y * angle, epsilon = 1e-9);
            assert_relative_eq!(axis_out.z * angle_out, axis.z * angle, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_euler_matches_axis_composition() {
        let e = Vec3::new(0.4, -0.9, 1.7);
        let qx = Quat::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), e.x);
        let qy = Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), e.y);
        let qz = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), e.z);
        let composed = qx * qy * qz;
        let direct = Quat::from_euler(e);
        assert_relative_eq!(direct.x, composed.x, epsilon = 1e-12);
        assert_relative_eq!(direct.y, composed.y, epsilon = 1e-12);
        assert_relative_eq!(direct.z, composed.z, epsilon = 1e-12);
        assert_relative_eq!(direct.w, composed.w, epsilon = 1e-12);
    }

    #[test]
    fn test_product_applies_rhs_first() {
        // Rotate +90° about Z first, then +90° about X: (1,0,0) → (0,1,0) → (0,0,1)
        let qz = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), PI / 2.0);
        let qx = Quat::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), PI / 2.0);
        let v = Vec3::new(1.0, 0.0, 0.0).rotate(qx * qz);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_cancels_rotation() {
        let q = Quat::from_euler(Vec3::new(0.2, 0.4, 0.6));
        let v = Vec3::new(3.0, -1.0, 2.0);
        let back = v.rotate(q).rotate(q.inverse());
        assert_relative_eq!(back.x, v.x, epsilon = 1e-12);
        assert_relative_eq!(back.y, v.y, epsilon = 1e-12);
        assert_relative_eq!(back.z, v.z, epsilon = 1e-12);
    }
}
