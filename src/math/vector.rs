use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use super::matrix::MatrixData;
use super::quaternion::Quat;

/// 2D vector, used for UV coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 3D vector in world or object space
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);
    pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn splat(v: f64) -> Self {
        Self { x: v, y: v, z: v }
    }

    pub fn dot(self, o: Vec3) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    pub fn cross(self, o: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * o.z - self.z * o.y,
            y: self.z * o.x - self.x * o.z,
            z: self.x * o.y - self.y * o.x,
        }
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn normalize(self) -> Vec3 {
        let len = self.length();
        if len == 0.0 {
            Vec3::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    pub fn opposite(self) -> Vec3 {
        -self
    }

    /// Componentwise product
    pub fn scale(self, o: Vec3) -> Vec3 {
        Vec3 {
            x: self.x * o.x,
            y: self.y * o.y,
            z: self.z * o.z,
        }
    }

    pub fn distance_to(self, o: Vec3) -> f64 {
        (o - self).length()
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Rotate by a unit quaternion (`v' = q v q⁻¹`)
    pub fn rotate(self, q: Quat) -> Vec3 {
        let u = Vec3::new(q.x, q.y, q.z);
        let t = u.cross(self) * 2.0;
        self + t * q.w + u.cross(t)
    }

    /// Multiply by a column-major 4x4 matrix as `(x, y, z, 1)`.
    ///
    /// Returns the transformed point and the resulting `w` component; the
    /// perspective divide is left to the caller.
    pub fn mul_matrix(self, m: &MatrixData) -> (Vec3, f64) {
        let out = Vec3 {
            x: m[0] * self.x + m[4] * self.y + m[8] * self.z + m[12],
            y: m[1] * self.x + m[5] * self.y + m[9] * self.z + m[13],
            z: m[2] * self.x + m[6] * self.y + m[10] * self.z + m[14],
        };
        let w = m[3] * self.x + m[7] * self.y + m[11] * self.z + m[15];
        (out, w)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, o: Vec3) {
        *self = *self + o;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, o: Vec3) {
        *self = *self - o;
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f64) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }

    #[test]
    fn test_normalize_unit_length() {
        let v = Vec3::new(3.0, -4.0, 12.0).normalize();
        assert_relative_eq!(v.length(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cross_follows_right_hand_rule() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(y), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(y.cross(x), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_rotate_quarter_turn_about_y() {
        let q = Quat::from_axis_angle(Vec3::UP, PI / 2.0);
        let v = Vec3::new(1.0, 0.0, 0.0).rotate(q);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.z, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotate_preserves_length() {
        let q = Quat::from_euler(Vec3::new(0.3, -1.1, 2.2));
        let v = Vec3::new(1.5, -2.5, 0.25);
        assert_relative_eq!(v.rotate(q).length(), v.length(), epsilon = 1e-12);
    }
}
