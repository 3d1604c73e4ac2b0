use super::quaternion::Quat;
use super::vector::Vec3;

/// Raw column-major 4x4 matrix storage (OpenGL element order)
pub type MatrixData = [f64; 16];

pub const IDENTITY: MatrixData = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Composable 4x4 transform builder.
///
/// Each builder call stages an elementary matrix in a scratch buffer and
/// multiplies it onto the accumulated result through a second scratch
/// buffer, so a chain of calls performs no allocation. A later call in the
/// chain applies *after* the earlier ones (column-vector convention):
/// `m.scale(s).translate(t)` scales first.
#[derive(Debug, Clone)]
pub struct Mat4 {
    out: MatrixData,
    buf: MatrixData,
    buf2: MatrixData,
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mat4 {
    pub fn new() -> Self {
        Self {
            out: IDENTITY,
            buf: IDENTITY,
            buf2: IDENTITY,
        }
    }

    /// The accumulated matrix
    pub fn out(&self) -> &MatrixData {
        &self.out
    }

    pub fn to_data(&self) -> MatrixData {
        self.out
    }

    pub fn reset(&mut self) -> &mut Self {
        self.out = IDENTITY;
        self.buf = IDENTITY;
        self
    }

    /// `out = b × a`, writing every element of `out`; `out` must not alias
    /// the operands.
    fn mul4(out: &mut MatrixData, b: &MatrixData, a: &MatrixData) {
        for c in 0..4 {
            let (a0, a1, a2, a3) = (a[c * 4], a[c * 4 + 1], a[c * 4 + 2], a[c * 4 + 3]);
            out[c * 4] = b[0] * a0 + b[4] * a1 + b[8] * a2 + b[12] * a3;
            out[c * 4 + 1] = b[1] * a0 + b[5] * a1 + b[9] * a2 + b[13] * a3;
            out[c * 4 + 2] = b[2] * a0 + b[6] * a1 + b[10] * a2 + b[14] * a3;
            out[c * 4 + 3] = b[3] * a0 + b[7] * a1 + b[11] * a2 + b[15] * a3;
        }
    }

    /// Multiply the staged elementary matrix onto the accumulator
    fn apply_buf(&mut self) {
        Self::mul4(&mut self.buf2, &self.buf, &self.out);
        self.out = self.buf2;
    }

    /// Apply an arbitrary matrix on top of the accumulated transform
    pub fn mult(&mut self, m: &MatrixData) -> &mut Self {
        self.buf = *m;
        self.apply_buf();
        self
    }

    pub fn scale(&mut self, s: Vec3) -> &mut Self {
        self.buf = IDENTITY;
        self.buf[0] = s.x;
        self.buf[5] = s.y;
        self.buf[10] = s.z;
        self.apply_buf();
        self
    }

    pub fn translate(&mut self, p: Vec3) -> &mut Self {
        self.buf = IDENTITY;
        self.buf[12] = p.x;
        self.buf[13] = p.y;
        self.buf[14] = p.z;
        self.apply_buf();
        self
    }

    pub fn rotate(&mut self, q: Quat) -> &mut Self {
        let (xx, yy, zz) = (q.x * q.x, q.y * q.y, q.z * q.z);

        self.buf = IDENTITY;
        self.buf[0] = 1.0 - 2.0 * yy - 2.0 * zz;
        self.buf[1] = 2.0 * q.x * q.y + 2.0 * q.z * q.w;
        self.buf[2] = 2.0 * q.x * q.z - 2.0 * q.y * q.w;

        self.buf[4] = 2.0 * q.x * q.y - 2.0 * q.z * q.w;
        self.buf[5] = 1.0 - 2.0 * xx - 2.0 * zz;
        self.buf[6] = 2.0 * q.y * q.z + 2.0 * q.x * q.w;

        self.buf[8] = 2.0 * q.x * q.z + 2.0 * q.y * q.w;
        self.buf[9] = 2.0 * q.y * q.z - 2.0 * q.x * q.w;
        self.buf[10] = 1.0 - 2.0 * xx - 2.0 * yy;

        self.apply_buf();
        self
    }

    /// View transform looking from `eye` toward `center`, world up `+Y`
    pub fn look_at(&mut self, center: Vec3, eye: Vec3) -> &mut Self {
        let zaxis = (center - eye).normalize();
        let xaxis = zaxis.cross(Vec3::UP).normalize();
        let yaxis = xaxis.cross(zaxis);

        // Translate to the eye, then rotate into the view basis
        self.translate(-eye);

        self.buf = IDENTITY;
        self.buf[0] = xaxis.x;
        self.buf[1] = yaxis.x;
        self.buf[2] = zaxis.x;
        self.buf[4] = xaxis.y;
        self.buf[5] = yaxis.y;
        self.buf[6] = zaxis.y;
        self.buf[8] = xaxis.z;
        self.buf[9] = yaxis.z;
        self.buf[10] = zaxis.z;
        self.apply_buf();
        self
    }

    pub fn orthographic(
        &mut self,
        right: f64,
        left: f64,
        top: f64,
        bottom: f64,
        near: f64,
        far: f64,
    ) -> &mut Self {
        self.buf = IDENTITY;
        self.buf[0] = 2.0 / (right - left);
        self.buf[12] = -(right + left) / (right - left);
        self.buf[5] = 2.0 / (top - bottom);
        self.buf[13] = -(top + bottom) / (top - bottom);
        self.buf[10] = -2.0 / (far - near);
        self.buf[14] = -(far + near) / (far - near);
        self.apply_buf();
        self
    }

    pub fn perspective(&mut self, fov: f64, aspect_ratio: f64, near: f64, far: f64) -> &mut Self {
        let f = (std::f64::consts::PI * 0.5 - 0.5 * fov).tan();
        let range_inv = 1.0 / (near - far);
        self.buf = IDENTITY;
        self.buf[0] = f / aspect_ratio;
        self.buf[5] = f;
        self.buf[10] = far * range_inv;
        self.buf[11] = -1.0;
        self.buf[14] = near * far * range_inv;
        self.apply_buf();
        self
    }

    /// Transpose in place. Unused by the pipeline but part of the public
    /// surface for clients that want row-major output.
    pub fn flip(&mut self) -> &mut Self {
        for i in 0..16 {
            self.buf[i] = self.out[(i / 4) + 4 * (i % 4)];
        }
        self.out = self.buf;
        self
    }

    pub fn equals(&self, m: &MatrixData) -> bool {
        self.out.iter().zip(m.iter()).all(|(a, b)| a == b)
    }
}
