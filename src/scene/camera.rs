use crate::math::{clamp, Mat4, MatrixData, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// Per-scene defaults applied to every camera a session spawns
#[derive(Debug, Clone, Copy)]
pub struct CameraSettings {
    pub projection: Projection,
    /// Vertical field of view in radians (perspective only)
    pub fov: f64,
    pub near: f64,
    pub far: f64,
    /// World units per screen unit (orthographic only)
    pub scale: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective,
            fov: 70.0_f64.to_radians(),
            near: 0.1,
            far: 100.0,
            scale: 0.05,
        }
    }
}

impl CameraSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.near <= 0.0 || self.far <= self.near {
            anyhow::bail!(
                "CameraSettings: near/far planes out of order ({} / {})",
                self.near,
                self.far
            );
        }
        if self.fov <= 0.0 || self.fov >= std::f64::consts::PI {
            anyhow::bail!("CameraSettings: fov {} out of (0, π)", self.fov);
        }
        if self.scale <= 0.0 {
            anyhow::bail!("CameraSettings: scale must be positive");
        }
        Ok(())
    }
}

/// Viewer state attached to a camera node.
///
/// The look direction comes from pitch/yaw; the projection matrix is
/// cached and rebuilt when a setting changes, the view matrix is rebuilt
/// from the owning node's world transform every snapshot.
#[derive(Debug, Clone)]
pub struct Camera {
    pub width: f64,
    pub height: f64,
    pub aspect_ratio: f64,

    pub projection: Projection,
    pub fov: f64,
    pub near: f64,
    pub far: f64,
    pub scale: f64,

    pitch_yaw_roll: Vec3,

    projection_matrix: Mat4,
    view_matrix: Mat4,
}

impl Camera {
    pub fn new(settings: &CameraSettings) -> Self {
        let mut camera = Self {
            width: 1.0,
            height: 1.0,
            aspect_ratio: 1.0,
            projection: settings.projection,
            fov: settings.fov,
            near: settings.near,
            far: settings.far,
            scale: settings.scale,
            pitch_yaw_roll: Vec3::new(0.0, -std::f64::consts::PI / 2.0, 0.0),
            projection_matrix: Mat4::new(),
            view_matrix: Mat4::new(),
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect_ratio = width as f64 / height as f64;
        if self.aspect_ratio > 1.0 {
            self.width = 1.0;
            self.height = 1.0 / self.aspect_ratio;
        } else {
            self.width = self.aspect_ratio;
            self.height = 1.0;
        }
        self.update_projection_matrix();
    }

    pub fn set_near(&mut self, near: f64) {
        self.near = near;
        self.update_projection_matrix();
    }

    pub fn set_far(&mut self, far: f64) {
        self.far = far;
        self.update_projection_matrix();
    }

    pub fn set_fov(&mut self, fov: f64) {
        self.fov = fov;
        self.update_projection_matrix();
    }

    pub fn set_projection(&mut self, projection: Projection) {
        if self.projection != projection {
            self.projection = projection;
            self.update_projection_matrix();
        }
    }

    /// Unit look direction from pitch and yaw
    pub fn look_at(&self) -> Vec3 {
        let pitch = self.pitch_yaw_roll.x;
        let yaw = self.pitch_yaw_roll.y;
        let xz_len = pitch.cos();
        Vec3::new(xz_len * yaw.cos(), pitch.sin(), xz_len * (-yaw).sin())
    }

    /// Accumulate look deltas; pitch clamps short of the poles, yaw wraps
    pub fn update_pitch_yaw_roll(&mut self, pitch: f64, yaw: f64, roll: f64) {
        self.pitch_yaw_roll.x = clamp(self.pitch_yaw_roll.x + pitch, -1.2, 1.2);
        self.pitch_yaw_roll.y += yaw;
        if self.pitch_yaw_roll.y.abs() >= std::f64::consts::PI * 2.0 {
            self.pitch_yaw_roll.y = 0.0;
        }
        self.pitch_yaw_roll.z += roll;
    }

    pub fn pitch_yaw_roll(&self) -> Vec3 {
        self.pitch_yaw_roll
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix.reset();
        match self.projection {
            Projection::Perspective => {
                self.projection_matrix
                    .perspective(self.fov, self.aspect_ratio, self.near, self.far);
            }
            Projection::Orthographic => {
                let half_w = self.width / self.scale / 2.0;
                let half_h = self.height / self.scale / 2.0;
                self.projection_matrix
                    .orthographic(half_w, -half_w, half_h, -half_h, self.near, self.far);
            }
        }
    }

    pub fn projection_matrix(&self) -> &MatrixData {
        self.projection_matrix.out()
    }

    /// Rebuild the view matrix from the owning node's world transform
    pub fn view_matrix(&mut self, world_position: Vec3, world_rotation: Quat) -> &MatrixData {
        self.view_matrix.reset();
        self.view_matrix
            .look_at(world_position, world_position + self.look_at());
        self.view_matrix.rotate(world_rotation.inverse());
        self.view_matrix.out()
    }
}
