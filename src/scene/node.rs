use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::camera::Camera;
use super::light::Light;
use super::object::SceneObject;
use super::transform::Transform;
use super::NodeId;
use crate::constants::physics::PUSH_ABSORB_THRESHOLD;
use crate::math::{Mat4, Quat, Vec3};
use crate::physics::Aabb;

/// What a node is to the renderer and the collision pipeline. Camera and
/// light nodes never collide and carry no hull.
#[derive(Debug, Default)]
pub enum Role {
    #[default]
    Plain,
    Camera(Box<Camera>),
    Light(Light),
}

/// One live entity in the scene arena.
///
/// Everything mutable lives here; the template behind `object` is shared
/// and immutable. The world-space `collider` is refreshed every tick from
/// the template hull and the current model matrix.
pub struct Node {
    pub id: NodeId,
    pub object: Arc<SceneObject>,
    pub transform: Transform,
    /// Local transform as of the start of the tick, for interpolation
    /// consumers
    pub prev_transform: Transform,
    pub role: Role,
    pub hidden: bool,
    pub tint: [u8; 4],
    pub spawn_time: Instant,
    /// Typed per-controller state; controllers downcast at the call site
    pub data: Option<Box<dyn Any + Send>>,

    pub mass: f64,
    pub terminal_velocity: f64,
    pub gravity_velocity: Vec3,
    pub translation_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub linear_momentum: Vec3,
    pub angular_momentum: Vec3,
    /// World-space convex hull under the current model matrix
    pub collider: Vec<Vec3>,
    /// Collides but does not move
    pub is_kinematic: bool,
    /// Nodes contacted this tick, oldest first
    pub collision_targets: Vec<NodeId>,

    model: Mat4,
}

impl Node {
    /// Bare node for the given template; the scene assigns transforms and
    /// role during spawn
    pub fn build(id: NodeId, object: Arc<SceneObject>, mass: f64, terminal_velocity: f64) -> Self {
        Self {
            id,
            object,
            transform: Transform::new(None),
            prev_transform: Transform::new(None),
            role: Role::Plain,
            hidden: false,
            tint: [255; 4],
            spawn_time: Instant::now(),
            data: None,
            mass,
            terminal_velocity,
            gravity_velocity: Vec3::ZERO,
            translation_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            linear_momentum: Vec3::ZERO,
            angular_momentum: Vec3::ZERO,
            collider: Vec::new(),
            is_kinematic: false,
            collision_targets: Vec::new(),
            model: Mat4::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.transform.parent
    }

    pub fn camera(&self) -> Option<&Camera> {
        match &self.role {
            Role::Camera(c) => Some(c),
            _ => None,
        }
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        match &mut self.role {
            Role::Camera(c) => Some(c),
            _ => None,
        }
    }

    pub fn light(&self) -> Option<&Light> {
        match &self.role {
            Role::Light(l) => Some(l),
            _ => None,
        }
    }

    pub fn light_mut(&mut self) -> Option<&mut Light> {
        match &mut self.role {
            Role::Light(l) => Some(l),
            _ => None,
        }
    }

    /// A node without a physics template is static: immovable and
    /// mass-infinite for collision transfer
    pub fn is_static(&self) -> bool {
        self.object.physics.is_none()
    }

    /// Dynamic nodes integrate and respond to contacts. Zero mass means
    /// massless/visual: the node keeps its physics template but never
    /// moves on its own.
    pub fn is_dynamic(&self) -> bool {
        !self.is_static() && !self.is_kinematic && self.mass > 0.0
    }

    pub fn age(&self) -> Duration {
        self.spawn_time.elapsed()
    }

    /// Typed view of the controller state
    pub fn state<T: 'static>(&self) -> Option<&T> {
        self.data.as_ref()?.downcast_ref::<T>()
    }

    pub fn state_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.data.as_mut()?.downcast_mut::<T>()
    }

    pub fn set_state<T: Any + Send>(&mut self, state: T) {
        self.data = Some(Box::new(state));
    }

    // --- transform helpers -------------------------------------------------

    pub fn move_by(&mut self, x: f64, y: f64, z: f64) {
        self.transform.position += Vec3::new(x, y, z);
    }

    pub fn move_at(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    /// Step toward `target`, distributing the step across axes in
    /// proportion to their remaining distance
    pub fn move_toward(&mut self, target: Vec3, step: f64) {
        let pos = self.transform.position;
        let d = pos.distance_to(target);
        let s = d.min(step);
        if s <= 0.0 {
            return;
        }

        let dx = (target.x - pos.x).abs();
        let dy = (target.y - pos.y).abs();
        let dz = (target.z - pos.z).abs();
        let total = dx + dy + dz;
        if total == 0.0 {
            return;
        }

        let sv = Vec3::new(dx / total * s, dy / total * s, dz / total * s);
        self.transform.position.x += sv.x * (target.x - pos.x).signum();
        self.transform.position.y += sv.y * (target.y - pos.y).signum();
        self.transform.position.z += sv.z * (target.z - pos.z).signum();
    }

    /// Compose an euler rotation delta (world axes) onto the orientation
    pub fn rotate(&mut self, euler: Vec3) {
        self.transform.rotation = Quat::from_euler(euler) * self.transform.rotation;
    }

    pub fn rotate_x(&mut self, angle: f64) {
        self.rotate(Vec3::new(angle, 0.0, 0.0));
    }

    pub fn rotate_y(&mut self, angle: f64) {
        self.rotate(Vec3::new(0.0, angle, 0.0));
    }

    pub fn rotate_z(&mut self, angle: f64) {
        self.rotate(Vec3::new(0.0, 0.0, angle));
    }

    /// Replace the orientation from euler angles
    pub fn set_rotation(&mut self, euler: Vec3) {
        self.transform.rotation = Quat::from_euler(euler);
    }

    pub fn resize(&mut self, x: f64, y: f64, z: f64) {
        self.transform.scale += Vec3::new(x, y, z);
        if let Some(camera) = self.camera_mut() {
            camera.update_projection_matrix();
        }
    }

    pub fn scale_at(&mut self, x: f64, y: f64) {
        self.transform.scale.x = x;
        self.transform.scale.y = y;
        if let Some(camera) = self.camera_mut() {
            camera.update_projection_matrix();
        }
    }

    // --- physics -----------------------------------------------------------

    /// Push a force of `intensity` along `direction` at a local point
    /// (each component in `[0, 1]`, `(0.5, 0.5, 0.5)` is the center).
    ///
    /// The force decomposes into a torque about the center and a
    /// translational residual; per-mass magnitudes below the absorb
    /// threshold produce no motion. Linear acceleration is `F/m`.
    pub fn push(&mut self, direction: Vec3, intensity: f64, local_point: Vec3) {
        if self.mass <= 0.0 {
            return;
        }

        let force = direction.normalize() * intensity;
        let arm = (local_point - Vec3::splat(0.5)).rotate(self.transform.rotation);
        let torque = arm.cross(force);

        if torque.length() / self.mass > PUSH_ABSORB_THRESHOLD {
            self.angular_velocity += torque * (1.0 / self.mass);
        }

        let torque_dir = torque.normalize();
        let residual = force - torque_dir * force.dot(torque_dir);
        if residual.length() / self.mass > PUSH_ABSORB_THRESHOLD {
            self.translation_velocity += residual * (1.0 / self.mass);
        }
    }

    /// Rebuild the world-space collider from the template hull and the
    /// resolved world transform. Camera and light nodes, and templates
    /// without a hull, clear it instead.
    pub fn refresh_collider(&mut self, world_rotation: Quat, world_position: Vec3) {
        self.collider.clear();

        if !matches!(self.role, Role::Plain) {
            return;
        }
        let Some(shape) = self.object.shape.as_ref() else {
            return;
        };
        if shape.collider.is_empty() {
            return;
        }

        self.transform
            .model_into(&mut self.model, world_rotation, world_position);
        let model = *self.model.out();
        self.collider
            .extend(shape.collider.iter().map(|p| p.mul_matrix(&model).0));
    }

    /// Model matrix under the resolved world transform
    pub fn model_matrix(
        &mut self,
        world_rotation: Quat,
        world_position: Vec3,
    ) -> &crate::math::MatrixData {
        self.transform
            .model_into(&mut self.model, world_rotation, world_position);
        self.model.out()
    }

    /// Bounding box of the current collider
    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(&self.collider)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let role = match &self.role {
            Role::Plain => "object",
            Role::Camera(_) => "camera",
            Role::Light(_) => "light",
        };
        write!(
            f,
            "{} id={} object_id={} pos={:?}",
            role, self.id, self.object.id, self.transform.position
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{PhysicsTemplate, SceneObjectArgs};

    fn cube_node(mass: f64) -> Node {
        let object = SceneObject::new(SceneObjectArgs {
            physics: Some(PhysicsTemplate {
                mass,
                collision_layer: 1,
            }),
            shape: Some(crate::shape::cube()),
            ..Default::default()
        });
        Node::build(1, object, mass, 1.0)
    }

    #[test]
    fn test_move_toward_stops_at_target() {
        let mut node = cube_node(1.0);
        let target = Vec3::new(3.0, 0.0, 0.0);
        for _ in 0..100 {
            node.move_toward(target, 0.5);
        }
        assert!(node.transform.position.distance_to(target) < 1e-9);
    }

    #[test]
    fn test_move_toward_distributes_across_axes() {
        let mut node = cube_node(1.0);
        node.move_toward(Vec3::new(1.0, 1.0, 0.0), 0.5);
        let p = node.transform.position;
        assert!((p.x - 0.25).abs() < 1e-12);
        assert!((p.y - 0.25).abs() < 1e-12);
        assert_eq!(p.z, 0.0);
    }

    #[test]
    fn test_refresh_collider_tracks_world_position() {
        let mut node = cube_node(1.0);
        node.refresh_collider(Quat::IDENTITY, Vec3::new(10.0, 0.0, 0.0));
        let aabb = node.aabb();
        assert_eq!(aabb.min.x, 9.0);
        assert_eq!(aabb.max.x, 11.0);
    }

    #[test]
    fn test_camera_node_has_no_collider() {
        let object = SceneObject::new(SceneObjectArgs {
            shape: Some(crate::shape::cube()),
            ..Default::default()
        });
        let mut node = Node::build(1, object, 0.0, 0.0);
        node.role = Role::Camera(Box::new(Camera::new(&Default::default())));
        node.refresh_collider(Quat::IDENTITY, Vec3::ZERO);
        assert!(node.collider.is_empty());
        assert!(node.aabb().is_empty());
    }

    #[test]
    fn test_push_through_center_is_purely_linear() {
        let mut node = cube_node(1.0);
        node.push(Vec3::new(1.0, 0.0, 0.0), 10.0, Vec3::splat(0.5));
        assert_eq!(node.angular_velocity, Vec3::ZERO);
        assert!((node.translation_velocity.x - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_off_center_push_adds_spin() {
        let mut node = cube_node(1.0);
        node.push(Vec3::new(0.0, 0.0, 1.0), 100.0, Vec3::new(0.5, 1.0, 0.5));
        // Arm (0, 0.5, 0) × force (0, 0, 100) spins about +X
        assert!(node.angular_velocity.x > 0.0);
        assert!(node.translation_velocity.z > 0.0);
    }

    #[test]
    fn test_weak_push_is_absorbed() {
        let mut node = cube_node(100.0);
        node.push(Vec3::new(1.0, 0.0, 0.0), 1.0, Vec3::splat(0.5));
        assert_eq!(node.translation_velocity, Vec3::ZERO);
        assert_eq!(node.angular_velocity, Vec3::ZERO);
    }

    #[test]
    fn test_typed_state_round_trip() {
        struct AimState {
            charge: f64,
        }
        let mut node = cube_node(1.0);
        node.set_state(AimState { charge: 0.5 });
        node.state_mut::<AimState>().unwrap().charge = 0.75;
        assert_eq!(node.state::<AimState>().unwrap().charge, 0.75);
        assert!(node.state::<u32>().is_none());
    }
}
