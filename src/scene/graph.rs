use std::any::Any;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use rustc_hash::FxHashMap;

use super::camera::{Camera, CameraSettings};
use super::input::InputEvent;
use super::node::{Node, Role};
use super::object::{Controller, SceneObject, Space};
use super::NodeId;
use crate::constants::buffer_sizes::SCENE_QUEUE_CAPACITY;
use crate::constants::physics::GRAVITY_Y;
use crate::math::{Quat, Vec3};
use crate::physics::{self, integrator, Aabb, Bounded};

/// Spawn-time parameters. `rotation` is euler radians; a zero `scale`
/// means the default unit scale; `mass` overrides the template mass when
/// non-zero.
#[derive(Default)]
pub struct SpawnArgs {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub parent: Option<NodeId>,
    pub mass: f64,
    pub hidden: bool,
    pub tint: Option<[u8; 4]>,
    pub data: Option<Box<dyn Any + Send>>,
    pub role: Role,
}

struct PendingSpawn {
    id: NodeId,
    object: Arc<SceneObject>,
    args: SpawnArgs,
}

enum SceneCommand {
    Spawn(Box<PendingSpawn>),
    Destroy(NodeId),
    Input(InputEvent, NodeId),
}

/// Cloneable handle onto the deferred command queue.
///
/// Ids are reserved at enqueue time from the same monotonic counter the
/// drain path honors, so `spawn` can hand back the id immediately while
/// the node itself becomes live at the next tick.
#[derive(Clone)]
pub struct SceneQueue {
    tx: Sender<SceneCommand>,
    next_id: Arc<AtomicU32>,
}

impl SceneQueue {
    pub fn spawn(&self, object: &Arc<SceneObject>, args: SpawnArgs) -> NodeId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.send(SceneCommand::Spawn(Box::new(PendingSpawn {
            id,
            object: Arc::clone(object),
            args,
        })));
        id
    }

    pub fn destroy(&self, id: NodeId) {
        self.send(SceneCommand::Destroy(id));
    }

    pub fn push_input(&self, event: InputEvent, source: NodeId) {
        self.send(SceneCommand::Input(event, source));
    }

    fn send(&self, command: SceneCommand) {
        match self.tx.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::warn!("[scene] command queue full, dropping command");
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("[scene] command queue disconnected, dropping command");
            }
        }
    }
}

/// Record of a node removed during the last tick, kept so the state
/// store can emit the matching tombstone.
#[derive(Debug, Clone, Copy)]
pub struct Departed {
    pub id: NodeId,
    pub kind: DepartedKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartedKind {
    /// Streamed instance; sessions need an `InstanceDeleted` tombstone
    Instance,
    /// Light node; sessions need a `LightDeleted` tombstone
    Light,
    /// Camera node; its state block is dropped without a tombstone
    Camera,
    /// Never streamed, nothing to announce
    Silent,
}

/// Scene construction options
pub struct SceneOptions {
    /// Settings applied to every camera a session spawns
    pub camera: CameraSettings,
    /// Controller attached to session camera nodes
    pub camera_controller: Option<Arc<dyn Controller>>,
    pub gravity: Vec3,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            camera: CameraSettings::default(),
            camera_controller: None,
            gravity: Vec3::new(0.0, GRAVITY_Y, 0.0),
        }
    }
}

type CameraHook = Box<dyn Fn(NodeId, &SceneQueue) + Send + Sync>;

/// The authoritative world: an id-keyed node arena plus the tick loop
/// that advances it.
pub struct Scene {
    nodes: FxHashMap<NodeId, Node>,
    /// Draw order: world space before screen space, then z and id descending
    order: Vec<NodeId>,
    queue: SceneQueue,
    rx: Receiver<SceneCommand>,

    new_nodes: Vec<NodeId>,
    departed: Vec<Departed>,
    faulted: Vec<NodeId>,

    gravity: Vec3,
    camera_settings: CameraSettings,
    camera_object: Arc<SceneObject>,
    camera_hooks: Vec<CameraHook>,

    tick_count: u64,
}

impl Scene {
    pub fn new(options: SceneOptions) -> Self {
        let (tx, rx) = bounded(SCENE_QUEUE_CAPACITY);
        let camera_object = SceneObject::new(super::object::SceneObjectArgs {
            controller: options.camera_controller,
            ..Default::default()
        });
        Self {
            nodes: FxHashMap::default(),
            order: Vec::new(),
            queue: SceneQueue {
                tx,
                next_id: Arc::new(AtomicU32::new(1)),
            },
            rx,
            new_nodes: Vec::new(),
            departed: Vec::new(),
            faulted: Vec::new(),
            gravity: options.gravity,
            camera_settings: options.camera,
            camera_object,
            camera_hooks: Vec::new(),
            tick_count: 0,
        }
    }

    /// Handle for enqueueing spawns, destroys and input from any thread
    pub fn queue(&self) -> SceneQueue {
        self.queue.clone()
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Enqueue a node creation; it becomes live at the next tick
    pub fn spawn(&self, object: &Arc<SceneObject>, args: SpawnArgs) -> NodeId {
        self.queue.spawn(object, args)
    }

    /// Enqueue removal of a node and every descendant
    pub fn destroy(&self, id: NodeId) {
        self.queue.destroy(id);
    }

    /// Instantiate the scene's camera template with the default settings
    pub fn spawn_camera(&self) -> NodeId {
        let camera = Camera::new(&self.camera_settings);
        self.queue.spawn(
            &self.camera_object,
            SpawnArgs {
                role: Role::Camera(Box::new(camera)),
                ..Default::default()
            },
        )
    }

    /// Run `hook` for every camera node committed from now on
    pub fn with_camera(&mut self, hook: impl Fn(NodeId, &SceneQueue) + Send + Sync + 'static) {
        self.camera_hooks.push(Box::new(hook));
    }

    /// Enqueue an input event for dispatch at the next tick to every
    /// controller on a descendant of `source`
    pub fn receive_input(&self, event: InputEvent, source: NodeId) {
        self.queue.push_input(event, source);
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in draw order
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Nodes committed during the last tick
    pub fn new_nodes(&self) -> &[NodeId] {
        &self.new_nodes
    }

    /// Nodes removed during the last tick
    pub fn departed(&self) -> &[Departed] {
        &self.departed
    }

    /// Recursive sum of local positions up the parent chain
    pub fn world_position(&self, id: NodeId) -> Vec3 {
        let mut sum = Vec3::ZERO;
        let mut cursor = Some(id);
        while let Some(i) = cursor {
            let Some(node) = self.nodes.get(&i) else { break };
            sum += node.transform.position;
            cursor = node.transform.parent;
        }
        sum
    }

    /// Child-first composition of local rotations up the parent chain
    pub fn world_rotation(&self, id: NodeId) -> Quat {
        let mut locals = Vec::new();
        let mut cursor = Some(id);
        while let Some(i) = cursor {
            let Some(node) = self.nodes.get(&i) else { break };
            locals.push(node.transform.rotation);
            cursor = node.transform.parent;
        }
        // Root first, each child applied before its parent's rotation
        let mut world = Quat::IDENTITY;
        for local in locals.into_iter().rev() {
            world = world * local;
        }
        world
    }

    pub fn world_of(&self, id: NodeId) -> (Vec3, Quat) {
        (self.world_position(id), self.world_rotation(id))
    }

    /// True when `ancestor` appears on `id`'s parent chain (or is `id`)
    pub fn is_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(i) = cursor {
            if i == ancestor {
                return true;
            }
            cursor = self.nodes.get(&i).and_then(|n| n.transform.parent);
        }
        false
    }

    /// Advance the world by one tick.
    ///
    /// Order: drain the deferred queue, snapshot transforms, run
    /// controllers, integrate physics, refresh colliders, run the
    /// collision pipeline, reap faulted controllers, re-sort draw order.
    pub fn tick(&mut self, dt: Duration) {
        self.new_nodes.clear();
        self.departed.clear();
        self.tick_count += 1;

        self.drain_queue();
        self.snapshot_transforms();
        self.run_controllers(dt);
        self.run_physics(dt);
        self.refresh_colliders();
        self.run_collisions();
        self.reap_faulted();
        self.sort_nodes();
    }

    fn drain_queue(&mut self) {
        while let Ok(command) = self.rx.try_recv() {
            match command {
                SceneCommand::Spawn(pending) => self.commit_spawn(*pending),
                SceneCommand::Destroy(id) => self.destroy_now(id),
                SceneCommand::Input(event, source) => self.dispatch_input(&event, source),
            }
        }
    }

    fn commit_spawn(&mut self, pending: PendingSpawn) {
        let PendingSpawn { id, object, args } = pending;

        let mass = if args.mass != 0.0 {
            args.mass
        } else {
            object.physics.as_ref().map(|p| p.mass).unwrap_or(0.0)
        };

        let mut node = Node::build(
            id,
            object,
            mass,
            integrator::terminal_velocity(mass, self.gravity),
        );
        node.transform.position = args.position;
        node.transform.rotation = Quat::from_euler(args.rotation);
        node.transform.scale = if args.scale.is_zero() {
            Vec3::ONE
        } else {
            args.scale
        };
        node.transform.parent = args.parent;
        node.prev_transform = node.transform.clone();
        node.hidden = args.hidden;
        if let Some(tint) = args.tint {
            node.tint = tint;
        }
        node.data = args.data;
        node.role = args.role;

        if let Some(controller) = node.object.controller.clone() {
            let mut ctx = SceneContext {
                nodes: &self.nodes,
                queue: &self.queue,
                tick: self.tick_count,
            };
            if let Err(e) = controller.init(&mut node, &mut ctx) {
                log::warn!("[scene] init fault on node {}: {:#}", id, e);
                return;
            }
        }

        let is_camera = matches!(node.role, Role::Camera(_));
        self.nodes.insert(id, node);
        self.order.push(id);
        self.new_nodes.push(id);

        if is_camera {
            for hook in &self.camera_hooks {
                hook(id, &self.queue);
            }
        }
    }

    fn destroy_now(&mut self, id: NodeId) {
        let victims: Vec<NodeId> = self
            .nodes
            .keys()
            .copied()
            .filter(|&k| self.is_descendant(k, id))
            .collect();

        for victim in victims {
            if let Some(node) = self.nodes.remove(&victim) {
                let kind = match &node.role {
                    Role::Camera(_) => DepartedKind::Camera,
                    Role::Light(_) => DepartedKind::Light,
                    Role::Plain if node.object.is_streamable() => DepartedKind::Instance,
                    Role::Plain => DepartedKind::Silent,
                };
                self.departed.push(Departed { id: victim, kind });
                self.order.retain(|&o| o != victim);
            }
        }
    }

    fn dispatch_input(&mut self, event: &InputEvent, source: NodeId) {
        for id in self.order.clone() {
            if !self.is_descendant(id, source) {
                continue;
            }
            let Some(mut node) = self.nodes.remove(&id) else {
                continue;
            };
            if let Some(controller) = node.object.controller.clone() {
                let mut ctx = SceneContext {
                    nodes: &self.nodes,
                    queue: &self.queue,
                    tick: self.tick_count,
                };
                if let Err(e) = controller.input(&mut node, &mut ctx, event) {
                    log::warn!("[scene] input fault on node {}: {:#}", id, e);
                    self.faulted.push(id);
                }
            }
            self.nodes.insert(id, node);
        }
    }

    fn snapshot_transforms(&mut self) {
        for node in self.nodes.values_mut() {
            node.prev_transform = node.transform.clone();
        }
    }

    fn run_controllers(&mut self, dt: Duration) {
        for id in self.order.clone() {
            let Some(mut node) = self.nodes.remove(&id) else {
                continue;
            };
            if let Some(controller) = node.object.controller.clone() {
                let mut ctx = SceneContext {
                    nodes: &self.nodes,
                    queue: &self.queue,
                    tick: self.tick_count,
                };
                if let Err(e) = controller.update(&mut node, &mut ctx, dt) {
                    log::warn!("[scene] controller fault on node {}: {:#}", id, e);
                    self.faulted.push(id);
                }
            }
            self.nodes.insert(id, node);
        }
    }

    fn run_physics(&mut self, dt: Duration) {
        for id in self.order.clone() {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            if node.is_kinematic {
                // Pinned bodies never carry velocity
                node.translation_velocity = Vec3::ZERO;
                node.angular_velocity = Vec3::ZERO;
                continue;
            }
            if node.is_dynamic() {
                integrator::integrate(node, self.gravity, dt);
            }
        }
    }

    fn refresh_colliders(&mut self) {
        let worlds: Vec<(NodeId, Quat, Vec3)> = self
            .order
            .iter()
            .map(|&id| {
                let (position, rotation) = self.world_of(id);
                (id, rotation, position)
            })
            .collect();

        for (id, rotation, position) in worlds {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.collision_targets.clear();
                node.refresh_collider(rotation, position);
            }
        }
    }

    fn run_collisions(&mut self) {
        struct Candidate {
            id: NodeId,
            aabb: Aabb,
        }
        impl Bounded for Candidate {
            fn aabb(&self) -> &Aabb {
                &self.aabb
            }
        }

        let candidates: Vec<Candidate> = self
            .order
            .iter()
            .filter_map(|&id| {
                let node = self.nodes.get(&id)?;
                if node.collider.is_empty() {
                    return None;
                }
                Some(Candidate {
                    id,
                    aabb: node.aabb(),
                })
            })
            .collect();

        for (i, j) in physics::sweep_and_prune(&candidates) {
            let (a, b) = (candidates[i].id, candidates[j].id);
            let (Some(na), Some(nb)) = (self.nodes.get(&a), self.nodes.get(&b)) else {
                continue;
            };
            let (a_dyn, b_dyn) = (na.is_dynamic(), nb.is_dynamic());
            if !a_dyn && !b_dyn {
                continue;
            }

            // The moving side is always the source of the first test
            let (src, tgt) = if a_dyn { (a, b) } else { (b, a) };
            let both = a_dyn && b_dyn;
            self.collide(src, tgt, !both);
            if both {
                // The other side gets a contact in its own frame
                self.collide(tgt, src, false);
            }
        }
    }

    fn collide(&mut self, src: NodeId, tgt: NodeId, record_reverse: bool) {
        let info = {
            let (Some(s), Some(t)) = (self.nodes.get(&src), self.nodes.get(&tgt)) else {
                return;
            };
            physics::gjk(&s.collider, &t.collider)
        };
        let Some(info) = info else { return };

        let Some(mut source) = self.nodes.remove(&src) else {
            return;
        };
        if let Some(target) = self.nodes.get(&tgt) {
            physics::resolve_contact(&mut source, target, &info);
        }
        self.nodes.insert(src, source);

        if record_reverse {
            // Pinned targets observe the contact without resolving it
            if let Some(target) = self.nodes.get_mut(&tgt) {
                target.collision_targets.push(src);
            }
        }
    }

    fn reap_faulted(&mut self) {
        let faulted = std::mem::take(&mut self.faulted);
        for id in faulted {
            if self.nodes.contains_key(&id) {
                self.destroy_now(id);
            }
        }
    }

    fn sort_nodes(&mut self) {
        let nodes = &self.nodes;
        self.order.sort_by(|a, b| {
            let (na, nb) = (&nodes[a], &nodes[b]);
            let screen_a = na.object.space == Space::Screen;
            let screen_b = nb.object.space == Space::Screen;
            screen_a
                .cmp(&screen_b)
                .then(
                    nb.transform
                        .position
                        .z
                        .partial_cmp(&na.transform.position.z)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(nb.id.cmp(&na.id))
        });
    }
}

/// What a controller sees besides its own node: read access to the rest
/// of the arena and the deferred queue for cross-node effects.
pub struct SceneContext<'a> {
    nodes: &'a FxHashMap<NodeId, Node>,
    queue: &'a SceneQueue,
    pub tick: u64,
}

impl SceneContext<'_> {
    pub fn spawn(&self, object: &Arc<SceneObject>, args: SpawnArgs) -> NodeId {
        self.queue.spawn(object, args)
    }

    pub fn destroy(&self, id: NodeId) {
        self.queue.destroy(id);
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// World position of a node currently outside the arena (the one
    /// being updated), resolved through its parent chain
    pub fn world_position(&self, node: &Node) -> Vec3 {
        let mut sum = node.transform.position;
        let mut cursor = node.transform.parent;
        while let Some(i) = cursor {
            let Some(n) = self.nodes.get(&i) else { break };
            sum += n.transform.position;
            cursor = n.transform.parent;
        }
        sum
    }

    pub fn world_rotation(&self, node: &Node) -> Quat {
        let mut locals = vec![node.transform.rotation];
        let mut cursor = node.transform.parent;
        while let Some(i) = cursor {
            let Some(n) = self.nodes.get(&i) else { break };
            locals.push(n.transform.rotation);
            cursor = n.transform.parent;
        }
        let mut world = Quat::IDENTITY;
        for local in locals.into_iter().rev() {
            world = world * local;
        }
        world
    }

    /// True when `ancestor` appears on `id`'s parent chain (or is `id`)
    pub fn is_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(i) = cursor {
            if i == ancestor {
                return true;
            }
            cursor = self.nodes.get(&i).and_then(|n| n.transform.parent);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ControllerFns, PhysicsTemplate, SceneObjectArgs};
    use crate::shape;

    const TICK: Duration = Duration::from_micros(16_667);

    fn plain_object() -> Arc<SceneObject> {
        SceneObject::new(SceneObjectArgs::default())
    }

    fn cube_object(mass: f64) -> Arc<SceneObject> {
        SceneObject::new(SceneObjectArgs {
            physics: Some(PhysicsTemplate {
                mass,
                collision_layer: 1,
            }),
            shape: Some(shape::cube()),
            ..Default::default()
        })
    }

    #[test]
    fn test_spawn_is_deferred_to_next_tick() {
        let mut scene = Scene::new(SceneOptions::default());
        let id = scene.spawn(&plain_object(), SpawnArgs::default());

        assert!(scene.node(id).is_none());
        scene.tick(TICK);
        assert!(scene.node(id).is_some());
        assert_eq!(scene.new_nodes(), &[id]);
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut scene = Scene::new(SceneOptions::default());
        let object = plain_object();
        let a = scene.spawn(&object, SpawnArgs::default());
        let b = scene.spawn(&object, SpawnArgs::default());
        let c = scene.spawn(&object, SpawnArgs::default());
        assert!(a < b && b < c);

        scene.tick(TICK);
        assert_eq!(scene.len(), 3);
    }

    #[test]
    fn test_destroy_takes_descendants() {
        let mut scene = Scene::new(SceneOptions::default());
        let object = plain_object();
        let parent = scene.spawn(&object, SpawnArgs::default());
        let child = scene.spawn(
            &object,
            SpawnArgs {
                parent: Some(parent),
                ..Default::default()
            },
        );
        let grandchild = scene.spawn(
            &object,
            SpawnArgs {
                parent: Some(child),
                ..Default::default()
            },
        );
        let unrelated = scene.spawn(&object, SpawnArgs::default());
        scene.tick(TICK);
        assert_eq!(scene.len(), 4);

        scene.destroy(parent);
        scene.tick(TICK);

        assert_eq!(scene.len(), 1);
        assert!(scene.node(unrelated).is_some());
        let mut gone: Vec<NodeId> = scene.departed().iter().map(|d| d.id).collect();
        gone.sort_unstable();
        assert_eq!(gone, vec![parent, child, grandchild]);
    }

    #[test]
    fn test_world_position_sums_parent_chain() {
        let mut scene = Scene::new(SceneOptions::default());
        let object = plain_object();
        let parent = scene.spawn(
            &object,
            SpawnArgs {
                position: Vec3::new(1.0, 2.0, 3.0),
                ..Default::default()
            },
        );
        let child = scene.spawn(
            &object,
            SpawnArgs {
                position: Vec3::new(10.0, 0.0, 0.0),
                parent: Some(parent),
                ..Default::default()
            },
        );
        scene.tick(TICK);

        assert_eq!(scene.world_position(child), Vec3::new(11.0, 2.0, 3.0));
        assert_eq!(scene.world_position(parent), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_controller_update_runs_each_tick() {
        let controller = ControllerFns::new().on_update(|node, _ctx, dt| {
            node.move_by(crate::math::step(60.0, dt), 0.0, 0.0);
            Ok(())
        });
        let object = SceneObject::new(SceneObjectArgs {
            controller: Some(Arc::new(controller)),
            ..Default::default()
        });

        let mut scene = Scene::new(SceneOptions::default());
        let id = scene.spawn(&object, SpawnArgs::default());
        scene.tick(TICK);
        scene.tick(TICK);
        scene.tick(TICK);

        // Two update ticks after the commit tick also ran update
        let x = scene.node(id).unwrap().transform.position.x;
        assert!(x > 2.9 && x < 3.1, "got {}", x);
    }

    #[test]
    fn test_faulting_controller_destroys_node() {
        let controller = ControllerFns::new().on_update(|_node, _ctx, _dt| {
            anyhow::bail!("controller exploded")
        });
        let object = SceneObject::new(SceneObjectArgs {
            controller: Some(Arc::new(controller)),
            ..Default::default()
        });

        let mut scene = Scene::new(SceneOptions::default());
        let id = scene.spawn(&object, SpawnArgs::default());
        scene.tick(TICK); // commit + first faulting update
        assert!(scene.node(id).is_none());
    }

    #[test]
    fn test_input_dispatches_to_descendants_next_tick() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static HITS: AtomicUsize = AtomicUsize::new(0);

        let controller = ControllerFns::new().on_input(|_node, _ctx, _event| {
            HITS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let object = SceneObject::new(SceneObjectArgs {
            controller: Some(Arc::new(controller)),
            ..Default::default()
        });

        let mut scene = Scene::new(SceneOptions::default());
        let root = scene.spawn(&object, SpawnArgs::default());
        let child = scene.spawn(
            &object,
            SpawnArgs {
                parent: Some(root),
                ..Default::default()
            },
        );
        let _outsider = scene.spawn(&object, SpawnArgs::default());
        scene.tick(TICK);
        let _ = child;

        let event = InputEvent::from_json(
            br#"{"session_id":"s","device":"keyboard","code":"KeyW","pressed":true}"#,
        )
        .unwrap();
        scene.receive_input(event, root);
        assert_eq!(HITS.load(Ordering::SeqCst), 0);

        // Root and child receive the event, the outsider does not
        scene.tick(TICK);
        assert_eq!(HITS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_camera_hooks_run_on_camera_commit() {
        let mut scene = Scene::new(SceneOptions::default());
        let attachment = plain_object();
        scene.with_camera(move |camera, queue| {
            queue.spawn(
                &attachment,
                SpawnArgs {
                    parent: Some(camera),
                    ..Default::default()
                },
            );
        });

        let camera = scene.spawn_camera();
        scene.tick(TICK); // commits the camera, enqueues the attachment
        assert_eq!(scene.len(), 1);
        scene.tick(TICK);
        assert_eq!(scene.len(), 2);
        let attached = scene
            .order()
            .iter()
            .find(|&&id| id != camera)
            .copied()
            .unwrap();
        assert_eq!(scene.node(attached).unwrap().parent(), Some(camera));
    }

    #[test]
    fn test_kinematic_nodes_keep_zero_velocity() {
        let mut scene = Scene::new(SceneOptions::default());
        let id = scene.spawn(&cube_object(1.0), SpawnArgs::default());
        scene.tick(TICK);

        {
            let node = scene.node_mut(id).unwrap();
            node.is_kinematic = true;
            node.translation_velocity = Vec3::new(5.0, 5.0, 5.0);
            node.angular_velocity = Vec3::new(1.0, 0.0, 0.0);
        }
        scene.tick(TICK);

        let node = scene.node(id).unwrap();
        assert_eq!(node.translation_velocity, Vec3::ZERO);
        assert_eq!(node.angular_velocity, Vec3::ZERO);
    }

    #[test]
    fn test_sort_order_world_before_screen_then_z_then_id() {
        let mut scene = Scene::new(SceneOptions::default());
        let world_object = plain_object();
        let screen_object = SceneObject::new(SceneObjectArgs {
            ui_element: true,
            ..Default::default()
        });

        let ui = scene.spawn(&screen_object, SpawnArgs::default());
        let near = scene.spawn(
            &world_object,
            SpawnArgs {
                position: Vec3::new(0.0, 0.0, 1.0),
                ..Default::default()
            },
        );
        let far = scene.spawn(
            &world_object,
            SpawnArgs {
                position: Vec3::new(0.0, 0.0, 9.0),
                ..Default::default()
            },
        );
        scene.tick(TICK);

        assert_eq!(scene.order(), &[far, near, ui]);
    }

    #[test]
    fn test_projectile_comes_to_rest_on_kinematic_plane() {
        // A unit-mass cube dropped onto a pinned ground slab falls,
        // collides, and settles kinematic with zero velocity within 20
        // ticks of the first contact.
        let _ = env_logger::builder().is_test(true).try_init();
        let mut scene = Scene::new(SceneOptions::default());

        let ground = scene.spawn(
            &cube_object(0.0),
            SpawnArgs {
                position: Vec3::new(0.0, -2.0, 0.0),
                scale: Vec3::new(10.0, 1.0, 10.0),
                ..Default::default()
            },
        );
        let cube = scene.spawn(
            &cube_object(1.0),
            SpawnArgs {
                position: Vec3::new(0.0, 3.0, 0.0),
                ..Default::default()
            },
        );
        scene.tick(TICK);

        scene.node_mut(ground).unwrap().is_kinematic = true;
        scene.node_mut(cube).unwrap().translation_velocity = Vec3::new(0.0, -5.0, 0.0);

        let mut first_contact = None;
        let mut rest_tick = None;
        for tick in 0..240 {
            scene.tick(TICK);
            let node = scene.node(cube).unwrap();
            if first_contact.is_none() && !node.collision_targets.is_empty() {
                first_contact = Some(tick);
            }
            if node.is_kinematic {
                rest_tick = Some(tick);
                break;
            }
        }

        let node = scene.node(cube).unwrap();
        let first_contact = first_contact.expect("cube never touched the ground");
        let rest_tick = rest_tick.unwrap_or_else(|| {
            panic!(
                "cube still moving at velocity {:?} pos {:?}",
                node.translation_velocity, node.transform.position
            )
        });
        assert!(
            rest_tick - first_contact <= 20,
            "rest took {} ticks after contact",
            rest_tick - first_contact
        );
        assert_eq!(node.translation_velocity, Vec3::ZERO);
        assert_eq!(node.angular_velocity, Vec3::ZERO);
        assert_eq!(node.gravity_velocity, Vec3::ZERO);
        // The pinned ground observed the contact in the rest tick
        assert!(!scene.node(ground).unwrap().collision_targets.is_empty());
    }
}
