//! The fixed-rate world driver and session registry.
//!
//! A dedicated thread ticks the scene (default 60 Hz) and snapshots it
//! into the state store; each open session runs its own streaming
//! thread pacing delta copies into a frame channel for the transport.
//! Input handlers run on network threads and only touch the deferred
//! scene queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::Mutex;

use crate::constants::buffer_sizes::{
    SESSION_BUFFER_CAPACITY, SESSION_FRAME_QUEUE, STATE_BUFFER_CAPACITY,
};
use crate::constants::timing::{DEFAULT_SESSION_FPS, DEFAULT_TICK_RATE};
use crate::error::{SimError, SimResult};
use crate::math::{Quat, Vec3};
use crate::rendering::ResourceManager;
use crate::scene::{DepartedKind, InputEvent, NodeId, Role, Scene, SceneQueue};
use crate::session::Session;
use crate::state::StateStore;

/// Driver configuration
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    /// World ticks per second
    pub tick_rate: u32,
    /// Default stream rate for new sessions
    pub session_fps: u32,
    /// State-store arena capacity in bytes
    pub state_capacity: usize,
    /// Per-session copy buffer capacity in bytes
    pub session_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            session_fps: DEFAULT_SESSION_FPS,
            state_capacity: STATE_BUFFER_CAPACITY,
            session_capacity: SESSION_BUFFER_CAPACITY,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tick_rate == 0 {
            anyhow::bail!("SimulationConfig: tick_rate cannot be 0");
        }
        if self.state_capacity == 0 || self.session_capacity == 0 {
            anyhow::bail!("SimulationConfig: buffer capacities cannot be 0");
        }
        Ok(())
    }
}

struct SessionEntry {
    session: Arc<Session>,
    /// Open handles onto the same session id
    count: usize,
    /// Frame sender, kept until the streaming thread takes over
    tx: Option<Sender<Vec<u8>>>,
    stream: Option<JoinHandle<()>>,
}

/// Owns the scene, the state store and every open session
pub struct Simulation {
    config: SimulationConfig,
    scene: Mutex<Scene>,
    queue: SceneQueue,
    state: Arc<StateStore>,
    resources: Arc<ResourceManager>,
    sessions: Mutex<Vec<SessionEntry>>,
    running: AtomicBool,
}

impl Simulation {
    pub fn new(
        scene: Scene,
        resources: Arc<ResourceManager>,
        config: SimulationConfig,
    ) -> Arc<Self> {
        let queue = scene.queue();
        Arc::new(Self {
            state: Arc::new(StateStore::new(config.state_capacity)),
            scene: Mutex::new(scene),
            queue,
            resources,
            sessions: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
            config,
        })
    }

    pub fn state(&self) -> &Arc<StateStore> {
        &self.state
    }

    /// Advance the world one tick and publish it to the state store.
    /// The simulation thread calls this at the configured rate; tests
    /// drive it directly.
    pub fn step(&self, dt: Duration) {
        let mut scene = self.scene.lock();
        scene.tick(dt);
        self.snapshot(&mut scene);
    }

    /// Run `f` under the scene lock; for scene setup from the outside
    pub fn with_scene<R>(&self, f: impl FnOnce(&mut Scene) -> R) -> R {
        f(&mut self.scene.lock())
    }

    /// Publish the post-tick world into the block store. Runs strictly
    /// after the collision phase, so no session observes a half-updated
    /// tick.
    fn snapshot(&self, scene: &mut Scene) {
        for group in self.resources.groups() {
            self.state.write_texture_group_once(&group);
        }

        for departed in scene.departed() {
            match departed.kind {
                DepartedKind::Instance => self.state.delete_instance(departed.id),
                DepartedKind::Light => self.state.delete_light(departed.id),
                DepartedKind::Camera => self.state.delete_camera(departed.id),
                DepartedKind::Silent => {}
            }
        }

        let order: Vec<NodeId> = scene.order().to_vec();
        let worlds: Vec<(NodeId, Vec3, Quat)> = order
            .iter()
            .map(|&id| {
                let (position, rotation) = scene.world_of(id);
                (id, position, rotation)
            })
            .collect();

        for (id, position, rotation) in worlds {
            let Some(node) = scene.node_mut(id) else {
                continue;
            };
            match &node.role {
                Role::Camera(_) => {
                    let projection = *node.camera().expect("camera role").projection_matrix();
                    let camera = node.camera_mut().expect("camera role");
                    let view = *camera.view_matrix(position, rotation);
                    self.state.write_camera(id, &view, &projection);
                }
                Role::Light(light) => {
                    let light = light.clone();
                    self.state.write_light(id, &light, position);
                }
                Role::Plain => {
                    if !node.object.is_streamable() {
                        continue;
                    }
                    let object = Arc::clone(&node.object);
                    let model = *node.model_matrix(rotation, position);
                    self.state.write_scene_object_once(&object, &self.resources);
                    self.state.write_instance(id, object.id, &model);
                }
            }
        }
    }

    /// Start the fixed-rate simulation thread and the streaming threads
    /// of any session opened before the call
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);

        {
            let mut sessions = self.sessions.lock();
            for entry in sessions.iter_mut() {
                if let Some(tx) = entry.tx.take() {
                    entry.stream = Some(self.spawn_stream(Arc::clone(&entry.session), tx));
                }
            }
        }

        let sim = Arc::clone(self);
        let period = Duration::from_secs(1) / self.config.tick_rate;

        thread::Builder::new()
            .name("simulation".to_string())
            .spawn(move || {
                log::info!(
                    "[simulation] running at {} Hz",
                    sim.config.tick_rate
                );
                let mut last = Instant::now();
                let mut next = last + period;
                while sim.running.load(Ordering::SeqCst) {
                    let now = Instant::now();
                    sim.step(now - last);
                    last = now;

                    next += period;
                    let now = Instant::now();
                    if next > now {
                        thread::sleep(next - now);
                    } else {
                        // Fell behind; resynchronize instead of bursting
                        next = now;
                    }
                }
                log::info!("[simulation] stopped");
            })
            .expect("spawn simulation thread")
    }

    /// Stop the simulation thread and close every session
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let mut sessions = self.sessions.lock();
        for entry in sessions.drain(..) {
            entry.session.close();
            if let Some(stream) = entry.stream {
                let _ = stream.join();
            }
        }
    }

    // --- sessions ----------------------------------------------------------

    /// Open a session, or attach to the existing one with the same id.
    /// Returns the session and whether it was created by this call.
    pub fn open_session(self: &Arc<Self>, session_id: &str) -> (Arc<Session>, bool) {
        let mut sessions = self.sessions.lock();

        if let Some(entry) = sessions.iter_mut().find(|e| e.session.id == session_id) {
            entry.count += 1;
            return (Arc::clone(&entry.session), false);
        }

        let camera_node = self.scene.lock().spawn_camera();
        let (tx, rx) = bounded(SESSION_FRAME_QUEUE);
        let session = Arc::new(Session::new(
            session_id.to_string(),
            Arc::clone(&self.state),
            camera_node,
            self.config.session_capacity,
            self.config.session_fps,
            rx,
        ));

        // The streaming thread starts with the simulation; a session
        // opened earlier is picked up by `start`
        let mut entry = SessionEntry {
            session: Arc::clone(&session),
            count: 1,
            tx: Some(tx),
            stream: None,
        };
        if self.running.load(Ordering::SeqCst) {
            let tx = entry.tx.take().expect("fresh session sender");
            entry.stream = Some(self.spawn_stream(Arc::clone(&entry.session), tx));
        }
        sessions.push(entry);

        log::info!("[session] opened id={} camera={}", session_id, camera_node);
        (session, true)
    }

    pub fn session(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions
            .lock()
            .iter()
            .find(|e| e.session.id == session_id)
            .map(|e| Arc::clone(&e.session))
    }

    /// Release one handle on a session; the last release tears it down
    /// and destroys its camera node. Returns false for unknown ids.
    pub fn close_session(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.lock();
        let Some(at) = sessions
            .iter()
            .position(|e| e.session.id == session_id)
        else {
            return false;
        };

        sessions[at].count -= 1;
        if sessions[at].count == 0 {
            let entry = sessions.swap_remove(at);
            entry.session.close();
            self.queue.destroy(entry.session.camera_node());
            log::info!("[session] closed id={}", session_id);
        }
        true
    }

    /// Route a client input event onto the scene queue of the session's
    /// camera. Takes effect no earlier than the next tick. An event for
    /// an unknown session is logged and dropped.
    pub fn receive_input(&self, event: InputEvent) -> SimResult<()> {
        let Some(session) = self.session(&event.session_id) else {
            log::warn!("[input] unknown session {}", event.session_id);
            return Err(SimError::SessionNotFound(event.session_id));
        };
        self.queue.push_input(event, session.camera_node());
        Ok(())
    }

    fn spawn_stream(&self, session: Arc<Session>, tx: Sender<Vec<u8>>) -> JoinHandle<()> {
        thread::Builder::new()
            .name(format!("session-{}", session.id))
            .spawn(move || {
                let mut next = Instant::now();
                loop {
                    if session.is_closed() {
                        break;
                    }
                    let fps = session.fps();
                    if fps == 0 {
                        // Paused; poll for a rate change or close
                        thread::sleep(Duration::from_millis(50));
                        next = Instant::now();
                        continue;
                    }

                    next += Duration::from_secs(1) / fps;
                    let now = Instant::now();
                    if next > now {
                        thread::sleep(next - now);
                    } else {
                        next = now;
                    }

                    if session.is_closed() {
                        break;
                    }
                    match tx.try_send(session.render()) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            log::debug!("[session] {} transport slow, dropping frame", session.id);
                        }
                        Err(TrySendError::Disconnected(_)) => {
                            // Transport hung up; EOF closes the session
                            session.close();
                            break;
                        }
                    }
                }
            })
            .expect("spawn session stream thread")
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        for entry in self.sessions.lock().iter() {
            entry.session.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::blocks;
    use crate::scene::{
        PhysicsTemplate, SceneObject, SceneObjectArgs, SceneOptions, SpawnArgs,
    };
    use crate::state::BlockKind;

    const TICK: Duration = Duration::from_micros(16_667);

    fn sim_with_material_scene() -> (Arc<Simulation>, Arc<SceneObject>) {
        let resources = Arc::new(ResourceManager::new());
        let material = resources.new_material_palette(2, &[1, 2, 3, 4], &[4, 3, 2, 1], 32.0);
        let object = SceneObject::new(SceneObjectArgs {
            material: Some(material),
            shape: Some(crate::shape::cube()),
            physics: Some(PhysicsTemplate {
                mass: 1.0,
                collision_layer: 1,
            }),
            ..Default::default()
        });
        let scene = Scene::new(SceneOptions::default());
        let sim = Simulation::new(scene, resources, SimulationConfig::default());
        (sim, object)
    }

    #[test]
    fn test_config_validation() {
        assert!(SimulationConfig::default().validate().is_ok());
        let bad = SimulationConfig {
            tick_rate: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_open_session_is_refcounted() {
        let (sim, _) = sim_with_material_scene();

        let (a, created_a) = sim.open_session("viewer");
        let (b, created_b) = sim.open_session("viewer");
        assert!(created_a);
        assert!(!created_b);
        assert_eq!(a.camera_node(), b.camera_node());

        // First close only drops one handle
        assert!(sim.close_session("viewer"));
        assert!(sim.session("viewer").is_some());
        assert!(sim.close_session("viewer"));
        assert!(sim.session("viewer").is_none());
        assert!(!sim.close_session("viewer"));
        assert!(a.is_closed());

        sim.stop();
    }

    #[test]
    fn test_input_requires_known_session() {
        let (sim, _) = sim_with_material_scene();
        let event = InputEvent::from_json(
            br#"{"session_id":"ghost","device":"mouse","pressed":true}"#,
        )
        .unwrap();
        assert!(matches!(
            sim.receive_input(event),
            Err(SimError::SessionNotFound(_))
        ));
        sim.stop();
    }

    #[test]
    fn test_session_delta_across_spawn_and_destroy() {
        // Scenario: a session reads at t and t+1; between the reads one
        // node spawns and another is destroyed. The second read carries
        // exactly one new instance block, one tombstone and the
        // refreshed camera block.
        let _ = env_logger::builder().is_test(true).try_init();
        let (sim, object) = sim_with_material_scene();
        let (session, _) = sim.open_session("viewer");

        let doomed = sim.with_scene(|scene| scene.spawn(&object, SpawnArgs::default()));
        sim.step(TICK);

        // Read at tick t: textures, template, camera, one instance
        let frame = blocks_of(&session.render());
        assert_eq!(count(&frame, BlockKind::TextureGroup), 3);
        assert_eq!(count(&frame, BlockKind::SceneObject), 1);
        assert_eq!(count(&frame, BlockKind::Camera), 1);
        assert_eq!(count(&frame, BlockKind::SceneObjectInstance), 1);
        assert_eq!(count(&frame, BlockKind::InstanceDeleted), 0);

        // Between reads: one spawn, one destroy
        let spawned = sim.with_scene(|scene| {
            scene.destroy(doomed);
            scene.spawn(
                &object,
                SpawnArgs {
                    position: crate::math::Vec3::new(5.0, 0.0, 0.0),
                    ..Default::default()
                },
            )
        });
        sim.step(TICK);

        // Read at tick t+1
        let frame = session.render();
        let frames = blocks_of(&frame);
        assert_eq!(count(&frames, BlockKind::TextureGroup), 0);
        assert_eq!(count(&frames, BlockKind::SceneObject), 0);
        assert_eq!(count(&frames, BlockKind::Camera), 1);
        assert_eq!(count(&frames, BlockKind::SceneObjectInstance), 1);
        assert_eq!(count(&frames, BlockKind::InstanceDeleted), 1);

        // The surviving instance block names the new node id
        let (_, payload) = *blocks(&frame)
            .iter()
            .find(|(k, _)| *k == BlockKind::SceneObjectInstance as u8)
            .unwrap();
        assert_eq!(
            u16::from_be_bytes([payload[0], payload[1]]),
            spawned as u16
        );
        let (_, tombstone) = *blocks(&frame)
            .iter()
            .find(|(k, _)| *k == BlockKind::InstanceDeleted as u8)
            .unwrap();
        assert_eq!(
            u16::from_be_bytes([tombstone[0], tombstone[1]]),
            doomed as u16
        );

        sim.stop();
    }

    #[test]
    fn test_instance_offset_stable_across_ticks() {
        let (sim, object) = sim_with_material_scene();
        sim.with_scene(|scene| scene.spawn(&object, SpawnArgs::default()));
        sim.step(TICK);

        let offset = sim.state().buffer_offset();
        sim.step(TICK);
        sim.step(TICK);
        // Steady-state ticks rewrite in place without appending
        assert_eq!(sim.state().buffer_offset(), offset);
        sim.stop();
    }

    fn blocks_of(frame: &[u8]) -> Vec<u8> {
        blocks(frame).iter().map(|(k, _)| *k).collect()
    }

    fn count(kinds: &[u8], kind: BlockKind) -> usize {
        kinds.iter().filter(|&&k| k == kind as u8).count()
    }
}
