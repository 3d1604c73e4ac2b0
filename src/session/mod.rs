//! Per-viewer read cursor over the state store.
//!
//! A session owns nothing but a camera node and a progress counter; the
//! copy it emits each frame is a linear concatenation of raw block
//! bytes, framed by the block headers themselves.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;

use crate::scene::NodeId;
use crate::state::StateStore;

struct Cursor {
    buffer: Vec<u8>,
    read_count: u64,
    objects_sent: usize,
}

/// One streaming viewer.
///
/// `render` emits, in order: every texture block on the first read, the
/// template blocks whenever the template count changed, the session's
/// own camera block (always), all light blocks and light tombstones,
/// all instance blocks and instance tombstones.
pub struct Session {
    pub id: String,
    state: Arc<StateStore>,
    camera_node: NodeId,
    fps: AtomicU32,
    closed: AtomicBool,
    cursor: Mutex<Cursor>,
    frames: Receiver<Vec<u8>>,
}

impl Session {
    pub(crate) fn new(
        id: String,
        state: Arc<StateStore>,
        camera_node: NodeId,
        buffer_capacity: usize,
        fps: u32,
        frames: Receiver<Vec<u8>>,
    ) -> Self {
        Self {
            id,
            state,
            camera_node,
            fps: AtomicU32::new(fps),
            closed: AtomicBool::new(false),
            cursor: Mutex::new(Cursor {
                buffer: vec![0; buffer_capacity],
                read_count: 0,
                objects_sent: 0,
            }),
            frames,
        }
    }

    pub fn camera_node(&self) -> NodeId {
        self.camera_node
    }

    /// Frames produced by the streaming task, ready for the transport
    pub fn frames(&self) -> Receiver<Vec<u8>> {
        self.frames.clone()
    }

    pub fn fps(&self) -> u32 {
        self.fps.load(Ordering::Relaxed)
    }

    /// Retime the stream; zero pauses it
    pub fn set_fps(&self, fps: u32) {
        self.fps.store(fps, Ordering::Relaxed);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    /// Stop the stream. Any in-flight copy completes; the next loop
    /// iteration of the streaming task exits.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }

    pub fn read_count(&self) -> u64 {
        self.cursor.lock().read_count
    }

    /// Produce this session's next delta frame.
    ///
    /// The state read lock is held for the whole copy, so the frame is a
    /// consistent view of exactly one tick.
    pub fn render(&self) -> Vec<u8> {
        let mut cursor = self.cursor.lock();
        let state = self.state.read();
        let object_count = state.scene_object_count();

        let Cursor {
            buffer,
            read_count,
            objects_sent,
        } = &mut *cursor;

        let mut offset = 0;

        if *read_count == 0 {
            offset += state.copy_textures(&mut buffer[offset..]);
        }

        if object_count != *objects_sent {
            offset += state.copy_scene_objects(&mut buffer[offset..]);
            *objects_sent = object_count;
        }

        offset += state.copy_camera(&mut buffer[offset..], self.camera_node);
        offset += state.copy_lights(&mut buffer[offset..]);
        offset += state.copy_lights_deleted(&mut buffer[offset..]);
        offset += state.copy_instances(&mut buffer[offset..]);
        offset += state.copy_instances_deleted(&mut buffer[offset..]);

        *read_count += 1;

        buffer[..offset].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::buffer_sizes::{SESSION_BUFFER_CAPACITY, STATE_BUFFER_CAPACITY};
    use crate::encoding::blocks;
    use crate::math::IDENTITY;
    use crate::state::BlockKind;

    fn session_over(state: Arc<StateStore>, camera: NodeId) -> Session {
        let (_tx, rx) = crossbeam_channel::bounded(1);
        Session::new(
            "test".to_string(),
            state,
            camera,
            SESSION_BUFFER_CAPACITY,
            60,
            rx,
        )
    }

    fn kinds(frame: &[u8]) -> Vec<u8> {
        blocks(frame).iter().map(|(kind, _)| *kind).collect()
    }

    #[test]
    fn test_camera_block_streams_every_read() {
        let state = Arc::new(StateStore::new(STATE_BUFFER_CAPACITY));
        state.write_camera(1, &IDENTITY, &IDENTITY);

        let session = session_over(Arc::clone(&state), 1);
        assert_eq!(kinds(&session.render()), vec![BlockKind::Camera as u8]);
        assert_eq!(kinds(&session.render()), vec![BlockKind::Camera as u8]);
        assert_eq!(session.read_count(), 2);
    }

    #[test]
    fn test_instances_stream_with_tombstones() {
        let state = Arc::new(StateStore::new(STATE_BUFFER_CAPACITY));
        state.write_camera(1, &IDENTITY, &IDENTITY);
        state.write_instance(2, 7, &IDENTITY);

        let session = session_over(Arc::clone(&state), 1);
        assert_eq!(
            kinds(&session.render()),
            vec![
                BlockKind::Camera as u8,
                BlockKind::SceneObjectInstance as u8
            ]
        );

        // A node destroyed between reads shows up as a tombstone
        state.delete_instance(2);
        state.write_instance(3, 7, &IDENTITY);
        assert_eq!(
            kinds(&session.render()),
            vec![
                BlockKind::Camera as u8,
                BlockKind::SceneObjectInstance as u8,
                BlockKind::InstanceDeleted as u8
            ]
        );
    }

    #[test]
    fn test_close_is_sticky() {
        let state = Arc::new(StateStore::new(STATE_BUFFER_CAPACITY));
        let session = session_over(state, 1);
        assert!(!session.is_closed());
        session.close();
        assert!(session.is_closed());
    }
}
