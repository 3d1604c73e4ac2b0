//! Block-encoded world state store.
//!
//! One block arena plus per-entity indexes. A write lands in place when
//! the index already holds a block for the id (the payload is
//! size-stable by construction) and appends otherwise; blocks are never
//! moved or reallocated, so an instance's `start_offset` is stable for
//! its lifetime. Writers take the exclusive lock, session copies take
//! the shared lock.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::encoding::{Block, BlockBuffer, BlockSink};
use crate::math::{Mat4, MatrixData, Vec3};
use crate::rendering::{ResourceManager, TextureGroup, TextureModel};
use crate::scene::{Light, NodeId, SceneObject, Space};

/// Block kinds emitted by the state store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockKind {
    TextureGroup = 0,
    Camera = 1,
    SceneObject = 2,
    SceneObjectInstance = 3,
    Light = 4,
    LightDeleted = 5,
    InstanceDeleted = 6,
}

struct Indexes {
    buffer: BlockBuffer,
    textures: FxHashMap<u8, Block>,
    scene_objects: FxHashMap<i32, Block>,
    instances: FxHashMap<NodeId, Block>,
    cameras: FxHashMap<NodeId, Block>,
    lights: FxHashMap<NodeId, Block>,
    lights_deleted: Vec<Block>,
    instances_deleted: Vec<Block>,
}

/// The authoritative block database sessions stream from
pub struct StateStore {
    inner: RwLock<Indexes>,
}

impl StateStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Indexes {
                buffer: BlockBuffer::new(capacity),
                textures: FxHashMap::default(),
                scene_objects: FxHashMap::default(),
                instances: FxHashMap::default(),
                cameras: FxHashMap::default(),
                lights: FxHashMap::default(),
                lights_deleted: Vec::new(),
                instances_deleted: Vec::new(),
            }),
        }
    }

    // --- writers -----------------------------------------------------------

    /// Write a texture group block, in place when the group was written
    /// before. The group must not have grown since its first write.
    pub fn write_texture_group(&self, group: &TextureGroup) {
        let mut state = self.inner.write();

        if let Some(block) = state.textures.get(&group.id).copied() {
            let mut writer = state.buffer.writer(&block);
            encode_texture_group(&mut writer, group);
        } else {
            state.buffer.new_block(BlockKind::TextureGroup as u8);
            encode_texture_group(&mut state.buffer, group);
            let block = state.buffer.end_block();
            state.textures.insert(group.id, block);
        }
    }

    /// Write the group only when it has no block yet
    pub fn write_texture_group_once(&self, group: &TextureGroup) {
        let missing = self.inner.read().textures.get(&group.id).is_none();
        if missing {
            self.write_texture_group(group);
        }
    }

    /// Write a scene-object template block once; templates are immutable.
    /// Templates without a material and shape have nothing to stream.
    pub fn write_scene_object_once(&self, object: &SceneObject, resources: &ResourceManager) {
        if !object.is_streamable() {
            return;
        }
        let missing = self.inner.read().scene_objects.get(&object.id).is_none();
        if !missing {
            return;
        }

        let mut state = self.inner.write();
        if state.scene_objects.contains_key(&object.id) {
            return;
        }
        state.buffer.new_block(BlockKind::SceneObject as u8);
        encode_scene_object(&mut state.buffer, object, resources);
        let block = state.buffer.end_block();
        state.scene_objects.insert(object.id, block);
    }

    /// Write a per-node instance block (model matrix + template ref)
    pub fn write_instance(&self, id: NodeId, object_id: i32, model: &MatrixData) {
        let mut state = self.inner.write();

        if let Some(block) = state.instances.get(&id).copied() {
            let mut writer = state.buffer.writer(&block);
            encode_instance(&mut writer, id, object_id, model);
        } else {
            state.buffer.new_block(BlockKind::SceneObjectInstance as u8);
            encode_instance(&mut state.buffer, id, object_id, model);
            let block = state.buffer.end_block();
            state.instances.insert(id, block);
        }
    }

    /// Write a camera block (view + projection)
    pub fn write_camera(&self, id: NodeId, view: &MatrixData, projection: &MatrixData) {
        let mut state = self.inner.write();

        if let Some(block) = state.cameras.get(&id).copied() {
            let mut writer = state.buffer.writer(&block);
            encode_camera(&mut writer, id, view, projection);
        } else {
            state.buffer.new_block(BlockKind::Camera as u8);
            encode_camera(&mut state.buffer, id, view, projection);
            let block = state.buffer.end_block();
            state.cameras.insert(id, block);
        }
    }

    /// Write a light block at its world position
    pub fn write_light(&self, id: NodeId, light: &Light, position: Vec3) {
        let mut state = self.inner.write();

        if let Some(block) = state.lights.get(&id).copied() {
            let mut writer = state.buffer.writer(&block);
            encode_light(&mut writer, id, light, position);
        } else {
            state.buffer.new_block(BlockKind::Light as u8);
            encode_light(&mut state.buffer, id, light, position);
            let block = state.buffer.end_block();
            state.lights.insert(id, block);
        }
    }

    // --- deletions ---------------------------------------------------------

    /// Drop an instance: free its block and append a tombstone for
    /// readers to evict their copy
    pub fn delete_instance(&self, id: NodeId) {
        let mut state = self.inner.write();
        let Some(block) = state.instances.remove(&id) else {
            return;
        };
        state.buffer.free_block(&block);

        state.buffer.new_block(BlockKind::InstanceDeleted as u8);
        state.buffer.put_u16(id as u16);
        let tombstone = state.buffer.end_block();
        state.instances_deleted.push(tombstone);
    }

    pub fn delete_light(&self, id: NodeId) {
        let mut state = self.inner.write();
        let Some(block) = state.lights.remove(&id) else {
            return;
        };
        state.buffer.free_block(&block);

        state.buffer.new_block(BlockKind::LightDeleted as u8);
        state.buffer.put_u16(id as u16);
        let tombstone = state.buffer.end_block();
        state.lights_deleted.push(tombstone);
    }

    /// Cameras leave no tombstone; sessions own their camera's lifetime
    pub fn delete_camera(&self, id: NodeId) {
        let mut state = self.inner.write();
        if let Some(block) = state.cameras.remove(&id) {
            state.buffer.free_block(&block);
        }
    }

    /// Free delivered tombstones. Left to an out-of-band compaction
    /// policy; the core never calls it on its own.
    pub fn sweep_tombstones(&self) {
        let mut state = self.inner.write();
        let lights = std::mem::take(&mut state.lights_deleted);
        for block in lights {
            state.buffer.free_block(&block);
        }
        let instances = std::mem::take(&mut state.instances_deleted);
        for block in instances {
            state.buffer.free_block(&block);
        }
    }

    // --- readers -----------------------------------------------------------

    /// Shared-lock view over the whole store. A session holds one reader
    /// for a full frame so it never observes a half-updated tick.
    pub fn read(&self) -> StateReader<'_> {
        StateReader {
            state: self.inner.read(),
        }
    }

    pub fn scene_object_count(&self) -> usize {
        self.read().scene_object_count()
    }

    pub fn instance_count(&self) -> usize {
        self.inner.read().instances.len()
    }

    pub fn buffer_offset(&self) -> usize {
        self.inner.read().buffer.offset()
    }

    pub fn copy_textures(&self, dst: &mut [u8]) -> usize {
        self.read().copy_textures(dst)
    }

    pub fn copy_scene_objects(&self, dst: &mut [u8]) -> usize {
        self.read().copy_scene_objects(dst)
    }

    pub fn copy_instances(&self, dst: &mut [u8]) -> usize {
        self.read().copy_instances(dst)
    }

    pub fn copy_lights(&self, dst: &mut [u8]) -> usize {
        self.read().copy_lights(dst)
    }

    pub fn copy_camera(&self, dst: &mut [u8], id: NodeId) -> usize {
        self.read().copy_camera(dst, id)
    }

    pub fn copy_lights_deleted(&self, dst: &mut [u8]) -> usize {
        self.read().copy_lights_deleted(dst)
    }

    pub fn copy_instances_deleted(&self, dst: &mut [u8]) -> usize {
        self.read().copy_instances_deleted(dst)
    }
}

/// Consistent read view held for the duration of one session copy
pub struct StateReader<'a> {
    state: parking_lot::RwLockReadGuard<'a, Indexes>,
}

impl StateReader<'_> {
    pub fn scene_object_count(&self) -> usize {
        self.state.scene_objects.len()
    }

    pub fn copy_textures(&self, dst: &mut [u8]) -> usize {
        copy_sorted(&self.state.buffer, &self.state.textures, dst)
    }

    pub fn copy_scene_objects(&self, dst: &mut [u8]) -> usize {
        copy_sorted(&self.state.buffer, &self.state.scene_objects, dst)
    }

    pub fn copy_instances(&self, dst: &mut [u8]) -> usize {
        copy_sorted(&self.state.buffer, &self.state.instances, dst)
    }

    pub fn copy_lights(&self, dst: &mut [u8]) -> usize {
        copy_sorted(&self.state.buffer, &self.state.lights, dst)
    }

    pub fn copy_camera(&self, dst: &mut [u8], id: NodeId) -> usize {
        match self.state.cameras.get(&id) {
            Some(block) => self.state.buffer.copy_block(block, dst),
            None => 0,
        }
    }

    pub fn copy_lights_deleted(&self, dst: &mut [u8]) -> usize {
        let mut offset = 0;
        for block in &self.state.lights_deleted {
            offset += self.state.buffer.copy_block(block, &mut dst[offset..]);
        }
        offset
    }

    pub fn copy_instances_deleted(&self, dst: &mut [u8]) -> usize {
        let mut offset = 0;
        for block in &self.state.instances_deleted {
            offset += self.state.buffer.copy_block(block, &mut dst[offset..]);
        }
        offset
    }
}

/// Copy an index's blocks in ascending id order for deterministic output
fn copy_sorted<K: Copy + Ord + std::hash::Hash + Eq>(
    buffer: &BlockBuffer,
    index: &FxHashMap<K, Block>,
    dst: &mut [u8],
) -> usize {
    let mut keys: Vec<K> = index.keys().copied().collect();
    keys.sort_unstable();

    let mut offset = 0;
    for key in keys {
        offset += buffer.copy_block(&index[&key], &mut dst[offset..]);
    }
    offset
}

// --- payload encoders ------------------------------------------------------

fn encode_texture_group(sink: &mut impl BlockSink, group: &TextureGroup) {
    let pixel_size = group.model.pixel_size();

    sink.put_u8(group.id);
    sink.put_u16(group.width as u16);
    sink.put_u16(group.height as u16);
    sink.put_u8(group.textures.len() as u8);
    sink.put_u8(group.model.wire_tag());
    sink.put_u8(group.role.wire_tag());

    // Layers are group-sized, row-major; short textures pad with 255 in
    // the alpha model and 0 otherwise
    sink.new_array();
    for texture in &group.textures {
        let tex_height = if texture.width == 0 {
            0
        } else {
            texture.pixels.len() / pixel_size / texture.width
        };
        for y in 0..group.height {
            for x in 0..group.width {
                if x < texture.width && y < tex_height {
                    let at = (y * texture.width + x) * pixel_size;
                    for p in 0..pixel_size {
                        sink.put_u8(texture.pixels[at + p]);
                    }
                } else {
                    let pad = if group.model == TextureModel::Alpha {
                        255
                    } else {
                        0
                    };
                    for _ in 0..pixel_size {
                        sink.put_u8(pad);
                    }
                }
            }
        }
    }
    sink.end_array();
}

fn encode_scene_object(sink: &mut impl BlockSink, object: &SceneObject, resources: &ResourceManager) {
    let material = object.material.as_ref().expect("streamable template");
    let shape = object.shape.as_ref().expect("streamable template");

    sink.put_u32(object.id as u32);
    sink.put_u8(material.diffuse.group_id);
    sink.put_u8(material.diffuse.index);
    sink.put_f32(material.shininess);
    sink.put_u8(match object.space {
        Space::World => 0,
        Space::Screen => 1,
    });

    sink.new_array();
    for p in &shape.positions {
        sink.put_vec3f(p.x as f32, p.y as f32, p.z as f32);
    }
    sink.end_array();

    // UVs stretch by the texture's share of its group atlas
    let (group_w, group_h) = resources
        .group_extent(material.diffuse.group_id)
        .unwrap_or((1, 1));
    let rx = material.diffuse.width as f32 / group_w.max(1) as f32;
    let ry = material.diffuse.height as f32 / group_h.max(1) as f32;
    sink.new_array();
    for uv in &shape.uvs {
        sink.put_vec2f(uv.x as f32 * rx, uv.y as f32 * ry);
    }
    sink.end_array();

    sink.new_array();
    for n in &shape.normals {
        sink.put_vec3f(n.x as f32, n.y as f32, n.z as f32);
    }
    sink.end_array();
}

fn encode_instance(sink: &mut impl BlockSink, id: NodeId, object_id: i32, model: &MatrixData) {
    sink.put_u16(id as u16);
    sink.put_u32(object_id as u32);
    sink.put_mat4(model);
}

fn encode_camera(sink: &mut impl BlockSink, id: NodeId, view: &MatrixData, projection: &MatrixData) {
    sink.put_u16(id as u16);
    sink.put_mat4(view);
    sink.put_mat4(projection);
}

fn encode_light(sink: &mut impl BlockSink, id: NodeId, light: &Light, position: Vec3) {
    sink.put_u16(id as u16);
    sink.put_u8(light.kind());

    let ambient = light.ambient_color();
    let diffuse = light.diffuse_color();
    let specular = light.specular_color();
    sink.put_vec3f(ambient.x as f32, ambient.y as f32, ambient.z as f32);
    sink.put_vec3f(diffuse.x as f32, diffuse.y as f32, diffuse.z as f32);
    sink.put_vec3f(specular.x as f32, specular.y as f32, specular.z as f32);
    sink.put_vec3f(position.x as f32, position.y as f32, position.z as f32);

    match light {
        Light::Directional(l) => {
            sink.put_vec3f(
                l.direction.x as f32,
                l.direction.y as f32,
                l.direction.z as f32,
            );
            sink.put_mat4(&light_view(position, l.direction));
        }
        Light::Point(l) => {
            sink.put_f32(l.radius as f32);
        }
        Light::Spot(l) => {
            sink.put_vec3f(
                l.direction.x as f32,
                l.direction.y as f32,
                l.direction.z as f32,
            );
            sink.put_f32(l.cut_off as f32);
            sink.put_f32(l.outer_cut_off as f32);
            sink.put_mat4(&light_view(position, l.direction));
        }
    }
}

/// Shadow-style view matrix looking from the light along its direction
fn light_view(position: Vec3, direction: Vec3) -> MatrixData {
    let mut m = Mat4::new();
    m.look_at(position + direction, position);
    m.to_data()
}
