use rustc_hash::FxHashMap;

use crate::math::MatrixData;

/// Bytes of the `[kind:u8 | size:u32]` prefix in front of every block
pub const HEADER_BYTES: usize = 5;

/// Append-oriented byte sink shared by the arena writer and the in-place
/// block rewriter, so encoders serialize the same way on first write and
/// on update.
///
/// Arrays are encoded as `[length:u32 | bytes]`; the length field is
/// back-patched on `end_array` and arrays do not nest.
pub trait BlockSink {
    fn put_u8(&mut self, v: u8);

    fn put_bool(&mut self, v: bool) {
        self.put_u8(v as u8);
    }

    fn put_u16(&mut self, v: u16) {
        for b in v.to_be_bytes() {
            self.put_u8(b);
        }
    }

    fn put_u32(&mut self, v: u32) {
        for b in v.to_be_bytes() {
            self.put_u8(b);
        }
    }

    fn put_f32(&mut self, v: f32) {
        self.put_u32(v.to_bits());
    }

    fn put_vec2f(&mut self, x: f32, y: f32) {
        self.put_f32(x);
        self.put_f32(y);
    }

    fn put_vec3f(&mut self, x: f32, y: f32, z: f32) {
        self.put_f32(x);
        self.put_f32(y);
        self.put_f32(z);
    }

    /// 16 column-major f32 values wrapped in an array
    fn put_mat4(&mut self, m: &MatrixData) {
        self.new_array();
        for v in m {
            self.put_f32(*v as f32);
        }
        self.end_array();
    }

    fn new_array(&mut self);
    fn end_array(&mut self);
}

/// Handle to a committed block: a stable payload offset and a size that is
/// immutable for the block's lifetime. Copyable and index-friendly; all
/// access goes back through the owning [`BlockBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    kind: u8,
    start_offset: usize,
    size: usize,
}

impl Block {
    pub fn kind(&self) -> u8 {
        self.kind
    }

    /// Offset of the payload (past the header) in the arena
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Header + payload size, the footprint `copy` emits
    pub fn frame_size(&self) -> usize {
        self.size + HEADER_BYTES
    }
}

/// A contiguous byte arena of kind-tagged, size-prefixed blocks.
///
/// Capacity is fixed at construction; running out of space is a sizing
/// bug and panics at the write site.
pub struct BlockBuffer {
    buf: Vec<u8>,
    offset: usize,
    blocks: FxHashMap<usize, u8>,
    current_block_offset: usize,
    current_block_size: usize,
    current_array_offset: Option<usize>,
    current_array_size: usize,
}

impl BlockBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            offset: 0,
            blocks: FxHashMap::default(),
            current_block_offset: 0,
            current_block_size: 0,
            current_array_offset: None,
            current_array_size: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Open a new block of the given kind, fixing its start offset.
    /// Returns the arena offset right past the header.
    pub fn new_block(&mut self, kind: u8) -> usize {
        self.end_array();
        self.blocks.insert(self.offset, kind);
        self.current_block_offset = self.offset;
        self.put_u8(kind);
        self.put_u32(0); // size, back-patched by end_block
        self.current_block_size = 0;
        self.offset
    }

    /// Close the current block, back-patch its size prefix and return the
    /// handle. The size is immutable from here on.
    pub fn end_block(&mut self) -> Block {
        self.end_array();

        let start = self.current_block_offset;
        let size = self.current_block_size;
        self.current_block_size = 0;

        self.buf[start + 1..start + HEADER_BYTES].copy_from_slice(&(size as u32).to_be_bytes());

        Block {
            kind: self.buf[start],
            start_offset: start + HEADER_BYTES,
            size,
        }
    }

    /// Emit header + payload of a committed block into `dst`, returning
    /// the number of bytes written.
    pub fn copy_block(&self, block: &Block, dst: &mut [u8]) -> usize {
        let start = block.start_offset - HEADER_BYTES;
        let end = block.start_offset + block.size;
        let n = end - start;
        dst[..n].copy_from_slice(&self.buf[start..end]);
        n
    }

    /// Zero-fill a block's payload. The space is not reclaimed.
    pub fn free_block(&mut self, block: &Block) {
        self.buf[block.start_offset..block.start_offset + block.size].fill(0);
    }

    /// In-place rewriter for a committed block
    pub fn writer(&mut self, block: &Block) -> BlockWriter<'_> {
        BlockWriter {
            start: block.start_offset,
            size: block.size,
            offset: 0,
            buf: self,
        }
    }

    pub fn reader(&self, block: &Block) -> BlockReader<'_> {
        BlockReader { buf: self, block: *block }
    }

    fn advance(&mut self, n: usize) {
        self.offset += n;
        self.current_block_size += n;
        if self.current_array_offset.is_some() {
            self.current_array_size += n;
        }
    }
}

impl BlockSink for BlockBuffer {
    fn put_u8(&mut self, v: u8) {
        assert!(
            self.offset < self.buf.len(),
            "block buffer exhausted at {} bytes",
            self.buf.len()
        );
        self.buf[self.offset] = v;
        self.advance(1);
    }

    fn new_array(&mut self) {
        self.end_array();
        self.current_array_offset = Some(self.offset);
        self.put_u32(0);
        self.current_array_size = 0;
    }

    fn end_array(&mut self) {
        if let Some(off) = self.current_array_offset.take() {
            self.buf[off..off + 4].copy_from_slice(&(self.current_array_size as u32).to_be_bytes());
        }
        self.current_array_size = 0;
    }
}

/// Rewrites a committed block's payload in place. Writes past the fixed
/// size are a bug on the writing side and panic; a block never grows.
pub struct BlockWriter<'a> {
    buf: &'a mut BlockBuffer,
    start: usize,
    size: usize,
    offset: usize,
}

impl BlockSink for BlockWriter<'_> {
    fn put_u8(&mut self, v: u8) {
        assert!(
            self.offset < self.size,
            "write past end of {}-byte block",
            self.size
        );
        self.buf.buf[self.start + self.offset] = v;
        self.offset += 1;
    }

    /// A rewrite cannot change an array's length; skip over the prefix
    fn new_array(&mut self) {
        self.offset += 4;
    }

    fn end_array(&mut self) {}
}

/// Read access to a committed block's payload; offsets are relative to
/// the payload start.
pub struct BlockReader<'a> {
    buf: &'a BlockBuffer,
    block: Block,
}

impl BlockReader<'_> {
    pub fn payload(&self) -> &[u8] {
        let start = self.block.start_offset;
        &self.buf.buf[start..start + self.block.size]
    }

    pub fn u8_at(&self, offset: usize) -> u8 {
        self.payload()[offset]
    }

    pub fn u16_at(&self, offset: usize) -> u16 {
        let p = self.payload();
        u16::from_be_bytes([p[offset], p[offset + 1]])
    }

    pub fn u32_at(&self, offset: usize) -> u32 {
        let p = self.payload();
        u32::from_be_bytes([p[offset], p[offset + 1], p[offset + 2], p[offset + 3]])
    }

    pub fn f32_at(&self, offset: usize) -> f32 {
        f32::from_bits(self.u32_at(offset))
    }

    pub fn vec2f_at(&self, offset: usize) -> (f32, f32) {
        (self.f32_at(offset), self.f32_at(offset + 4))
    }

    pub fn vec3f_at(&self, offset: usize) -> (f32, f32, f32) {
        (
            self.f32_at(offset),
            self.f32_at(offset + 4),
            self.f32_at(offset + 8),
        )
    }
}

/// Split a copied byte stream back into `(kind, payload)` frames. The
/// block header is the only framing sessions emit.
pub fn blocks(bytes: &[u8]) -> Vec<(u8, &[u8])> {
    let mut out = Vec::new();
    let mut off = 0;
    while off + HEADER_BYTES <= bytes.len() {
        let kind = bytes[off];
        let size = u32::from_be_bytes([
            bytes[off + 1],
            bytes[off + 2],
            bytes[off + 3],
            bytes[off + 4],
        ]) as usize;
        let start = off + HEADER_BYTES;
        if start + size > bytes.len() {
            break;
        }
        out.push((kind, &bytes[start..start + size]));
        off = start + size;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Mat4;

    #[test]
    fn test_new_block_layout() {
        let mut buf = BlockBuffer::new(255);

        buf.new_block(1);
        buf.put_u8(1);
        buf.put_u8(2);
        buf.put_u16(30_000);
        buf.put_u32(1_000_000);
        buf.put_vec2f(0.235_455_23, 0.230_190);
        buf.put_vec3f(0.987_676_67, 0.298_399, 0.198_923);
        buf.put_mat4(Mat4::new().out());
        let block = buf.end_block();

        // 2 + 2 + 4 + 8 + 12 + (4 + 64) payload bytes
        assert_eq!(block.kind(), 1);
        assert_eq!(block.start_offset(), HEADER_BYTES);
        assert_eq!(block.size(), 96);
        assert_eq!(buf.block_count(), 1);
    }

    #[test]
    fn test_array_length_is_back_patched() {
        let mut buf = BlockBuffer::new(255);

        buf.new_block(1);
        buf.new_array();
        buf.put_vec2f(1.0, 1.0);
        buf.put_vec2f(1.0, 1.0);
        buf.put_vec2f(1.0, 1.0);
        buf.end_array();
        let block = buf.end_block();

        assert_eq!(buf.reader(&block).u32_at(0), 24);

        buf.new_block(1);
        buf.put_mat4(Mat4::new().out());
        let block = buf.end_block();

        assert_eq!(buf.reader(&block).u32_at(0), 64);
    }

    #[test]
    fn test_read_block() {
        let mut buf = BlockBuffer::new(255);

        buf.new_block(1);
        buf.put_u8(1);
        buf.put_u8(2);
        buf.put_vec2f(2.0, 1.0);
        let block = buf.end_block();

        let r = buf.reader(&block);
        assert_eq!(r.u8_at(0), 1);
        assert_eq!(r.u8_at(1), 2);
        assert_eq!(r.vec2f_at(2), (2.0, 1.0));
    }

    #[test]
    fn test_update_block_in_place() {
        let mut buf = BlockBuffer::new(255);

        buf.new_block(1);
        buf.put_u8(1);
        buf.put_u8(2);
        let block = buf.end_block();

        let mut w = buf.writer(&block);
        w.put_u8(3);
        w.put_u8(4);

        // Size is unchanged, the payload is rewritten
        assert_eq!(block.size(), 2);
        let mut out = vec![0u8; block.frame_size()];
        let n = buf.copy_block(&block, &mut out);
        assert_eq!(n, 7);
        assert_eq!(out, vec![1, 0, 0, 0, 2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "write past end")]
    fn test_update_cannot_grow_block() {
        let mut buf = BlockBuffer::new(255);

        buf.new_block(1);
        buf.put_u8(1);
        let block = buf.end_block();

        let mut w = buf.writer(&block);
        w.put_u8(2);
        w.put_u8(3);
    }

    #[test]
    fn test_free_zero_fills_without_reclaim() {
        let mut buf = BlockBuffer::new(255);

        buf.new_block(2);
        buf.put_u16(0xBEEF);
        let block = buf.end_block();
        let end = buf.offset();

        buf.free_block(&block);
        assert_eq!(buf.offset(), end);
        assert_eq!(buf.reader(&block).u16_at(0), 0);
    }

    #[test]
    fn test_blocks_round_trip_through_copy() {
        let mut buf = BlockBuffer::new(255);

        buf.new_block(1);
        buf.put_u16(7);
        buf.put_vec2f(0.5, -0.5);
        let a = buf.end_block();

        buf.new_block(4);
        buf.put_u8(9);
        let b = buf.end_block();

        let mut out = vec![0u8; a.frame_size() + b.frame_size()];
        let mut n = buf.copy_block(&a, &mut out);
        n += buf.copy_block(&b, &mut out[n..]);

        let frames = blocks(&out[..n]);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].0, 1);
        assert_eq!(frames[0].1.len(), 10);
        assert_eq!(frames[1].0, 4);
        assert_eq!(frames[1].1, &[9]);
    }

    #[test]
    #[should_panic(expected = "block buffer exhausted")]
    fn test_exhaustion_panics() {
        let mut buf = BlockBuffer::new(8);
        buf.new_block(0);
        buf.put_u32(1);
    }
}
