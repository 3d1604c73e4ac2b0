//! Self-describing binary blocks in a single arena.
//!
//! Everything the state store persists and every byte a session streams
//! goes through [`BlockBuffer`]. All multi-byte fields are big-endian.

mod block_buffer;

pub use block_buffer::{blocks, Block, BlockBuffer, BlockReader, BlockSink, BlockWriter, HEADER_BYTES};
