use bevy::prelude::*;

use super::{Chunk, ChunkId, ChunkState};

/// Deactivated chunks kept around so their buffers can be reused.
///
/// Chunks move in and out by value, so a chunk is either owned by the pool
/// or by whoever took it, never both.
#[derive(Debug, Default)]
pub struct ChunkPool {
    pool: Vec<Chunk>,
    next_id: u32,
}

impl ChunkPool {
    /// Pops a pooled chunk, or constructs a new one when the pool is empty.
    pub fn take_or_create(&mut self) -> Chunk {
        let mut chunk = match self.pool.pop() {
            Some(chunk) => chunk,
            None => {
                let id = ChunkId(self.next_id);
                self.next_id += 1;
                debug!("Creating chunk {:?}", id);
                Chunk::new(id)
            }
        };

        chunk.set_state(ChunkState::Spawning);
        chunk
    }

    pub fn return_chunk(&mut self, mut chunk: Chunk) {
        chunk.reset();
        self.pool.push(chunk);
    }

    /// Drops pooled chunks until at most `len` remain.
    pub fn shrink_to(&mut self, len: usize) {
        if self.pool.len() > len {
            debug!("Shrinking chunk pool from {} to {}", self.pool.len(), len);
        }
        self.pool.truncate(len);
        self.pool.shrink_to_fit();
    }

    pub fn contains(&self, id: ChunkId) -> bool {
        self.pool.iter().any(|chunk| chunk.id() == id)
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Number of chunks ever constructed by this pool.
    pub fn created(&self) -> u32 {
        self.next_id
    }
}
