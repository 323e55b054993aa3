use bevy::prelude::*;

/// Position of a chunk in chunk-grid space.
///
/// Also used as a component on the entity that renders the chunk.
#[derive(Component, Deref, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkCoord(pub IVec2);

impl ChunkCoord {
    pub const ORIGIN: ChunkCoord = ChunkCoord(IVec2::ZERO);

    pub fn new(x: i32, z: i32) -> Self {
        ChunkCoord(IVec2::new(x, z))
    }

    /// Packs both axes into a single integer key, `x` in the high half.
    pub fn pack(&self) -> u64 {
        ((self.x as u32 as u64) << 32) | (self.y as u32 as u64)
    }

    pub fn unpack(key: u64) -> Self {
        ChunkCoord::new((key >> 32) as u32 as i32, key as u32 as i32)
    }

    /// Euclidean distance in chunks.
    pub fn distance(&self, other: &ChunkCoord) -> f32 {
        (self.0.as_i64vec2() - other.0.as_i64vec2()).as_dvec2().length() as f32
    }
}

impl From<IVec2> for ChunkCoord {
    fn from(value: IVec2) -> Self {
        ChunkCoord(value)
    }
}

/// Marks the entity whose translation decides which chunks stay loaded.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct TerrainFocus;
