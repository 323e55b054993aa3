use bevy::prelude::*;

use super::{
    fractal::NoiseEvaluator,
    helpers::geometry::{
        chunk_coord_to_world_pos, grid_point_to_local, index_1d_to_2d, index_2d_to_1d,
    },
    ChunkCoord, TerrainLayer,
};

pub use mesh::{ChunkMesh, MeshUpdate, INDICES_PER_QUAD, VERTICES_PER_QUAD};
pub use pool::ChunkPool;

mod mesh;
mod pool;

/// Identity of a chunk instance, stable across pooling.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub u32);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    #[default]
    Pooled,
    Spawning,
    Active,
}

/// Noise samples of one layer on the `(size + 1)²` grid of a chunk.
#[derive(Debug, Default, Clone)]
pub struct NoiseBuffer {
    name: String,
    samples: Vec<f32>,
}

impl NoiseBuffer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

#[derive(Debug)]
pub struct Chunk {
    id: ChunkId,
    coord: ChunkCoord,
    size: u32,
    unit_size: f32,
    lod_distance: u32,
    state: ChunkState,
    buffers: Vec<NoiseBuffer>,
    mesh: ChunkMesh,
}

impl Chunk {
    pub(crate) fn new(id: ChunkId) -> Self {
        Chunk {
            id,
            coord: ChunkCoord::ORIGIN,
            size: 0,
            unit_size: 1.0,
            lod_distance: 0,
            state: ChunkState::Pooled,
            buffers: Vec::new(),
            mesh: ChunkMesh::default(),
        }
    }

    /// Places the chunk at `coord`, sizes its noise buffers and rebuilds the
    /// mesh topology for every layer.
    pub fn init(&mut self, coord: ChunkCoord, size: u32, unit_size: f32, layers: &[TerrainLayer]) {
        self.coord = coord;
        self.size = size;
        self.unit_size = unit_size;
        self.lod_distance = 0;

        let width = size as usize + 1;
        self.buffers.resize_with(layers.len(), NoiseBuffer::default);
        for (buffer, layer) in self.buffers.iter_mut().zip(layers) {
            buffer.name.clear();
            buffer.name.push_str(layer.name());
            buffer.samples.clear();
            buffer.samples.resize(width * width, 0.0);
        }

        self.mesh.rebuild_topology(size, unit_size, layers.len());
        self.state = ChunkState::Active;
    }

    /// Clears the chunk for the pool. Buffers keep their capacity.
    pub(crate) fn reset(&mut self) {
        self.coord = ChunkCoord::ORIGIN;
        self.lod_distance = 0;
        self.state = ChunkState::Pooled;
        for buffer in self.buffers.iter_mut() {
            buffer.samples.clear();
        }
        self.mesh.clear();
    }

    pub(crate) fn set_state(&mut self, state: ChunkState) {
        self.state = state;
    }

    /// Resamples every layer at `time` and pushes the heights and colors into
    /// the mesh. Noise is sampled in world space so neighbours line up.
    pub fn refresh(&mut self, evaluator: &NoiseEvaluator, layers: &[TerrainLayer], wind: Vec2, time: f32) {
        debug_assert_eq!(self.buffers.len(), layers.len());

        let size = self.size;
        let unit_size = self.unit_size;
        let origin = self.world_origin();
        let width = size as usize + 1;

        for (index, (buffer, layer)) in self.buffers.iter_mut().zip(layers).enumerate() {
            for (i, sample) in buffer.samples.iter_mut().enumerate() {
                let point = index_1d_to_2d(i, width);
                let position = origin + grid_point_to_local(point, size, unit_size);
                *sample = layer.base_height + evaluator.evaluate_2d(position, time, wind, &layer.noise);
            }

            self.mesh.update_layer_heights(index, &buffer.samples);
            self.mesh.update_layer_colors(index, &layer.color);
        }

        self.mesh.recalculate_normals();
    }

    /// Nearest noise sample of `layer` to a position relative to the chunk
    /// center.
    pub fn sample_local(&self, layer: usize, local: Vec2) -> Option<f32> {
        let buffer = self.buffers.get(layer)?;
        let point = (local / self.unit_size + Vec2::splat(self.size as f32 / 2.0)).round();
        if point.min_element() < 0.0 || point.max_element() > self.size as f32 {
            return None;
        }

        let point = point.as_uvec2();
        let width = self.size as usize + 1;
        buffer
            .samples
            .get(index_2d_to_1d(point.x as usize, point.y as usize, width))
            .copied()
    }

    /// World XZ position of the chunk center.
    pub fn world_origin(&self) -> Vec2 {
        chunk_coord_to_world_pos(&self.coord, self.size, self.unit_size)
    }

    pub fn id(&self) -> ChunkId {
        self.id
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn unit_size(&self) -> f32 {
        self.unit_size
    }

    pub fn lod_distance(&self) -> u32 {
        self.lod_distance
    }

    pub(crate) fn set_lod_distance(&mut self, lod_distance: u32) {
        self.lod_distance = lod_distance;
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    pub fn buffers(&self) -> &[NoiseBuffer] {
        &self.buffers
    }

    pub fn mesh(&self) -> &ChunkMesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut ChunkMesh {
        &mut self.mesh
    }
}
