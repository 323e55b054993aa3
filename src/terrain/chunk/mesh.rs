use bevy::prelude::*;

use crate::terrain::{
    helpers::geometry::{grid_point_to_local, index_2d_to_1d},
    ColorRamp,
};

pub const VERTICES_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;

/// Corner offsets of an upward facing unit quad, relative to the cell center.
const TOP_FACE: [Vec3; VERTICES_PER_QUAD] = [
    Vec3::new(-0.5, 0.0, -0.5),
    Vec3::new(0.5, 0.0, -0.5),
    Vec3::new(-0.5, 0.0, 0.5),
    Vec3::new(0.5, 0.0, 0.5),
];

/// Noise grid offset of each [`TOP_FACE`] corner from the cell's first corner.
const FACE_CORNERS: [(usize, usize); VERTICES_PER_QUAD] = [(0, 0), (1, 0), (0, 1), (1, 1)];

const FACE_UVS: [[f32; 2]; VERTICES_PER_QUAD] = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];

/// Two counter-clockwise triangles seen from +Y.
const FACE_INDICES: [u32; INDICES_PER_QUAD] = [1, 2, 3, 0, 2, 1];

/// What the rendering side has to upload since it last looked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshUpdate {
    /// Every buffer changed, including the index buffer.
    Topology,
    /// Only positions, normals and colors changed.
    Heights,
}

/// Flattened mesh buffers of one chunk: one quad per cell per layer.
#[derive(Debug, Default, Clone)]
pub struct ChunkMesh {
    size: u32,
    unit_size: f32,
    layer_count: usize,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    colors: Vec<[f32; 4]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
    pending: Option<MeshUpdate>,
}

impl ChunkMesh {
    pub fn quads_per_layer(&self) -> usize {
        (self.size * self.size) as usize
    }

    /// Regenerates every buffer for a `size` x `size` grid of cells with
    /// `layer_count` stacked layers. Heights start at zero.
    pub fn rebuild_topology(&mut self, size: u32, unit_size: f32, layer_count: usize) {
        let _span = info_span!("rebuild_topology", size, layer_count).entered();

        self.size = size;
        self.unit_size = unit_size;
        self.layer_count = layer_count;

        let quads = self.quads_per_layer() * layer_count;
        let vertex_count = quads * VERTICES_PER_QUAD;

        self.positions.clear();
        self.normals.clear();
        self.colors.clear();
        self.uvs.clear();
        self.indices.clear();
        self.positions.reserve(vertex_count);
        self.normals.reserve(vertex_count);
        self.colors.reserve(vertex_count);
        self.uvs.reserve(vertex_count);
        self.indices.reserve(quads * INDICES_PER_QUAD);

        let half = size as f32 / 2.0;
        for _layer in 0..layer_count {
            for y in 0..size {
                for x in 0..size {
                    let center = Vec3::new(x as f32 + 0.5 - half, 0.0, y as f32 + 0.5 - half);
                    let first = self.positions.len() as u32;

                    for (corner, uv) in TOP_FACE.iter().zip(FACE_UVS) {
                        self.positions.push(((center + *corner) * unit_size).to_array());
                        self.normals.push([0.0, 1.0, 0.0]);
                        self.colors.push([1.0, 1.0, 1.0, 1.0]);
                        self.uvs.push(uv);
                    }
                    self.indices
                        .extend(FACE_INDICES.iter().map(|offset| first + offset));
                }
            }
        }

        debug_assert_eq!(self.positions.len(), vertex_count);
        debug_assert!(self.check_invariants());

        self.pending = Some(MeshUpdate::Topology);
    }

    /// Writes `samples`, a `(size + 1)²` noise grid, into the heights of
    /// `layer` without touching topology.
    pub fn update_layer_heights(&mut self, layer: usize, samples: &[f32]) {
        let width = self.size as usize + 1;
        debug_assert!(layer < self.layer_count, "layer {layer} out of range");
        debug_assert_eq!(samples.len(), width * width);

        let size = self.size as usize;
        let layer_start = layer * self.quads_per_layer() * VERTICES_PER_QUAD;
        let vertices = &mut self.positions[layer_start..layer_start + size * size * VERTICES_PER_QUAD];

        for (quad, vertices) in vertices.chunks_exact_mut(VERTICES_PER_QUAD).enumerate() {
            let (x, y) = (quad % size, quad / size);
            for (vertex, (cx, cy)) in vertices.iter_mut().zip(FACE_CORNERS) {
                vertex[1] = samples[index_2d_to_1d(x + cx, y + cy, width)];
            }
        }

        self.mark_heights_changed();
    }

    /// Recolors `layer` from its current vertex heights.
    pub fn update_layer_colors(&mut self, layer: usize, ramp: &ColorRamp) {
        debug_assert!(layer < self.layer_count, "layer {layer} out of range");

        let range = self.layer_vertex_range(layer);
        for (color, position) in self.colors[range.clone()].iter_mut().zip(&self.positions[range]) {
            *color = ramp.color_at(position[1]);
        }

        self.mark_heights_changed();
    }

    /// Area weighted vertex normals from the current index buffer.
    pub fn recalculate_normals(&mut self) {
        self.normals.iter_mut().for_each(|normal| *normal = [0.0; 3]);

        for triangle in self.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            let pa = Vec3::from_array(self.positions[a]);
            let pb = Vec3::from_array(self.positions[b]);
            let pc = Vec3::from_array(self.positions[c]);
            let face = (pb - pa).cross(pc - pa);

            for i in [a, b, c] {
                self.normals[i] = (Vec3::from_array(self.normals[i]) + face).to_array();
            }
        }

        for normal in self.normals.iter_mut() {
            let n = Vec3::from_array(*normal).try_normalize().unwrap_or(Vec3::Y);
            *normal = n.to_array();
        }
    }

    fn mark_heights_changed(&mut self) {
        self.pending.get_or_insert(MeshUpdate::Heights);
    }

    fn layer_vertex_range(&self, layer: usize) -> std::ops::Range<usize> {
        let len = self.quads_per_layer() * VERTICES_PER_QUAD;
        layer * len..(layer + 1) * len
    }

    fn check_invariants(&self) -> bool {
        let vertex_count = self.positions.len();
        vertex_count == self.normals.len()
            && vertex_count == self.colors.len()
            && vertex_count == self.uvs.len()
            && self.indices.len() % 3 == 0
            && self.indices.iter().all(|i| (*i as usize) < vertex_count)
    }

    /// Chunk local XZ position of a noise grid point.
    pub fn grid_point_position(&self, point: UVec2) -> Vec2 {
        grid_point_to_local(point, self.size, self.unit_size)
    }

    /// Returns and clears the pending upload kind.
    pub fn take_pending_update(&mut self) -> Option<MeshUpdate> {
        self.pending.take()
    }

    pub fn pending_update(&self) -> Option<MeshUpdate> {
        self.pending
    }

    /// Empties every buffer, keeping their capacity.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.colors.clear();
        self.uvs.clear();
        self.indices.clear();
        self.layer_count = 0;
        self.pending = None;
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn unit_size(&self) -> f32 {
        self.unit_size
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn colors(&self) -> &[[f32; 4]] {
        &self.colors
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.positions.len() / VERTICES_PER_QUAD
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
