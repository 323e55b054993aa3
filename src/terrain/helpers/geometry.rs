use bevy::prelude::*;

use crate::terrain::ChunkCoord;

/// World distance covered by one side of a chunk.
pub fn chunk_extent(size: u32, unit_size: f32) -> f32 {
    size as f32 * unit_size
}

/// Calculates a [`Transform`] for a chunk that places its center at `coord`
/// in world space.
pub fn get_chunk_coord_transform(coord: &ChunkCoord, size: u32, unit_size: f32, y: f32) -> Transform {
    let translation = chunk_coord_to_world_pos(coord, size, unit_size)
        .extend(y)
        .xzy();

    return Transform::from_translation(translation);
}

pub fn chunk_coord_to_world_pos(coord: &ChunkCoord, size: u32, unit_size: f32) -> Vec2 {
    coord.as_vec2() * chunk_extent(size, unit_size)
}

/// Rounds a world position to the chunk whose center is nearest.
pub fn world_pos_to_chunk_coord(world_pos: &Vec2, size: u32, unit_size: f32) -> ChunkCoord {
    let chunk_coord = (*world_pos / chunk_extent(size, unit_size)).round().as_ivec2();

    return ChunkCoord(chunk_coord);
}

/// Offset of a noise grid point from the center of its chunk.
///
/// Grid points run from `0..=size` on each axis, so the outermost points of
/// neighbouring chunks land on the same world position.
pub fn grid_point_to_local(point: UVec2, size: u32, unit_size: f32) -> Vec2 {
    (point.as_vec2() - Vec2::splat(size as f32 / 2.0)) * unit_size
}

#[inline]
pub fn index_2d_to_1d(x: usize, y: usize, width: usize) -> usize {
    y * width + x
}

#[inline]
pub fn index_1d_to_2d(index: usize, width: usize) -> UVec2 {
    UVec2::new((index % width) as u32, (index / width) as u32)
}
