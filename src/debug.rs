use std::f32::consts::FRAC_PI_2;

use crate::terrain::{ChunkCoord, TerrainFocus, TerrainManager};
use bevy::prelude::*;

#[derive(Debug, Default)]
pub struct DebugModePlugin;

impl Plugin for DebugModePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (draw_chunks, draw_focus_chunk));
    }
}

fn draw_chunks(mut gizmos: Gizmos, q_chunks: Query<&ChunkCoord>, terrain_manager: Res<TerrainManager>) {
    let extent = terrain_manager.chunk_size() as f32 * terrain_manager.unit_size();

    for coord in q_chunks.iter() {
        let position = terrain_manager.chunk_world_position(coord);
        gizmos.sphere(position, Quat::IDENTITY, 0.5, Color::RED);

        gizmos.rect(
            position,
            Quat::from_rotation_x(FRAC_PI_2),
            Vec2::splat(extent),
            Color::RED,
        );
    }
}

fn draw_focus_chunk(
    mut gizmos: Gizmos,
    q_focus: Query<&Transform, With<TerrainFocus>>,
    terrain_manager: Res<TerrainManager>,
) {
    let Ok(transform) = q_focus.get_single() else {
        return;
    };

    let coord = terrain_manager.find_chunk_coordinate(transform.translation);
    let position = terrain_manager.chunk_world_position(&coord);
    let radius = terrain_manager.render_distance() as f32
        * terrain_manager.chunk_size() as f32
        * terrain_manager.unit_size();

    gizmos.circle(position, Direction3d::Y, radius, Color::WHITE);
}
