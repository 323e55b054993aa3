use bevy::prelude::*;

use super::{TerrainFocus, TerrainManager};

pub fn update_chunks_around_focus(
    q_focus: Query<&Transform, With<TerrainFocus>>,
    mut terrain_manager: ResMut<TerrainManager>,
) {
    let Ok(transform) = q_focus.get_single() else {
        return;
    };

    let update = terrain_manager.update_chunks(transform.translation);
    if !update.is_empty() {
        debug!(
            "Chunk pass: {} spawned, {} evicted, {} active",
            update.spawned.len(),
            update.evicted.len(),
            terrain_manager.active_count()
        );
    }
}

pub fn refresh_chunks(time: Res<Time>, mut terrain_manager: ResMut<TerrainManager>) {
    terrain_manager.refresh(time.elapsed_seconds());
}
