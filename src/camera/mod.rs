use bevy::prelude::*;
use bevy_panorbit_camera::PanOrbitCamera;

use crate::terrain::{TerrainManager, TerrainSet};

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, follow_fluid_surface.after(TerrainSet::Update));
    }
}

/// Keeps the orbit target on the water surface, or the ground when the
/// terrain has no fluid layer.
pub fn follow_fluid_surface(
    mut q_camera: Query<&mut PanOrbitCamera>,
    terrain_manager: Res<TerrainManager>,
) {
    let layer = terrain_manager.layer_index("fluid").unwrap_or(0);

    for mut camera in q_camera.iter_mut() {
        let focus = camera.target_focus;
        let Some(height) = terrain_manager.height_at(focus.xz(), layer) else {
            continue;
        };

        camera.target_focus.y = height;
    }
}
