use bevy::prelude::*;

pub use chunk::{
    Chunk, ChunkId, ChunkMesh, ChunkPool, ChunkState, MeshUpdate, NoiseBuffer, INDICES_PER_QUAD,
    VERTICES_PER_QUAD,
};
pub use components::*;
pub use config::*;
pub use error::TerrainConfigError;
pub use fractal::{BaseNoise, NoiseEvaluator, NoiseKind, NoiseSettings, NoiseSource, OctaveTables};
pub use layer::*;
pub use render::{build_mesh, TerrainMaterial};
pub use resources::*;
use render::*;
use systems::*;

pub mod chunk;
mod components;
mod config;
mod error;
pub mod fractal;
pub(crate) mod helpers;
mod layer;
mod render;
mod resources;
mod systems;

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TerrainSet {
    /// Spawn/evict pass followed by the chunk refresh.
    Update,
    /// Hands the refreshed buffers to the renderer.
    Sync,
}

/// Streams chunks around the [`TerrainFocus`] and refreshes them every tick.
pub struct TerrainPlugin {
    config: TerrainConfig,
}

impl TerrainPlugin {
    pub fn new(config: TerrainConfig) -> Self {
        TerrainPlugin { config }
    }
}

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        let config = match self.config.validate() {
            Ok(()) => self.config.clone(),
            Err(err) => {
                error!("Invalid terrain config, using defaults: {}", err);
                TerrainConfig::default()
            }
        };

        app.insert_resource(TerrainManager::new(&config))
            .insert_resource(config)
            .configure_sets(Update, (TerrainSet::Update, TerrainSet::Sync).chain())
            .add_systems(
                Update,
                (update_chunks_around_focus, refresh_chunks)
                    .chain()
                    .in_set(TerrainSet::Update),
            );
    }
}

/// Uploads chunk meshes as PBR entities.
#[derive(Debug, Default)]
pub struct TerrainRenderPlugin;

impl Plugin for TerrainRenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_terrain_material)
            .add_systems(Update, sync_chunk_meshes.in_set(TerrainSet::Sync));
    }
}
