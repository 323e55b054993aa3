use std::path::PathBuf;

use bevy::prelude::*;
use bevy_panorbit_camera::PanOrbitCameraPlugin;

use crate::{
    camera::CameraPlugin,
    terrain::{TerrainConfig, TerrainPlugin, TerrainRenderPlugin},
};

#[cfg(feature = "debug")]
use crate::debug::DebugModePlugin;

use systems::*;

mod systems;

pub const DEFAULT_CONFIG_PATH: &str = "config/terrain.toml";

/// The whole demo: window, camera, light and the streamed terrain.
pub struct SeascapePlugin {
    config_path: PathBuf,
}

impl Default for SeascapePlugin {
    fn default() -> Self {
        SeascapePlugin {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }
}

impl SeascapePlugin {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        SeascapePlugin {
            config_path: config_path.into(),
        }
    }
}

impl Plugin for SeascapePlugin {
    fn build(&self, app: &mut App) {
        #[cfg(not(feature = "debug"))]
        app.add_plugins(DefaultPlugins);

        #[cfg(feature = "debug")]
        app.add_plugins(DefaultPlugins.set(bevy::log::LogPlugin {
            level: bevy::log::Level::DEBUG,
            ..default()
        }));

        #[cfg(feature = "debug")]
        app.add_plugins(DebugModePlugin);

        let config = match TerrainConfig::load(&self.config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Could not load {}, using the default terrain: {}",
                    self.config_path.display(),
                    e
                );
                TerrainConfig::default()
            }
        };

        app.add_plugins(PanOrbitCameraPlugin)
            .add_plugins(CameraPlugin)
            .add_plugins(TerrainPlugin::new(config))
            .add_plugins(TerrainRenderPlugin)
            .add_systems(Startup, setup);
    }
}
