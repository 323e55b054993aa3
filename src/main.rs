use bevy::prelude::*;
use seascape_terrain::core::SeascapePlugin;

fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| seascape_terrain::core::DEFAULT_CONFIG_PATH.to_string());

    App::new().add_plugins(SeascapePlugin::new(config_path)).run();
}
