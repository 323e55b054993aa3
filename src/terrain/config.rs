use std::{collections::HashSet, fs, path::Path};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{default_layers, fractal::NoiseKind, TerrainConfigError, TerrainLayer};

pub const DEFAULT_SEED_RANGE: i32 = 32767;

/// Startup settings of the terrain. Loaded once, never hot reloaded.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Radius, in chunks, of the circle of chunks kept around the focus.
    pub render_distance: u32,
    /// Cells per chunk side.
    pub chunk_size: u32,
    /// World distance per cell.
    pub unit_size: f32,
    pub seed_range: i32,
    /// Random at startup when unset.
    pub world_seed: Option<u64>,
    pub noise: NoiseKind,
    pub wind_direction: [f32; 2],
    pub parallel_refresh: bool,
    pub layers: Vec<TerrainLayer>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig {
            render_distance: 6,
            chunk_size: 16,
            unit_size: 1.0,
            seed_range: DEFAULT_SEED_RANGE,
            world_seed: None,
            noise: NoiseKind::default(),
            wind_direction: [1.0, 0.35],
            parallel_refresh: true,
            layers: default_layers(),
        }
    }
}

impl TerrainConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, TerrainConfigError> {
        let config: TerrainConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TerrainConfigError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), TerrainConfigError> {
        if self.chunk_size == 0 {
            return Err(TerrainConfigError::ZeroChunkSize);
        }
        if !(self.unit_size.is_finite() && self.unit_size > 0.0) {
            return Err(TerrainConfigError::InvalidUnitSize(self.unit_size));
        }
        if self.seed_range < 0 {
            return Err(TerrainConfigError::InvalidSeedRange(self.seed_range));
        }
        if self.layers.is_empty() {
            return Err(TerrainConfigError::NoLayers);
        }

        let mut names = HashSet::new();
        for layer in self.layers.iter() {
            if !names.insert(layer.name()) {
                return Err(TerrainConfigError::DuplicateLayer(layer.name().to_string()));
            }

            let noise = &layer.noise;
            for (field, value) in [
                ("scale", noise.scale()),
                ("amplitude", noise.amplitude()),
                ("frequency", noise.frequency()),
                ("persistence", noise.persistence()),
                ("lacunarity", noise.lacunarity()),
                ("wave_speed", noise.wave_speed()),
                ("wave_subspeed", noise.wave_subspeed()),
                ("base_height", layer.base_height),
            ] {
                if !value.is_finite() {
                    return Err(TerrainConfigError::NonFinite {
                        layer: layer.name().to_string(),
                        field,
                    });
                }
            }

            if noise.wave_subspeed() <= 0.0 {
                return Err(TerrainConfigError::InvalidWaveSubspeed {
                    layer: layer.name().to_string(),
                    value: noise.wave_subspeed(),
                });
            }
        }

        Ok(())
    }

    pub fn wind_direction(&self) -> Vec2 {
        Vec2::from_array(self.wind_direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::ColorRamp;

    #[test]
    fn test_default_is_valid() {
        let config = TerrainConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.layers.len(), 2);
        assert_eq!(config.layers[0].name(), "solid");
        assert_eq!(config.layers[1].name(), "fluid");
    }

    #[test]
    fn test_from_toml_str() {
        let config = TerrainConfig::from_toml_str(
            r#"
            render_distance = 3
            chunk_size = 8
            unit_size = 0.5
            world_seed = 42
            noise = "perlin"
            wind_direction = [0.0, 1.0]

            [[layers]]
            name = "solid"
            scale = 12.0
            octaves = 3
            base_height = -2.0
            color = { bands = [
                { name = "sand", max_height = 0.0, color = [0.8, 0.7, 0.5, 1.0] },
                { name = "rock", max_height = 10.0, color = [0.4, 0.4, 0.4, 1.0] },
            ] }

            [[layers]]
            name = "fluid"
            wave_speed = 0.5
            wave_subspeed = 2.0
            "#,
        )
        .unwrap();

        assert_eq!(config.render_distance, 3);
        assert_eq!(config.chunk_size, 8);
        assert_eq!(config.world_seed, Some(42));
        assert_eq!(config.noise, NoiseKind::Perlin);
        assert_eq!(config.wind_direction(), Vec2::Y);
        assert_eq!(config.seed_range, DEFAULT_SEED_RANGE);
        assert!(config.parallel_refresh);
        assert_eq!(config.layers.len(), 2);
        assert_eq!(config.layers[0].noise.octave_count(), 3);
        assert_eq!(config.layers[1].noise.wave_subspeed(), 2.0);
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let err = TerrainConfig::from_toml_str("chunk_size = 0").unwrap_err();
        assert!(matches!(err, TerrainConfigError::ZeroChunkSize));
    }

    #[test]
    fn test_rejects_bad_unit_size() {
        let err = TerrainConfig::from_toml_str("unit_size = -1.0").unwrap_err();
        assert!(matches!(err, TerrainConfigError::InvalidUnitSize(_)));
    }

    #[test]
    fn test_rejects_empty_layers() {
        let err = TerrainConfig::from_toml_str("layers = []").unwrap_err();
        assert!(matches!(err, TerrainConfigError::NoLayers));
    }

    #[test]
    fn test_rejects_duplicate_layers() {
        let err = TerrainConfig::from_toml_str(
            r#"
            [[layers]]
            name = "fluid"

            [[layers]]
            name = "fluid"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, TerrainConfigError::DuplicateLayer(name) if name == "fluid"));
    }

    #[test]
    fn test_rejects_non_positive_wave_subspeed() {
        let err = TerrainConfig::from_toml_str(
            r#"
            [[layers]]
            name = "fluid"
            wave_speed = 1.0
            wave_subspeed = 0.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, TerrainConfigError::InvalidWaveSubspeed { .. }));
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut config = TerrainConfig::default();
        config.layers[0].base_height = f32::NAN;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, TerrainConfigError::NonFinite { field: "base_height", .. }));
    }

    #[test]
    fn test_zero_scale_is_clamped_not_rejected() {
        let config = TerrainConfig::from_toml_str(
            r#"
            [[layers]]
            name = "flat"
            scale = 0.0
            "#,
        )
        .unwrap();
        assert!(config.layers[0].noise.scale() > 0.0);
    }

    #[test]
    fn test_shipped_config_matches_default_shape() {
        let config = TerrainConfig::from_toml_str(include_str!("../../config/terrain.toml")).unwrap();
        let default = TerrainConfig::default();

        assert_eq!(config.render_distance, default.render_distance);
        assert_eq!(config.chunk_size, default.chunk_size);
        assert_eq!(config.world_seed, None);
        assert_eq!(
            config.layers.iter().map(TerrainLayer::name).collect::<Vec<_>>(),
            vec!["solid", "fluid"]
        );
        assert!(matches!(&config.layers[0].color, ColorRamp::Bands(bands) if bands.len() == 4));
        assert!(matches!(config.layers[1].color, ColorRamp::Gradient { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = TerrainConfig::load("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, TerrainConfigError::Io(_)));
    }
}
