use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::fractal::NoiseSettings;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// A named color that applies up to (and including) `max_height`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorBand {
    pub name: String,
    pub max_height: f32,
    pub color: [f32; 4],
}

impl ColorBand {
    pub fn new(name: impl Into<String>, max_height: f32, color: [f32; 4]) -> Self {
        ColorBand {
            name: name.into(),
            max_height,
            color,
        }
    }
}

/// Maps a vertex height to a vertex color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRamp {
    Flat([f32; 4]),
    /// `lerp(low, high, clamp01(height * scale + offset))`
    Gradient {
        low: [f32; 4],
        high: [f32; 4],
        scale: f32,
        offset: f32,
    },
    /// First band whose `max_height` is not below the height; the last band
    /// covers everything above.
    Bands(Vec<ColorBand>),
}

impl Default for ColorRamp {
    fn default() -> Self {
        ColorRamp::Flat(WHITE)
    }
}

impl ColorRamp {
    pub fn color_at(&self, height: f32) -> [f32; 4] {
        match self {
            ColorRamp::Flat(color) => *color,
            ColorRamp::Gradient {
                low,
                high,
                scale,
                offset,
            } => {
                let t = (height * scale + offset).clamp(0.0, 1.0);
                Vec4::from_array(*low)
                    .lerp(Vec4::from_array(*high), t)
                    .to_array()
            }
            ColorRamp::Bands(bands) => bands
                .iter()
                .find(|band| height <= band.max_height)
                .or(bands.last())
                .map(|band| band.color)
                .unwrap_or(WHITE),
        }
    }
}

/// One stacked surface of the terrain, e.g. the sea floor or the water on
/// top of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainLayer {
    #[serde(flatten)]
    pub noise: NoiseSettings,
    /// Added to every noise sample of the layer.
    #[serde(default)]
    pub base_height: f32,
    #[serde(default)]
    pub color: ColorRamp,
}

impl TerrainLayer {
    pub fn new(noise: NoiseSettings) -> Self {
        TerrainLayer {
            noise,
            base_height: 0.0,
            color: ColorRamp::default(),
        }
    }

    pub fn with_base_height(mut self, base_height: f32) -> Self {
        self.base_height = base_height;
        self
    }

    pub fn with_color(mut self, color: ColorRamp) -> Self {
        self.color = color;
        self
    }

    pub fn name(&self) -> &str {
        self.noise.name()
    }
}

/// Rocky ground under an animated sea.
pub fn default_layers() -> Vec<TerrainLayer> {
    vec![
        TerrainLayer::new(
            NoiseSettings::new("solid")
                .with_scale(24.0)
                .with_amplitude(4.0)
                .with_frequency(1.0)
                .with_octaves(4)
                .with_persistence(0.5)
                .with_lacunarity(2.0),
        )
        .with_base_height(-1.5)
        .with_color(ColorRamp::Bands(vec![
            ColorBand::new("sand", -1.0, [0.76, 0.70, 0.50, 1.0]),
            ColorBand::new("grass", 1.0, [0.30, 0.55, 0.25, 1.0]),
            ColorBand::new("rock", 2.5, [0.45, 0.42, 0.40, 1.0]),
            ColorBand::new("snow", 1000.0, [0.95, 0.95, 0.97, 1.0]),
        ])),
        TerrainLayer::new(
            NoiseSettings::new("fluid")
                .with_scale(8.0)
                .with_amplitude(0.35)
                .with_frequency(1.0)
                .with_octaves(3)
                .with_persistence(0.5)
                .with_lacunarity(2.0)
                .with_wave(0.6, 1.5),
        )
        .with_color(ColorRamp::Gradient {
            low: [0.02, 0.12, 0.30, 1.0],
            high: [0.35, 0.65, 0.80, 1.0],
            scale: 1.2,
            offset: 0.5,
        }),
    ]
}
