use bevy::prelude::*;
use itertools::izip;

use super::{BaseNoise, NoiseSettings, NoiseSource, MIN_SCALE};

/// Sums octaves of a [`BaseNoise`] primitive into a fractal sample.
///
/// The result is not normalized: a sample is bounded by the layer's
/// [`super::OctaveTables::amplitude_sum`], not by `[-1, 1]`.
#[derive(Clone)]
pub struct NoiseEvaluator<N: BaseNoise = NoiseSource> {
    source: N,
}

impl<N: BaseNoise> NoiseEvaluator<N> {
    pub fn new(source: N) -> Self {
        NoiseEvaluator { source }
    }

    pub fn source(&self) -> &N {
        &self.source
    }

    /// Samples the layer on the horizontal plane. `wind` scrolls each octave
    /// by `time * wave_speed` along its direction.
    pub fn evaluate_2d(&self, position: Vec2, time: f32, wind: Vec2, settings: &NoiseSettings) -> f32 {
        let scale = settings.scale().max(MIN_SCALE) as f64;
        let seed = settings.seed().as_dvec3();
        let position = position.as_dvec2();
        let wind = wind.as_dvec2();
        let time = time as f64;
        let octaves = settings.octaves();

        let mut value = 0.0;
        for (offset, amplitude, frequency, wave_speed) in izip!(
            octaves.offsets.iter(),
            octaves.amplitudes.iter(),
            octaves.frequencies.iter(),
            octaves.wave_speeds.iter()
        ) {
            let frequency = *frequency as f64;
            let wave = time * *wave_speed as f64;

            let x = (position.x + seed.x) / scale * frequency + offset.x as f64 + wave * wind.x;
            let y = (position.y + seed.y) / scale * frequency + offset.y as f64 + wave * wind.y;

            value += self.source.sample_2d(x, y) * *amplitude as f64;
        }

        value as f32
    }

    pub fn evaluate_3d(&self, position: Vec3, time: f32, wind: Vec3, settings: &NoiseSettings) -> f32 {
        let scale = settings.scale().max(MIN_SCALE) as f64;
        let seed = settings.seed().as_dvec3();
        let position = position.as_dvec3();
        let wind = wind.as_dvec3();
        let time = time as f64;
        let octaves = settings.octaves();

        let mut value = 0.0;
        for (offset, amplitude, frequency, wave_speed) in izip!(
            octaves.offsets.iter(),
            octaves.amplitudes.iter(),
            octaves.frequencies.iter(),
            octaves.wave_speeds.iter()
        ) {
            let frequency = *frequency as f64;
            let wave = time * *wave_speed as f64;
            let coord = (position + seed) / scale * frequency + offset.as_dvec3() + wind * wave;

            value += self.source.sample_3d(coord.x, coord.y, coord.z) * *amplitude as f64;
        }

        value as f32
    }
}
