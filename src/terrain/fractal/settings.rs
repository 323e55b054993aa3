use bevy::prelude::*;
use rand::{distributions::Uniform, Rng};
use serde::{Deserialize, Serialize};

/// Smallest scale a layer is ever evaluated with.
pub const MIN_SCALE: f32 = 1e-4;

/// Per-octave values derived from a [`NoiseSettings`].
///
/// Every table always has one entry per octave.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OctaveTables {
    pub offsets: Vec<Vec3>,
    pub amplitudes: Vec<f32>,
    pub frequencies: Vec<f32>,
    pub wave_speeds: Vec<f32>,
}

impl OctaveTables {
    fn build(settings: &NoiseSettings, offsets: Vec<Vec3>) -> Self {
        debug_assert_eq!(offsets.len(), settings.octave_count);

        let octaves = 0..settings.octave_count as i32;
        OctaveTables {
            offsets,
            amplitudes: octaves
                .clone()
                .map(|i| settings.amplitude * settings.persistence.powi(i))
                .collect(),
            frequencies: octaves
                .clone()
                .map(|i| settings.frequency * settings.lacunarity.powi(i))
                .collect(),
            wave_speeds: octaves
                .map(|i| settings.wave_speed / settings.wave_subspeed.powi(i))
                .collect(),
        }
    }

    /// Sum of the absolute octave amplitudes, the bound used to normalize a
    /// fractal sample.
    pub fn amplitude_sum(&self) -> f32 {
        self.amplitudes.iter().map(|a| a.abs()).sum()
    }
}

/// Tunables of one fractal noise layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NoiseParams", into = "NoiseParams")]
pub struct NoiseSettings {
    name: String,
    scale: f32,
    amplitude: f32,
    frequency: f32,
    wave_speed: f32,
    octave_count: usize,
    persistence: f32,
    lacunarity: f32,
    wave_subspeed: f32,
    manual_seeds: bool,
    seed: IVec3,
    octaves: OctaveTables,
}

impl NoiseSettings {
    pub fn new(name: impl Into<String>) -> Self {
        let mut settings = NoiseSettings {
            name: name.into(),
            scale: 1.0,
            amplitude: 1.0,
            frequency: 1.0,
            wave_speed: 0.0,
            octave_count: 1,
            persistence: 0.5,
            lacunarity: 2.0,
            wave_subspeed: 1.0,
            manual_seeds: false,
            seed: IVec3::ZERO,
            octaves: OctaveTables::default(),
        };
        settings.octaves = OctaveTables::build(&settings, vec![Vec3::ZERO; 1]);
        settings
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.set_scale(scale);
        self
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self.rebuild();
        self
    }

    pub fn with_frequency(mut self, frequency: f32) -> Self {
        self.frequency = frequency;
        self.rebuild();
        self
    }

    /// Sets the octave count; new octaves start with a zero offset until
    /// [`NoiseSettings::setup`] draws them.
    pub fn with_octaves(mut self, octave_count: usize) -> Self {
        let mut offsets = std::mem::take(&mut self.octaves.offsets);
        offsets.resize(octave_count, Vec3::ZERO);
        self.octave_count = octave_count;
        self.octaves = OctaveTables::build(&self, offsets);
        self
    }

    pub fn with_persistence(mut self, persistence: f32) -> Self {
        self.persistence = persistence;
        self.rebuild();
        self
    }

    pub fn with_lacunarity(mut self, lacunarity: f32) -> Self {
        self.lacunarity = lacunarity;
        self.rebuild();
        self
    }

    pub fn with_wave(mut self, wave_speed: f32, wave_subspeed: f32) -> Self {
        self.wave_speed = wave_speed;
        self.wave_subspeed = wave_subspeed;
        self.rebuild();
        self
    }

    /// Pins the axis seeds so [`NoiseSettings::setup`] leaves them alone.
    pub fn with_seed(mut self, seed: IVec3) -> Self {
        self.manual_seeds = true;
        self.seed = seed;
        self
    }

    /// Draws the axis seeds (unless manually seeded) and a fresh offset for
    /// every octave, all uniform in `[-seed_range, seed_range]`.
    pub fn setup<R: Rng + ?Sized>(&mut self, seed_range: i32, rng: &mut R) {
        let seed_range = seed_range.max(0);

        if !self.manual_seeds {
            let seeds = Uniform::new_inclusive(-seed_range, seed_range);
            self.seed = IVec3::new(rng.sample(seeds), rng.sample(seeds), rng.sample(seeds));
        }

        let offsets = random_offsets(self.octave_count, seed_range, rng);
        self.octaves = OctaveTables::build(self, offsets);
    }

    /// Changes the octave count, replacing every per-octave table in one step.
    pub fn set_octave_count<R: Rng + ?Sized>(&mut self, octave_count: usize, seed_range: i32, rng: &mut R) {
        self.octave_count = octave_count;
        let offsets = random_offsets(octave_count, seed_range.max(0), rng);
        self.octaves = OctaveTables::build(self, offsets);
    }

    /// Stores the scale, clamped to [`MIN_SCALE`].
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale.max(MIN_SCALE);
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude;
        self.rebuild();
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.rebuild();
    }

    pub fn set_persistence(&mut self, persistence: f32) {
        self.persistence = persistence;
        self.rebuild();
    }

    pub fn set_lacunarity(&mut self, lacunarity: f32) {
        self.lacunarity = lacunarity;
        self.rebuild();
    }

    pub fn set_wave_speed(&mut self, wave_speed: f32) {
        self.wave_speed = wave_speed;
        self.rebuild();
    }

    pub fn set_wave_subspeed(&mut self, wave_subspeed: f32) {
        self.wave_subspeed = wave_subspeed;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let offsets = std::mem::take(&mut self.octaves.offsets);
        self.octaves = OctaveTables::build(self, offsets);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn wave_speed(&self) -> f32 {
        self.wave_speed
    }

    pub fn octave_count(&self) -> usize {
        self.octave_count
    }

    pub fn persistence(&self) -> f32 {
        self.persistence
    }

    pub fn lacunarity(&self) -> f32 {
        self.lacunarity
    }

    pub fn wave_subspeed(&self) -> f32 {
        self.wave_subspeed
    }

    pub fn manual_seeds(&self) -> bool {
        self.manual_seeds
    }

    pub fn seed(&self) -> IVec3 {
        self.seed
    }

    pub fn octaves(&self) -> &OctaveTables {
        &self.octaves
    }
}

fn random_offsets<R: Rng + ?Sized>(count: usize, seed_range: i32, rng: &mut R) -> Vec<Vec3> {
    let range = seed_range as f32;
    let axis = Uniform::new_inclusive(-range, range);

    (0..count)
        .map(|_| Vec3::new(rng.sample(axis), rng.sample(axis), rng.sample(axis)))
        .collect()
}

/// On-disk shape of [`NoiseSettings`]; the octave tables are derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct NoiseParams {
    name: String,
    scale: f32,
    amplitude: f32,
    frequency: f32,
    wave_speed: f32,
    octaves: usize,
    persistence: f32,
    lacunarity: f32,
    wave_subspeed: f32,
    manual_seeds: bool,
    seed: [i32; 3],
}

impl Default for NoiseParams {
    fn default() -> Self {
        NoiseSettings::new("").into()
    }
}

impl From<NoiseParams> for NoiseSettings {
    fn from(params: NoiseParams) -> Self {
        let mut settings = NoiseSettings::new(params.name)
            .with_amplitude(params.amplitude)
            .with_frequency(params.frequency)
            .with_octaves(params.octaves)
            .with_persistence(params.persistence)
            .with_lacunarity(params.lacunarity)
            .with_wave(params.wave_speed, params.wave_subspeed)
            .with_scale(params.scale);
        settings.manual_seeds = params.manual_seeds;
        settings.seed = IVec3::from_array(params.seed);
        settings
    }
}

impl From<NoiseSettings> for NoiseParams {
    fn from(settings: NoiseSettings) -> Self {
        NoiseParams {
            name: settings.name,
            scale: settings.scale,
            amplitude: settings.amplitude,
            frequency: settings.frequency,
            wave_speed: settings.wave_speed,
            octaves: settings.octave_count,
            persistence: settings.persistence,
            lacunarity: settings.lacunarity,
            wave_subspeed: settings.wave_subspeed,
            manual_seeds: settings.manual_seeds,
            seed: settings.seed.to_array(),
        }
    }
}
