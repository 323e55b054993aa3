use noise::{NoiseFn, OpenSimplex, Perlin, Simplex};
use serde::{Deserialize, Serialize};

pub use evaluator::NoiseEvaluator;
pub use settings::{NoiseSettings, OctaveTables, MIN_SCALE};

mod evaluator;
mod settings;

/// Base gradient noise primitive summed by the [`NoiseEvaluator`].
///
/// Implementations must be continuous, bounded to roughly `[-1, 1]` and
/// return the same value for the same input; all randomness belongs to the
/// seed chosen at construction time.
pub trait BaseNoise: Send + Sync {
    fn sample_2d(&self, x: f64, y: f64) -> f64;

    fn sample_3d(&self, x: f64, y: f64, z: f64) -> f64;
}

impl<T> BaseNoise for T
where
    T: NoiseFn<f64, 2> + NoiseFn<f64, 3> + Send + Sync,
{
    #[inline]
    fn sample_2d(&self, x: f64, y: f64) -> f64 {
        NoiseFn::<f64, 2>::get(self, [x, y])
    }

    #[inline]
    fn sample_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        NoiseFn::<f64, 3>::get(self, [x, y, z])
    }
}

#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    #[default]
    OpenSimplex,
    Simplex,
    Perlin,
}

/// The gradient noise primitives that can back a terrain.
#[derive(Clone)]
pub enum NoiseSource {
    OpenSimplex(OpenSimplex),
    Simplex(Simplex),
    Perlin(Perlin),
}

impl NoiseSource {
    pub fn new(kind: NoiseKind, seed: u32) -> Self {
        match kind {
            NoiseKind::OpenSimplex => NoiseSource::OpenSimplex(OpenSimplex::new(seed)),
            NoiseKind::Simplex => NoiseSource::Simplex(Simplex::new(seed)),
            NoiseKind::Perlin => NoiseSource::Perlin(Perlin::new(seed)),
        }
    }

    pub fn kind(&self) -> NoiseKind {
        match self {
            NoiseSource::OpenSimplex(_) => NoiseKind::OpenSimplex,
            NoiseSource::Simplex(_) => NoiseKind::Simplex,
            NoiseSource::Perlin(_) => NoiseKind::Perlin,
        }
    }
}

impl NoiseFn<f64, 2> for NoiseSource {
    fn get(&self, point: [f64; 2]) -> f64 {
        match self {
            NoiseSource::OpenSimplex(source) => source.get(point),
            NoiseSource::Simplex(source) => source.get(point),
            NoiseSource::Perlin(source) => source.get(point),
        }
    }
}

impl NoiseFn<f64, 3> for NoiseSource {
    fn get(&self, point: [f64; 3]) -> f64 {
        match self {
            NoiseSource::OpenSimplex(source) => source.get(point),
            NoiseSource::Simplex(source) => source.get(point),
            NoiseSource::Perlin(source) => source.get(point),
        }
    }
}
