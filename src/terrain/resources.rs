use bevy::{
    prelude::*,
    tasks::{ComputeTaskPool, TaskPool},
    utils::HashMap,
};
use itertools::{iproduct, Itertools};
use rand::{rngs::StdRng, RngCore, SeedableRng};

use super::{
    chunk::{Chunk, ChunkPool},
    fractal::{NoiseEvaluator, NoiseSource},
    helpers::geometry::{get_chunk_coord_transform, world_pos_to_chunk_coord},
    ChunkCoord, TerrainConfig, TerrainLayer,
};

/// Coordinates touched by one [`TerrainManager::update_chunks`] pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChunkUpdate {
    pub spawned: Vec<ChunkCoord>,
    pub evicted: Vec<ChunkCoord>,
}

impl ChunkUpdate {
    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty() && self.evicted.is_empty()
    }
}

/// Owns every active chunk and the pool they are recycled through.
#[derive(Resource)]
pub struct TerrainManager {
    chunk_size: u32,
    unit_size: f32,
    render_distance: u32,
    wind: Vec2,
    parallel_refresh: bool,
    world_seed: u64,
    layers: Vec<TerrainLayer>,
    evaluator: NoiseEvaluator,
    /// Active chunks keyed by [`ChunkCoord::pack`].
    chunks: HashMap<u64, Chunk>,
    pool: ChunkPool,
    /// Focus chunk and render distance of the last full pass.
    focus: Option<(ChunkCoord, u32)>,
}

impl TerrainManager {
    pub fn new(config: &TerrainConfig) -> Self {
        let world_seed = config.world_seed.unwrap_or_else(rand::random);
        let mut seeder = StdRng::seed_from_u64(world_seed);
        let evaluator = NoiseEvaluator::new(NoiseSource::new(config.noise, seeder.next_u32()));
        info!(
            "Terrain world seed: {}, noise: {:?}",
            world_seed,
            evaluator.source().kind()
        );

        let unit_size = if config.unit_size.is_finite() && config.unit_size > 0.0 {
            config.unit_size
        } else {
            warn!("Invalid unit size {}, using 1.0", config.unit_size);
            1.0
        };

        let seed_range = config.seed_range.max(0);
        let layers = config
            .layers
            .iter()
            .cloned()
            .map(|mut layer| {
                let mut rng = StdRng::seed_from_u64(seeder.next_u64());
                layer.noise.setup(seed_range, &mut rng);
                let wave_subspeed = layer.noise.wave_subspeed();
                if !(wave_subspeed.is_finite() && wave_subspeed > 0.0) {
                    warn!("Layer {}: invalid wave_subspeed {}, using 1.0", layer.name(), wave_subspeed);
                    layer.noise.set_wave_subspeed(1.0);
                }
                layer
            })
            .collect_vec();

        TerrainManager {
            chunk_size: config.chunk_size.max(1),
            unit_size,
            render_distance: config.render_distance,
            wind: config.wind_direction(),
            parallel_refresh: config.parallel_refresh,
            world_seed,
            layers,
            evaluator,
            chunks: HashMap::new(),
            pool: ChunkPool::default(),
            focus: None,
        }
    }

    /// Spawns every chunk within render distance of `focus` and evicts the
    /// ones that fell out of it. Does nothing while the focus stays in the
    /// same chunk and the render distance is unchanged.
    pub fn update_chunks(&mut self, focus: Vec3) -> ChunkUpdate {
        let center = self.find_chunk_coordinate(focus);
        if self.focus == Some((center, self.render_distance)) {
            return ChunkUpdate::default();
        }

        let _span = info_span!("update_chunks", x = center.x, z = center.y).entered();
        self.focus = Some((center, self.render_distance));

        let radius = self.render_distance as i32;
        let mut update = ChunkUpdate::default();

        for (dx, dz) in iproduct!(-radius..radius, -radius..radius) {
            let offset = IVec2::new(dx, dz);
            if offset.as_vec2().length() >= radius as f32 {
                continue;
            }

            let coord = ChunkCoord(center.0.saturating_add(offset));
            if self.chunks.contains_key(&coord.pack()) {
                continue;
            }

            let mut chunk = self.pool.take_or_create();
            chunk.init(coord, self.chunk_size, self.unit_size, &self.layers);
            debug!("Spawning chunk {:?} at {:?}", chunk.id(), coord);

            self.chunks.insert(coord.pack(), chunk);
            update.spawned.push(coord);
        }

        for chunk in self.chunks.values_mut() {
            let distance = chunk.coord().distance(&center);
            if distance >= radius as f32 {
                update.evicted.push(chunk.coord());
            } else {
                chunk.set_lod_distance((distance / 2.0).round() as u32);
            }
        }

        for coord in update.evicted.iter() {
            let Some(chunk) = self.chunks.remove(&coord.pack()) else {
                continue;
            };
            debug!("Evicting chunk {:?} at {:?}", chunk.id(), coord);
            self.pool.return_chunk(chunk);
        }

        return update;
    }

    /// Resamples the noise of every active chunk at `time` and updates the
    /// mesh heights and colors. Never runs alongside [`Self::update_chunks`].
    pub fn refresh(&mut self, time: f32) {
        let _span = info_span!("refresh_chunks", chunks = self.chunks.len()).entered();

        let evaluator = &self.evaluator;
        let layers = &self.layers;
        let wind = self.wind;

        if self.parallel_refresh && self.chunks.len() > 1 {
            ComputeTaskPool::get_or_init(TaskPool::default).scope(|scope| {
                for chunk in self.chunks.values_mut() {
                    scope.spawn(async move {
                        chunk.refresh(evaluator, layers, wind, time);
                    });
                }
            });
        } else {
            for chunk in self.chunks.values_mut() {
                chunk.refresh(evaluator, layers, wind, time);
            }
        }
    }

    pub fn find_chunk_coordinate(&self, world_pos: Vec3) -> ChunkCoord {
        world_pos_to_chunk_coord(&world_pos.xz(), self.chunk_size, self.unit_size)
    }

    /// World position of the center of the chunk at `coord`.
    pub fn chunk_world_position(&self, coord: &ChunkCoord) -> Vec3 {
        get_chunk_coord_transform(coord, self.chunk_size, self.unit_size, 0.0).translation
    }

    /// Height of `layer` at a world XZ position, `None` if no chunk covers it.
    pub fn height_at(&self, world_pos: Vec2, layer: usize) -> Option<f32> {
        let coord = world_pos_to_chunk_coord(&world_pos, self.chunk_size, self.unit_size);
        let chunk = self.chunks.get(&coord.pack())?;

        chunk.sample_local(layer, world_pos - chunk.world_origin())
    }

    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.name() == name)
    }

    pub fn set_render_distance(&mut self, render_distance: u32) {
        self.render_distance = render_distance;
    }

    pub fn render_distance(&self) -> u32 {
        self.render_distance
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    pub fn unit_size(&self) -> f32 {
        self.unit_size
    }

    pub fn world_seed(&self) -> u64 {
        self.world_seed
    }

    pub fn layers(&self) -> &[TerrainLayer] {
        &self.layers
    }

    pub fn get(&self, coord: &ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord.pack())
    }

    pub fn get_mut(&mut self, coord: &ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord.pack())
    }

    pub fn contains(&self, coord: &ChunkCoord) -> bool {
        self.chunks.contains_key(&coord.pack())
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.chunks.values_mut()
    }

    pub fn active_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn pool(&self) -> &ChunkPool {
        &self.pool
    }

    /// Drops pooled chunks beyond `len`.
    pub fn shrink_pool(&mut self, len: usize) {
        self.pool.shrink_to(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{ChunkState, MeshUpdate};

    #[cfg(feature = "bench")]
    use test::Bencher;

    fn config(render_distance: u32) -> TerrainConfig {
        TerrainConfig {
            render_distance,
            chunk_size: 16,
            unit_size: 1.0,
            world_seed: Some(7),
            ..default()
        }
    }

    fn circle(center: IVec2, radius: i32) -> Vec<ChunkCoord> {
        let mut coords = Vec::new();
        for x in -radius..=radius {
            for z in -radius..=radius {
                if ((x * x + z * z) as f32).sqrt() < radius as f32 {
                    coords.push(ChunkCoord(center + IVec2::new(x, z)));
                }
            }
        }
        coords
    }

    fn active_coords(manager: &TerrainManager) -> Vec<ChunkCoord> {
        manager.chunks().map(|chunk| chunk.coord()).sorted_by_key(|c| (c.x, c.y)).collect()
    }

    fn sorted(coords: Vec<ChunkCoord>) -> Vec<ChunkCoord> {
        coords.into_iter().sorted_by_key(|c| (c.x, c.y)).collect()
    }

    #[test]
    fn test_spawns_circle_around_origin() {
        let mut manager = TerrainManager::new(&config(2));

        let update = manager.update_chunks(Vec3::ZERO);

        assert_eq!(update.spawned.len(), 9);
        assert!(update.evicted.is_empty());
        assert_eq!(active_coords(&manager), sorted(circle(IVec2::ZERO, 2)));
        assert!(manager.contains(&ChunkCoord::new(1, 1)));
        assert!(!manager.contains(&ChunkCoord::new(2, 0)));
        assert!(manager.chunks().all(|chunk| chunk.state() == ChunkState::Active));
    }

    #[test]
    fn test_footprint_is_circular() {
        let mut manager = TerrainManager::new(&config(4));
        manager.update_chunks(Vec3::ZERO);

        assert_eq!(manager.active_count(), 45);
        assert!(manager.contains(&ChunkCoord::new(3, 2)));
        assert!(!manager.contains(&ChunkCoord::new(3, 3)));
        assert!(!manager.contains(&ChunkCoord::new(-3, -3)));
        assert_eq!(active_coords(&manager), sorted(circle(IVec2::ZERO, 4)));
    }

    #[test]
    fn test_same_chunk_is_a_no_op() {
        let mut manager = TerrainManager::new(&config(3));
        manager.update_chunks(Vec3::new(1.0, 0.0, 1.0));

        let update = manager.update_chunks(Vec3::new(7.9, 40.0, -7.9));

        assert!(update.is_empty());
    }

    #[test]
    fn test_render_distance_change_forces_pass() {
        let mut manager = TerrainManager::new(&config(2));
        manager.update_chunks(Vec3::ZERO);

        manager.set_render_distance(3);
        let update = manager.update_chunks(Vec3::ZERO);
        assert!(!update.spawned.is_empty());
        assert_eq!(active_coords(&manager), sorted(circle(IVec2::ZERO, 3)));

        manager.set_render_distance(1);
        let update = manager.update_chunks(Vec3::ZERO);
        assert!(update.spawned.is_empty());
        assert_eq!(manager.active_count(), 1);
    }

    #[test]
    fn test_moving_evicts_into_pool() {
        let mut manager = TerrainManager::new(&config(2));
        manager.update_chunks(Vec3::ZERO);
        let first_ids = manager.chunks().map(|chunk| chunk.id()).collect_vec();

        let update = manager.update_chunks(Vec3::new(16.0 * 10.0, 0.0, 0.0));

        assert_eq!(update.spawned.len(), 9);
        assert_eq!(sorted(update.evicted), sorted(circle(IVec2::ZERO, 2)));
        assert_eq!(manager.pool().len(), 9);
        assert_eq!(manager.pool().created(), 18);
        assert!(first_ids.iter().all(|id| manager.pool().contains(*id)));

        manager.update_chunks(Vec3::ZERO);
        assert_eq!(manager.pool().created(), 18);
        for chunk in manager.chunks() {
            assert!(!manager.pool().contains(chunk.id()));
        }
    }

    #[test]
    fn test_lod_distance_hint() {
        let mut manager = TerrainManager::new(&config(5));
        manager.update_chunks(Vec3::ZERO);

        assert_eq!(manager.get(&ChunkCoord::ORIGIN).map(Chunk::lod_distance), Some(0));
        assert_eq!(manager.get(&ChunkCoord::new(3, 0)).map(Chunk::lod_distance), Some(2));
        assert_eq!(manager.get(&ChunkCoord::new(4, 0)).map(Chunk::lod_distance), Some(2));
    }

    #[test]
    fn test_lookup_miss_is_none() {
        let mut manager = TerrainManager::new(&config(2));
        manager.update_chunks(Vec3::ZERO);
        manager.refresh(0.0);

        assert!(manager.get(&ChunkCoord::new(50, 50)).is_none());
        assert!(manager.height_at(Vec2::new(1000.0, 0.0), 0).is_none());
        assert!(manager.height_at(Vec2::ZERO, 5).is_none());
        assert!(manager.height_at(Vec2::ZERO, 0).is_some());
    }

    #[test]
    fn test_find_chunk_coordinate_roundtrip() {
        let manager = TerrainManager::new(&config(2));
        for x in -5..=5 {
            for z in -5..=5 {
                let coord = ChunkCoord::new(x, z);
                let world = manager.chunk_world_position(&coord);
                assert_eq!(manager.find_chunk_coordinate(world), coord);
            }
        }
    }

    #[test]
    fn test_same_seed_same_layers() {
        let a = TerrainManager::new(&config(1));
        let b = TerrainManager::new(&config(1));

        assert_eq!(a.world_seed(), 7);
        assert_eq!(a.layers(), b.layers());
        assert_eq!(a.layer_index("fluid"), Some(1));
        assert_eq!(a.layer_index("lava"), None);
    }

    #[test]
    fn test_parallel_refresh_matches_serial() {
        let mut parallel = TerrainManager::new(&TerrainConfig {
            parallel_refresh: true,
            ..config(3)
        });
        let mut serial = TerrainManager::new(&TerrainConfig {
            parallel_refresh: false,
            ..config(3)
        });

        parallel.update_chunks(Vec3::ZERO);
        serial.update_chunks(Vec3::ZERO);
        parallel.refresh(2.5);
        serial.refresh(2.5);

        for chunk in parallel.chunks() {
            let other = serial.get(&chunk.coord()).unwrap();
            assert_eq!(chunk.mesh().positions(), other.mesh().positions());
            assert_eq!(chunk.mesh().colors(), other.mesh().colors());
        }
    }

    #[test]
    fn test_neighbouring_chunks_share_edges() {
        let mut manager = TerrainManager::new(&TerrainConfig {
            chunk_size: 4,
            ..config(2)
        });
        manager.update_chunks(Vec3::ZERO);
        manager.refresh(1.0);

        let left = manager.get(&ChunkCoord::new(0, 0)).unwrap();
        let right = manager.get(&ChunkCoord::new(1, 0)).unwrap();
        for layer in 0..left.buffers().len() {
            let left = left.buffers()[layer].samples();
            let right = right.buffers()[layer].samples();
            for row in 0..5 {
                assert_eq!(left[row * 5 + 4], right[row * 5]);
            }
        }
    }

    #[test]
    fn test_refresh_marks_meshes() {
        let mut manager = TerrainManager::new(&config(2));
        manager.update_chunks(Vec3::ZERO);
        manager.refresh(0.0);

        for chunk in manager.chunks_mut() {
            assert_eq!(chunk.mesh_mut().take_pending_update(), Some(MeshUpdate::Topology));
        }

        manager.refresh(0.1);
        for chunk in manager.chunks_mut() {
            assert_eq!(chunk.mesh_mut().take_pending_update(), Some(MeshUpdate::Heights));
        }
    }

    #[test]
    fn test_shrink_pool() {
        let mut manager = TerrainManager::new(&config(2));
        manager.update_chunks(Vec3::ZERO);
        manager.update_chunks(Vec3::new(1000.0, 0.0, 0.0));

        manager.shrink_pool(3);

        assert_eq!(manager.pool().len(), 3);
    }

    #[test]
    fn test_invalid_unit_size_is_clamped() {
        for unit_size in [0.0, -2.0, f32::NAN] {
            let mut manager = TerrainManager::new(&TerrainConfig {
                unit_size,
                ..config(2)
            });

            let update = manager.update_chunks(Vec3::new(5.0, 0.0, 5.0));

            assert_eq!(manager.unit_size(), 1.0);
            assert_eq!(update.spawned.len(), 9);
            assert!(manager.contains(&ChunkCoord::ORIGIN));
        }
    }

    #[test]
    fn test_invalid_wave_subspeed_is_clamped() {
        let mut config = config(1);
        config.layers[1].noise.set_wave_subspeed(0.0);

        let manager = TerrainManager::new(&config);

        assert_eq!(manager.layers()[1].noise.wave_subspeed(), 1.0);
        assert!(manager.layers()[1]
            .noise
            .octaves()
            .wave_speeds
            .iter()
            .all(|speed| speed.is_finite()));
    }

    #[test]
    fn test_far_focus_saturates() {
        let mut manager = TerrainManager::new(&config(2));
        manager.update_chunks(Vec3::ZERO);

        let update = manager.update_chunks(Vec3::new(1e11, 0.0, -1e11));

        let corner = ChunkCoord::new(i32::MAX, i32::MIN);
        assert!(manager.contains(&corner));
        assert!(update.spawned.contains(&corner));
        assert_eq!(update.evicted.len(), 9);
        assert!(manager.chunks().all(|chunk| chunk.coord().distance(&corner) < 2.0));
    }

    #[test]
    fn test_chunks_are_keyed_by_packed_coord() {
        let mut manager = TerrainManager::new(&config(2));
        manager.update_chunks(Vec3::new(-16.0, 0.0, 32.0));

        for chunk in manager.chunks() {
            let key = chunk.coord().pack();
            assert_eq!(ChunkCoord::unpack(key), chunk.coord());
            assert_eq!(manager.chunks.get(&key).map(Chunk::id), Some(chunk.id()));
        }
    }

    #[cfg(feature = "bench")]
    #[bench]
    fn bench_refresh(b: &mut Bencher) {
        let mut manager = TerrainManager::new(&config(4));
        manager.update_chunks(Vec3::ZERO);

        let mut time = 0.0;
        b.iter(|| {
            time += 0.016;
            manager.refresh(time);
        });
    }
}
