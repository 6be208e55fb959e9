//! Ray-marched perception.
//!
//! Each agent casts a fan of rays across its field of view. A ray reports
//! the normalized distance to the first solid or water tile it meets plus a
//! per-tile-kind embedding; a ray that sees nothing reports distance 1 and
//! a zero embedding.

use crate::world::{GridWorld, Tile};
use mirage_core::checksum::fold;
use mirage_core::config::SimulationConfig;
use mirage_core::error::{ensure_non_negative, ensure_positive, MirageError, Result};
use mirage_core::rng::DeterministicRng;
use mirage_core::types::{round3, Vec2};
use std::collections::HashMap;

/// Deterministic pseudo-random vectors, one per tile kind.
///
/// A tile's vector depends only on `(seed, tile id)`, so lookups are
/// stable regardless of the order in which tiles are first seen.
#[derive(Debug, Clone)]
pub struct TileEmbeddings {
    seed: u64,
    dim: usize,
    cache: HashMap<Tile, Vec<f64>>,
}

impl TileEmbeddings {
    pub fn new(seed: u64, dim: usize) -> Self {
        Self {
            seed,
            dim,
            cache: HashMap::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embedding vector in `[-1, 1]^dim` for `tile`.
    pub fn embedding(&mut self, tile: Tile) -> &[f64] {
        let (seed, dim) = (self.seed, self.dim);
        self.cache
            .entry(tile)
            .or_insert_with(|| Self::derive(seed, dim, tile))
    }

    fn derive(seed: u64, dim: usize, tile: Tile) -> Vec<f64> {
        let mut rng = DeterministicRng::new(fold([seed, u64::from(tile.id())]));
        (0..dim).map(|_| rng.range_f64(-1.0, 1.0)).collect()
    }
}

/// Parameters of the ray fan.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionConfig {
    pub ray_count: usize,
    pub max_distance: f64,
    pub fov_radians: f64,
    pub step: f64,
}

impl VisionConfig {
    pub fn from_simulation(config: &SimulationConfig) -> Self {
        Self {
            ray_count: config.vision_ray_count as usize,
            max_distance: config.vision_range,
            fov_radians: config.vision_fov,
            step: config.vision_step,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ray_count == 0 {
            return Err(MirageError::invalid_config("vision_ray_count", "must be positive"));
        }
        ensure_positive("vision_range", self.max_distance)?;
        ensure_positive("vision_step", self.step)?;
        ensure_non_negative("vision_fov", self.fov_radians)?;
        Ok(())
    }

    /// Absolute angle of ray `index` for an agent facing `heading`.
    pub fn ray_angle(&self, heading: f64, index: usize) -> f64 {
        if self.ray_count == 1 {
            return heading;
        }
        let t = index as f64 / (self.ray_count - 1) as f64;
        heading - self.fov_radians / 2.0 + self.fov_radians * t
    }
}

/// What a single ray saw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Normalized distance in `[0, 1]`, rounded to three decimals.
    pub distance: f64,
    /// Tile that stopped the ray; `None` when nothing was in range.
    pub tile: Option<Tile>,
}

/// Raycaster producing one perception vector per agent-tick.
#[derive(Debug, Clone)]
pub struct VisionSensor {
    config: VisionConfig,
    embeddings: TileEmbeddings,
}

impl VisionSensor {
    pub fn new(config: VisionConfig, embeddings: TileEmbeddings) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, embeddings })
    }

    pub fn from_simulation(config: &SimulationConfig) -> Result<Self> {
        Self::new(
            VisionConfig::from_simulation(config),
            TileEmbeddings::new(config.embedding_seed, config.embedding_dim as usize),
        )
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    /// Width of the vector returned by [`sense`](Self::sense).
    pub fn output_len(&self) -> usize {
        self.config.ray_count * (1 + self.embeddings.dim())
    }

    /// March one ray from `origin` along `angle`.
    pub fn cast(&self, world: &GridWorld, origin: &Vec2, angle: f64) -> RayHit {
        let direction = Vec2::from_angle(angle);
        let max = self.config.max_distance;
        let mut distance = self.config.step;
        while distance <= max {
            let sample = origin.add(&direction.scale(distance));
            let (x, y) = sample.tile();
            let tile = world.tile_at(x, y).unwrap_or(Tile::Solid);
            if tile.is_blocking() {
                return RayHit {
                    distance: round3(distance / max),
                    tile: Some(tile),
                };
            }
            distance += self.config.step;
        }
        RayHit {
            distance: 1.0,
            tile: None,
        }
    }

    /// Perception vector: per ray `[distance, embedding...]`, rays in angular order.
    pub fn sense(&mut self, world: &GridWorld, origin: &Vec2, heading: f64) -> Vec<f64> {
        let dim = self.embeddings.dim();
        let mut out = Vec::with_capacity(self.output_len());
        for index in 0..self.config.ray_count {
            let angle = self.config.ray_angle(heading, index);
            let hit = self.cast(world, origin, angle);
            out.push(hit.distance);
            match hit.tile {
                Some(tile) => out.extend_from_slice(self.embeddings.embedding(tile)),
                None => out.extend(std::iter::repeat(0.0).take(dim)),
            }
        }
        out
    }
}
