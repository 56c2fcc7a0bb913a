//! Synthetic terrain data source.
//!
//! Heights come from fractal value noise seeded by a single integer, so the
//! same seed always produces the same world.

use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;
use worldpreview::geometry::TileVolume;
use worldpreview::source::{DataSource, SourceError};

const LATTICE_SIZE: usize = 256;

/// Surface heights for one tile, row-major, normalized to `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightSample {
    pub width: u32,
    pub depth: u32,
    pub heights: Vec<f32>,
    pub sea_level: f32,
}

impl HeightSample {
    /// Height at local column `x`, row `z`.
    pub fn height(&self, x: u32, z: u32) -> Option<f32> {
        if x >= self.width || z >= self.depth {
            return None;
        }
        self.heights.get((z * self.width + x) as usize).copied()
    }
}

/// Value-noise terrain generator.
#[derive(Debug)]
pub struct TerrainSource {
    seed: u64,
    feature_size: f32,
    octaves: u32,
    sea_level: f32,
    lattice: OnceLock<Vec<f32>>,
}

impl TerrainSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            feature_size: 256.0,
            octaves: 5,
            sea_level: 0.4,
            lattice: OnceLock::new(),
        }
    }

    /// Size in world pixels of the largest terrain features.
    pub fn with_feature_size(mut self, feature_size: f32) -> Self {
        self.feature_size = feature_size.max(1.0);
        self
    }

    pub fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves.clamp(1, 12);
        self
    }

    pub fn with_sea_level(mut self, sea_level: f32) -> Self {
        self.sea_level = sea_level.clamp(0.0, 1.0);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Normalized surface height at a world position.
    pub fn height_at(&self, x: i64, z: i64) -> f32 {
        let lattice = self.lattice();
        let mut frequency = 1.0 / self.feature_size;
        let mut amplitude = 1.0;
        let mut total = 0.0;
        let mut norm = 0.0;

        for octave in 0..self.octaves {
            // Offset octaves so their lattices don't line up at the origin.
            let shift = octave as f32 * 17.31;
            total += amplitude
                * value_noise(lattice, x as f32 * frequency + shift, z as f32 * frequency - shift);
            norm += amplitude;
            frequency *= 2.0;
            amplitude *= 0.5;
        }

        (total / norm).clamp(0.0, 1.0)
    }

    fn lattice(&self) -> &[f32] {
        self.lattice.get_or_init(|| build_lattice(self.seed))
    }
}

impl DataSource for TerrainSource {
    type Sample = HeightSample;

    fn name(&self) -> &str {
        "terrain"
    }

    fn prepare(&self) -> Result<(), SourceError> {
        let lattice = self.lattice();
        debug!(seed = self.seed, lattice = lattice.len(), "Terrain ready");
        Ok(())
    }

    fn query(&self, volume: &TileVolume) -> Result<HeightSample, SourceError> {
        let (width, depth) = volume.footprint();
        let [min_x, _, min_z] = volume.min;

        let mut heights = Vec::with_capacity(width as usize * depth as usize);
        for z in 0..depth as i64 {
            for x in 0..width as i64 {
                heights.push(self.height_at(min_x + x, min_z + z));
            }
        }

        Ok(HeightSample {
            width,
            depth,
            heights,
            sea_level: self.sea_level,
        })
    }
}

/// Pseudo-random values on a wrapping 256×256 lattice.
fn build_lattice(seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..LATTICE_SIZE * LATTICE_SIZE)
        .map(|_| rng.random::<f32>())
        .collect()
}

fn value_noise(lattice: &[f32], x: f32, z: f32) -> f32 {
    let x0 = x.floor();
    let z0 = z.floor();
    let tx = smoothstep(x - x0);
    let tz = smoothstep(z - z0);

    let at = |ix: f32, iz: f32| {
        let col = (ix as i64).rem_euclid(LATTICE_SIZE as i64) as usize;
        let row = (iz as i64).rem_euclid(LATTICE_SIZE as i64) as usize;
        lattice[row * LATTICE_SIZE + col]
    };

    let top = lerp(at(x0, z0), at(x0 + 1.0, z0), tx);
    let bottom = lerp(at(x0, z0 + 1.0), at(x0 + 1.0, z0 + 1.0), tx);
    lerp(top, bottom, tz)
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
