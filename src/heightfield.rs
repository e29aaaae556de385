//! Procedural height field.
//!
//! Every world column `(x, z)` gets an integer terrain height from seeded
//! multi-octave Perlin noise. The function is pure, so blocks can be thrown
//! away and rebuilt identically, and save files never carry height maps.

use noise::{NoiseFn, Perlin, Seedable};

use crate::config::StageParams;

/// Anything that can answer "how high is the ground at this column".
///
/// Implementations must be pure: the same `(x, z)` always yields the same
/// height. Blocks are generated from this on demand and possibly in parallel.
pub trait HeightSource: Send + Sync {
    fn height(&self, x: i32, z: i32) -> i32;
}

impl<F> HeightSource for F
where
    F: Fn(i32, i32) -> i32 + Send + Sync,
{
    fn height(&self, x: i32, z: i32) -> i32 {
        self(x, z)
    }
}

/// Amplitude decay per octave
const PERSISTENCE: f64 = 0.5;
/// Frequency multiplier per octave
const LACUNARITY: f64 = 2.0;

/// Seeded fBm terrain, scaled and clamped to `[min_height, max_height]`.
#[derive(Clone, Debug)]
pub struct HeightGenerator {
    noise: Perlin,
    octaves: u32,
    random_scale: f64,
    height_scale: f64,
    min_height: i32,
    max_height: i32,
}

impl HeightGenerator {
    pub fn new(params: &StageParams) -> Self {
        Self {
            noise: Perlin::new(1).set_seed(params.seed),
            octaves: params.octaves.max(1),
            random_scale: params.random_scale,
            height_scale: params.height_scale,
            min_height: params.min_height,
            max_height: params.max_height,
        }
    }

    pub fn height_range(&self) -> (i32, i32) {
        (self.min_height, self.max_height)
    }

    /// Raw normalised noise at a world column, roughly in `[-1, 1]`.
    pub fn sample(&self, x: i32, z: i32) -> f64 {
        fbm(
            &self.noise,
            x as f64 * self.random_scale,
            z as f64 * self.random_scale,
            self.octaves,
        )
    }
}

impl HeightSource for HeightGenerator {
    fn height(&self, x: i32, z: i32) -> i32 {
        let raw = self.sample(x, z) * self.height_scale;
        // Truncation toward zero after clamping keeps the result inside the range.
        raw.clamp(self.min_height as f64, self.max_height as f64) as i32
    }
}

/// Fractional Brownian Motion - multi-octave noise
fn fbm(noise: &Perlin, x: f64, z: f64, octaves: u32) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        total += amplitude * noise.get([x * frequency, z * frequency]);
        max_value += amplitude;
        amplitude *= PERSISTENCE;
        frequency *= LACUNARITY;
    }

    total / max_value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: u32) -> StageParams {
        StageParams {
            seed,
            ..StageParams::default()
        }
    }

    #[test]
    fn test_height_is_deterministic() {
        let a = HeightGenerator::new(&params(7));
        let b = HeightGenerator::new(&params(7));
        for (x, z) in [(0, 0), (-1, -1), (123, -456), (-9999, 31)] {
            assert_eq!(a.height(x, z), a.height(x, z));
            assert_eq!(a.height(x, z), b.height(x, z));
        }
    }

    #[test]
    fn test_height_stays_in_range() {
        let generator = HeightGenerator::new(&StageParams {
            height_scale: 500.0,
            ..params(3)
        });
        let (lo, hi) = generator.height_range();
        for z in -40..40 {
            for x in -40..40 {
                let h = generator.height(x * 7, z * 5);
                assert!(h >= lo && h <= hi, "height {} outside [{}, {}]", h, lo, hi);
            }
        }
    }

    #[test]
    fn test_seeds_differ() {
        let a = HeightGenerator::new(&params(1));
        let b = HeightGenerator::new(&params(2));
        let differs = (0..64).any(|i| a.sample(i * 3 + 1, i * 5 + 2) != b.sample(i * 3 + 1, i * 5 + 2));
        assert!(differs);
    }

    #[test]
    fn test_closure_source() {
        let flat = |_x: i32, _z: i32| -4;
        assert_eq!(flat.height(10, -10), -4);
    }
}
