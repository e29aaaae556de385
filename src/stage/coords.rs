//! Coordinates for the infinite tiled world.
//!
//! World cells are integer `(x, y, z)` with `y` as elevation. Blocks are
//! addressed by `(bx, bz)`; both may be negative, so every conversion floors
//! toward negative infinity instead of truncating toward zero.

use serde::{Deserialize, Serialize};

/// Integer world position; `y` is elevation, `x`/`z` are horizontal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct WorldCell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl WorldCell {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Same column with a different elevation.
    pub fn with_y(self, y: i32) -> Self {
        Self { y, ..self }
    }

    /// Horizontal key, used wherever elevation is derived from terrain.
    pub fn column(&self) -> (i32, i32) {
        (self.x, self.z)
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
            ..self
        }
    }

    /// Horizontal Manhattan distance (elevation ignored).
    pub fn manhattan_xz(&self, other: &WorldCell) -> i64 {
        (self.x as i64 - other.x as i64).abs() + (self.z as i64 - other.z as i64).abs()
    }

    /// Horizontal Euclidean distance (elevation ignored).
    pub fn distance_xz(&self, other: &WorldCell) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dz = self.z as f64 - other.z as f64;
        (dx * dx + dz * dz).sqrt()
    }

    pub fn same_column(&self, other: &WorldCell) -> bool {
        self.x == other.x && self.z == other.z
    }
}

impl From<[i32; 3]> for WorldCell {
    fn from(v: [i32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<WorldCell> for [i32; 3] {
    fn from(c: WorldCell) -> Self {
        [c.x, c.y, c.z]
    }
}

impl std::fmt::Display for WorldCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Address of a square block. Ordered lexicographically `(x, z)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct BlockCoord {
    pub x: i32,
    pub z: i32,
}

impl BlockCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Block holding world column `(x, z)`.
    pub fn containing(x: i32, z: i32, block_size: i32) -> Self {
        Self {
            x: floor_div(x, block_size),
            z: floor_div(z, block_size),
        }
    }

    /// World column of this block's local `(0, 0)` cell.
    pub fn origin(&self, block_size: i32) -> (i32, i32) {
        (self.x * block_size, self.z * block_size)
    }

    /// Whether this block lies in the square window of half-extent
    /// `retention` around `focus` (Chebyshev distance).
    pub fn within(&self, focus: BlockCoord, retention: i32) -> bool {
        (self.x - focus.x).abs() <= retention && (self.z - focus.z).abs() <= retention
    }

    /// All blocks of the window of half-extent `radius` around `self`.
    pub fn window(&self, radius: i32) -> impl Iterator<Item = BlockCoord> {
        let center = *self;
        (-radius..=radius).flat_map(move |dz| {
            (-radius..=radius).map(move |dx| BlockCoord::new(center.x + dx, center.z + dz))
        })
    }
}

impl From<[i32; 2]> for BlockCoord {
    fn from(v: [i32; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<BlockCoord> for [i32; 2] {
    fn from(c: BlockCoord) -> Self {
        [c.x, c.z]
    }
}

impl std::fmt::Display for BlockCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// Division rounding toward negative infinity. `size` must be positive.
#[inline]
pub fn floor_div(value: i32, size: i32) -> i32 {
    debug_assert!(size > 0, "block size must be positive");
    value.div_euclid(size)
}

/// Remainder in `[0, size)` matching [`floor_div`]. `size` must be positive.
#[inline]
pub fn floor_mod(value: i32, size: i32) -> i32 {
    debug_assert!(size > 0, "block size must be positive");
    value.rem_euclid(size)
}

/// Split a world column into its block and the local offset inside it.
pub fn split_column(x: i32, z: i32, block_size: i32) -> (BlockCoord, i32, i32) {
    (
        BlockCoord::containing(x, z, block_size),
        floor_mod(x, block_size),
        floor_mod(z, block_size),
    )
}

/// Deterministic per-block seed mixed from the world seed (splitmix64 style).
pub fn block_seed(world_seed: u64, coord: BlockCoord) -> u64 {
    let mut hash = world_seed.wrapping_add(0x9e37_79b9_7f4a_7c15);

    hash = hash.wrapping_add(coord.x as i64 as u64);
    hash ^= hash >> 30;
    hash = hash.wrapping_mul(0xbf58476d1ce4e5b9);

    hash = hash.wrapping_add(coord.z as i64 as u64);
    hash ^= hash >> 27;
    hash = hash.wrapping_mul(0x94d049bb133111eb);

    hash ^= hash >> 31;
    hash
}
