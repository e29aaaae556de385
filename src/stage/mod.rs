//! Tiled stage: the infinite archipelago split into square blocks.
//!
//! | Piece    | Purpose                                                    |
//! |----------|------------------------------------------------------------|
//! | `coords` | World cells, block coordinates, floor division helpers     |
//! | `block`  | Padded height map, bounds and relics of one block          |
//! | `tiled`  | Block store with lazy generation, eviction and relic state |

pub mod block;
pub mod coords;
pub mod tiled;

pub use block::{Block, Bounds, HeightMap};
pub use coords::{block_seed, floor_div, floor_mod, split_column, BlockCoord, WorldCell};
pub use tiled::{StageStats, TiledStage};

/// Default edge length of a block, in cells
pub const DEFAULT_BLOCK_SIZE: i32 = 64;
