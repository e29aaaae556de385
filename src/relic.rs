//! Relics buried in the archipelago.
//!
//! A relic is seeded once, when its block is first generated, and afterwards
//! only its search state changes. Relics are owned by their block; everything
//! else refers to them through a [`RelicHandle`].

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{RelicKind, RelicParams};
use crate::heightfield::HeightSource;
use crate::stage::block::HeightMap;
use crate::stage::coords::{block_seed, BlockCoord, WorldCell};
use crate::stage::tiled::TiledStage;

/// A collectible search target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relic {
    /// Block-local cell (`x`, `z` in `[0, block_size)`), `y` is the terrain height
    pub position: WorldCell,
    #[serde(rename = "type")]
    pub kind: String,
    /// Seen above the water line
    pub found: bool,
    /// Search finished
    pub searched: bool,
    /// Seconds of searching needed to finish
    pub search_required_time: f64,
    /// Seconds searched so far
    pub searched_time: f64,
    /// Rarity (1.0 is the rarest)
    pub rare: f32,
}

impl Relic {
    pub fn new(position: WorldCell, kind: impl Into<String>, search_required_time: f64, rare: f32) -> Self {
        Self {
            position,
            kind: kind.into(),
            found: false,
            searched: false,
            search_required_time,
            searched_time: 0.0,
            rare,
        }
    }

    /// Fraction of the search done, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.searched || self.search_required_time <= 0.0 {
            return 1.0;
        }
        (self.searched_time / self.search_required_time).clamp(0.0, 1.0)
    }

    /// Spend `dt` seconds searching. Returns `true` only on the call that
    /// completes the search.
    pub fn advance_search(&mut self, dt: f64) -> bool {
        if self.searched {
            return false;
        }
        self.searched_time += dt.max(0.0);
        if self.searched_time >= self.search_required_time {
            self.searched_time = self.search_required_time;
            self.searched = true;
            self.found = true;
            return true;
        }
        false
    }
}

/// Relics of one block, as persisted in a save record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockRelics {
    pub block: BlockCoord,
    pub relics: Vec<Relic>,
}

/// Address of a relic inside the tile store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RelicHandle {
    pub block: BlockCoord,
    pub index: usize,
}

/// Seeding pass run over a freshly generated block.
///
/// Implementations must be deterministic in `(coord, heights)` for blocks to
/// be reproducible, and are shared across threads during prefetch.
pub trait RelicSeeder: Send + Sync {
    fn seed(&self, coord: BlockCoord, heights: &HeightMap) -> Vec<Relic>;
}

/// Seeder that never places anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRelics;

impl RelicSeeder for NoRelics {
    fn seed(&self, _coord: BlockCoord, _heights: &HeightMap) -> Vec<Relic> {
        Vec::new()
    }
}

/// Table-driven seeder: each interior cell rolls against `probability`, then a
/// kind is drawn by weight among the kinds allowed at that cell's height.
#[derive(Clone, Debug)]
pub struct RelicFactory {
    world_seed: u64,
    probability: f64,
    kinds: Vec<RelicKind>,
}

impl RelicFactory {
    pub fn new(world_seed: u64, params: &RelicParams) -> Self {
        Self {
            world_seed,
            probability: params.probability,
            kinds: params.kinds.clone(),
        }
    }

    fn pick_kind(&self, height: i32, rng: &mut ChaCha8Rng) -> Option<&RelicKind> {
        let allowed = || self.kinds.iter().filter(move |k| k.allows_height(height) && k.weight > 0.0);
        let total_weight: f64 = allowed().map(|k| k.weight).sum();
        if total_weight <= 0.0 {
            return None;
        }
        let mut r = rng.gen_range(0.0..total_weight);

        let mut last = None;
        for kind in allowed() {
            if r < kind.weight {
                return Some(kind);
            }
            r -= kind.weight;
            last = Some(kind);
        }
        // Float rounding can leave a sliver past the final kind.
        last
    }
}

impl RelicSeeder for RelicFactory {
    fn seed(&self, coord: BlockCoord, heights: &HeightMap) -> Vec<Relic> {
        let mut rng = ChaCha8Rng::seed_from_u64(block_seed(self.world_seed, coord));
        let mut relics = Vec::new();
        if self.probability <= 0.0 || self.kinds.is_empty() {
            return relics;
        }

        let size = heights.size() as i32;
        for z in 0..size {
            for x in 0..size {
                // Always draw so one cell's outcome doesn't shift the others.
                let roll: f64 = rng.gen();
                if roll >= self.probability {
                    continue;
                }
                let height = heights.get(x, z);
                let Some(kind) = self.pick_kind(height, &mut rng) else {
                    continue;
                };
                let search_time = rng.gen_range(kind.search_time[0]..=kind.search_time[1]);
                let rare = rng.gen_range(kind.rare[0]..=kind.rare[1]);
                relics.push(Relic::new(WorldCell::new(x, height, z), kind.name.clone(), search_time, rare));
            }
        }
        relics
    }
}

/// Unsearched relic lying in column `cell` (elevation is ignored).
pub fn find_relic_at<S: HeightSource>(stage: &mut TiledStage<S>, cell: WorldCell) -> Option<RelicHandle> {
    let block_size = stage.block_size();
    let (block, lx, lz) = crate::stage::coords::split_column(cell.x, cell.z, block_size);
    stage
        .block(block)
        .relics()
        .iter()
        .position(|r| !r.searched && r.position.x == lx && r.position.z == lz)
        .map(|index| RelicHandle { block, index })
}

/// Unsearched relic under the ship or in one of the four adjacent columns,
/// checked in that order.
pub fn find_near_relic<S: HeightSource>(stage: &mut TiledStage<S>, ship: WorldCell) -> Option<RelicHandle> {
    const OFFSETS: [(i32, i32); 5] = [(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)];
    OFFSETS
        .iter()
        .find_map(|&(dx, dz)| find_relic_at(stage, ship.offset(dx, dz)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelicKind;

    fn kind(name: &str, weight: f64, height: [i32; 2]) -> RelicKind {
        RelicKind {
            name: name.to_string(),
            weight,
            height,
            search_time: [2.0, 4.0],
            rare: [0.1, 0.2],
        }
    }

    fn flat_heights(size: usize, h: i32) -> HeightMap {
        HeightMap::generate(&move |_x: i32, _z: i32| h, BlockCoord::new(0, 0), size)
    }

    #[test]
    fn test_advance_search_completes_once() {
        let mut relic = Relic::new(WorldCell::new(1, 0, 1), "amphora", 3.0, 0.5);
        assert!(!relic.advance_search(1.0));
        assert!((relic.progress() - 1.0 / 3.0).abs() < 1e-9);
        assert!(relic.advance_search(2.5));
        assert!(relic.searched && relic.found);
        assert_eq!(relic.searched_time, 3.0);
        assert!(!relic.advance_search(1.0));
    }

    #[test]
    fn test_factory_is_deterministic() {
        let params = RelicParams {
            probability: 0.05,
            kinds: vec![kind("amphora", 1.0, [-15, 15])],
        };
        let factory = RelicFactory::new(9, &params);
        let heights = flat_heights(16, -3);
        let a = factory.seed(BlockCoord::new(-2, 5), &heights);
        let b = factory.seed(BlockCoord::new(-2, 5), &heights);
        assert_eq!(a, b);
        assert!(!a.is_empty());
        for relic in &a {
            assert!(relic.position.x >= 0 && relic.position.x < 16);
            assert!(relic.position.z >= 0 && relic.position.z < 16);
            assert_eq!(relic.position.y, -3);
            assert!(relic.search_required_time >= 2.0 && relic.search_required_time <= 4.0);
        }
    }

    #[test]
    fn test_factory_respects_height_ranges() {
        let params = RelicParams {
            probability: 1.0,
            kinds: vec![kind("deep", 1.0, [-15, -5]), kind("high", 1.0, [5, 15])],
        };
        let factory = RelicFactory::new(1, &params);
        let relics = factory.seed(BlockCoord::new(0, 0), &flat_heights(4, 8));
        assert_eq!(relics.len(), 16);
        assert!(relics.iter().all(|r| r.kind == "high"));

        let none = factory.seed(BlockCoord::new(0, 0), &flat_heights(4, 0));
        assert!(none.is_empty());
    }

    #[test]
    fn test_relic_serializes_type_field() {
        let relic = Relic::new(WorldCell::new(1, 2, 3), "idol", 10.0, 0.75);
        let json = serde_json::to_value(&relic).unwrap();
        assert_eq!(json["type"], "idol");
        assert_eq!(json["position"], serde_json::json!([1, 2, 3]));
        let back: Relic = serde_json::from_value(json).unwrap();
        assert_eq!(back, relic);
    }
}
