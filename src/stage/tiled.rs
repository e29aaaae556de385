//! Lazily materialised, infinite tiled stage.
//!
//! Blocks are generated on first access and dropped again when the focus
//! moves away. Heights are never stored outside a live block: they are a pure
//! function of the height source, so only relic state needs to survive
//! eviction and saving.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use rayon::prelude::*;

use crate::config::VoyageConfig;
use crate::heightfield::{HeightGenerator, HeightSource};
use crate::relic::{BlockRelics, Relic, RelicFactory, RelicHandle, RelicSeeder};
use super::block::{Block, HeightMap};
use super::coords::{split_column, BlockCoord, WorldCell};

/// Counters for monitoring block churn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageStats {
    /// Blocks generated (including regenerations after eviction)
    pub generated: usize,
    /// Blocks dropped by garbage collection
    pub evicted: usize,
    /// Blocks that took their relics from the archive instead of seeding
    pub restored: usize,
}

impl StageStats {
    pub fn summary(&self) -> String {
        format!(
            "Generated: {} | Evicted: {} | Restored: {}",
            self.generated, self.evicted, self.restored
        )
    }
}

/// Owner of every block. Callers only ever borrow blocks from here.
pub struct TiledStage<S: HeightSource = HeightGenerator> {
    block_size: i32,
    source: S,
    seeder: Box<dyn RelicSeeder>,
    blocks: HashMap<BlockCoord, Block>,
    /// Relic state of blocks that are not materialised right now
    archive: HashMap<BlockCoord, Vec<Relic>>,
    stats: StageStats,
}

impl TiledStage<HeightGenerator> {
    /// Noise terrain and table-driven relics, as described by `config`.
    pub fn from_config(config: &VoyageConfig) -> Self {
        let generator = HeightGenerator::new(&config.stage);
        let seeder = RelicFactory::new(config.stage.seed as u64, &config.relic);
        Self::new(config.stage.block_size, generator, Box::new(seeder))
    }
}

impl<S: HeightSource> TiledStage<S> {
    pub fn new(block_size: i32, source: S, seeder: Box<dyn RelicSeeder>) -> Self {
        assert!(block_size > 0, "block size must be positive, got {}", block_size);
        Self {
            block_size,
            source,
            seeder,
            blocks: HashMap::new(),
            archive: HashMap::new(),
            stats: StageStats::default(),
        }
    }

    pub fn block_size(&self) -> i32 {
        self.block_size
    }

    pub fn stats(&self) -> &StageStats {
        &self.stats
    }

    pub fn has_block(&self, coord: BlockCoord) -> bool {
        self.blocks.contains_key(&coord)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Block at `coord`, generated on first access. Repeated calls return
    /// the same block until it is evicted.
    pub fn block(&mut self, coord: BlockCoord) -> &Block {
        self.block_mut(coord)
    }

    pub fn block_mut(&mut self, coord: BlockCoord) -> &mut Block {
        match self.blocks.entry(coord) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let archived = self.archive.remove(&coord);
                if archived.is_some() {
                    self.stats.restored += 1;
                }
                let block = generate_block(
                    &self.source,
                    self.seeder.as_ref(),
                    coord,
                    self.block_size as usize,
                    archived,
                );
                self.stats.generated += 1;
                tracing::debug!(block = %coord, relics = block.relics().len(), "stage.block_generated");
                entry.insert(block)
            }
        }
    }

    /// Terrain height of world column `(x, z)`.
    pub fn height_at(&mut self, x: i32, z: i32) -> i32 {
        let (coord, lx, lz) = split_column(x, z, self.block_size);
        self.block(coord).heights().get(lx, lz)
    }

    /// Drop every block outside the window of half-extent `retention` around
    /// `focus`. Their relics are parked in the archive. Returns how many
    /// blocks were dropped.
    ///
    /// Must not run while a route search holds the stage.
    pub fn garbage_collect(&mut self, focus: BlockCoord, retention: i32) -> usize {
        let doomed: Vec<BlockCoord> = self
            .blocks
            .keys()
            .filter(|coord| !coord.within(focus, retention))
            .copied()
            .collect();

        for coord in &doomed {
            if let Some(block) = self.blocks.remove(coord) {
                self.archive.insert(*coord, block.take_relics());
            }
        }

        if !doomed.is_empty() {
            self.stats.evicted += doomed.len();
            tracing::debug!(
                focus = %focus,
                retention,
                evicted = doomed.len(),
                live = self.blocks.len(),
                "stage.garbage_collected"
            );
        }
        doomed.len()
    }

    /// Generate every missing block in the window of half-extent `radius`
    /// around `focus`, in parallel. Returns how many were generated.
    pub fn prefetch(&mut self, focus: BlockCoord, radius: i32) -> usize {
        let missing: Vec<(BlockCoord, Option<Vec<Relic>>)> = focus
            .window(radius)
            .filter(|coord| !self.blocks.contains_key(coord))
            .map(|coord| (coord, self.archive.remove(&coord)))
            .collect();
        if missing.is_empty() {
            return 0;
        }

        let restored = missing.iter().filter(|(_, archived)| archived.is_some()).count();
        let source = &self.source;
        let seeder = self.seeder.as_ref();
        let size = self.block_size as usize;
        let generated: Vec<Block> = missing
            .into_par_iter()
            .map(|(coord, archived)| generate_block(source, seeder, coord, size, archived))
            .collect();

        let count = generated.len();
        for block in generated {
            self.blocks.insert(block.coord(), block);
        }
        self.stats.generated += count;
        self.stats.restored += restored;
        tracing::debug!(focus = %focus, radius, generated = count, "stage.prefetched");
        count
    }

    pub fn relic(&self, handle: RelicHandle) -> Option<&Relic> {
        self.blocks.get(&handle.block)?.relics().get(handle.index)
    }

    pub fn relic_mut(&mut self, handle: RelicHandle) -> Option<&mut Relic> {
        self.blocks.get_mut(&handle.block)?.relic_mut(handle.index)
    }

    /// Mark as found every relic within `radius` columns of `center` that
    /// sits at or above `sea_level`. Returns how many were newly found.
    pub fn sight_relics(&mut self, center: WorldCell, radius: i32, sea_level: f64) -> usize {
        let size = self.block_size;
        let lo = BlockCoord::containing(center.x - radius, center.z - radius, size);
        let hi = BlockCoord::containing(center.x + radius, center.z + radius, size);
        let radius_sq = (radius as i64) * (radius as i64);

        let mut newly_found = 0;
        for bz in lo.z..=hi.z {
            for bx in lo.x..=hi.x {
                let coord = BlockCoord::new(bx, bz);
                let (ox, oz) = coord.origin(size);
                for relic in self.block_mut(coord).relics_mut() {
                    if relic.found {
                        continue;
                    }
                    let dx = (ox + relic.position.x - center.x) as i64;
                    let dz = (oz + relic.position.z - center.z) as i64;
                    if dx * dx + dz * dz <= radius_sq && relic.position.y as f64 >= sea_level {
                        relic.found = true;
                        newly_found += 1;
                    }
                }
            }
        }
        newly_found
    }

    /// Relic state of every block ever generated, live or archived, sorted by
    /// block coordinate. Heights are not included.
    pub fn relic_records(&self) -> Vec<BlockRelics> {
        let mut records: Vec<BlockRelics> = self
            .blocks
            .values()
            .map(|block| BlockRelics {
                block: block.coord(),
                relics: block.relics().to_vec(),
            })
            .chain(self.archive.iter().map(|(coord, relics)| BlockRelics {
                block: *coord,
                relics: relics.clone(),
            }))
            .collect();
        records.sort_by_key(|r| r.block);
        records
    }

    /// Install saved relic state. Live blocks take theirs immediately; the
    /// rest wait in the archive until their block is generated again.
    pub fn restore_relics(&mut self, records: Vec<BlockRelics>) {
        self.archive.clear();
        let count = records.len();
        for record in records {
            match self.blocks.get_mut(&record.block) {
                Some(block) => block.replace_relics(record.relics),
                None => {
                    self.archive.insert(record.block, record.relics);
                }
            }
        }
        tracing::debug!(blocks = count, "stage.relics_restored");
    }
}

fn generate_block<S: HeightSource + ?Sized>(
    source: &S,
    seeder: &dyn RelicSeeder,
    coord: BlockCoord,
    size: usize,
    archived: Option<Vec<Relic>>,
) -> Block {
    let heights = HeightMap::generate(source, coord, size);
    let relics = match archived {
        Some(relics) => relics,
        None => seeder.seed(coord, &heights),
    };
    Block::new(coord, heights, relics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageParams;
    use crate::relic::NoRelics;

    struct OneRelicPerBlock;

    impl RelicSeeder for OneRelicPerBlock {
        fn seed(&self, _coord: BlockCoord, heights: &HeightMap) -> Vec<Relic> {
            vec![Relic::new(WorldCell::new(1, heights.get(1, 1), 1), "anchor", 5.0, 0.3)]
        }
    }

    fn noise_stage(block_size: i32) -> TiledStage {
        let params = StageParams {
            block_size,
            ..StageParams::default()
        };
        TiledStage::new(block_size, HeightGenerator::new(&params), Box::new(NoRelics))
    }

    #[test]
    fn test_height_matches_source_across_blocks() {
        let mut stage = noise_stage(16);
        let generator = HeightGenerator::new(&StageParams::default());
        for (x, z) in [(0, 0), (-1, -1), (15, 16), (-17, 33), (-64, -65)] {
            assert_eq!(stage.height_at(x, z), generator.height(x, z));
        }
    }

    #[test]
    fn test_block_generated_once() {
        let mut stage = noise_stage(16);
        let first = stage.block(BlockCoord::new(-1, 2)).heights().clone();
        let second = stage.block(BlockCoord::new(-1, 2)).heights().clone();
        assert_eq!(first, second);
        assert_eq!(stage.stats().generated, 1);
    }

    #[test]
    fn test_regenerated_block_is_identical() {
        let mut stage = noise_stage(16);
        let coord = BlockCoord::new(3, -4);
        let before = stage.block(coord).heights().clone();
        stage.garbage_collect(BlockCoord::new(100, 100), 0);
        assert!(!stage.has_block(coord));
        let after = stage.block(coord).heights().clone();
        assert_eq!(before, after);
    }

    #[test]
    fn test_garbage_collect_window() {
        let mut stage = noise_stage(8);
        let focus = BlockCoord::new(0, 0);
        let all: Vec<BlockCoord> = focus.window(3).collect();
        for coord in &all {
            stage.block(*coord);
        }
        let evicted = stage.garbage_collect(focus, 1);
        assert_eq!(evicted, 49 - 9);
        for coord in &all {
            assert_eq!(stage.has_block(*coord), coord.within(focus, 1), "block {}", coord);
        }
    }

    #[test]
    fn test_relics_survive_eviction() {
        let mut stage = TiledStage::new(8, |_x: i32, _z: i32| -2, Box::new(OneRelicPerBlock));
        let handle = RelicHandle {
            block: BlockCoord::new(5, 5),
            index: 0,
        };
        stage.block(handle.block);
        stage.relic_mut(handle).unwrap().advance_search(2.0);

        stage.garbage_collect(BlockCoord::new(0, 0), 1);
        assert!(!stage.has_block(handle.block));

        stage.block(handle.block);
        assert_eq!(stage.relic(handle).unwrap().searched_time, 2.0);
        assert_eq!(stage.stats().restored, 1);
    }

    #[test]
    fn test_prefetch_generates_window() {
        let mut stage = noise_stage(8);
        stage.block(BlockCoord::new(0, 0));
        let generated = stage.prefetch(BlockCoord::new(0, 0), 1);
        assert_eq!(generated, 8);
        assert_eq!(stage.block_count(), 9);
        assert_eq!(stage.prefetch(BlockCoord::new(0, 0), 1), 0);
    }

    #[test]
    fn test_prefetch_takes_relics_from_archive() {
        let mut stage = TiledStage::new(8, |_x: i32, _z: i32| -2, Box::new(OneRelicPerBlock));
        let handle = RelicHandle {
            block: BlockCoord::new(5, 5),
            index: 0,
        };
        stage.block(handle.block);
        stage.relic_mut(handle).unwrap().advance_search(2.0);
        stage.garbage_collect(BlockCoord::new(0, 0), 1);
        assert!(!stage.has_block(handle.block));

        assert_eq!(stage.prefetch(handle.block, 0), 1);
        assert_eq!(stage.relic(handle).unwrap().searched_time, 2.0);
        assert_eq!(stage.stats().restored, 1);
        assert_eq!(stage.stats().generated, 2);
    }

    #[test]
    fn test_restore_relics_onto_live_block() {
        let coord = BlockCoord::new(0, 0);
        let mut saved = TiledStage::new(8, |_x: i32, _z: i32| 0, Box::new(OneRelicPerBlock));
        saved.block(coord);
        saved
            .relic_mut(RelicHandle { block: coord, index: 0 })
            .unwrap()
            .advance_search(10.0);
        let records = saved.relic_records();

        let mut live = TiledStage::new(8, |_x: i32, _z: i32| 0, Box::new(OneRelicPerBlock));
        live.block(coord);
        assert!(!live.block(coord).relics()[0].searched);

        live.restore_relics(records.clone());
        assert!(live.block(coord).relics()[0].searched);
        assert_eq!(live.stats().generated, 1);
        assert_eq!(live.relic_records(), records);
    }

    #[test]
    fn test_relic_records_round_trip_lazily() {
        let mut stage = TiledStage::new(8, |_x: i32, _z: i32| 0, Box::new(OneRelicPerBlock));
        stage.block(BlockCoord::new(0, 0));
        stage.block(BlockCoord::new(-1, 0));
        stage
            .relic_mut(RelicHandle { block: BlockCoord::new(-1, 0), index: 0 })
            .unwrap()
            .advance_search(10.0);
        let records = stage.relic_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].block, BlockCoord::new(-1, 0));

        let mut fresh = TiledStage::new(8, |_x: i32, _z: i32| 0, Box::new(OneRelicPerBlock));
        fresh.restore_relics(records.clone());
        assert_eq!(fresh.block_count(), 0);
        assert_eq!(fresh.relic_records(), records);

        let searched = fresh.block(BlockCoord::new(-1, 0)).relics()[0].searched;
        assert!(searched);
    }

    #[test]
    fn test_sight_relics_above_water() {
        let mut stage = TiledStage::new(8, |_x: i32, _z: i32| 2, Box::new(OneRelicPerBlock));
        let center = WorldCell::new(1, 0, 1);
        assert_eq!(stage.sight_relics(center, 3, 5.0), 0);
        assert_eq!(stage.sight_relics(center, 3, 1.0), 1);
        assert_eq!(stage.sight_relics(center, 3, 1.0), 0);
    }
}
