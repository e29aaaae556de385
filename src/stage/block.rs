//! A single square block of the world.

use crate::grid::Grid;
use crate::heightfield::HeightSource;
use crate::relic::Relic;
use super::coords::BlockCoord;

/// Terrain heights of one block plus a one-cell ring borrowed from the
/// neighbouring blocks, so edge comparisons never need a second lookup.
///
/// Local coordinates run from `-1` to `size` inclusive on both axes.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightMap {
    size: usize,
    cells: Grid<i32>,
}

impl HeightMap {
    /// Sample `source` over the padded extent of block `coord`.
    pub fn generate<S: HeightSource + ?Sized>(source: &S, coord: BlockCoord, size: usize) -> Self {
        let (ox, oz) = coord.origin(size as i32);
        let padded = size + 2;
        let cells = Grid::from_fn(padded, padded, |px, pz| {
            source.height(ox + px as i32 - 1, oz + pz as i32 - 1)
        });
        Self { size, cells }
    }

    /// Interior edge length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Height at local `(x, z)`, padding included (`-1..=size`).
    pub fn get(&self, x: i32, z: i32) -> i32 {
        debug_assert!(
            x >= -1 && z >= -1 && x <= self.size as i32 && z <= self.size as i32,
            "local ({}, {}) outside padded block of size {}",
            x, z, self.size
        );
        *self.cells.get((x + 1) as usize, (z + 1) as usize)
    }

    /// Lowest and highest interior height.
    pub fn interior_range(&self) -> (i32, i32) {
        let mut lo = i32::MAX;
        let mut hi = i32::MIN;
        for z in 0..self.size as i32 {
            for x in 0..self.size as i32 {
                let h = self.get(x, z);
                lo = lo.min(h);
                hi = hi.max(h);
            }
        }
        (lo, hi)
    }
}

/// Axis-aligned bounds of a block's terrain in block-local space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub min: [i32; 3],
    pub max: [i32; 3],
}

impl Bounds {
    fn of(heights: &HeightMap) -> Self {
        let (lo, hi) = heights.interior_range();
        let size = heights.size() as i32;
        Self {
            min: [0, lo, 0],
            max: [size, hi, size],
        }
    }
}

/// A materialised block: immutable heights, derived bounds, mutable relics.
#[derive(Clone, Debug)]
pub struct Block {
    coord: BlockCoord,
    heights: HeightMap,
    bounds: Bounds,
    relics: Vec<Relic>,
}

impl Block {
    pub fn new(coord: BlockCoord, heights: HeightMap, relics: Vec<Relic>) -> Self {
        let bounds = Bounds::of(&heights);
        Self {
            coord,
            heights,
            bounds,
            relics,
        }
    }

    pub fn coord(&self) -> BlockCoord {
        self.coord
    }

    pub fn heights(&self) -> &HeightMap {
        &self.heights
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn relics(&self) -> &[Relic] {
        &self.relics
    }

    pub fn relics_mut(&mut self) -> &mut [Relic] {
        &mut self.relics
    }

    pub fn relic_mut(&mut self, index: usize) -> Option<&mut Relic> {
        self.relics.get_mut(index)
    }

    pub(crate) fn replace_relics(&mut self, relics: Vec<Relic>) {
        self.relics = relics;
    }

    pub(crate) fn take_relics(self) -> Vec<Relic> {
        self.relics
    }
}
