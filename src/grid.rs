/// A dense 2D grid stored row-major (`z` rows of `x` columns).
///
/// Unlike a world map this grid has hard edges: indexing outside
/// `[0, width) x [0, depth)` is a programming error and panics.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    pub width: usize,
    pub depth: usize,
    data: Vec<T>,
}

impl<T> Grid<T> {
    /// Build a grid by evaluating `f(x, z)` for every cell.
    pub fn from_fn(width: usize, depth: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * depth);
        for z in 0..depth {
            for x in 0..width {
                data.push(f(x, z));
            }
        }
        Self { width, depth, data }
    }

    fn index(&self, x: usize, z: usize) -> usize {
        assert!(
            x < self.width && z < self.depth,
            "grid index ({}, {}) out of bounds {}x{}",
            x, z, self.width, self.depth
        );
        z * self.width + x
    }

    pub fn get(&self, x: usize, z: usize) -> &T {
        &self.data[self.index(x, z)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_row_major() {
        let grid = Grid::from_fn(3, 2, |x, z| (x + z * 10) as i32);
        assert_eq!(*grid.get(0, 0), 0);
        assert_eq!(*grid.get(2, 0), 2);
        assert_eq!(*grid.get(1, 1), 11);
        assert_eq!((grid.width, grid.depth), (3, 2));
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_panics() {
        let grid = Grid::from_fn(4, 4, |_x, _z| 0i32);
        let _ = grid.get(4, 0);
    }

    #[test]
    #[should_panic]
    fn test_index_does_not_wrap_rows() {
        // (3, 0) would alias (0, 1) in a flat buffer
        let grid = Grid::from_fn(3, 2, |x, z| (x + z * 10) as i32);
        let _ = grid.get(3, 0);
    }
}
