//! Toroidal cell grid.
//!
//! Cells are stored as a flat row-major array: `index = row * cols + col`.
//! Coordinates wrap on both axes, so neighbour lookups at a border cell reach
//! across to the opposite edge.

/// Neighbour offsets, clockwise from the upper-left cell.
pub const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

/// Normalize any `(x, y)` pair to a flat index on a `cols x rows` torus.
///
/// Negative and out-of-range coordinates wrap, so
/// `index_for(x, y) == index_for(x + cols, y) == index_for(x, y + rows)`.
#[inline]
pub fn index_for(cols: usize, rows: usize, x: i64, y: i64) -> usize {
    let col = x.rem_euclid(cols as i64) as usize;
    let row = y.rem_euclid(rows as i64) as usize;
    row * cols + col
}

/// Fixed-size binary grid on a torus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cols: usize,
    rows: usize,
    cells: Vec<bool>,
}

impl Grid {
    /// Create an all-dead grid.
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![false; cols * rows],
        }
    }

    /// Grid width in cells.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Grid height in cells.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Total number of cells (`cols * rows`).
    #[inline]
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Flat index for wrapped coordinates.
    #[inline]
    pub fn index_for(&self, x: i64, y: i64) -> usize {
        index_for(self.cols, self.rows, x, y)
    }

    /// Split a flat index back into `(col, row)`.
    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.cols, index / self.cols)
    }

    #[inline]
    pub fn get(&self, index: usize) -> bool {
        self.cells[index]
    }

    #[inline]
    pub fn set(&mut self, index: usize, alive: bool) {
        self.cells[index] = alive;
    }

    /// The 8 toroidal neighbours of `index`, in `NEIGHBOR_OFFSETS` order.
    pub fn neighbors(&self, index: usize) -> [usize; 8] {
        let (col, row) = self.coords(index);
        let (x, y) = (col as i64, row as i64);
        NEIGHBOR_OFFSETS.map(|(dx, dy)| self.index_for(x + dx, y + dy))
    }

    /// Number of live cells among the 8 neighbours of `index`.
    pub fn neighbor_sum(&self, index: usize) -> u8 {
        self.neighbors(index)
            .iter()
            .map(|&n| self.cells[n] as u8)
            .sum()
    }

    /// Overwrite every cell, returning the indices that are now alive.
    ///
    /// The caller guarantees `values.len() == self.size()`.
    pub(crate) fn load(&mut self, values: impl Iterator<Item = bool>) -> Vec<usize> {
        let mut live = Vec::new();
        for (i, (cell, alive)) in self.cells.iter_mut().zip(values).enumerate() {
            *cell = alive;
            if alive {
                live.push(i);
            }
        }
        live
    }
}
