//! Incremental Game of Life engine (B3/S23) on a torus.
//!
//! Each generation only visits the active region: the live cells plus their
//! eight neighbours. A dead cell with no live neighbour cannot be born, so
//! every cell outside that region keeps its state.

use serde::{Deserialize, Serialize};

use crate::signal::Signal;

use super::Grid;

/// Delta between two consecutive generations.
///
/// `survived` lists cells alive in both generations, so consumers can tell
/// unchanged-alive cells from newly born ones. Cells that stay dead are never
/// reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub born: Vec<usize>,
    pub died: Vec<usize>,
    pub survived: Vec<usize>,
}

impl ChangeSet {
    /// Change-set for a freshly loaded population.
    pub fn initial(live: Vec<usize>) -> Self {
        Self {
            born: live,
            died: Vec::new(),
            survived: Vec::new(),
        }
    }

    /// Change-set that kills every cell shown alive after `previous`.
    pub fn wipe(previous: &ChangeSet) -> Self {
        Self {
            born: Vec::new(),
            died: previous.alive().collect(),
            survived: Vec::new(),
        }
    }

    /// Cells alive once this change-set is applied.
    pub fn alive(&self) -> impl Iterator<Item = usize> + '_ {
        self.born.iter().chain(self.survived.iter()).copied()
    }

    /// Net change in population.
    pub fn population_delta(&self) -> i64 {
        self.born.len() as i64 - self.died.len() as i64
    }

    /// True if no cell changed state.
    pub fn is_still(&self) -> bool {
        self.born.is_empty() && self.died.is_empty()
    }
}

/// Engine errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Expected {expected} initial values ({cols}x{rows}), got {actual}")]
    ShapeMismatch {
        cols: usize,
        rows: usize,
        expected: usize,
        actual: usize,
    },
}

/// Game of Life engine that tracks its live cells across generations.
pub struct Model {
    grid: Grid,
    /// Live cells after the latest transition, in active-region order.
    live: Vec<usize>,
    /// Per-index visit stamp for active-region dedup.
    marks: Vec<u32>,
    stamp: u32,
    generation: u64,
    initialized: bool,
    changed: Signal<ChangeSet>,
}

impl Model {
    /// Create an engine for a `cols x rows` torus. Call [`Model::init`] before stepping.
    pub fn new(cols: usize, rows: usize) -> Self {
        let grid = Grid::new(cols, rows);
        let size = grid.size();
        Self {
            grid,
            live: Vec::new(),
            marks: vec![0; size],
            stamp: 0,
            generation: 0,
            initialized: false,
            changed: Signal::new(),
        }
    }

    /// Load a population, replacing the whole grid.
    ///
    /// Each value is narrowed to its low bit. The shape is checked before the
    /// grid is touched, so a mismatch leaves the engine unchanged.
    pub fn init(&mut self, values: &[i64]) -> Result<ChangeSet, ModelError> {
        let expected = self.grid.size();
        if values.len() != expected {
            return Err(ModelError::ShapeMismatch {
                cols: self.grid.cols(),
                rows: self.grid.rows(),
                expected,
                actual: values.len(),
            });
        }

        self.live = self.grid.load(values.iter().map(|&v| v & 1 == 1));
        self.generation = 0;
        self.initialized = true;

        let changes = ChangeSet::initial(self.live.clone());
        self.changed.raise(&changes);
        Ok(changes)
    }

    /// Advance one generation.
    ///
    /// # Panics
    /// Panics if called before [`Model::init`].
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> ChangeSet {
        assert!(self.initialized, "Model::next called before Model::init");

        let active = self.active_region();

        let mut alive = Vec::with_capacity(self.live.len());
        let mut changes = ChangeSet::default();

        for index in active {
            let was_alive = self.grid.get(index);
            let is_alive = match self.grid.neighbor_sum(index) {
                3 => true,
                2 => was_alive,
                _ => false,
            };

            match (was_alive, is_alive) {
                (false, true) => changes.born.push(index),
                (true, false) => changes.died.push(index),
                (true, true) => changes.survived.push(index),
                (false, false) => {}
            }
            if is_alive {
                alive.push(index);
            }
        }

        for &index in &changes.born {
            self.grid.set(index, true);
        }
        for &index in &changes.died {
            self.grid.set(index, false);
        }
        self.live = alive;
        self.generation += 1;

        self.changed.raise(&changes);
        changes
    }

    /// Live cells and their neighbours, deduplicated.
    ///
    /// Order: each live cell in stored order, immediately followed by its
    /// unseen neighbours clockwise from upper-left.
    fn active_region(&mut self) -> Vec<usize> {
        self.next_stamp();
        let stamp = self.stamp;

        let mut active = Vec::with_capacity(self.live.len() * 9);
        for &index in &self.live {
            if self.marks[index] != stamp {
                self.marks[index] = stamp;
                active.push(index);
            }
            for neighbor in self.grid.neighbors(index) {
                if self.marks[neighbor] != stamp {
                    self.marks[neighbor] = stamp;
                    active.push(neighbor);
                }
            }
        }
        active
    }

    fn next_stamp(&mut self) {
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.marks.fill(0);
            self.stamp = 1;
        }
    }

    /// Current state of the cell at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        self.grid.get(index)
    }

    /// Number of cells (`cols * rows`).
    #[inline]
    pub fn size(&self) -> usize {
        self.grid.size()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Live cells after the latest transition.
    pub fn live(&self) -> &[usize] {
        &self.live
    }

    pub fn population(&self) -> usize {
        self.live.len()
    }

    /// Generations stepped since the last `init`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Notifier raised with every change-set this engine produces.
    pub fn changed(&self) -> &Signal<ChangeSet> {
        &self.changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    fn values_with(cols: usize, rows: usize, cells: &[(i64, i64)]) -> Vec<i64> {
        let mut values = vec![0; cols * rows];
        for &(x, y) in cells {
            values[crate::compute::index_for(cols, rows, x, y)] = 1;
        }
        values
    }

    fn sorted(mut v: Vec<usize>) -> Vec<usize> {
        v.sort_unstable();
        v
    }

    fn snapshot(model: &Model) -> Vec<bool> {
        (0..model.size()).map(|i| model.get(i)).collect()
    }

    /// Full-grid reference step.
    fn step_naive(grid: &Grid) -> Vec<bool> {
        (0..grid.size())
            .map(|i| match grid.neighbor_sum(i) {
                3 => true,
                2 => grid.get(i),
                _ => false,
            })
            .collect()
    }

    #[test]
    fn test_init_reports_born() {
        let mut model = Model::new(4, 4);
        let changes = model.init(&values_with(4, 4, &[(1, 0), (2, 3)])).unwrap();
        assert_eq!(changes.born, vec![1, 14]);
        assert!(changes.died.is_empty());
        assert!(changes.survived.is_empty());
        assert_eq!(model.live(), &[1, 14]);
        assert!(model.get(1));
        assert!(!model.get(0));
    }

    #[test]
    fn test_init_narrows_to_low_bit() {
        let mut model = Model::new(3, 1);
        let changes = model.init(&[2, 3, -1]).unwrap();
        assert_eq!(changes.born, vec![1, 2]);
    }

    #[test]
    fn test_init_shape_mismatch_leaves_state() {
        let mut model = Model::new(3, 3);
        model.init(&values_with(3, 3, &[(1, 1)])).unwrap();

        let err = model.init(&[1, 1, 1]).unwrap_err();
        assert_eq!(
            err,
            ModelError::ShapeMismatch {
                cols: 3,
                rows: 3,
                expected: 9,
                actual: 3
            }
        );
        assert_eq!(model.live(), &[4]);
        assert!(model.get(4));
        assert!(!model.get(0));
    }

    #[test]
    #[should_panic(expected = "before Model::init")]
    fn test_next_before_init_panics() {
        let mut model = Model::new(3, 3);
        model.next();
    }

    #[test]
    fn test_block_is_still_life() {
        let mut model = Model::new(8, 8);
        model.init(&values_with(8, 8, &[(3, 3), (4, 3), (3, 4), (4, 4)])).unwrap();

        let changes = model.next();
        assert!(changes.is_still());
        assert_eq!(sorted(changes.survived), vec![27, 28, 35, 36]);
    }

    #[test]
    fn test_blinker_oscillates() {
        let mut model = Model::new(7, 7);
        model.init(&values_with(7, 7, &[(2, 3), (3, 3), (4, 3)])).unwrap();
        let gen0 = snapshot(&model);

        let first = model.next();
        assert_eq!(sorted(first.born), vec![17, 31]);
        assert_eq!(sorted(first.died), vec![23, 25]);
        assert_eq!(first.survived, vec![24]);
        assert_ne!(snapshot(&model), gen0);

        model.next();
        assert_eq!(snapshot(&model), gen0);

        for _ in 0..10 {
            model.next();
        }
        assert_eq!(snapshot(&model), gen0);
        assert_eq!(model.generation(), 12);
    }

    #[test]
    fn test_glider_wraps_around_torus() {
        let mut model = Model::new(8, 8);
        let glider = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)];
        model.init(&values_with(8, 8, &glider)).unwrap();
        let gen0 = snapshot(&model);

        // A glider moves one cell diagonally every 4 generations.
        for _ in 0..32 {
            model.next();
        }
        assert_eq!(model.population(), 5);
        assert_eq!(snapshot(&model), gen0);
    }

    #[test]
    fn test_active_region_order() {
        let mut model = Model::new(5, 5);
        model.init(&values_with(5, 5, &[(2, 2), (3, 2)])).unwrap();
        let region = model.active_region();
        assert_eq!(region, vec![12, 6, 7, 8, 13, 18, 17, 16, 11, 9, 14, 19]);
    }

    #[test]
    fn test_order_is_stable_across_engines() {
        let values = values_with(10, 10, &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]);
        let mut a = Model::new(10, 10);
        let mut b = Model::new(10, 10);
        a.init(&values).unwrap();
        b.init(&values).unwrap();
        for _ in 0..20 {
            assert_eq!(a.next(), b.next());
        }
    }

    #[test]
    fn test_changed_signal_sees_every_change_set() {
        let mut model = Model::new(7, 7);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        model.changed().tap(move |c: &ChangeSet| s.borrow_mut().push(c.clone()));

        let init = model.init(&values_with(7, 7, &[(2, 3), (3, 3), (4, 3)])).unwrap();
        let first = model.next();

        assert_eq!(*seen.borrow(), vec![init, first]);
    }

    #[test]
    fn test_init_hard_resets() {
        let mut model = Model::new(7, 7);
        model.init(&values_with(7, 7, &[(2, 3), (3, 3), (4, 3)])).unwrap();
        model.next();
        let changes = model.init(&values_with(7, 7, &[(0, 0)])).unwrap();
        assert_eq!(changes.born, vec![0]);
        assert_eq!(model.generation(), 0);
        assert_eq!(snapshot(&model).iter().filter(|&&c| c).count(), 1);
    }

    #[test]
    fn test_wipe_kills_alive() {
        let previous = ChangeSet {
            born: vec![3, 9],
            died: vec![4],
            survived: vec![1],
        };
        let wipe = ChangeSet::wipe(&previous);
        assert_eq!(wipe.died, vec![3, 9, 1]);
        assert!(wipe.born.is_empty());
        assert!(wipe.survived.is_empty());
        assert_eq!(wipe.population_delta(), -3);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_matches_full_scan(
            cols in 3usize..16,
            rows in 3usize..16,
            bits in proptest::collection::vec(0i64..4, 15 * 15),
            steps in 1usize..6,
        ) {
            let values: Vec<i64> = bits.iter().cycle().take(cols * rows).copied().collect();
            let mut model = Model::new(cols, rows);
            model.init(&values).unwrap();

            for _ in 0..steps {
                let expected = step_naive(model.grid());
                model.next();
                prop_assert_eq!(snapshot(&model), expected);
            }
        }

        #[test]
        fn prop_change_set_partition(
            cols in 3usize..16,
            rows in 3usize..16,
            bits in proptest::collection::vec(0i64..2, 15 * 15),
        ) {
            let values: Vec<i64> = bits.iter().cycle().take(cols * rows).copied().collect();
            let mut model = Model::new(cols, rows);
            model.init(&values).unwrap();

            let before = snapshot(&model);
            let mut region: HashSet<usize> = HashSet::new();
            for &i in model.live() {
                region.insert(i);
                region.extend(model.grid().neighbors(i));
            }

            let changes = model.next();
            let after = snapshot(&model);

            let born: HashSet<usize> = changes.born.iter().copied().collect();
            let died: HashSet<usize> = changes.died.iter().copied().collect();
            let survived: HashSet<usize> = changes.survived.iter().copied().collect();

            prop_assert!(born.is_disjoint(&died));
            prop_assert!(born.is_disjoint(&survived));
            prop_assert!(died.is_disjoint(&survived));
            prop_assert!(born.iter().chain(died.iter()).all(|i| region.contains(i)));

            for i in 0..model.size() {
                prop_assert_eq!(born.contains(&i), !before[i] && after[i]);
                prop_assert_eq!(died.contains(&i), before[i] && !after[i]);
                prop_assert_eq!(survived.contains(&i), before[i] && after[i]);
            }

            let mut live = model.live().to_vec();
            live.sort_unstable();
            let expected: Vec<usize> = (0..model.size()).filter(|&i| after[i]).collect();
            prop_assert_eq!(live, expected);
        }
    }
}
