use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::Position;

/// Row-major 2D storage addressed by `(x, y)` or [`Position`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a `width` x `height` grid filled with `T::default()`.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`. Maze dimensions are
    /// checked by [`crate::maze::validate_dimensions`] before they get here.
    pub fn new(width: usize, height: usize) -> Self
    where
        T: Default + Clone,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        Grid {
            width,
            height,
            cells: vec![T::default(); size],
        }
    }

    /// Wraps cells already laid out row by row.
    ///
    /// Returns `None` unless `cells` holds exactly `width * height` entries.
    pub fn from_cells(width: usize, height: usize, cells: Vec<T>) -> Option<Self> {
        if width.checked_mul(height) == Some(cells.len()) {
            Some(Grid {
                width,
                height,
                cells,
            })
        } else {
            None
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index_of(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// The cell at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        self.cells.get(self.index_of(x, y)?)
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    /// Cells in row-major order, paired with their position.
    pub fn enumerate(&self) -> impl Iterator<Item = (Position, &T)> {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (Position::new(index % width, index / width), cell))
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &T {
        match self.index_of(x, y) {
            Some(index) => &self.cells[index],
            None => panic!(
                "({x}, {y}) is outside the {}x{} grid",
                self.width, self.height
            ),
        }
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        match self.index_of(x, y) {
            Some(index) => &mut self.cells[index],
            None => panic!(
                "({x}, {y}) is outside the {}x{} grid",
                self.width, self.height
            ),
        }
    }
}

impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, position: Position) -> &T {
        &self[(position.x, position.y)]
    }
}

impl<T> IndexMut<Position> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, position: Position) -> &mut T {
        &mut self[(position.x, position.y)]
    }
}
