use std::fmt;

use log::{debug, trace};
use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{MazeError, Position, map::Grid};

/// The cell carving starts from. Every other odd cell is reached from here.
pub const MAZE_ORIGIN: Position = Position::new(1, 1);

/// Steps between lattice cells during carving; the midpoint of each step is
/// the connector cell that gets opened along with the target.
const CARVE_STEPS: [(isize, isize); 4] = [(2, 0), (-2, 0), (0, 2), (0, -2)];

/// Represents the static type of a cell in the maze grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    #[default]
    Wall,
    Open,
}

impl CellType {
    fn symbol(self) -> char {
        match self {
            CellType::Wall => '#',
            CellType::Open => '.',
        }
    }
}

impl Grid<CellType> {
    /// Returns `true` if `position` is inside the grid and open.
    pub fn is_open(&self, position: Position) -> bool {
        matches!(self.get(position.x, position.y), Some(CellType::Open))
    }

    /// Iterates over the open 4-directional neighbours of `position`.
    pub fn open_neighbors(&self, position: Position) -> impl Iterator<Item = Position> + '_ {
        position
            .neighbors()
            .filter(move |neighbor| self.is_open(*neighbor))
    }

    /// Number of open cells in the grid.
    pub fn open_count(&self) -> usize {
        self.iter().filter(|cell| **cell == CellType::Open).count()
    }
}

/// Renders the grid one row per line, `#` for walls and `.` for open cells.
impl fmt::Display for Grid<CellType> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height() {
            if y > 0 {
                writeln!(f)?;
            }
            for x in 0..self.width() {
                write!(f, "{}", self[(x, y)].symbol())?;
            }
        }
        Ok(())
    }
}

/// Checks that both dimensions are odd and at least 3, and that the grid
/// they describe fits in memory.
pub fn validate_dimensions(width: usize, height: usize) -> Result<(), MazeError> {
    let valid = |d: usize| d >= 3 && d % 2 == 1;
    let addressable = width
        .checked_mul(height)
        .is_some_and(|cells| cells <= isize::MAX as usize);
    if valid(width) && valid(height) && addressable {
        Ok(())
    } else {
        Err(MazeError::InvalidDimensions { width, height })
    }
}

/// Carves a perfect maze into a `width` x `height` grid.
///
/// Randomized depth-first carving over the odd-coordinate cells, starting at
/// [`MAZE_ORIGIN`]. The stack is explicit so large grids do not recurse. On
/// return every odd interior cell is open, the outer ring is wall, and the
/// open cells form a tree.
///
/// The random source is borrowed for the duration of the call only; feeding a
/// seeded generator gives identical mazes.
pub fn generate<R>(width: usize, height: usize, rng: &mut R) -> Result<Grid<CellType>, MazeError>
where
    R: Rng + ?Sized,
{
    validate_dimensions(width, height)?;

    let mut grid: Grid<CellType> = Grid::new(width, height);
    let (max_x, max_y) = (width - 2, height - 2);
    let in_interior = |p: &Position| (1..=max_x).contains(&p.x) && (1..=max_y).contains(&p.y);

    grid[MAZE_ORIGIN] = CellType::Open;
    let mut stack = vec![MAZE_ORIGIN];
    let mut carved = 0usize;
    let mut backtracked = 0usize;

    while let Some(&current) = stack.last() {
        let candidates: Vec<Position> = CARVE_STEPS
            .iter()
            .filter_map(|&(dx, dy)| current.offset(dx, dy))
            .filter(|p| in_interior(p) && grid[*p] == CellType::Wall)
            .collect();

        match candidates.choose(rng) {
            Some(&next) => {
                let connector = Position::new((current.x + next.x) / 2, (current.y + next.y) / 2);
                grid[connector] = CellType::Open;
                grid[next] = CellType::Open;
                stack.push(next);
                carved += 1;
            }
            None => {
                stack.pop();
                backtracked += 1;
            }
        }
    }

    trace!("carved {carved} passages, backtracked {backtracked} times");
    debug!(
        "generated {width}x{height} maze with {} open cells",
        grid.open_count()
    );
    Ok(grid)
}

/// Parses a maze from its textual layout (the format produced by `Display`).
///
/// `#` is a wall and `.` is open; each non-blank line is one row. The parser
/// only checks shape, so hand-made layouts need not satisfy the invariants of
/// [`generate`].
pub fn parse_layout(layout: &str) -> Result<Grid<CellType>, MazeError> {
    let rows: Vec<(usize, &str)> = layout
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();

    let Some(&(_, first)) = rows.first() else {
        return Err(MazeError::Layout {
            line: 1,
            reason: "layout is empty".to_string(),
        });
    };
    let width = first.chars().count();
    let height = rows.len();

    let mut cells = Vec::with_capacity(width * height);
    for (line, row) in &rows {
        let count = row.chars().count();
        if count != width {
            return Err(MazeError::Layout {
                line: *line,
                reason: format!("expected {width} cells, found {count}"),
            });
        }
        for symbol in row.chars() {
            let cell = match symbol {
                '#' => CellType::Wall,
                '.' => CellType::Open,
                unknown => {
                    return Err(MazeError::Layout {
                        line: *line,
                        reason: format!("unknown cell symbol '{unknown}'"),
                    });
                }
            };
            cells.push(cell);
        }
    }

    Grid::from_cells(width, height, cells).ok_or_else(|| MazeError::Layout {
        line: 1,
        reason: format!("{width}x{height} layout does not fit in memory"),
    })
}
