use std::fmt;

use serde::{Deserialize, Serialize};

pub mod cycle;
pub mod map;
pub mod maze;
pub mod pathfinding;

/// The four axis-aligned unit steps, in the order neighbours are visited.
pub const DIRECTIONS: [(isize, isize); 4] = [
    (1, 0),  // Right
    (-1, 0), // Left
    (0, 1),  // Down
    (0, -1), // Up
];

/// Represents a 2D coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// Returns the position shifted by `(dx, dy)`, or `None` if either
    /// coordinate would drop below zero.
    pub fn offset(&self, dx: isize, dy: isize) -> Option<Position> {
        Some(Position {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }

    /// Returns manhattan distance between two positions
    pub fn manhattan_distance(&self, other: &Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Returns `true` if the two positions differ by exactly one step along one axis.
    pub fn is_adjacent(&self, other: &Position) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Iterates over the 4-directional neighbours that have non-negative coordinates.
    ///
    /// No upper bound is applied; callers check against their grid.
    pub fn neighbors(self) -> impl Iterator<Item = Position> {
        DIRECTIONS
            .into_iter()
            .filter_map(move |(dx, dy)| self.offset(dx, dy))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(usize, usize)> for Position {
    fn from((x, y): (usize, usize)) -> Self {
        Position { x, y }
    }
}

/// An ordered walk of adjacent cells. Returned paths exclude the start cell
/// and end on the goal.
pub type Path = Vec<Position>;

/// Errors raised when a caller breaks the contract of the maze operations.
///
/// An unreachable goal is not one of these; it is reported as `Ok(None)`
/// by [`pathfinding::find_path`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MazeError {
    #[error("Maze dimensions {width}x{height} are invalid: both must be odd and at least 3")]
    InvalidDimensions { width: usize, height: usize },
    #[error("Endpoint {position} is invalid: {reason}")]
    InvalidEndpoint { position: Position, reason: String },
    #[error("Invalid maze layout at line {line}: {reason}")]
    Layout { line: usize, reason: String },
}
