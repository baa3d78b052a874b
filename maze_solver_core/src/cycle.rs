use std::time::{Duration, Instant};

use log::info;
use rand::Rng;

use crate::{
    MazeError, Path, Position,
    map::Grid,
    maze::{self, CellType, MAZE_ORIGIN},
    pathfinding,
};

/// Settings for the generate/solve/reset loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleConfig {
    pub width: usize,
    pub height: usize,
    /// How long a solved maze stays up before a new one is carved.
    pub reset_delay: Duration,
}

impl Default for CycleConfig {
    fn default() -> Self {
        CycleConfig {
            width: 81,
            height: 61,
            reset_delay: Duration::from_secs(3),
        }
    }
}

impl CycleConfig {
    pub fn validate(&self) -> Result<(), MazeError> {
        maze::validate_dimensions(self.width, self.height)
    }

    /// Top-left interior cell.
    pub fn start(&self) -> Position {
        MAZE_ORIGIN
    }

    /// Bottom-right interior cell.
    pub fn goal(&self) -> Position {
        Position::new(self.width - 2, self.height - 2)
    }
}

/// Result of solving the current maze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Found(Path),
    NoPath,
}

impl SolveOutcome {
    /// Number of steps in the found path.
    pub fn path_len(&self) -> Option<usize> {
        match self {
            SolveOutcome::Found(path) => Some(path.len()),
            SolveOutcome::NoPath => None,
        }
    }

    pub fn path(&self) -> Option<&[Position]> {
        match self {
            SolveOutcome::Found(path) => Some(path.as_slice()),
            SolveOutcome::NoPath => None,
        }
    }
}

/// Drives repeated maze cycles: carve, wait for a solve trigger, show the
/// result for `reset_delay`, carve again.
///
/// Time is supplied by the caller so the loop can be stepped without a clock.
#[derive(Debug)]
pub struct MazeCycle<R> {
    config: CycleConfig,
    rng: R,
    grid: Grid<CellType>,
    outcome: Option<SolveOutcome>,
    solved_at: Option<Instant>,
    generation: u64,
}

impl<R: Rng> MazeCycle<R> {
    /// Validates the configuration and carves the first maze.
    pub fn new(config: CycleConfig, mut rng: R) -> Result<Self, MazeError> {
        config.validate()?;
        let grid = maze::generate(config.width, config.height, &mut rng)?;
        Ok(MazeCycle {
            config,
            rng,
            grid,
            outcome: None,
            solved_at: None,
            generation: 1,
        })
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid<CellType> {
        &self.grid
    }

    pub fn outcome(&self) -> Option<&SolveOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_solved(&self) -> bool {
        self.outcome.is_some()
    }

    /// Number of mazes carved so far, counting the current one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Solves the current maze from start to goal.
    ///
    /// A repeated trigger on an already-solved maze returns the recorded
    /// outcome without searching again or restarting the reset timer.
    pub fn solve(&mut self, now: Instant) -> Result<&SolveOutcome, MazeError> {
        let outcome = match self.outcome.take() {
            Some(outcome) => outcome,
            None => {
                let (start, goal) = (self.config.start(), self.config.goal());
                let outcome = match pathfinding::find_path(&self.grid, start, goal)? {
                    Some(path) => {
                        info!("maze {}: path length {}", self.generation, path.len());
                        SolveOutcome::Found(path)
                    }
                    None => {
                        info!("maze {}: no path found", self.generation);
                        SolveOutcome::NoPath
                    }
                };
                self.solved_at = Some(now);
                outcome
            }
        };
        Ok(self.outcome.insert(outcome))
    }

    /// Advances the loop. Once the reset delay has passed since the last
    /// solve, the path is discarded and a new maze carved; returns `true`
    /// when that happened.
    pub fn tick(&mut self, now: Instant) -> Result<bool, MazeError> {
        let due = self
            .solved_at
            .is_some_and(|at| now.saturating_duration_since(at) >= self.config.reset_delay);
        if due {
            self.regenerate()?;
        }
        Ok(due)
    }

    /// Discards the current maze and any solve result, and carves a new one.
    pub fn regenerate(&mut self) -> Result<(), MazeError> {
        self.grid = maze::generate(self.config.width, self.config.height, &mut self.rng)?;
        self.outcome = None;
        self.solved_at = None;
        self.generation += 1;
        Ok(())
    }
}
