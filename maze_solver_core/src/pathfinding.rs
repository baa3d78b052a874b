use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
};

use log::debug;

use crate::{
    MazeError, Path, Position,
    map::Grid,
    maze::CellType,
};

/// Frontier entry, tagged with the cost it was pushed with so stale entries
/// can be recognised on pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PrioritizedItem {
    estimated_total: usize,
    cost: usize,
    position: Position,
}

impl Ord for PrioritizedItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior; among equal estimates the
        // deeper entry wins, then the position decides.
        other
            .estimated_total
            .cmp(&self.estimated_total)
            .then_with(|| self.cost.cmp(&other.cost))
            .then_with(|| other.position.cmp(&self.position))
    }
}

impl PartialOrd for PrioritizedItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Admissible and consistent for unit-cost 4-directional movement.
pub fn heuristic(a: Position, b: Position) -> usize {
    a.manhattan_distance(&b)
}

fn check_endpoint(grid: &Grid<CellType>, position: Position) -> Result<(), MazeError> {
    let reason = match grid.get(position.x, position.y) {
        None => format!(
            "outside the {}x{} grid",
            grid.width(),
            grid.height()
        ),
        Some(CellType::Wall) => "cell is a wall".to_string(),
        Some(CellType::Open) => return Ok(()),
    };
    Err(MazeError::InvalidEndpoint { position, reason })
}

/// Finds a shortest path from `start` to `goal` with A*.
///
/// The returned path excludes `start` and ends with `goal`; it is empty when
/// the two coincide. `Ok(None)` means the goal is not reachable from the
/// start. Both endpoints must be open cells inside the grid, otherwise
/// [`MazeError::InvalidEndpoint`] is returned.
pub fn find_path(
    grid: &Grid<CellType>,
    start: Position,
    goal: Position,
) -> Result<Option<Path>, MazeError> {
    check_endpoint(grid, start)?;
    check_endpoint(grid, goal)?;

    let search = search(grid, start, goal);
    match &search.path {
        Some(path) => debug!(
            "path {start} -> {goal}: {} steps, {} cells expanded, {} stale entries skipped",
            path.len(),
            search.expanded,
            search.skipped
        ),
        None => debug!(
            "no path {start} -> {goal}, {} cells expanded",
            search.expanded
        ),
    }
    Ok(search.path)
}

/// Outcome of one A* run plus frontier bookkeeping.
#[derive(Debug)]
struct Search {
    path: Option<Path>,
    expanded: usize,
    skipped: usize,
}

fn search(grid: &Grid<CellType>, start: Position, goal: Position) -> Search {
    let mut frontier = BinaryHeap::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut cost_so_far: HashMap<Position, usize> = HashMap::new();

    frontier.push(PrioritizedItem {
        estimated_total: heuristic(start, goal),
        cost: 0,
        position: start,
    });
    cost_so_far.insert(start, 0);

    let mut expanded = 0usize;
    let mut skipped = 0usize;

    while let Some(PrioritizedItem {
        cost,
        position: current,
        ..
    }) = frontier.pop()
    {
        if current == goal {
            return Search {
                path: Some(reconstruct_path(&came_from, start, goal)),
                expanded,
                skipped,
            };
        }

        // A cheaper route to this cell was found after this entry was pushed.
        if cost_so_far.get(&current).is_some_and(|&best| cost > best) {
            skipped += 1;
            continue;
        }
        expanded += 1;

        let new_cost = cost + 1;
        for neighbor in grid.open_neighbors(current) {
            let improves = cost_so_far
                .get(&neighbor)
                .is_none_or(|&known| new_cost < known);
            if improves {
                cost_so_far.insert(neighbor, new_cost);
                came_from.insert(neighbor, current);
                frontier.push(PrioritizedItem {
                    estimated_total: new_cost + heuristic(neighbor, goal),
                    cost: new_cost,
                    position: neighbor,
                });
            }
        }
    }

    Search {
        path: None,
        expanded,
        skipped,
    }
}

/// Walks the predecessor map back from `goal`, then reverses.
fn reconstruct_path(
    came_from: &HashMap<Position, Position>,
    start: Position,
    goal: Position,
) -> Path {
    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        path.push(current);
        debug_assert!(
            came_from.contains_key(&current),
            "no predecessor recorded for {current}"
        );
        match came_from.get(&current) {
            Some(&previous) => current = previous,
            None => break,
        }
    }
    path.reverse();
    path
}
