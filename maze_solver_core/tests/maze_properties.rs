use std::collections::{HashMap, VecDeque};

use maze_solver_core::{
    MazeError, Position,
    map::Grid,
    maze::{self, CellType},
    pathfinding::find_path,
};
use quickcheck::{TestResult, quickcheck};
use rand::{SeedableRng, rngs::StdRng};

fn pos(x: usize, y: usize) -> Position {
    Position::new(x, y)
}

/// Breadth-first distances from `from` to every reachable open cell.
fn bfs_distances(grid: &Grid<CellType>, from: Position) -> HashMap<Position, usize> {
    let mut distances = HashMap::from([(from, 0)]);
    let mut queue = VecDeque::from([from]);
    while let Some(current) = queue.pop_front() {
        let next = distances[&current] + 1;
        for neighbor in grid.open_neighbors(current) {
            if !distances.contains_key(&neighbor) {
                distances.insert(neighbor, next);
                queue.push_back(neighbor);
            }
        }
    }
    distances
}

/// Number of pairs of 4-adjacent open cells.
fn open_edges(grid: &Grid<CellType>) -> usize {
    grid.enumerate()
        .filter(|(_, cell)| **cell == CellType::Open)
        .map(|(p, _)| {
            [pos(p.x + 1, p.y), pos(p.x, p.y + 1)]
                .into_iter()
                .filter(|n| grid.is_open(*n))
                .count()
        })
        .sum()
}

fn odd_cells(grid: &Grid<CellType>) -> impl Iterator<Item = Position> + '_ {
    (1..grid.height() - 1)
        .step_by(2)
        .flat_map(move |y| (1..grid.width() - 1).step_by(2).map(move |x| pos(x, y)))
}

fn assert_valid_path(grid: &Grid<CellType>, start: Position, goal: Position, path: &[Position]) {
    let mut previous = start;
    for step in path {
        assert!(grid.is_open(*step), "path crosses wall at {step}");
        assert!(previous.is_adjacent(step), "{previous} -> {step} is not a unit step");
        previous = *step;
    }
    assert_eq!(previous, goal);
}

#[test]
fn every_odd_cell_is_reachable_from_origin() {
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let grid = maze::generate(25, 17, &mut rng).unwrap();
        let reachable = bfs_distances(&grid, maze::MAZE_ORIGIN);
        for cell in odd_cells(&grid) {
            assert!(reachable.contains_key(&cell), "seed {seed}: {cell} unreachable");
        }
        assert_eq!(reachable.len(), grid.open_count());
    }
}

#[test]
fn open_cells_form_a_spanning_tree() {
    let mut rng = StdRng::seed_from_u64(2024);
    let grid = maze::generate(41, 31, &mut rng).unwrap();
    let lattice_cells = odd_cells(&grid).count();
    assert_eq!(lattice_cells, 20 * 15);
    // One connector per carve step, and one carve step per cell except the origin.
    assert_eq!(grid.open_count(), 2 * lattice_cells - 1);
    assert_eq!(open_edges(&grid), grid.open_count() - 1);
}

#[test]
fn same_seed_gives_identical_maze() {
    let a = maze::generate(51, 37, &mut StdRng::seed_from_u64(99)).unwrap();
    let b = maze::generate(51, 37, &mut StdRng::seed_from_u64(99)).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_string(), b.to_string());

    let c = maze::generate(51, 37, &mut StdRng::seed_from_u64(100)).unwrap();
    assert_ne!(a, c);
}

#[test]
fn generation_shares_no_state_between_calls() {
    let mut rng = StdRng::seed_from_u64(8);
    let first = maze::generate(15, 15, &mut rng).unwrap();
    let second = maze::generate(15, 15, &mut rng).unwrap();

    let mut replay = StdRng::seed_from_u64(8);
    assert_eq!(maze::generate(15, 15, &mut replay).unwrap(), first);
    assert_eq!(maze::generate(15, 15, &mut replay).unwrap(), second);
}

#[test]
fn path_lengths_match_breadth_first_search() {
    let mut rng = StdRng::seed_from_u64(31337);
    let grid = maze::generate(31, 21, &mut rng).unwrap();
    let start = maze::MAZE_ORIGIN;
    let distances = bfs_distances(&grid, start);

    for goal in [pos(29, 19), pos(15, 9), pos(1, 19), pos(29, 1), pos(2, 1), pos(1, 2)] {
        if !grid.is_open(goal) {
            continue;
        }
        let path = find_path(&grid, start, goal).unwrap().unwrap();
        assert_eq!(path.len(), distances[&goal], "goal {goal}");
        assert_valid_path(&grid, start, goal, &path);
    }
}

#[test]
fn five_by_five_corner_to_center() {
    let grid = maze::generate(5, 5, &mut StdRng::seed_from_u64(4)).unwrap();
    assert!(grid.is_open(pos(1, 1)));
    assert!(grid.is_open(pos(3, 3)));

    let path = find_path(&grid, pos(1, 1), pos(3, 3)).unwrap().unwrap();
    assert!(path.len() >= pos(1, 1).manhattan_distance(&pos(3, 3)));
    assert!(path.len() <= grid.open_count());
    // Three lattice edges join four cells; opposite corners are always two edges apart.
    assert_eq!(path.len(), 4);
    assert_valid_path(&grid, pos(1, 1), pos(3, 3), &path);
}

#[test]
fn three_by_three_is_a_single_cell() {
    let grid = maze::generate(3, 3, &mut StdRng::seed_from_u64(1)).unwrap();
    assert_eq!(grid.open_count(), 1);
    for (position, cell) in grid.enumerate() {
        let expected = if position == pos(1, 1) {
            CellType::Open
        } else {
            CellType::Wall
        };
        assert_eq!(*cell, expected);
    }
    assert_eq!(find_path(&grid, pos(1, 1), pos(1, 1)), Ok(Some(vec![])));
}

#[test]
fn walling_off_a_region_signals_no_path() {
    let mut grid = maze::generate(21, 21, &mut StdRng::seed_from_u64(12)).unwrap();
    let goal = pos(19, 19);
    // Seal the goal in its own cell.
    for neighbor in goal.neighbors() {
        grid[neighbor] = CellType::Wall;
    }
    assert_eq!(find_path(&grid, maze::MAZE_ORIGIN, goal), Ok(None));
}

#[test]
fn endpoint_contract_violations_are_errors() {
    let grid = maze::generate(7, 7, &mut StdRng::seed_from_u64(0)).unwrap();
    assert!(matches!(
        find_path(&grid, pos(0, 0), pos(5, 5)),
        Err(MazeError::InvalidEndpoint { .. })
    ));
    assert!(matches!(
        find_path(&grid, pos(1, 1), pos(7, 1)),
        Err(MazeError::InvalidEndpoint { .. })
    ));
}

/// Maps arbitrary bytes onto odd dimensions between 3 and 25.
fn odd_dimension(raw: u8) -> usize {
    3 + 2 * (raw as usize % 12)
}

quickcheck! {
    fn generated_mazes_are_perfect(seed: u64, w: u8, h: u8) -> bool {
        let grid = maze::generate(odd_dimension(w), odd_dimension(h), &mut StdRng::seed_from_u64(seed))
            .unwrap();
        let reachable = bfs_distances(&grid, maze::MAZE_ORIGIN);
        reachable.len() == grid.open_count()
            && odd_cells(&grid).all(|cell| reachable.contains_key(&cell))
            && open_edges(&grid) + 1 == grid.open_count()
    }

    fn astar_is_optimal(seed: u64, w: u8, h: u8, gx: u8, gy: u8) -> TestResult {
        let (width, height) = (odd_dimension(w), odd_dimension(h));
        let grid = maze::generate(width, height, &mut StdRng::seed_from_u64(seed)).unwrap();
        let goal = pos(gx as usize % width, gy as usize % height);
        if !grid.is_open(goal) {
            return TestResult::discard();
        }
        let start = maze::MAZE_ORIGIN;
        let distances = bfs_distances(&grid, start);
        match find_path(&grid, start, goal) {
            Ok(Some(path)) => TestResult::from_bool(
                path.len() == distances[&goal]
                    && path.last().is_none_or(|last| *last == goal)
                    && path.first().is_none_or(|first| first.is_adjacent(&start)),
            ),
            _ => TestResult::failed(),
        }
    }
}
