//! Shortest paths between two cells of an occupancy grid.
//!
//! [`search`] reports why a path couldn't be found, while [`find_path`] keeps
//! the plain contract of returning an empty sequence for every failure.

use thiserror::Error;

use crate::algorithms::astar::AStarSearch;
use crate::algorithms::astar::SearchStats;
use crate::problems::grid_2d::Cell;
use crate::problems::grid_2d::Grid2DAction;
use crate::problems::grid_2d::Grid2DCost;
use crate::problems::grid_2d::Grid2DHeuristicManhattanDistance;
use crate::problems::grid_2d::Grid2DProblem;
use crate::problems::grid_2d::Grid2DSpace;
use crate::problems::grid_2d::Grid2DSpaceError;
use crate::space::Path;
use crate::space::Space;

pub type Grid2DPath = Path<Cell, Grid2DAction, Grid2DCost>;

pub type Grid2DAStarSearch<'s> = AStarSearch<
    Grid2DHeuristicManhattanDistance,
    Grid2DProblem<'s>,
    Grid2DSpace,
    Cell,
    Grid2DAction,
    Grid2DCost,
>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    #[error("Start {0} is outside the grid")]
    StartOutOfBounds(Cell),
    #[error("Start {0} is blocked")]
    StartBlocked(Cell),
    #[error("Goal {0} is outside the grid")]
    GoalOutOfBounds(Cell),
    #[error("Goal {0} is blocked")]
    GoalBlocked(Cell),
    #[error("No path from {start} to {goal}")]
    NoPath { start: Cell, goal: Cell },
}

impl PathError {
    /// Whether the endpoints were rejected before searching.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, PathError::NoPath { .. })
    }
}

/// Checks the endpoints, start first, bounds before occupancy.
pub fn validate(space: &Grid2DSpace, start: Cell, goal: Cell) -> Result<(), PathError> {
    if !space.valid(&start) {
        return Err(PathError::StartOutOfBounds(start));
    }
    if !space.is_free(&start) {
        return Err(PathError::StartBlocked(start));
    }
    if !space.valid(&goal) {
        return Err(PathError::GoalOutOfBounds(goal));
    }
    if !space.is_free(&goal) {
        return Err(PathError::GoalBlocked(goal));
    }
    Ok(())
}

/// Finds a shortest path, handing back the search that ran for it.
///
/// There is no search when the endpoints are rejected or `start == goal`.
pub fn run_search<'s>(
    space: &'s Grid2DSpace,
    start: Cell,
    goal: Cell,
) -> (Result<Grid2DPath, PathError>, Option<Grid2DAStarSearch<'s>>) {
    if let Err(e) = validate(space, start, goal) {
        log::debug!("Rejected endpoints: {e}");
        return (Err(e), None);
    }
    if start == goal {
        return (Ok(Path::new_from_start(start)), None);
    }

    let mut search = Grid2DAStarSearch::new(Grid2DProblem::new(space, start, goal));
    let path = search.find_path().ok_or(PathError::NoPath { start, goal });
    (path, Some(search))
}

/// Finds a shortest path, also returning the work the search took.
pub fn solve(
    space: &Grid2DSpace,
    start: Cell,
    goal: Cell,
) -> (Result<Grid2DPath, PathError>, SearchStats) {
    let (path, search) = run_search(space, start, goal);
    let stats = search.map(|s| s.stats()).unwrap_or_default();
    (path, stats)
}

/// Finds a shortest path from `start` to `goal`, both included.
pub fn search(space: &Grid2DSpace, start: Cell, goal: Cell) -> Result<Vec<Cell>, PathError> {
    solve(space, start, goal).0.map(Path::into_states)
}

/// Finds a shortest path over raw occupancy flags, `0` free and `1` blocked.
///
/// Malformed grids are rejected. Endpoints outside the grid or on walls, and
/// unreachable goals, give an empty path.
pub fn find_path(
    rows: &[Vec<u8>],
    start: (i64, i64),
    goal: (i64, i64),
) -> Result<Vec<Cell>, Grid2DSpaceError> {
    let space = Grid2DSpace::try_from(rows)?;

    let (Some(start_cell), Some(goal_cell)) =
        (space.cell(start.0, start.1), space.cell(goal.0, goal.1))
    else {
        log::debug!("Endpoints {start:?} -> {goal:?} fall outside the grid");
        return Ok(vec![]);
    };

    match search(&space, start_cell, goal_cell) {
        Ok(path) => Ok(path),
        Err(e) => {
            log::debug!("{e}");
            Ok(vec![])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;

    use indoc::indoc;
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;
    use rustc_hash::FxHashMap;

    use crate::problem::Problem;
    use crate::problems::grid_2d::parse_problem;

    fn c(x: u32, y: u32) -> Cell {
        Cell::new(x, y).unwrap()
    }

    fn demo_rows() -> Vec<Vec<u8>> {
        vec![
            vec![0, 0, 0, 0, 0, 0, 0, 0],
            vec![0, 0, 0, 1, 0, 0, 0, 0],
            vec![0, 0, 0, 1, 0, 0, 0, 0],
            vec![0, 0, 0, 1, 0, 0, 0, 0],
            vec![0, 0, 0, 1, 0, 0, 0, 0],
            vec![0, 0, 0, 0, 0, 0, 0, 0],
        ]
    }

    /// Asserts unit orthogonal steps over free cells between the endpoints.
    fn assert_valid(space: &Grid2DSpace, path: &[Cell], start: Cell, goal: Cell) {
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        for cell in path {
            assert!(space.is_free(cell), "{cell} is not free");
        }
        for pair in path.windows(2) {
            assert!(pair[0].is_adjacent(&pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    /// Breadth-first distances from `start`, the reference for optimality.
    fn bfs_distance(space: &Grid2DSpace, start: Cell, goal: Cell) -> Option<usize> {
        let mut distance = FxHashMap::default();
        distance.insert(start, 0usize);
        let mut queue = VecDeque::from([start]);
        while let Some(cell) = queue.pop_front() {
            if cell == goal {
                return distance.get(&cell).copied();
            }
            let d = distance[&cell];
            for (next, _) in space.neighbours(&cell) {
                if !distance.contains_key(&next) {
                    distance.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    #[test]
    fn demo_grid_detours_around_the_wall() {
        let rows = demo_rows();
        let path = find_path(&rows, (0, 0), (7, 5)).unwrap();
        assert_eq!(path.len() - 1, 12);

        let space = Grid2DSpace::try_from(rows.as_slice()).unwrap();
        assert_valid(&space, &path, c(0, 0), c(7, 5));
        assert!(
            path.iter()
                .any(|cell| cell.x() == 3 && (cell.y() == 0 || cell.y() == 5))
        );
    }

    #[test]
    fn open_grid_takes_manhattan_steps() {
        let rows = vec![vec![0; 3]; 3];
        let path = find_path(&rows, (0, 0), (2, 2)).unwrap();
        assert_eq!(path.len() - 1, 4);

        let space = Grid2DSpace::new_empty_with_dimensions(9, 7).unwrap();
        for (start, goal) in [
            (c(0, 0), c(8, 6)),
            (c(8, 6), c(0, 0)),
            (c(4, 3), c(4, 0)),
            (c(0, 6), c(8, 0)),
        ] {
            let path = search(&space, start, goal).unwrap();
            assert_eq!(path.len() - 1, start.manhattan_distance(&goal) as usize);
            assert_valid(&space, &path, start, goal);
        }
    }

    #[test]
    fn blocked_goal_is_empty() {
        let mut rows = demo_rows();
        rows[5][7] = 1;
        assert_eq!(find_path(&rows, (0, 0), (7, 5)), Ok(vec![]));

        let space = Grid2DSpace::try_from(rows.as_slice()).unwrap();
        assert_eq!(
            search(&space, c(0, 0), c(7, 5)),
            Err(PathError::GoalBlocked(c(7, 5)))
        );
    }

    #[test]
    fn invalid_endpoints_are_empty() {
        let rows = demo_rows();
        for (start, goal) in [
            ((-1, 0), (7, 5)),
            ((0, -1), (7, 5)),
            ((0, 0), (8, 5)),
            ((0, 0), (7, 6)),
            ((8, 0), (0, 0)),
            ((3, 1), (0, 0)),
            ((0, 0), (3, 4)),
            ((i64::MAX, 0), (0, 0)),
        ] {
            assert_eq!(find_path(&rows, start, goal), Ok(vec![]), "{start:?} {goal:?}");
        }
    }

    #[test]
    fn invalid_endpoints_precedence() {
        let space = Grid2DSpace::try_from(demo_rows().as_slice()).unwrap();
        let outside = c(20, 20);
        let wall = c(3, 2);

        assert_eq!(
            search(&space, outside, wall),
            Err(PathError::StartOutOfBounds(outside))
        );
        assert_eq!(
            search(&space, wall, outside),
            Err(PathError::StartBlocked(wall))
        );
        assert_eq!(
            search(&space, c(0, 0), outside),
            Err(PathError::GoalOutOfBounds(outside))
        );
        // Validation happens before the start == goal shortcut.
        assert_eq!(search(&space, wall, wall), Err(PathError::StartBlocked(wall)));
        assert!(PathError::GoalBlocked(wall).is_invalid_input());
    }

    #[test]
    fn start_is_goal() {
        let rows = demo_rows();
        assert_eq!(find_path(&rows, (2, 3), (2, 3)), Ok(vec![c(2, 3)]));

        let space = Grid2DSpace::try_from(rows.as_slice()).unwrap();
        let (path, stats) = solve(&space, c(5, 5), c(5, 5));
        let path = path.unwrap();
        assert!(path.is_empty());
        assert_eq!(path.cost(), 0);
        assert_eq!(stats, SearchStats::default());

        let (path, search) = run_search(&space, c(5, 5), c(5, 5));
        assert_eq!(path.map(Path::into_states), Ok(vec![c(5, 5)]));
        assert!(search.is_none());
    }

    #[test]
    fn run_search_keeps_the_search() {
        let space = Grid2DSpace::try_from(demo_rows().as_slice()).unwrap();

        let (path, search) = run_search(&space, c(3, 1), c(0, 0));
        assert_eq!(path, Err(PathError::StartBlocked(c(3, 1))));
        assert!(search.is_none());

        let (path, search) = run_search(&space, c(0, 0), c(7, 5));
        assert_eq!(path.unwrap().len(), 12);
        let search = search.unwrap();
        assert_eq!(search.problem().goal(), c(7, 5));
        assert_eq!(search.stats(), solve(&space, c(0, 0), c(7, 5)).1);

        let mut report = Vec::new();
        search.write_stats(&mut report).unwrap();
        assert!(String::from_utf8(report).unwrap().starts_with("AStarSearch Stats:"));
    }

    #[test]
    fn unreachable_goal_is_no_path() {
        let (space, start, goal) = parse_problem(indoc! {"
            S..#...
            ...#.G.
            ...#...
        "})
        .unwrap();
        let (path, stats) = solve(&space, start, goal);
        assert_eq!(path, Err(PathError::NoPath { start, goal }));
        assert!(!PathError::NoPath { start, goal }.is_invalid_input());
        assert_eq!(stats.expanded, 9);

        let rows = vec![vec![0, 1, 0]];
        assert_eq!(find_path(&rows, (0, 0), (2, 0)), Ok(vec![]));
    }

    #[test]
    fn malformed_grids_are_rejected() {
        let ragged = vec![vec![0, 0, 0], vec![0, 0]];
        assert_eq!(
            find_path(&ragged, (0, 0), (1, 1)),
            Err(Grid2DSpaceError::Ragged {
                row: 1,
                expected: 3,
                found: 2
            })
        );
        assert_eq!(find_path(&[], (0, 0), (0, 0)), Err(Grid2DSpaceError::Empty));
    }

    #[test]
    fn repeated_searches_agree() {
        let rows = demo_rows();
        let first = find_path(&rows, (0, 0), (7, 5)).unwrap();
        for _ in 0..5 {
            assert_eq!(find_path(&rows, (0, 0), (7, 5)).unwrap(), first);
        }
    }

    #[test]
    fn random_grids_match_breadth_first_search() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut found = 0;
        for _ in 0..100 {
            let space = Grid2DSpace::random(&mut rng, 17, 11, 0.3).unwrap();
            let (Some(start), Some(goal)) =
                (space.random_free_cell(&mut rng), space.random_free_cell(&mut rng))
            else {
                continue;
            };

            match search(&space, start, goal) {
                Ok(path) => {
                    found += 1;
                    assert_valid(&space, &path, start, goal);
                    assert_eq!(Some(path.len() - 1), bfs_distance(&space, start, goal));
                    assert_eq!(search(&space, start, goal), Ok(path));
                }
                Err(e) => {
                    assert_eq!(e, PathError::NoPath { start, goal });
                    assert_eq!(bfs_distance(&space, start, goal), None);
                }
            }
        }
        assert!(found > 0);
    }
}
