#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid path planner that routes the robot around padded obstacles.
//!
//! Every request rasterizes the obstacle field into an [`OccupancyGrid`] and
//! runs a bounded A* search over its 4-connected cells. The planner never
//! fails loudly: an empty [`Path`] tells the caller to fall back to direct
//! movement.

mod grid;

use std::{cmp::Ordering, collections::BinaryHeap};

use firebot_core::{ObstacleField, Path, Position, Rect};
use tracing::debug;

pub use grid::{GridCell, OccupancyGrid};

/// Edge length of a grid cell in map units.
pub const DEFAULT_CELL_SIZE: f32 = 20.0;

/// Node expansions allowed before a search is abandoned.
pub const DEFAULT_EXPANSION_BUDGET: usize = 5000;

/// How many breadth-first steps a blocked start may travel to reach a free cell.
const START_SNAP_RADIUS: u32 = 8;

/// Bounded A* planner over an occupancy grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPathfinder {
    cell_size: f32,
    expansion_budget: usize,
}

impl GridPathfinder {
    /// Creates a planner with the provided cell size and expansion budget.
    #[must_use]
    pub const fn new(cell_size: f32, expansion_budget: usize) -> Self {
        Self {
            cell_size,
            expansion_budget,
        }
    }

    /// Edge length of a grid cell.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Maximum number of node expansions per search.
    #[must_use]
    pub const fn expansion_budget(&self) -> usize {
        self.expansion_budget
    }

    /// Reports whether `goal` already lies within one cell of `start`, where
    /// [`GridPathfinder::find_path`] has nothing to plan.
    #[must_use]
    pub fn is_within_one_cell(&self, start: Position, goal: Position, bounds: Rect) -> bool {
        let cell = |position: Position| {
            (
                ((position.x() - bounds.x()) / self.cell_size).floor(),
                ((position.y() - bounds.y()) / self.cell_size).floor(),
            )
        };
        let (start_column, start_row) = cell(start);
        let (goal_column, goal_row) = cell(goal);
        (start_column - goal_column).abs() <= 1.0 && (start_row - goal_row).abs() <= 1.0
    }

    /// Plans a route from `start` to within one cell of `goal`.
    ///
    /// The returned waypoints are cell centers beginning with the cell after
    /// the start. When the start cell is blocked the search begins at the
    /// nearest free cell and that cell's center becomes the first waypoint.
    /// An empty path means no route was found.
    #[must_use]
    pub fn find_path(&self, start: Position, goal: Position, field: &ObstacleField) -> Path {
        let grid = OccupancyGrid::build(field, self.cell_size);
        let (Some(start_cell), Some(goal_cell)) = (grid.cell_of(start), grid.cell_of(goal)) else {
            debug!("occupancy grid is empty; no route");
            return Path::default();
        };

        let mut waypoints = Vec::new();
        let origin = if grid.is_blocked(start_cell) {
            let Some(free) = grid.nearest_free(start_cell, START_SNAP_RADIUS) else {
                debug!(
                    column = start_cell.column(),
                    row = start_cell.row(),
                    "start is boxed in; no route"
                );
                return Path::default();
            };
            waypoints.push(grid.center(free));
            free
        } else {
            start_cell
        };

        match self.search(&grid, origin, goal_cell) {
            Some(cells) => {
                waypoints.extend(cells.into_iter().map(|cell| grid.center(cell)));
                Path::new(waypoints)
            }
            None => Path::default(),
        }
    }

    fn search(
        &self,
        grid: &OccupancyGrid,
        start: GridCell,
        goal: GridCell,
    ) -> Option<Vec<GridCell>> {
        let start_index = grid.index(start)?;
        let total = grid.cell_total();
        let mut cost = vec![u32::MAX; total];
        let mut parent: Vec<Option<usize>> = vec![None; total];
        let mut closed = vec![false; total];
        let mut open = BinaryHeap::new();
        let mut discovered: u64 = 0;
        let mut expansions: usize = 0;

        cost[start_index] = 0;
        open.push(Frontier {
            estimate: start.manhattan_distance(goal),
            discovered,
            index: start_index,
        });

        while let Some(Frontier { index, .. }) = open.pop() {
            if closed[index] {
                continue;
            }
            closed[index] = true;

            let cell = grid.cell_at(index)?;
            if cell.chebyshev_distance(goal) <= 1 {
                return Some(reconstruct(grid, &parent, index));
            }

            expansions += 1;
            if expansions > self.expansion_budget {
                debug!(
                    budget = self.expansion_budget,
                    "expansion budget exhausted; no route"
                );
                return None;
            }

            let next_cost = cost[index].saturating_add(1);
            for neighbor in grid.neighbors(cell) {
                if grid.is_blocked(neighbor) {
                    continue;
                }
                let Some(neighbor_index) = grid.index(neighbor) else {
                    continue;
                };
                if closed[neighbor_index] || next_cost >= cost[neighbor_index] {
                    continue;
                }

                cost[neighbor_index] = next_cost;
                parent[neighbor_index] = Some(index);
                discovered += 1;
                open.push(Frontier {
                    estimate: next_cost + neighbor.manhattan_distance(goal),
                    discovered,
                    index: neighbor_index,
                });
            }
        }

        None
    }
}

impl Default for GridPathfinder {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE, DEFAULT_EXPANSION_BUDGET)
    }
}

/// Open-set entry ordered so the heap pops the lowest estimate first and,
/// among equal estimates, the earliest discovered node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Frontier {
    estimate: u32,
    discovered: u64,
    index: usize,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.discovered.cmp(&self.discovered))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn reconstruct(
    grid: &OccupancyGrid,
    parent: &[Option<usize>],
    goal_index: usize,
) -> Vec<GridCell> {
    let mut cells = Vec::new();
    let mut cursor = goal_index;
    while let Some(previous) = parent[cursor] {
        if let Some(cell) = grid.cell_at(cursor) {
            cells.push(cell);
        }
        cursor = previous;
    }
    cells.reverse();
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_field() -> ObstacleField {
        ObstacleField::new(Rect::new(0.0, 0.0, 800.0, 600.0), &[], 20.0, 30.0)
    }

    #[test]
    fn frontier_prefers_lower_estimate_then_earlier_discovery() {
        let mut heap = BinaryHeap::new();
        heap.push(Frontier {
            estimate: 5,
            discovered: 0,
            index: 0,
        });
        heap.push(Frontier {
            estimate: 3,
            discovered: 2,
            index: 1,
        });
        heap.push(Frontier {
            estimate: 3,
            discovered: 1,
            index: 2,
        });

        let order: Vec<usize> =
            std::iter::from_fn(|| heap.pop().map(|entry| entry.index)).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn straight_route_is_a_sequence_of_adjacent_cell_centers() {
        let planner = GridPathfinder::default();
        let path = planner.find_path(
            Position::new(110.0, 310.0),
            Position::new(310.0, 310.0),
            &open_field(),
        );

        let waypoints: Vec<Position> = path.iter().copied().collect();
        assert_eq!(waypoints.first(), Some(&Position::new(130.0, 310.0)));
        assert_eq!(waypoints.last(), Some(&Position::new(290.0, 310.0)));
        for pair in waypoints.windows(2) {
            assert!((pair[0].distance_to(pair[1]) - 20.0).abs() < 1e-3);
        }
    }

    #[test]
    fn goal_next_to_start_yields_empty_route() {
        let planner = GridPathfinder::default();
        let path = planner.find_path(
            Position::new(110.0, 310.0),
            Position::new(130.0, 330.0),
            &open_field(),
        );
        assert!(path.is_empty());
    }

    #[test]
    fn neighbouring_cells_are_within_reach() {
        let planner = GridPathfinder::default();
        let bounds = Rect::new(0.0, 0.0, 800.0, 600.0);
        let start = Position::new(110.0, 310.0);

        assert!(planner.is_within_one_cell(start, Position::new(130.0, 330.0), bounds));
        assert!(planner.is_within_one_cell(start, start, bounds));
        assert!(!planner.is_within_one_cell(start, Position::new(150.0, 310.0), bounds));
    }

    #[test]
    fn exhausted_budget_yields_empty_route() {
        let planner = GridPathfinder::new(DEFAULT_CELL_SIZE, 3);
        let path = planner.find_path(
            Position::new(50.0, 50.0),
            Position::new(700.0, 500.0),
            &open_field(),
        );
        assert!(path.is_empty());
    }
}
