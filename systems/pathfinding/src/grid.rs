//! Occupancy grid rasterized from an obstacle field.

use std::collections::VecDeque;

use firebot_core::{ObstacleField, Position, Rect};

/// Column/row coordinate of a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    column: u32,
    row: u32,
}

impl GridCell {
    /// Creates a cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Taxicab distance between two cells.
    #[must_use]
    pub fn manhattan_distance(self, other: GridCell) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Chessboard distance between two cells.
    #[must_use]
    pub fn chebyshev_distance(self, other: GridCell) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }
}

/// Dense blocked/free grid covering the map bounds.
///
/// A cell is blocked when its center lies inside a padded obstacle or outside
/// the navigable interior. Cells are stored in row-major order.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    bounds: Rect,
    cell_size: f32,
    columns: u32,
    rows: u32,
    blocked: Vec<bool>,
}

impl OccupancyGrid {
    /// Rasterizes the obstacle field into square cells of `cell_size`.
    #[must_use]
    pub fn build(field: &ObstacleField, cell_size: f32) -> Self {
        let bounds = field.bounds();
        let (columns, rows) = if cell_size.is_finite() && cell_size > 0.0 {
            (
                cell_count(bounds.width(), cell_size),
                cell_count(bounds.height(), cell_size),
            )
        } else {
            (0, 0)
        };

        let mut grid = Self {
            bounds,
            cell_size,
            columns,
            rows,
            blocked: Vec::new(),
        };

        let total = grid.cell_total();
        grid.blocked.reserve(total);
        for row in 0..rows {
            for column in 0..columns {
                let center = grid.center(GridCell::new(column, row));
                grid.blocked.push(field.is_blocked(center));
            }
        }

        grid
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_total(&self) -> usize {
        let columns = usize::try_from(self.columns).unwrap_or(0);
        let rows = usize::try_from(self.rows).unwrap_or(0);
        columns.checked_mul(rows).unwrap_or(0)
    }

    /// Reports whether the cell is blocked. Cells outside the grid are blocked.
    #[must_use]
    pub fn is_blocked(&self, cell: GridCell) -> bool {
        self.index(cell)
            .and_then(|index| self.blocked.get(index).copied())
            .unwrap_or(true)
    }

    /// Center of the cell in map coordinates.
    #[must_use]
    pub fn center(&self, cell: GridCell) -> Position {
        Position::new(
            self.bounds.x() + (cell.column as f32 + 0.5) * self.cell_size,
            self.bounds.y() + (cell.row as f32 + 0.5) * self.cell_size,
        )
    }

    /// Cell containing the position, clamped onto the grid.
    #[must_use]
    pub fn cell_of(&self, position: Position) -> Option<GridCell> {
        if self.columns == 0 || self.rows == 0 {
            return None;
        }
        if !position.x().is_finite() || !position.y().is_finite() {
            return None;
        }

        let column = axis_index(position.x() - self.bounds.x(), self.cell_size, self.columns);
        let row = axis_index(position.y() - self.bounds.y(), self.cell_size, self.rows);
        Some(GridCell::new(column, row))
    }

    /// Row-major index of the cell, if it lies on the grid.
    #[must_use]
    pub fn index(&self, cell: GridCell) -> Option<usize> {
        if cell.column >= self.columns || cell.row >= self.rows {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let row = usize::try_from(cell.row).ok()?;
        let column = usize::try_from(cell.column).ok()?;
        Some(row * width + column)
    }

    /// Inverse of [`OccupancyGrid::index`].
    #[must_use]
    pub fn cell_at(&self, index: usize) -> Option<GridCell> {
        let width = usize::try_from(self.columns).ok()?;
        if width == 0 || index >= self.cell_total() {
            return None;
        }
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(GridCell::new(column, row))
    }

    /// On-grid 4-neighbors in north, west, east, south order.
    pub fn neighbors(&self, cell: GridCell) -> impl Iterator<Item = GridCell> + '_ {
        const OFFSETS: [(i64, i64); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

        OFFSETS.into_iter().filter_map(move |(dc, dr)| {
            let column = u32::try_from(i64::from(cell.column) + dc).ok()?;
            let row = u32::try_from(i64::from(cell.row) + dr).ok()?;
            let neighbor = GridCell::new(column, row);
            self.index(neighbor).map(|_| neighbor)
        })
    }

    /// Closest free cell reachable within `radius` breadth-first steps.
    #[must_use]
    pub fn nearest_free(&self, origin: GridCell, radius: u32) -> Option<GridCell> {
        let origin_index = self.index(origin)?;
        let mut visited = vec![false; self.cell_total()];
        let mut queue = VecDeque::new();
        visited[origin_index] = true;
        queue.push_back((origin, 0_u32));

        while let Some((cell, depth)) = queue.pop_front() {
            if !self.is_blocked(cell) {
                return Some(cell);
            }
            if depth >= radius {
                continue;
            }

            for neighbor in self.neighbors(cell) {
                let Some(index) = self.index(neighbor) else {
                    continue;
                };
                if visited[index] {
                    continue;
                }
                visited[index] = true;
                queue.push_back((neighbor, depth + 1));
            }
        }

        None
    }
}

fn cell_count(extent: f32, cell_size: f32) -> u32 {
    let count = (extent / cell_size).ceil();
    if count.is_finite() && count > 0.0 {
        count.min(u32::MAX as f32) as u32
    } else {
        0
    }
}

fn axis_index(offset: f32, cell_size: f32, count: u32) -> u32 {
    let raw = (offset / cell_size).floor();
    if raw <= 0.0 {
        0
    } else {
        (raw as u32).min(count.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_field() -> ObstacleField {
        ObstacleField::new(Rect::new(0.0, 0.0, 800.0, 600.0), &[], 20.0, 30.0)
    }

    #[test]
    fn grid_covers_map_bounds() {
        let grid = OccupancyGrid::build(&open_field(), 20.0);
        assert_eq!(grid.columns(), 40);
        assert_eq!(grid.rows(), 30);
        assert_eq!(grid.center(GridCell::new(0, 0)), Position::new(10.0, 10.0));
    }

    #[test]
    fn border_cells_fall_outside_the_interior() {
        let grid = OccupancyGrid::build(&open_field(), 20.0);
        assert!(grid.is_blocked(GridCell::new(0, 10)));
        assert!(!grid.is_blocked(GridCell::new(2, 10)));
        assert!(grid.is_blocked(GridCell::new(39, 10)));
        assert!(grid.is_blocked(GridCell::new(40, 10)));
    }

    #[test]
    fn positions_are_clamped_onto_the_grid() {
        let grid = OccupancyGrid::build(&open_field(), 20.0);
        assert_eq!(
            grid.cell_of(Position::new(-15.0, 45.0)),
            Some(GridCell::new(0, 2))
        );
        assert_eq!(
            grid.cell_of(Position::new(900.0, 599.0)),
            Some(GridCell::new(39, 29))
        );
    }

    #[test]
    fn index_round_trips_through_cell_at() {
        let grid = OccupancyGrid::build(&open_field(), 20.0);
        let cell = GridCell::new(7, 3);
        let index = grid.index(cell).expect("cell on grid");
        assert_eq!(grid.cell_at(index), Some(cell));
    }

    #[test]
    fn corner_cells_have_two_neighbors() {
        let grid = OccupancyGrid::build(&open_field(), 20.0);
        let neighbors: Vec<_> = grid.neighbors(GridCell::new(0, 0)).collect();
        assert_eq!(neighbors, vec![GridCell::new(1, 0), GridCell::new(0, 1)]);
    }

    #[test]
    fn nearest_free_escapes_the_interior_margin() {
        let grid = OccupancyGrid::build(&open_field(), 20.0);
        assert_eq!(
            grid.nearest_free(GridCell::new(0, 10), 4),
            Some(GridCell::new(1, 10))
        );
        assert_eq!(grid.nearest_free(GridCell::new(0, 10), 0), None);
    }
}
