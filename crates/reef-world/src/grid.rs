//! 2D grid for the world.

use reef_core::{Cell, Position, WorldConfig};
use serde::{Deserialize, Serialize};

/// A bounded 2D grid of cells, stored row-major with the origin at the
/// top-left corner. The grid does not wrap; callers filter out-of-bounds
/// positions with [`Grid::contains`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create an all-water grid.
    pub fn new(width: i32, height: i32) -> Self {
        let size = (width * height) as usize;
        Self {
            width,
            height,
            cells: vec![Cell::Water; size],
        }
    }

    /// Create a grid from world configuration: open water over a rock
    /// seafloor along the bottom row.
    pub fn from_config(config: &WorldConfig) -> Self {
        let mut grid = Self::new(config.width, config.height);
        for x in 0..config.width {
            grid.set(Position::new(x, config.height - 1), Cell::Rock);
        }
        grid
    }

    /// Whether a position lies inside the grid.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Get the cell at an in-bounds position.
    pub fn get(&self, pos: Position) -> &Cell {
        let index = self.pos_to_index(pos);
        &self.cells[index]
    }

    /// Get a mutable reference to the cell at an in-bounds position.
    pub fn get_mut(&mut self, pos: Position) -> &mut Cell {
        let index = self.pos_to_index(pos);
        &mut self.cells[index]
    }

    /// Overwrite the cell at an in-bounds position.
    pub fn set(&mut self, pos: Position, cell: Cell) {
        let index = self.pos_to_index(pos);
        self.cells[index] = cell;
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        debug_assert!(self.contains(pos), "position {pos:?} out of bounds");
        (pos.y * self.width + pos.x) as usize
    }

    fn index_to_pos(&self, index: usize) -> Position {
        let x = (index as i32) % self.width;
        let y = (index as i32) / self.width;
        Position::new(x, y)
    }

    /// Iterator over all cells with their positions, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.index_to_pos(i), cell))
    }
}
