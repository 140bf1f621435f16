//! 2D grid of colored cells.

use chroma_core::{Cell, Error, GridConfig, Position, Result, Rgb};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A bounded grid of randomly colored cells, immutable once generated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Fill a `width` x `height` grid with uniform random channels
    pub fn generate<R: Rng>(width: i32, height: i32, rng: &mut R) -> Result<Self> {
        let size = checked_size(width, height)?;
        let cells = (0..size)
            .map(|_| Rgb::new(rng.gen(), rng.gen(), rng.gen()))
            .collect();

        Ok(Self { width, height, cells })
    }

    /// Build a grid from explicit row-major cells
    pub fn from_cells(width: i32, height: i32, cells: Vec<Cell>) -> Result<Self> {
        if cells.len() != checked_size(width, height)? {
            return Err(Error::InvalidConfig(format!(
                "{} cells do not fill a {width}x{height} grid",
                cells.len()
            )));
        }
        Ok(Self { width, height, cells })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.in_bounds(self.width, self.height)
    }

    /// Cell at `pos`, or `OutOfBounds`
    pub fn cell_at(&self, pos: Position) -> Result<Cell> {
        if !self.contains(pos) {
            return Err(Error::OutOfBounds {
                pos,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.cells[self.pos_to_index(pos)])
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index as i32) % self.width;
        let y = (index as i32) / self.width;
        Position::new(x, y)
    }

    /// Row-major cells
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Iterator over all cells with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.index_to_pos(i), *cell))
    }
}

/// Cell count for a grid that fits within `GridConfig::MAX_CELLS`
fn checked_size(width: i32, height: i32) -> Result<usize> {
    GridConfig::cell_count(width, height)
        .filter(|&size| size as u64 <= GridConfig::MAX_CELLS)
        .ok_or_else(|| {
            Error::InvalidConfig(format!(
                "a {width}x{height} grid must hold between 1 and {} cells",
                GridConfig::MAX_CELLS
            ))
        })
}
