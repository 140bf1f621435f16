//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a building or unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 2D cell coordinate on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.to_delta();
        self.add(dx, dy)
    }

    /// Whether this position lies inside a `width` x `height` grid
    pub fn in_bounds(&self, width: i32, height: i32) -> bool {
        self.x >= 0 && self.y >= 0 && self.x < width && self.y < height
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Surface-relative pointer position, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Hit-test against a grid of square cells `cell_size` pixels wide.
    /// A non-finite coordinate hits no cell.
    pub fn to_cell(&self, cell_size: u32) -> Option<Position> {
        if !self.is_finite() {
            return None;
        }
        let size = f64::from(cell_size);
        Some(Position::new(
            (self.x / size).floor() as i32,
            (self.y / size).floor() as i32,
        ))
    }
}

/// Direction for spawning and movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    /// Production scan order: right, down, left, up.
    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::North,
    ];

    /// Movement scan order, row by row from the top-left neighbor.
    pub const ALL: [Direction; 8] = [
        Direction::NorthWest,
        Direction::North,
        Direction::NorthEast,
        Direction::West,
        Direction::East,
        Direction::SouthWest,
        Direction::South,
        Direction::SouthEast,
    ];

    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, -1),
            Direction::NorthWest => (-1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (-1, 1),
        }
    }
}

/// Three 0-255 intensity channels, used both as a color and as stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Add `amount` to every channel, saturating at 255
    pub fn lighten(&self, amount: u8) -> Self {
        Self {
            red: self.red.saturating_add(amount),
            green: self.green.saturating_add(amount),
            blue: self.blue.saturating_add(amount),
        }
    }

    pub fn halve(&self) -> Self {
        Self {
            red: self.red / 2,
            green: self.green / 2,
            blue: self.blue / 2,
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.red, self.green, self.blue)
    }
}

/// A grid cell is just its color; stats are derived from it on placement.
pub type Cell = Rgb;

/// Which repeating behavior a timer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    Production,
    Movement,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_bounds() {
        assert!(Position::new(0, 0).in_bounds(10, 8));
        assert!(Position::new(9, 7).in_bounds(10, 8));
        assert!(!Position::new(10, 7).in_bounds(10, 8));
        assert!(!Position::new(9, 8).in_bounds(10, 8));
        assert!(!Position::new(-1, 0).in_bounds(10, 8));
    }

    #[test]
    fn test_pixel_hit_test() {
        assert_eq!(PixelPoint::new(45.0, 85.0).to_cell(40), Some(Position::new(1, 2)));
        assert_eq!(PixelPoint::new(0.0, 39.9).to_cell(40), Some(Position::new(0, 0)));
        assert_eq!(PixelPoint::new(-0.5, 40.0).to_cell(40), Some(Position::new(-1, 1)));
    }

    #[test]
    fn test_non_finite_point_hits_no_cell() {
        assert_eq!(PixelPoint::new(f64::NAN, f64::NAN).to_cell(40), None);
        assert_eq!(PixelPoint::new(f64::INFINITY, 10.0).to_cell(40), None);
        assert_eq!(PixelPoint::new(10.0, f64::NEG_INFINITY).to_cell(40), None);
        assert!(!PixelPoint::new(f64::NAN, 0.0).is_finite());
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::North.to_delta(), (0, -1));
        assert_eq!(Direction::South.to_delta(), (0, 1));
        assert_eq!(Direction::East.to_delta(), (1, 0));
        assert_eq!(Direction::West.to_delta(), (-1, 0));
    }

    #[test]
    fn test_scan_orders_cover_neighbors_once() {
        let mut deltas: Vec<_> = Direction::ALL.iter().map(|d| d.to_delta()).collect();
        deltas.sort();
        deltas.dedup();
        assert_eq!(deltas.len(), 8);
        assert!(!deltas.contains(&(0, 0)));

        let first = Position::new(1, 2).step(Direction::ORTHOGONAL[0]);
        assert_eq!(first, Position::new(2, 2));
    }

    #[test]
    fn test_rgb_lighten_saturates() {
        let color = Rgb::new(10, 240, 255).lighten(30);
        assert_eq!(color, Rgb::new(40, 255, 255));
        assert_eq!(Rgb::new(201, 3, 100).halve(), Rgb::new(100, 1, 50));
    }
}
