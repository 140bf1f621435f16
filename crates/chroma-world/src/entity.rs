//! Buildings and units.

use chroma_core::{EntityId, Position, Rgb};
use serde::{Deserialize, Serialize};

/// Stats of a building, read straight off its founding cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingStats {
    pub attack: u8,
    pub health: u8,
    pub agility: u8,
}

impl From<Rgb> for BuildingStats {
    fn from(color: Rgb) -> Self {
        Self {
            attack: color.red,
            health: color.blue,
            agility: color.green,
        }
    }
}

/// Stats of a unit, inherited from the producing building's color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    pub attack: u8,
    pub defense: u8,
    pub agility: u8,
}

impl From<Rgb> for UnitStats {
    fn from(color: Rgb) -> Self {
        Self {
            attack: color.red,
            defense: color.blue,
            agility: color.green,
        }
    }
}

/// A stationary producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: EntityId,
    pub position: Position,
    pub color: Rgb,
    pub stats: BuildingStats,
    /// Units produced so far
    pub produced: u32,
}

impl Building {
    pub fn new(position: Position, cell: Rgb) -> Self {
        Self {
            id: EntityId::new(),
            position,
            color: cell,
            stats: BuildingStats::from(cell),
            produced: 0,
        }
    }

    /// Spawn a unit of this building's color at `position`
    pub fn produce_at(&mut self, position: Position) -> Unit {
        self.produced += 1;
        Unit::new(position, self.color, self.id)
    }
}

/// A wandering unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: EntityId,
    pub position: Position,
    pub color: Rgb,
    pub stats: UnitStats,
    /// Building that produced this unit
    pub origin: EntityId,
    /// Number of successful moves
    pub steps: u32,
}

impl Unit {
    pub fn new(position: Position, color: Rgb, origin: EntityId) -> Self {
        Self {
            id: EntityId::new(),
            position,
            color,
            stats: UnitStats::from(color),
            origin,
            steps: 0,
        }
    }

    pub fn move_to(&mut self, new_position: Position) {
        self.position = new_position;
        self.steps += 1;
    }
}
