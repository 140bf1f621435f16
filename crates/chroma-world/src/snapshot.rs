//! Read-only view of the world handed to the renderer.

use crate::entity::{Building, Unit};
use crate::grid::Grid;
use chroma_core::{Cell, EntityId, Position, Result, Rgb};
use serde::{Deserialize, Serialize};

/// Fraction of a cell covered by a building square
pub const BUILDING_SCALE: f32 = 0.8;
/// Per-channel brightening of a building over its founding cell
pub const BUILDING_TINT: u8 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingView {
    pub id: EntityId,
    pub position: Position,
    pub color: Rgb,
    pub fill: Rgb,
    pub stroke: Rgb,
    /// Edge length in pixels
    pub size: f32,
}

impl BuildingView {
    pub fn new(building: &Building, cell_size: u32) -> Self {
        Self {
            id: building.id,
            position: building.position,
            color: building.color,
            fill: building.color.lighten(BUILDING_TINT),
            stroke: Rgb::BLACK,
            size: cell_size as f32 * BUILDING_SCALE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitView {
    pub id: EntityId,
    pub position: Position,
    pub color: Rgb,
    pub fill: Rgb,
    pub stroke: Rgb,
    /// Polygon vertex count, 3 to 6
    pub sides: u8,
    /// Circumradius in pixels
    pub radius: f32,
}

impl UnitView {
    pub fn new(unit: &Unit, cell_size: u32) -> Self {
        let defense = f32::from(unit.stats.defense) / 255.0;
        Self {
            id: unit.id,
            position: unit.position,
            color: unit.color,
            fill: unit.color,
            stroke: unit.color.halve(),
            sides: 3 + unit.stats.attack / 64,
            radius: cell_size as f32 * (0.2 + 0.2 * defense),
        }
    }
}

/// Everything needed to redraw the surface from scratch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub now_ms: u64,
    pub width: i32,
    pub height: i32,
    pub cell_size: u32,
    /// Row-major cell colors
    pub cells: Vec<Cell>,
    pub buildings: Vec<BuildingView>,
    pub units: Vec<UnitView>,
}

impl Snapshot {
    pub fn capture(
        now_ms: u64,
        grid: &Grid,
        cell_size: u32,
        buildings: &[Building],
        units: &[Unit],
    ) -> Self {
        Self {
            now_ms,
            width: grid.width(),
            height: grid.height(),
            cell_size,
            cells: grid.cells().to_vec(),
            buildings: buildings
                .iter()
                .map(|b| BuildingView::new(b, cell_size))
                .collect(),
            units: units.iter().map(|u| UnitView::new(u, cell_size)).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_fill_is_clamped() {
        let building = Building::new(Position::new(0, 0), Rgb::new(240, 10, 225));
        let view = BuildingView::new(&building, 40);

        assert_eq!(view.fill, Rgb::new(255, 40, 255));
        assert_eq!(view.stroke, Rgb::BLACK);
        assert!((view.size - 32.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unit_shape_from_stats() {
        let weak = Unit::new(Position::new(0, 0), Rgb::new(0, 0, 0), EntityId::new());
        let strong = Unit::new(Position::new(0, 0), Rgb::new(255, 0, 255), EntityId::new());

        let weak_view = UnitView::new(&weak, 40);
        let strong_view = UnitView::new(&strong, 40);

        assert_eq!(weak_view.sides, 3);
        assert_eq!(strong_view.sides, 6);
        assert!((weak_view.radius - 8.0).abs() < 1e-4);
        assert!((strong_view.radius - 16.0).abs() < 1e-4);
        assert_eq!(strong_view.stroke, Rgb::new(127, 0, 127));
    }

    #[test]
    fn test_snapshot_json() {
        let grid = Grid::from_cells(2, 1, vec![Rgb::new(1, 2, 3), Rgb::BLACK]).unwrap();
        let building = Building::new(Position::new(0, 0), Rgb::new(1, 2, 3));
        let snapshot = Snapshot::capture(5, &grid, 40, &[building], &[]);

        let json = snapshot.to_json().unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.buildings.len(), 1);
        assert_eq!(back.cells.len(), 2);
        assert_eq!(back.now_ms, 5);
    }
}
