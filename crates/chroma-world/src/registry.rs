//! Entity registry with an occupancy index.

use crate::entity::{Building, Unit};
use chroma_core::{EntityId, Error, Position, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What is standing on a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Occupant {
    Building(EntityId),
    Unit(EntityId),
}

/// Owns every building and unit. Occupancy checks cover both collections.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    buildings: Vec<Building>,
    units: Vec<Unit>,
    occupancy: HashMap<Position, Occupant>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupant(&self, pos: Position) -> Option<Occupant> {
        self.occupancy.get(&pos).copied()
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.occupancy.contains_key(&pos)
    }

    pub fn add_building(&mut self, building: Building) -> Result<EntityId> {
        self.claim(building.position, Occupant::Building(building.id))?;
        let id = building.id;
        self.buildings.push(building);
        Ok(id)
    }

    pub fn add_unit(&mut self, unit: Unit) -> Result<EntityId> {
        self.claim(unit.position, Occupant::Unit(unit.id))?;
        let id = unit.id;
        self.units.push(unit);
        Ok(id)
    }

    fn claim(&mut self, pos: Position, occupant: Occupant) -> Result<()> {
        if let Some(existing) = self.occupancy.get(&pos) {
            return Err(Error::InvalidState(format!(
                "cell {pos} already holds {existing:?}"
            )));
        }
        self.occupancy.insert(pos, occupant);
        Ok(())
    }

    pub fn building(&self, id: EntityId) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == id)
    }

    pub fn building_mut(&mut self, id: EntityId) -> Option<&mut Building> {
        self.buildings.iter_mut().find(|b| b.id == id)
    }

    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Move a unit to an empty cell, keeping the occupancy index in step
    pub fn relocate_unit(&mut self, id: EntityId, to: Position) -> Result<()> {
        if self.is_occupied(to) {
            return Err(Error::InvalidState(format!("cell {to} is occupied")));
        }
        let unit = self
            .units
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(Error::NotFound(id))?;

        self.occupancy.remove(&unit.position);
        self.occupancy.insert(to, Occupant::Unit(id));
        unit.move_to(to);
        Ok(())
    }

    pub fn remove_building(&mut self, id: EntityId) -> Result<Building> {
        let index = self
            .buildings
            .iter()
            .position(|b| b.id == id)
            .ok_or(Error::NotFound(id))?;
        let building = self.buildings.swap_remove(index);
        self.occupancy.remove(&building.position);
        Ok(building)
    }

    pub fn remove_unit(&mut self, id: EntityId) -> Result<Unit> {
        let index = self
            .units
            .iter()
            .position(|u| u.id == id)
            .ok_or(Error::NotFound(id))?;
        let unit = self.units.swap_remove(index);
        self.occupancy.remove(&unit.position);
        Ok(unit)
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.buildings.len() + self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupancy.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma_core::Rgb;

    fn building_at(x: i32, y: i32) -> Building {
        Building::new(Position::new(x, y), Rgb::new(1, 2, 3))
    }

    #[test]
    fn test_occupancy_covers_both_collections() {
        let mut registry = EntityRegistry::new();
        let mut building = building_at(1, 1);
        let building_id = registry.add_building(building.clone()).unwrap();
        let unit_id = registry.add_unit(building.produce_at(Position::new(2, 1))).unwrap();

        assert_eq!(
            registry.occupant(Position::new(1, 1)),
            Some(Occupant::Building(building_id))
        );
        assert_eq!(
            registry.occupant(Position::new(2, 1)),
            Some(Occupant::Unit(unit_id))
        );
        assert!(!registry.is_occupied(Position::new(3, 1)));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_double_claim_is_rejected() {
        let mut registry = EntityRegistry::new();
        registry.add_building(building_at(0, 0)).unwrap();

        let unit = Unit::new(Position::new(0, 0), Rgb::BLACK, EntityId::new());
        assert!(registry.add_unit(unit).is_err());
        assert!(registry.add_building(building_at(0, 0)).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_relocate_updates_index() {
        let mut registry = EntityRegistry::new();
        let unit = Unit::new(Position::new(0, 0), Rgb::BLACK, EntityId::new());
        let id = registry.add_unit(unit).unwrap();

        registry.relocate_unit(id, Position::new(1, 0)).unwrap();
        assert!(!registry.is_occupied(Position::new(0, 0)));
        assert_eq!(registry.occupant(Position::new(1, 0)), Some(Occupant::Unit(id)));
        assert_eq!(registry.unit(id).unwrap().steps, 1);
    }

    #[test]
    fn test_relocate_onto_occupied_cell_fails() {
        let mut registry = EntityRegistry::new();
        registry.add_building(building_at(1, 0)).unwrap();
        let unit = Unit::new(Position::new(0, 0), Rgb::BLACK, EntityId::new());
        let id = registry.add_unit(unit).unwrap();

        assert!(registry.relocate_unit(id, Position::new(1, 0)).is_err());
        assert_eq!(registry.unit(id).unwrap().position, Position::new(0, 0));
    }

    #[test]
    fn test_remove_frees_cell() {
        let mut registry = EntityRegistry::new();
        let id = registry.add_building(building_at(4, 4)).unwrap();

        let removed = registry.remove_building(id).unwrap();
        assert_eq!(removed.position, Position::new(4, 4));
        assert!(registry.is_empty());
        assert!(matches!(registry.remove_building(id), Err(Error::NotFound(_))));
        assert!(registry.remove_unit(id).is_err());
    }
}
