//! Simulation context: grid, entities, timers and outbound events.

use crate::entity::{Building, Unit};
use crate::frontend::{SimEvent, ToneGate};
use crate::grid::Grid;
use crate::registry::{EntityRegistry, Occupant};
use crate::scheduler::{Fired, Scheduler};
use crate::snapshot::Snapshot;
use chroma_core::{
    Direction, EntityId, Error, PixelPoint, Position, Result, SimConfig, SimulationStats,
    TimerKind,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

/// Why a placement did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    OutOfBounds,
    Occupied(Occupant),
}

/// Outcome of a placement request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    Placed(EntityId),
    Rejected(Rejection),
}

impl Placement {
    pub fn placed(&self) -> Option<EntityId> {
        match self {
            Placement::Placed(id) => Some(*id),
            Placement::Rejected(_) => None,
        }
    }
}

/// Owns all mutable state. Every operation takes `&mut self`, so one
/// production or movement tick runs to completion before anything else
/// can observe or change occupancy.
pub struct Simulation {
    grid: Grid,
    registry: EntityRegistry,
    scheduler: Scheduler,
    config: SimConfig,
    rng: ChaCha8Rng,
    now_ms: u64,
    events: Vec<SimEvent>,
    tone_gate: ToneGate,
    stats: SimulationStats,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = Self::seeded_rng(&config);
        let grid = Grid::generate(config.grid.width, config.grid.height, &mut rng)?;

        info!(
            width = grid.width(),
            height = grid.height(),
            seed = ?config.seed,
            "Generated grid"
        );

        Ok(Self::assemble(config, grid, rng))
    }

    /// Start from a prepared grid; its dimensions override the config's.
    pub fn with_grid(mut config: SimConfig, grid: Grid) -> Result<Self> {
        config.grid.width = grid.width();
        config.grid.height = grid.height();
        config.validate()?;
        let rng = Self::seeded_rng(&config);
        Ok(Self::assemble(config, grid, rng))
    }

    fn seeded_rng(config: &SimConfig) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(config.seed.unwrap_or_else(rand::random))
    }

    fn assemble(config: SimConfig, grid: Grid, rng: ChaCha8Rng) -> Self {
        Self {
            grid,
            registry: EntityRegistry::new(),
            scheduler: Scheduler::new(),
            config,
            rng,
            now_ms: 0,
            events: Vec::new(),
            tone_gate: ToneGate::new(),
            stats: SimulationStats::new(),
        }
    }

    /// Translate a pointer position to a cell and place a building there
    pub fn click(&mut self, point: PixelPoint) -> Result<Placement> {
        let Some(pos) = point.to_cell(self.config.grid.cell_size) else {
            info!(px = point.x, py = point.y, "Click at a non-finite point ignored");
            self.request_redraw();
            self.stats.placements_rejected += 1;
            return Ok(Placement::Rejected(Rejection::OutOfBounds));
        };
        debug!(px = point.x, py = point.y, x = pos.x, y = pos.y, "Click");
        self.place_building(pos)
    }

    /// Place a building on an empty cell. Occupied or off-grid cells are a
    /// logged no-op. Either way the surface is redrawn.
    pub fn place_building(&mut self, pos: Position) -> Result<Placement> {
        let placement = if !self.grid.contains(pos) {
            info!(x = pos.x, y = pos.y, "Click outside the grid ignored");
            Placement::Rejected(Rejection::OutOfBounds)
        } else if let Some(occupant) = self.registry.occupant(pos) {
            info!(
                event = "placement_rejected",
                x = pos.x,
                y = pos.y,
                occupant = ?occupant,
                "A building already exists at this location."
            );
            Placement::Rejected(Rejection::Occupied(occupant))
        } else {
            let cell = self.grid.cell_at(pos)?;
            let building = Building::new(pos, cell);
            let agility = building.stats.agility;
            let id = self.registry.add_building(building)?;

            if self.config.features.production {
                let interval = self.config.timing.production_interval_ms(agility);
                self.scheduler
                    .schedule(id, TimerKind::Production, self.now_ms, interval);
                debug!(building_id = %id, interval_ms = interval, "Production timer armed");
            }

            self.stats.buildings_placed += 1;
            info!(
                event = "building_placed",
                building_id = %id,
                x = pos.x,
                y = pos.y,
                color = %cell,
                "Building placed"
            );
            Placement::Placed(id)
        };

        if let Placement::Rejected(_) = placement {
            self.stats.placements_rejected += 1;
        }
        self.request_redraw();
        Ok(placement)
    }

    /// Recompute a building's production interval from its current stats
    /// and restart its timer from now. Returns the new interval.
    pub fn restart_production(&mut self, id: EntityId) -> Result<u64> {
        let agility = self
            .registry
            .building(id)
            .ok_or(Error::NotFound(id))?
            .stats
            .agility;
        if !self.config.features.production {
            return Err(Error::InvalidState("production is disabled".to_string()));
        }

        let interval = self.config.timing.production_interval_ms(agility);
        let existing = self.scheduler.timer_for(id).map(|timer| timer.id);
        let rearmed = match existing {
            Some(timer) => self.scheduler.reschedule(timer, self.now_ms, interval),
            None => false,
        };
        if !rearmed {
            self.scheduler
                .schedule(id, TimerKind::Production, self.now_ms, interval);
        }

        debug!(building_id = %id, interval_ms = interval, "Production timer restarted");
        Ok(interval)
    }

    /// One production tick: spawn a unit on the first empty orthogonal
    /// neighbor (right, down, left, up).
    pub fn produce(&mut self, id: EntityId) -> Result<Option<EntityId>> {
        let origin = self
            .registry
            .building(id)
            .ok_or(Error::NotFound(id))?
            .position;

        let candidates = self.free_neighbors(origin, &Direction::ORTHOGONAL);
        let Some(&target) = candidates.first() else {
            self.stats.spawns_blocked += 1;
            debug!(
                building_id = %id,
                x = origin.x,
                y = origin.y,
                "No empty cell to spawn a unit"
            );
            return Ok(None);
        };

        let unit = self
            .registry
            .building_mut(id)
            .ok_or(Error::NotFound(id))?
            .produce_at(target);
        let attack = unit.stats.attack;
        let agility = unit.stats.agility;
        let unit_id = self.registry.add_unit(unit)?;

        if self.config.features.movement {
            let interval = self.config.timing.movement_interval_ms(agility);
            self.scheduler
                .schedule(unit_id, TimerKind::Movement, self.now_ms, interval);
        }

        self.stats.units_spawned += 1;
        debug!(
            event = "unit_spawned",
            building_id = %id,
            unit_id = %unit_id,
            x = target.x,
            y = target.y,
            candidates = candidates.len(),
            "Unit produced"
        );

        self.request_redraw();
        if self.config.audio.enabled {
            self.request_tone(attack);
        }
        Ok(Some(unit_id))
    }

    /// One movement tick: step to a uniformly random empty neighbor,
    /// diagonals included. Redraws whether or not the unit moved.
    pub fn move_unit(&mut self, id: EntityId) -> Result<Option<Position>> {
        let origin = self.registry.unit(id).ok_or(Error::NotFound(id))?.position;

        let candidates = self.free_neighbors(origin, &Direction::ALL);
        let moved = match candidates.choose(&mut self.rng) {
            Some(&target) => {
                self.registry.relocate_unit(id, target)?;
                self.stats.moves += 1;
                trace!(unit_id = %id, x = target.x, y = target.y, "Unit moved");
                Some(target)
            }
            None => {
                self.stats.moves_blocked += 1;
                None
            }
        };

        self.request_redraw();
        Ok(moved)
    }

    fn free_neighbors(&self, origin: Position, directions: &[Direction]) -> Vec<Position> {
        directions
            .iter()
            .map(|direction| origin.step(*direction))
            .filter(|pos| self.is_free(*pos))
            .collect()
    }

    /// In bounds and not occupied by a building or unit
    pub fn is_free(&self, pos: Position) -> bool {
        self.grid.contains(pos) && !self.registry.is_occupied(pos)
    }

    /// Fire every timer due at or before `now_ms`, in due order.
    #[instrument(skip(self), fields(from_ms = self.now_ms))]
    pub fn advance_to(&mut self, now_ms: u64) -> Result<usize> {
        if now_ms < self.now_ms {
            return Err(Error::InvalidState(format!(
                "clock cannot go back from {} to {}",
                self.now_ms, now_ms
            )));
        }

        let mut fired = 0;
        while let Some(timer) = self.scheduler.pop_due(now_ms) {
            self.now_ms = timer.due_ms;
            self.fire(timer)?;
            fired += 1;
        }
        self.now_ms = now_ms;
        Ok(fired)
    }

    pub fn advance_by(&mut self, delta_ms: u64) -> Result<usize> {
        self.advance_to(self.now_ms.saturating_add(delta_ms))
    }

    /// Jump the clock to the next due timer and fire only that one
    pub fn step_next(&mut self) -> Result<Option<Fired>> {
        let Some(due) = self.scheduler.next_due() else {
            return Ok(None);
        };
        let Some(timer) = self.scheduler.pop_due(due) else {
            return Ok(None);
        };
        self.now_ms = timer.due_ms;
        self.fire(timer)?;
        Ok(Some(timer))
    }

    fn fire(&mut self, timer: Fired) -> Result<()> {
        self.stats.timers_fired += 1;
        match timer.kind {
            TimerKind::Production => {
                self.produce(timer.owner)?;
            }
            TimerKind::Movement => {
                self.move_unit(timer.owner)?;
            }
        }

        let every = self.config.metrics_every;
        if every > 0 && self.stats.timers_fired % every == 0 {
            self.emit_population_metrics();
        }
        Ok(())
    }

    /// Remove a building and cancel its production timer
    pub fn remove_building(&mut self, id: EntityId) -> Result<Building> {
        let building = self.registry.remove_building(id)?;
        self.cancel_timer(id);
        info!(event = "building_removed", building_id = %id, "Building removed");
        self.request_redraw();
        Ok(building)
    }

    /// Remove a unit and cancel its movement timer
    pub fn remove_unit(&mut self, id: EntityId) -> Result<Unit> {
        let unit = self.registry.remove_unit(id)?;
        self.cancel_timer(id);
        debug!(event = "unit_removed", unit_id = %id, "Unit removed");
        self.request_redraw();
        Ok(unit)
    }

    fn cancel_timer(&mut self, owner: EntityId) {
        if self.scheduler.cancel_owner(owner) {
            self.stats.timers_cancelled += 1;
        }
    }

    /// Remove every entity and cancel every timer. Returns the number of
    /// entities removed.
    pub fn teardown(&mut self) -> Result<usize> {
        let buildings: Vec<EntityId> = self.registry.buildings().iter().map(|b| b.id).collect();
        let units: Vec<EntityId> = self.registry.units().iter().map(|u| u.id).collect();
        let removed = buildings.len() + units.len();

        for id in buildings {
            self.registry.remove_building(id)?;
            self.cancel_timer(id);
        }
        for id in units {
            self.registry.remove_unit(id)?;
            self.cancel_timer(id);
        }

        let orphaned = self.scheduler.clear();
        if orphaned > 0 {
            self.stats.timers_cancelled += orphaned as u64;
        }

        self.emit_summary(removed);
        Ok(removed)
    }

    fn request_redraw(&mut self) {
        let snapshot = self.snapshot();
        self.events.push(SimEvent::Redraw(Box::new(snapshot)));
    }

    fn request_tone(&mut self, stat: u8) {
        match self.tone_gate.request(&self.config.audio, stat, self.now_ms) {
            Some(tone) => {
                self.stats.tones_played += 1;
                self.events.push(SimEvent::Tone(tone));
            }
            None => {
                self.stats.tones_dropped += 1;
                trace!(stat, "Tone dropped while another is playing");
            }
        }
    }

    /// Owned read view for the renderer
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(
            self.now_ms,
            &self.grid,
            self.config.grid.cell_size,
            self.registry.buildings(),
            self.registry.units(),
        )
    }

    /// Take all events raised since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    fn emit_population_metrics(&self) {
        info!(
            event = "population_metrics",
            now_ms = self.now_ms,
            buildings = self.registry.buildings().len(),
            units = self.registry.units().len(),
            live_timers = self.scheduler.len(),
            timers_fired = self.stats.timers_fired,
            spawn_success_rate = format!("{:.2}%", self.stats.spawn_success_rate() * 100.0),
            move_success_rate = format!("{:.2}%", self.stats.move_success_rate() * 100.0),
            "Population metrics snapshot"
        );
    }

    fn emit_summary(&self, removed: usize) {
        info!(
            event = "session_summary",
            now_ms = self.now_ms,
            removed,
            buildings_placed = self.stats.buildings_placed,
            placements_rejected = self.stats.placements_rejected,
            units_spawned = self.stats.units_spawned,
            spawns_blocked = self.stats.spawns_blocked,
            moves = self.stats.moves,
            moves_blocked = self.stats.moves_blocked,
            timers_fired = self.stats.timers_fired,
            timers_cancelled = self.stats.timers_cancelled,
            tones_played = self.stats.tones_played,
            tones_dropped = self.stats.tones_dropped,
            "Simulation torn down"
        );
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn buildings(&self) -> &[Building] {
        self.registry.buildings()
    }

    pub fn units(&self) -> &[Unit] {
        self.registry.units()
    }

    pub fn occupant(&self, pos: Position) -> Option<Occupant> {
        self.registry.occupant(pos)
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn next_due(&mut self) -> Option<u64> {
        self.scheduler.next_due()
    }

    pub fn timer_count(&self) -> usize {
        self.scheduler.len()
    }

    pub fn timer_interval(&self, owner: EntityId) -> Option<u64> {
        self.scheduler.timer_for(owner).map(|timer| timer.interval_ms)
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
