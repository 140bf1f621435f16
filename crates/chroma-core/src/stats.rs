//! Running counters for a simulation.

use serde::{Deserialize, Serialize};

/// Counters updated as the simulation runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub buildings_placed: u64,
    pub placements_rejected: u64,
    pub units_spawned: u64,
    /// Production ticks with no empty orthogonal neighbor
    pub spawns_blocked: u64,
    pub moves: u64,
    /// Movement ticks with no empty neighbor
    pub moves_blocked: u64,
    pub timers_fired: u64,
    pub timers_cancelled: u64,
    pub tones_played: u64,
    pub tones_dropped: u64,
}

impl SimulationStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of production ticks that produced a unit
    pub fn spawn_success_rate(&self) -> f64 {
        ratio(self.units_spawned, self.units_spawned + self.spawns_blocked)
    }

    /// Fraction of movement ticks that moved the unit
    pub fn move_success_rate(&self) -> f64 {
        ratio(self.moves, self.moves + self.moves_blocked)
    }
}

fn ratio(hits: u64, attempts: u64) -> f64 {
    if attempts == 0 {
        0.0
    } else {
        hits as f64 / attempts as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_without_attempts() {
        let stats = SimulationStats::new();
        assert_eq!(stats.spawn_success_rate(), 0.0);
        assert_eq!(stats.move_success_rate(), 0.0);
    }

    #[test]
    fn test_rates() {
        let stats = SimulationStats {
            units_spawned: 3,
            spawns_blocked: 1,
            moves: 1,
            moves_blocked: 1,
            ..Default::default()
        };
        assert_eq!(stats.spawn_success_rate(), 0.75);
        assert_eq!(stats.move_success_rate(), 0.5);
    }
}
