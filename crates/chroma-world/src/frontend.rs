//! Outbound requests and the collaborator traits that consume them.

use crate::snapshot::Snapshot;
use crate::simulation::Simulation;
use chroma_core::{AudioConfig, Result};
use serde::{Deserialize, Serialize};

/// A request for the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneRequest {
    pub frequency_hz: f32,
    pub duration_ms: u64,
    pub immediate: bool,
}

/// Something the host must act on, in the order raised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Redraw the whole surface; carries the state as of the change
    Redraw(Box<Snapshot>),
    Tone(ToneRequest),
}

/// Draws a snapshot onto some surface
pub trait Renderer {
    fn redraw(&mut self, snapshot: &Snapshot) -> Result<()>;
}

/// Plays tones
pub trait ToneSink {
    fn play(&mut self, tone: &ToneRequest) -> Result<()>;
}

/// Keeps queued tones from overlapping.
#[derive(Debug, Clone, Default)]
pub struct ToneGate {
    busy_until_ms: u64,
}

impl ToneGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the tone for a stat value, or `None` if a queued tone is still playing
    pub fn request(&mut self, config: &AudioConfig, stat: u8, now_ms: u64) -> Option<ToneRequest> {
        if !config.immediate && now_ms < self.busy_until_ms {
            return None;
        }
        self.busy_until_ms = now_ms.saturating_add(config.duration_ms);
        Some(ToneRequest {
            frequency_hz: config.base_hz + f32::from(stat) * config.hz_per_point,
            duration_ms: config.duration_ms,
            immediate: config.immediate,
        })
    }
}

/// Drain pending events from `sim` and hand each to its collaborator.
pub fn dispatch_events<R, T>(sim: &mut Simulation, renderer: &mut R, tones: &mut T) -> Result<usize>
where
    R: Renderer + ?Sized,
    T: ToneSink + ?Sized,
{
    deliver_events(sim.drain_events(), renderer, tones)
}

/// Hand already drained events to their collaborators, in order.
pub fn deliver_events<R, T>(events: Vec<SimEvent>, renderer: &mut R, tones: &mut T) -> Result<usize>
where
    R: Renderer + ?Sized,
    T: ToneSink + ?Sized,
{
    let count = events.len();
    for event in events {
        match event {
            SimEvent::Redraw(snapshot) => renderer.redraw(&snapshot)?,
            SimEvent::Tone(tone) => tones.play(&tone)?,
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queued_tones_do_not_overlap() {
        let config = AudioConfig {
            enabled: true,
            duration_ms: 100,
            ..Default::default()
        };
        let mut gate = ToneGate::new();

        assert!(gate.request(&config, 10, 0).is_some());
        assert!(gate.request(&config, 10, 99).is_none());
        assert!(gate.request(&config, 10, 100).is_some());
    }

    #[test]
    fn test_immediate_tones_always_play() {
        let config = AudioConfig {
            enabled: true,
            immediate: true,
            ..Default::default()
        };
        let mut gate = ToneGate::new();

        assert!(gate.request(&config, 0, 0).is_some());
        assert!(gate.request(&config, 0, 1).is_some());
    }

    #[test]
    fn test_frequency_from_stat() {
        let config = AudioConfig::default();
        let tone = ToneGate::new().request(&config, 100, 0).unwrap();
        assert!((tone.frequency_hz - 420.0).abs() < f32::EPSILON);
        assert_eq!(tone.duration_ms, 150);
    }
}
