//! Collaborators that stand in for the drawing surface and the speaker.

use chroma_core::Result;
use chroma_world::{Renderer, Snapshot, ToneRequest, ToneSink};
use serde::Serialize;
use std::io::Write;
use tracing::info;

#[derive(Serialize)]
struct Frame<'a> {
    frame: u64,
    #[serde(flatten)]
    snapshot: &'a Snapshot,
}

/// Writes each redraw as one JSON line
pub struct JsonLinesRenderer<W: Write> {
    writer: W,
    frames: u64,
}

impl<W: Write> JsonLinesRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, frames: 0 }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Renderer for JsonLinesRenderer<W> {
    fn redraw(&mut self, snapshot: &Snapshot) -> Result<()> {
        let frame = Frame {
            frame: self.frames,
            snapshot,
        };
        serde_json::to_writer(&mut self.writer, &frame)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.frames += 1;
        Ok(())
    }
}

/// Logs tone requests instead of synthesizing them
#[derive(Debug, Default)]
pub struct LogToneSink {
    played: u64,
}

impl LogToneSink {
    pub fn played(&self) -> u64 {
        self.played
    }
}

impl ToneSink for LogToneSink {
    fn play(&mut self, tone: &ToneRequest) -> Result<()> {
        self.played += 1;
        info!(
            event = "tone",
            frequency_hz = tone.frequency_hz,
            duration_ms = tone.duration_ms,
            immediate = tone.immediate,
            "Tone requested"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma_core::{Position, SimConfig};
    use chroma_world::{dispatch_events, Simulation};

    #[test]
    fn test_one_line_per_redraw() {
        let config = SimConfig {
            seed: Some(5),
            ..Default::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        sim.place_building(Position::new(1, 2)).unwrap();
        sim.place_building(Position::new(1, 2)).unwrap();

        let mut renderer = JsonLinesRenderer::new(Vec::new());
        let mut tones = LogToneSink::default();
        let dispatched = dispatch_events(&mut sim, &mut renderer, &mut tones).unwrap();
        assert_eq!(dispatched, 2);
        assert_eq!(renderer.frames(), 2);
        assert_eq!(tones.played(), 0);

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["frame"], 0);
        assert_eq!(lines[1]["frame"], 1);
        assert_eq!(lines[0]["width"], 10);
        assert_eq!(lines[0]["buildings"].as_array().unwrap().len(), 1);
        assert_eq!(lines[0]["cells"].as_array().unwrap().len(), 80);
    }

    #[test]
    fn test_tones_reach_sink() {
        let mut config = SimConfig {
            seed: Some(5),
            ..Default::default()
        };
        config.audio.enabled = true;
        let mut sim = Simulation::new(config).unwrap();
        let id = sim
            .place_building(Position::new(4, 4))
            .unwrap()
            .placed()
            .unwrap();
        sim.produce(id).unwrap();

        let mut renderer = JsonLinesRenderer::new(Vec::new());
        let mut tones = LogToneSink::default();
        dispatch_events(&mut sim, &mut renderer, &mut tones).unwrap();
        assert_eq!(tones.played(), 1);
        assert_eq!(renderer.frames(), 2);
    }
}
