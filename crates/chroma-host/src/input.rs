//! Click events read from the host's input stream.

use anyhow::{bail, Context, Result};
use chroma_core::PixelPoint;

/// Parse one input line into a click.
///
/// Accepts `x y`, `x,y` or a JSON object `{"x": .., "y": ..}`. Blank lines
/// and `#` comments yield `None`.
pub fn parse_click(line: &str) -> Result<Option<PixelPoint>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    if line.starts_with('{') {
        let point: PixelPoint =
            serde_json::from_str(line).with_context(|| format!("invalid click object {line:?}"))?;
        return finite(point);
    }

    let parts: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    let [x, y] = parts.as_slice() else {
        bail!("expected two coordinates, got {line:?}");
    };

    let x: f64 = x.parse().with_context(|| format!("invalid x coordinate {x:?}"))?;
    let y: f64 = y.parse().with_context(|| format!("invalid y coordinate {y:?}"))?;
    finite(PixelPoint::new(x, y))
}

fn finite(point: PixelPoint) -> Result<Option<PixelPoint>> {
    if !point.is_finite() {
        bail!("click coordinates must be finite, got ({}, {})", point.x, point.y);
    }
    Ok(Some(point))
}
