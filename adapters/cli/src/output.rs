//! Machine-readable frame output.

use std::io::Write;

use anyhow::{Context, Result};
use firebot_rendering::{RenderingBackend, Scene};

/// Writes every presented scene as one JSON document per line.
#[derive(Debug)]
pub(crate) struct JsonLinesBackend<W> {
    writer: W,
}

impl<W: Write> JsonLinesBackend<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> RenderingBackend for JsonLinesBackend<W> {
    fn present(&mut self, scene: &Scene) -> Result<()> {
        serde_json::to_writer(&mut self.writer, scene).context("failed to encode scene")?;
        self.writer
            .write_all(b"\n")
            .context("failed to terminate scene line")
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().context("failed to flush json output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firebot_core::{
        ControllerState, FrameSnapshot, ObstacleField, OperatingMode, Position, Rect,
    };

    #[test]
    fn scenes_are_written_one_per_line() {
        let field = ObstacleField::new(Rect::new(0.0, 0.0, 800.0, 600.0), &[], 20.0, 30.0);
        let frame = FrameSnapshot {
            tick: 1,
            elapsed_ms: 16,
            robot: Position::new(40.0, 60.0),
            fire: None,
            fire_visible: false,
            state: ControllerState::LowBattery,
            mode: OperatingMode::Fire,
            battery: Some(20.0),
            waypoints: Vec::new(),
        };
        let scene = Scene::from_frame(&frame, &field);

        let mut buffer = Vec::new();
        {
            let mut backend = JsonLinesBackend::new(&mut buffer);
            backend.present(&scene).expect("encode first frame");
            backend.present(&scene).expect("encode second frame");
            backend.finish().expect("flush");
        }

        let output = String::from_utf8(buffer).expect("utf8 output");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).expect("valid json");
        assert_eq!(value["status"]["state"], "LOW_BATTERY");
        assert_eq!(value["status"]["mode"], "fire");
        assert_eq!(value["robot"][0], 40.0);
    }
}
