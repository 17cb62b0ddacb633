//! Character-grid rasterizer for terminals and logs.

use std::io::Write;

use anyhow::{Context, Result as AnyResult};
use glam::Vec2;
use thiserror::Error;

use crate::{RenderingBackend, Scene, SceneRect};

const EMPTY: char = ' ';
const OBSTACLE: char = '#';
const WAYPOINT: char = '.';
const FIRE: char = 'F';
const ROBOT: char = 'R';

/// Errors raised while configuring a canvas.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanvasError {
    /// Both dimensions must be positive.
    #[error("canvas must have positive dimensions (received {columns}x{rows})")]
    InvalidSize {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
}

/// Fixed-size character grid the floor plan is scaled onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AsciiCanvas {
    columns: u32,
    rows: u32,
}

impl AsciiCanvas {
    /// Creates a canvas with the provided dimensions in characters.
    pub fn new(columns: u32, rows: u32) -> Result<Self, CanvasError> {
        if columns == 0 || rows == 0 {
            return Err(CanvasError::InvalidSize { columns, rows });
        }
        Ok(Self { columns, rows })
    }

    /// Number of character columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of character rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Rasterizes the scene followed by a one-line status footer.
    #[must_use]
    pub fn render(&self, scene: &Scene) -> String {
        let mut cells = vec![EMPTY; (self.columns * self.rows) as usize];

        for obstacle in &scene.obstacles {
            self.fill(&mut cells, scene.bounds, obstacle);
        }
        for waypoint in &scene.waypoints {
            self.plot(&mut cells, scene.bounds, *waypoint, WAYPOINT);
        }
        if let Some(fire) = scene.fire {
            self.plot(&mut cells, scene.bounds, fire, FIRE);
        }
        self.plot(&mut cells, scene.bounds, scene.robot, ROBOT);

        let mut output = String::with_capacity(cells.len() + self.rows as usize * 3 + 64);
        let border = "-".repeat(self.columns as usize);
        output.push('+');
        output.push_str(&border);
        output.push_str("+\n");
        for row in cells.chunks(self.columns as usize) {
            output.push('|');
            output.extend(row.iter());
            output.push_str("|\n");
        }
        output.push('+');
        output.push_str(&border);
        output.push_str("+\n");
        output.push_str(&status_footer(scene));
        output
    }

    fn cell_of(&self, bounds: SceneRect, point: Vec2) -> Option<(u32, u32)> {
        let relative = (point - bounds.origin) / bounds.size;
        if !(0.0..1.0).contains(&relative.x) || !(0.0..1.0).contains(&relative.y) {
            return None;
        }
        let column = (relative.x * self.columns as f32) as u32;
        let row = (relative.y * self.rows as f32) as u32;
        Some((column.min(self.columns - 1), row.min(self.rows - 1)))
    }

    fn plot(&self, cells: &mut [char], bounds: SceneRect, point: Vec2, glyph: char) {
        if let Some((column, row)) = self.cell_of(bounds, point) {
            cells[(row * self.columns + column) as usize] = glyph;
        }
    }

    fn fill(&self, cells: &mut [char], bounds: SceneRect, rect: &SceneRect) {
        let scale = Vec2::new(self.columns as f32, self.rows as f32) / bounds.size;
        let min = ((rect.origin - bounds.origin) * scale).max(Vec2::ZERO);
        let max = ((rect.max() - bounds.origin) * scale)
            .min(Vec2::new(self.columns as f32, self.rows as f32));

        for row in min.y.floor() as u32..max.y.ceil() as u32 {
            for column in min.x.floor() as u32..max.x.ceil() as u32 {
                cells[(row * self.columns + column) as usize] = OBSTACLE;
            }
        }
    }
}

fn status_footer(scene: &Scene) -> String {
    let status = &scene.status;
    let seconds = status.elapsed_ms as f32 / 1000.0;
    let mut footer = format!(
        "[{}] mode={} t={seconds:.1}s tick={}",
        status.state, status.mode, scene.tick
    );
    if let Some(battery) = status.battery {
        footer.push_str(&format!(" battery={battery:.0}%"));
    }
    footer.push('\n');
    footer
}

/// Backend that writes each frame as ASCII art.
#[derive(Debug)]
pub struct AsciiBackend<W> {
    canvas: AsciiCanvas,
    writer: W,
}

impl<W: Write> AsciiBackend<W> {
    /// Creates a backend drawing onto `canvas` and writing to `writer`.
    pub fn new(canvas: AsciiCanvas, writer: W) -> Self {
        Self { canvas, writer }
    }

    /// Consumes the backend and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderingBackend for AsciiBackend<W> {
    fn present(&mut self, scene: &Scene) -> AnyResult<()> {
        self.writer
            .write_all(self.canvas.render(scene).as_bytes())
            .context("failed to write ascii frame")
    }

    fn finish(&mut self) -> AnyResult<()> {
        self.writer.flush().context("failed to flush ascii output")
    }
}
