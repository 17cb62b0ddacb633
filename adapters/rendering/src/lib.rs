#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Firebot adapters.

mod ascii;

use anyhow::Result as AnyResult;
use firebot_core::{ControllerState, FrameSnapshot, ObstacleField, OperatingMode, Position, Rect};
use glam::Vec2;
use serde::Serialize;

pub use ascii::{AsciiBackend, AsciiCanvas, CanvasError};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Accent color of the status badge for a controller state.
#[must_use]
pub fn state_color(state: ControllerState) -> Color {
    match state {
        ControllerState::Idle | ControllerState::Complete => Color::from_rgb_u8(120, 144, 156),
        ControllerState::Detect | ControllerState::Patrolling => Color::from_rgb_u8(66, 165, 245),
        ControllerState::Detected | ControllerState::Verify => Color::from_rgb_u8(255, 202, 40),
        ControllerState::Navigate | ControllerState::Approaching | ControllerState::Aim => {
            Color::from_rgb_u8(255, 112, 67)
        }
        ControllerState::Extinguish | ControllerState::Extinguishing => {
            Color::from_rgb_u8(38, 198, 218)
        }
        ControllerState::LowBattery => Color::from_rgb_u8(239, 83, 80),
    }
}

/// Axis-aligned rectangle in scene space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SceneRect {
    /// Upper-left corner.
    pub origin: Vec2,
    /// Width and height.
    pub size: Vec2,
}

impl SceneRect {
    /// Converts a floor-plan rectangle.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            origin: Vec2::new(rect.x(), rect.y()),
            size: Vec2::new(rect.width(), rect.height()),
        }
    }

    /// Lower-right corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.origin + self.size
    }
}

/// Text shown next to the floor plan.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusLine {
    /// Upper-case controller state label.
    pub state: &'static str,
    /// Badge color of the state.
    pub color: Color,
    /// Active operating mode.
    pub mode: OperatingMode,
    /// Battery charge when the battery model is enabled.
    pub battery: Option<f32>,
    /// Simulated milliseconds elapsed.
    pub elapsed_ms: u64,
}

/// Everything a backend draws for one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scene {
    /// Tick the scene was captured at.
    pub tick: u64,
    /// Extent of the floor plan.
    pub bounds: SceneRect,
    /// Padded obstacles.
    pub obstacles: Vec<SceneRect>,
    /// Robot position.
    pub robot: Vec2,
    /// Fire position when the marker is visible.
    pub fire: Option<Vec2>,
    /// Remaining route waypoints.
    pub waypoints: Vec<Vec2>,
    /// Status text.
    pub status: StatusLine,
}

impl Scene {
    /// Builds a scene from a frame snapshot and the active obstacle field.
    #[must_use]
    pub fn from_frame(frame: &FrameSnapshot, field: &ObstacleField) -> Self {
        Self {
            tick: frame.tick,
            bounds: SceneRect::from_rect(field.bounds()),
            obstacles: field
                .obstacles()
                .iter()
                .copied()
                .map(SceneRect::from_rect)
                .collect(),
            robot: to_vec2(frame.robot),
            fire: frame.fire.filter(|_| frame.fire_visible).map(to_vec2),
            waypoints: frame.waypoints.iter().copied().map(to_vec2).collect(),
            status: StatusLine {
                state: frame.state.label(),
                color: state_color(frame.state),
                mode: frame.mode,
                battery: frame.battery,
                elapsed_ms: frame.elapsed_ms,
            },
        }
    }
}

fn to_vec2(position: Position) -> Vec2 {
    Vec2::new(position.x(), position.y())
}

/// Rendering backend capable of presenting Firebot scenes.
pub trait RenderingBackend {
    /// Presents a single frame.
    fn present(&mut self, scene: &Scene) -> AnyResult<()>;

    /// Flushes buffered output once the run ends.
    fn finish(&mut self) -> AnyResult<()> {
        Ok(())
    }
}
