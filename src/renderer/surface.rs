//! Render surface abstraction
//!
//! Components describe what to draw as [`DrawCommand`]s; a backend behind
//! [`RenderSurface`] turns them into pixels.

use glam::Vec2;

use crate::assets::AssetId;

/// One draw request
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Set the view for the following commands
    Camera { position: Vec2, zoom: f32 },
    /// Draw a whole texture
    Sprite {
        texture: AssetId,
        position: Vec2,
        rotation: f32,
        scale: Vec2,
        tint: [f32; 4],
    },
    /// Draw one cell of a tileset texture
    Tile {
        texture: AssetId,
        tile: u32,
        position: Vec2,
        size: Vec2,
    },
}

/// Destination for draw commands
pub trait RenderSurface {
    /// Called once before the active scene renders
    fn begin_frame(&mut self) {}

    fn draw(&mut self, command: DrawCommand);

    /// Called once after the active scene rendered
    fn end_frame(&mut self) {}
}

/// Surface that keeps the commands of the last frame.
///
/// Used by the headless runtime and by tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    frames: u64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last `begin_frame`
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of completed frames
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderSurface for RecordingSurface {
    fn begin_frame(&mut self) {
        self.commands.clear();
    }

    fn draw(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    fn end_frame(&mut self) {
        self.frames += 1;
    }
}
