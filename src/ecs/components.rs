//! Built-in components
//!
//! Each one reads its configuration from template data with serde. Missing
//! fields fall back to defaults.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::component::{
    Component, ComponentError, FrameContext, InitContext, RenderContext, parse_config,
};
use super::entity::EntityId;
use crate::assets::AssetId;
use crate::input::Key;
use crate::renderer::DrawCommand;

/// Position, rotation and scale in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec2,
    /// Rotation in radians
    pub rotation: f32,
    pub scale: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }
}

impl Transform {
    /// Create a transform with just a position
    #[must_use]
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Translate by a delta
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }
}

impl Component for Transform {
    fn type_name(&self) -> &'static str {
        "Transform"
    }

    fn initialize(&mut self, ctx: &mut InitContext<'_>) -> Result<(), ComponentError> {
        *self = parse_config(ctx.config)?;
        Ok(())
    }
}

// ============================================================================
// Camera
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct CameraConfig {
    /// Name of the entity to follow
    target: Option<String>,
    zoom: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            target: None,
            zoom: 1.0,
        }
    }
}

/// 2D view that optionally follows a named entity.
///
/// The target is held by name and re-resolved every tick, so a removed
/// target simply stops being followed.
#[derive(Debug, Clone)]
pub struct Camera {
    pub target: Option<String>,
    pub zoom: f32,
    pub position: Vec2,
    /// Entity followed during the last tick
    followed: Option<EntityId>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            target: None,
            zoom: 1.0,
            position: Vec2::ZERO,
            followed: None,
        }
    }
}

impl Camera {
    /// Entity followed during the last tick, if it was found
    #[must_use]
    pub fn followed(&self) -> Option<EntityId> {
        self.followed
    }
}

impl Component for Camera {
    fn type_name(&self) -> &'static str {
        "Camera"
    }

    fn initialize(&mut self, ctx: &mut InitContext<'_>) -> Result<(), ComponentError> {
        let config: CameraConfig = parse_config(ctx.config)?;
        if config.zoom <= 0.0 {
            return Err(ComponentError::InvalidConfig(format!(
                "zoom must be positive, got {}",
                config.zoom
            )));
        }
        self.target = config.target;
        self.zoom = config.zoom;
        Ok(())
    }

    fn tick(&mut self, ctx: &mut FrameContext<'_>) {
        let source = match self.target.as_deref() {
            Some(name) => ctx.world.find_by_name(name),
            None => Some(ctx.owner),
        };

        self.followed = None;
        let Some(id) = source else {
            return;
        };
        let Some(transform) = ctx.world.component::<Transform>(id) else {
            return;
        };
        if let Ok(transform) = transform.try_borrow() {
            self.position = transform.position;
            self.followed = Some(id);
        }
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        ctx.surface.draw(DrawCommand::Camera {
            position: self.position,
            zoom: self.zoom,
        });
    }
}

// ============================================================================
// Sprite
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct SpriteConfig {
    /// Manifest alias of the texture
    texture: String,
    tint: [f32; 4],
    visible: bool,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            texture: String::new(),
            tint: [1.0; 4],
            visible: true,
        }
    }
}

/// Draws a texture at the sibling [`Transform`]
#[derive(Debug, Clone)]
pub struct Sprite {
    /// Alias the texture was requested under
    pub alias: String,
    pub texture: Option<AssetId>,
    pub tint: [f32; 4],
    pub visible: bool,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            alias: String::new(),
            texture: None,
            tint: [1.0; 4],
            visible: true,
        }
    }
}

impl Component for Sprite {
    fn type_name(&self) -> &'static str {
        "Sprite"
    }

    fn initialize(&mut self, ctx: &mut InitContext<'_>) -> Result<(), ComponentError> {
        let config: SpriteConfig = parse_config(ctx.config)?;
        self.texture = ctx.asset(&config.texture);
        if self.texture.is_none() && !config.texture.is_empty() {
            log::warn!(
                "Sprite on {}: texture '{}' is not loaded",
                ctx.owner,
                config.texture
            );
        }
        self.alias = config.texture;
        self.tint = config.tint;
        self.visible = config.visible;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        if !self.visible {
            return;
        }
        let Some(texture) = self.texture.filter(|id| ctx.assets.contains(*id)) else {
            return;
        };
        let transform = ctx
            .sibling::<Transform>()
            .and_then(|t| t.try_borrow().ok().map(|t| *t))
            .unwrap_or_default();

        ctx.surface.draw(DrawCommand::Sprite {
            texture,
            position: transform.position,
            rotation: transform.rotation,
            scale: transform.scale,
            tint: self.tint,
        });
    }
}

// ============================================================================
// TileMap
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct TileMapConfig {
    tileset: String,
    tile_size: Vec2,
    /// Rows of tile indices; negative cells are empty
    tiles: Vec<Vec<i32>>,
}

impl Default for TileMapConfig {
    fn default() -> Self {
        Self {
            tileset: String::new(),
            tile_size: Vec2::splat(16.0),
            tiles: Vec::new(),
        }
    }
}

/// Grid of tiles drawn from one tileset texture
#[derive(Debug, Clone, Default)]
pub struct TileMap {
    pub tileset: Option<AssetId>,
    pub tile_size: Vec2,
    pub tiles: Vec<Vec<i32>>,
}

impl TileMap {
    /// Tile index at a grid cell, `None` when out of range or empty
    #[must_use]
    pub fn tile(&self, column: usize, row: usize) -> Option<u32> {
        self.tiles
            .get(row)
            .and_then(|cells| cells.get(column))
            .and_then(|tile| u32::try_from(*tile).ok())
    }
}

impl Component for TileMap {
    fn type_name(&self) -> &'static str {
        "TileMap"
    }

    fn initialize(&mut self, ctx: &mut InitContext<'_>) -> Result<(), ComponentError> {
        let config: TileMapConfig = parse_config(ctx.config)?;
        let tileset = ctx
            .asset(&config.tileset)
            .ok_or_else(|| ComponentError::MissingAsset(config.tileset.clone()))?;

        self.tileset = Some(tileset);
        self.tile_size = config.tile_size;
        self.tiles = config.tiles;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let Some(texture) = self.tileset.filter(|id| ctx.assets.contains(*id)) else {
            return;
        };
        let origin = ctx
            .sibling::<Transform>()
            .and_then(|t| t.try_borrow().ok().map(|t| t.position))
            .unwrap_or(Vec2::ZERO);

        for (row, cells) in self.tiles.iter().enumerate() {
            for (column, tile) in cells.iter().enumerate() {
                let Ok(tile) = u32::try_from(*tile) else {
                    continue;
                };
                ctx.surface.draw(DrawCommand::Tile {
                    texture,
                    tile,
                    position: origin + Vec2::new(column as f32, row as f32) * self.tile_size,
                    size: self.tile_size,
                });
            }
        }
    }
}

// ============================================================================
// Input controller
// ============================================================================

/// Keys mapped to each movement direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub up: Vec<Key>,
    pub down: Vec<Key>,
    pub left: Vec<Key>,
    pub right: Vec<Key>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            up: vec![Key::W, Key::Up],
            down: vec![Key::S, Key::Down],
            left: vec![Key::A, Key::Left],
            right: vec![Key::D, Key::Right],
        }
    }
}

/// Turns pressed keys into a movement axis.
///
/// Y grows downward, matching screen space.
#[derive(Debug, Clone, Default)]
pub struct InputController {
    pub bindings: KeyBindings,
    axis: Vec2,
}

impl InputController {
    /// Movement axis computed on the last tick, length at most 1
    #[must_use]
    pub fn axis(&self) -> Vec2 {
        self.axis
    }
}

impl Component for InputController {
    fn type_name(&self) -> &'static str {
        "InputController"
    }

    fn initialize(&mut self, ctx: &mut InitContext<'_>) -> Result<(), ComponentError> {
        #[derive(Deserialize, Default)]
        #[serde(default)]
        struct Config {
            bindings: KeyBindings,
        }

        let config: Config = parse_config(ctx.config)?;
        self.bindings = config.bindings;
        Ok(())
    }

    fn tick(&mut self, ctx: &mut FrameContext<'_>) {
        let input = ctx.input;
        let held = |keys: &[Key]| if input.any_pressed(keys) { 1.0 } else { 0.0 };

        let axis = Vec2::new(
            held(&self.bindings.right) - held(&self.bindings.left),
            held(&self.bindings.down) - held(&self.bindings.up),
        );
        self.axis = if axis.length_squared() > 1.0 {
            axis.normalize()
        } else {
            axis
        };
    }
}

// ============================================================================
// Player logic
// ============================================================================

/// Moves the sibling [`Transform`] along the sibling [`InputController`]
/// axis.
///
/// Reads the axis computed this frame when the controller was attached
/// first, otherwise last frame's.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerLogic {
    /// Units per second
    pub speed: f32,
}

impl Default for PlayerLogic {
    fn default() -> Self {
        Self { speed: 100.0 }
    }
}

impl Component for PlayerLogic {
    fn type_name(&self) -> &'static str {
        "PlayerLogic"
    }

    fn initialize(&mut self, ctx: &mut InitContext<'_>) -> Result<(), ComponentError> {
        *self = parse_config(ctx.config)?;
        Ok(())
    }

    fn tick(&mut self, ctx: &mut FrameContext<'_>) {
        let Some(controller) = ctx.sibling::<InputController>() else {
            return;
        };
        let Some(transform) = ctx.sibling::<Transform>() else {
            return;
        };

        let axis = controller.borrow().axis();
        if axis != Vec2::ZERO {
            transform
                .borrow_mut()
                .translate(axis * self.speed * ctx.dt);
        }
    }
}
