//! Scene trait and per-scene runtime data
//!
//! A scene is one pushable application state (menu, editor, play). The
//! [`Scene`] implementation carries scene-specific behavior; the stack keeps
//! the [`SceneData`] it owns alongside it.
//!
//! # Lifecycle
//!
//! 1. Manifest load (blocking; assets, templates, entities)
//! 2. `on_load()` - after the manifest's entities exist
//! 3. `on_enter()` - once, right after loading completes
//! 4. `tick()` / `render()` - every frame while on top of the stack
//! 5. `on_exit()` - before the world is cleared and assets are released

use std::fmt;
use std::path::PathBuf;

use crate::assets::{AssetAliases, AssetId, AssetRegistry};
use crate::core::EngineContext;
use crate::ecs::World;
use crate::renderer::RenderSurface;

/// Where a scene is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneState {
    Created,
    Loading,
    Loaded,
    Entered,
    Exiting,
    Exited,
}

impl fmt::Display for SceneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Runtime record of one scene on the stack
#[derive(Debug)]
pub struct SceneData {
    pub name: String,
    pub world: World,
    /// Every asset id registered while loading, one entry per reference held
    pub loaded_assets: Vec<AssetId>,
    /// Manifest alias table
    pub aliases: AssetAliases,
    pub state: SceneState,
}

impl SceneData {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            world: World::new(),
            loaded_assets: Vec::new(),
            aliases: AssetAliases::default(),
            state: SceneState::Created,
        }
    }

    /// Resolve a manifest alias
    #[must_use]
    pub fn asset(&self, alias: &str) -> Option<AssetId> {
        self.aliases.get(alias).copied()
    }
}

/// Stack change requested by the active scene's tick
pub enum Transition {
    /// Stay on the current scene
    None,
    /// Load and enter a scene on top of this one
    Push(Box<dyn Scene>),
    /// Exit this scene at the end of the frame
    Pop,
    /// Exit this scene and push another in its place
    Replace(Box<dyn Scene>),
}

impl Transition {
    /// Create a push transition
    pub fn push<S: Scene + 'static>(scene: S) -> Self {
        Transition::Push(Box::new(scene))
    }

    /// Create a replace transition
    pub fn replace<S: Scene + 'static>(scene: S) -> Self {
        Transition::Replace(Box::new(scene))
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::None => write!(f, "Transition::None"),
            Transition::Push(scene) => write!(f, "Transition::Push({})", scene.name()),
            Transition::Pop => write!(f, "Transition::Pop"),
            Transition::Replace(scene) => write!(f, "Transition::Replace({})", scene.name()),
        }
    }
}

/// Behavior of one kind of scene
pub trait Scene {
    /// Scene name for logging
    fn name(&self) -> &str;

    /// Manifest to load before entering, relative to the asset root
    fn manifest(&self) -> Option<PathBuf> {
        None
    }

    /// Called after the manifest's assets and entities are in place
    fn on_load(&mut self, _data: &mut SceneData, _ctx: &mut EngineContext) {}

    /// Called once when the scene becomes active after loading
    fn on_enter(&mut self, _data: &mut SceneData, _ctx: &mut EngineContext) {}

    /// Called every frame after the scene's world has ticked
    fn tick(&mut self, _data: &mut SceneData, _ctx: &mut EngineContext) -> Transition {
        Transition::None
    }

    /// Called every frame after the scene's world has rendered
    fn render(
        &mut self,
        _data: &SceneData,
        _assets: &AssetRegistry,
        _surface: &mut dyn RenderSurface,
    ) {
    }

    /// Scene-specific teardown; the world is cleared and assets released
    /// afterwards
    fn on_exit(&mut self, _data: &mut SceneData, _ctx: &mut EngineContext) {}
}
