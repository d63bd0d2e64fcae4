//! A scene and asset lifecycle runtime
//!
//! This crate provides:
//! - Concurrent batch loading of textures, fonts, sounds and data templates
//! - A reference-counted asset registry with path deduplication
//! - Entities composed at runtime from data templates
//! - A scene stack that loads, enters, ticks and exits scenes

pub mod assets;
pub mod core;
pub mod ecs;
pub mod input;
pub mod renderer;
pub mod scene;
pub mod task;

// Re-exports for convenience
pub use glam;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::assets::{AssetId, AssetLoader, AssetRegistry, ComponentSpec, Manifest};
    pub use crate::core::{EngineConfig, EngineContext, Runtime};
    pub use crate::ecs::{
        Component, ComponentError, ComponentFactory, EntityId, FrameContext, InitContext,
        RenderContext, Transform, World,
    };
    pub use crate::input::{Input, InputSource, Key, ScriptedInput};
    pub use crate::renderer::{DrawCommand, RecordingSurface, RenderSurface};
    pub use crate::scene::{Scene, SceneData, SceneStack, Transition};
    pub use crate::task::Deferred;
    pub use glam::Vec2;
}
