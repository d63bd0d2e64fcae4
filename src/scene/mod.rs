//! Scene lifecycle and stack machine
//!
//! Provides:
//! - The [`Scene`] trait and per-scene [`SceneData`]
//! - A [`SceneStack`] that loads, enters, ticks and exits scenes
//! - [`load_scene`], the manifest-driven content load
//! - A [`SceneRegistry`] for constructing scenes by name

mod lifecycle;
mod loading;
mod registry;
mod stack;

pub use lifecycle::{Scene, SceneData, SceneState, Transition};
pub use loading::{SceneLoad, load_scene};
pub use registry::SceneRegistry;
pub use stack::SceneStack;
