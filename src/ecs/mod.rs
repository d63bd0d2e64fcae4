//! Entity and component model
//!
//! Entities are composed at runtime from data templates: a factory turns
//! component type names into instances, which are initialized with their
//! merged configuration and attached to an entity in a [`World`].

mod component;
mod components;
mod entity;
mod factory;
mod world;

pub use component::{
    Component, ComponentError, ComponentManager, ComponentSlot, FrameContext, InitContext,
    RenderContext, parse_config,
};
pub use components::{Camera, InputController, KeyBindings, PlayerLogic, Sprite, TileMap, Transform};
pub use entity::{Entity, EntityId};
pub use factory::ComponentFactory;
pub use world::{ObjectManager, World};
