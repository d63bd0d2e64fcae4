//! Components and per-entity component storage
//!
//! A component is a unit of behavior or data with optional lifecycle hooks.
//! Each entity holds at most one component per concrete type. Components are
//! kept behind shared `Rc<RefCell<_>>` handles so siblings can look each
//! other up during a hook.
//!
//! # Lifecycle
//!
//! 1. `initialize()` - once, with the component's configuration
//! 2. `start()` - once, before the first tick after the entity was added
//! 3. `tick()` / `render()` - every frame while the owning scene is active
//! 4. `shutdown()` - once, when the entity is removed or the component replaced

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use smallvec::SmallVec;

use super::entity::EntityId;
use super::world::World;
use crate::assets::{AssetAliases, AssetId, AssetRegistry};
use crate::input::Input;
use crate::renderer::RenderSurface;

/// Context for `initialize`
pub struct InitContext<'a> {
    /// Entity the component is being attached to
    pub owner: EntityId,
    /// Merged configuration for this instance
    pub config: &'a Value,
    pub assets: &'a AssetRegistry,
    /// Manifest aliases of the owning scene
    pub aliases: &'a AssetAliases,
}

impl InitContext<'_> {
    /// Resolve a manifest alias to a registered asset
    #[must_use]
    pub fn asset(&self, alias: &str) -> Option<AssetId> {
        self.aliases
            .get(alias)
            .copied()
            .filter(|id| self.assets.contains(*id))
    }
}

/// Context for `start` and `tick`
pub struct FrameContext<'a> {
    /// Entity the component belongs to (a weak reference; may be re-resolved)
    pub owner: EntityId,
    pub world: &'a World,
    pub input: &'a Input,
    /// Seconds since the previous frame (zero during `start`)
    pub dt: f32,
}

impl FrameContext<'_> {
    /// Sibling component on the same entity
    #[must_use]
    pub fn sibling<T: Component>(&self) -> Option<Rc<RefCell<T>>> {
        self.world.component::<T>(self.owner)
    }
}

/// Context for `render`
pub struct RenderContext<'a> {
    pub owner: EntityId,
    pub world: &'a World,
    pub assets: &'a AssetRegistry,
    pub surface: &'a mut dyn RenderSurface,
}

impl RenderContext<'_> {
    /// Sibling component on the same entity
    #[must_use]
    pub fn sibling<T: Component>(&self) -> Option<Rc<RefCell<T>>> {
        self.world.component::<T>(self.owner)
    }
}

/// A polymorphic unit of entity behavior
pub trait Component: Any {
    /// Registered type name, as used in templates
    fn type_name(&self) -> &'static str;

    /// Configure from template data
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid; the component is
    /// then not attached.
    fn initialize(&mut self, _ctx: &mut InitContext<'_>) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Called once before the first tick, after all siblings are initialized
    fn start(&mut self, _ctx: &mut FrameContext<'_>) {}

    /// Called every frame
    fn tick(&mut self, _ctx: &mut FrameContext<'_>) {}

    /// Called every frame after all ticks
    fn render(&mut self, _ctx: &mut RenderContext<'_>) {}

    /// Called once when the component leaves its entity
    fn shutdown(&mut self) {}
}

/// Deserialize a component configuration, treating `null` as "all defaults"
///
/// # Errors
///
/// Returns an error if the configuration does not match `T`
pub fn parse_config<T: DeserializeOwned + Default>(config: &Value) -> Result<T, ComponentError> {
    if config.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(config.clone()).map_err(|e| ComponentError::InvalidConfig(e.to_string()))
}

/// Type-erased stored component
pub struct ComponentSlot {
    type_id: TypeId,
    type_name: &'static str,
    /// Dynamic handle used for hook dispatch
    behaviour: Rc<RefCell<dyn Component>>,
    /// Same allocation, kept for typed downcasts
    any: Rc<dyn Any>,
}

impl ComponentSlot {
    /// Wrap a component, returning the slot and a typed handle to it
    pub fn new<T: Component>(component: T) -> (Self, Rc<RefCell<T>>) {
        let type_name = component.type_name();
        let typed = Rc::new(RefCell::new(component));
        let behaviour: Rc<RefCell<dyn Component>> = typed.clone();
        let any: Rc<dyn Any> = typed.clone();

        (
            Self {
                type_id: TypeId::of::<T>(),
                type_name,
                behaviour,
                any,
            },
            typed,
        )
    }

    /// Registered type name of the stored component
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Dynamic handle to the stored component
    #[must_use]
    pub fn handle(&self) -> Rc<RefCell<dyn Component>> {
        Rc::clone(&self.behaviour)
    }

    /// Run the component's `initialize` hook
    ///
    /// # Errors
    ///
    /// Forwards the component's configuration error
    pub fn initialize(&self, ctx: &mut InitContext<'_>) -> Result<(), ComponentError> {
        self.behaviour.borrow_mut().initialize(ctx)
    }

    fn downcast<T: Component>(&self) -> Option<Rc<RefCell<T>>> {
        Rc::clone(&self.any).downcast::<RefCell<T>>().ok()
    }
}

impl fmt::Debug for ComponentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentSlot").field(&self.type_name).finish()
    }
}

/// Components of one entity, at most one per concrete type.
///
/// Iteration (and therefore hook dispatch) follows attachment order. A
/// replacement keeps the position of the component it replaces.
#[derive(Debug, Default)]
pub struct ComponentManager {
    slots: SmallVec<[ComponentSlot; 4]>,
}

impl ComponentManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a component, replacing any existing one of the same type.
    ///
    /// The replaced component is shut down.
    pub fn attach<T: Component>(&mut self, component: T) -> Rc<RefCell<T>> {
        let (slot, typed) = ComponentSlot::new(component);
        self.attach_slot(slot);
        typed
    }

    /// Attach an already wrapped component (see [`Self::attach`])
    pub fn attach_slot(&mut self, slot: ComponentSlot) {
        match self.slots.iter_mut().find(|s| s.type_id == slot.type_id) {
            Some(existing) => {
                let replaced = std::mem::replace(existing, slot);
                log::debug!("Replacing component {}", replaced.type_name);
                replaced.behaviour.borrow_mut().shutdown();
            }
            None => self.slots.push(slot),
        }
    }

    /// Typed lookup
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<Rc<RefCell<T>>> {
        self.slots
            .iter()
            .find(|slot| slot.type_id == TypeId::of::<T>())
            .and_then(ComponentSlot::downcast::<T>)
    }

    /// Check for a component type
    #[must_use]
    pub fn has<T: Component>(&self) -> bool {
        self.slots.iter().any(|slot| slot.type_id == TypeId::of::<T>())
    }

    /// Detach and shut down a component. Returns false if none was attached.
    pub fn remove<T: Component>(&mut self) -> bool {
        let Some(pos) = self
            .slots
            .iter()
            .position(|slot| slot.type_id == TypeId::of::<T>())
        else {
            return false;
        };
        let slot = self.slots.remove(pos);
        slot.behaviour.borrow_mut().shutdown();
        true
    }

    /// Dynamic handles in dispatch order.
    ///
    /// Cloned out so hooks can run while the world is borrowed.
    #[must_use]
    pub fn handles(&self) -> SmallVec<[Rc<RefCell<dyn Component>>; 4]> {
        self.slots.iter().map(ComponentSlot::handle).collect()
    }

    /// Type names in dispatch order
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.slots.iter().map(|slot| slot.type_name)
    }

    /// Shut down and drop every component
    pub fn shutdown_all(&mut self) {
        for slot in self.slots.drain(..) {
            slot.behaviour.borrow_mut().shutdown();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Errors raised by component hooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// Configuration could not be applied
    InvalidConfig(String),
    /// A referenced asset is missing
    MissingAsset(String),
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(e) => write!(f, "invalid configuration: {e}"),
            Self::MissingAsset(alias) => write!(f, "missing asset '{alias}'"),
        }
    }
}

impl std::error::Error for ComponentError {}
