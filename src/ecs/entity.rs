//! Entities
//!
//! An entity is an optional name plus a set of components. Entities are
//! addressed by generational ids, so an id held after its entity was removed
//! resolves to nothing instead of to whatever reused the slot.

use std::fmt;

use super::component::ComponentManager;

/// Generational entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when this id was issued
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// A world object: display name plus components
#[derive(Debug, Default)]
pub struct Entity {
    pub(crate) name: Option<String>,
    pub(crate) components: ComponentManager,
}

impl Entity {
    /// Create an anonymous entity with no components
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity that will be registered under `name`
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Attached components
    #[must_use]
    pub fn components(&self) -> &ComponentManager {
        &self.components
    }

    /// Attached components, mutably
    pub fn components_mut(&mut self) -> &mut ComponentManager {
        &mut self.components
    }
}
