//! Component construction by type name
//!
//! Templates refer to components by string. The factory maps those strings
//! to constructors; registration is an explicit step at startup.

use std::fmt;

use rustc_hash::FxHashMap;

use super::component::{Component, ComponentSlot, InitContext};
use super::components::{Camera, InputController, PlayerLogic, Sprite, TileMap, Transform};
use super::entity::EntityId;
use super::world::World;
use crate::assets::{AssetAliases, AssetRegistry, ComponentSpec};

type Constructor = Box<dyn Fn() -> ComponentSlot>;

/// Registry of component constructors keyed by type name
#[derive(Default)]
pub struct ComponentFactory {
    constructors: FxHashMap<String, Constructor>,
}

impl ComponentFactory {
    /// Create an empty factory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory with every built-in component registered
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register_default::<Transform>("Transform");
        factory.register_default::<Camera>("Camera");
        factory.register_default::<Sprite>("Sprite");
        factory.register_default::<TileMap>("TileMap");
        factory.register_default::<InputController>("InputController");
        factory.register_default::<PlayerLogic>("PlayerLogic");
        factory
    }

    /// Register a constructor under `type_name`, replacing any previous one
    pub fn register<T, F>(&mut self, type_name: impl Into<String>, constructor: F)
    where
        T: Component,
        F: Fn() -> T + 'static,
    {
        self.constructors.insert(
            type_name.into(),
            Box::new(move || ComponentSlot::new(constructor()).0),
        );
    }

    /// Register a component constructed through `Default`
    pub fn register_default<T: Component + Default>(&mut self, type_name: impl Into<String>) {
        self.register(type_name, T::default);
    }

    /// Construct a component by type name, logging unknown types
    #[must_use]
    pub fn create(&self, type_name: &str) -> Option<ComponentSlot> {
        match self.constructors.get(type_name) {
            Some(constructor) => Some(constructor()),
            None => {
                log::warn!("Unknown component type '{type_name}'");
                None
            }
        }
    }

    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// Registered type names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build an entity from resolved component specs.
    ///
    /// Each component is constructed and initialized with its configuration
    /// before being attached. Unknown types and failed initializations are
    /// logged and skipped; the entity is still created.
    pub fn build_entity(
        &self,
        world: &mut World,
        specs: &[ComponentSpec],
        assets: &AssetRegistry,
        aliases: &AssetAliases,
        name: Option<&str>,
    ) -> EntityId {
        let id = world.create_object();

        for spec in specs {
            let Some(slot) = self.create(&spec.type_name) else {
                continue;
            };

            let mut ctx = InitContext {
                owner: id,
                config: &spec.data,
                assets,
                aliases,
            };
            match slot.initialize(&mut ctx) {
                Ok(()) => {
                    world.attach_slot(id, slot);
                }
                Err(e) => log::warn!("Skipping component {} on {id}: {e}", spec.type_name),
            }
        }

        if let Some(name) = name {
            world.set_name(id, Some(name.to_string()));
        }
        id
    }
}

impl fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentFactory")
            .field("types", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::ComponentError;
    use serde_json::json;

    #[derive(Default)]
    struct Fragile;

    impl Component for Fragile {
        fn type_name(&self) -> &'static str {
            "Fragile"
        }

        fn initialize(&mut self, _ctx: &mut InitContext<'_>) -> Result<(), ComponentError> {
            Err(ComponentError::InvalidConfig("always broken".into()))
        }
    }

    #[test]
    fn test_builtins_registered() {
        let factory = ComponentFactory::with_builtins();
        for name in ["Transform", "Camera", "Sprite", "TileMap", "InputController", "PlayerLogic"] {
            assert!(factory.contains(name), "{name} missing");
        }
        assert!(factory.create("Nope").is_none());
    }

    #[test]
    fn test_build_entity_skips_unknown_and_failed() {
        let mut factory = ComponentFactory::with_builtins();
        factory.register_default::<Fragile>("Fragile");

        let mut world = World::new();
        let specs = vec![
            ComponentSpec::new("Transform", json!({"position": [3.0, 4.0]})),
            ComponentSpec::new("Mystery", json!({})),
            ComponentSpec::new("Fragile", json!({})),
        ];

        let id = factory.build_entity(
            &mut world,
            &specs,
            &AssetRegistry::new(),
            &AssetAliases::default(),
            Some("crate"),
        );

        let entity = world.get(id).unwrap();
        assert_eq!(entity.components().type_names().collect::<Vec<_>>(), vec!["Transform"]);
        assert_eq!(world.find_by_name("crate"), Some(id));

        let transform = world.component::<Transform>(id).unwrap();
        assert_eq!(transform.borrow().position, glam::Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_custom_constructor() {
        let mut factory = ComponentFactory::new();
        factory.register("Fast", || PlayerLogic { speed: 9.0 });

        let slot = factory.create("Fast").unwrap();
        assert_eq!(slot.type_name(), "PlayerLogic");
        assert_eq!(factory.names(), vec!["Fast"]);
    }
}
