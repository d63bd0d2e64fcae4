//! Scene construction by name

use std::fmt;

use rustc_hash::FxHashMap;

use super::lifecycle::Scene;

type SceneConstructor = Box<dyn Fn() -> Box<dyn Scene>>;

/// Registry of scene constructors keyed by name
#[derive(Default)]
pub struct SceneRegistry {
    constructors: FxHashMap<String, SceneConstructor>,
}

impl SceneRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under `name`, replacing any previous one
    pub fn register<S, F>(&mut self, name: impl Into<String>, constructor: F)
    where
        S: Scene + 'static,
        F: Fn() -> S + 'static,
    {
        self.constructors.insert(
            name.into(),
            Box::new(move || Box::new(constructor()) as Box<dyn Scene>),
        );
    }

    /// Construct a scene by name, logging unknown names
    #[must_use]
    pub fn create(&self, name: &str) -> Option<Box<dyn Scene>> {
        match self.constructors.get(name) {
            Some(constructor) => Some(constructor()),
            None => {
                log::warn!("Unknown scene '{name}'");
                None
            }
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered scene names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for SceneRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneRegistry")
            .field("scenes", &self.names())
            .finish()
    }
}
