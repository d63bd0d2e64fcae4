//! Data templates
//!
//! A template is a named recipe: an ordered list of component type names with
//! the configuration each component receives at initialization. Templates are
//! immutable once loaded and shared by every entity built from them.

use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::data::{DataError, read_structured};
use super::handle::{Asset, AssetKind};

/// One component entry of a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Registered component type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Configuration handed to the component's initialize hook
    #[serde(default)]
    pub data: Value,
}

impl ComponentSpec {
    pub fn new(type_name: impl Into<String>, data: Value) -> Self {
        Self {
            type_name: type_name.into(),
            data,
        }
    }
}

/// A loaded template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataAsset {
    /// Template name (defaults to the name it was requested under)
    #[serde(default)]
    pub name: String,
    /// Components in declaration order
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
}

impl DataAsset {
    /// Load a template file (JSON or RON)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_path(name: &str, path: impl AsRef<Path>) -> Result<Self, DataError> {
        let mut asset: Self = read_structured(path)?;
        if asset.name.is_empty() {
            asset.name = name.to_string();
        }
        Ok(asset)
    }

    /// Component list with per-instance overrides applied
    #[must_use]
    pub fn resolve(&self, overrides: &Value) -> Vec<ComponentSpec> {
        resolve_components(&self.components, overrides)
    }
}

impl Asset for DataAsset {
    const KIND: AssetKind = AssetKind::Data;
}

/// Deep-merge `overrides` into `base`.
///
/// Object keys in `overrides` replace keys in `base`; nested objects merge
/// recursively; scalars and arrays replace wholesale. A non-object override
/// leaves `base` unchanged.
#[must_use]
pub fn merge_values(base: &Value, overrides: &Value) -> Value {
    let Value::Object(over) = overrides else {
        return base.clone();
    };
    let Value::Object(base_map) = base else {
        return overrides.clone();
    };

    let mut merged: Map<String, Value> = base_map.clone();
    for (key, value) in over {
        let next = match (merged.get(key), value) {
            (Some(existing @ Value::Object(_)), Value::Object(_)) => merge_values(existing, value),
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    Value::Object(merged)
}

/// Apply an object's `overrides` to a base component list.
///
/// `overrides` is an object whose `components` array holds `{type, data}`
/// entries. An entry whose type matches a base component deep-merges into it;
/// an unmatched entry is appended as a new component.
#[must_use]
pub fn resolve_components(base: &[ComponentSpec], overrides: &Value) -> Vec<ComponentSpec> {
    let mut components = base.to_vec();

    let Some(entries) = overrides.get("components").and_then(Value::as_array) else {
        return components;
    };

    for entry in entries {
        let spec: ComponentSpec = match serde_json::from_value(entry.clone()) {
            Ok(spec) => spec,
            Err(e) => {
                log::warn!("Ignoring malformed component override {entry}: {e}");
                continue;
            }
        };

        match components
            .iter_mut()
            .find(|existing| existing.type_name == spec.type_name)
        {
            Some(existing) => existing.data = merge_values(&existing.data, &spec.data),
            None => components.push(spec),
        }
    }

    components
}

/// Name-keyed cache of loaded templates.
///
/// Templates are global: loaded once and kept for the life of the registry.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: FxHashMap<String, Arc<DataAsset>>,
}

impl TemplateRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a template, replacing any previous one with the same name
    pub fn store(&mut self, name: impl Into<String>, template: DataAsset) -> Arc<DataAsset> {
        let template = Arc::new(template);
        self.templates.insert(name.into(), Arc::clone(&template));
        template
    }

    /// Look up a template, logging a miss
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<DataAsset>> {
        let found = self.templates.get(name).cloned();
        if found.is_none() {
            log::warn!("Data template '{name}' not found");
        }
        found
    }

    /// Check for a template without logging
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_replaces_and_keeps() {
        let base = json!({"data": {"x": 1, "y": 2}});
        let over = json!({"data": {"x": 5}});
        assert_eq!(merge_values(&base, &over), json!({"data": {"x": 5, "y": 2}}));
    }

    #[test]
    fn test_merge_non_object_override_is_noop() {
        let base = json!({"x": 1});
        assert_eq!(merge_values(&base, &json!(7)), base);
        assert_eq!(merge_values(&base, &json!([1, 2])), base);
        assert_eq!(merge_values(&base, &Value::Null), base);
    }

    #[test]
    fn test_merge_arrays_replace_wholesale() {
        let base = json!({"tiles": [1, 2, 3], "nested": {"a": {"b": 1, "c": 2}}});
        let over = json!({"tiles": [9], "nested": {"a": {"c": 3}}});
        assert_eq!(
            merge_values(&base, &over),
            json!({"tiles": [9], "nested": {"a": {"b": 1, "c": 3}}})
        );
    }

    #[test]
    fn test_resolve_matches_by_type_and_appends() {
        let template = DataAsset {
            name: "player".into(),
            components: vec![
                ComponentSpec::new("Transform", json!({"position": [0.0, 0.0]})),
                ComponentSpec::new("Sprite", json!({"texture": "hero", "visible": true})),
            ],
        };
        let overrides = json!({
            "components": [
                {"type": "Transform", "data": {"position": [4.0, 2.0]}},
                {"type": "PlayerLogic", "data": {"speed": 3.0}}
            ]
        });

        let resolved = template.resolve(&overrides);
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].data, json!({"position": [4.0, 2.0]}));
        assert_eq!(resolved[1], template.components[1]);
        assert_eq!(resolved[2].type_name, "PlayerLogic");
    }

    #[test]
    fn test_resolve_without_overrides() {
        let base = vec![ComponentSpec::new("Transform", json!({}))];
        assert_eq!(resolve_components(&base, &Value::Null), base);
    }

    #[test]
    fn test_template_from_file_takes_request_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crate.json");
        std::fs::write(
            &path,
            r#"{"components": [{"type": "Transform", "data": {"position": [1, 2]}}]}"#,
        )
        .unwrap();

        let asset = DataAsset::from_path("crate", &path).unwrap();
        assert_eq!(asset.name, "crate");
        assert_eq!(asset.components.len(), 1);
        assert_eq!(asset.components[0].type_name, "Transform");
    }

    #[test]
    fn test_registry_store_get() {
        let mut registry = TemplateRegistry::new();
        assert!(registry.get("enemy").is_none());

        registry.store("enemy", DataAsset::default());
        assert!(registry.contains("enemy"));
        assert!(registry.get("enemy").is_some());
        assert_eq!(registry.len(), 1);
    }
}
