//! Asset manifests
//!
//! A manifest lists the fonts, textures and sounds a scene needs and the
//! objects to instantiate from templates once they are loaded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::data::{DataError, read_structured};
use super::media::DEFAULT_FONT_SIZE;

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

/// A font, texture or sound entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEntry {
    /// Alias components use to refer to this asset
    #[serde(default)]
    pub id: String,
    /// Path relative to the manifest's base path
    #[serde(default)]
    pub path: String,
    /// Point size, fonts only
    #[serde(default = "default_font_size")]
    pub size: u32,
}

impl MediaEntry {
    /// Resolve the entry path against `base`; `None` when the path is empty
    #[must_use]
    pub fn resolve(&self, base: &Path) -> Option<PathBuf> {
        if self.path.trim().is_empty() {
            None
        } else {
            Some(base.join(&self.path))
        }
    }
}

/// An object to instantiate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Template name; empty builds from inline overrides only
    #[serde(default, rename = "type")]
    pub template: String,
    /// Display name for the created entity
    #[serde(default)]
    pub name: Option<String>,
    /// Per-component overrides (`{"components": [{type, data}]}`)
    #[serde(default)]
    pub overrides: Value,
}

impl ObjectEntry {
    /// Entity name from the entry, falling back to `overrides.name`
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or_else(|| self.overrides.get("name").and_then(Value::as_str))
            .filter(|name| !name.is_empty())
    }

    /// Whether the object names a template
    #[must_use]
    pub fn has_template(&self) -> bool {
        !self.template.is_empty()
    }
}

/// Parsed manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub fonts: Vec<MediaEntry>,
    #[serde(default)]
    pub textures: Vec<MediaEntry>,
    #[serde(default)]
    pub sounds: Vec<MediaEntry>,
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
}

impl Manifest {
    /// Load a manifest file (JSON or RON)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let manifest: Self = read_structured(path)?;
        log::info!(
            "Loaded manifest {}: {} fonts, {} textures, {} sounds, {} objects",
            path.display(),
            manifest.fonts.len(),
            manifest.textures.len(),
            manifest.sounds.len(),
            manifest.objects.len()
        );
        Ok(manifest)
    }

    /// Load a manifest, substituting an empty one on failure
    #[must_use]
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            log::error!("Failed to load manifest {}: {e}", path.display());
            Self::default()
        })
    }

    /// Check if the manifest declares nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
            && self.textures.is_empty()
            && self.sounds.is_empty()
            && self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.json");
        std::fs::write(
            &path,
            r#"{
                "fonts": [{"id": "ui", "path": "fonts/ui.ttf"}],
                "textures": [{"id": "hero", "path": "hero.png"}, {"id": "none", "path": ""}],
                "objects": [
                    {"type": "player", "name": "Hero", "overrides": {"components": []}},
                    {"overrides": {"name": "Marker"}}
                ]
            }"#,
        )
        .unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.fonts[0].size, DEFAULT_FONT_SIZE);
        assert!(manifest.sounds.is_empty());

        let base = Path::new("assets");
        assert_eq!(
            manifest.textures[0].resolve(base),
            Some(PathBuf::from("assets/hero.png"))
        );
        assert_eq!(manifest.textures[1].resolve(base), None);

        assert_eq!(manifest.objects[0].display_name(), Some("Hero"));
        assert!(manifest.objects[0].has_template());
        assert_eq!(manifest.objects[1].display_name(), Some("Marker"));
        assert!(!manifest.objects[1].has_template());
    }

    #[test]
    fn test_parse_failure_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[1, 2").unwrap();

        assert!(Manifest::load(&path).is_err());
        assert!(Manifest::load_or_empty(&path).is_empty());
        assert!(Manifest::load_or_empty(dir.path().join("missing.json")).is_empty());
    }

    #[test]
    fn test_object_overrides_default_to_null() {
        let entry: ObjectEntry = serde_json::from_value(json!({"type": "crate"})).unwrap();
        assert_eq!(entry.overrides, Value::Null);
        assert_eq!(entry.display_name(), None);
    }
}
