//! Asset and resource management system
//!
//! Provides:
//! - Opaque asset identifiers and type tags
//! - A reference-counted, path-deduplicated registry
//! - Concurrent batch loading of textures, fonts, sounds and data templates
//! - Manifests describing what a scene needs

mod data;
mod handle;
mod loader;
mod manifest;
mod media;
mod storage;
mod template;

pub use data::{DataError, read_structured};
pub use handle::{Asset, AssetAliases, AssetId, AssetKind};
pub use loader::{AssetLoader, LoadFailure, LoadProgress, LoadReport, LoadRequest};
pub use manifest::{Manifest, MediaEntry, ObjectEntry};
pub use media::{AssetError, AssetPayload, DEFAULT_FONT_SIZE, Font, LoadedAsset, Sound, Texture};
pub use storage::{AssetMeta, AssetRegistry};
pub use template::{ComponentSpec, DataAsset, TemplateRegistry, merge_values, resolve_components};

#[cfg(test)]
pub(crate) use media::fixtures;
