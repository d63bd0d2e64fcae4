//! Reference-counted asset registry
//!
//! Provides centralized storage for loaded assets with path-based
//! deduplication. Every unique source path owns exactly one entry; storing
//! the same path again bumps its reference count.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::handle::{Asset, AssetId, AssetKind};
use super::media::AssetPayload;

/// Metadata recorded for every registered asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMeta {
    /// Type of the payload
    pub kind: AssetKind,
    /// Path the asset was loaded from
    pub path: PathBuf,
}

/// Type-erased asset entry
struct AssetEntry {
    /// The asset data (type-erased, shared with every caller of `get`)
    data: Arc<dyn Any + Send + Sync>,
    /// Number of outstanding holders, always at least one
    ref_count: usize,
    meta: AssetMeta,
}

/// Process-wide store of loaded assets.
///
/// Mutation (`store`, `retain`, `release`) is expected from the main thread
/// only. Lookups hand out `Arc` clones, so a payload stays alive for as long
/// as any caller still holds it even after the entry is released.
#[derive(Default)]
pub struct AssetRegistry {
    /// Assets indexed by identifier
    assets: FxHashMap<AssetId, AssetEntry>,
    /// Path to identifier mapping for deduplication
    path_to_id: FxHashMap<PathBuf, AssetId>,
}

impl AssetRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset loaded from `path`.
    ///
    /// If the path is already registered, its reference count is incremented
    /// and the existing id is returned; the new payload is dropped.
    pub fn store<A: Asset>(&mut self, asset: A, path: impl AsRef<Path>) -> AssetId {
        let path = path.as_ref();

        if let Some(id) = self.retain_path(path) {
            return id;
        }

        let id = AssetId::next();
        self.path_to_id.insert(path.to_path_buf(), id);
        self.assets.insert(
            id,
            AssetEntry {
                data: Arc::new(asset),
                ref_count: 1,
                meta: AssetMeta {
                    kind: A::KIND,
                    path: path.to_path_buf(),
                },
            },
        );

        log::debug!("Registered {} {} from {}", A::KIND, id, path.display());
        id
    }

    /// Register a decoded media payload
    pub fn store_payload(&mut self, payload: AssetPayload, path: impl AsRef<Path>) -> AssetId {
        match payload {
            AssetPayload::Texture(texture) => self.store(texture, path),
            AssetPayload::Font(font) => self.store(font, path),
            AssetPayload::Sound(sound) => self.store(sound, path),
        }
    }

    fn retain_path(&mut self, path: &Path) -> Option<AssetId> {
        let id = *self.path_to_id.get(path)?;
        let entry = self.assets.get_mut(&id)?;
        entry.ref_count += 1;
        Some(id)
    }

    /// Add a holder to an existing entry.
    ///
    /// Returns false if the id is not registered.
    pub fn retain(&mut self, id: AssetId) -> bool {
        match self.assets.get_mut(&id) {
            Some(entry) => {
                entry.ref_count += 1;
                true
            }
            None => false,
        }
    }

    /// Typed lookup.
    ///
    /// Returns `None` if the id is absent or was registered as another type.
    #[must_use]
    pub fn get<A: Asset>(&self, id: AssetId) -> Option<Arc<A>> {
        let entry = self.assets.get(&id)?;
        Arc::clone(&entry.data).downcast::<A>().ok()
    }

    /// Drop one holder of `id`.
    ///
    /// At zero the payload is unloaded and every index entry is erased.
    /// Returns the remaining count, or `None` for an unknown id (a no-op).
    pub fn release(&mut self, id: AssetId) -> Option<usize> {
        let entry = self.assets.get_mut(&id)?;
        entry.ref_count -= 1;

        if entry.ref_count > 0 {
            return Some(entry.ref_count);
        }

        if let Some(entry) = self.assets.remove(&id) {
            self.path_to_id.remove(&entry.meta.path);
            log::debug!(
                "Unloaded {} {} ({})",
                entry.meta.kind,
                id,
                entry.meta.path.display()
            );
        }
        Some(0)
    }

    /// Identifier registered for a path
    #[must_use]
    pub fn id_for_path(&self, path: impl AsRef<Path>) -> Option<AssetId> {
        self.path_to_id.get(path.as_ref()).copied()
    }

    /// Metadata of an entry
    #[must_use]
    pub fn meta(&self, id: AssetId) -> Option<&AssetMeta> {
        self.assets.get(&id).map(|entry| &entry.meta)
    }

    /// Current reference count of an entry
    #[must_use]
    pub fn ref_count(&self, id: AssetId) -> Option<usize> {
        self.assets.get(&id).map(|entry| entry.ref_count)
    }

    /// Check if an id is registered
    #[must_use]
    pub fn contains(&self, id: AssetId) -> bool {
        self.assets.contains_key(&id)
    }

    /// Get the number of stored assets
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Unload everything regardless of reference counts
    pub fn clear(&mut self) {
        if !self.assets.is_empty() {
            log::info!("Unloading {} remaining assets", self.assets.len());
        }
        self.assets.clear();
        self.path_to_id.clear();
    }

    /// Iterate over registered ids and their metadata
    pub fn iter(&self) -> impl Iterator<Item = (AssetId, &AssetMeta)> + '_ {
        self.assets.iter().map(|(&id, entry)| (id, &entry.meta))
    }
}

impl std::fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetRegistry")
            .field("assets", &self.assets.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::media::{Font, Texture};

    fn texture(w: u32) -> Texture {
        Texture {
            width: w,
            height: 1,
            pixels: vec![0; (w * 4) as usize],
        }
    }

    #[test]
    fn test_store_and_get() {
        let mut registry = AssetRegistry::new();
        let id = registry.store(texture(4), "sprites/hero.png");

        let retrieved = registry.get::<Texture>(id).unwrap();
        assert_eq!(retrieved.width, 4);
        assert_eq!(registry.ref_count(id), Some(1));
        assert_eq!(registry.meta(id).unwrap().kind, AssetKind::Texture);
    }

    #[test]
    fn test_path_deduplication() {
        let mut registry = AssetRegistry::new();
        let first = registry.store(texture(4), "sprites/hero.png");
        let second = registry.store(texture(8), "sprites/hero.png");

        // Should return same id and keep the original payload
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.ref_count(first), Some(2));
        assert_eq!(registry.get::<Texture>(first).unwrap().width, 4);
    }

    #[test]
    fn test_release_n_times_removes_entry() {
        let mut registry = AssetRegistry::new();
        let id = registry.store(texture(1), "a.png");
        registry.store(texture(1), "a.png");
        registry.store(texture(1), "a.png");

        assert_eq!(registry.release(id), Some(2));
        assert_eq!(registry.release(id), Some(1));
        assert_eq!(registry.release(id), Some(0));

        assert!(!registry.contains(id));
        assert!(registry.get::<Texture>(id).is_none());
        assert!(registry.id_for_path("a.png").is_none());

        // Extra release is a no-op
        assert_eq!(registry.release(id), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_path_reregistered_after_unload_gets_fresh_id() {
        let mut registry = AssetRegistry::new();
        let old = registry.store(texture(1), "a.png");
        registry.release(old);

        let new = registry.store(texture(1), "a.png");
        assert_ne!(old, new);
    }

    #[test]
    fn test_wrong_type_lookup_is_none() {
        let mut registry = AssetRegistry::new();
        let id = registry.store(texture(2), "b.png");
        assert!(registry.get::<Font>(id).is_none());
    }

    #[test]
    fn test_payload_outlives_release() {
        let mut registry = AssetRegistry::new();
        let id = registry.store(texture(3), "c.png");
        let held = registry.get::<Texture>(id).unwrap();

        registry.release(id);
        assert!(!registry.contains(id));
        assert_eq!(held.width, 3);
    }

    #[test]
    fn test_retain_unknown_id() {
        let mut registry = AssetRegistry::new();
        let id = registry.store(texture(1), "d.png");
        assert!(registry.retain(id));
        assert_eq!(registry.ref_count(id), Some(2));

        registry.clear();
        assert!(!registry.retain(id));
    }
}
