//! Asset identifiers
//!
//! Provides opaque, process-unique identifiers for registered assets and the
//! type tags used to check typed lookups.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Global counter for generating unique asset IDs
static NEXT_ASSET_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier of a registered asset.
///
/// Identifiers are assigned monotonically and never reused, so an id whose
/// entry has been released simply resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u64);

impl AssetId {
    /// Allocate the next unused identifier
    pub(crate) fn next() -> Self {
        Self(NEXT_ASSET_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw identifier value
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

/// Manifest alias to identifier table of one scene
pub type AssetAliases = FxHashMap<String, AssetId>;

/// Type tag of a loaded asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Texture,
    Font,
    Sound,
    /// Structured data template
    Data,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Texture => "texture",
            Self::Font => "font",
            Self::Sound => "sound",
            Self::Data => "data",
        };
        f.write_str(name)
    }
}

/// A payload type that can live in the asset registry
pub trait Asset: Send + Sync + 'static {
    /// Type tag recorded in the registry metadata
    const KIND: AssetKind;
}
