//! Audio asset registries.
//!
//! Provides the name → asset mappings the level coordinator plays from:
//! - `AssetEntry`: one row of an asset table (file name, loop flag)
//! - `AudioAsset`: a resolved, playable asset
//! - `Registry`: immutable name → asset mapping for music or effects
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  resolve   ┌─────────────┐  lookup   ┌─────────────┐
//! │ asset table │───────────▶│  Registry   │──────────▶│ AudioAsset  │
//! │ (config)    │  base dir  │ (immutable) │   name    │ (playable)  │
//! └─────────────┘            └─────────────┘           └─────────────┘
//! ```
//!
//! Registries are built once and never mutated; the mixer decides how to
//! load the file behind an asset.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use overworld_common::{AssetKind, AudioError, AudioResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One row of an asset table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    /// File name relative to the asset directory.
    pub file: PathBuf,
    /// Repeat until stopped or replaced.
    #[serde(default)]
    pub looping: bool,
}

impl AssetEntry {
    /// Creates an entry that plays once.
    pub fn once(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            looping: false,
        }
    }

    /// Creates an entry that repeats.
    pub fn looped(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            looping: true,
        }
    }
}

/// Asset table as it appears in configuration: logical name → entry.
pub type AssetTable = BTreeMap<String, AssetEntry>;

/// A resolved asset ready to hand to a mixer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    /// Logical name.
    pub name: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// Repeat until stopped or replaced.
    pub looping: bool,
    /// Registry the asset belongs to.
    pub kind: AssetKind,
}

/// Immutable name → asset mapping.
#[derive(Debug, Clone)]
pub struct Registry {
    kind: AssetKind,
    assets: HashMap<String, AudioAsset>,
}

/// Registry of music tracks.
pub type MusicRegistry = Registry;

/// Registry of sound effects.
pub type EffectRegistry = Registry;

impl Registry {
    /// Builds a registry from a table, resolving files against `base_dir`.
    pub fn from_table(kind: AssetKind, base_dir: impl AsRef<Path>, table: &AssetTable) -> Self {
        let base_dir = base_dir.as_ref();
        let assets = table
            .iter()
            .map(|(name, entry)| {
                let asset = AudioAsset {
                    name: name.clone(),
                    path: base_dir.join(&entry.file),
                    looping: entry.looping,
                    kind,
                };
                (name.clone(), asset)
            })
            .collect::<HashMap<_, _>>();

        debug!("Built {} registry with {} assets", kind, assets.len());

        Self { kind, assets }
    }

    /// Builds a music registry.
    pub fn music(base_dir: impl AsRef<Path>, table: &AssetTable) -> Self {
        Self::from_table(AssetKind::Music, base_dir, table)
    }

    /// Builds an effect registry.
    pub fn effects(base_dir: impl AsRef<Path>, table: &AssetTable) -> Self {
        Self::from_table(AssetKind::Effect, base_dir, table)
    }

    /// Looks up an asset by logical name.
    pub fn get(&self, name: &str) -> AudioResult<&AudioAsset> {
        self.assets
            .get(name)
            .ok_or_else(|| AudioError::not_found(self.kind, name))
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.assets.contains_key(name)
    }

    /// Number of registered assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Required names with no entry.
    #[must_use]
    pub fn missing_keys<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !self.contains(name))
            .collect()
    }

    /// Registered assets whose file does not exist on disk, sorted by name.
    #[must_use]
    pub fn missing_files(&self) -> Vec<&AudioAsset> {
        let mut missing: Vec<_> = self
            .assets
            .values()
            .filter(|asset| !asset.path.exists())
            .collect();
        missing.sort_by(|a, b| a.name.cmp(&b.name));
        missing
    }
}
