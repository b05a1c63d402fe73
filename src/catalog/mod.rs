//! Catalog store: the static artwork dataset.
//!
//! Loaded once at startup from a JSON array and shared read-only behind an
//! `Arc`. The dataset may spell `category` / `color` as a bare string or a
//! list; both are normalized into a [`TagSet`] here so the matcher never has
//! to care.

mod tags;

pub use tags::{OneOrMany, TagSet, normalize_tag};

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::AppError;

/// Catalog identifier; datasets use either numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtworkId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ArtworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtworkId::Number(n) => write!(f, "{n}"),
            ArtworkId::Text(s) => f.write_str(s),
        }
    }
}

/// One immutable catalog entry.
///
/// `price` stays optional so a malformed entry still loads; the matcher
/// reports it as a data error instead of the whole service refusing to start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtworkRecord {
    pub id: ArtworkId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: TagSet,
    #[serde(default)]
    pub color: TagSet,
    #[serde(default)]
    pub image_url: String,
}

/// The loaded dataset.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    artworks: Vec<ArtworkRecord>,
}

impl Catalog {
    pub fn from_records(artworks: Vec<ArtworkRecord>) -> Self {
        Self { artworks }
    }

    /// Parse a JSON array of artwork records.
    pub fn from_json(text: &str) -> Result<Self, AppError> {
        let artworks: Vec<ArtworkRecord> = serde_json::from_str(text)
            .map_err(|e| AppError::Catalog(format!("invalid catalog JSON: {e}")))?;
        Ok(Self { artworks })
    }

    /// Read and parse the catalog file at `path`.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path)
            .map_err(|e| AppError::Catalog(format!("cannot read {}: {e}", path.display())))?;
        let catalog = Self::from_json(&text)
            .map_err(|e| AppError::Catalog(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), artworks = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn artworks(&self) -> &[ArtworkRecord] {
        &self.artworks
    }

    pub fn len(&self) -> usize {
        self.artworks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artworks.is_empty()
    }
}
