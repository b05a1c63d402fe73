//! Three-tier compositor.
//!
//! Given the wall photo and the ranked matches, produce one image:
//!
//! 1. **remote**: the image-edit provider places the top artwork.
//! 2. **local**: every ranked artwork framed and pasted in evenly spaced slots.
//! 3. **original**: the wall bytes unchanged.
//!
//! Each tier is tried at most once and any failure drops to the next, so
//! [`Compositor::composite`] always returns an image.

pub mod fetch;
pub mod local;
pub mod prompt;

use std::io::Cursor;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::ImageReader;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::ArtworkRecord;
use crate::core::config::CompositorConfig;
use crate::imagegen::{ImageEditProvider, InlineImage, ProviderError, sniff_mime};
use crate::matcher::ScoredMatch;
use fetch::{ArtworkFetcher, FetchError};
use local::{LocalRender, LocalSettings, render_local};

/// Why a tier gave up. Never leaves this module's public API as a failure.
#[derive(Debug, Error)]
pub enum CompositeError {
    #[error("artwork fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("blocking task failed: {0}")]
    Task(String),
}

/// Which tier produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeTier {
    Remote,
    Local,
    Original,
}

impl CompositeTier {
    pub fn as_str(self) -> &'static str {
        match self {
            CompositeTier::Remote => "remote",
            CompositeTier::Local => "local",
            CompositeTier::Original => "original",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompositeResult {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub tier: CompositeTier,
}

impl CompositeResult {
    /// `data:<mime>;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.bytes))
    }
}

// ── Compositor ────────────────────────────────────────────────────────────────

pub struct Compositor {
    provider: ImageEditProvider,
    fetcher: ArtworkFetcher,
    settings: CompositorConfig,
    prompt: Arc<str>,
}

impl Compositor {
    /// Reads the placement prompt from `settings.prompt_file` once.
    pub fn new(
        provider: ImageEditProvider,
        fetcher: ArtworkFetcher,
        settings: CompositorConfig,
    ) -> Self {
        let prompt = prompt::load_prompt(&settings.prompt_file);
        Self { provider, fetcher, settings, prompt: Arc::from(prompt) }
    }

    pub fn provider(&self) -> &ImageEditProvider {
        &self.provider
    }

    pub async fn composite(&self, wall: &[u8], ranked: &[ScoredMatch]) -> CompositeResult {
        let Some(top) = ranked.first() else {
            debug!("no ranked artworks, returning original wall");
            return original(wall);
        };

        match self.try_remote(wall, &top.artwork).await {
            Ok(image) => {
                info!(tier = "remote", provider = self.provider.name(), bytes = image.data.len(), "composite ready");
                return CompositeResult {
                    bytes: image.data,
                    mime_type: image.mime_type,
                    tier: CompositeTier::Remote,
                };
            }
            Err(CompositeError::Provider(ProviderError::Disabled)) => {
                debug!("remote edit disabled, compositing locally");
            }
            Err(e) => warn!(error = %e, "remote edit failed, compositing locally"),
        }

        match self.try_local(wall, ranked).await {
            Ok(render) => {
                info!(
                    tier = "local",
                    placed = render.placed,
                    skipped = render.skipped,
                    bytes = render.bytes.len(),
                    "composite ready"
                );
                CompositeResult {
                    bytes: render.bytes,
                    mime_type: "image/jpeg".to_string(),
                    tier: CompositeTier::Local,
                }
            }
            Err(e) => {
                warn!(error = %e, "local composite failed, returning original wall");
                original(wall)
            }
        }
    }

    async fn try_remote(
        &self,
        wall: &[u8],
        top: &ArtworkRecord,
    ) -> Result<InlineImage, CompositeError> {
        if let ImageEditProvider::Local(_) = self.provider {
            return Err(ProviderError::Disabled.into());
        }

        debug!(id = %top.id, title = %top.title, url = %top.image_url, "fetching top artwork");
        let art = self
            .fetcher
            .fetch(&top.image_url, self.settings.remote_fetch_timeout)
            .await?;

        let wall_bytes = wall.to_vec();
        let (wall_bytes, art, wall_dims) = tokio::task::spawn_blocking(move || {
            let wall_dims = decode_dimensions(&wall_bytes, "wall")?;
            decode_dimensions(&art, "artwork")?;
            Ok::<_, CompositeError>((wall_bytes, art, wall_dims))
        })
        .await
        .map_err(|e| CompositeError::Task(e.to_string()))??;

        let edited = self
            .provider
            .edit(&self.prompt, &InlineImage::sniff(wall_bytes), &InlineImage::sniff(art))
            .await?;
        if edited.data.is_empty() {
            return Err(ProviderError::NoImage.into());
        }

        let (edited, out_dims) = tokio::task::spawn_blocking(move || {
            let dims = decode_dimensions(&edited.data, "edited image")?;
            Ok::<_, CompositeError>((edited, dims))
        })
        .await
        .map_err(|e| CompositeError::Task(e.to_string()))??;

        if out_dims != wall_dims {
            warn!(
                wall_width = wall_dims.0,
                wall_height = wall_dims.1,
                width = out_dims.0,
                height = out_dims.1,
                "edited image dimensions differ from wall"
            );
        }
        Ok(edited)
    }

    async fn try_local(
        &self,
        wall: &[u8],
        ranked: &[ScoredMatch],
    ) -> Result<LocalRender, CompositeError> {
        let mut artworks = Vec::with_capacity(ranked.len());
        for m in ranked {
            let art = &m.artwork;
            match self
                .fetcher
                .fetch(&art.image_url, self.settings.local_fetch_timeout)
                .await
            {
                Ok(bytes) => artworks.push(Some(bytes)),
                Err(e) => {
                    warn!(id = %art.id, url = %art.image_url, error = %e, "artwork fetch failed, slot left empty");
                    artworks.push(None);
                }
            }
        }

        let settings = LocalSettings::from(&self.settings);
        let wall = wall.to_vec();
        tokio::task::spawn_blocking(move || render_local(&wall, &artworks, settings))
            .await
            .map_err(|e| CompositeError::Task(e.to_string()))?
    }
}

fn original(wall: &[u8]) -> CompositeResult {
    CompositeResult {
        bytes: wall.to_vec(),
        mime_type: sniff_mime(wall).to_string(),
        tier: CompositeTier::Original,
    }
}

/// Width and height from the image header alone.
fn decode_dimensions(bytes: &[u8], what: &str) -> Result<(u32, u32), CompositeError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CompositeError::Decode(format!("{what}: {e}")))?
        .into_dimensions()
        .map_err(|e| CompositeError::Decode(format!("{what}: {e}")))
}
