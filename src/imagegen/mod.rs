//! Remote image-edit provider abstraction.
//!
//! `ImageEditProvider` is an enum over concrete backends. Add a new variant
//! plus a module in `providers/` for each additional service.
//!
//! Providers are shared immutable capabilities; clone them freely. The
//! `edit` method is `async fn` on the enum so callers need no trait-object
//! machinery.

pub mod providers;

use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown image provider: {0}")]
    UnknownProvider(String),
    #[error("missing API key: {0}")]
    MissingApiKey(&'static str),
    #[error("image provider disabled")]
    Disabled,
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("provider returned no image data")]
    NoImage,
}

// ── Wire-neutral image ────────────────────────────────────────────────────────

/// Encoded image bytes plus their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self { mime_type: mime_type.into(), data }
    }

    /// Build from raw bytes, sniffing the MIME type from the content.
    /// Unknown content is labelled `image/jpeg`.
    pub fn sniff(data: Vec<u8>) -> Self {
        let mime_type = sniff_mime(&data).to_string();
        Self { mime_type, data }
    }
}

/// MIME type guessed from magic bytes; `image/jpeg` when unknown.
pub fn sniff_mime(data: &[u8]) -> &'static str {
    image::guess_format(data)
        .map(|f| f.to_mime_type())
        .unwrap_or("image/jpeg")
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available image-edit backends.
#[derive(Debug, Clone)]
pub enum ImageEditProvider {
    Gemini(providers::gemini::GeminiProvider),
    Dummy(providers::dummy::DummyProvider),
    Local(providers::dummy::LocalOnlyProvider),
}

impl ImageEditProvider {
    /// Ask the backend to place `artwork` onto `wall` following `instruction`.
    /// Returns the first non-empty image in the reply.
    pub async fn edit(
        &self,
        instruction: &str,
        wall: &InlineImage,
        artwork: &InlineImage,
    ) -> Result<InlineImage, ProviderError> {
        match self {
            ImageEditProvider::Gemini(p) => p.edit(instruction, wall, artwork).await,
            ImageEditProvider::Dummy(p) => p.edit(instruction, wall, artwork).await,
            ImageEditProvider::Local(p) => p.edit(instruction, wall, artwork).await,
        }
    }

    /// Reachability probe. Backends without a remote endpoint always succeed.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        match self {
            ImageEditProvider::Gemini(p) => p.ping().await,
            ImageEditProvider::Dummy(_) | ImageEditProvider::Local(_) => Ok(()),
        }
    }

    /// Name used in logs and `/api/health`.
    pub fn name(&self) -> &'static str {
        match self {
            ImageEditProvider::Gemini(_) => "gemini",
            ImageEditProvider::Dummy(_) => "dummy",
            ImageEditProvider::Local(_) => "local",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn sniff_recognises_png() {
        assert_eq!(sniff_mime(PNG_MAGIC), "image/png");
        assert_eq!(InlineImage::sniff(PNG_MAGIC.to_vec()).mime_type, "image/png");
    }

    #[test]
    fn sniff_defaults_to_jpeg() {
        assert_eq!(sniff_mime(b"definitely not an image"), "image/jpeg");
        assert_eq!(sniff_mime(&[]), "image/jpeg");
    }

    #[test]
    fn names_are_stable() {
        let p = ImageEditProvider::Local(providers::dummy::LocalOnlyProvider);
        assert_eq!(p.name(), "local");
        let p = ImageEditProvider::Dummy(providers::dummy::DummyProvider);
        assert_eq!(p.name(), "dummy");
    }
}
