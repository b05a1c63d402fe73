//! Image-edit provider implementations.
//!
//! `build(config, api_key)` is the factory, called once at startup.

pub mod dummy;
pub mod gemini;

use crate::core::config::ImageGenConfig;
use crate::imagegen::{ImageEditProvider, ProviderError};

/// Construct an `ImageEditProvider` from config and an optional API key.
///
/// `api_key` comes from the `GEMINI_API_KEY` env var (never TOML). The
/// `gemini` backend refuses to start without it.
pub fn build(
    config: &ImageGenConfig,
    api_key: Option<String>,
) -> Result<ImageEditProvider, ProviderError> {
    match config.provider.as_str() {
        "local" => Ok(ImageEditProvider::Local(dummy::LocalOnlyProvider)),
        "dummy" => Ok(ImageEditProvider::Dummy(dummy::DummyProvider)),
        "gemini" => {
            let key = api_key.ok_or(ProviderError::MissingApiKey("GEMINI_API_KEY"))?;
            let g = &config.gemini;
            let p = gemini::GeminiProvider::new(
                g.api_base_url.clone(),
                g.model.clone(),
                g.timeout_seconds,
                key,
            )?;
            Ok(ImageEditProvider::Gemini(p))
        }
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}
