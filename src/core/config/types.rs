//! Public configuration types.
//!
//! These are the resolved, ready-to-use structs the rest of the crate
//! consumes. Raw TOML deserialization types live in `raw.rs`.

use std::path::PathBuf;
use std::time::Duration;

// ── Server / HTTP ────────────────────────────────────────────────────────────

/// HTTP listener configuration (`[http]`).
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Socket address to bind the axum listener to.
    pub bind: String,
    /// Origins allowed by CORS. Empty means any origin.
    pub allowed_origins: Vec<String>,
    /// Maximum accepted request body, in bytes.
    pub max_upload_bytes: usize,
}

// ── Catalog ──────────────────────────────────────────────────────────────────

/// Catalog source and matching defaults (`[catalog]`).
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// JSON file holding the artwork records.
    pub path: PathBuf,
    /// How many ranked matches a request returns.
    pub max_results: usize,
}

/// A named color swatch offered to clients.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ColorSwatch {
    pub name: String,
    pub hex: String,
}

/// Controlled vocabularies served by `/api/categories` and `/api/colors`.
#[derive(Debug, Clone)]
pub struct VocabularyConfig {
    pub categories: Vec<String>,
    pub colors: Vec<ColorSwatch>,
}

// ── Image generation ─────────────────────────────────────────────────────────

/// Gemini image-edit backend (`[imagegen.gemini]`).
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Models endpoint prefix; `/{model}:generateContent` is appended.
    pub api_base_url: String,
    pub model: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// Image-edit provider selection (`[imagegen]`).
#[derive(Debug, Clone)]
pub struct ImageGenConfig {
    /// Active backend: `"gemini"`, `"dummy"` or `"local"`.
    /// Maps to `default` in `[imagegen]` TOML.
    pub provider: String,
    pub gemini: GeminiConfig,
}

// ── Compositor ───────────────────────────────────────────────────────────────

/// Fallback-chain tuning (`[compositor]`).
#[derive(Debug, Clone)]
pub struct CompositorConfig {
    /// Placement instruction file for the remote edit.
    pub prompt_file: PathBuf,
    pub remote_fetch_timeout: Duration,
    pub local_fetch_timeout: Duration,
    /// Walls wider than this are shrunk before local compositing.
    pub max_wall_width: u32,
    /// Artwork height as a fraction of wall height.
    pub artwork_height_ratio: f32,
    /// White border around each locally pasted artwork, in pixels.
    pub border_px: u32,
    pub jpeg_quality: u8,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            prompt_file: PathBuf::from("config/prompts/wall_art_v1.md"),
            remote_fetch_timeout: Duration::from_secs(15),
            local_fetch_timeout: Duration::from_secs(10),
            max_wall_width: 1200,
            artwork_height_ratio: 0.4,
            border_px: 20,
            jpeg_quality: 95,
        }
    }
}

// ── Config (root) ────────────────────────────────────────────────────────────

/// Fully-resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub name: String,
    pub log_level: String,
    /// Append logs here instead of stderr.
    pub log_file: Option<PathBuf>,
    pub http: HttpConfig,
    pub catalog: CatalogConfig,
    pub vocabulary: VocabularyConfig,
    pub imagegen: ImageGenConfig,
    pub compositor: CompositorConfig,
    /// API key from `GEMINI_API_KEY` env var, never sourced from TOML.
    pub gemini_api_key: Option<String>,
}

impl Config {
    /// Model name of the active provider, for display.
    pub fn provider_model(&self) -> &str {
        match self.imagegen.provider.as_str() {
            "gemini" => &self.imagegen.gemini.model,
            _ => "-",
        }
    }
}
