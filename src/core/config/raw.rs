//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape; serde target before resolution.
#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub server: RawServer,
    #[serde(default)]
    pub http: RawHttp,
    #[serde(default)]
    pub catalog: RawCatalog,
    #[serde(default)]
    pub vocabulary: RawVocabulary,
    #[serde(default)]
    pub imagegen: RawImageGen,
    #[serde(default)]
    pub compositor: RawCompositor,
}

#[derive(Deserialize)]
pub(super) struct RawServer {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for RawServer {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

// ── HTTP ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawHttp {
    #[serde(default = "default_http_bind")]
    pub bind: String,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for RawHttp {
    fn default() -> Self {
        Self {
            bind: default_http_bind(),
            allowed_origins: default_allowed_origins(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawCatalog {
    #[serde(default = "default_catalog_path")]
    pub path: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for RawCatalog {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
            max_results: default_max_results(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawVocabulary {
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_colors")]
    pub colors: Vec<RawColor>,
}

impl Default for RawVocabulary {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            colors: default_colors(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub(super) struct RawColor {
    pub name: String,
    pub hex: String,
}

// ── Image generation ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawImageGen {
    #[serde(rename = "default", default = "default_imagegen_provider")]
    pub provider: String,
    #[serde(default)]
    pub gemini: RawGemini,
}

impl Default for RawImageGen {
    fn default() -> Self {
        Self {
            provider: default_imagegen_provider(),
            gemini: RawGemini::default(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawGemini {
    #[serde(default = "default_gemini_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawGemini {
    fn default() -> Self {
        Self {
            api_base_url: default_gemini_api_base_url(),
            model: default_gemini_model(),
            timeout_seconds: default_gemini_timeout_seconds(),
        }
    }
}

// ── Compositor ───────────────────────────────────────────────────────────────

/// Every field is optional; missing ones fall back to `CompositorConfig::default()`.
#[derive(Deserialize, Default)]
pub(super) struct RawCompositor {
    pub prompt_file: Option<String>,
    pub remote_fetch_timeout_seconds: Option<u64>,
    pub local_fetch_timeout_seconds: Option<u64>,
    pub max_wall_width: Option<u32>,
    pub artwork_height_ratio: Option<f32>,
    pub border_px: Option<u32>,
    pub jpeg_quality: Option<u8>,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

pub(super) fn default_name() -> String {
    "wallmatch".to_string()
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_http_bind() -> String {
    "127.0.0.1:5000".to_string()
}

pub(super) fn default_allowed_origins() -> Vec<String> {
    vec!["http://127.0.0.1:5500".to_string()]
}

pub(super) fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

pub(super) fn default_catalog_path() -> String {
    "data/artworks.json".to_string()
}

pub(super) fn default_max_results() -> usize {
    2
}

pub(super) fn default_categories() -> Vec<String> {
    ["classical", "aesthetic", "impressive"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub(super) fn default_colors() -> Vec<RawColor> {
    [
        ("Red", "#FF0000"),
        ("Blue", "#0000FF"),
        ("Green", "#00FF00"),
        ("Yellow", "#FFFF00"),
        ("Orange", "#FFA500"),
        ("Purple", "#800080"),
        ("Pink", "#FFC0CB"),
        ("Brown", "#8B4513"),
        ("Black", "#000000"),
        ("White", "#FFFFFF"),
    ]
    .iter()
    .map(|(name, hex)| RawColor { name: name.to_string(), hex: hex.to_string() })
    .collect()
}

pub(super) fn default_imagegen_provider() -> String {
    "local".to_string()
}

pub(super) fn default_gemini_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}

pub(super) fn default_gemini_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

pub(super) fn default_gemini_timeout_seconds() -> u64 {
    60
}
