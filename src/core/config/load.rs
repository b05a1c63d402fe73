//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies `WALLMATCH_LOG_LEVEL`, `WALLMATCH_CATALOG` and
//! `WALLMATCH_BIND` env overrides.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::core::error::AppError;

use super::raw::RawConfig;
use super::types::*;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Values that take precedence over whatever the TOML says.
///
/// [`load`] fills this from the environment; tests build it directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides<'a> {
    pub log_level: Option<&'a str>,
    pub catalog_path: Option<&'a str>,
    pub bind: Option<&'a str>,
}

/// Deep-merge two TOML values.
/// Tables are merged recursively; any other value in the overlay replaces
/// the base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow its `[meta] base` chain and return the merged
/// value. `visited` holds canonical paths already seen so cycles are caught.
fn load_raw_merged(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let text = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&text)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let base_ref = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
        .map(str::to_string);

    match base_ref {
        Some(base_str) => {
            let base_path = if Path::new(&base_str).is_absolute() {
                PathBuf::from(base_str)
            } else {
                path.parent().unwrap_or(Path::new(".")).join(base_str)
            };
            let base_val = load_raw_merged(&base_path, visited)?;
            Ok(merge_toml(base_val, overlay_val))
        }
        None => Ok(overlay_val),
    }
}

/// Load config from `path`, or `config/default.toml`, then apply env overrides.
///
/// An explicit `path` must exist. Without one, a missing default file falls
/// back to built-in defaults so the binary runs from any directory.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let log_level = env::var("WALLMATCH_LOG_LEVEL").ok();
    let catalog_path = env::var("WALLMATCH_CATALOG").ok();
    let bind = env::var("WALLMATCH_BIND").ok();
    let overrides = Overrides {
        log_level: log_level.as_deref(),
        catalog_path: catalog_path.as_deref(),
        bind: bind.as_deref(),
    };
    let api_key = env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty());

    let mut config = match path {
        Some(p) => load_from(Path::new(p), overrides)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            load_from(Path::new(DEFAULT_CONFIG_PATH), overrides)?
        }
        None => resolve(RawConfig::default(), overrides)?,
    };
    config.gemini_api_key = api_key;
    Ok(config)
}

/// Load from an explicit path with explicit overrides.
/// Follows `[meta] base = "..."` chains before resolving. The API key is
/// left unset; [`load`] fills it from the environment.
pub fn load_from(path: &Path, overrides: Overrides<'_>) -> Result<Config, AppError> {
    let merged_val = load_raw_merged(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged_val).map_err(|e: toml::de::Error| {
        AppError::Config(format!("config error in {}: {e}", path.display()))
    })?;

    resolve(parsed, overrides)
}

/// Turn the raw shape into the public types, validating as we go.
fn resolve(parsed: RawConfig, overrides: Overrides<'_>) -> Result<Config, AppError> {
    let s = parsed.server;

    let log_level = overrides.log_level.unwrap_or(&s.log_level).to_string();
    let catalog_path = expand_home(overrides.catalog_path.unwrap_or(&parsed.catalog.path));
    let bind = overrides.bind.unwrap_or(&parsed.http.bind).to_string();

    if parsed.catalog.max_results == 0 {
        return Err(AppError::Config("catalog.max_results must be at least 1".into()));
    }

    let defaults = CompositorConfig::default();
    let c = parsed.compositor;
    let compositor = CompositorConfig {
        prompt_file: c.prompt_file.map(|p| expand_home(&p)).unwrap_or(defaults.prompt_file),
        remote_fetch_timeout: c
            .remote_fetch_timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(defaults.remote_fetch_timeout),
        local_fetch_timeout: c
            .local_fetch_timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(defaults.local_fetch_timeout),
        max_wall_width: c.max_wall_width.unwrap_or(defaults.max_wall_width).max(1),
        artwork_height_ratio: c.artwork_height_ratio.unwrap_or(defaults.artwork_height_ratio),
        border_px: c.border_px.unwrap_or(defaults.border_px),
        jpeg_quality: c.jpeg_quality.unwrap_or(defaults.jpeg_quality).clamp(1, 100),
    };

    if !(compositor.artwork_height_ratio > 0.0 && compositor.artwork_height_ratio <= 1.0) {
        return Err(AppError::Config(format!(
            "compositor.artwork_height_ratio must be in (0, 1], got {}",
            compositor.artwork_height_ratio
        )));
    }

    Ok(Config {
        name: s.name,
        log_level,
        log_file: s.log_file.map(|p| expand_home(&p)),
        http: HttpConfig {
            bind,
            allowed_origins: parsed.http.allowed_origins,
            max_upload_bytes: parsed.http.max_upload_bytes,
        },
        catalog: CatalogConfig {
            path: catalog_path,
            max_results: parsed.catalog.max_results,
        },
        vocabulary: VocabularyConfig {
            categories: parsed.vocabulary.categories,
            colors: parsed
                .vocabulary
                .colors
                .into_iter()
                .map(|c| ColorSwatch { name: c.name, hex: c.hex })
                .collect(),
        },
        imagegen: ImageGenConfig {
            provider: parsed.imagegen.provider,
            gemini: GeminiConfig {
                api_base_url: parsed.imagegen.gemini.api_base_url,
                model: parsed.imagegen.gemini.model,
                timeout_seconds: parsed.imagegen.gemini.timeout_seconds,
            },
        },
        compositor,
        gemini_api_key: None,
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
