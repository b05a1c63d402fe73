//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the `-f` path), then applies `WALLMATCH_*` env overrides.
//!
//! # Module layout
//!
//! - **types**: Public configuration structs (`Config`, `CompositorConfig`, …).
//! - **raw**: Raw TOML deserialization types; mirror the file shape and
//!   carry serde defaults. Kept private.
//! - **load**: `merge_toml`, `load_raw_merged`, `load`, `load_from`,
//!   `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{Overrides, expand_home, load, load_from};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::{NamedTempFile, TempDir};

    const MINIMAL_TOML: &str = r#"
[server]
name = "test-wallmatch"
log_level = "info"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    fn no_overrides() -> Overrides<'static> {
        Overrides::default()
    }

    #[test]
    fn parse_minimal_config_fills_defaults() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), no_overrides()).unwrap();
        assert_eq!(cfg.name, "test-wallmatch");
        assert_eq!(cfg.http.bind, "127.0.0.1:5000");
        assert_eq!(cfg.catalog.max_results, 2);
        assert_eq!(cfg.imagegen.provider, "local");
        assert_eq!(cfg.imagegen.gemini.model, "gemini-2.5-flash-image");
        assert_eq!(cfg.compositor.max_wall_width, 1200);
        assert_eq!(cfg.compositor.remote_fetch_timeout, Duration::from_secs(15));
        assert_eq!(cfg.compositor.local_fetch_timeout, Duration::from_secs(10));
        assert_eq!(cfg.vocabulary.categories, vec!["classical", "aesthetic", "impressive"]);
        assert_eq!(cfg.vocabulary.colors.len(), 10);
        assert!(cfg.gemini_api_key.is_none());
    }

    #[test]
    fn parse_full_config() {
        let toml = r##"
[server]
name = "wm"
log_level = "debug"

[http]
bind = "0.0.0.0:8080"
allowed_origins = []
max_upload_bytes = 1024

[catalog]
path = "/srv/art.json"
max_results = 5

[vocabulary]
categories = ["modern"]
colors = [{ name = "Teal", hex = "#008080" }]

[imagegen]
default = "gemini"

[imagegen.gemini]
model = "gemini-test"
timeout_seconds = 12

[compositor]
prompt_file = "prompts/v2.md"
remote_fetch_timeout_seconds = 3
max_wall_width = 800
artwork_height_ratio = 0.5
border_px = 8
jpeg_quality = 80
"##;
        let f = write_toml(toml);
        let cfg = load_from(f.path(), no_overrides()).unwrap();
        assert_eq!(cfg.http.bind, "0.0.0.0:8080");
        assert!(cfg.http.allowed_origins.is_empty());
        assert_eq!(cfg.http.max_upload_bytes, 1024);
        assert_eq!(cfg.catalog.path, std::path::PathBuf::from("/srv/art.json"));
        assert_eq!(cfg.catalog.max_results, 5);
        assert_eq!(cfg.vocabulary.colors[0].hex, "#008080");
        assert_eq!(cfg.imagegen.provider, "gemini");
        assert_eq!(cfg.imagegen.gemini.timeout_seconds, 12);
        assert_eq!(cfg.provider_model(), "gemini-test");
        assert_eq!(cfg.compositor.prompt_file, std::path::PathBuf::from("prompts/v2.md"));
        assert_eq!(cfg.compositor.remote_fetch_timeout, Duration::from_secs(3));
        // untouched field keeps its default
        assert_eq!(cfg.compositor.local_fetch_timeout, Duration::from_secs(10));
        assert_eq!(cfg.compositor.max_wall_width, 800);
        assert_eq!(cfg.compositor.border_px, 8);
        assert_eq!(cfg.compositor.jpeg_quality, 80);
    }

    #[test]
    fn zero_max_results_rejected() {
        let f = write_toml("[server]\n[catalog]\nmax_results = 0\n");
        let err = load_from(f.path(), no_overrides()).unwrap_err();
        assert!(err.to_string().contains("max_results"));
    }

    #[test]
    fn bad_height_ratio_rejected() {
        let f = write_toml("[server]\n[compositor]\nartwork_height_ratio = 1.5\n");
        let err = load_from(f.path(), no_overrides()).unwrap_err();
        assert!(err.to_string().contains("artwork_height_ratio"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/.wallmatch/art.json");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with("art.json"));
    }

    #[test]
    fn absolute_and_relative_paths_unchanged() {
        assert_eq!(expand_home("/absolute/path"), std::path::PathBuf::from("/absolute/path"));
        assert_eq!(expand_home("relative/path"), std::path::PathBuf::from("relative/path"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(std::path::Path::new("/nonexistent/config.toml"), no_overrides());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn overrides_win() {
        let f = write_toml(MINIMAL_TOML);
        let overrides = Overrides {
            log_level: Some("trace"),
            catalog_path: Some("/tmp/other.json"),
            bind: Some("127.0.0.1:9999"),
        };
        let cfg = load_from(f.path(), overrides).unwrap();
        assert_eq!(cfg.log_level, "trace");
        assert_eq!(cfg.catalog.path, std::path::PathBuf::from("/tmp/other.json"));
        assert_eq!(cfg.http.bind, "127.0.0.1:9999");
    }

    const BASE_TOML: &str = r#"
[server]
name = "base"
log_level = "info"

[imagegen]
default = "gemini"

[imagegen.gemini]
model = "gemini-base"
timeout_seconds = 30
"#;

    fn write_named(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let p = dir.path().join(name);
        std::fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn overlay_keeps_base_fields() {
        let dir = TempDir::new().unwrap();
        write_named(&dir, "base.toml", BASE_TOML);
        let overlay = r#"
[meta]
base = "base.toml"

[server]
log_level = "debug"
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let cfg = load_from(&overlay_path, no_overrides()).unwrap();
        assert_eq!(cfg.name, "base");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.imagegen.provider, "gemini");
    }

    #[test]
    fn overlay_wins_scalar() {
        let dir = TempDir::new().unwrap();
        write_named(&dir, "base.toml", BASE_TOML);
        let overlay = r#"
[meta]
base = "base.toml"

[imagegen.gemini]
model = "gemini-overlay"
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let cfg = load_from(&overlay_path, no_overrides()).unwrap();
        assert_eq!(cfg.imagegen.gemini.model, "gemini-overlay");
        assert_eq!(cfg.imagegen.gemini.timeout_seconds, 30);
    }

    #[test]
    fn missing_base_errors() {
        let dir = TempDir::new().unwrap();
        let overlay = "[meta]\nbase = \"nonexistent.toml\"\n\n[server]\nname = \"x\"\n";
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let msg = load_from(&overlay_path, no_overrides()).unwrap_err().to_string();
        assert!(msg.contains("cannot read"));
    }

    #[test]
    fn cycle_detection() {
        let dir = TempDir::new().unwrap();
        let self_path = dir.path().join("self.toml");
        let content = format!("[meta]\nbase = \"{}\"\n\n{BASE_TOML}", self_path.display());
        std::fs::write(&self_path, content).unwrap();
        let msg = load_from(&self_path, no_overrides()).unwrap_err().to_string();
        assert!(msg.contains("circular"));
    }

    #[test]
    fn local_provider_reports_no_model() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), no_overrides()).unwrap();
        assert_eq!(cfg.imagegen.provider, "local");
        assert_eq!(cfg.provider_model(), "-");
    }
}
