//! Placement instruction for the remote edit.

use std::path::Path;

use tracing::{debug, warn};

/// Compiled-in copy of the default instruction.
pub const BUILTIN_PROMPT: &str = include_str!("../../config/prompts/wall_art_v1.md");

/// Read the instruction from `path`, falling back to [`BUILTIN_PROMPT`] when
/// the file is missing, unreadable or blank.
pub fn load_prompt(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => {
            debug!(path = %path.display(), bytes = text.len(), "loaded placement prompt");
            text
        }
        Ok(_) => {
            warn!(path = %path.display(), "placement prompt is empty, using built-in copy");
            BUILTIN_PROMPT.to_string()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "placement prompt unreadable, using built-in copy");
            BUILTIN_PROMPT.to_string()
        }
    }
}
