//! Tests for the placement prompt shipped in config/prompts

use std::fs;

const PROMPT: &str = "config/prompts/wall_art_v1.md";

#[test]
fn test_wall_art_prompt_file_exists() {
    assert!(fs::metadata(PROMPT).is_ok(), "wall_art_v1.md prompt file missing");
}

#[test]
fn test_wall_art_prompt_keeps_room_intact() {
    let text = fs::read_to_string(PROMPT).unwrap().to_lowercase();
    assert!(text.contains("do not remove"), "prompt should forbid removing objects");
    assert!(text.contains("empty"), "prompt should ask for empty wall space");
    assert!(text.contains("original resolution"), "prompt should ask to keep resolution");
}

#[test]
fn test_wall_art_prompt_describes_frame_and_scale() {
    let text = fs::read_to_string(PROMPT).unwrap().to_lowercase();
    assert!(text.contains("35%"), "prompt should give the artwork scale");
    assert!(text.contains("white wooden frame"), "prompt should ask for a frame");
}

#[test]
fn test_builtin_prompt_matches_file() {
    let text = fs::read_to_string(PROMPT).unwrap();
    assert_eq!(wallmatch::compositor::prompt::BUILTIN_PROMPT, text);
}
