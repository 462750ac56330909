//! Narration file naming and duration estimates

use std::path::{Path, PathBuf};

/// Korean narration pace used for duration estimates
pub const CHARACTERS_PER_MINUTE: f32 = 350.0;

/// Estimated clip length is clamped to this range (seconds)
pub const MIN_ESTIMATED_SECONDS: f32 = 1.0;
pub const MAX_ESTIMATED_SECONDS: f32 = 30.0;

/// Reduce a scene name to characters safe for file names
///
/// Keeps alphanumerics (any script), spaces, `-` and `_`; trims trailing
/// whitespace and replaces the remaining spaces with `_`.
pub fn safe_scene_name(scene_name: &str) -> String {
    let kept: String = scene_name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim_end().replace(' ', "_")
}

/// `narration_{NN}_{safe_name}[_attempt_{K}].{ext}`
///
/// The attempt suffix is only added from the second attempt on, so a
/// first-try success keeps the plain name.
pub fn narration_file_name(
    scene_number: usize,
    scene_name: &str,
    attempt_number: u32,
    extension: &str,
) -> String {
    let safe = safe_scene_name(scene_name);
    let suffix = if attempt_number > 1 {
        format!("_attempt_{}", attempt_number)
    } else {
        String::new()
    };
    format!("narration_{:02}_{}{}.{}", scene_number, safe, suffix, extension)
}

/// Full path of a narration file inside `output_dir`
pub fn narration_file_path(
    output_dir: &Path,
    scene_number: usize,
    scene_name: &str,
    attempt_number: u32,
    extension: &str,
) -> PathBuf {
    output_dir.join(narration_file_name(
        scene_number,
        scene_name,
        attempt_number,
        extension,
    ))
}

/// Estimated spoken duration of `text` in seconds
///
/// Characters / 350 per minute, clamped to [1, 30]; 0 for empty text.
pub fn estimate_duration_seconds(text: &str) -> f32 {
    let chars = text.chars().count();
    if chars == 0 {
        return 0.0;
    }
    let seconds = chars as f32 / CHARACTERS_PER_MINUTE * 60.0;
    seconds.clamp(MIN_ESTIMATED_SECONDS, MAX_ESTIMATED_SECONDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_scene_name() {
        assert_eq!(safe_scene_name("Opening: Winter Menu!"), "Opening_Winter_Menu");
        assert_eq!(safe_scene_name("겨울 메뉴 소개"), "겨울_메뉴_소개");
        assert_eq!(safe_scene_name("trailing   "), "trailing");
        assert_eq!(safe_scene_name("a-b_c"), "a-b_c");
    }

    #[test]
    fn test_first_attempt_has_no_suffix() {
        assert_eq!(
            narration_file_name(3, "Scene 3", 1, "mp3"),
            "narration_03_Scene_3.mp3"
        );
    }

    #[test]
    fn test_retry_attempt_suffix() {
        assert_eq!(
            narration_file_name(12, "Finale", 2, "mp3"),
            "narration_12_Finale_attempt_2.mp3"
        );
    }

    #[test]
    fn test_duration_estimate() {
        assert_eq!(estimate_duration_seconds(""), 0.0);
        // 5 chars → well under a second, clamped up
        assert_eq!(estimate_duration_seconds("안녕하세요"), 1.0);
        // 35 chars → 6 seconds
        let text = "가".repeat(35);
        assert!((estimate_duration_seconds(&text) - 6.0).abs() < 1e-4);
        // very long script is capped
        let long = "가".repeat(1000);
        assert_eq!(estimate_duration_seconds(&long), 30.0);
    }
}
