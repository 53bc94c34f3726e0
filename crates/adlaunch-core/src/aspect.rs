//! Aspect-ratio classification for draft assets
//!
//! Placement targeting needs every asset sorted into a feed group (1:1, 4:5,
//! or undetermined) or a story group (9:16). Authoring tools tag assets
//! explicitly; untagged assets fall back to a filename token detector that
//! recognizes the common ratio spellings (`9x16`, `9:16`, `9-16`, ...) in any
//! casing and delimiter style.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Recognized creative aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square (feed)
    Square,
    /// 4:5 portrait (feed)
    Portrait,
    /// 9:16 vertical (story/reels)
    Story,
    /// 16:9 landscape (feed)
    Landscape,
}

/// Placement group an asset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Feed,
    Story,
}

impl AspectRatio {
    /// Parse an explicit per-asset tag, e.g. `"9:16"` or `"1x1"`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let normalized = tag.trim().to_lowercase().replace(['x', '-', '_'], ":");
        match normalized.as_str() {
            "1:1" => Some(AspectRatio::Square),
            "4:5" => Some(AspectRatio::Portrait),
            "9:16" => Some(AspectRatio::Story),
            "16:9" => Some(AspectRatio::Landscape),
            _ => None,
        }
    }

    /// Canonical tag form.
    pub fn as_tag(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "4:5",
            AspectRatio::Story => "9:16",
            AspectRatio::Landscape => "16:9",
        }
    }

    /// Which placement group this ratio targets. Undetermined ratios are
    /// handled by the caller and default to feed.
    pub fn placement(&self) -> Placement {
        match self {
            AspectRatio::Story => Placement::Story,
            _ => Placement::Feed,
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

fn ratio_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Ratio token bounded by start/end or a delimiter so `9x16` inside
        // `19x160` does not match. Separator inside the token may be x, :, - or _.
        Regex::new(r"(?i)(?:^|[\s_\-.,()\[\]])(1[x:\-_]1|4[x:\-_]5|9[x:\-_]16|16[x:\-_]9)(?:$|[\s_\-.,()\[\]])")
            .expect("ratio token regex is valid")
    })
}

/// Detect an aspect ratio from a filename, e.g. `ad_9x16.mp4` or `ad (9:16).mp4`.
/// Case-insensitive and idempotent: repeated application yields the same result.
pub fn detect_from_filename(filename: &str) -> Option<AspectRatio> {
    let caps = ratio_token_regex().captures(filename)?;
    let token = caps.get(1)?.as_str().to_lowercase();
    let normalized = token.replace(['x', '-', '_'], ":");
    AspectRatio::from_tag(&normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_common_delimiters() {
        assert_eq!(
            detect_from_filename("ad_9x16.mp4"),
            Some(AspectRatio::Story)
        );
        assert_eq!(
            detect_from_filename("ad-9X16.mp4"),
            Some(AspectRatio::Story)
        );
        assert_eq!(
            detect_from_filename("ad (9:16).mp4"),
            Some(AspectRatio::Story)
        );
        assert_eq!(
            detect_from_filename("summer sale 4x5 final.mov"),
            Some(AspectRatio::Portrait)
        );
        assert_eq!(
            detect_from_filename("hero.16x9.mp4"),
            Some(AspectRatio::Landscape)
        );
        assert_eq!(
            detect_from_filename("square_1-1_v2.png"),
            Some(AspectRatio::Square)
        );
    }

    #[test]
    fn test_no_token_means_none() {
        assert_eq!(detect_from_filename("creative_final.mp4"), None);
        assert_eq!(detect_from_filename("ad_1920x1080.mp4"), None);
        // Token embedded in a larger number must not match
        assert_eq!(detect_from_filename("ad_19x160.mp4"), None);
    }

    #[test]
    fn test_case_insensitive_and_idempotent() {
        for name in ["AD_9X16.MP4", "ad_9x16.mp4", "Ad_9x16.Mp4"] {
            assert_eq!(detect_from_filename(name), Some(AspectRatio::Story));
            // Re-running on the same input is stable
            assert_eq!(detect_from_filename(name), Some(AspectRatio::Story));
        }
    }

    #[test]
    fn test_explicit_tag_parsing() {
        assert_eq!(AspectRatio::from_tag("9:16"), Some(AspectRatio::Story));
        assert_eq!(AspectRatio::from_tag(" 1x1 "), Some(AspectRatio::Square));
        assert_eq!(AspectRatio::from_tag("4-5"), Some(AspectRatio::Portrait));
        assert_eq!(AspectRatio::from_tag("3:2"), None);
    }

    #[test]
    fn test_placement_groups() {
        assert_eq!(AspectRatio::Story.placement(), Placement::Story);
        assert_eq!(AspectRatio::Square.placement(), Placement::Feed);
        assert_eq!(AspectRatio::Portrait.placement(), Placement::Feed);
        assert_eq!(AspectRatio::Landscape.placement(), Placement::Feed);
    }
}
