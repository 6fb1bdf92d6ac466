//! Platform video identifier extraction.

use std::sync::LazyLock;

use regex::Regex;

/// URL patterns that carry a video id, tried in order. First match wins.
static VIDEO_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"watch\?(?:[^#]*&)?v=([A-Za-z0-9_-]+)",
        r"youtu\.be/([A-Za-z0-9_-]+)",
        r"/embed/([A-Za-z0-9_-]+)",
        r"/shorts/([A-Za-z0-9_-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("video id regex should compile"))
    .collect()
});

/// Extract the platform video id from a watch, short-link, embed or shorts URL.
///
/// Returns `None` when no pattern matches.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .map(|caps| caps[1].to_string())
}

/// Embed URL for a previously extracted video id.
pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{video_id}")
}
