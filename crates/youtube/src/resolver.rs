//! Video-ID resolution from user-supplied URLs.
//!
//! Campaigns carry whatever URL the customer pasted in. All four shapes
//! YouTube hands out resolve to the same canonical identifier; anything
//! else is an "unresolved" skip signal, never an error.

use std::fmt;

/// Canonical YouTube video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical `watch` URL for this id. Resolving the rendered URL
    /// yields the same id back.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier segment markers, tried in order. Matching anywhere in the
/// string keeps `m.` / `www.` prefixes and scheme-less inputs working.
const ID_MARKERS: [&str; 4] = [
    "youtube.com/watch?v=",
    "youtu.be/",
    "youtube.com/embed/",
    "youtube.com/shorts/",
];

/// Extract the canonical video id from a URL, or `None` when no accepted
/// shape matches. The identifier terminates at the first `&`, `?`, `#`,
/// or newline; trailing query parameters and fragments are discarded.
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    for marker in ID_MARKERS {
        if let Some(pos) = url.find(marker) {
            let rest = &url[pos + marker.len()..];
            let end = rest
                .find(['&', '?', '#', '\n'])
                .unwrap_or(rest.len());
            let id = &rest[..end];
            if !id.is_empty() {
                return Some(VideoId(id.to_string()));
            }
        }
    }
    None
}
