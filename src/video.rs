//! YouTube URL parsing.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// An 11-character YouTube video identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extract a video ID from a URL.
///
/// The token must be 11 characters of `[0-9A-Za-z_-]` following either a
/// `v=` query marker or a path separator. Malformed input never panics;
/// absence of a match is the only failure mode.
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    static VIDEO_ID_RE: OnceLock<Regex> = OnceLock::new();
    let re = VIDEO_ID_RE
        .get_or_init(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("Invalid regex"));

    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| VideoId(m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_url_variants() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "youtube.com/watch?v=dQw4w9WgXcQ",
        ] {
            assert_eq!(
                extract_video_id(url).map(|id| id.as_str().to_string()),
                Some("dQw4w9WgXcQ".to_string()),
                "failed for {url}"
            );
        }
    }

    #[test]
    fn test_extract_preserves_exact_token() {
        let id = extract_video_id("https://youtu.be/a_b-c_d-e_f?feature=share").unwrap();
        assert_eq!(id.as_str(), "a_b-c_d-e_f");
    }

    #[test]
    fn test_no_match_is_none() {
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("not a url"), None);
        assert_eq!(extract_video_id("https://youtu.be/short"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=tooshort"), None);
        // A bare ID has neither marker, so it does not match.
        assert_eq!(extract_video_id("dQw4w9WgXcQ"), None);
    }

    #[test]
    fn test_watch_url() {
        let id = extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(id.watch_url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }
}
