use std::sync::LazyLock;

use regex::{RegexSet, RegexSetBuilder};
use url::Url;

/// A candidate must contain one of these to count as a video asset.
const VIDEO_EXTENSIONS: [&str; 2] = [".mp4", ".m3u8"];

/// A candidate must be served from one of these domains (substring match).
const TRUSTED_DOMAINS: [&str; 3] = ["twimg.com", "twitter.com", "x.com"];

/// Path keywords marking promotional and UI clips rather than post content.
const EXCLUDED_PATTERNS: [&str; 14] = [
    r"inapp[_-]",
    r"radar[_-]promo",
    r"grok[_-]",
    r"promo[_-]",
    r"sticky/videos",
    r"onboarding",
    r"welcome[_-]",
    r"intro[_-]",
    r"tutorial",
    r"placeholder",
    r"sample[_-]",
    r"demo[_-]",
    r"ui[_-]video",
    r"app[_-]promo",
];

static EXCLUDED_SET: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSetBuilder::new(EXCLUDED_PATTERNS)
        .case_insensitive(true)
        .build()
        .expect("valid exclusion patterns")
});

/// Admits a candidate only if it is a well-formed http(s) URL, names an mp4/m3u8
/// asset, lives on a trusted domain and matches none of the exclusion keywords.
pub fn is_valid_video_url(candidate: &str) -> bool {
    is_well_formed(candidate)
        && VIDEO_EXTENSIONS.iter().any(|ext| candidate.contains(ext))
        && TRUSTED_DOMAINS.iter().any(|domain| candidate.contains(domain))
        && !EXCLUDED_SET.is_match(candidate)
}

fn is_well_formed(candidate: &str) -> bool {
    if candidate
        .chars()
        .any(|c| c.is_whitespace() || c == '\\' || !c.is_ascii())
    {
        return false;
    }

    match Url::parse(candidate) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}
