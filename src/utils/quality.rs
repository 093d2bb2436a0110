use std::sync::LazyLock;

use regex::Regex;

/// `/1280x720/` path segment.
static DIMENSIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d+)x(\d+)/").expect("valid dimensions pattern"));

/// Height or bitrate label right before the extension, e.g. `clip720p.mp4`.
static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)p?\.mp4").expect("valid label pattern"));

/// Multiplier that puts a bare label in the same rough range as a pixel area.
const LABEL_WEIGHT: u64 = 1000;

/// Derives a sortable quality score from a video URL.
///
/// Pixel area from a `WxH` segment wins; otherwise a numeric label before `.mp4`
/// scores `label * 1000`; anything else scores 0. The two units are not truly
/// comparable (a `100p` label outranks a `10x10` area), which is accepted.
pub fn quality_score(url: &str) -> u64 {
    if let Some(caps) = DIMENSIONS_RE.captures(url) {
        let area = parse_saturating(&caps[1]).saturating_mul(parse_saturating(&caps[2]));
        if area > 0 {
            return area;
        }
    }

    LABEL_RE
        .captures(url)
        .map(|caps| parse_saturating(&caps[1]).saturating_mul(LABEL_WEIGHT))
        .unwrap_or(0)
}

// Input is always a digit run, so the only parse failure is overflow.
fn parse_saturating(digits: &str) -> u64 {
    digits.parse().unwrap_or(u64::MAX)
}
