//! Video extraction from HTML pages and relay responses.
//!
//! Layers run over the same document and their results are unioned:
//! 1. JSON-LD script blocks, searched recursively for `contentUrl`/`thumbnailUrl`.
//! 2. Inline script fragments holding `variants` arrays or quoted video URLs.
//! 3. Literal `video.twimg.com` URLs in the known asset path families.
//! 4. A `pbs.twimg.com` thumbnail sweep, which overrides any JSON-LD thumbnail.
//!
//! Every candidate that leaves this module has passed the validator.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::transport::{fetch_body, Transport};
use super::types::{FailureKind, PostReference, StrategyOutcome};
use crate::utils::escape::{decode_html_entities, unescape_slashes};
use crate::utils::post_id::{is_post_host, rehost_post_url};
use crate::utils::validate::is_valid_video_url;

/// Nesting beyond this is not walked.
const MAX_SEARCH_DEPTH: usize = 64;

static JSON_LD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type=["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid json-ld pattern")
});

const INLINE_FRAGMENT_PATTERNS: [&str; 4] = [
    r#"(?is)video_info["']?\s*:\s*\{[^}]*variants["']?\s*:\s*\[([^\]]+)\]"#,
    r#"(?is)variants["']?\s*:\s*(\[\s*\{[^\]]+\}\s*\])"#,
    r#"(?i)"contentUrl"\s*:\s*"([^"]*\.mp4[^"]*)""#,
    r#"(?i)"url"\s*:\s*"(https://video\.twimg\.com[^"]*\.mp4[^"]*)""#,
];

const DIRECT_URL_PATTERNS: [&str; 4] = [
    r#"(?i)https://video\.twimg\.com/ext_tw_video/\d+/pu/vid/\d+x\d+/[\w-]+\.mp4(?:\?[^"\s]*)?"#,
    r#"(?i)https://video\.twimg\.com/ext_tw_video/\d+/pu/pl/[\w-]+\.m3u8(?:\?[^"\s]*)?"#,
    r#"(?i)https://video\.twimg\.com/amplify_video/\d+/vid/\d+x\d+/[\w-]+\.mp4(?:\?[^"\s]*)?"#,
    r#"(?i)https://video\.twimg\.com/tweet_video/[\w-]+\.mp4(?:\?[^"\s]*)?"#,
];

static INLINE_FRAGMENT_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(&INLINE_FRAGMENT_PATTERNS));
static DIRECT_URL_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(&DIRECT_URL_PATTERNS));

static THUMBNAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https://pbs\.twimg\.com/(?:media|ext_tw_video_thumb)/[\w-]+\.(?:jpg|png)(?::large)?")
        .expect("valid thumbnail pattern")
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid markup pattern"))
        .collect()
}

const PAGE_HEADERS: [(&str, &str); 5] = [
    ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Upgrade-Insecure-Requests", "1"),
];

/// Scrapes the post page itself: the reference as given, then its x.com and
/// twitter.com forms.
pub async fn fetch_post_page<T: Transport>(post: &PostReference, transport: &T) -> StrategyOutcome {
    let pages = page_variants(post);
    tracing::debug!(post_id = %post.id, pages = pages.len(), "markup.scrape");
    first_markup_hit(transport, &pages, &PAGE_HEADERS).await
}

/// Distinct page URLs to scrape, in order. A bare ID contributes no URL of its own.
pub fn page_variants(post: &PostReference) -> Vec<String> {
    let mut pages = Vec::with_capacity(3);
    if url::Url::parse(&post.raw)
        .ok()
        .and_then(|u| u.host_str().map(is_post_host))
        .unwrap_or(false)
    {
        pages.push(post.raw.clone());
    }
    for host in ["x.com", "twitter.com"] {
        let page = rehost_post_url(&post.raw, &post.id, host);
        if !pages.contains(&page) {
            pages.push(page);
        }
    }
    pages
}

/// Fetches each URL in turn and returns the first extraction with validated
/// candidates. If none has any, the last failure is reported.
pub async fn first_markup_hit<T: Transport>(
    transport: &T,
    urls: &[String],
    headers: &[(&str, &str)],
) -> StrategyOutcome {
    let mut last_failure = FailureKind::NoCandidates;

    for url in urls {
        match fetch_body(transport, url, headers).await {
            Ok(html) => {
                let outcome = extract_from_markup(&html);
                if outcome.succeeded {
                    tracing::debug!(%url, candidates = outcome.candidates.len(), "markup.hit");
                    return outcome;
                }
                tracing::debug!(%url, html_len = html.len(), "markup.miss");
                last_failure = outcome.failure.unwrap_or(FailureKind::NoCandidates);
            }
            Err(kind) => {
                tracing::debug!(%url, failure = %kind, "markup.fetch_failed");
                last_failure = kind;
            }
        }
    }

    StrategyOutcome::failed(last_failure)
}

/// Runs every extraction layer over `html`.
pub fn extract_from_markup(html: &str) -> StrategyOutcome {
    let mut candidates = Vec::new();
    let mut thumbnail = None;

    collect_json_ld(html, &mut candidates, &mut thumbnail);
    collect_inline_fragments(html, &mut candidates);
    collect_direct_urls(html, &mut candidates);

    if let Some(swept) = THUMBNAIL_RE.find(html) {
        thumbnail = Some(swept.as_str().to_string());
    }

    StrategyOutcome::found(candidates, thumbnail)
}

fn collect_json_ld(html: &str, candidates: &mut Vec<String>, thumbnail: &mut Option<String>) {
    for caps in JSON_LD_RE.captures_iter(html) {
        match serde_json::from_str::<Value>(caps[1].trim()) {
            Ok(doc) => search_tree(&doc, candidates, thumbnail, 0),
            Err(e) => tracing::trace!(error = %e, "markup.json_ld_undecodable"),
        }
    }
}

/// Walks a decoded tree in document order.
///
/// Collects `contentUrl` values and any other string that passes the validator,
/// and fills `thumbnail` from the first `thumbnailUrl`. Stops descending at
/// [`MAX_SEARCH_DEPTH`].
pub fn search_tree(
    node: &Value,
    candidates: &mut Vec<String>,
    thumbnail: &mut Option<String>,
    depth: usize,
) {
    if depth >= MAX_SEARCH_DEPTH {
        return;
    }

    match node {
        Value::Object(map) => {
            for (key, value) in map {
                if key == "thumbnailUrl" && thumbnail.is_none() {
                    *thumbnail = value.as_str().filter(|s| !s.is_empty()).map(str::to_string);
                }
                visit_value(value, candidates, thumbnail, depth);
            }
        }
        Value::Array(items) => {
            for value in items {
                visit_value(value, candidates, thumbnail, depth);
            }
        }
        _ => {}
    }
}

// A `contentUrl` is admitted by the same check as any other string.
fn visit_value(
    value: &Value,
    candidates: &mut Vec<String>,
    thumbnail: &mut Option<String>,
    depth: usize,
) {
    match value {
        Value::Object(_) | Value::Array(_) => search_tree(value, candidates, thumbnail, depth + 1),
        Value::String(s) if is_valid_video_url(s) => candidates.push(s.clone()),
        _ => {}
    }
}

fn collect_inline_fragments(html: &str, candidates: &mut Vec<String>) {
    for re in INLINE_FRAGMENT_RES.iter() {
        for caps in re.captures_iter(html) {
            let fragment = &caps[1];
            match decode_fragment(fragment) {
                Some(decoded) => {
                    let items: Vec<&Value> = match &decoded {
                        Value::Array(items) => items.iter().collect(),
                        Value::Object(map) => map.values().collect(),
                        _ => Vec::new(),
                    };
                    candidates.extend(
                        items
                            .into_iter()
                            .filter_map(|item| item.get("url").and_then(Value::as_str))
                            .filter(|url| is_valid_video_url(url))
                            .map(str::to_string),
                    );
                }
                None if is_valid_video_url(fragment) => candidates.push(fragment.to_string()),
                None => {}
            }
        }
    }
}

/// Decodes a captured fragment as a JSON array or object. A bare list of
/// objects (`{..},{..}`) is retried wrapped in brackets.
fn decode_fragment(fragment: &str) -> Option<Value> {
    let trimmed = fragment.trim();
    let parsed = serde_json::from_str::<Value>(trimmed)
        .ok()
        .or_else(|| serde_json::from_str::<Value>(&format!("[{trimmed}]")).ok())?;
    (parsed.is_array() || parsed.is_object()).then_some(parsed)
}

fn collect_direct_urls(html: &str, candidates: &mut Vec<String>) {
    for re in DIRECT_URL_RES.iter() {
        for m in re.find_iter(html) {
            let url = unescape_slashes(&decode_html_entities(m.as_str()));
            if is_valid_video_url(&url) {
                candidates.push(url);
            }
        }
    }
}
