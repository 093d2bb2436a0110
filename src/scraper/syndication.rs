use serde_json::Value;

use super::transport::{fetch_json, Transport};
use super::types::{FailureKind, StrategyOutcome};

const SYNDICATION_ENDPOINT: &str = "https://cdn.syndication.twimg.com/tweet-result";

const SYNDICATION_HEADERS: [(&str, &str); 3] = [
    ("Accept", "application/json"),
    ("Origin", "https://platform.twitter.com"),
    ("Referer", "https://platform.twitter.com/"),
];

pub fn syndication_url(post_id: &str) -> String {
    format!("{SYNDICATION_ENDPOINT}?id={post_id}&lang=en&token=a")
}

/// Embed syndication endpoint used by the official embed widget.
pub async fn fetch_syndication<T: Transport>(post_id: &str, transport: &T) -> StrategyOutcome {
    let url = syndication_url(post_id);
    tracing::debug!(post_id, "syndication.request");

    match fetch_json(transport, &url, &SYNDICATION_HEADERS).await {
        Ok(payload) => parse_syndication(&payload),
        Err(kind) => StrategyOutcome::failed(kind),
    }
}

/// `.mp4` variants under `mediaDetails[*].video_info`, thumbnail from the
/// first `media_url_https`.
pub fn parse_syndication(payload: &Value) -> StrategyOutcome {
    if !payload.is_object() {
        return StrategyOutcome::failed(FailureKind::Malformed("expected an object".into()));
    }
    let Some(details) = payload.get("mediaDetails").and_then(Value::as_array) else {
        return StrategyOutcome::failed(FailureKind::NoCandidates);
    };

    let mut candidates = Vec::new();
    let mut thumbnail = None;

    for media in details {
        if thumbnail.is_none() {
            thumbnail = media
                .get("media_url_https")
                .and_then(Value::as_str)
                .map(str::to_string);
        }

        let variants = media
            .pointer("/video_info/variants")
            .and_then(Value::as_array)
            .into_iter()
            .flatten();
        for variant in variants {
            if let Some(url) = variant.get("url").and_then(Value::as_str) {
                if url.contains(".mp4") {
                    candidates.push(url.to_string());
                }
            }
        }
    }

    StrategyOutcome::found(candidates, thumbnail)
}
