use serde_json::Value;

use super::transport::{fetch_json, Transport};
use super::types::{FailureKind, StrategyOutcome};

const STATUSES_SHOW_ENDPOINT: &str = "https://api.twitter.com/1.1/statuses/show.json";

const JSON_HEADERS: [(&str, &str); 1] = [("Accept", "application/json")];

pub fn statuses_show_url(post_id: &str) -> String {
    format!("{STATUSES_SHOW_ENDPOINT}?id={post_id}&include_entities=true&tweet_mode=extended")
}

/// Public v1.1 `statuses/show` endpoint.
pub async fn fetch_legacy_api<T: Transport>(post_id: &str, transport: &T) -> StrategyOutcome {
    let url = statuses_show_url(post_id);
    tracing::debug!(post_id, "legacy_api.request");

    match fetch_json(transport, &url, &JSON_HEADERS).await {
        Ok(status) => extract_legacy_media(&status),
        Err(kind) => StrategyOutcome::failed(kind),
    }
}

/// Prefers `video/mp4` variants of video and GIF media in `extended_entities`;
/// falls back to any `.mp4` variant under `entities`.
///
/// Fields are read loosely: a missing or off-type field only removes what it
/// would have contributed.
pub fn extract_legacy_media(status: &Value) -> StrategyOutcome {
    if !status.is_object() {
        return StrategyOutcome::failed(FailureKind::Malformed("expected an object".into()));
    }

    let mut candidates = Vec::new();
    let mut thumbnail = None;

    let extended = media_list(status, "/extended_entities/media")
        .filter(|m| matches!(m.get("type").and_then(Value::as_str), Some("video" | "animated_gif")));
    for media in extended {
        for variant in variants(media) {
            if variant.get("content_type").and_then(Value::as_str) == Some("video/mp4") {
                if let Some(url) = variant.get("url").and_then(Value::as_str) {
                    candidates.push(url.to_string());
                }
            }
        }
        if thumbnail.is_none() {
            thumbnail = media
                .get("media_url_https")
                .and_then(Value::as_str)
                .map(str::to_string);
        }
    }

    if candidates.is_empty() {
        for media in media_list(status, "/entities/media") {
            candidates.extend(
                variants(media)
                    .filter_map(|v| v.get("url").and_then(Value::as_str))
                    .filter(|url| url.contains(".mp4"))
                    .map(str::to_string),
            );
        }
    }

    StrategyOutcome::found(candidates, thumbnail)
}

fn media_list<'a>(status: &'a Value, pointer: &str) -> impl Iterator<Item = &'a Value> {
    status
        .pointer(pointer)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn variants(media: &Value) -> impl Iterator<Item = &Value> {
    media
        .pointer("/video_info/variants")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}
