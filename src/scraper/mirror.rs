use serde_json::Value;

use super::transport::{fetch_json, Transport};
use super::types::{FailureKind, PostReference, StrategyOutcome};
use crate::utils::post_id::rehost_post_url;

const FXTWITTER_HOST: &str = "api.fxtwitter.com";
const VXTWITTER_HOST: &str = "api.vxtwitter.com";

const JSON_HEADERS: [(&str, &str); 1] = [("Accept", "application/json")];

/// FxTwitter mirror: the reference path on `api.fxtwitter.com`.
pub async fn fetch_fxtwitter<T: Transport>(post: &PostReference, transport: &T) -> StrategyOutcome {
    let url = rehost_post_url(&post.raw, &post.id, FXTWITTER_HOST);
    tracing::debug!(post_id = %post.id, %url, "fxtwitter.request");

    match fetch_json(transport, &url, &JSON_HEADERS).await {
        Ok(payload) => parse_fxtwitter(&payload),
        Err(kind) => StrategyOutcome::failed(kind),
    }
}

/// Videos at `tweet.media.videos[*].url`, thumbnail at `tweet.media.photos[0].url`.
pub fn parse_fxtwitter(payload: &Value) -> StrategyOutcome {
    let Some(tweet) = payload.get("tweet").filter(|t| t.is_object()) else {
        return StrategyOutcome::failed(FailureKind::Malformed("missing tweet object".into()));
    };
    let Some(media) = tweet.get("media") else {
        return StrategyOutcome::failed(FailureKind::NoCandidates);
    };

    let candidates = media
        .get("videos")
        .and_then(Value::as_array)
        .map(|videos| {
            videos
                .iter()
                .filter_map(|v| v.get("url").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let thumbnail = media
        .pointer("/photos/0/url")
        .and_then(Value::as_str)
        .map(str::to_string);

    StrategyOutcome::found(candidates, thumbnail)
}

/// VxTwitter mirror: the reference path on `api.vxtwitter.com`.
pub async fn fetch_vxtwitter<T: Transport>(post: &PostReference, transport: &T) -> StrategyOutcome {
    let url = rehost_post_url(&post.raw, &post.id, VXTWITTER_HOST);
    tracing::debug!(post_id = %post.id, %url, "vxtwitter.request");

    match fetch_json(transport, &url, &JSON_HEADERS).await {
        Ok(payload) => parse_vxtwitter(&payload),
        Err(kind) => StrategyOutcome::failed(kind),
    }
}

/// `media_extended` entries typed `video`; thumbnail from the first entry.
pub fn parse_vxtwitter(payload: &Value) -> StrategyOutcome {
    if !payload.is_object() {
        return StrategyOutcome::failed(FailureKind::Malformed("expected an object".into()));
    }
    let Some(media) = payload.get("media_extended").and_then(Value::as_array) else {
        return StrategyOutcome::failed(FailureKind::NoCandidates);
    };

    let candidates = media
        .iter()
        .filter(|m| m.get("type").and_then(Value::as_str) == Some("video"))
        .filter_map(|m| m.get("url").and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    let thumbnail = media
        .first()
        .and_then(|m| m.get("thumbnail_url"))
        .and_then(Value::as_str)
        .map(str::to_string);

    StrategyOutcome::found(candidates, thumbnail)
}
