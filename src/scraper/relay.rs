use super::markup::first_markup_hit;
use super::transport::Transport;
use super::types::StrategyOutcome;

/// Public download relays, tried in order. `{id}` is the post ID.
const RELAY_TEMPLATES: [&str; 2] = [
    "https://twitsave.com/info?url=https://twitter.com/i/status/{id}",
    "https://ssstwitter.com/info?url=https://twitter.com/i/status/{id}",
];

const RELAY_HEADERS: [(&str, &str); 1] = [("Accept", "application/json, text/html")];

pub fn relay_urls(post_id: &str) -> Vec<String> {
    RELAY_TEMPLATES
        .iter()
        .map(|template| template.replace("{id}", post_id))
        .collect()
}

/// Runs markup extraction over each relay's response until one yields videos.
pub async fn fetch_relays<T: Transport>(post_id: &str, transport: &T) -> StrategyOutcome {
    let urls = relay_urls(post_id);
    tracing::debug!(post_id, relays = urls.len(), "relay.request");
    first_markup_hit(transport, &urls, &RELAY_HEADERS).await
}
