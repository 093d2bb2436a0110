use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Hosts that serve X/Twitter posts.
pub const POST_HOSTS: [&str; 2] = ["twitter.com", "x.com"];

/// Reference shapes tried in order; the first capture of the first match is the post ID.
const POST_ID_PATTERNS: [&str; 3] = [
    r"(?i)(?:twitter\.com|x\.com)/\w+/status/(\d+)",
    r"(?i)(?:twitter\.com|x\.com)/i/web/status/(\d+)",
    r"^(\d+)$",
];

static POST_ID_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    POST_ID_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("valid post id pattern"))
        .collect()
});

/// Extracts the numeric post ID from a status URL or a bare ID.
///
/// Handles `https://x.com/<user>/status/<id>`, `https://twitter.com/i/web/status/<id>`
/// and an all-digit string. Query strings and trailing path segments are ignored.
pub fn extract_post_id(reference: &str) -> Option<String> {
    POST_ID_RES.iter().find_map(|re| {
        re.captures(reference)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Returns true if the text mentions one of the post hosts anywhere (case-insensitive).
pub fn mentions_post_host(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    POST_HOSTS.iter().any(|host| lower.contains(host))
}

/// Returns true for `x.com`, `twitter.com` and their subdomains (`www.`, `mobile.`).
pub fn is_post_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    POST_HOSTS
        .iter()
        .any(|known| host == *known || host.ends_with(&format!(".{known}")))
}

/// Rewrites a post reference onto another host, keeping its path.
///
/// Query and fragment are dropped. References that are not absolute post URLs
/// (bare IDs, scheme-less text) fall back to `https://<host>/i/status/<id>`.
pub fn rehost_post_url(raw: &str, post_id: &str, host: &str) -> String {
    if let Ok(url) = Url::parse(raw) {
        if url.host_str().is_some_and(is_post_host) {
            return format!("https://{}{}", host, url.path());
        }
    }
    format!("https://{host}/i/status/{post_id}")
}
