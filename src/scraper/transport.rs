use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures::future::{select, Either};
use serde_json::Value;
use url::Url;
use worker::*;

use super::types::FailureKind;
use crate::config::ResolverConfig;

/// What a strategy learns from one outbound call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResponse {
    /// True only for a 2xx/3xx final response with no transport error.
    pub succeeded: bool,
    pub body: Option<String>,
    pub status: u16,
    pub error: Option<String>,
}

impl FetchResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            body: None,
            status: 0,
            error: Some(message.into()),
        }
    }
}

/// The outbound HTTP seam. Strategies only ever talk to the network through this.
///
/// Futures are not required to be `Send`: Workers run one request per isolate task.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn fetch(&self, url: &str, headers: &[(&str, &str)]) -> FetchResponse;
}

/// Fetches `url` and returns its body, or the reason the call is unusable.
pub async fn fetch_body<T: Transport>(
    transport: &T,
    url: &str,
    headers: &[(&str, &str)],
) -> std::result::Result<String, FailureKind> {
    let resp = transport.fetch(url, headers).await;
    if let Some(error) = resp.error {
        return Err(FailureKind::Transport(error));
    }
    if !resp.succeeded {
        return Err(FailureKind::Transport(format!("http {}", resp.status)));
    }
    resp.body
        .filter(|body| !body.trim().is_empty())
        .ok_or_else(|| FailureKind::Malformed("empty body".into()))
}

/// Like [`fetch_body`] but also decodes the body as JSON.
pub async fn fetch_json<T: Transport>(
    transport: &T,
    url: &str,
    headers: &[(&str, &str)],
) -> std::result::Result<Value, FailureKind> {
    let body = fetch_body(transport, url, headers).await?;
    serde_json::from_str(&body).map_err(|_| FailureKind::Malformed("payload did not decode".into()))
}

/// `Transport` backed by the Workers `fetch` API.
pub struct WorkerTransport {
    config: ResolverConfig,
}

impl WorkerTransport {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Sends a GET and follows up to `max_redirects` 3xx hops by hand so the
    /// hop count stays bounded. Each hop must produce headers within
    /// `connect_timeout`.
    async fn fetch_following_redirects(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<(u16, String)> {
        let mut trail = RedirectTrail::new(url, self.config.max_redirects).map_err(Error::RustError)?;

        loop {
            let request = self.build_request(trail.current().as_str(), headers)?;
            let fetch = Fetch::Request(request);
            let sent = fetch.send();
            let mut resp = with_timeout(sent, self.config.connect_timeout)
                .await
                .ok_or_else(|| {
                    Error::RustError(format!(
                        "no response within {}s",
                        self.config.connect_timeout.as_secs()
                    ))
                })??;

            let status = resp.status_code();
            let location = resp.headers().get("Location")?;
            match trail.next(status, location.as_deref()).map_err(Error::RustError)? {
                Hop::Follow => {
                    tracing::debug!(status, location = %trail.current(), "transport.redirect");
                }
                Hop::Final => {
                    let body = resp.text().await?;
                    return Ok((status, body));
                }
            }
        }
    }

    fn build_request(&self, url: &str, headers: &[(&str, &str)]) -> Result<Request> {
        let request_headers = Headers::new();
        for (name, value) in headers {
            request_headers.set(name, value)?;
        }
        if !request_headers.has("User-Agent")? {
            request_headers.set("User-Agent", &self.config.user_agent)?;
        }

        let mut init = RequestInit::new();
        init.with_method(Method::Get)
            .with_headers(request_headers)
            .with_redirect(RequestRedirect::Manual);

        Request::new_with_init(url, &init)
    }
}

impl Transport for WorkerTransport {
    async fn fetch(&self, url: &str, headers: &[(&str, &str)]) -> FetchResponse {
        let call = self.fetch_following_redirects(url, headers);

        match with_timeout(call, self.config.request_timeout).await {
            Some(Ok((status, body))) => {
                tracing::debug!(url, status, body_len = body.len(), "transport.response");
                FetchResponse {
                    succeeded: (200..400).contains(&status),
                    body: Some(body),
                    status,
                    error: None,
                }
            }
            Some(Err(e)) => {
                tracing::debug!(url, error = %e, "transport.error");
                FetchResponse::error(e.to_string())
            }
            None => {
                tracing::debug!(url, "transport.timeout");
                FetchResponse::error(format!(
                    "timed out after {}s",
                    self.config.request_timeout.as_secs()
                ))
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Hop {
    Follow,
    Final,
}

/// Where a manual redirect chain currently points and how many hops it used.
#[derive(Debug)]
struct RedirectTrail {
    current: Url,
    followed: u8,
    limit: u8,
}

impl RedirectTrail {
    fn new(url: &str, limit: u8) -> std::result::Result<Self, String> {
        let current = Url::parse(url).map_err(|e| e.to_string())?;
        Ok(Self {
            current,
            followed: 0,
            limit,
        })
    }

    fn current(&self) -> &Url {
        &self.current
    }

    /// A 3xx with a `Location` moves the trail; anything else is the final
    /// response. `Location` may be relative or absolute.
    fn next(&mut self, status: u16, location: Option<&str>) -> std::result::Result<Hop, String> {
        let Some(location) = location.filter(|_| (300..400).contains(&status)) else {
            return Ok(Hop::Final);
        };
        if self.followed >= self.limit {
            return Err(format!("too many redirects (limit {})", self.limit));
        }
        self.current = self.current.join(location).map_err(|e| e.to_string())?;
        self.followed += 1;
        Ok(Hop::Follow)
    }
}

/// Races a future against a Workers timer. `None` means the timer won.
async fn with_timeout<F: Future>(fut: F, limit: Duration) -> Option<F::Output> {
    let fut = pin!(fut);
    let timer = pin!(Delay::from(limit));
    match select(fut, timer).await {
        Either::Left((output, _)) => Some(output),
        Either::Right(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::testing::MockTransport;
    use futures::executor::block_on;

    #[test]
    fn redirect_resolves_relative_and_absolute_locations() {
        let mut trail = RedirectTrail::new("https://t.co/abc?x=1", 5).unwrap();
        assert_eq!(trail.next(301, Some("/i/status/9")), Ok(Hop::Follow));
        assert_eq!(trail.current().as_str(), "https://t.co/i/status/9");
        assert_eq!(trail.next(302, Some("https://x.com/u/status/9")), Ok(Hop::Follow));
        assert_eq!(trail.current().as_str(), "https://x.com/u/status/9");
        assert_eq!(trail.next(200, None), Ok(Hop::Final));
    }

    #[test]
    fn redirect_without_location_is_final() {
        let mut trail = RedirectTrail::new("https://x.com/u/status/9", 5).unwrap();
        assert_eq!(trail.next(304, None), Ok(Hop::Final));
        assert_eq!(trail.current().as_str(), "https://x.com/u/status/9");
    }

    #[test]
    fn location_on_success_status_is_ignored() {
        let mut trail = RedirectTrail::new("https://x.com/a", 5).unwrap();
        assert_eq!(trail.next(200, Some("/b")), Ok(Hop::Final));
        assert_eq!(trail.current().as_str(), "https://x.com/a");
    }

    #[test]
    fn redirect_hops_are_bounded() {
        let mut trail = RedirectTrail::new("https://x.com/0", 2).unwrap();
        assert_eq!(trail.next(302, Some("/1")), Ok(Hop::Follow));
        assert_eq!(trail.next(302, Some("/2")), Ok(Hop::Follow));
        assert_eq!(
            trail.next(302, Some("/3")),
            Err("too many redirects (limit 2)".to_string())
        );
        assert_eq!(trail.current().as_str(), "https://x.com/2");
    }

    #[test]
    fn unparseable_start_url_is_rejected() {
        assert!(RedirectTrail::new("not a url", 5).is_err());
    }

    #[test]
    fn body_of_successful_response() {
        let mock = MockTransport::new().route("https://a.test/", "hello");
        let body = block_on(fetch_body(&mock, "https://a.test/x", &[])).unwrap();
        assert_eq!(body, "hello");
    }

    #[test]
    fn non_success_status_is_a_transport_failure() {
        let mock = MockTransport::new().route_status("https://a.test/", 403);
        let err = block_on(fetch_body(&mock, "https://a.test/x", &[])).unwrap_err();
        assert_eq!(err, FailureKind::Transport("http 403".into()));
    }

    #[test]
    fn unrouted_call_is_a_transport_failure() {
        let mock = MockTransport::new();
        let err = block_on(fetch_body(&mock, "https://a.test/x", &[])).unwrap_err();
        assert!(matches!(err, FailureKind::Transport(_)));
    }

    #[test]
    fn blank_body_is_malformed() {
        let mock = MockTransport::new().route("https://a.test/", "  ");
        let err = block_on(fetch_body(&mock, "https://a.test/x", &[])).unwrap_err();
        assert_eq!(err, FailureKind::Malformed("empty body".into()));
    }

    #[test]
    fn undecodable_json_is_malformed() {
        let mock = MockTransport::new().route("https://a.test/", "<html>");
        let err = block_on(fetch_json(&mock, "https://a.test/x", &[])).unwrap_err();
        assert_eq!(err, FailureKind::Malformed("payload did not decode".into()));
    }
}
