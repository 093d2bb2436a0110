use serde::Serialize;
use serde_json::{json, Value};
use url::Url;
use worker::*;

use super::json_response;
use crate::config::ResolverConfig;
use crate::scraper::{
    self,
    transport::WorkerTransport,
    types::{DiagnosticEntry, ResolveError, Resolution},
};
use crate::utils::post_id::mentions_post_host;

const USAGE: &str = "GET /?url={TWITTER_URL}";
const USAGE_EXAMPLES: [&str; 2] = [
    "https://twitter.com/username/status/123456789",
    "https://x.com/username/status/123456789",
];

#[derive(Debug, Serialize)]
struct SuccessBody<'a> {
    status: &'static str,
    #[serde(flatten)]
    resolution: &'a Resolution,
    extracted_at: String,
}

#[derive(Debug, Serialize)]
struct FailureBody<'a> {
    status: &'static str,
    message: String,
    #[serde(rename = "tweet_id", skip_serializing_if = "Option::is_none")]
    post_id: Option<&'a str>,
    debug_info: &'a [DiagnosticEntry],
}

pub async fn handle(req: Request, ctx: RouteContext<ResolverConfig>) -> Result<Response> {
    let req_url = req.url().map_err(|e| Error::RustError(e.to_string()))?;

    let reference = match check_reference(get_query_param(&req_url, "url").as_deref()) {
        Ok(reference) => reference,
        Err(rejection) => {
            tracing::info!(reason = %rejection["message"], "resolve.rejected");
            return json_response(&rejection, 400);
        }
    };

    let transport = WorkerTransport::new(ctx.data.clone());
    let outcome = scraper::resolve(&reference, &transport).await;

    let (status, body) = render_outcome(outcome, extracted_at());
    json_response(&body, status)
}

/// Front-door validation, before the resolver runs. The `Err` side is the 400 body.
pub fn check_reference(raw: Option<&str>) -> std::result::Result<String, Value> {
    let reference = raw.map(str::trim).unwrap_or_default();

    if reference.is_empty() {
        return Err(json!({
            "status": "error",
            "message": "Missing required parameter: url",
            "usage": USAGE,
            "examples": USAGE_EXAMPLES,
        }));
    }

    if !mentions_post_host(reference) {
        return Err(json!({
            "status": "error",
            "message": "Invalid URL. Must be a Twitter or X URL.",
            "provided_url": reference,
        }));
    }

    Ok(reference.to_string())
}

/// Maps a resolver result to a status code and JSON body.
pub fn render_outcome(
    outcome: std::result::Result<Resolution, ResolveError>,
    extracted_at: String,
) -> (u16, Value) {
    match render(outcome, extracted_at) {
        Ok(rendered) => rendered,
        Err(fault) => {
            tracing::error!(error = %fault, "resolve.internal_fault");
            (500, internal_error_body(&fault.to_string()))
        }
    }
}

fn render(
    outcome: std::result::Result<Resolution, ResolveError>,
    extracted_at: String,
) -> std::result::Result<(u16, Value), ResolveError> {
    match outcome {
        Ok(resolution) => {
            let body = serde_json::to_value(SuccessBody {
                status: "success",
                resolution: &resolution,
                extracted_at,
            })?;
            Ok((200, body))
        }
        Err(err) if err.is_internal() => Err(err),
        Err(err) => {
            let body = serde_json::to_value(FailureBody {
                status: "error",
                message: err.to_string(),
                post_id: err.post_id(),
                debug_info: err.diagnostics(),
            })?;
            Ok((404, body))
        }
    }
}

pub fn internal_error_body(detail: &str) -> Value {
    json!({
        "status": "error",
        "message": "Internal server error",
        "error": detail,
    })
}

fn extracted_at() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Extracts a single query parameter value from a URL.
fn get_query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
