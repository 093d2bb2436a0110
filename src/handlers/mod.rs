pub mod resolve;

use serde::Serialize;
use worker::*;

use crate::config::ResolverConfig;

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

fn cors_headers() -> Result<Headers> {
    let headers = Headers::new();
    headers.set("Access-Control-Allow-Origin", "*")?;
    headers.set("Access-Control-Allow-Methods", ALLOWED_METHODS)?;
    headers.set("Access-Control-Allow-Headers", "Content-Type")?;
    Ok(headers)
}

/// Pretty-printed JSON response with CORS headers.
pub fn json_response<T: Serialize>(body: &T, status: u16) -> Result<Response> {
    let text = serde_json::to_string_pretty(body)
        .map_err(|e| Error::RustError(format!("JSON serialization error: {e}")))?;

    let headers = cors_headers()?;
    headers.set("Content-Type", "application/json; charset=utf-8")?;

    Ok(Response::ok(text)?.with_status(status).with_headers(headers))
}

/// CORS preflight.
pub fn preflight(_req: Request, _ctx: RouteContext<ResolverConfig>) -> Result<Response> {
    Ok(Response::empty()?.with_status(200).with_headers(cors_headers()?))
}

/// Last-resort 500 for faults outside the resolver.
pub fn internal_error(detail: &str) -> Result<Response> {
    json_response(&resolve::internal_error_body(detail), 500)
}
