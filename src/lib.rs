use worker::*;

mod config;
mod handlers;
mod observability;
mod scraper;
mod utils;

use crate::config::ResolverConfig;

fn resolve_handler() -> impl Fn(Request, RouteContext<ResolverConfig>) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response>>>> {
    |req, ctx| Box::pin(async move { handlers::resolve::handle(req, ctx).await })
}

#[event(fetch)]
async fn fetch(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    console_error_panic_hook::set_once();

    let config = ResolverConfig::from_env(&env);
    observability::init_logging(&config);
    config.log_ignored_vars();

    tracing::debug!(method = ?req.method(), path = %req.path(), "request.received");

    match build_router(config).run(req, env).await {
        Ok(resp) => Ok(resp),
        Err(e) => {
            tracing::error!(error = %e, "request.failed");
            handlers::internal_error(&e.to_string())
        }
    }
}

fn build_router(config: ResolverConfig) -> Router<'static, ResolverConfig> {
    Router::with_data(config)
        .get_async("/", resolve_handler())
        .post_async("/", resolve_handler())
        .options("/", handlers::preflight)
}
