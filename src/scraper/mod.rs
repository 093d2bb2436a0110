pub mod assemble;
pub mod legacy_api;
pub mod markup;
pub mod mirror;
pub mod relay;
pub mod strategy;
pub mod syndication;
pub mod transport;
pub mod types;

#[cfg(test)]
pub mod testing;

use self::assemble::assemble;
use self::strategy::{Strategy, CHAIN};
use self::transport::Transport;
use self::types::{DiagnosticEntry, FailureKind, PostReference, ResolveError, Resolution};
use crate::utils::validate::is_valid_video_url;

/// The strategy that ended the chain and what it produced after validation.
#[derive(Debug)]
pub struct ChainHit {
    pub strategy: Strategy,
    pub validated: Vec<String>,
    pub thumbnail: Option<String>,
}

/// Orchestrator: reference -> post ID -> strategy chain -> ranked result.
///
/// An invalid reference fails before any network call. Otherwise strategies
/// run one at a time in [`CHAIN`] order and the first one with validated
/// candidates wins; nothing from other strategies is merged in.
pub async fn resolve<T: Transport>(reference: &str, transport: &T) -> Result<Resolution, ResolveError> {
    let post = PostReference::parse(reference)?;
    tracing::info!(post_id = %post.id, "resolve.start");

    let mut diagnostics = Vec::with_capacity(CHAIN.len());
    let Some(hit) = run_chain(&post, transport, &mut diagnostics).await else {
        tracing::warn!(post_id = %post.id, attempts = diagnostics.len(), "resolve.exhausted");
        return Err(ResolveError::ChainExhausted {
            post_id: post.id,
            diagnostics,
        });
    };

    let resolution = assemble(&post, hit.validated, hit.thumbnail, diagnostics)?;
    tracing::info!(
        post_id = %post.id,
        strategy = hit.strategy.name(),
        variants = resolution.variant_count,
        top = %resolution.top_url,
        "resolve.success"
    );
    Ok(resolution)
}

/// Walks the chain, appending one diagnostic entry per attempt.
pub async fn run_chain<T: Transport>(
    post: &PostReference,
    transport: &T,
    diagnostics: &mut Vec<DiagnosticEntry>,
) -> Option<ChainHit> {
    for strategy in CHAIN {
        let outcome = strategy.attempt(post, transport).await;

        if !outcome.succeeded {
            let failure = outcome.failure.unwrap_or(FailureKind::NoCandidates);
            tracing::debug!(post_id = %post.id, strategy = strategy.name(), %failure, "chain.failed");
            record(diagnostics, strategy, false, failure.to_string());
            continue;
        }

        let total = outcome.candidates.len();
        let validated: Vec<String> = outcome
            .candidates
            .into_iter()
            .filter(|url| is_valid_video_url(url))
            .collect();
        let rejected = total - validated.len();

        if validated.is_empty() {
            tracing::debug!(post_id = %post.id, strategy = strategy.name(), rejected, "chain.all_rejected");
            record(
                diagnostics,
                strategy,
                false,
                format!("{rejected} candidate(s) rejected by validator"),
            );
            continue;
        }

        let note = match rejected {
            0 => format!("found {} video(s)", validated.len()),
            n => format!(
                "found {} video(s), {n} candidate(s) rejected by validator",
                validated.len()
            ),
        };
        tracing::debug!(post_id = %post.id, strategy = strategy.name(), candidates = validated.len(), "chain.succeeded");
        record(diagnostics, strategy, true, note);

        return Some(ChainHit {
            strategy,
            validated,
            thumbnail: outcome.thumbnail,
        });
    }

    None
}

fn record(diagnostics: &mut Vec<DiagnosticEntry>, strategy: Strategy, succeeded: bool, note: String) {
    diagnostics.push(DiagnosticEntry {
        strategy: strategy.name().to_string(),
        succeeded,
        note,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::testing::MockTransport;
    use futures::executor::block_on;
    use serde_json::json;

    const HD: &str = "https://video.twimg.com/ext_tw_video/1/pu/vid/1280x720/hd.mp4";
    const LOW: &str = "https://video.twimg.com/ext_tw_video/1/pu/vid/480x270/low.mp4";
    const PHOTO: &str = "https://pbs.twimg.com/media/photo.jpg";

    fn fx_payload() -> serde_json::Value {
        json!({
            "tweet": {
                "media": {
                    "videos": [{"url": LOW}, {"url": HD}],
                    "photos": [{"url": PHOTO}]
                }
            }
        })
    }

    #[test]
    fn first_success_short_circuits_the_chain() {
        let mock = MockTransport::new().route_json("https://api.fxtwitter.com/", &fx_payload());
        let res = block_on(resolve("https://x.com/u/status/123", &mock)).unwrap();

        assert_eq!(mock.calls().len(), 1);
        assert_eq!(res.diagnostics.len(), 1);
        assert_eq!(res.diagnostics[0].strategy, "FxTwitter API");
        assert!(res.diagnostics[0].succeeded);
        assert_eq!(res.diagnostics[0].note, "found 2 video(s)");
    }

    #[test]
    fn structured_response_end_to_end() {
        let mock = MockTransport::new().route_json("https://api.fxtwitter.com/", &fx_payload());
        let res = block_on(resolve("https://x.com/u/status/123", &mock)).unwrap();

        assert_eq!(res.post_id, "123");
        assert_eq!(res.source_url, "https://x.com/u/status/123");
        assert_eq!(res.variant_count, 2);
        assert_eq!(res.top_url, HD);
        assert_eq!(res.ranked_urls, vec![HD, LOW]);
        assert_eq!(res.thumbnail.as_deref(), Some(PHOTO));
    }

    #[test]
    fn invalid_reference_makes_no_calls() {
        for reference in ["abc", ""] {
            let mock = MockTransport::new();
            let err = block_on(resolve(reference, &mock)).unwrap_err();
            assert!(matches!(err, ResolveError::InvalidReference(_)));
            assert!(mock.calls().is_empty());
        }
    }

    #[test]
    fn exhausted_chain_reports_every_attempt() {
        let mock = MockTransport::new()
            .route_status("https://api.fxtwitter.com/", 404)
            .route_json("https://api.vxtwitter.com/", &json!({"media_extended": []}))
            .route("https://cdn.syndication.twimg.com/", "not json");
        let err = block_on(resolve("https://twitter.com/u/status/5", &mock)).unwrap_err();

        let ResolveError::ChainExhausted { post_id, diagnostics } = &err else {
            panic!("expected ChainExhausted, got {err:?}");
        };
        assert_eq!(post_id, "5");
        let names: Vec<&str> = diagnostics.iter().map(|d| d.strategy.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "FxTwitter API",
                "VxTwitter API",
                "Syndication API",
                "Legacy API v1.1",
                "Web scraping",
                "Third-party relays",
            ]
        );
        assert!(diagnostics.iter().all(|d| !d.succeeded));
        assert_eq!(diagnostics[0].note, "transport failure: http 404");
        assert_eq!(diagnostics[1].note, "no video candidates");
        assert_eq!(diagnostics[2].note, "malformed response: payload did not decode");
        assert!(!err.is_internal());
    }

    #[test]
    fn fully_rejected_strategy_falls_through() {
        let promo = json!({"tweet": {"media": {"videos": [
            {"url": "https://video.twimg.com/promo_reel/clip.mp4"},
            {"url": "https://cdn.example.com/vid/1280x720/a.mp4"}
        ]}}});
        let vx = json!({"media_extended": [{"type": "video", "url": LOW}]});
        let mock = MockTransport::new()
            .route_json("https://api.fxtwitter.com/", &promo)
            .route_json("https://api.vxtwitter.com/", &vx);
        let res = block_on(resolve("https://x.com/u/status/7", &mock)).unwrap();

        assert_eq!(res.ranked_urls, vec![LOW]);
        assert_eq!(res.diagnostics.len(), 2);
        assert!(!res.diagnostics[0].succeeded);
        assert_eq!(res.diagnostics[0].note, "2 candidate(s) rejected by validator");
        assert!(res.diagnostics[1].succeeded);
        assert_eq!(mock.calls().len(), 2);
    }

    #[test]
    fn partially_rejected_candidates_are_noted() {
        let fx = json!({"tweet": {"media": {"videos": [
            {"url": HD},
            {"url": "https://video.twimg.com/onboarding/x.mp4"}
        ]}}});
        let mock = MockTransport::new().route_json("https://api.fxtwitter.com/", &fx);
        let res = block_on(resolve("https://x.com/u/status/7", &mock)).unwrap();
        assert_eq!(res.ranked_urls, vec![HD]);
        assert_eq!(
            res.diagnostics[0].note,
            "found 1 video(s), 1 candidate(s) rejected by validator"
        );
    }

    #[test]
    fn markup_duplicates_collapse_to_one_variant() {
        let page = format!(
            r#"<script type="application/ld+json">{{"video":{{"contentUrl":"{HD}"}}}}</script>
            <video src="{HD}"></video>"#
        );
        let mock = MockTransport::new().route("https://x.com/", page);
        let res = block_on(resolve("https://x.com/u/status/8", &mock)).unwrap();

        assert_eq!(res.ranked_urls, vec![HD]);
        assert_eq!(res.variant_count, 1);
        assert_eq!(res.diagnostics.len(), 5);
        assert_eq!(res.diagnostics[4].strategy, "Web scraping");
        assert!(res.diagnostics[4].succeeded);
    }
}
