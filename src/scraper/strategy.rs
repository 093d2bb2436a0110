use super::legacy_api::fetch_legacy_api;
use super::markup::fetch_post_page;
use super::mirror::{fetch_fxtwitter, fetch_vxtwitter};
use super::relay::fetch_relays;
use super::syndication::fetch_syndication;
use super::transport::Transport;
use super::types::{PostReference, StrategyOutcome};

/// One independent way of finding a post's videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    FxTwitter,
    VxTwitter,
    Syndication,
    LegacyApi,
    WebScrape,
    ThirdPartyRelay,
}

/// Fixed priority order of the resolution chain.
pub const CHAIN: [Strategy; 6] = [
    Strategy::FxTwitter,
    Strategy::VxTwitter,
    Strategy::Syndication,
    Strategy::LegacyApi,
    Strategy::WebScrape,
    Strategy::ThirdPartyRelay,
];

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Self::FxTwitter => "FxTwitter API",
            Self::VxTwitter => "VxTwitter API",
            Self::Syndication => "Syndication API",
            Self::LegacyApi => "Legacy API v1.1",
            Self::WebScrape => "Web scraping",
            Self::ThirdPartyRelay => "Third-party relays",
        }
    }

    /// Never fails outright: every error is folded into the outcome.
    pub async fn attempt<T: Transport>(self, post: &PostReference, transport: &T) -> StrategyOutcome {
        match self {
            Self::FxTwitter => fetch_fxtwitter(post, transport).await,
            Self::VxTwitter => fetch_vxtwitter(post, transport).await,
            Self::Syndication => fetch_syndication(&post.id, transport).await,
            Self::LegacyApi => fetch_legacy_api(&post.id, transport).await,
            Self::WebScrape => fetch_post_page(post, transport).await,
            Self::ThirdPartyRelay => fetch_relays(&post.id, transport).await,
        }
    }
}
