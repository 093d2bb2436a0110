use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::utils::post_id::extract_post_id;

/// The caller-supplied reference and the post ID resolved from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReference {
    pub raw: String,
    pub id: String,
}

impl PostReference {
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let id = extract_post_id(raw)
            .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
            .ok_or_else(|| ResolveError::InvalidReference(raw.to_string()))?;
        Ok(Self {
            raw: raw.to_string(),
            id,
        })
    }
}

/// A validated video URL and its quality score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub score: u64,
}

/// Why a single strategy produced nothing. Never escapes the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Network error, timeout, or a non-2xx/3xx final status.
    Transport(String),
    /// Body did not decode or lacked the expected shape.
    Malformed(String),
    /// Decoded fine but held no video candidates.
    NoCandidates,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport failure: {msg}"),
            Self::Malformed(msg) => write!(f, "malformed response: {msg}"),
            Self::NoCandidates => write!(f, "no video candidates"),
        }
    }
}

/// Raw result of one strategy attempt, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyOutcome {
    pub succeeded: bool,
    pub candidates: Vec<String>,
    pub thumbnail: Option<String>,
    pub failure: Option<FailureKind>,
}

impl StrategyOutcome {
    /// Success when at least one candidate was found, `NoCandidates` otherwise.
    pub fn found(candidates: Vec<String>, thumbnail: Option<String>) -> Self {
        if candidates.is_empty() {
            return Self::failed(FailureKind::NoCandidates);
        }
        Self {
            succeeded: true,
            candidates,
            thumbnail,
            failure: None,
        }
    }

    pub fn failed(kind: FailureKind) -> Self {
        Self {
            succeeded: false,
            candidates: Vec::new(),
            thumbnail: None,
            failure: Some(kind),
        }
    }
}

/// One line of the per-request diagnostic trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticEntry {
    pub strategy: String,
    pub succeeded: bool,
    pub note: String,
}

/// Successful resolution, serialized with the public field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    #[serde(rename = "tweet_id")]
    pub post_id: String,
    #[serde(rename = "tweet_url")]
    pub source_url: String,
    #[serde(rename = "video_urls")]
    pub ranked_urls: Vec<String>,
    #[serde(rename = "highest_quality")]
    pub top_url: String,
    pub thumbnail: Option<String>,
    #[serde(rename = "total_variants")]
    pub variant_count: usize,
    #[serde(rename = "debug_info")]
    pub diagnostics: Vec<DiagnosticEntry>,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid Twitter/X URL format")]
    InvalidReference(String),

    #[error("Could not extract video. The tweet may not contain video or is protected.")]
    ChainExhausted {
        post_id: String,
        diagnostics: Vec<DiagnosticEntry>,
    },

    #[error("No valid video URLs extracted")]
    NoValidVideos {
        post_id: String,
        diagnostics: Vec<DiagnosticEntry>,
    },

    #[error("internal fault: {0}")]
    Internal(String),
}

impl ResolveError {
    pub fn post_id(&self) -> Option<&str> {
        match self {
            Self::ChainExhausted { post_id, .. } | Self::NoValidVideos { post_id, .. } => {
                Some(post_id)
            }
            Self::InvalidReference(_) | Self::Internal(_) => None,
        }
    }

    pub fn diagnostics(&self) -> &[DiagnosticEntry] {
        match self {
            Self::ChainExhausted { diagnostics, .. } | Self::NoValidVideos { diagnostics, .. } => {
                diagnostics
            }
            Self::InvalidReference(_) | Self::Internal(_) => &[],
        }
    }

    /// Everything except an internal fault is a not-found style failure.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl From<serde_json::Error> for ResolveError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(format!("json encoding failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_reference_shapes() {
        for raw in [
            "https://x.com/u/status/123",
            "https://twitter.com/i/web/status/123",
            "123",
        ] {
            let post = PostReference::parse(raw).unwrap();
            assert_eq!(post.id, "123");
            assert_eq!(post.raw, raw);
        }
    }

    #[test]
    fn invalid_reference_is_reported() {
        for raw in ["abc", ""] {
            let err = PostReference::parse(raw).unwrap_err();
            assert!(matches!(err, ResolveError::InvalidReference(ref r) if r == raw));
            assert!(err.post_id().is_none());
            assert!(err.diagnostics().is_empty());
        }
    }

    #[test]
    fn found_without_candidates_is_a_failure() {
        let outcome = StrategyOutcome::found(Vec::new(), Some("thumb".into()));
        assert!(!outcome.succeeded);
        assert_eq!(outcome.failure, Some(FailureKind::NoCandidates));
        assert!(outcome.thumbnail.is_none());
    }

    #[test]
    fn resolution_uses_public_field_names() {
        let resolution = Resolution {
            post_id: "1".into(),
            source_url: "https://x.com/u/status/1".into(),
            ranked_urls: vec!["https://video.twimg.com/a.mp4".into()],
            top_url: "https://video.twimg.com/a.mp4".into(),
            thumbnail: None,
            variant_count: 1,
            diagnostics: vec![DiagnosticEntry {
                strategy: "FxTwitter API".into(),
                succeeded: true,
                note: "found 1 video(s)".into(),
            }],
        };
        let json = serde_json::to_value(&resolution).unwrap();
        assert_eq!(json["tweet_id"], "1");
        assert_eq!(json["highest_quality"], "https://video.twimg.com/a.mp4");
        assert_eq!(json["total_variants"], 1);
        assert_eq!(json["debug_info"][0]["strategy"], "FxTwitter API");
        assert!(json["thumbnail"].is_null());
    }
}
