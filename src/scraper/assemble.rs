use super::types::{Candidate, DiagnosticEntry, PostReference, ResolveError, Resolution};
use crate::utils::quality::quality_score;

/// Drops repeated URLs, keeping the first occurrence of each.
pub fn dedup_urls(urls: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(urls.len());
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

/// Scores each URL and orders by descending score. Ties keep input order.
pub fn rank_candidates(urls: Vec<String>) -> Vec<Candidate> {
    let mut ranked: Vec<Candidate> = urls
        .into_iter()
        .map(|url| Candidate {
            score: quality_score(&url),
            url,
        })
        .collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

/// Packages the winning strategy's validated URLs into the final result.
pub fn assemble(
    post: &PostReference,
    validated: Vec<String>,
    thumbnail: Option<String>,
    diagnostics: Vec<DiagnosticEntry>,
) -> Result<Resolution, ResolveError> {
    let ranked = rank_candidates(dedup_urls(validated));

    let Some(top) = ranked.first() else {
        return Err(ResolveError::NoValidVideos {
            post_id: post.id.clone(),
            diagnostics,
        });
    };
    let top_url = top.url.clone();

    let ranked_urls: Vec<String> = ranked.into_iter().map(|c| c.url).collect();
    Ok(Resolution {
        post_id: post.id.clone(),
        source_url: post.raw.clone(),
        variant_count: ranked_urls.len(),
        top_url,
        ranked_urls,
        thumbnail,
        diagnostics,
    })
}
