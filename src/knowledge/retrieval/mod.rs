#[cfg(test)]
mod tests;

use itertools::Itertools;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::RetrievalConfig;
use crate::embeddings::EmbeddingProvider;
use crate::knowledge::store::{Document, DocumentStore};

/// Number of passages considered during context assembly.
const CONTEXT_TOP_K: usize = 3;
/// A truncated trailing passage is only worth including above this size.
const MIN_TRUNCATED_CHARS: usize = 100;
const TRUNCATION_MARKER: &str = "...";

/// Weights of the lexical composite score.
const CONTENT_WEIGHT: f32 = 0.7;
const TITLE_WEIGHT: f32 = 0.3;
const SUBSTRING_SCORE: f32 = 1.0;
const TOKEN_SCORE: f32 = 0.5;
const CHAR_OVERLAP_WEIGHT: f32 = 0.3;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub document: Document,
    pub score: f32,
}

/// Ranks documents against a query and assembles length-budgeted context.
///
/// Prefers the vector index; any missing index, dimensionality mismatch, or
/// search error degrades to deterministic lexical scoring instead of
/// surfacing an error.
pub struct RetrievalEngine {
    store: Arc<DocumentStore>,
    provider: Arc<EmbeddingProvider>,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    #[inline]
    pub fn new(
        store: Arc<DocumentStore>,
        provider: Arc<EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// The `top_k` most relevant documents scoring at least `min_score`.
    #[inline]
    pub fn search(&self, query: &str, top_k: usize, min_score: f32) -> Vec<ScoredDocument> {
        let documents = self.store.documents();
        if documents.is_empty() {
            return Vec::new();
        }

        if let Some(state) = self.store.search_state() {
            let batch = self.provider.embed(&[query.to_string()]);
            if let Some(query_vector) = batch.vectors.into_iter().next() {
                match state.index.search(&query_vector, top_k, min_score) {
                    Ok(hits) => {
                        debug!(
                            "Vector search ('{}' tier query) returned {} hits",
                            batch.tier,
                            hits.len()
                        );
                        return hits
                            .into_iter()
                            .filter_map(|(row, score)| {
                                documents.get(row).map(|document| ScoredDocument {
                                    document: document.clone(),
                                    score,
                                })
                            })
                            .collect();
                    }
                    Err(e) => {
                        warn!("Vector search failed: {}, using lexical scoring", e);
                    }
                }
            }
        }

        lexical_search(query, &documents, top_k, min_score)
    }

    /// Assemble up to `max_len` characters of ranked context for a query.
    ///
    /// Blocks are `[title]` headers followed by content, joined by blank
    /// lines. The first block that would overflow the budget is truncated
    /// (if enough room remains to be useful) and ends assembly; later blocks
    /// are dropped, never reordered.
    #[inline]
    pub fn context(&self, query: &str, max_len: usize) -> String {
        let results = self.search(query, CONTEXT_TOP_K, self.config.min_score);
        if results.is_empty() {
            return String::new();
        }

        let mut parts: Vec<String> = Vec::new();
        let mut used = 0usize;

        for result in results {
            let separator = if parts.is_empty() { 0 } else { 2 };
            let block = format!("[{}]\n{}", result.document.title, result.document.content);
            let block_len = block.chars().count();

            if used + separator + block_len <= max_len {
                used += separator + block_len;
                parts.push(block);
                continue;
            }

            let remaining = max_len.saturating_sub(used + separator);
            if remaining > MIN_TRUNCATED_CHARS {
                let header_len = result.document.title.chars().count() + TRUNCATION_MARKER.len() + 3;
                let body_budget = remaining.saturating_sub(header_len);
                let truncated: String =
                    result.document.content.chars().take(body_budget).collect();
                parts.push(format!(
                    "[{}]\n{}{}",
                    result.document.title, truncated, TRUNCATION_MARKER
                ));
            }
            break;
        }

        parts.join("\n\n")
    }
}

/// Composite text-match scoring used when no vector index is usable.
///
/// Deterministic for identical inputs; ties keep original document order.
fn lexical_search(
    query: &str,
    documents: &[Document],
    top_k: usize,
    min_score: f32,
) -> Vec<ScoredDocument> {
    let query_lower = query.to_lowercase();
    let tokens: Vec<&str> = query_lower
        .split_whitespace()
        .filter(|token| token.chars().count() >= 2)
        .collect();
    let query_chars: HashSet<char> = query_lower.chars().collect();

    documents
        .iter()
        .filter_map(|document| {
            let content_score =
                field_score(&document.content.to_lowercase(), &query_lower, &tokens, &query_chars);
            let title_score =
                field_score(&document.title.to_lowercase(), &query_lower, &tokens, &query_chars);

            let score = CONTENT_WEIGHT * content_score + TITLE_WEIGHT * title_score;
            (score > 0.0).then(|| ScoredDocument {
                document: document.clone(),
                score,
            })
        })
        .sorted_by(|a, b| b.score.total_cmp(&a.score))
        .take(top_k)
        .filter(|scored| scored.score >= min_score)
        .collect()
}

fn field_score(
    field_lower: &str,
    query_lower: &str,
    tokens: &[&str],
    query_chars: &HashSet<char>,
) -> f32 {
    let mut score = 0.0;

    if field_lower.contains(query_lower) {
        score += SUBSTRING_SCORE;
    }

    for token in tokens {
        if field_lower.contains(token) {
            score += TOKEN_SCORE;
        }
    }

    if !query_chars.is_empty() {
        let field_chars: HashSet<char> = field_lower.chars().collect();
        let overlap = query_chars.intersection(&field_chars).count() as f32;
        score += CHAR_OVERLAP_WEIGHT * overlap / query_chars.len() as f32;
    }

    score
}
