use super::*;
use crate::embeddings::provider::EmbeddingTier;
use crate::{GatewayError, Result};
use tempfile::TempDir;

/// Fixed three-dimensional embedding counting keyword occurrences, so
/// vector-path ranking is fully predictable.
struct KeywordTier;

impl EmbeddingTier for KeywordTier {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                vec![
                    lower.matches("alpha").count() as f32,
                    lower.matches("beta").count() as f32,
                    lower.matches("gamma").count() as f32,
                ]
            })
            .collect())
    }
}

/// Always fails, forcing the provider down to the lexical tier.
struct DeadTier;

impl EmbeddingTier for DeadTier {
    fn name(&self) -> &'static str {
        "dead"
    }

    fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(GatewayError::Embedding("unreachable".to_string()))
    }
}

struct Fixture {
    _temp_dir: TempDir,
    engine: RetrievalEngine,
}

fn fixture(tier: Box<dyn EmbeddingTier>, docs: &[(&str, &str)]) -> Fixture {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let store = Arc::new(DocumentStore::open(temp_dir.path()).expect("open should succeed"));
    let provider = Arc::new(EmbeddingProvider::new(vec![tier]));

    for (title, content) in docs {
        store
            .add(
                &provider,
                (*content).to_string(),
                (*title).to_string(),
                String::new(),
                Vec::new(),
            )
            .expect("add should succeed");
    }

    let engine = RetrievalEngine::new(store, provider, RetrievalConfig::default());
    Fixture {
        _temp_dir: temp_dir,
        engine,
    }
}

#[test]
fn empty_store_returns_nothing() {
    let fixture = fixture(Box::new(KeywordTier), &[]);

    assert!(fixture.engine.search("anything", 5, 0.0).is_empty());
    assert_eq!(fixture.engine.context("anything", 500), "");
}

#[test]
fn vector_search_ranks_by_similarity() {
    let fixture = fixture(
        Box::new(KeywordTier),
        &[
            ("About alpha", "alpha alpha alpha"),
            ("About beta", "beta beta"),
            ("Mixed", "alpha beta gamma"),
        ],
    );

    let results = fixture.engine.search("alpha", 3, 0.0);

    assert_eq!(results[0].document.title, "About alpha");
    assert!((results[0].score - 1.0).abs() < 1e-5);
    assert!(results[0].score > results[1].score);
}

#[test]
fn vector_search_min_score_filters() {
    let fixture = fixture(
        Box::new(KeywordTier),
        &[
            ("About alpha", "alpha alpha"),
            ("About beta", "beta beta beta"),
        ],
    );

    let results = fixture.engine.search("alpha", 5, 0.9);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document.title, "About alpha");
}

#[test]
fn exact_title_match_ranks_first_lexically() {
    let fixture = fixture(
        Box::new(DeadTier),
        &[
            ("Grain futures", "commodity markets move on harvest reports"),
            ("Sliding window rate limiting", "admit requests using a trailing window of timestamps"),
            ("Bird migration", "seasonal movement patterns of arctic terns"),
        ],
    );

    // Query embedding comes from a different lexical batch, so the index
    // dimensionality cannot match and scoring degrades to lexical.
    let results = fixture
        .engine
        .search("Sliding window rate limiting", 3, 0.0);

    assert!(!results.is_empty());
    assert_eq!(results[0].document.title, "Sliding window rate limiting");
}

#[test]
fn high_min_score_empties_weak_matches() {
    let fixture = fixture(
        Box::new(DeadTier),
        &[
            ("Cooking", "how to braise vegetables"),
            ("Gardening", "soil preparation for spring"),
        ],
    );

    let results = fixture.engine.search("quantum chromodynamics", 5, 0.9);

    assert!(results.is_empty());
}

#[test]
fn lexical_scoring_is_deterministic() {
    // The first two documents are lexically identical for this query:
    // same content, and titles drawn from the same character set.
    let fixture = fixture(
        Box::new(DeadTier),
        &[
            ("dash", "shared words appear here"),
            ("shad", "shared words appear here"),
            ("zzz", "completely different text"),
        ],
    );

    let first = fixture.engine.search("shared words", 3, 0.0);
    let second = fixture.engine.search("shared words", 3, 0.0);

    assert_eq!(first, second);

    let titles: Vec<&str> = first.iter().map(|r| r.document.title.as_str()).collect();
    // Equal composite scores keep insertion order.
    assert_eq!(titles[0], "dash");
    assert_eq!(titles[1], "shad");
}

#[test]
fn token_matches_outrank_char_overlap() {
    let fixture = fixture(
        Box::new(DeadTier),
        &[
            ("Noise", "zxqvj kwpfy"),
            ("Relevant", "rate limiting with sliding windows"),
        ],
    );

    let results = fixture.engine.search("sliding rate limiting", 2, 0.0);

    assert_eq!(results[0].document.title, "Relevant");
}

#[test]
fn context_formats_title_blocks_in_rank_order() {
    let fixture = fixture(
        Box::new(KeywordTier),
        &[
            ("Beta notes", "beta beta beta"),
            ("Alpha notes", "alpha alpha"),
        ],
    );

    let context = fixture.engine.context("alpha", 500);

    assert!(context.starts_with("[Alpha notes]\nalpha alpha"));
    assert!(context.contains("\n\n[Beta notes]"));
}

#[test]
fn context_respects_budget() {
    let long_content = "alpha ".repeat(100);
    let fixture = fixture(Box::new(KeywordTier), &[("Alpha", long_content.as_str())]);

    let context = fixture.engine.context("alpha", 100);

    assert!(context.chars().count() <= 100 + TRUNCATION_MARKER.len());
}

#[test]
fn overflowing_block_is_truncated_with_marker() {
    let long_content = format!("alpha {}", "filler words ".repeat(50));
    let fixture = fixture(Box::new(KeywordTier), &[("Alpha", long_content.as_str())]);

    let context = fixture.engine.context("alpha", 200);

    assert!(context.starts_with("[Alpha]\n"));
    assert!(context.ends_with(TRUNCATION_MARKER));
    assert!(context.chars().count() <= 200);
}

#[test]
fn blocks_after_truncation_are_dropped() {
    let major_content = format!("alpha alpha {}", "lengthy body text ".repeat(20));
    let fixture = fixture(
        Box::new(KeywordTier),
        &[
            ("Alpha major", major_content.as_str()),
            ("Alpha minor", "alpha trailing"),
        ],
    );

    let context = fixture.engine.context("alpha", 150);

    assert!(context.starts_with("[Alpha major]\n"));
    assert!(!context.contains("[Alpha minor]"));
}
