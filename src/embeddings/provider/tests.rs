use super::*;
use crate::GatewayError;

struct FailingTier;

impl EmbeddingTier for FailingTier {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(GatewayError::Embedding("service unreachable".to_string()))
    }
}

struct FixedTier;

impl EmbeddingTier for FixedTier {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 2.0, 3.0]).collect())
    }
}

struct ShortTier;

impl EmbeddingTier for ShortTier {
    fn name(&self) -> &'static str {
        "short"
    }

    fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // Always one vector, regardless of batch size.
        Ok(vec![vec![9.0]])
    }
}

fn batch(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| (*t).to_string()).collect()
}

#[test]
fn first_healthy_tier_wins() {
    let provider = EmbeddingProvider::new(vec![Box::new(FixedTier)]);

    let result = provider.embed(&batch(&["a", "b"]));

    assert_eq!(result.tier, "fixed");
    assert_eq!(result.vectors.len(), 2);
    assert_eq!(result.vectors[0], vec![1.0, 2.0, 3.0]);
}

#[test]
fn failing_tier_falls_through() {
    let provider = EmbeddingProvider::new(vec![Box::new(FailingTier), Box::new(FixedTier)]);

    let result = provider.embed(&batch(&["a"]));

    assert_eq!(result.tier, "fixed");
}

#[test]
fn all_tiers_failing_reaches_lexical() {
    let provider = EmbeddingProvider::new(vec![Box::new(FailingTier), Box::new(FailingTier)]);

    let result = provider.embed(&batch(&["alpha beta", "beta gamma"]));

    assert_eq!(result.tier, LexicalEncoder::NAME);
    assert_eq!(result.vectors.len(), 2);
    // Vocabulary: alpha, beta, gamma
    assert_eq!(result.vectors[0].len(), 3);
}

#[test]
fn count_mismatch_counts_as_failure() {
    let provider = EmbeddingProvider::new(vec![Box::new(ShortTier), Box::new(FixedTier)]);

    let result = provider.embed(&batch(&["a", "b"]));

    assert_eq!(result.tier, "fixed");
    assert_eq!(result.vectors.len(), 2);
}

#[test]
fn no_tiers_still_embeds() {
    let provider = EmbeddingProvider::new(Vec::new());

    let result = provider.embed(&batch(&["hello world"]));

    assert_eq!(result.tier, LexicalEncoder::NAME);
    assert_eq!(result.vectors.len(), 1);
}

#[test]
fn empty_batch_yields_empty_result() {
    let provider = EmbeddingProvider::new(vec![Box::new(FailingTier)]);

    let result = provider.embed(&[]);

    assert!(result.vectors.is_empty());
}

#[test]
fn tier_names_end_with_lexical() {
    let provider = EmbeddingProvider::new(vec![Box::new(FailingTier), Box::new(FixedTier)]);

    assert_eq!(provider.tier_names(), vec!["failing", "fixed", "lexical"]);
}

#[test]
fn disabled_config_builds_lexical_only_provider() {
    let mut config = EmbeddingConfig::default();
    config.local.enabled = false;
    config.remote.enabled = false;

    let provider = EmbeddingProvider::from_config(&config);

    assert_eq!(provider.tier_names(), vec![LexicalEncoder::NAME]);
}
