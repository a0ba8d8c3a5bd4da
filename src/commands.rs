use anyhow::{Context, Result, bail};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::embeddings::EmbeddingProvider;
use crate::gateway::{ChatRequest, Gateway, OutputFormat};
use crate::generation::{GenerationBackend, HttpGenerationClient};
use crate::knowledge::{DocumentStore, RetrievalEngine};

/// Open the knowledge base and embedding provider, rebuilding derived state
/// in memory when the index artifacts did not survive.
fn open_knowledge(config: &Config) -> Result<(Arc<DocumentStore>, Arc<EmbeddingProvider>)> {
    let store = Arc::new(
        DocumentStore::open(config.knowledge_base_path())
            .context("Failed to open knowledge base")?,
    );
    let provider = Arc::new(EmbeddingProvider::from_config(&config.embedding));

    if !store.is_empty() && store.search_state().is_none() {
        info!("Derived index artifacts missing, rebuilding in memory");
        store
            .rebuild(&provider)
            .context("Failed to rebuild vector index")?;
    }

    Ok((store, provider))
}

/// Send a one-shot prompt through the full gateway pipeline.
#[inline]
pub async fn chat(
    config: &Config,
    prompt: String,
    format: OutputFormat,
    use_retrieval: Option<bool>,
) -> Result<()> {
    let (store, provider) = open_knowledge(config)?;
    let retrieval = Arc::new(RetrievalEngine::new(
        store,
        provider,
        config.retrieval.clone(),
    ));
    let backend: Arc<dyn GenerationBackend> = Arc::new(
        HttpGenerationClient::new(&config.generation)
            .context("Failed to create generation client")?,
    );
    let gateway = Gateway::new(config, retrieval, backend);

    let request = ChatRequest {
        client_id: "cli".to_string(),
        prompt,
        format,
        use_retrieval,
    };

    let reply = gateway.handle(&request).await;

    if reply.status == 200 {
        match reply.body["response"].as_str() {
            Some(text) => println!("{}", text),
            None => println!("{}", reply.body),
        }
        Ok(())
    } else {
        bail!(
            "Request failed ({}): {}",
            reply.status,
            reply.body["error"].as_str().unwrap_or("unknown error")
        );
    }
}

/// Add a document to the knowledge base, from a file or inline content.
#[inline]
pub fn add_document(
    config: &Config,
    file: Option<PathBuf>,
    content: Option<String>,
    title: Option<String>,
    category: String,
    tags: Vec<String>,
) -> Result<()> {
    let (content, default_title) = match (file, content) {
        (Some(path), None) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read document file: {}", path.display()))?;
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "untitled".to_string());
            (text, stem)
        }
        (None, Some(text)) => (text, "untitled".to_string()),
        (Some(_), Some(_)) => bail!("Provide either --file or --content, not both"),
        (None, None) => bail!("Provide document text via --file or --content"),
    };

    if content.trim().is_empty() {
        bail!("Document content is empty");
    }

    let (store, provider) = open_knowledge(config)?;

    let id = store.add(
        &provider,
        content,
        title.unwrap_or(default_title),
        category,
        tags,
    )?;

    println!("Added document: {}", id);
    println!("Total documents: {}", store.len());

    Ok(())
}

/// Search the knowledge base and print ranked matches.
#[inline]
pub fn search(config: &Config, query: &str, top_k: usize, min_score: f32) -> Result<()> {
    let (store, provider) = open_knowledge(config)?;
    let engine = RetrievalEngine::new(store, provider, config.retrieval.clone());

    let results = engine.search(query, top_k, min_score);

    if results.is_empty() {
        println!("No matching documents");
        return Ok(());
    }

    for (rank, result) in results.iter().enumerate() {
        let preview: String = result.document.content.chars().take(80).collect();
        println!(
            "{}. [{:.3}] {} ({})",
            rank + 1,
            result.score,
            result.document.title,
            result.document.id
        );
        println!("   {}", preview);
    }

    Ok(())
}

/// Show knowledge-base statistics and the configured embedding tiers.
#[inline]
pub fn show_status(config: &Config) -> Result<()> {
    let (store, provider) = open_knowledge(config)?;
    let stats = store.stats();

    println!("Knowledge base: {}", store.root().display());
    println!("  Documents: {}", stats.total_documents);
    println!("  Characters: {}", stats.total_characters);
    println!(
        "  Vector index: {}",
        match stats.index_dimension {
            Some(dimension) => format!("ready ({} dimensions)", dimension),
            None => "absent (lexical scoring)".to_string(),
        }
    );

    if !stats.categories.is_empty() {
        println!("  Categories:");
        for (category, count) in &stats.categories {
            let name = if category.is_empty() {
                "(uncategorized)"
            } else {
                category
            };
            println!("    {}: {}", name, count);
        }
    }

    println!("Embedding tiers: {}", provider.tier_names().join(" -> "));

    Ok(())
}

/// Print the active configuration as TOML.
#[inline]
pub fn show_config(config: &Config) -> Result<()> {
    let rendered =
        toml::to_string_pretty(config).context("Failed to render configuration as TOML")?;
    println!("# {}", config.config_file_path().display());
    print!("{}", rendered);
    Ok(())
}
