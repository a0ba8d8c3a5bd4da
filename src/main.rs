use clap::{Parser, Subcommand, ValueEnum};
use promptgate::Result;
use promptgate::commands::{add_document, chat, search, show_config, show_status};
use promptgate::config::Config;
use promptgate::gateway::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "promptgate")]
#[command(about = "Admission-controlled serving gateway with hybrid knowledge retrieval")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml and the knowledge base
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Markdown,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Markdown => OutputFormat::Markdown,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Send a prompt through the full gateway pipeline
    Chat {
        /// The prompt text
        prompt: String,
        /// Output format requested from the generation service
        #[arg(long, value_enum, default_value_t = FormatArg::Text)]
        format: FormatArg,
        /// Override the configured retrieval default for this request
        #[arg(long)]
        retrieval: Option<bool>,
    },
    /// Add a document to the knowledge base
    Add {
        /// Read document content from a text file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Inline document content
        #[arg(long)]
        content: Option<String>,
        /// Document title; defaults to the file stem
        #[arg(long)]
        title: Option<String>,
        /// Document category
        #[arg(long, default_value = "")]
        category: String,
        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Search the knowledge base
    Search {
        /// The search query
        query: String,
        /// Maximum number of results
        #[arg(long, default_value_t = 5)]
        top_k: usize,
        /// Minimum relevance score
        #[arg(long, default_value_t = 0.1)]
        min_score: f32,
    },
    /// Show knowledge-base and embedding status
    Status,
    /// Show the active configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => Config::default_dir().map_err(|e| promptgate::GatewayError::Config(e.to_string()))?,
    };
    let config = Config::load(&config_dir)?;

    match cli.command {
        Commands::Chat {
            prompt,
            format,
            retrieval,
        } => {
            chat(&config, prompt, format.into(), retrieval).await?;
        }
        Commands::Add {
            file,
            content,
            title,
            category,
            tags,
        } => {
            add_document(&config, file, content, title, category, tags)?;
        }
        Commands::Search {
            query,
            top_k,
            min_score,
        } => {
            search(&config, &query, top_k, min_score)?;
        }
        Commands::Status => {
            show_status(&config)?;
        }
        Commands::Config => {
            show_config(&config)?;
        }
    }

    Ok(())
}
