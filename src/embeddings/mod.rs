// Embeddings module
// Tiered text-to-vector encoding: remote API, local server, lexical fallback.

pub mod lexical;
pub mod local;
pub mod provider;
pub mod remote;

pub use lexical::LexicalEncoder;
pub use local::LocalEmbeddingClient;
pub use provider::{EmbeddedBatch, EmbeddingProvider, EmbeddingTier};
pub use remote::RemoteEmbeddingClient;
