// Knowledge module
// Document storage, derived vector index, and the retrieval pipeline.

pub mod index;
pub mod retrieval;
pub mod store;

pub use index::VectorIndex;
pub use retrieval::{RetrievalEngine, ScoredDocument};
pub use store::{Document, DocumentStore, StoreStats};
