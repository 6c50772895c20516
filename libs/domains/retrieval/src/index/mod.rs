mod memory;
mod qdrant;
mod store;

pub use memory::InMemoryIndex;
pub use qdrant::{QdrantConfig, QdrantIndex};
pub use store::VectorIndex;
