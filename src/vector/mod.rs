//! Vector index backends.
//!
//! - `VectorIndex`: trait over the hosted store (data + control plane)
//! - `PineconeIndex`: hosted Pinecone REST client
//! - `MemoryIndex`: in-process cosine index for local runs and tests

mod index;
mod memory;
mod pinecone;

use std::sync::Arc;

pub use index::{IndexDescription, IndexMatch, IndexSpec, RecordMetadata, VectorIndex, VectorRecord};
pub use memory::MemoryIndex;
pub use pinecone::PineconeIndex;

use crate::core::config::{AppConfig, IndexProviderKind};

pub fn build_index(config: &AppConfig, client: reqwest::Client) -> Arc<dyn VectorIndex> {
    match config.index.provider {
        IndexProviderKind::Pinecone => Arc::new(PineconeIndex::new(
            client,
            config.index.api_key.clone(),
            config.index.controller_url.clone(),
            config.index.namespace.clone(),
        )),
        IndexProviderKind::Memory => Arc::new(MemoryIndex::new()),
    }
}
