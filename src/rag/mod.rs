//! Retrieval-augmented generation.
//!
//! - `QueryPipeline`: question → embedding → top-k → prompt → answer
//! - `IngestionPipeline`: corpus batches and uploaded pages → index
//! - `ensure_index`: keeps the index dimension in step with the embedder

mod context;
mod corpus;
mod error;
mod index_setup;
mod ingest;
mod pdf;
mod prompt;
mod query;
pub mod retry;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{build_context, CONTEXT_SEPARATOR};
pub use corpus::{load_corpus, split_corpus};
pub use error::RagError;
pub use index_setup::ensure_index;
pub use ingest::{IngestReport, IngestionPipeline};
pub use pdf::{LopdfExtractor, PageExtractor};
pub use prompt::PromptTemplate;
pub use query::{Answer, QueryPipeline};
pub use retry::RetryPolicy;

#[cfg(test)]
pub(crate) use pdf::fixtures;
