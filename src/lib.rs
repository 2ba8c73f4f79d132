//! Cardiology chat backend: retrieval-augmented answers over a hosted
//! vector index, plus the ingestion paths that fill it.

pub mod core;
pub mod embedding;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
pub mod vector;
pub mod vector_math;
