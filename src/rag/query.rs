//! Question answering: embed, retrieve, assemble, generate.

use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::embedding::EmbeddingProvider;
use crate::llm::GenerationProvider;
use crate::vector::{IndexMatch, VectorIndex};

use super::context::{build_context, context_text};
use super::error::RagError;
use super::prompt::PromptTemplate;

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    /// Ids of the records that made up the context, in rank order.
    pub sources: Vec<String>,
}

pub struct QueryPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn GenerationProvider>,
    index_name: String,
    top_k: usize,
    template: PromptTemplate,
}

impl QueryPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn GenerationProvider>,
        index_name: impl Into<String>,
        top_k: usize,
        template: PromptTemplate,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            index_name: index_name.into(),
            top_k: top_k.max(1),
            template,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self::new(
            embedder,
            index,
            generator,
            config.index.name.clone(),
            config.retrieval.top_k,
            PromptTemplate::from_config(&config.prompt),
        )
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub async fn retrieve(&self, question: &str) -> Result<Vec<IndexMatch>, RagError> {
        let vector = self
            .embedder
            .embed_query(question)
            .await
            .map_err(RagError::Embedding)?;
        self.index
            .query(&self.index_name, &vector, self.top_k)
            .await
            .map_err(RagError::Index)
    }

    pub async fn answer(&self, question: &str) -> Result<Answer, RagError> {
        if question.trim().is_empty() {
            return Err(RagError::EmptyQuestion);
        }

        let matches = self.retrieve(question).await?;
        let context = build_context(&matches);
        tracing::debug!(
            matches = matches.len(),
            context_chars = context.len(),
            template = self.template.label(),
            "Retrieved context"
        );

        let prompt = self.template.render(&context, question);
        let text = self
            .generator
            .generate(&prompt)
            .await
            .map_err(RagError::Generation)?;

        let sources = matches
            .into_iter()
            .filter(|m| context_text(m).is_some())
            .map(|m| m.id)
            .collect();
        Ok(Answer { text, sources })
    }
}
