use crate::rag::index::KnowledgeIndex;
use crate::types::{QueryResult, Result};
use std::sync::Arc;

/// Default number of documents fetched per question.
pub const DEFAULT_TOP_N: usize = 3;

/// Fetches the top-N index entries for a question.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<KnowledgeIndex>,
    top_n: usize,
}

impl Retriever {
    pub fn new(index: Arc<KnowledgeIndex>, top_n: usize) -> Self {
        Self { index, top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn index(&self) -> &Arc<KnowledgeIndex> {
        &self.index
    }

    /// Hits come back in the index's ranking order, unmodified.
    pub async fn retrieve(&self, question: &str) -> Result<QueryResult> {
        self.index.query(question, self.top_n).await
    }
}
