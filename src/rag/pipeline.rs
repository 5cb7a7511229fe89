use crate::llm::LLMClient;
use crate::rag::gate::{ContextDecision, ContextGate};
use crate::rag::prompt::build_prompt;
use crate::rag::retriever::Retriever;
use crate::types::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A generated reply and how it was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    pub used_context: bool,
    pub sources: Vec<String>,
}

/// Retrieve, gate, prompt, generate.
pub struct RagPipeline {
    retriever: Retriever,
    gate: ContextGate,
    llm: Arc<dyn LLMClient>,
}

impl RagPipeline {
    pub fn new(retriever: Retriever, gate: ContextGate, llm: Arc<dyn LLMClient>) -> Self {
        Self {
            retriever,
            gate,
            llm,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Answer one question with exactly one completion call.
    ///
    /// Retrieval errors and generation errors are returned as is; there is
    /// no retry.
    #[instrument(skip(self, question), fields(model = %self.llm.model_name()))]
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let result = self.retriever.retrieve(question).await?;
        let decision = self.gate.evaluate(&result);

        match &decision {
            ContextDecision::Usable { sources, .. } => {
                debug!(hits = result.len(), ?sources, "Using retrieved context")
            }
            ContextDecision::NoContext { reason } => {
                debug!(hits = result.len(), ?reason, "Falling back to general knowledge")
            }
        }

        let prompt = build_prompt(&decision, question);
        let text = self.llm.generate(&prompt).await?;

        info!(used_context = decision.is_usable(), "Generated answer");
        Ok(Answer {
            text,
            used_context: decision.is_usable(),
            sources: decision.sources().to_vec(),
        })
    }
}
