use crate::rag::gate::ContextDecision;

/// Prompt that embeds retrieved context ahead of the question.
pub fn augmented_prompt(context: &str, question: &str) -> String {
    format!(
        "Using the provided context, answer the question. If the context doesn't contain relevant information, say so and use your general knowledge.\n\nContext: {}\n\nQuestion: {}",
        context, question
    )
}

/// Prompt used when no usable context was found.
pub fn general_prompt(question: &str) -> String {
    format!("Answer this question using your general knowledge: {}", question)
}

/// Pick the template for a gate decision.
pub fn build_prompt(decision: &ContextDecision, question: &str) -> String {
    match decision {
        ContextDecision::Usable { context, .. } => augmented_prompt(context, question),
        ContextDecision::NoContext { .. } => general_prompt(question),
    }
}
