//! Startup wiring shared by the web server, the terminal chat and the
//! index commands.

use crate::chat::SessionStore;
use crate::db::RagVectorStore;
use crate::llm::{LLMClient, Provider};
use crate::loader::load_documents;
use crate::rag::{
    create_embedder, ContextGate, IndexPolicy, KnowledgeIndex, RagPipeline, Retriever,
    SetupOutcome,
};
use crate::types::{AppError, Result};
use crate::utils::config::RagChatConfig;
use crate::AppState;
use std::sync::Arc;
use tracing::info;

/// Open the configured store and index without touching the documents.
pub async fn open_index(config: &RagChatConfig) -> Result<KnowledgeIndex> {
    let store = RagVectorStore::new(Some(config.store.path.clone())).await?;
    let embedder = create_embedder(&config.embeddings, &config.llm)?;

    KnowledgeIndex::open(
        Arc::new(store),
        embedder,
        config.store.collection.clone(),
        Some(config.manifest_path()),
    )
    .await
}

/// Load the knowledge folder and make sure the index holds it.
pub async fn build_index(
    config: &RagChatConfig,
    policy: IndexPolicy,
) -> Result<(KnowledgeIndex, SetupOutcome)> {
    let folder = config.knowledge.folder.clone();
    let documents = tokio::task::spawn_blocking(move || load_documents(&folder))
        .await
        .map_err(|e| AppError::Internal(format!("Document loading panicked: {}", e)))??;

    let index = open_index(config).await?;
    let outcome = index.setup(&documents, policy).await?;
    Ok((index, outcome))
}

/// Full startup with the LLM client described by the config.
pub async fn bootstrap(
    config: RagChatConfig,
    policy: IndexPolicy,
) -> Result<(AppState, SetupOutcome)> {
    let client = Provider::from_config(&config.llm).create_client().await?;
    bootstrap_with_client(config, policy, Arc::from(client)).await
}

/// Full startup with a caller-supplied LLM client.
pub async fn bootstrap_with_client(
    config: RagChatConfig,
    policy: IndexPolicy,
    llm: Arc<dyn LLMClient>,
) -> Result<(AppState, SetupOutcome)> {
    let (index, outcome) = build_index(&config, policy).await?;
    let index = Arc::new(index);

    let retriever = Retriever::new(index.clone(), config.retrieval.top_n);
    let gate = ContextGate::new(config.retrieval.min_context_chars);
    let pipeline = RagPipeline::new(retriever, gate, llm);

    info!(
        model = pipeline.model_name(),
        collection = index.collection(),
        ?outcome,
        "Ready"
    );

    let sessions = session_store(&config);
    let state = AppState {
        config: Arc::new(config),
        index,
        pipeline: Arc::new(pipeline),
        sessions: Arc::new(sessions),
    };
    Ok((state, outcome))
}

fn session_store(config: &RagChatConfig) -> SessionStore {
    match config.server.session_idle_timeout() {
        Some(timeout) => SessionStore::with_idle_timeout(timeout),
        None => SessionStore::new(),
    }
}
