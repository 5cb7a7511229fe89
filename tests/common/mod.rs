#![allow(dead_code)]

pub mod mocks;

use mocks::MockLLMClient;
use ragchat::rag::{IndexPolicy, SetupOutcome};
use ragchat::{app, AppState, RagChatConfig};
use std::path::Path;
use std::sync::Arc;

/// Config rooted in `dir`, with the offline hashed embedder.
pub fn test_config(dir: &Path) -> RagChatConfig {
    let mut config = RagChatConfig::default();
    config.knowledge.folder = dir.join("local knowledge");
    config.store.path = dir.join("chroma_db");
    config
}

/// Write a file into the config's knowledge folder.
pub fn write_doc(config: &RagChatConfig, name: &str, content: &[u8]) {
    std::fs::create_dir_all(&config.knowledge.folder).unwrap();
    std::fs::write(config.knowledge.folder.join(name), content).unwrap();
}

/// Bootstrap with `client` standing in for the hosted LLM.
pub async fn start(
    config: &RagChatConfig,
    policy: IndexPolicy,
    client: &MockLLMClient,
) -> (AppState, SetupOutcome) {
    app::bootstrap_with_client(config.clone(), policy, Arc::new(client.clone()))
        .await
        .expect("bootstrap failed")
}
