//! TOML-based configuration for ragchat
//!
//! Settings live in an optional `ragchat.toml`. Every section has defaults
//! that reproduce the classic layout (`local knowledge/` in, `chroma_db/`
//! out, Gemini for answers), so running without a file is supported.
//! A handful of `RAGCHAT_*` environment variables override file values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Root configuration structure loaded from ragchat.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagChatConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Web sessions untouched for this many seconds are dropped. 0 keeps
    /// them until the client ends them.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl ServerConfig {
    pub fn session_idle_timeout(&self) -> Option<std::time::Duration> {
        (self.session_idle_secs > 0).then(|| std::time::Duration::from_secs(self.session_idle_secs))
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_idle_secs() -> u64 {
    3600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

// ============= Knowledge Folder =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Folder scanned (non-recursively) for documents. Created if missing.
    #[serde(default = "default_knowledge_folder")]
    pub folder: PathBuf,
}

fn default_knowledge_folder() -> PathBuf {
    PathBuf::from("local knowledge")
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            folder: default_knowledge_folder(),
        }
    }
}

// ============= Index Store =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the persistent vector collections.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("chroma_db")
}

fn default_collection() -> String {
    "knowledge_base".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            collection: default_collection(),
        }
    }
}

// ============= Retrieval =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of documents requested per question.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Retrieved context must be longer than this (in characters, after
    /// trimming) to be used in the prompt.
    #[serde(default = "default_min_context_chars")]
    pub min_context_chars: usize,
}

fn default_top_n() -> usize {
    3
}

fn default_min_context_chars() -> usize {
    50
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            min_context_chars: default_min_context_chars(),
        }
    }
}

// ============= LLM Provider =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    Gemini,
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: LlmProviderKind,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Environment variable containing the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_gemini_base")]
    pub base_url: String,

    /// Request timeout. Unset means the HTTP client waits indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_llm_provider() -> LlmProviderKind {
    LlmProviderKind::Gemini
}

fn default_llm_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_gemini_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            base_url: default_gemini_base(),
            timeout_secs: None,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable.
    ///
    /// A missing key is not an error here; it surfaces on the first
    /// generation call.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

// ============= Embeddings =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local feature-hashing embedder, no network or model download.
    Hashed,
    /// Gemini `batchEmbedContents` endpoint (uses the LLM API key).
    Gemini,
    /// fastembed ONNX models (requires the `local-embeddings` feature).
    Fastembed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_embedding_backend")]
    pub backend: EmbeddingBackend,

    /// Model name for the remote/ONNX backends.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector size for the hashed backend.
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,
}

fn default_embedding_backend() -> EmbeddingBackend {
    EmbeddingBackend::Hashed
}

fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}

fn default_embedding_dimensions() -> usize {
    384
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            model: default_embedding_model(),
            dimensions: default_embedding_dimensions(),
        }
    }
}

// ============= Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid value for environment variable '{0}': {1}")]
    InvalidEnvVar(String, String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for crate::types::AppError {
    fn from(err: ConfigError) -> Self {
        crate::types::AppError::Configuration(err.to_string())
    }
}

impl RagChatConfig {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist, then apply environment overrides and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let content = fs::read_to_string(path)?;
            Self::from_toml(&content)?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without env overrides.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `RAGCHAT_*` overrides using `lookup` to read variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("RAGCHAT_KNOWLEDGE_DIR") {
            self.knowledge.folder = PathBuf::from(dir);
        }
        if let Some(path) = lookup("RAGCHAT_STORE_PATH") {
            self.store.path = PathBuf::from(path);
        }
        if let Some(host) = lookup("RAGCHAT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("RAGCHAT_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar("RAGCHAT_PORT".into(), port.clone()))?;
        }
        if let Some(model) = lookup("RAGCHAT_MODEL") {
            self.llm.model = model;
        }
        Ok(())
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retrieval.top_n == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_n must be at least 1".into(),
            ));
        }
        if self.embeddings.dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "embeddings.dimensions must be at least 1".into(),
            ));
        }
        if self.store.collection.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.collection must not be empty".into(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.model must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Path of the persisted index manifest for the configured collection.
    pub fn manifest_path(&self) -> PathBuf {
        self.store
            .path
            .join(format!("{}.manifest.json", self.store.collection))
    }
}
