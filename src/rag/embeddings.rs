//! Text embedding backends.
//!
//! The index and the retriever embed through the same [`Embedder`], so
//! documents and questions always land in the same vector space. Three
//! backends are available:
//!
//! - [`HashedEmbedder`] - token feature hashing, fully offline (default)
//! - [`GeminiEmbedder`] - Gemini `batchEmbedContents`
//! - `FastEmbedder` - local ONNX models via fastembed (`local-embeddings` feature)

use crate::llm::gemini::API_KEY_HEADER;
use crate::types::{AppError, Result};
use crate::utils::config::{EmbeddingBackend, EmbeddingsConfig, LlmConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Turns texts into fixed-size vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_texts(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Embedding("Embedder returned no vector".into()))
    }

    /// Length of every vector this embedder produces.
    fn dimensions(&self) -> usize;

    /// Short identifier used in logs and status output.
    fn name(&self) -> &str;
}

/// Build the embedder selected in configuration.
pub fn create_embedder(config: &EmbeddingsConfig, llm: &LlmConfig) -> Result<Arc<dyn Embedder>> {
    match config.backend {
        EmbeddingBackend::Hashed => Ok(Arc::new(HashedEmbedder::new(config.dimensions)?)),
        EmbeddingBackend::Gemini => Ok(Arc::new(GeminiEmbedder::new(
            llm.base_url.clone(),
            config.model.clone(),
            llm.api_key(),
            llm.timeout_secs,
        )?)),
        #[cfg(feature = "local-embeddings")]
        EmbeddingBackend::Fastembed => Ok(Arc::new(FastEmbedder::new()?)),
        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingBackend::Fastembed => Err(AppError::Configuration(
            "fastembed backend requires the `local-embeddings` feature".into(),
        )),
    }
}

// ============= Hashed =============

/// Bag-of-words embedder using hashed token buckets.
///
/// Each lowercase alphanumeric token adds 1.0 to the bucket picked by its
/// SHA-256 digest, and the result is L2-normalized. Texts that share
/// vocabulary score high under cosine similarity. Deterministic across
/// runs and platforms, so persisted vectors stay valid.
#[derive(Debug, Clone)]
pub struct HashedEmbedder {
    dims: usize,
}

impl HashedEmbedder {
    pub fn new(dims: usize) -> Result<Self> {
        if dims == 0 {
            return Err(AppError::Configuration(
                "Embedding dimensions must be at least 1".into(),
            ));
        }
        Ok(Self { dims })
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(bytes) % self.dims as u64) as usize
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dims];
        let lower = text.to_lowercase();

        for token in lower.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            vector[self.bucket(token)] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashedEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn name(&self) -> &str {
        "hashed"
    }
}

// ============= Gemini =============

const GEMINI_BATCH_LIMIT: usize = 100;
const GEMINI_EMBEDDING_DIMS: usize = 768;

#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Serialize)]
struct EmbedContentRequest {
    model: String,
    content: EmbedContent,
}

#[derive(Serialize)]
struct EmbedContent {
    parts: Vec<EmbedPart>,
}

#[derive(Serialize)]
struct EmbedPart {
    text: String,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Remote embedder calling Gemini `batchEmbedContents`.
pub struct GeminiEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiEmbedder {
    pub fn new(
        base_url: String,
        model: String,
        api_key: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    async fn embed_chunk(&self, api_key: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!(
            "{}/v1beta/models/{}:batchEmbedContents",
            self.base_url, self.model
        );
        let body = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|t| EmbedContentRequest {
                    model: format!("models/{}", self.model),
                    content: EmbedContent {
                        parts: vec![EmbedPart { text: t.clone() }],
                    },
                })
                .collect(),
        };

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::Embedding(format!("Gemini request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "Gemini embedding error ({}): {}",
                status, text
            )));
        }

        let parsed: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| {
                AppError::Embedding(format!("Invalid embedding response: {}", e.without_url()))
            })?;

        if parsed.embeddings.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }

        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Embedding("Gemini API key is not set".into()))?;

        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(GEMINI_BATCH_LIMIT) {
            vectors.extend(self.embed_chunk(api_key, chunk).await?);
            debug!(done = vectors.len(), total = texts.len(), "Embedded batch");
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        GEMINI_EMBEDDING_DIMS
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============= fastembed =============

#[cfg(feature = "local-embeddings")]
pub use local::FastEmbedder;

#[cfg(feature = "local-embeddings")]
mod local {
    use super::Embedder;
    use crate::types::{AppError, Result};
    use async_trait::async_trait;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// all-MiniLM-L6-v2 run locally through ONNX Runtime.
    pub struct FastEmbedder {
        model: Arc<Mutex<TextEmbedding>>,
    }

    impl FastEmbedder {
        pub fn new() -> Result<Self> {
            let model = TextEmbedding::try_new(
                InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(true),
            )
            .map_err(|e| AppError::Embedding(e.to_string()))?;

            Ok(Self {
                model: Arc::new(Mutex::new(model)),
            })
        }
    }

    #[async_trait]
    impl Embedder for FastEmbedder {
        async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let model = self.model.clone();
            let texts = texts.to_vec();
            tokio::task::spawn_blocking(move || model.lock().embed(texts, None))
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?
                .map_err(|e| AppError::Embedding(e.to_string()))
        }

        fn dimensions(&self) -> usize {
            384
        }

        fn name(&self) -> &str {
            "all-MiniLM-L6-v2"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_hashed_is_deterministic_and_normalized() {
        let embedder = HashedEmbedder::new(64).unwrap();
        let a = embedder.embed("Rust ownership rules").await.unwrap();
        let b = embedder.embed("Rust ownership rules").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_hashed_ignores_case_and_punctuation() {
        let embedder = HashedEmbedder::new(128).unwrap();
        let a = embedder.embed("Vacation policy!").await.unwrap();
        let b = embedder.embed("vacation, POLICY").await.unwrap();
        assert!((cosine(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_hashed_prefers_shared_vocabulary() {
        let embedder = HashedEmbedder::new(384).unwrap();
        let vectors = embedder
            .embed_texts(&[
                "employees accrue vacation days every month".to_string(),
                "the quarterly revenue grew in europe".to_string(),
            ])
            .await
            .unwrap();
        let query = embedder.embed("how many vacation days").await.unwrap();

        assert!(cosine(&query, &vectors[0]) > cosine(&query, &vectors[1]));
    }

    #[tokio::test]
    async fn test_hashed_empty_text_is_zero_vector() {
        let embedder = HashedEmbedder::new(8).unwrap();
        let v = embedder.embed("  ...  ").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(HashedEmbedder::new(0).is_err());
    }

    #[tokio::test]
    async fn test_gemini_without_key_fails_on_use() {
        let embedder = GeminiEmbedder::new(
            "http://localhost:1".into(),
            "text-embedding-004".into(),
            None,
            None,
        )
        .unwrap();

        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(msg) if msg.contains("API key")));
    }

    #[tokio::test]
    async fn test_gemini_transport_error_does_not_expose_key() {
        let embedder = GeminiEmbedder::new(
            "http://127.0.0.1:1".into(),
            "text-embedding-004".into(),
            Some("SECRET-KEY-123".into()),
            None,
        )
        .unwrap();

        let err = embedder.embed("hello").await.unwrap_err();
        let text = err.to_string();
        assert!(matches!(err, AppError::Embedding(_)));
        assert!(!text.contains("SECRET-KEY-123"), "key leaked: {text}");
    }
}
