use clap::{Args, ValueEnum};
use pdf_chat_core::{
    CharacterNgramEmbedder, Embedder, LanguageModel, OllamaClient, OllamaEmbedder, RetryPolicy,
    DEFAULT_CHAT_MODEL, DEFAULT_OLLAMA_EMBEDDING_MODEL, DEFAULT_OLLAMA_URL,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbedderKind {
    /// In-process character trigram hashing.
    Ngram,
    /// Ollama `/api/embed` with `--embedding-model`.
    Ollama,
}

#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// Ollama base URL
    #[arg(long, env = "OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL)]
    pub ollama_url: String,

    /// Chat model used to synthesize answers
    #[arg(long, env = "PDF_CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    pub model: String,

    /// Embedding backend
    #[arg(long, env = "PDF_CHAT_EMBEDDER", value_enum, default_value_t = EmbedderKind::Ngram)]
    pub embedder: EmbedderKind,

    /// Ollama embedding model, used with `--embedder ollama`
    #[arg(long, env = "PDF_CHAT_EMBEDDING_MODEL", default_value = DEFAULT_OLLAMA_EMBEDDING_MODEL)]
    pub embedding_model: String,

    /// Attempts per chat request, including the first
    #[arg(long, env = "PDF_CHAT_LLM_MAX_ATTEMPTS", default_value = "3")]
    pub llm_max_attempts: u32,

    /// Base backoff between chat retries, in milliseconds
    #[arg(long, env = "PDF_CHAT_LLM_RETRY_BASE_MS", default_value = "500")]
    pub llm_retry_base_ms: u64,
}

impl ModelArgs {
    pub fn build_embedder(&self) -> anyhow::Result<Arc<dyn Embedder>> {
        Ok(match self.embedder {
            EmbedderKind::Ngram => Arc::new(CharacterNgramEmbedder::default()),
            EmbedderKind::Ollama => Arc::new(OllamaEmbedder::new(&self.ollama_url, &self.embedding_model)?),
        })
    }

    pub fn build_client(&self) -> anyhow::Result<OllamaClient> {
        let retry = RetryPolicy {
            max_attempts: self.llm_max_attempts.max(1),
            base_delay: Duration::from_millis(self.llm_retry_base_ms),
        };
        Ok(OllamaClient::new(&self.ollama_url, &self.model)?.with_retry(retry))
    }

    pub fn build_llm(&self) -> anyhow::Result<Arc<dyn LanguageModel>> {
        Ok(Arc::new(self.build_client()?))
    }
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "PDF_CHAT_BIND", default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// Directory uploaded PDFs are written to
    #[arg(long, env = "PDF_CHAT_UPLOAD_DIR", default_value = "pdf")]
    pub upload_dir: PathBuf,

    /// Secret used to sign the session cookie
    #[arg(long, env = "PDF_CHAT_SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,

    /// Drop a session's store this many seconds after its upload
    #[arg(long, env = "PDF_CHAT_SESSION_TTL_SECS")]
    pub session_ttl_secs: Option<i64>,

    /// Largest accepted request body, in MiB
    #[arg(long, env = "PDF_CHAT_MAX_UPLOAD_MB", default_value = "64")]
    pub max_upload_mb: usize,

    #[command(flatten)]
    pub model: ModelArgs,
}

impl ServeArgs {
    pub fn session_ttl(&self) -> Option<chrono::Duration> {
        self.session_ttl_secs.map(chrono::Duration::seconds)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
