use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response};
use axum::Router;
use pdf_chat_core::{ChatMessage, Embedder, LanguageModel, ModelError, QaCoordinator};
use pdf_chat_server::session::cookie_key;
use pdf_chat_server::{create_router, AppState};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub use pdf_chat_core::test_pdf::pdf_bytes;

const BOUNDARY: &str = "pdf-chat-test-boundary";
const KEYWORDS: [&str; 3] = ["pump", "turbine", "valve"];

/// One dimension per keyword so relevance is fully predictable.
pub struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ModelError> {
        Ok(texts
            .iter()
            .map(|text| {
                let lowered = text.to_lowercase();
                KEYWORDS
                    .iter()
                    .map(|keyword| if lowered.contains(keyword) { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect())
    }
}

/// Two dimensions on the first batch, three afterwards, so the query vector
/// never matches the indexed ones.
#[derive(Default)]
pub struct DriftingEmbedder {
    calls: AtomicUsize,
}

#[async_trait]
impl Embedder for DriftingEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ModelError> {
        let dimensions = if self.calls.fetch_add(1, Ordering::SeqCst) == 0 { 2 } else { 3 };
        Ok(texts.iter().map(|_| vec![1.0; dimensions]).collect())
    }
}

/// Replies with the system prompt, which embeds the retrieved context.
pub struct EchoModel;

#[async_trait]
impl LanguageModel for EchoModel {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        Ok(messages
            .first()
            .map(|message| message.content.clone())
            .unwrap_or_default())
    }
}

pub fn test_app(upload_dir: &Path) -> Router {
    app_with_embedder(upload_dir, Arc::new(KeywordEmbedder))
}

pub fn app_with_embedder(upload_dir: &Path, embedder: Arc<dyn Embedder>) -> Router {
    let coordinator = QaCoordinator::new(embedder, Arc::new(EchoModel));
    let key = cookie_key("integration-test-secret").expect("cookie key");
    let state = AppState::new(coordinator, upload_dir, key).expect("app state");
    create_router(state, 16 * 1024 * 1024)
}

pub fn upload_request(cookie: Option<&str>, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n").as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).expect("request")
}

pub fn json_request(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

/// The `name=value` pair of the first `Set-Cookie` header, if any.
pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8_lossy(&bytes).to_string()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).expect("json body")
}
